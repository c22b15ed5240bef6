//! Render orchestration
//!
//! [`Mfen::render`] runs one request through the whole pipeline:
//!
//! 1. resolve the edge length
//! 2. parse the position and decode both colors
//! 3. derive the cache key and try the cache
//! 4. on a miss, compose at full resolution, downscale, encode and store
//!
//! Any failure along the way turns the result into an error image. Caching is
//! skipped entirely when it is disabled, when a purge was requested (read
//! skipped, write still happens) and for every errored request.

use crate::board::BoardGrid;
use crate::cache::{CacheKey, CacheLocation, CacheStore, KeyParams};
use crate::color::decode_hex;
use crate::config::MfenConfig;
use crate::error::{MfenError, MfenResult};
use crate::error_image::render_error;
use crate::output::{save_bytes, Encoding, MimeKind};
use crate::renderer::{compose, downscale};
use crate::size::resolve_size;
use crate::sprites::{BuiltinSprites, DirectorySprites, SpriteSource};
use image::RgbaImage;
use std::borrow::Cow;
use std::io::{self, Write};
use std::path::Path;

/// What the caller needs back from a render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// The image itself
    #[default]
    Image,
    /// Only the cache location when the entry already exists; the image is
    /// not loaded. Falls back to a full render on a miss.
    LocationOnly,
}

/// Where the image of a successful render came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Cache,
    Composed,
}

/// A successfully rendered board
#[derive(Debug, Clone)]
pub struct Rendered {
    pub image: RgbaImage,
    /// Encoded bytes, exactly as stored in (or read from) the cache
    pub bytes: Vec<u8>,
    /// Cache entry, when caching is enabled
    pub location: Option<CacheLocation>,
    pub source: ImageSource,
}

/// Terminal state of one render call
#[derive(Debug)]
pub enum RenderState {
    /// The board image is held
    Ready(Rendered),
    /// Location-only cache hit: nothing was decoded
    Located(CacheLocation),
    /// The request failed; an error image is held instead
    Errored { error: MfenError, image: RgbaImage },
    /// The held image was released by [`RenderResult::destroy`]
    Released { error: Option<MfenError> },
}

/// Outcome of [`Mfen::render`].
///
/// Always carries something to show: the board, its cache location, or an
/// error image. Output can be produced any number of times until the image
/// is released with [`RenderResult::destroy`].
#[derive(Debug)]
pub struct RenderResult {
    state: RenderState,
    encoding: Encoding,
}

impl RenderResult {
    fn errored(error: MfenError, encoding: Encoding) -> Self {
        let image = render_error(error.code(), &error.to_string());
        Self { state: RenderState::Errored { error, image }, encoding }
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    /// Encoding used by [`output`](Self::output)
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn has_errored(&self) -> bool {
        matches!(
            self.state,
            RenderState::Errored { .. } | RenderState::Released { error: Some(_) }
        )
    }

    pub fn error(&self) -> Option<&MfenError> {
        match &self.state {
            RenderState::Errored { error, .. } | RenderState::Released { error: Some(error) } => Some(error),
            _ => None,
        }
    }

    /// Error code and message of a failed render
    pub fn last_error(&self) -> Option<(u16, String)> {
        self.error().map(|e| (e.code(), e.to_string()))
    }

    /// The held bitmap: the board or the error image
    pub fn image(&self) -> Option<&RgbaImage> {
        match &self.state {
            RenderState::Ready(rendered) => Some(&rendered.image),
            RenderState::Errored { image, .. } => Some(image),
            RenderState::Located(_) | RenderState::Released { .. } => None,
        }
    }

    pub fn rendered(&self) -> Option<&Rendered> {
        match &self.state {
            RenderState::Ready(rendered) => Some(rendered),
            _ => None,
        }
    }

    /// Cache location of the board, if it is cached
    pub fn location(&self) -> Option<&CacheLocation> {
        match &self.state {
            RenderState::Ready(rendered) => rendered.location.as_ref(),
            RenderState::Located(location) => Some(location),
            _ => None,
        }
    }

    /// Encoded bytes of whatever is held. `None` once released.
    pub fn encoded(&self) -> MfenResult<Option<Cow<'_, [u8]>>> {
        match &self.state {
            RenderState::Ready(rendered) => Ok(Some(Cow::Borrowed(rendered.bytes.as_slice()))),
            RenderState::Located(location) => Ok(Some(Cow::Owned(std::fs::read(&location.path)?))),
            RenderState::Errored { image, .. } => Ok(Some(Cow::Owned(self.encoding.encode(image)?))),
            RenderState::Released { .. } => Ok(None),
        }
    }

    /// Write the encoded image to `destination`, or to stdout when `None`.
    ///
    /// Does nothing after [`destroy`](Self::destroy).
    pub fn output(&self, destination: Option<&Path>) -> MfenResult<()> {
        match destination {
            Some(path) => {
                if let Some(bytes) = self.encoded()? {
                    save_bytes(&bytes, path)?;
                }
                Ok(())
            }
            None => {
                let stdout = io::stdout();
                let mut lock = stdout.lock();
                self.write_to(&mut lock)?;
                lock.flush()?;
                Ok(())
            }
        }
    }

    /// Write the encoded image to `writer`
    pub fn write_to<W: Write>(&self, writer: &mut W) -> MfenResult<()> {
        if let Some(bytes) = self.encoded()? {
            writer.write_all(&bytes)?;
        }
        Ok(())
    }

    /// Release the held image. The error, if any, stays inspectable.
    /// Calling it again is a no-op.
    pub fn destroy(&mut self) {
        let state = std::mem::replace(&mut self.state, RenderState::Released { error: None });
        self.state = match state {
            RenderState::Errored { error, .. } => RenderState::Released { error: Some(error) },
            RenderState::Released { error } => RenderState::Released { error },
            RenderState::Ready(_) | RenderState::Located(_) => RenderState::Released { error: None },
        };
    }
}

/// Validated, resolved inputs of one request
struct Prepared {
    grid: BoardGrid,
    edge: u32,
    light: image::Rgb<u8>,
    dark: image::Rgb<u8>,
    encoding: Encoding,
    key: CacheKey,
}

/// Board renderer bound to a sprite source
#[derive(Debug, Clone, Default)]
pub struct Mfen<S = BuiltinSprites> {
    sprites: S,
}

impl Mfen {
    /// Renderer drawing pieces with the built-in sprites
    pub fn builtin() -> Self {
        Self { sprites: BuiltinSprites }
    }
}

impl Mfen<Box<dyn SpriteSource>> {
    /// Renderer using the sprite directory from `config`, or the built-in
    /// sprites when none is configured.
    pub fn from_config(config: &MfenConfig) -> Self {
        let sprites: Box<dyn SpriteSource> = match &config.sprites.dir {
            Some(dir) => Box::new(DirectorySprites::new(dir)),
            None => Box::new(BuiltinSprites),
        };
        Self { sprites }
    }
}

impl<S: SpriteSource> Mfen<S> {
    pub fn new(sprites: S) -> Self {
        Self { sprites }
    }

    pub fn sprites(&self) -> &S {
        &self.sprites
    }

    /// Render the board described by `config`.
    ///
    /// Never fails: errors are reported through the returned result, which
    /// then holds an error image.
    #[tracing::instrument(skip(self, config), fields(position = %config.board.position, size = %config.board.size))]
    pub fn render(&self, config: &MfenConfig, mode: RenderMode) -> RenderResult {
        // Errors are reported in the requested format when it is valid
        let fallback = config
            .output
            .mime
            .parse::<MimeKind>()
            .map(|mime| Encoding::new(mime, config.output.quality, config.output.filter))
            .unwrap_or_default();

        let prepared = match prepare(config) {
            Ok(prepared) => prepared,
            Err(error) => {
                tracing::warn!(code = error.code(), error = %error, "invalid render request");
                return RenderResult::errored(error, fallback);
            }
        };

        let encoding = prepared.encoding;
        match self.run(config, prepared, mode) {
            Ok(state) => RenderResult { state, encoding },
            Err(error) => {
                tracing::warn!(code = error.code(), error = %error, "render failed");
                RenderResult::errored(error, encoding)
            }
        }
    }

    /// Cache key for the request in `config`, without rendering anything.
    pub fn cache_key(&self, config: &MfenConfig) -> MfenResult<(CacheKey, Encoding)> {
        let prepared = prepare(config)?;
        Ok((prepared.key, prepared.encoding))
    }

    fn run(&self, config: &MfenConfig, prepared: Prepared, mode: RenderMode) -> MfenResult<RenderState> {
        let cache = config
            .cache
            .enabled
            .then(|| CacheStore::new(&config.cache.dir, config.cache.public_location.clone()));

        if let Some(cache) = cache.as_ref().filter(|_| !config.cache.purge) {
            match mode {
                RenderMode::LocationOnly => {
                    if let Some(location) = cache.contains(&prepared.key, prepared.encoding.mime) {
                        tracing::debug!(key = %prepared.key, "cache hit (location only)");
                        return Ok(RenderState::Located(location));
                    }
                }
                RenderMode::Image => {
                    if let Some(hit) = cache.lookup(&prepared.key, &prepared.encoding) {
                        tracing::debug!(key = %prepared.key, "cache hit");
                        return Ok(RenderState::Ready(Rendered {
                            image: hit.image,
                            bytes: hit.bytes,
                            location: Some(hit.location),
                            source: ImageSource::Cache,
                        }));
                    }
                }
            }
            tracing::debug!(key = %prepared.key, "cache miss");
        }

        let board = compose(&prepared.grid, prepared.light, prepared.dark, &self.sprites)?;
        let image = downscale(board, prepared.edge);
        let bytes = prepared.encoding.encode(&image)?;

        let location = match &cache {
            Some(cache) => Some(cache.store(&prepared.key, prepared.encoding.mime, &bytes)?),
            None => None,
        };

        tracing::info!(key = %prepared.key, edge = prepared.edge, bytes = bytes.len(), "rendered board");
        Ok(RenderState::Ready(Rendered { image, bytes, location, source: ImageSource::Composed }))
    }
}

fn prepare(config: &MfenConfig) -> MfenResult<Prepared> {
    let edge = resolve_size(Some(&config.board.size))?;
    let grid = BoardGrid::parse(&config.board.position)?;
    let light = decode_hex(&config.board.light).map_err(|e| MfenError::invalid_hex(&config.board.light, e))?;
    let dark = decode_hex(&config.board.dark).map_err(|e| MfenError::invalid_hex(&config.board.dark, e))?;
    let mime: MimeKind = config.output.mime.parse()?;
    let encoding = Encoding::new(mime, config.output.quality, config.output.filter);
    let key = KeyParams::new(grid.placement(), edge, encoding, light, dark).digest();
    Ok(Prepared { grid, edge, light, dark, encoding, key })
}
