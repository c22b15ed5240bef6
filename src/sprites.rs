//! Piece sprite sources
//!
//! The renderer asks a [`SpriteSource`] for one bitmap per piece. Three
//! sources ship with the crate:
//!
//! - [`DirectorySprites`] loads `{w|b}{p|n|b|r|q|k}.png` files from disk
//! - [`MemorySprites`] serves bitmaps supplied by the caller
//! - [`BuiltinSprites`] draws a simple disc-and-letter glyph for each piece

use crate::board::{Piece, PieceColor};
use crate::glyph::{draw_text, text_width, GLYPH_EDGE};
use image::{Rgba, RgbaImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Edge length every sprite is drawn at
pub const SPRITE_EDGE: u32 = 128;

#[derive(Debug, Error)]
pub enum SpriteError {
    #[error("no sprite for {0}")]
    Missing(Piece),
    #[error("failed to load sprite for {piece} from {}: {source}", .path.display())]
    Load {
        piece: Piece,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Provides the bitmap for each piece.
pub trait SpriteSource {
    /// Bitmap for `piece`. Sprites are expected to be 128x128; the renderer
    /// resizes anything else.
    fn sprite(&self, piece: Piece) -> Result<RgbaImage, SpriteError>;
}

impl<S: SpriteSource + ?Sized> SpriteSource for &S {
    fn sprite(&self, piece: Piece) -> Result<RgbaImage, SpriteError> {
        (**self).sprite(piece)
    }
}

impl<S: SpriteSource + ?Sized> SpriteSource for Box<S> {
    fn sprite(&self, piece: Piece) -> Result<RgbaImage, SpriteError> {
        (**self).sprite(piece)
    }
}

/// Sprite files in a directory, named by color prefix and piece letter
/// (`wk.png` is the white king, `bn.png` the black knight).
#[derive(Debug, Clone)]
pub struct DirectorySprites {
    dir: PathBuf,
}

impl DirectorySprites {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the sprite file for `piece`
    pub fn path_for(&self, piece: Piece) -> PathBuf {
        self.dir.join(sprite_file_name(piece))
    }
}

impl SpriteSource for DirectorySprites {
    fn sprite(&self, piece: Piece) -> Result<RgbaImage, SpriteError> {
        let path = self.path_for(piece);
        if !path.is_file() {
            return Err(SpriteError::Missing(piece));
        }
        image::open(&path)
            .map(|img| img.to_rgba8())
            .map_err(|source| SpriteError::Load { piece, path, source })
    }
}

/// File name of the sprite for `piece`, e.g. `wq.png`
pub fn sprite_file_name(piece: Piece) -> String {
    format!("{}{}.png", piece.color.prefix(), piece.kind.letter())
}

/// Caller-supplied sprites held in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySprites {
    sprites: HashMap<Piece, RgbaImage>,
}

impl MemorySprites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, piece: Piece, image: RgbaImage) {
        self.sprites.insert(piece, image);
    }

    pub fn with(mut self, piece: Piece, image: RgbaImage) -> Self {
        self.insert(piece, image);
        self
    }
}

impl SpriteSource for MemorySprites {
    fn sprite(&self, piece: Piece) -> Result<RgbaImage, SpriteError> {
        self.sprites.get(&piece).cloned().ok_or(SpriteError::Missing(piece))
    }
}

/// Procedurally drawn sprites: a filled disc with the piece letter on a
/// transparent background. White pieces are a light disc with dark ink,
/// black pieces the reverse.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinSprites;

const LETTER_SCALE: u32 = 7;
const DISC_RADIUS: f32 = 50.0;
const RIM_WIDTH: f32 = 4.0;

impl SpriteSource for BuiltinSprites {
    fn sprite(&self, piece: Piece) -> Result<RgbaImage, SpriteError> {
        let (fill, ink) = match piece.color {
            PieceColor::White => (Rgba([250, 250, 250, 255]), Rgba([30, 30, 30, 255])),
            PieceColor::Black => (Rgba([30, 30, 30, 255]), Rgba([250, 250, 250, 255])),
        };

        let center = SPRITE_EDGE as f32 / 2.0;
        let mut image = RgbaImage::from_fn(SPRITE_EDGE, SPRITE_EDGE, |x, y| {
            let dx = x as f32 + 0.5 - center;
            let dy = y as f32 + 0.5 - center;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist > DISC_RADIUS {
                Rgba([0, 0, 0, 0])
            } else if dist > DISC_RADIUS - RIM_WIDTH {
                ink
            } else {
                fill
            }
        });

        let letter = piece.kind.letter().to_ascii_uppercase().to_string();
        let offset = (SPRITE_EDGE - text_width(&letter, LETTER_SCALE)) / 2;
        let top = (SPRITE_EDGE - GLYPH_EDGE * LETTER_SCALE) / 2;
        draw_text(&mut image, &letter, offset, top, LETTER_SCALE, ink);
        Ok(image)
    }
}
