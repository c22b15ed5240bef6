//! Configuration schema types for `mfen.toml`
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration that renders the starting position at medium size.

use crate::board::STARTING_POSITION;
use crate::output::PngFilter;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What to draw and how big
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Position string; only the piece-placement field is used
    #[serde(default = "default_position")]
    pub position: String,
    /// Preset name (`tiny`, `small`, `medium`, `large`, `huge`) or edge length
    #[serde(default = "default_size")]
    pub size: String,
    /// Light square color as hex
    #[serde(default = "default_light")]
    pub light: String,
    /// Dark square color as hex
    #[serde(default = "default_dark")]
    pub dark: String,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            position: default_position(),
            size: default_size(),
            light: default_light(),
            dark: default_dark(),
        }
    }
}

fn default_position() -> String {
    STARTING_POSITION.to_string()
}

fn default_size() -> String {
    "medium".to_string()
}

fn default_light() -> String {
    "DFE3E8".to_string()
}

fn default_dark() -> String {
    "9DA8BD".to_string()
}

/// Encoded image settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// `png` or `jpeg` (MIME types such as `image/png` are accepted too)
    #[serde(default = "default_mime")]
    pub mime: String,
    /// PNG compression level 0-9 or JPEG quality 1-100
    #[serde(default = "default_quality")]
    pub quality: u8,
    /// PNG row filter; ignored for JPEG
    #[serde(default)]
    pub filter: PngFilter,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { mime: default_mime(), quality: default_quality(), filter: PngFilter::default() }
    }
}

fn default_mime() -> String {
    "png".to_string()
}

fn default_quality() -> u8 {
    9
}

/// Render cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Read and write the cache at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Directory holding cached images
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
    /// Prefix for the public location of cached images (e.g. a URL)
    #[serde(default = "default_public_location")]
    pub public_location: String,
    /// Skip the cache read and overwrite the entry
    #[serde(default)]
    pub purge: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: default_cache_dir(),
            public_location: default_public_location(),
            purge: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

fn default_public_location() -> String {
    "/cache".to_string()
}

/// Piece artwork
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SpritesConfig {
    /// Directory of `{w|b}{piece}.png` sprites; built-in sprites when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Complete mfen.toml configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MfenConfig {
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub sprites: SpritesConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "output.quality")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mfen.toml: '{}' {}", self.field, self.message)
    }
}

/// Per-invocation values that take precedence over the loaded configuration
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub position: Option<String>,
    pub size: Option<String>,
    pub light: Option<String>,
    pub dark: Option<String>,
    pub mime: Option<String>,
    pub quality: Option<u8>,
    pub filter: Option<PngFilter>,
    pub use_caching: Option<bool>,
    pub cache_dir: Option<PathBuf>,
    pub public_location: Option<String>,
    pub purge: Option<bool>,
    pub sprites_dir: Option<PathBuf>,
}

impl MfenConfig {
    /// Validate structural settings and return any errors.
    ///
    /// Request values (position, size, colors, mime) are not checked here;
    /// the render reports them in-band as an error image.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.output.quality > 100 {
            errors.push(ConfigValidationError {
                field: "output.quality".to_string(),
                message: "must be between 0 and 100".to_string(),
            });
        }

        if self.cache.enabled && self.cache.dir.as_os_str().is_empty() {
            errors.push(ConfigValidationError {
                field: "cache.dir".to_string(),
                message: "must be a non-empty path when caching is enabled".to_string(),
            });
        }

        if let Some(dir) = &self.sprites.dir {
            if dir.as_os_str().is_empty() {
                errors.push(ConfigValidationError {
                    field: "sprites.dir".to_string(),
                    message: "must be a non-empty path".to_string(),
                });
            }
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// A copy of this configuration with every set override applied.
    pub fn with_overrides(&self, overrides: &Overrides) -> MfenConfig {
        let mut config = self.clone();

        if let Some(ref position) = overrides.position {
            config.board.position = position.clone();
        }
        if let Some(ref size) = overrides.size {
            config.board.size = size.clone();
        }
        if let Some(ref light) = overrides.light {
            config.board.light = light.clone();
        }
        if let Some(ref dark) = overrides.dark {
            config.board.dark = dark.clone();
        }

        if let Some(ref mime) = overrides.mime {
            config.output.mime = mime.clone();
        }
        if let Some(quality) = overrides.quality {
            config.output.quality = quality;
        }
        if let Some(filter) = overrides.filter {
            config.output.filter = filter;
        }

        if let Some(enabled) = overrides.use_caching {
            config.cache.enabled = enabled;
        }
        if let Some(ref dir) = overrides.cache_dir {
            config.cache.dir = dir.clone();
        }
        if let Some(ref public_location) = overrides.public_location {
            config.cache.public_location = public_location.clone();
        }
        if let Some(purge) = overrides.purge {
            config.cache.purge = purge;
        }

        if let Some(ref dir) = overrides.sprites_dir {
            config.sprites.dir = Some(dir.clone());
        }

        config
    }
}
