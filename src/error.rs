//! Render pipeline error taxonomy
//!
//! Every failure in a render maps to one [`MfenError`] variant with a stable
//! numeric code. The code and message end up in the error image and in
//! [`crate::RenderResult::last_error`].

use crate::board::ParseError;
use crate::color::ColorError;
use crate::output::UnsupportedMime;
use crate::size::SizeError;
use crate::sprites::SpriteError;
use std::path::PathBuf;
use thiserror::Error;

pub type MfenResult<T> = Result<T, MfenError>;

#[derive(Debug, Error)]
pub enum MfenError {
    #[error("invalid size: {0}")]
    InvalidSize(#[from] SizeError),

    #[error("invalid position: {0}")]
    InvalidCharacters(#[from] ParseError),

    #[error("image creation failed: {0}")]
    ImageCreationFailed(String),

    #[error("unsupported mime kind '{0}'")]
    UnsupportedMimeKind(String),

    #[error("cache directory {} unavailable: {reason}", .path.display())]
    CacheDirectoryUnavailable { path: PathBuf, reason: String },

    #[error("invalid color '{input}': {source}")]
    InvalidHex {
        input: String,
        #[source]
        source: ColorError,
    },

    #[error(transparent)]
    SpriteUnavailable(#[from] SpriteError),

    #[error("encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MfenError {
    /// Stable numeric code shown as `Error {code}: ...`
    pub fn code(&self) -> u16 {
        match self {
            MfenError::InvalidSize(_) => 1,
            MfenError::InvalidCharacters(_) => 2,
            MfenError::ImageCreationFailed(_) => 3,
            MfenError::UnsupportedMimeKind(_) => 4,
            MfenError::CacheDirectoryUnavailable { .. } => 5,
            MfenError::InvalidHex { .. } => 6,
            MfenError::SpriteUnavailable(_) => 7,
            MfenError::Encode(_) => 8,
            MfenError::Io(_) => 9,
        }
    }

    pub fn invalid_hex(input: impl Into<String>, source: ColorError) -> Self {
        Self::InvalidHex { input: input.into(), source }
    }

    pub fn cache_dir(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::CacheDirectoryUnavailable { path: path.into(), reason: reason.to_string() }
    }
}

impl From<UnsupportedMime> for MfenError {
    fn from(e: UnsupportedMime) -> Self {
        MfenError::UnsupportedMimeKind(e.0)
    }
}
