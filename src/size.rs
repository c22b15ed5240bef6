//! Output edge length resolution
//!
//! Sizes arrive as user input: either a preset name or a bare integer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest edge length an image is ever rendered at
pub const MAX_EDGE: u32 = 1024;

/// Edge length used when no usable size is given (the `medium` preset)
pub const DEFAULT_EDGE: u32 = 384;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizeError {
    #[error("unknown size preset '{0}', expected tiny, small, medium, large, huge or a number")]
    UnknownPreset(String),
}

/// Named output sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizePreset {
    Tiny,
    Small,
    Medium,
    Large,
    Huge,
}

impl SizePreset {
    pub fn edge(self) -> u32 {
        match self {
            SizePreset::Tiny => 128,
            SizePreset::Small => 256,
            SizePreset::Medium => 384,
            SizePreset::Large => 512,
            SizePreset::Huge => 1024,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SizePreset::Tiny => "tiny",
            SizePreset::Small => "small",
            SizePreset::Medium => "medium",
            SizePreset::Large => "large",
            SizePreset::Huge => "huge",
        }
    }
}

impl FromStr for SizePreset {
    type Err = SizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tiny" => Ok(SizePreset::Tiny),
            "small" => Ok(SizePreset::Small),
            "medium" => Ok(SizePreset::Medium),
            "large" => Ok(SizePreset::Large),
            "huge" => Ok(SizePreset::Huge),
            _ => Err(SizeError::UnknownPreset(s.to_string())),
        }
    }
}

impl fmt::Display for SizePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve a requested size to an edge length in pixels.
///
/// | Input | Edge |
/// |-------|------|
/// | absent, empty, `0`, negative | 384 (`medium`) |
/// | `1`..=`1024` | as given |
/// | above 1024 | 1024 |
/// | preset name (any case) | preset edge |
/// | anything else | `SizeError::UnknownPreset` |
///
/// # Examples
///
/// ```
/// use mfen::size::resolve_size;
///
/// assert_eq!(resolve_size(None).unwrap(), 384);
/// assert_eq!(resolve_size(Some("tiny")).unwrap(), 128);
/// assert_eq!(resolve_size(Some("2000")).unwrap(), 1024);
/// assert!(resolve_size(Some("bogus")).is_err());
/// ```
pub fn resolve_size(requested: Option<&str>) -> Result<u32, SizeError> {
    let s = match requested.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_EDGE),
        Some(s) => s,
    };

    if is_integer(s) {
        // Digit strings too long for i64 are still sizes, just very large ones
        let edge = s.parse::<i64>().unwrap_or(if s.starts_with('-') { 0 } else { i64::MAX });
        return Ok(clamp_edge(edge));
    }

    s.parse::<SizePreset>().map(SizePreset::edge)
}

fn is_integer(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn clamp_edge(edge: i64) -> u32 {
    if edge <= 0 {
        DEFAULT_EDGE
    } else if edge > MAX_EDGE as i64 {
        MAX_EDGE
    } else {
        edge as u32
    }
}
