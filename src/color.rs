//! Hex color parsing for board square colors
//!
//! Supports the following formats:
//! - `RGB` / `RRGGBB`
//! - the same with a leading `#` or `0x` (e.g. `#DFE3E8`, `0x9da8bd`, `#abc`)

use image::Rgb;
use thiserror::Error;

/// Error type for color parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    /// Input string was empty after removing the prefix
    #[error("empty color string")]
    Empty,
    /// Invalid length (must be 3 or 6 hex chars after the prefix)
    #[error("invalid color length {0}, expected 3 or 6")]
    InvalidLength(usize),
    /// Contains non-hex characters
    #[error("invalid hex character '{0}'")]
    InvalidHex(char),
}

/// Parse a hex color string into an RGB color.
///
/// A single leading `#` and a leading `0x` (or `0X`) are stripped, in that
/// order. Three-digit shorthand doubles every digit, so `abc` is `aabbcc`.
///
/// # Examples
///
/// ```
/// use mfen::color::decode_hex;
/// use image::Rgb;
///
/// assert_eq!(decode_hex("#DFE3E8").unwrap(), Rgb([0xDF, 0xE3, 0xE8]));
/// assert_eq!(decode_hex("0xf00").unwrap(), Rgb([255, 0, 0]));
/// assert!(decode_hex("#12345").is_err());
/// ```
///
/// # Errors
///
/// Returns `ColorError` for empty input, a bad length, or non-hex characters.
pub fn decode_hex(s: &str) -> Result<Rgb<u8>, ColorError> {
    let hex = strip_prefix(s);
    if hex.is_empty() {
        return Err(ColorError::Empty);
    }

    // Validate all characters are hex before looking at the length, so the
    // error names the offending character
    if let Some(c) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(ColorError::InvalidHex(c));
    }

    let digits: Vec<u8> = hex.bytes().map(hex_value).collect();
    match digits.as_slice() {
        // RGB -> RRGGBB (doubled digits)
        [r, g, b] => Ok(Rgb([r * 17, g * 17, b * 17])),
        [r1, r0, g1, g0, b1, b0] => Ok(Rgb([r1 * 16 + r0, g1 * 16 + g0, b1 * 16 + b0])),
        _ => Err(ColorError::InvalidLength(digits.len())),
    }
}

/// Format a color as lowercase six-digit hex without a prefix.
///
/// This is the normalized form used wherever a color takes part in a cache key.
pub fn encode_hex(color: Rgb<u8>) -> String {
    let Rgb([r, g, b]) = color;
    format!("{:02x}{:02x}{:02x}", r, g, b)
}

fn strip_prefix(s: &str) -> &str {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s)
}

/// Value of an ASCII hex digit; callers validate the character first.
fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        b'A'..=b'F' => b - b'A' + 10,
        _ => 0,
    }
}
