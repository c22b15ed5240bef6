//! Cache key derivation

use crate::color::encode_hex;
use crate::output::{Encoding, MimeKind, PngFilter};
use image::Rgb;
use sha2::{Digest, Sha256};
use std::fmt;

/// Every input that changes the rendered bytes.
///
/// Values are the effective ones: the normalized placement field, the
/// resolved edge length, the clamped quality and lowercase six-digit colors.
/// Two requests that render identically therefore share a key even if the
/// user typed them differently (`#FFF` vs `ffffff`, `huge` vs `1024`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyParams {
    pub position: String,
    pub edge: u32,
    pub mime: MimeKind,
    pub quality: u8,
    pub filter: PngFilter,
    pub light: String,
    pub dark: String,
}

impl KeyParams {
    pub fn new(position: &str, edge: u32, encoding: Encoding, light: Rgb<u8>, dark: Rgb<u8>) -> Self {
        Self {
            position: position.to_string(),
            edge,
            mime: encoding.mime,
            quality: encoding.quality,
            filter: encoding.filter,
            light: encode_hex(light),
            dark: encode_hex(dark),
        }
    }

    /// Hash the parameters into a cache key.
    ///
    /// Each field is fed to SHA-256 as a `name:len:value;` record, so no two
    /// different tuples can produce the same byte stream.
    pub fn digest(&self) -> CacheKey {
        let edge = self.edge.to_string();
        let quality = self.quality.to_string();
        let fields: [(&str, &str); 7] = [
            ("position", self.position.as_str()),
            ("size", edge.as_str()),
            ("mime", self.mime.mime_type()),
            ("quality", quality.as_str()),
            ("filter", self.filter.name()),
            ("light", self.light.as_str()),
            ("dark", self.dark.as_str()),
        ];

        let mut hasher = Sha256::new();
        for (name, value) in fields {
            hasher.update(name.as_bytes());
            hasher.update(b":");
            hasher.update(value.len().to_string().as_bytes());
            hasher.update(b":");
            hasher.update(value.as_bytes());
            hasher.update(b";");
        }
        CacheKey(hex::encode(hasher.finalize()))
    }
}

/// Lowercase hex SHA-256 digest naming one cache entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the entry for this key in `mime` format
    pub fn file_name(&self, mime: MimeKind) -> String {
        format!("{}.{}", self.0, mime.extension())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
