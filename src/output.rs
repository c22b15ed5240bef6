//! Image encoding, decoding and file output

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::{ColorType, ImageEncoder, ImageError, ImageFormat, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;

/// Output image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MimeKind {
    #[default]
    Png,
    Jpeg,
}

impl MimeKind {
    /// File extension used for cache entries
    pub fn extension(self) -> &'static str {
        match self {
            MimeKind::Png => "png",
            MimeKind::Jpeg => "jpg",
        }
    }

    /// MIME type string
    pub fn mime_type(self) -> &'static str {
        match self {
            MimeKind::Png => "image/png",
            MimeKind::Jpeg => "image/jpeg",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            MimeKind::Png => ImageFormat::Png,
            MimeKind::Jpeg => ImageFormat::Jpeg,
        }
    }
}

/// Returned when a mime kind string names a format that isn't supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedMime(pub String);

impl FromStr for MimeKind {
    type Err = UnsupportedMime;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" | "image/png" => Ok(MimeKind::Png),
            "jpg" | "jpeg" | "image/jpeg" | "image/jpg" => Ok(MimeKind::Jpeg),
            _ => Err(UnsupportedMime(s.to_string())),
        }
    }
}

impl fmt::Display for MimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// PNG row filter strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PngFilter {
    None,
    Sub,
    Up,
    Avg,
    Paeth,
    #[default]
    Adaptive,
}

impl PngFilter {
    pub fn name(self) -> &'static str {
        match self {
            PngFilter::None => "none",
            PngFilter::Sub => "sub",
            PngFilter::Up => "up",
            PngFilter::Avg => "avg",
            PngFilter::Paeth => "paeth",
            PngFilter::Adaptive => "adaptive",
        }
    }

    fn codec_filter(self) -> PngFilterType {
        match self {
            PngFilter::None => PngFilterType::NoFilter,
            PngFilter::Sub => PngFilterType::Sub,
            PngFilter::Up => PngFilterType::Up,
            PngFilter::Avg => PngFilterType::Avg,
            PngFilter::Paeth => PngFilterType::Paeth,
            PngFilter::Adaptive => PngFilterType::Adaptive,
        }
    }
}

impl FromStr for PngFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(PngFilter::None),
            "sub" => Ok(PngFilter::Sub),
            "up" => Ok(PngFilter::Up),
            "avg" => Ok(PngFilter::Avg),
            "paeth" => Ok(PngFilter::Paeth),
            "adaptive" | "all" => Ok(PngFilter::Adaptive),
            _ => Err(format!("unknown PNG filter '{}'", s)),
        }
    }
}

impl fmt::Display for PngFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Codec settings for one render: format, quality and PNG filter.
///
/// Quality is format specific: a 0-9 compression level for PNG and a 1-100
/// quality for JPEG. [`Encoding::new`] clamps it into that range, so the
/// stored value is always the effective one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Encoding {
    pub mime: MimeKind,
    pub quality: u8,
    pub filter: PngFilter,
}

impl Encoding {
    pub fn new(mime: MimeKind, quality: u8, filter: PngFilter) -> Self {
        let quality = match mime {
            MimeKind::Png => quality.min(9),
            MimeKind::Jpeg => quality.clamp(1, 100),
        };
        Self { mime, quality, filter }
    }

    /// Encode an image into bytes of this format.
    ///
    /// JPEG has no alpha channel; transparent pixels are flattened onto white.
    pub fn encode(&self, image: &RgbaImage) -> Result<Vec<u8>, ImageError> {
        let mut bytes = Vec::new();
        let (width, height) = image.dimensions();
        match self.mime {
            MimeKind::Png => {
                let encoder = PngEncoder::new_with_quality(
                    &mut bytes,
                    png_compression(self.quality),
                    self.filter.codec_filter(),
                );
                encoder.write_image(image.as_raw(), width, height, ColorType::Rgba8)?;
            }
            MimeKind::Jpeg => {
                let flat = flatten_onto_white(image);
                let encoder = JpegEncoder::new_with_quality(&mut bytes, self.quality);
                encoder.write_image(flat.as_raw(), width, height, ColorType::Rgb8)?;
            }
        }
        Ok(bytes)
    }

    /// Decode bytes that are expected to be in this format.
    pub fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, ImageError> {
        let image = image::load_from_memory_with_format(bytes, self.mime.image_format())?;
        Ok(image.to_rgba8())
    }
}

impl Default for Encoding {
    fn default() -> Self {
        Self::new(MimeKind::Png, 9, PngFilter::default())
    }
}

fn png_compression(level: u8) -> CompressionType {
    match level {
        0..=2 => CompressionType::Fast,
        3..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

fn flatten_onto_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let blend = |c: u8| ((c as u16 * a as u16 + 255 * (255 - a as u16)) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Write encoded bytes to a file, creating parent directories if needed.
pub fn save_bytes(bytes: &[u8], path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)
}
