//! Fixed-width bitmap text drawing
//!
//! Glyphs come from the 8x8 `font8x8` basic set and are drawn as solid
//! blocks, `scale` pixels per font pixel. Characters outside the set are
//! drawn as `?`.

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgba, RgbaImage};

/// Width and height of one unscaled glyph cell
pub const GLYPH_EDGE: u32 = 8;

/// Pixel width of `text` drawn at `scale`, saturating at `u32::MAX`
pub fn text_width(text: &str, scale: u32) -> u32 {
    let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
    chars.saturating_mul(GLYPH_EDGE.saturating_mul(scale))
}

/// Draw `text` with its top-left corner at `(x, y)`.
///
/// Pixels falling outside the image are skipped.
pub fn draw_text(image: &mut RgbaImage, text: &str, x: u32, y: u32, scale: u32, color: Rgba<u8>) {
    let mut cursor = x;
    for c in text.chars() {
        draw_glyph(image, c, cursor, y, scale, color);
        cursor = cursor.saturating_add(GLYPH_EDGE.saturating_mul(scale));
    }
}

fn draw_glyph(image: &mut RgbaImage, c: char, x: u32, y: u32, scale: u32, color: Rgba<u8>) {
    let Some(rows) = BASIC_FONTS.get(c).or_else(|| BASIC_FONTS.get('?')) else {
        return;
    };
    for (row, bits) in rows.iter().enumerate() {
        for col in 0..GLYPH_EDGE {
            // Bit 0 is the leftmost pixel
            if bits & (1 << col) == 0 {
                continue;
            }
            let px = x.saturating_add(col.saturating_mul(scale));
            let py = y.saturating_add((row as u32).saturating_mul(scale));
            fill_block(image, px, py, scale, color);
        }
    }
}

fn fill_block(image: &mut RgbaImage, x: u32, y: u32, edge: u32, color: Rgba<u8>) {
    let (width, height) = image.dimensions();
    for py in y..y.saturating_add(edge).min(height) {
        for px in x..x.saturating_add(edge).min(width) {
            image.put_pixel(px, py, color);
        }
    }
}
