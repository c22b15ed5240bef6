//! In-band error images
//!
//! A failed render still produces an image: the text `Error {code}: {message}`
//! in black on a transparent background, sized to fit the text. Long messages
//! wrap onto further lines and are cut after `MAX_LINES`, so the image never
//! grows past `MAX_WIDTH` pixels wide whatever the caller sent in.

use crate::glyph::{draw_text, text_width, GLYPH_EDGE};
use crate::renderer::blank_canvas;
use image::{Rgba, RgbaImage};

/// Font pixels per glyph pixel
const TEXT_SCALE: u32 = 2;

/// Transparent margin around the text
const PADDING: u32 = 4;

/// Vertical space between wrapped lines
const LINE_GAP: u32 = 2;

/// Widest error image, in pixels
pub const MAX_WIDTH: u32 = 1024;

/// Most lines of text drawn; anything past them is replaced by `...`
pub const MAX_LINES: usize = 4;

/// Characters that fit on one line within `MAX_WIDTH`
const LINE_CHARS: usize = ((MAX_WIDTH - 2 * PADDING) / (GLYPH_EDGE * TEXT_SCALE)) as usize;

const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Text rendered into an error image
pub fn error_text(code: u16, message: &str) -> String {
    // Line breaks are decided by `wrap`, not by the message
    let message: String = message.chars().map(|c| if c.is_control() { ' ' } else { c }).collect();
    format!("Error {}: {}", code, message)
}

/// Split `text` into lines of at most `LINE_CHARS` characters, keeping at
/// most `MAX_LINES` of them.
fn wrap(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut lines: Vec<String> =
        chars.chunks(LINE_CHARS).take(MAX_LINES).map(|chunk| chunk.iter().collect()).collect();

    if chars.len() > LINE_CHARS * MAX_LINES {
        if let Some(last) = lines.last_mut() {
            let keep = LINE_CHARS - 3;
            *last = last.chars().take(keep).chain("...".chars()).collect();
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Render an error message as an image.
///
/// Allocation of an image this small does not fail in practice; if it ever
/// does, a 1x1 transparent image is returned so callers always get a bitmap.
pub fn render_error(code: u16, message: &str) -> RgbaImage {
    let lines = wrap(&error_text(code, message));
    let line_height = GLYPH_EDGE * TEXT_SCALE;
    let count = lines.len() as u32;

    let width = lines.iter().map(|line| text_width(line, TEXT_SCALE)).max().unwrap_or(0) + PADDING * 2;
    let height = count * line_height + (count - 1) * LINE_GAP + PADDING * 2;

    let mut image = match blank_canvas(width, height) {
        Ok(image) => image,
        Err(e) => {
            tracing::error!(error = %e, "could not allocate error image");
            return RgbaImage::new(1, 1);
        }
    };
    for (i, line) in lines.iter().enumerate() {
        let y = PADDING + i as u32 * (line_height + LINE_GAP);
        draw_text(&mut image, line, PADDING, y, TEXT_SCALE, INK);
    }
    image
}
