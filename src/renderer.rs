//! Board composition and downscaling
//!
//! Boards are always composed at 1024x1024 (8 squares of 128 pixels) and then
//! resized to the requested edge, so sprite artwork is always scaled from the
//! same source resolution.

use crate::board::{BoardGrid, Piece, BOARD_SIZE};
use crate::error::{MfenError, MfenResult};
use crate::sprites::{SpriteSource, SPRITE_EDGE};
use image::imageops::{self, FilterType};
use image::{Rgb, Rgba, RgbaImage};
use std::collections::HashMap;

/// Edge length of the composed board
pub const BOARD_EDGE: u32 = 1024;

/// Edge length of one square on the composed board
pub const SQUARE_EDGE: u32 = BOARD_EDGE / BOARD_SIZE as u32;

/// Whether the square at `(rank, file)` is a dark square.
///
/// The top-left square of the grid is light.
pub fn is_dark_square(rank: usize, file: usize) -> bool {
    (rank + file) % 2 == 1
}

/// Compose the full-resolution board.
///
/// Squares are filled with `light` and `dark`, then every occupied square
/// gets the piece sprite drawn over it. Sprites that aren't 128x128 are
/// resized first. Each distinct piece is fetched from `sprites` once.
///
/// # Errors
///
/// Fails with `SpriteUnavailable` when the source has no usable bitmap for a
/// piece on the board, or `ImageCreationFailed` if the canvas can't be
/// allocated.
pub fn compose(
    grid: &BoardGrid,
    light: Rgb<u8>,
    dark: Rgb<u8>,
    sprites: &dyn SpriteSource,
) -> MfenResult<RgbaImage> {
    let mut canvas = blank_canvas(BOARD_EDGE, BOARD_EDGE)?;

    let light = opaque(light);
    let dark = opaque(dark);
    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let file = (x / SQUARE_EDGE) as usize;
        let rank = (y / SQUARE_EDGE) as usize;
        *pixel = if is_dark_square(rank, file) { dark } else { light };
    }

    let mut loaded: HashMap<Piece, RgbaImage> = HashMap::new();
    for (rank, file, piece) in grid.pieces() {
        if !loaded.contains_key(&piece) {
            let sprite = fit_sprite(sprites.sprite(piece)?);
            loaded.insert(piece, sprite);
        }
        if let Some(sprite) = loaded.get(&piece) {
            let x = file as i64 * SQUARE_EDGE as i64;
            let y = rank as i64 * SQUARE_EDGE as i64;
            imageops::overlay(&mut canvas, sprite, x, y);
        }
    }

    tracing::debug!(pieces = grid.pieces().count(), sprites = loaded.len(), "composed board");
    Ok(canvas)
}

/// Resize a composed board to `edge` x `edge`.
///
/// Uses Lanczos resampling. An edge equal to the board's own size returns it
/// unchanged.
pub fn downscale(board: RgbaImage, edge: u32) -> RgbaImage {
    if board.width() == edge && board.height() == edge {
        return board;
    }
    imageops::resize(&board, edge, edge, FilterType::Lanczos3)
}

/// Allocate a transparent canvas, reporting allocation failure instead of
/// panicking.
pub(crate) fn blank_canvas(width: u32, height: u32) -> MfenResult<RgbaImage> {
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| MfenError::ImageCreationFailed(format!("{}x{} is too large", width, height)))?;
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(len)
        .map_err(|e| MfenError::ImageCreationFailed(format!("{}x{}: {}", width, height, e)))?;
    pixels.resize(len, 0);
    RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| MfenError::ImageCreationFailed(format!("{}x{} buffer mismatch", width, height)))
}

fn fit_sprite(sprite: RgbaImage) -> RgbaImage {
    if sprite.dimensions() == (SPRITE_EDGE, SPRITE_EDGE) {
        return sprite;
    }
    tracing::debug!(
        width = sprite.width(),
        height = sprite.height(),
        "resizing sprite to {}x{}",
        SPRITE_EDGE,
        SPRITE_EDGE
    );
    imageops::resize(&sprite, SPRITE_EDGE, SPRITE_EDGE, FilterType::Lanczos3)
}

fn opaque(color: Rgb<u8>) -> Rgba<u8> {
    let Rgb([r, g, b]) = color;
    Rgba([r, g, b, 255])
}
