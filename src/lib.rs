//! mfen - Render chess positions to board images
//!
//! This library provides functionality to:
//! - Parse the piece-placement field of a FEN string into a board grid
//! - Compose the board at full resolution from piece sprites and downscale it
//! - Encode the result as PNG or JPEG
//! - Cache rendered boards on disk, keyed by a hash of every rendering input
//! - Report failures in-band as a small error image
//!
//! # Example
//! ```no_run
//! use mfen::{Mfen, MfenConfig, RenderMode};
//!
//! let mut config = MfenConfig::default();
//! config.board.position = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R".to_string();
//! config.board.size = "small".to_string();
//!
//! let result = Mfen::builtin().render(&config, RenderMode::Image);
//! if let Some((code, message)) = result.last_error() {
//!     eprintln!("Error {}: {}", code, message);
//! }
//! result.output(Some(std::path::Path::new("board.png"))).unwrap();
//! ```

pub mod board;
pub mod cache;
pub mod cli;
pub mod color;
pub mod config;
pub mod error;
pub mod error_image;
pub mod glyph;
pub mod mfen;
pub mod output;
pub mod renderer;
pub mod size;
pub mod sprites;

pub use board::{BoardGrid, Piece, PieceColor, PieceKind, STARTING_POSITION};
pub use config::{MfenConfig, Overrides};
pub use error::{MfenError, MfenResult};
pub use mfen::{ImageSource, Mfen, RenderMode, RenderResult, RenderState, Rendered};
pub use output::{Encoding, MimeKind, PngFilter};
pub use sprites::{BuiltinSprites, DirectorySprites, MemorySprites, SpriteSource};
