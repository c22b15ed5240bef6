//! Configuration for mfen renders
//!
//! Provides types and parsing for `mfen.toml` and the override layer the CLI
//! applies on top of it.

pub mod loader;
pub mod schema;

pub use loader::{load_config, ConfigError, CONFIG_FILE_NAME};
pub use schema::*;
