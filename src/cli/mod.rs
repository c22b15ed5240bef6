//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod cache;
mod render;

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::{load_config, MfenConfig, Overrides};
use crate::output::PngFilter;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// mfen - Render chess positions to board images
#[derive(Parser)]
#[command(name = "mfen")]
#[command(about = "mfen - Render chess positions (FEN piece placement) to PNG or JPEG board images")]
#[command(version)]
pub struct Cli {
    /// Path to mfen.toml (default: search upward from the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a position to an image, using the cache when possible
    Render {
        #[command(flatten)]
        request: RequestArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the cache location instead of the image when the board is
        /// already cached
        #[arg(long)]
        location_only: bool,
    },

    /// Show the cache key and location of a render without rendering it
    Key {
        #[command(flatten)]
        request: RequestArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete every cached board image
    ClearCache {
        /// Cache directory (default: from mfen.toml)
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

/// Render request options shared by `render` and `key`.
///
/// Anything left unset falls back to mfen.toml, then to the defaults.
#[derive(Args, Debug, Default, Clone)]
pub struct RequestArgs {
    /// Position in FEN; only the piece-placement field is used
    pub position: Option<String>,

    /// Preset (tiny, small, medium, large, huge) or edge length in pixels
    #[arg(short, long)]
    pub size: Option<String>,

    /// Light square color (hex, e.g. DFE3E8 or #fff)
    #[arg(long)]
    pub light: Option<String>,

    /// Dark square color (hex)
    #[arg(long)]
    pub dark: Option<String>,

    /// Output format: png or jpeg
    #[arg(short, long)]
    pub mime: Option<String>,

    /// PNG compression level (0-9) or JPEG quality (1-100)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub quality: Option<u8>,

    /// PNG row filter: none, sub, up, avg, paeth, adaptive
    #[arg(long)]
    pub filter: Option<PngFilter>,

    /// Neither read nor write the cache
    #[arg(long)]
    pub no_cache: bool,

    /// Cache directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Prefix for reported cache locations (e.g. a URL)
    #[arg(long)]
    pub public_location: Option<String>,

    /// Re-render and overwrite any cached image
    #[arg(long)]
    pub purge: bool,

    /// Directory of piece sprites named {w|b}{k|q|r|b|n|p}.png
    #[arg(long)]
    pub sprites: Option<PathBuf>,
}

impl RequestArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            position: self.position.clone(),
            size: self.size.clone(),
            light: self.light.clone(),
            dark: self.dark.clone(),
            mime: self.mime.clone(),
            quality: self.quality,
            filter: self.filter,
            use_caching: self.no_cache.then_some(false),
            cache_dir: self.cache_dir.clone(),
            public_location: self.public_location.clone(),
            purge: self.purge.then_some(true),
            sprites_dir: self.sprites.clone(),
        }
    }
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    match cli.command {
        Commands::Render { request, output, location_only } => {
            let config = config.with_overrides(&request.overrides());
            render::run_render(&config, output.as_deref(), location_only)
        }
        Commands::Key { request, json } => {
            let config = config.with_overrides(&request.overrides());
            cache::run_key(&config, json)
        }
        Commands::ClearCache { cache_dir } => {
            let overrides = Overrides { cache_dir, ..Default::default() };
            cache::run_clear_cache(&config.with_overrides(&overrides))
        }
    }
}

/// Install the stderr log subscriber. Warnings only unless `-v` is given.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Format a path for messages, relative to the working directory when possible.
pub(crate) fn display_path(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}

/// Reject configurations whose overrides made them structurally invalid.
pub(crate) fn check_config(config: &MfenConfig) -> Result<(), ExitCode> {
    let errors = config.validate();
    if errors.is_empty() {
        return Ok(());
    }
    for error in errors {
        eprintln!("Error: {}", error);
    }
    Err(ExitCode::from(EXIT_INVALID_ARGS))
}
