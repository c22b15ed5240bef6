//! Render command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::config::MfenConfig;
use crate::mfen::{Mfen, RenderMode, RenderState};

use super::{check_config, display_path, EXIT_ERROR, EXIT_SUCCESS};

/// Execute the render command.
///
/// A failed render still writes its error image to the destination, then
/// exits with `EXIT_ERROR`.
pub fn run_render(config: &MfenConfig, output: Option<&Path>, location_only: bool) -> ExitCode {
    if let Err(code) = check_config(config) {
        return code;
    }

    let mode = if location_only { RenderMode::LocationOnly } else { RenderMode::Image };
    let mut result = Mfen::from_config(config).render(config, mode);

    let mut exit = EXIT_SUCCESS;
    if let Some((code, message)) = result.last_error() {
        eprintln!("Error {}: {}", code, message);
        exit = EXIT_ERROR;
    }

    let printed_location = match (location_only, result.state()) {
        (true, RenderState::Located(location)) => {
            println!("{}", location.public);
            true
        }
        (true, RenderState::Ready(rendered)) => match &rendered.location {
            Some(location) => {
                println!("{}", location.public);
                true
            }
            None => false,
        },
        _ => false,
    };

    if !printed_location {
        if let Err(e) = result.output(output) {
            eprintln!("Error: Failed to write image: {}", e);
            exit = EXIT_ERROR;
        } else if let Some(path) = output {
            eprintln!("Saved: {}", display_path(path));
        }
    }

    result.destroy();
    ExitCode::from(exit)
}
