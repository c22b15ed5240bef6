//! mfen - Command-line tool for rendering chess positions to board images

use std::process::ExitCode;

use mfen::cli;

fn main() -> ExitCode {
    cli::run()
}
