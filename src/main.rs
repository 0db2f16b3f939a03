//! Romsprite - Command-line tool for extracting sprite sheets from SNES ROM images

use std::process::ExitCode;

use romsprite::cli;

fn main() -> ExitCode {
    cli::run()
}
