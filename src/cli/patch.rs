//! Patch command implementation

use std::path::Path;
use std::process::ExitCode;

use tracing::info;

use super::{open_game, EXIT_ERROR, EXIT_SUCCESS};

/// Execute the patch command
///
/// The copier header, if any, is written back in front of the content.
pub fn run_patch(path: &Path, output: &Path) -> ExitCode {
    let game = match open_game(path) {
        Ok(game) => game,
        Err(code) => return code,
    };

    let applied = game.patches().iter().filter(|p| p.applied).count();
    let bytes = game.into_rom().to_file_bytes();
    if let Err(e) = std::fs::write(output, &bytes) {
        eprintln!("Error: Cannot write {}: {}", output.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }

    info!("Wrote {} bytes to {}", bytes.len(), output.display());
    println!("Applied {} patches, saved {}", applied, output.display());
    ExitCode::from(EXIT_SUCCESS)
}
