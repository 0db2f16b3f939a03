//! Palette command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::color::{rgb555_to_rgba, to_hex};
use crate::metroid3::{ExtractError, PaletteFrame, PaletteKind};

use super::{open_game, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Execute the palette command
pub fn run_palette(path: &Path, kind: &str, suit: Option<&str>, json: bool) -> ExitCode {
    let game = match open_game(path) {
        Ok(game) => game,
        Err(code) => return code,
    };

    let frames = match game.palette_by_name(kind, suit) {
        Ok(frames) => frames,
        Err(e @ ExtractError::UnknownPaletteKind(_)) => {
            eprintln!("Error: {}", e);
            eprintln!();
            eprintln!("Available palette types:");
            for kind in PaletteKind::ALL {
                let note = if kind.is_suited() { " (needs --suit)" } else { "" };
                eprintln!("  {}{}", kind, note);
            }
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
        Err(e @ ExtractError::InvalidVariant(_)) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if json {
        match serde_json::to_string_pretty(&frames) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else {
        for (i, frame) in frames.iter().enumerate() {
            println!("{}", format_frame(i, frame));
        }
    }

    ExitCode::from(EXIT_SUCCESS)
}

fn format_frame(index: usize, frame: &PaletteFrame) -> String {
    let address = match frame.address {
        Some(addr) => format!("${:06X}", addr),
        None => "-".to_string(),
    };
    let duration = if frame.duration == 0 { "hold".to_string() } else { frame.duration.to_string() };
    let colors: Vec<String> = frame.colors.iter().map(|&c| to_hex(rgb555_to_rgba(c))).collect();
    format!("{:>3} {:>7} {:>5}  {}", index, address, duration, colors.join(" "))
}
