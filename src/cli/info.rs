//! Info command implementation

use std::path::Path;
use std::process::ExitCode;

use super::{open_game, EXIT_SUCCESS};

/// Execute the info command
pub fn run_info(path: &Path) -> ExitCode {
    let game = match open_game(path) {
        Ok(game) => game,
        Err(code) => return code,
    };
    let rom = game.rom();

    println!("File:    {}", path.display());
    println!("Layout:  {} ({:#X} bytes)", rom.map_mode(), rom.size());
    println!("Header:  {}", if rom.has_header() { "copier header stripped" } else { "none" });
    match rom.game_title() {
        Ok(title) => println!("Title:   {}", title.trim_end()),
        Err(e) => println!("Title:   unreadable ({})", e),
    }

    match game.death_layout() {
        Ok(layout) if layout.classic => {
            println!("Death:   classic, {} rows from ${:06X}", layout.rows(), layout.left_table)
        }
        Ok(layout) => println!(
            "Death:   patched, {} rows from ${:06X} (left) and ${:06X} (right)",
            layout.rows(),
            layout.left_table,
            layout.right_table
        ),
        Err(e) => println!("Death:   {}", e),
    }

    let applied = game.patches().iter().filter(|p| p.applied).count();
    println!("Patches: {} of {} applied", applied, game.patches().len());
    for patch in game.patches() {
        let mark = if patch.applied { "+" } else { " " };
        println!("  {} ${:06X} {}", mark, patch.addr, patch.name);
    }

    ExitCode::from(EXIT_SUCCESS)
}
