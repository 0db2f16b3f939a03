//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod extract;
mod info;
mod palette;
mod patch;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing::Level;
use tracing_subscriber::util::SubscriberInitExt;

use crate::metroid3::{is_game_title, Metroid3Rom};
use crate::rom::Rom;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Romsprite - Extract sprite sheets from Super Metroid ROM images
#[derive(Parser)]
#[command(name = "romsprite")]
#[command(about = "Romsprite - Extract sprite sheets from Super Metroid ROM images")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the memory layout, header and detected code variants of an image
    Info {
        /// ROM image (.sfc/.smc)
        rom: PathBuf,
    },

    /// Render a sprite sheet from an image and sheet metadata
    Extract {
        /// ROM image (.sfc/.smc)
        rom: PathBuf,

        /// Sheet metadata JSON (overrides romsprite.toml)
        #[arg(short, long)]
        sheet: Option<PathBuf>,

        /// Path to romsprite.toml (searched upward from the current directory if omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Scale output by integer factor (1-16)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=16))]
        scale: Option<u32>,

        /// Equipped beam: standard, charge, ice, wave, plasma or spazer
        #[arg(short, long)]
        weapon: Option<String>,

        /// Also write every framed image to its own PNG
        #[arg(long)]
        split: bool,
    },

    /// Print the frames of a palette animation
    Palette {
        /// ROM image (.sfc/.smc)
        rom: PathBuf,

        /// Palette type (e.g. standard, loader, heat, death_flesh)
        kind: String,

        /// Suit variant for suited palettes: power, varia or gravity
        #[arg(short, long)]
        suit: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Write a copy of an image with the corrective patches applied
    Patch {
        /// ROM image (.sfc/.smc)
        rom: PathBuf,

        /// Output image
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global subscriber; WARN unless raised with `-v`.
///
/// # Panics
///
/// Panics if a global subscriber is already set.
pub fn init_logging(verbose: u8) {
    tracing_subscriber::fmt()
        .with_max_level(log_level(verbose))
        .with_writer(std::io::stderr)
        .compact()
        .finish()
        .init();
}

/// Read an image from disk and wrap it for extraction.
///
/// Errors are reported on stderr; the returned exit code is what the
/// command should end with.
pub(crate) fn open_game(path: &Path) -> Result<Metroid3Rom, ExitCode> {
    let bytes = std::fs::read(path).map_err(|e| {
        eprintln!("Error: Cannot read {}: {}", path.display(), e);
        ExitCode::from(EXIT_ERROR)
    })?;

    let rom = Rom::load(bytes).map_err(|e| {
        eprintln!("Error: {}: {}", path.display(), e);
        ExitCode::from(EXIT_ERROR)
    })?;

    match rom.game_title() {
        Ok(title) if is_game_title(&title) => {}
        Ok(title) => eprintln!("Warning: {} is titled '{}', not Super Metroid", path.display(), title.trim_end()),
        Err(e) => eprintln!("Warning: Cannot read the header title: {}", e),
    }

    Metroid3Rom::new(rom).map_err(|e| {
        eprintln!("Error: {}", e);
        ExitCode::from(EXIT_ERROR)
    })
}

/// Parse arguments, set up logging and run the chosen command.
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { rom } => info::run_info(&rom),
        Commands::Extract { rom, sheet, config, output, scale, weapon, split } => {
            extract::run_extract(&rom, sheet, config.as_deref(), output, scale, weapon, split)
        }
        Commands::Palette { rom, kind, suit, json } => palette::run_palette(&rom, &kind, suit.as_deref(), json),
        Commands::Patch { rom, output } => patch::run_patch(&rom, &output),
    }
}
