//! Extract command implementation

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use image::Rgba;
use tracing::{debug, info};

use crate::canvas::Canvas;
use crate::color::parse_hex_color;
use crate::config::{load_config, CliOverrides};
use crate::metroid3::{import_sheet, master_palette, Metroid3Rom, SpriteKind, Weapon};
use crate::output::{image_name_path, save_png, scale_image};
use crate::sheet::{frame_image, render_sheet, Sheet};

use super::{open_game, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Execute the extract command
///
/// CLI paths are taken as given; paths from romsprite.toml are relative to
/// the config file.
pub fn run_extract(
    rom_path: &Path,
    sheet: Option<PathBuf>,
    config_path: Option<&Path>,
    output: Option<PathBuf>,
    scale: Option<u32>,
    weapon: Option<String>,
    split: bool,
) -> ExitCode {
    let (mut config, found) = match load_config(config_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    if let Some(ref path) = found {
        info!("Using config {}", path.display());
    }

    CliOverrides { sheet, dir: output, scale, weapon }.apply_to(&mut config);

    let Some(sheet_path) = config.sheet.path.clone() else {
        eprintln!("Error: No sheet metadata given (use --sheet or [sheet] path in romsprite.toml)");
        return ExitCode::from(EXIT_INVALID_ARGS);
    };
    let out_dir = config.output.dir.clone();

    let sprite = match SpriteKind::from_name(&config.import.sprite) {
        Ok(sprite) => sprite,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };
    let border_color: Option<Rgba<u8>> = match config.sheet.border_color.as_deref().map(parse_hex_color).transpose() {
        Ok(color) => color,
        Err(e) => {
            eprintln!("Error: Invalid border color: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };
    let weapon = Weapon::from_name(&config.import.weapon);

    let sheet = match Sheet::load(&sheet_path) {
        Ok(sheet) => sheet.with_border(config.sheet.border_size, border_color),
        Err(e) => {
            eprintln!("Error: {}: {}", sheet_path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let game = match open_game(rom_path) {
        Ok(game) => game,
        Err(code) => return code,
    };

    let (canvases, master) = match import(&game, &sheet, weapon) {
        Ok(imported) => imported,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    debug!("Imported {} canvases for {} with the {} beam", canvases.len(), sprite.name(), weapon);

    let image = scale_image(render_sheet(&sheet, &canvases, &master), config.output.scale);
    let sheet_file = image_name_path(&out_dir, sprite.name());
    if let Err(e) = save_png(&image, &sheet_file) {
        eprintln!("Error: Cannot save {}: {}", sheet_file.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }
    println!("Saved {} ({}x{})", sheet_file.display(), image.width(), image.height());

    if split {
        let split_dir = out_dir.join(sprite.name());
        for name in sheet.layout_images() {
            let Some(resolved) = sheet.resolve(name) else { continue };
            let framed = frame_image(&sheet, &resolved, canvases.get(name), &master);
            let path = image_name_path(&split_dir, name);
            if let Err(e) = save_png(&scale_image(framed.image, config.output.scale), &path) {
                eprintln!("Error: Cannot save {}: {}", path.display(), e);
                return ExitCode::from(EXIT_ERROR);
            }
            debug!("Saved {}", path.display());
        }
        println!("Saved split images to {}", split_dir.display());
    }

    ExitCode::from(EXIT_SUCCESS)
}

fn import(
    game: &Metroid3Rom,
    sheet: &Sheet,
    weapon: Weapon,
) -> Result<(BTreeMap<String, Canvas>, Vec<Rgba<u8>>), crate::metroid3::ExtractError> {
    let canvases = import_sheet(sheet, game, weapon)?;
    let master = master_palette(game)?;
    Ok((canvases, master))
}
