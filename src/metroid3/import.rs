//! Importing a whole sheet from an image
//!
//! Every image on the sheet layout is drawn from its first usage pair. Plain
//! animation numbers go through the pose tables; a handful of names select
//! the special imports (death sequence, arm cannon port, file select screen
//! and the master palette block).

use std::collections::BTreeMap;

use image::Rgba;
use tracing::{debug, warn};

use super::{BodyTable, ExtractError, Facing, Metroid3Rom, PaletteKind, Suit, Weapon};
use crate::canvas::{canvas_from_raw_data, BoundingBox, Canvas, Pixels};
use crate::color::{rgb555_slice_to_rgba, TRANSPARENT};
use crate::sheet::{Sheet, UsageAnimation};
use crate::tile::TilemapEntry;
use crate::vram::DmaWrites;

/// Width of the palette block in colors.
pub const PALETTE_BLOCK_WIDTH: u32 = 15;
/// Height of the palette block in colors.
pub const PALETTE_BLOCK_HEIGHT: u32 = 7;

/// Death sequence tiles with this palette belong to the suit.
const DEATH_SUIT_PALETTE: u8 = 0b100;

/// What a sheet usage pair asks to import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animation {
    /// A regular animation, `pose` selects its frame
    Index(u16),
    DeathLeft,
    DeathRight,
    /// `pose` selects the file select item
    FileSelect,
    /// `pose` is `level * 10 + direction`
    Gun,
    PaletteBlock,
}

/// Interpret the animation half of a usage pair.
pub fn resolve_animation(animation: &UsageAnimation) -> Result<Animation, ExtractError> {
    let name = match animation {
        UsageAnimation::Index(index) => return Ok(Animation::Index(*index)),
        UsageAnimation::Name(name) => name.as_str(),
    };
    match name {
        "death_left" => Ok(Animation::DeathLeft),
        "death_right" => Ok(Animation::DeathRight),
        "file_select" => Ok(Animation::FileSelect),
        "gun" => Ok(Animation::Gun),
        "palette_block" => Ok(Animation::PaletteBlock),
        _ => name
            .strip_prefix("0x")
            .and_then(|hex| u16::from_str_radix(hex, 16).ok())
            .map(Animation::Index)
            .ok_or_else(|| ExtractError::UnknownAnimation(name.to_string())),
    }
}

/// The last 15 colors of a palette as one block row. Short palettes are
/// padded with transparent so later rows keep their indices.
fn block_row(kind: PaletteKind, colors: &[u16]) -> Vec<Rgba<u8>> {
    let width = PALETTE_BLOCK_WIDTH as usize;
    let mut row = rgb555_slice_to_rgba(&colors[colors.len().saturating_sub(width)..]);
    if row.len() < width {
        warn!("The {} palette has only {} colors, padding its row", kind.name(), row.len());
        row.resize(width, TRANSPARENT);
    }
    row
}

/// The 15x7 block of colors every sheet palette range indexes into.
///
/// Rows: the standard power, varia and gravity palettes, death flesh, crystal
/// flash and file select (last 15 colors each), then a blank, the three
/// visor colors, seven blanks, three ship underglow colors and a final blank.
pub fn palette_block(rom: &Metroid3Rom) -> Result<Canvas, ExtractError> {
    let first_frame = |kind: PaletteKind, suit: Option<Suit>| -> Result<Vec<u16>, ExtractError> {
        let frames = rom.palette(kind, suit)?;
        Ok(frames.into_iter().next().map(|f| f.colors).unwrap_or_default())
    };

    let mut colors: Vec<Rgba<u8>> = Vec::with_capacity((PALETTE_BLOCK_WIDTH * PALETTE_BLOCK_HEIGHT) as usize);
    for suit in Suit::ALL {
        colors.extend(block_row(PaletteKind::Standard, &first_frame(PaletteKind::Standard, Some(suit))?));
    }
    for kind in [PaletteKind::DeathFlesh, PaletteKind::CrystalFlash, PaletteKind::FileSelect] {
        colors.extend(block_row(kind, &first_frame(kind, None)?));
    }

    let mut visor = rgb555_slice_to_rgba(&rom.nightvisor_colors()?);
    visor.resize(3, TRANSPARENT);
    colors.push(TRANSPARENT);
    colors.extend(visor);
    colors.extend([TRANSPARENT; 7]);

    // Frame 7 is when the underglow is brightest
    let ship = rom.palette(PaletteKind::Ship, None)?;
    let glow = ship.get(7).map(|f| f.colors.as_slice()).unwrap_or(&[]);
    let picked: Vec<u16> = [1, 9, 15].iter().map(|&i| glow.get(i).copied().unwrap_or(0)).collect();
    colors.extend(rgb555_slice_to_rgba(&picked));
    colors.push(TRANSPARENT);

    let count = colors.len();
    Canvas::from_rgba(PALETTE_BLOCK_WIDTH, PALETTE_BLOCK_HEIGHT, colors).ok_or_else(|| {
        let expected = PALETTE_BLOCK_WIDTH * PALETTE_BLOCK_HEIGHT;
        ExtractError::InvalidArgument(format!("palette block has {} colors instead of {}", count, expected))
    })
}

/// The palette block as a flat list of colors.
pub fn master_palette(rom: &Metroid3Rom) -> Result<Vec<Rgba<u8>>, ExtractError> {
    match palette_block(rom)?.pixels {
        Pixels::Rgba(colors) => Ok(colors),
        Pixels::Indexed(_) => Ok(Vec::new()),
    }
}

/// Draw one usage pair clipped to `bbox`.
pub fn import_pose(
    rom: &Metroid3Rom,
    animation: Animation,
    pose: u16,
    bbox: BoundingBox,
    table: BodyTable,
    weapon: Weapon,
) -> Result<Canvas, ExtractError> {
    let (tilemaps, dma): (Vec<TilemapEntry>, DmaWrites) = match animation {
        Animation::Index(animation) => {
            let data = rom.dma_pose_data(animation, pose, table)?;
            (data.tilemaps, data.dma)
        }
        Animation::DeathLeft | Animation::DeathRight => {
            let facing = if animation == Animation::DeathLeft { Facing::Left } else { Facing::Right };
            let data = rom.death_pose_data(pose, facing)?;
            let tilemaps = data
                .tilemaps
                .into_iter()
                .filter(|t| table.includes_lower() || t.palette == DEATH_SUIT_PALETTE)
                .filter(|t| table.includes_upper() || t.palette != DEATH_SUIT_PALETTE)
                .collect();
            (tilemaps, data.dma)
        }
        Animation::FileSelect => (rom.file_select_tilemaps(pose)?, rom.file_select_dma_data()?),
        Animation::Gun => {
            let gun = rom.minimal_gun_data(pose % 10, pose / 10)?;
            (vec![gun.tilemap], gun.dma())
        }
        Animation::PaletteBlock => return palette_block(rom),
    };

    let vram = rom.pose_vram(&dma, weapon)?;
    Ok(canvas_from_raw_data(&tilemaps, &vram, bbox))
}

/// Draw every image on the sheet layout. The result also holds an empty
/// `nil` canvas.
pub fn import_sheet(sheet: &Sheet, rom: &Metroid3Rom, weapon: Weapon) -> Result<BTreeMap<String, Canvas>, ExtractError> {
    let mut canvases = BTreeMap::new();

    for name in sheet.layout_images() {
        let Some(image) = sheet.resolve(name) else {
            continue;
        };
        let Some((animation, pose)) = image.representative_usage() else {
            debug!("Image '{}' has no usage, leaving it empty", name);
            continue;
        };

        let animation = resolve_animation(animation)?;
        let table = match image.import_table.as_deref() {
            Some(table) => table.parse::<BodyTable>()?,
            None => BodyTable::Both,
        };

        debug!("Importing '{}' from {:?} pose {}", name, animation, pose);
        let canvas = import_pose(rom, animation, *pose, image.raw_bounding_box(), table, weapon)?;
        canvases.insert(name.to_string(), canvas);
    }

    canvases.insert("nil".to_string(), Canvas::nil());
    Ok(canvases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RomBuilder;

    fn name(s: &str) -> UsageAnimation {
        UsageAnimation::Name(s.to_string())
    }

    #[test]
    fn test_resolve_animation() {
        assert_eq!(resolve_animation(&UsageAnimation::Index(7)).unwrap(), Animation::Index(7));
        assert_eq!(resolve_animation(&name("0x1A")).unwrap(), Animation::Index(0x1A));
        assert_eq!(resolve_animation(&name("gun")).unwrap(), Animation::Gun);
        assert_eq!(resolve_animation(&name("death_right")).unwrap(), Animation::DeathRight);
        assert_eq!(
            resolve_animation(&name("moonwalk")),
            Err(ExtractError::UnknownAnimation("moonwalk".to_string()))
        );
        assert!(matches!(resolve_animation(&name("0xZZ")), Err(ExtractError::UnknownAnimation(_))));
    }

    fn palette_fixture() -> RomBuilder {
        let ramp: Vec<u16> = (0..16).collect();
        RomBuilder::lorom(0x200000)
            .put_words(0x9B9400, &ramp)
            // death flesh palette pointers
            .put_words(0x9BB80F, &[0x8000; 10])
            .put_words(0x9BA3C6, &[0x001F, 0x03E0, 0x7C00])
            .put_words(0x8DCA4E + 4 + 6 * 7, &[4, 0x7FFF, 0])
    }

    /// Direction 2 opened to level 1, a single pixel in the corner.
    fn gun_fixture(builder: RomBuilder) -> RomBuilder {
        let mut data = vec![0u8; 0x20];
        data[0] = 0x80;
        builder
            .put_words(0x90C791 + 2 * 2, &[0x0020])
            .put_words(0x90C7A5 + 2 * 2, &[0xD000])
            .put_words(0x90D000 + 2 * 2, &[0xA000])
            .put_words(0x90C786, &[0x6200])
            .put(0x9AA000, &data)
    }

    #[test]
    fn test_palette_block_layout() {
        let rom = Metroid3Rom::new(palette_fixture().build()).unwrap();
        let block = palette_block(&rom).unwrap();
        assert_eq!((block.width, block.height), (15, 7));

        let colors = master_palette(&rom).unwrap();
        assert_eq!(colors.len(), 105);
        // power suit colors 1..16
        assert_eq!(colors[0], Rgba([8, 0, 0, 255]));
        assert_eq!(colors[14], Rgba([120, 0, 0, 255]));
        assert_eq!(colors[90], TRANSPARENT);
        assert_eq!(colors[91], Rgba([248, 0, 0, 255]));
        assert_eq!(colors[92], Rgba([0, 248, 0, 255]));
        assert_eq!(colors[93], Rgba([0, 0, 248, 255]));
        assert!(colors[94..101].iter().all(|&c| c == TRANSPARENT));
        assert_eq!(colors[101], Rgba([0, 0, 0, 255]));
        assert_eq!(colors[103], Rgba([248, 248, 248, 255]));
        assert_eq!(colors[104], TRANSPARENT);
    }

    #[test]
    fn test_palette_block_pads_short_rows() {
        // first death step points past the ten flesh palettes, leaving it empty
        let rom = Metroid3Rom::new(palette_fixture().put_words(0x9BB823, &[0x0A04]).build()).unwrap();
        let flesh = rom.palette(PaletteKind::DeathFlesh, None).unwrap();
        assert!(flesh[0].colors.is_empty());

        let colors = master_palette(&rom).unwrap();
        assert_eq!(colors.len(), 105);
        assert!(colors[45..60].iter().all(|&c| c == TRANSPARENT));
        // rows after the short one keep their positions
        assert_eq!(colors[90], TRANSPARENT);
        assert_eq!(colors[91], Rgba([248, 0, 0, 255]));
        assert_eq!(colors[103], Rgba([248, 248, 248, 255]));
    }

    #[test]
    fn test_import_gun_pose() {
        let rom = Metroid3Rom::new(gun_fixture(RomBuilder::lorom(0x200000)).build()).unwrap();
        let bbox = BoundingBox::new(0, 0, 8, 8);
        let canvas = import_pose(&rom, Animation::Gun, 12, bbox, BodyTable::Both, Weapon::Standard).unwrap();
        assert_eq!((canvas.width, canvas.height), (8, 8));
        assert_eq!(canvas.index_at(0, 0), Some(1));
        assert_eq!(canvas.index_at(1, 0), Some(0));
    }

    #[test]
    fn test_import_sheet_adds_nil() {
        let rom = Metroid3Rom::new(gun_fixture(palette_fixture()).build()).unwrap();
        let sheet = Sheet::from_json(
            r#"{ "images": [
                { "name": "pal", "layout": [0, 0], "usage": [["palette_block", 0]], "dimensions": [0, 0, 15, 7] },
                { "name": "blank", "layout": [0, 1], "dimensions": [0, 0, 4, 4] },
                { "name": "port", "layout": [1, 0], "usage": [["gun", 12]], "dimensions": [-4, -4, 8, 8] }
            ] }"#,
        )
        .unwrap();
        let canvases = import_sheet(&sheet, &rom, Weapon::Standard).unwrap();
        assert!(canvases["nil"].is_nil());
        assert_eq!((canvases["pal"].width, canvases["pal"].height), (15, 7));
        assert!(!canvases.contains_key("blank"));
        let port = &canvases["port"];
        assert_eq!((port.width, port.height), (12, 12));
        assert_eq!(port.index_at(4, 4), Some(1));
    }

    #[test]
    fn test_import_sheet_rejects_bad_table() {
        let rom = Metroid3Rom::new(RomBuilder::lorom(0x200000).build()).unwrap();
        let sheet = Sheet::from_json(
            r#"{ "images": [
                { "name": "a", "layout": [0, 0], "usage": [[1, 0]], "dimensions": [0, 0, 1, 1], "import table": "middle" }
            ] }"#,
        )
        .unwrap();
        assert!(matches!(import_sheet(&sheet, &rom, Weapon::Standard), Err(ExtractError::InvalidArgument(_))));
    }

    #[test]
    fn test_import_sheet_unknown_animation() {
        let rom = Metroid3Rom::new(RomBuilder::lorom(0x200000).build()).unwrap();
        let sheet = Sheet::from_json(
            r#"{ "images": [
                { "name": "a", "layout": [0, 0], "usage": [["spin", 0]], "dimensions": [0, 0, 1, 1] }
            ] }"#,
        )
        .unwrap();
        assert!(matches!(import_sheet(&sheet, &rom, Weapon::Standard), Err(ExtractError::UnknownAnimation(_))));
    }
}
