//! Pose tilemaps, DMA transfers and timing
//!
//! Addresses follow the labels of the community disassembly: `P??_UT`/`P??_LT`
//! upper and lower tilemap lists, `TM_???` tilemap sets, `AFP_T??` animation
//! frame progression tables and `FD_??` frame duration lists.

use std::fmt;

use tracing::warn;

use super::{BodyTable, ExtractError, Metroid3Rom, PoseData};
use crate::rom::RomError;
use crate::tile::TilemapEntry;
use crate::vram::{DmaWrites, VramTiles};

const LOWER_TILEMAP_TABLE: u32 = 0x92945D;
const UPPER_TILEMAP_TABLE: u32 = 0x929263;
const POSE_POINTERS: u32 = 0x92808D;
const AFP_TABLE: u32 = 0x92D94E;
const UPPER_DMA_TABLES: u32 = 0x92D91E;
const LOWER_DMA_TABLES: u32 = 0x92D938;
const DURATION_TABLE: u32 = 0x91B010;

const GUN_TILEMAPS: u32 = 0x90C791;
const GUN_DMA_LISTS: u32 = 0x90C7A5;
const GUN_VRAM_DEST: u32 = 0x90C786;

const FILE_SELECT_POINTER: u32 = 0x818E34;
const DEFAULT_VRAM: u32 = 0x9AD200;

/// Base of the sprite tile area in VRAM word addresses.
pub(super) const VRAM_SPRITE_BASE: u16 = 0x6000;

/// Equipped beam, which decides the contents of VRAM row 0x30.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Weapon {
    #[default]
    Standard,
    Charge,
    Ice,
    Wave,
    Plasma,
    Spazer,
}

impl Weapon {
    /// Look up a weapon by name, falling back to the standard beam.
    pub fn from_name(name: &str) -> Self {
        match name {
            "regular" | "standard" => Weapon::Standard,
            "charge" => Weapon::Charge,
            "ice" => Weapon::Ice,
            "wave" => Weapon::Wave,
            "plasma" => Weapon::Plasma,
            "spazer" => Weapon::Spazer,
            other => {
                warn!("Unknown weapon '{}', using the standard beam", other);
                Weapon::Standard
            }
        }
    }

    fn tiles_addr(self) -> u32 {
        match self {
            Weapon::Standard | Weapon::Charge => 0x9AF200,
            Weapon::Ice => 0x9AF400,
            Weapon::Wave => 0x9AF600,
            Weapon::Plasma => 0x9AF800,
            Weapon::Spazer => 0x9AFA00,
        }
    }
}

impl fmt::Display for Weapon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Weapon::Standard => "standard",
            Weapon::Charge => "charge",
            Weapon::Ice => "ice",
            Weapon::Wave => "wave",
            Weapon::Plasma => "plasma",
            Weapon::Spazer => "spazer",
        };
        f.write_str(name)
    }
}

/// The arm cannon port for one direction and opening level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GunData {
    /// Placement normalized to the origin
    pub tilemap: TilemapEntry,
    /// VRAM tile the port graphics are loaded into
    pub tile: u16,
    /// One 4bpp tile
    pub data: Vec<u8>,
}

impl GunData {
    /// The port graphics as a DMA transfer.
    pub fn dma(&self) -> DmaWrites {
        DmaWrites::from([(self.tile, self.data.clone())])
    }
}

/// VRAM tile index for a word address in the sprite area.
pub(super) fn vram_tile(word_addr: u16) -> u16 {
    word_addr.wrapping_sub(VRAM_SPRITE_BASE) >> 4
}

fn bank(bank: u32, offset: u16) -> u32 {
    bank | offset as u32
}

impl Metroid3Rom {
    /// Placements for a pose in drawing order: lower body reversed, the
    /// elevator/launcher extra tile, then upper body reversed.
    pub fn pose_tilemaps(&self, animation: u16, pose: u16, table: BodyTable) -> Result<Vec<TilemapEntry>, ExtractError> {
        let mut tilemaps = Vec::new();

        if table.includes_lower() {
            let mut lower = self.pose_tilemaps_from(LOWER_TILEMAP_TABLE, animation, pose)?;
            lower.reverse();
            tilemaps.extend(lower);
        }

        // Elevator (pose 0) and launcher poses carry an extra tile whose offsets
        // are hardcoded at $90:868D
        if animation == 0 {
            let y = if pose == 0 { 0xF5 } else { 0xF0 };
            tilemaps.push(TilemapEntry::decompile([0x01F9, y, 0x3821]));
        }

        if table.includes_upper() {
            let mut upper = self.pose_tilemaps_from(UPPER_TILEMAP_TABLE, animation, pose)?;
            upper.reverse();
            tilemaps.extend(upper);
        }

        Ok(tilemaps)
    }

    /// Tilemaps of one pose from one table, in ROM order.
    pub(super) fn pose_tilemaps_from(&self, base: u32, animation: u16, pose: u16) -> Result<Vec<TilemapEntry>, RomError> {
        let rom = self.rom();
        // P??_UT / P??_LT
        let poses_index = rom.read_u16(base + 2 * animation as u32)?;
        // TM_???
        let pointer = rom.read_u16(POSE_POINTERS + 2 * poses_index as u32 + 2 * pose as u32)?;
        if pointer == 0 {
            return Ok(Vec::new());
        }

        let addr = bank(0x920000, pointer);
        let count = rom.read_u16(addr)? as u32;
        (0..count)
            .map(|i| {
                let fields = rom.read_fields(addr + 2 + 5 * i, &[2, 1, 2])?;
                Ok(TilemapEntry::from_fields(&fields))
            })
            .collect()
    }

    /// Tile data transferred for a pose: lower body into VRAM rows
    /// 0x08/0x18, upper body into 0x00/0x10.
    pub fn dma_data(&self, animation: u16, pose: u16) -> Result<DmaWrites, ExtractError> {
        let rom = self.rom();
        // AFP_T??
        let afp = bank(0x920000, rom.read_u16(AFP_TABLE + 2 * animation as u32)?);
        let entry = rom.read_fields(afp + 4 * pose as u32, &[1, 1, 1, 1])?;
        let (top_table, top_entry, bottom_table, bottom_entry) = (entry[0], entry[1], entry[2], entry[3]);

        let mut writes = DmaWrites::new();
        for (tables, table, entry, vram) in [
            (LOWER_DMA_TABLES, bottom_table, bottom_entry, 0x08u16),
            (UPPER_DMA_TABLES, top_table, top_entry, 0x00u16),
        ] {
            let dma_table = bank(0x920000, rom.read_u16(tables + 2 * table)?);
            let record = rom.read_fields(dma_table + 7 * entry, &[3, 2, 2])?;
            let (pointer, first_size, second_size) = (record[0], record[1], record[2]);

            let first = rom.read_bytes(pointer, first_size as usize)?;
            let second = rom.read_bytes(pointer + first_size, second_size as usize)?;
            writes.insert(vram, first.to_vec());
            writes.insert(0x10 + vram, second.to_vec());
        }
        Ok(writes)
    }

    /// Frames a pose is held for.
    pub fn pose_duration(&self, animation: u16, pose: u16) -> Result<u8, ExtractError> {
        let rom = self.rom();
        // FD_??
        let list = bank(0x910000, rom.read_u16(DURATION_TABLE + 2 * animation as u32)?);
        Ok(rom.read_u8(list + pose as u32)?)
    }

    /// Tilemaps, DMA transfers and duration of a pose.
    pub fn dma_pose_data(&self, animation: u16, pose: u16, table: BodyTable) -> Result<PoseData, ExtractError> {
        Ok(PoseData {
            tilemaps: self.pose_tilemaps(animation, pose, table)?,
            dma: self.dma_data(animation, pose)?,
            duration: self.pose_duration(animation, pose)?,
        })
    }

    /// The arm cannon port tile for `direction` (0..10) opened to `level` (0..3).
    pub fn minimal_gun_data(&self, direction: u16, level: u16) -> Result<GunData, ExtractError> {
        if level >= 3 {
            return Err(ExtractError::InvalidArgument(format!("Invalid level value {}", level)));
        }
        if direction >= 10 {
            return Err(ExtractError::InvalidArgument(format!("Invalid direction value {}", direction)));
        }

        let rom = self.rom();
        let word = rom.read_u16(GUN_TILEMAPS + 2 * direction as u32)?;
        let tilemap = TilemapEntry::decompile([0x0000, 0x00, word]);

        let list = bank(0x900000, rom.read_u16(GUN_DMA_LISTS + 2 * direction as u32)?);
        let pointer = bank(0x9A0000, rom.read_u16(list + 2 * (level as u32 + 1))?);
        let tile = vram_tile(rom.read_u16(GUN_VRAM_DEST)?);
        let data = rom.read_bytes(pointer, 0x20)?.to_vec();

        Ok(GunData { tilemap, tile, data })
    }

    /// Tiles of the file select screen. Hacks often move them, so the
    /// location is read from the loading code.
    pub fn file_select_dma_data(&self) -> Result<DmaWrites, ExtractError> {
        let rom = self.rom();
        let pointer = rom.read_u24(FILE_SELECT_POINTER)?;
        let data = rom.read_bytes(pointer, 0x2000)?.to_vec();
        Ok(DmaWrites::from([(0x00, data)]))
    }

    /// Hand-built layouts of the file select sprites: helmets (0-2),
    /// visors (3-7), the cursor (8) and the pipe frame (9).
    pub fn file_select_tilemaps(&self, item: u16) -> Result<Vec<TilemapEntry>, ExtractError> {
        let entry = |x: i32, y: i32, index: u16| TilemapEntry::new(x, y, index, 1, 2);

        let tilemaps: Vec<TilemapEntry> = match item {
            0..=2 => (0..3)
                .flat_map(|x| (0..3).map(move |y| (x, y)))
                .map(|(x, y)| entry(8 * x, 8 * y, 0xD0 + 3 * item + x as u16 + 0x10 * y as u16))
                .collect(),
            3..=7 => {
                let x = (item - 3) % 3;
                let y = (item - 3) / 3;
                (0..2)
                    .map(|i| entry(4 + 8 * i as i32, 10, 0xD9 + i + 2 * x + 0x10 * y))
                    .collect()
            }
            8 => vec![
                entry(0x00, 0x18, 0xFE),
                entry(0x00, 0x10, 0xEE),
                entry(0x00, 0x08, 0xDF),
                entry(0x00, 0x00, 0xC8),
                entry(0x08, 0x18, 0xCC),
                entry(0x08, 0x10, 0xFF),
                entry(0x08, 0x08, 0xEF),
            ],
            9 => vec![
                entry(0x00, 0x00, 0xF9),
                entry(0x08, 0x00, 0xFA),
                entry(0x10, 0x00, 0xFB),
                entry(0x10, 0x08, 0xED),
                entry(0x00, 0x10, 0xFC),
                entry(0x10, 0x10, 0xFD),
            ],
            _ => return Err(ExtractError::InvalidArgument(format!("Unknown item number {}", item))),
        };
        Ok(tilemaps)
    }

    /// VRAM contents present before any pose is loaded.
    ///
    /// Grapple beam, mode 7 rooms and rain can overwrite parts of this, so it
    /// only shows up in a pose when the game itself glitches.
    pub fn default_vram(&self, weapon: Weapon) -> Result<DmaWrites, ExtractError> {
        let rom = self.rom();
        let base = rom.read_bytes(DEFAULT_VRAM, 0x2000)?.to_vec();
        let beam = rom.read_bytes(weapon.tiles_addr(), 0x100)?.to_vec();
        Ok(DmaWrites::from([(0x00, base), (0x30, beam)]))
    }

    /// Default VRAM overlaid with a pose's transfers.
    pub fn pose_vram(&self, dma: &DmaWrites, weapon: Weapon) -> Result<VramTiles, ExtractError> {
        let default = self.default_vram(weapon)?;
        Ok(VramTiles::from_writes([&default, dma]))
    }

    /// The three colors the visor cycles through with the X-ray scope.
    pub fn nightvisor_colors(&self) -> Result<[u16; 3], ExtractError> {
        let words = self.rom().read_words(0x9BA3C6, 3)?;
        Ok([words[0], words[1], words[2]])
    }
}
