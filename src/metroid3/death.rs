//! Death sequence poses
//!
//! The death animation streams its tiles through a dedicated DMA loop. Hacks
//! that extend the animation replace the table lookup with a subroutine call,
//! so the table locations are found by inspecting the loop code once per
//! image.

use tracing::debug;

use super::pose::vram_tile;
use super::{ExtractError, Facing, Metroid3Rom, PoseData};
use crate::rom::Rom;
use crate::vram::DmaWrites;

const TILE_SIZE_ADDR: u32 = 0x9BB6DF;
const SOURCE_BANK_ADDR: u32 = 0x9BB6EF;
const DEST_LIST_ADDR: u32 = 0x9BB6F6;
const TABLE_LOAD_ADDR: u32 = 0x9BB6E5;
const CLASSIC_TABLE: u32 = 0x9BB7BF;
const SCHEDULE_ADDR: u32 = 0x9BB823;

const LEFT_TILEMAP_TABLE: u32 = 0x92EDDB;
const RIGHT_TILEMAP_TABLE: u32 = 0x92EDD0;

const LDA_LONG_Y: u8 = 0xB9;
const JSR: u8 = 0x20;
const SEARCH_LIMIT: u32 = 0x100;

/// Where the death sequence DMA loop reads its tiles from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeathPoseLayout {
    /// Bytes per transferred row
    pub size: usize,
    /// Bank the source offsets are relative to
    pub source_bank: u32,
    /// List of VRAM word addresses, one per row
    pub dest_tile_addr: u32,
    /// Unmodified code with 5 rows and one shared table
    pub classic: bool,
    pub left_table: u32,
    pub right_table: u32,
}

impl DeathPoseLayout {
    /// Inspect the loop code of an image.
    pub fn detect(rom: &Rom) -> Result<Self, ExtractError> {
        let size = rom.read_u16(TILE_SIZE_ADDR)? as usize;
        let source_bank = rom.read_u8(SOURCE_BANK_ADDR)? as u32 * 0x10000;
        let dest_tile_addr = 0x9B0000 + rom.read_u16(DEST_LIST_ADDR)? as u32;

        let fields = rom.read_fields(TABLE_LOAD_ADDR, &[1, 2])?;
        let (inst, operand) = (fields[0] as u8, fields[1]);

        // LDA $B7BF,y
        if inst == LDA_LONG_Y && operand == 0xB7BF {
            debug!("Death sequence uses the classic table at ${:06X}", CLASSIC_TABLE);
            return Ok(Self {
                size,
                source_bank,
                dest_tile_addr,
                classic: true,
                left_table: CLASSIC_TABLE,
                right_table: CLASSIC_TABLE,
            });
        }

        // JSR into the replacement loop, which loads one table per facing
        if inst == JSR {
            let search_addr = 0x9B0000 + operand;
            let search_size = SEARCH_LIMIT.min(0x9C0000 - search_addr) as usize;
            let search = rom.read_bytes(search_addr, search_size)?;

            let (left_table, cue) = find_table_load(search, 0)?;
            let (right_table, _) = find_table_load(search, cue)?;
            debug!(
                "Death sequence uses tables ${:06X} (left) and ${:06X} (right)",
                left_table, right_table
            );
            return Ok(Self { size, source_bank, dest_tile_addr, classic: false, left_table, right_table });
        }

        Err(ExtractError::UnsupportedPatchLayout(format!(
            "unexpected instruction ${:02X} at ${:06X}",
            inst, TABLE_LOAD_ADDR
        )))
    }

    /// Number of double rows transferred per pose.
    pub fn rows(&self) -> u32 {
        if self.classic {
            5
        } else {
            16
        }
    }

    pub fn table(&self, facing: Facing) -> u32 {
        match facing {
            Facing::Left => self.left_table,
            Facing::Right => self.right_table,
        }
    }
}

/// Find the next `LDA $xxxx,y` at or after `from` and return its bank $9B
/// operand together with the position just past the opcode.
fn find_table_load(search: &[u8], from: usize) -> Result<(u32, usize), ExtractError> {
    let found = search
        .get(from..)
        .and_then(|rest| rest.iter().position(|&b| b == LDA_LONG_Y))
        .ok_or_else(|| ExtractError::UnsupportedPatchLayout("no LDA ($B9) instruction to use as cue".to_string()))?;
    let cue = from + found + 1;
    match search.get(cue..cue + 2) {
        Some(&[lo, hi]) => Ok((0x9B0000 + u16::from_le_bytes([lo, hi]) as u32, cue)),
        _ => Err(ExtractError::UnsupportedPatchLayout("LDA ($B9) operand runs past the search window".to_string())),
    }
}

impl Metroid3Rom {
    /// Layout of the death DMA loop, inspected on first use.
    pub fn death_layout(&self) -> Result<&DeathPoseLayout, ExtractError> {
        self.death_layout.get_or_try_init(|| DeathPoseLayout::detect(self.rom()))
    }

    /// Tilemaps, tile data and duration of a death sequence pose.
    pub fn death_pose_data(&self, pose: u16, facing: Facing) -> Result<PoseData, ExtractError> {
        let layout = self.death_layout()?;
        let rom = self.rom();

        let tilemaps_addr = match facing {
            Facing::Left => LEFT_TILEMAP_TABLE,
            Facing::Right => RIGHT_TILEMAP_TABLE,
        };
        let mut tilemaps = self.pose_tilemaps_from(tilemaps_addr, 0, pose)?;
        tilemaps.reverse();

        let table = layout.table(facing);
        let mut dma = DmaWrites::new();
        for i in 0..layout.rows() {
            let dest = vram_tile(rom.read_u16(layout.dest_tile_addr + 2 * i)?);
            let source = layout.source_bank + rom.read_u16(table + 2 * i)? as u32;
            dma.insert(dest, rom.read_bytes(source, layout.size)?.to_vec());
        }

        // Second byte is a palette index the game never uses here
        let schedule = rom.read_fields(SCHEDULE_ADDR + 2 * pose as u32, &[1, 1])?;

        Ok(PoseData { tilemaps, dma, duration: schedule[0] as u8 })
    }
}
