//! Super Metroid sprite extraction
//!
//! [`Metroid3Rom`] wraps a [`Rom`] and knows where Samus' graphics live:
//! pose tilemaps, per-pose DMA transfers, animation timing, the death
//! sequence, the arm cannon port, the file select screen and the palette
//! animations. On construction it applies a small set of corrective patches
//! that fix typos in the vanilla data.

mod death;
mod import;
mod palette;
mod patches;
mod pose;

use std::fmt;
use std::str::FromStr;

use once_cell::unsync::OnceCell;
use thiserror::Error;

use crate::rom::{Rom, RomError};
use crate::tile::{TileError, TilemapEntry};
use crate::vram::DmaWrites;

pub use death::DeathPoseLayout;
pub use import::{import_pose, import_sheet, master_palette, palette_block, resolve_animation, Animation};
pub use palette::{PaletteFrame, PaletteKind, Suit};
pub use patches::PatchOutcome;
pub use pose::{GunData, Weapon};

/// Header titles that identify a Super Metroid image.
pub const GAME_TITLES: &[&str] = &["Super Metroid"];

/// Whether a header title belongs to Super Metroid.
pub fn is_game_title(title: &str) -> bool {
    GAME_TITLES
        .iter()
        .any(|t| title.to_ascii_lowercase().starts_with(&t.to_ascii_lowercase()))
}

/// Error when extracting game data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ExtractError {
    /// Underlying ROM access failed
    #[error(transparent)]
    Rom(#[from] RomError),
    /// A tilemap could not be encoded
    #[error(transparent)]
    Tile(#[from] TileError),
    /// The death sequence code does not match a known layout
    #[error("Cannot find the DMA location of the death sequence tiles: {0}")]
    UnsupportedPatchLayout(String),
    /// Argument outside of its valid range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Palette kind name not in the registry
    #[error("Unknown palette type: {0}")]
    UnknownPaletteKind(String),
    /// Suit variant missing, unexpected or unknown
    #[error("Invalid suit variant: {0}")]
    InvalidVariant(String),
    /// Sheet usage names an animation that cannot be imported
    #[error("Unknown animation: {0}")]
    UnknownAnimation(String),
    /// No sprite of that name in this game
    #[error("Unknown sprite {0}")]
    UnknownSpriteName(String),
}

/// Which half of Samus' body to include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyTable {
    #[default]
    Both,
    Upper,
    Lower,
}

impl BodyTable {
    pub fn includes_upper(self) -> bool {
        matches!(self, BodyTable::Both | BodyTable::Upper)
    }

    pub fn includes_lower(self) -> bool {
        matches!(self, BodyTable::Both | BodyTable::Lower)
    }
}

impl FromStr for BodyTable {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upper" => Ok(BodyTable::Upper),
            "lower" => Ok(BodyTable::Lower),
            _ => Err(ExtractError::InvalidArgument(format!(
                "import table must be 'upper' or 'lower', got '{}'",
                s
            ))),
        }
    }
}

/// Which way Samus faces during the death sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Facing::Left => "left",
            Facing::Right => "right",
        })
    }
}

/// Sprites this game knows how to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteKind {
    Samus,
}

impl SpriteKind {
    pub fn from_name(name: &str) -> Result<Self, ExtractError> {
        match name {
            "Samus" => Ok(SpriteKind::Samus),
            _ => Err(ExtractError::UnknownSpriteName(name.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SpriteKind::Samus => "Samus",
        }
    }
}

/// Everything needed to draw one pose.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PoseData {
    /// Placements in drawing order
    pub tilemaps: Vec<TilemapEntry>,
    /// Tile data transferred for this pose
    pub dma: DmaWrites,
    /// Frames to hold the pose
    pub duration: u8,
}

/// A Super Metroid image with its known bugs patched.
#[derive(Debug)]
pub struct Metroid3Rom {
    rom: Rom,
    patches: Vec<PatchOutcome>,
    death_layout: OnceCell<DeathPoseLayout>,
}

impl Metroid3Rom {
    /// Take ownership of an image and apply the corrective patches.
    ///
    /// Patches only touch bytes that still hold their vanilla values, so an
    /// image that was already patched (or modified by a hack) is left as is.
    pub fn new(rom: Rom) -> Result<Self, ExtractError> {
        let mut rom = rom;
        let patches = patches::apply_all(&mut rom)?;
        Ok(Self { rom, patches, death_layout: OnceCell::new() })
    }

    /// The patched image.
    pub fn rom(&self) -> &Rom {
        &self.rom
    }

    /// Give the patched image back.
    pub fn into_rom(self) -> Rom {
        self.rom
    }

    /// Outcome of every patch, in application order.
    pub fn patches(&self) -> &[PatchOutcome] {
        &self.patches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_table_from_str() {
        assert_eq!("upper".parse::<BodyTable>().unwrap(), BodyTable::Upper);
        assert_eq!("lower".parse::<BodyTable>().unwrap(), BodyTable::Lower);
        assert!(matches!("both".parse::<BodyTable>(), Err(ExtractError::InvalidArgument(_))));
        assert!(BodyTable::Both.includes_upper() && BodyTable::Both.includes_lower());
        assert!(!BodyTable::Upper.includes_lower());
    }

    #[test]
    fn test_sprite_kind_from_name() {
        assert_eq!(SpriteKind::from_name("Samus").unwrap(), SpriteKind::Samus);
        assert_eq!(
            SpriteKind::from_name("Ridley"),
            Err(ExtractError::UnknownSpriteName("Ridley".to_string()))
        );
    }

    #[test]
    fn test_reopening_a_patched_image_changes_nothing() {
        let first = Metroid3Rom::new(patches::vanilla().build()).unwrap();
        assert!(first.patches().iter().all(|p| p.applied));
        let patched = first.into_rom();
        let bytes = patched.to_file_bytes();

        let second = Metroid3Rom::new(patched).unwrap();
        assert!(second.patches().iter().all(|p| !p.applied));
        assert_eq!(second.into_rom().to_file_bytes(), bytes);
    }

    #[test]
    fn test_game_title() {
        assert!(is_game_title("Super Metroid        "));
        assert!(is_game_title("SUPER METROID"));
        assert!(!is_game_title("ZELDA"));
    }
}
