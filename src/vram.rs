//! VRAM contents reconstructed from DMA transfers
//!
//! [`DmaWrites`] records raw transfers keyed by destination tile. Sprite
//! tiles are looked up through [`VramTiles`], which slices each transfer
//! into 32 byte tiles so a later write to the same slot replaces the earlier
//! one, the way the hardware would overwrite video memory.

use std::collections::BTreeMap;

use crate::tile::{Tile, TILE_BYTES};

/// Raw DMA transfers: destination VRAM tile index to bytes.
pub type DmaWrites = BTreeMap<u16, Vec<u8>>;

/// Tile-addressed view of VRAM.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VramTiles {
    tiles: BTreeMap<u16, Vec<u8>>,
}

impl VramTiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a sequence of transfers applied in order.
    pub fn from_writes<'a>(writes: impl IntoIterator<Item = &'a DmaWrites>) -> Self {
        let mut vram = Self::new();
        for w in writes {
            vram.overlay(w);
        }
        vram
    }

    /// Apply transfers on top of the current contents.
    pub fn overlay(&mut self, writes: &DmaWrites) {
        for (&start, data) in writes {
            for (i, chunk) in data.chunks(TILE_BYTES).enumerate() {
                let index = start.wrapping_add(i as u16);
                self.tiles.insert(index, chunk.to_vec());
            }
        }
    }

    /// Raw bytes of a tile slot, if it was ever written.
    pub fn raw(&self, index: u16) -> Option<&[u8]> {
        self.tiles.get(&index).map(Vec::as_slice)
    }

    /// Decoded tile at a slot. Slots that were never written are blank.
    pub fn tile(&self, index: u16) -> Tile {
        self.raw(index).map(Tile::from_4bpp).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slices_into_tiles() {
        let mut writes = DmaWrites::new();
        writes.insert(0x10, (0..0x50).map(|i| i as u8).collect());
        let vram = VramTiles::from_writes([&writes]);
        assert_eq!(vram.len(), 3);
        assert_eq!(vram.raw(0x10).unwrap()[0], 0);
        assert_eq!(vram.raw(0x11).unwrap()[0], 0x20);
        assert_eq!(vram.raw(0x12).unwrap().len(), 0x10);
        assert!(vram.raw(0x13).is_none());
    }

    #[test]
    fn test_later_writes_override() {
        let mut base = DmaWrites::new();
        base.insert(0, vec![0xAA; 0x60]);
        let mut pose = DmaWrites::new();
        pose.insert(1, vec![0x55; 0x20]);

        let vram = VramTiles::from_writes([&base, &pose]);
        assert_eq!(vram.raw(0).unwrap()[0], 0xAA);
        assert_eq!(vram.raw(1).unwrap()[0], 0x55);
        assert_eq!(vram.raw(2).unwrap()[0], 0xAA);
    }

    #[test]
    fn test_missing_tile_is_blank() {
        let vram = VramTiles::new();
        assert!(vram.tile(0x42).is_blank());
    }
}
