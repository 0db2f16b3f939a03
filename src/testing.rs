//! Synthetic ROM images for tests and benchmarks
//!
//! [`RomBuilder`] produces LoROM images with a consistent internal header so
//! that mapping detection and verification succeed, and lets callers place
//! bytes at SNES addresses without doing the address math by hand.

use crate::rom::Rom;

/// Builder for small LoROM images.
#[derive(Debug, Clone)]
pub struct RomBuilder {
    bytes: Vec<u8>,
}

impl RomBuilder {
    /// A zero-filled LoROM image of `size` bytes with a valid checksum pair,
    /// a `$20` mapping byte and the title `SUPER METROID`.
    ///
    /// # Panics
    ///
    /// Panics if `size` is not a positive multiple of 0x8000.
    pub fn lorom(size: usize) -> Self {
        assert!(size > 0 && size % 0x8000 == 0, "size must be a multiple of 0x8000");
        let mut bytes = vec![0u8; size];
        bytes[0x7FDC..0x7FE0].copy_from_slice(&[0x00, 0x00, 0xFF, 0xFF]);
        bytes[0x7FD5] = 0x20;
        Self { bytes }.title("SUPER METROID")
    }

    /// Replace the header title, padded with spaces to 21 bytes.
    pub fn title(mut self, title: &str) -> Self {
        let mut padded = [b' '; 21];
        for (dst, src) in padded.iter_mut().zip(title.bytes()) {
            *dst = src;
        }
        self.bytes[0x7FC0..0x7FC0 + 21].copy_from_slice(&padded);
        self
    }

    /// Replace the mapping mode byte of the internal header.
    pub fn map_byte(mut self, byte: u8) -> Self {
        self.bytes[0x7FD5] = byte;
        self
    }

    /// Copy bytes to a LoROM SNES address.
    pub fn put(mut self, addr: u32, data: &[u8]) -> Self {
        let offset = lorom_offset(addr);
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
        self
    }

    /// Copy little-endian words to a LoROM SNES address.
    pub fn put_words(self, addr: u32, words: &[u16]) -> Self {
        let data: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        self.put(addr, &data)
    }

    /// Copy a 3-byte little-endian pointer to a LoROM SNES address.
    pub fn put_long(self, addr: u32, value: u32) -> Self {
        let bytes = value.to_le_bytes();
        self.put(addr, &bytes[..3])
    }

    /// The raw image bytes, without a copier header.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Wrap the image in a [`Rom`].
    pub fn build(self) -> Rom {
        Rom::load(self.bytes).expect("synthetic image should be a valid LoROM")
    }
}

/// LoROM translation for addresses in banks $80-$FF.
pub fn lorom_offset(addr: u32) -> usize {
    (((addr & 0x7F_0000) >> 1) | (addr & 0x7FFF)) as usize
}
