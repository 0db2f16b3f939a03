//! SNES ROM container: mapping detection, address translation and typed I/O
//!
//! A [`Rom`] owns the cartridge bytes (with any 512-byte copier header split
//! off) and knows which of the four supported memory layouts the image uses.
//! All reads and writes are bounds checked against the content size.
//!
//! Multi-byte values are stored little-endian in the image and exposed as
//! plain integers.

use std::fmt;

use thiserror::Error;
use tracing::{info, warn};

const HEADER_SIZE: usize = 0x200;
const HALF_BANK: usize = 0x8000;
const MEGABIT: usize = 0x20000;

const LOWER_ASCII: u8 = 0x20;
const UPPER_ASCII: u8 = 0x7E;
const TITLE_SIZE: usize = 21;

/// Offset of the internal header in SNES address space.
const INTERNAL_HEADER: u32 = 0xFFC0;
const MAP_MODE_OFFSET: u32 = 0x15;

/// Error type for ROM access failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RomError {
    /// The image is not a whole number of half banks (optionally plus a header)
    #[error("ROM size {0:#X} is not a multiple of 0x8000 (optionally plus a 0x200 byte header)")]
    InvalidRomSize(usize),
    /// The internal header's mapping byte is not valid for the detected layout
    #[error("Cannot recognize the mapping mode byte ${byte:02X} for a {mode} image")]
    UnrecognizedMapMode { mode: MapMode, byte: u8 },
    /// Address does not fit in the 24-bit SNES address space
    #[error("SNES address ${0:X} lies outside of SNES address space")]
    AddressOutOfSpace(u32),
    /// Address is valid but does not map to cartridge ROM
    #[error("SNES address ${0:06X} does not map to ROM")]
    UnmappedAddress(u32),
    /// Access would run past the end of the image
    #[error("Address range lies beyond ROM boundary: offset {offset:#08X}, size {width:#X}, ROM size {size:#X}")]
    OutOfBounds { offset: usize, width: usize, size: usize },
    /// Encoding and values do not agree
    #[error("Encoding mismatch: {0}")]
    EncodingMismatch(String),
}

/// The memory layout of a ROM image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapMode {
    LoRom,
    HiRom,
    ExLoRom,
    ExHiRom,
}

impl MapMode {
    fn from_layout(hi: bool, extended: bool) -> Self {
        match (hi, extended) {
            (false, false) => MapMode::LoRom,
            (true, false) => MapMode::HiRom,
            (false, true) => MapMode::ExLoRom,
            (true, true) => MapMode::ExHiRom,
        }
    }

    /// Whether this layout uses HiROM style 64 KiB banks.
    pub fn is_hi(self) -> bool {
        matches!(self, MapMode::HiRom | MapMode::ExHiRom)
    }

    /// Whether this is one of the extended (> 32 Mbit) layouts.
    pub fn is_extended(self) -> bool {
        matches!(self, MapMode::ExLoRom | MapMode::ExHiRom)
    }

    /// Internal header mapping bytes accepted for this layout.
    ///
    /// `0x23` (SA-1) is tolerated for both plain layouts, and `0x30` for
    /// ExLoROM because many hacks never update the byte.
    pub fn accepted_header_bytes(self) -> &'static [u8] {
        match self {
            MapMode::LoRom => &[0x20, 0x30, 0x23],
            MapMode::HiRom => &[0x21, 0x31, 0x23],
            MapMode::ExLoRom => &[0x32, 0x30],
            MapMode::ExHiRom => &[0x35],
        }
    }
}

impl fmt::Display for MapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MapMode::LoRom => "LoROM",
            MapMode::HiRom => "HiROM",
            MapMode::ExLoRom => "ExLoROM",
            MapMode::ExHiRom => "ExHiROM",
        };
        f.write_str(name)
    }
}

/// Layout of one or more little-endian integers in the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoding {
    /// A single integer of the given width in bytes (1 to 4)
    Single(u8),
    /// Consecutive integers, each with its own width
    Sequence(Vec<u8>),
}

impl Encoding {
    /// `n` consecutive integers of the same width.
    pub fn repeat(width: u8, n: usize) -> Self {
        Encoding::Sequence(vec![width; n])
    }

    /// `n` consecutive single bytes.
    pub fn bytes(n: usize) -> Self {
        Self::repeat(1, n)
    }

    /// Total number of bytes covered.
    pub fn len(&self) -> usize {
        match self {
            Encoding::Single(w) => *w as usize,
            Encoding::Sequence(ws) => ws.iter().map(|&w| w as usize).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A value read from or written to the image, shaped like its [`Encoding`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Single(u32),
    Sequence(Vec<u32>),
}

impl Value {
    /// Build a sequence value from bytes.
    pub fn bytes(bytes: &[u8]) -> Self {
        Value::Sequence(bytes.iter().map(|&b| b as u32).collect())
    }

    /// The integer of a single value, `None` for a sequence.
    pub fn as_single(&self) -> Option<u32> {
        match self {
            Value::Single(v) => Some(*v),
            Value::Sequence(_) => None,
        }
    }

    /// The integers of a sequence value, `None` for a single value.
    pub fn as_sequence(&self) -> Option<&[u32]> {
        match self {
            Value::Single(_) => None,
            Value::Sequence(vs) => Some(vs),
        }
    }

    fn same_shape(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Single(_), Value::Single(_)) => true,
            (Value::Sequence(a), Value::Sequence(b)) => a.len() == b.len(),
            _ => false,
        }
    }
}

/// A SNES cartridge image.
#[derive(Debug, Clone)]
pub struct Rom {
    content: Vec<u8>,
    header: Vec<u8>,
    map_mode: MapMode,
}

impl Rom {
    /// Check that a file size is a whole number of half banks, optionally
    /// followed by a copier header.
    pub fn verify_size(size: usize) -> Result<(), RomError> {
        match size % HALF_BANK {
            0 | HEADER_SIZE => Ok(()),
            _ => Err(RomError::InvalidRomSize(size)),
        }
    }

    /// Wrap an image, splitting off a copier header and detecting the
    /// memory layout. Layout detection always produces a best guess.
    pub fn from_bytes(mut bytes: Vec<u8>) -> Result<Self, RomError> {
        Self::verify_size(bytes.len())?;

        let header = if bytes.len() % HALF_BANK == HEADER_SIZE {
            let content = bytes.split_off(HEADER_SIZE);
            std::mem::replace(&mut bytes, content)
        } else {
            Vec::new()
        };

        let mut rom = Self { content: bytes, header, map_mode: MapMode::LoRom };
        rom.map_mode = rom.detect_map_mode();
        info!("Detected {} layout ({:#X} bytes)", rom.map_mode, rom.size());
        Ok(rom)
    }

    /// Wrap an image and verify its internal header mapping byte.
    pub fn load(bytes: Vec<u8>) -> Result<Self, RomError> {
        let rom = Self::from_bytes(bytes)?;
        rom.verify_map_mode()?;
        Ok(rom)
    }

    /// Size of the content, excluding any copier header.
    pub fn size(&self) -> usize {
        self.content.len()
    }

    pub fn map_mode(&self) -> MapMode {
        self.map_mode
    }

    /// Whether the image is larger than 32 Mbit.
    pub fn is_extended(&self) -> bool {
        self.map_mode.is_extended()
    }

    /// The stripped copier header; empty when the image had none.
    pub fn header(&self) -> &[u8] {
        &self.header
    }

    pub fn has_header(&self) -> bool {
        !self.header.is_empty()
    }

    /// The content bytes (header excluded).
    pub fn as_bytes(&self) -> &[u8] {
        &self.content
    }

    /// The full image, header included, as it would be written to disk.
    pub fn to_file_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.header.len() + self.content.len());
        out.extend_from_slice(&self.header);
        out.extend_from_slice(&self.content);
        out
    }

    fn detect_map_mode(&self) -> MapMode {
        let extended = self.size() > 32 * MEGABIT;
        let shift = if extended { 0x40000 } else { 0 };

        let checksum_ok = |at: usize| -> bool {
            let checksum = self.read_single(at, 2);
            let complement = self.read_single(at - 2, 2);
            matches!((checksum, complement), (Ok(c), Ok(k)) if c + k == 0xFFFF)
        };

        if checksum_ok(0x7FDE + shift) {
            return MapMode::from_layout(false, extended);
        }
        if checksum_ok(0xFFDE + shift) {
            return MapMode::from_layout(true, extended);
        }

        // Fall back on whichever header title looks more like text
        let printable = |at: usize| -> usize {
            self.content
                .get(at..at + TITLE_SIZE)
                .map(|title| {
                    title.iter().filter(|&&b| (LOWER_ASCII..=UPPER_ASCII).contains(&b)).count()
                })
                .unwrap_or(0)
        };
        let lo = printable(0x7FC0 + shift);
        let hi = printable(0xFFC0 + shift);
        warn!("Checksum pairs are inconsistent, guessing layout from header titles ({} vs {})", lo, hi);
        MapMode::from_layout(hi > lo, extended)
    }

    /// Check the internal header's mapping byte against the detected layout.
    pub fn verify_map_mode(&self) -> Result<(), RomError> {
        let byte = self.read_u8(INTERNAL_HEADER + MAP_MODE_OFFSET)?;
        if self.map_mode.accepted_header_bytes().contains(&byte) {
            Ok(())
        } else {
            Err(RomError::UnrecognizedMapMode { mode: self.map_mode, byte })
        }
    }

    /// The 21 character title from the internal header.
    pub fn game_title(&self) -> Result<String, RomError> {
        let bytes = self.read_bytes(INTERNAL_HEADER, TITLE_SIZE)?;
        Ok(bytes.iter().map(|&b| if b.is_ascii() { b as char } else { '?' }).collect())
    }

    /// Translate a SNES address to an offset into the content.
    pub fn snes_to_pc(&self, addr: u32) -> Result<usize, RomError> {
        if addr > 0xFF_FFFF {
            return Err(RomError::AddressOutOfSpace(addr));
        }

        let hi = self.map_mode.is_hi();
        let wram = addr & 0xFE_0000 == 0x7E_0000;
        let low_page = addr & 0x40_8000 == 0;
        let sram = !hi && addr & 0x70_8000 == 0x70_0000;
        if wram || low_page || sram {
            return Err(RomError::UnmappedAddress(addr));
        }

        let ex = if self.map_mode.is_extended() && addr < 0x80_0000 { 0x40_0000 } else { 0 };
        let pc = if hi { addr & 0x3F_FFFF } else { ((addr & 0x7F_0000) >> 1) | (addr & 0x7FFF) };
        Ok((ex | pc) as usize)
    }

    fn check_range(&self, offset: usize, width: usize) -> Result<(), RomError> {
        match offset.checked_add(width) {
            Some(end) if end <= self.size() => Ok(()),
            _ => Err(RomError::OutOfBounds { offset, width, size: self.size() }),
        }
    }

    fn check_width(width: u8) -> Result<usize, RomError> {
        match width {
            1..=4 => Ok(width as usize),
            _ => Err(RomError::EncodingMismatch(format!("width {} is not in 1..=4", width))),
        }
    }

    fn read_single(&self, offset: usize, width: u8) -> Result<u32, RomError> {
        let width = Self::check_width(width)?;
        self.check_range(offset, width)?;
        let value = self.content[offset..offset + width]
            .iter()
            .rev()
            .fold(0u32, |acc, &b| (acc << 8) | b as u32);
        Ok(value)
    }

    fn write_single(&mut self, offset: usize, width: u8, value: u32) -> Result<(), RomError> {
        let width = Self::check_width(width)?;
        self.check_range(offset, width)?;
        let bytes = value.to_le_bytes();
        self.content[offset..offset + width].copy_from_slice(&bytes[..width]);
        Ok(())
    }

    /// Read integers at a content offset.
    pub fn read(&self, offset: usize, encoding: &Encoding) -> Result<Value, RomError> {
        match encoding {
            Encoding::Single(width) => self.read_single(offset, *width).map(Value::Single),
            Encoding::Sequence(widths) => {
                // Check the whole span first so a failed read reports the full access
                self.check_range(offset, encoding.len())?;
                let mut cursor = offset;
                let mut values = Vec::with_capacity(widths.len());
                for &width in widths {
                    values.push(self.read_single(cursor, width)?);
                    cursor += width as usize;
                }
                Ok(Value::Sequence(values))
            }
        }
    }

    /// Write integers at a content offset.
    pub fn write(&mut self, offset: usize, encoding: &Encoding, value: &Value) -> Result<(), RomError> {
        match (encoding, value) {
            (Encoding::Single(width), Value::Single(v)) => self.write_single(offset, *width, *v),
            (Encoding::Sequence(widths), Value::Sequence(values)) => {
                if widths.len() != values.len() {
                    return Err(RomError::EncodingMismatch(format!(
                        "encoded for {} values but {} were given",
                        widths.len(),
                        values.len()
                    )));
                }
                widths.iter().try_for_each(|&w| Self::check_width(w).map(|_| ()))?;
                self.check_range(offset, encoding.len())?;
                let mut cursor = offset;
                for (&width, &v) in widths.iter().zip(values) {
                    self.write_single(cursor, width, v)?;
                    cursor += width as usize;
                }
                Ok(())
            }
            (Encoding::Single(_), Value::Sequence(_)) => Err(RomError::EncodingMismatch(
                "encoded for a single value, but a sequence was given".to_string(),
            )),
            (Encoding::Sequence(_), Value::Single(_)) => Err(RomError::EncodingMismatch(
                "encoded for multiple values, but only one value was given".to_string(),
            )),
        }
    }

    /// Read integers at a SNES address.
    pub fn read_snes(&self, addr: u32, encoding: &Encoding) -> Result<Value, RomError> {
        self.read(self.snes_to_pc(addr)?, encoding)
    }

    /// Write integers at a SNES address.
    pub fn write_snes(&mut self, addr: u32, encoding: &Encoding, value: &Value) -> Result<(), RomError> {
        let offset = self.snes_to_pc(addr)?;
        self.write(offset, encoding, value)
    }

    pub fn read_u8(&self, addr: u32) -> Result<u8, RomError> {
        Ok(self.read_single(self.snes_to_pc(addr)?, 1)? as u8)
    }

    pub fn read_u16(&self, addr: u32) -> Result<u16, RomError> {
        Ok(self.read_single(self.snes_to_pc(addr)?, 2)? as u16)
    }

    pub fn read_u24(&self, addr: u32) -> Result<u32, RomError> {
        self.read_single(self.snes_to_pc(addr)?, 3)
    }

    /// Read consecutive fields of the given widths at a SNES address.
    pub fn read_fields(&self, addr: u32, widths: &[u8]) -> Result<Vec<u32>, RomError> {
        match self.read_snes(addr, &Encoding::Sequence(widths.to_vec()))? {
            Value::Sequence(values) => Ok(values),
            Value::Single(v) => Ok(vec![v]),
        }
    }

    /// Read `n` consecutive words at a SNES address.
    pub fn read_words(&self, addr: u32, n: usize) -> Result<Vec<u16>, RomError> {
        let values = self.read_fields(addr, &vec![2; n])?;
        Ok(values.into_iter().map(|v| v as u16).collect())
    }

    /// Borrow `len` raw bytes starting at a SNES address.
    pub fn read_bytes(&self, addr: u32, len: usize) -> Result<&[u8], RomError> {
        let offset = self.snes_to_pc(addr)?;
        self.check_range(offset, len)?;
        Ok(&self.content[offset..offset + len])
    }

    /// Overwrite the value at `addr` with `after` only if it currently equals
    /// `before`. Returns whether the write happened.
    pub fn verified_write(
        &mut self,
        addr: u32,
        encoding: &Encoding,
        before: &Value,
        after: &Value,
    ) -> Result<bool, RomError> {
        if !before.same_shape(after) {
            return Err(RomError::EncodingMismatch(
                "expected and replacement values have different shapes".to_string(),
            ));
        }
        if self.read_snes(addr, encoding)? != *before {
            return Ok(false);
        }
        self.write_snes(addr, encoding, after)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RomBuilder;

    #[test]
    fn test_size_must_be_half_banks() {
        assert!(Rom::from_bytes(vec![0; 0x8000]).is_ok());
        assert!(Rom::from_bytes(vec![0; 0x8200]).is_ok());
        assert!(Rom::from_bytes(Vec::new()).is_ok());
        assert_eq!(Rom::from_bytes(vec![0; 0x8001]).unwrap_err(), RomError::InvalidRomSize(0x8001));
        assert_eq!(Rom::from_bytes(vec![0; 0x100]).unwrap_err(), RomError::InvalidRomSize(0x100));
    }

    #[test]
    fn test_header_is_stripped() {
        let mut bytes = vec![0xAA; 0x200];
        bytes.extend(vec![0x11; 0x8000]);
        let rom = Rom::from_bytes(bytes).unwrap();
        assert!(rom.has_header());
        assert_eq!(rom.header().len(), 0x200);
        assert_eq!(rom.size(), 0x8000);
        assert_eq!(rom.as_bytes()[0], 0x11);
        assert_eq!(rom.to_file_bytes().len(), 0x8200);
    }

    #[test]
    fn test_detects_lorom_from_checksum() {
        let rom = RomBuilder::lorom(0x20000).build();
        assert_eq!(rom.map_mode(), MapMode::LoRom);
        assert!(rom.verify_map_mode().is_ok());
        assert_eq!(rom.snes_to_pc(0x808000).unwrap(), 0);
    }

    #[test]
    fn test_detects_hirom_from_checksum() {
        let mut bytes = vec![0u8; 0x10000];
        bytes[0xFFDC..0xFFE0].copy_from_slice(&[0x34, 0x12, 0xCB, 0xED]);
        bytes[0xFFD5] = 0x21;
        let rom = Rom::load(bytes).unwrap();
        assert_eq!(rom.map_mode(), MapMode::HiRom);
        assert_eq!(rom.snes_to_pc(0xC01234).unwrap(), 0x1234);
    }

    #[test]
    fn test_detection_falls_back_to_title() {
        let mut bytes = vec![0u8; 0x10000];
        bytes[0xFFC0..0xFFC0 + 21].copy_from_slice(b"SOME HIROM GAME      ");
        let rom = Rom::from_bytes(bytes).unwrap();
        assert_eq!(rom.map_mode(), MapMode::HiRom);
    }

    #[test]
    fn test_detection_tie_prefers_lorom() {
        let rom = Rom::from_bytes(vec![0u8; 0x10000]).unwrap();
        assert_eq!(rom.map_mode(), MapMode::LoRom);
    }

    #[test]
    fn test_detection_never_fails_on_tiny_images() {
        let rom = Rom::from_bytes(vec![0xFF; 0x200 + 0x8000]).unwrap();
        assert_eq!(rom.map_mode(), MapMode::LoRom);
    }

    #[test]
    fn test_unrecognized_map_mode() {
        let rom = RomBuilder::lorom(0x10000).map_byte(0x21).build();
        assert!(matches!(
            rom.verify_map_mode(),
            Err(RomError::UnrecognizedMapMode { mode: MapMode::LoRom, byte: 0x21 })
        ));
    }

    #[test]
    fn test_snes_to_pc_rejects_unmapped() {
        let rom = RomBuilder::lorom(0x10000).build();
        assert_eq!(rom.snes_to_pc(0x1000000), Err(RomError::AddressOutOfSpace(0x1000000)));
        assert_eq!(rom.snes_to_pc(0x7E1234), Err(RomError::UnmappedAddress(0x7E1234)));
        assert_eq!(rom.snes_to_pc(0x002100), Err(RomError::UnmappedAddress(0x002100)));
        assert_eq!(rom.snes_to_pc(0x700000), Err(RomError::UnmappedAddress(0x700000)));
        assert_eq!(rom.snes_to_pc(0x018000).unwrap(), 0x8000);
        assert_eq!(rom.snes_to_pc(0x92808D).unwrap(), 0x9008D);
    }

    #[test]
    fn test_extended_lorom_offsets_low_banks() {
        let mut bytes = vec![0u8; 0x480000];
        // checksum pair at 0x7FDE + 0x40000
        bytes[0x47FDC..0x47FE0].copy_from_slice(&[0xFF, 0x00, 0x00, 0xFF]);
        let rom = Rom::from_bytes(bytes).unwrap();
        assert_eq!(rom.map_mode(), MapMode::ExLoRom);
        assert_eq!(rom.snes_to_pc(0x008000).unwrap(), 0x400000);
        assert_eq!(rom.snes_to_pc(0x808000).unwrap(), 0);
    }

    #[test]
    fn test_read_little_endian() {
        let rom = RomBuilder::lorom(0x10000).put(0x808000, &[0x01, 0x02, 0x03, 0x04]).build();
        assert_eq!(rom.read(0, &Encoding::Single(2)).unwrap(), Value::Single(0x0201));
        assert_eq!(rom.read(0, &Encoding::Single(3)).unwrap(), Value::Single(0x030201));
        assert_eq!(rom.read(0, &Encoding::Single(4)).unwrap(), Value::Single(0x04030201));
        assert_eq!(
            rom.read(0, &Encoding::Sequence(vec![2, 1, 1])).unwrap(),
            Value::Sequence(vec![0x0201, 0x03, 0x04])
        );
        assert_eq!(rom.read_u24(0x808001).unwrap(), 0x040302);
    }

    #[test]
    fn test_read_out_of_bounds() {
        let rom = RomBuilder::lorom(0x10000).build();
        assert!(matches!(rom.read(0xFFFF, &Encoding::Single(2)), Err(RomError::OutOfBounds { .. })));
        assert!(matches!(rom.read_bytes(0x81FFF0, 0x20), Err(RomError::OutOfBounds { .. })));
        assert!(matches!(rom.read(0, &Encoding::Single(5)), Err(RomError::EncodingMismatch(_))));
    }

    #[test]
    fn test_write_arity_mismatch() {
        let mut rom = RomBuilder::lorom(0x10000).build();
        let err = rom.write(0, &Encoding::Sequence(vec![1, 1]), &Value::Sequence(vec![1]));
        assert!(matches!(err, Err(RomError::EncodingMismatch(_))));
        let err = rom.write(0, &Encoding::Single(2), &Value::Sequence(vec![1]));
        assert!(matches!(err, Err(RomError::EncodingMismatch(_))));
    }

    #[test]
    fn test_write_then_read_words() {
        let mut rom = RomBuilder::lorom(0x10000).build();
        rom.write_snes(0x808010, &Encoding::repeat(2, 2), &Value::Sequence(vec![0x111F, 0x222F]))
            .unwrap();
        assert_eq!(&rom.as_bytes()[0x10..0x14], &[0x1F, 0x11, 0x2F, 0x22]);
        assert_eq!(rom.read_words(0x808010, 2).unwrap(), vec![0x111F, 0x222F]);
    }

    #[test]
    fn test_verified_write_is_idempotent() {
        let mut rom = RomBuilder::lorom(0x10000).put(0x808000, &[0x08, 0xE5]).build();
        let enc = Encoding::Single(2);
        assert!(rom.verified_write(0x808000, &enc, &Value::Single(0xE508), &Value::Single(0xE530)).unwrap());
        assert_eq!(rom.read_u16(0x808000).unwrap(), 0xE530);
        assert!(!rom.verified_write(0x808000, &enc, &Value::Single(0xE508), &Value::Single(0xE530)).unwrap());
        assert_eq!(rom.read_u16(0x808000).unwrap(), 0xE530);
    }

    #[test]
    fn test_verified_write_rejects_mismatched_values() {
        let mut rom = RomBuilder::lorom(0x10000).build();
        let err = rom.verified_write(
            0x808000,
            &Encoding::bytes(2),
            &Value::bytes(&[0, 0]),
            &Value::bytes(&[1]),
        );
        assert!(matches!(err, Err(RomError::EncodingMismatch(_))));
        assert_eq!(rom.as_bytes()[0], 0);
    }

    #[test]
    fn test_game_title() {
        let rom = RomBuilder::lorom(0x10000).title("SUPER METROID").build();
        assert_eq!(rom.game_title().unwrap(), "SUPER METROID        ");
    }
}
