//! 8x8 4bpp tiles and bit-packed tilemap entries
//!
//! A tilemap entry is the 5 byte record `$s000_000x_xxxx_xxxx $yyyy_yyyy
//! $vhoo_pppt_tttt_tttt`, read as a word, a byte and a word:
//!
//! - `s`: 16x16 ("big") tile instead of 8x8
//! - `x`/`y`: offset from the sprite origin, the 9th x bit wraps negative
//! - `v`/`h`: vertical/horizontal flip
//! - `o`: priority, `p`: palette
//! - `t`: tile index, the high bit selects the next VRAM page

use thiserror::Error;

/// Size of one 4bpp tile in bytes.
pub const TILE_BYTES: usize = 32;

const BIT_MASK: [u8; 8] = [0x80, 0x40, 0x20, 0x10, 0x08, 0x04, 0x02, 0x01];

const BYTE_MAP: [[usize; 4]; 8] = [
    [0, 1, 16, 17],
    [2, 3, 18, 19],
    [4, 5, 20, 21],
    [6, 7, 22, 23],
    [8, 9, 24, 25],
    [10, 11, 26, 27],
    [12, 13, 28, 29],
    [14, 15, 30, 31],
];

const SIZE_FLAG: u16 = 0x8000;
const VFLIP_FLAG: u16 = 0x8000;
const HFLIP_FLAG: u16 = 0x4000;
const PRIORITY_SHIFT: u16 = 12;
const PALETTE_SHIFT: u16 = 9;

/// Error type for tilemap encoding failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TileError {
    /// A field does not fit in its bit range
    #[error("Tilemap field '{field}' value {value} does not fit in {bits} bits")]
    FieldOverflow { field: &'static str, value: u32, bits: u8 },
}

/// An 8x8 tile of palette indices in `[0, 16)`, row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile(pub [u8; 64]);

impl Default for Tile {
    fn default() -> Self {
        Tile([0; 64])
    }
}

impl Tile {
    /// Decode 32 bytes of SNES planar 4bpp data.
    ///
    /// Short input is treated as if padded with zeros.
    pub fn from_4bpp(data: &[u8]) -> Self {
        let byte = |i: usize| data.get(i).copied().unwrap_or(0);
        let mut pixels = [0u8; 64];
        for (y, row) in BYTE_MAP.iter().enumerate() {
            let [b0, b1, b2, b3] = row.map(byte);
            for (x, &m) in BIT_MASK.iter().enumerate() {
                pixels[x + y * 8] = (b0 & m != 0) as u8
                    | ((b1 & m != 0) as u8) << 1
                    | ((b2 & m != 0) as u8) << 2
                    | ((b3 & m != 0) as u8) << 3;
            }
        }
        Tile(pixels)
    }

    /// Palette index at column `x`, row `y`.
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.0[x + y * 8]
    }

    fn permute(&self, mask: usize) -> Self {
        let mut flipped = [0u8; 64];
        for (i, &v) in self.0.iter().enumerate() {
            flipped[i ^ mask] = v;
        }
        Tile(flipped)
    }

    /// Mirror columns.
    pub fn flip_horizontal(&self) -> Self {
        self.permute(0b000_111)
    }

    /// Mirror rows.
    pub fn flip_vertical(&self) -> Self {
        self.permute(0b111_000)
    }

    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|&v| v == 0)
    }
}

/// One OAM style placement of an 8x8 or 16x16 tile relative to a sprite origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TilemapEntry {
    pub x: i32,
    pub y: i32,
    pub index: u16,
    pub palette: u8,
    pub priority: u8,
    pub big: bool,
    pub vflip: bool,
    pub hflip: bool,
}

impl TilemapEntry {
    /// A small, unflipped entry.
    pub fn new(x: i32, y: i32, index: u16, palette: u8, priority: u8) -> Self {
        Self { x, y, index, palette, priority, ..Default::default() }
    }

    pub fn big(mut self, big: bool) -> Self {
        self.big = big;
        self
    }

    pub fn flipped(mut self, vflip: bool, hflip: bool) -> Self {
        self.vflip = vflip;
        self.hflip = hflip;
        self
    }

    /// Pack into the `[word, byte, word]` record.
    ///
    /// `x` and `y` wrap modulo 512 and 256, so negative offsets encode the
    /// same way the hardware reads them back.
    pub fn compile(&self) -> Result<[u16; 3], TileError> {
        if self.palette > 0b111 {
            return Err(TileError::FieldOverflow { field: "palette", value: self.palette as u32, bits: 3 });
        }
        if self.priority > 0b11 {
            return Err(TileError::FieldOverflow { field: "priority", value: self.priority as u32, bits: 2 });
        }
        if self.index > 0x1FF {
            return Err(TileError::FieldOverflow { field: "index", value: self.index as u32, bits: 9 });
        }

        let size = if self.big { SIZE_FLAG } else { 0 };
        let x = self.x.rem_euclid(0x200) as u16;
        let y = self.y.rem_euclid(0x100) as u16;
        let v = if self.vflip { VFLIP_FLAG } else { 0 };
        let h = if self.hflip { HFLIP_FLAG } else { 0 };
        let o = (self.priority as u16) << PRIORITY_SHIFT;
        let p = (self.palette as u16) << PALETTE_SHIFT;

        Ok([size | x, y, v | h | o | p | self.index])
    }

    /// Unpack a `[word, byte, word]` record.
    pub fn decompile(record: [u16; 3]) -> Self {
        let [a, b, c] = record;
        Self {
            x: (a & 0x1FF) as i32,
            y: (b & 0xFF) as i32,
            index: c & 0x1FF,
            palette: ((c >> PALETTE_SHIFT) & 0b111) as u8,
            priority: ((c >> PRIORITY_SHIFT) & 0b11) as u8,
            big: a & SIZE_FLAG != 0,
            vflip: c & VFLIP_FLAG != 0,
            hflip: c & HFLIP_FLAG != 0,
        }
    }

    /// Unpack a record read as a sequence of three integers.
    pub fn from_fields(fields: &[u32]) -> Self {
        let field = |i: usize| fields.get(i).copied().unwrap_or(0) as u16;
        Self::decompile([field(0), field(1), field(2)])
    }

    /// Horizontal offset with the 9th bit read as a sign.
    pub fn signed_x(&self) -> i32 {
        if self.x >= 0x100 {
            self.x - 0x200
        } else {
            self.x
        }
    }

    /// Vertical offset with the 8th bit read as a sign.
    pub fn signed_y(&self) -> i32 {
        if self.y >= 0x80 {
            self.y - 0x100
        } else {
            self.y
        }
    }

    /// Width (and height) in pixels.
    pub fn tile_width(&self) -> i32 {
        if self.big {
            16
        } else {
            8
        }
    }

    /// Mirror the placement around the sprite origin, toggling the tile's own
    /// flip flags to match.
    pub fn flip_around_center(&self, vflip: bool, hflip: bool) -> Self {
        let mut copy = *self;
        let width = self.tile_width();
        if hflip {
            copy.hflip = !copy.hflip;
            copy.x = -copy.x - width;
        }
        if vflip {
            copy.vflip = !copy.vflip;
            copy.y = -copy.y - width;
        }
        copy
    }
}
