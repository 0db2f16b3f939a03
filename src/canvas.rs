//! Rasterizing tilemaps onto pixel canvases
//!
//! Tiles are placed relative to a sprite origin and clipped to a bounding box
//! given in the same coordinates. The result is an indexed canvas (palette
//! indices, 0 is transparent) that can later be turned into RGBA with
//! [`apply_palette`].

use image::{Rgba, RgbaImage};

use crate::color::TRANSPARENT;
use crate::tile::{Tile, TilemapEntry};
use crate::vram::VramTiles;

/// Rectangle `[x0, y0, x1, y1)` relative to the sprite origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl BoundingBox {
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Build from an `[x0, y0, x1, y1]` array.
    pub fn from_array([x0, y0, x1, y1]: [i32; 4]) -> Self {
        Self::new(x0, y0, x1, y1)
    }

    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> i32 {
        self.y1 - self.y0
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

/// Pixel storage of a [`Canvas`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pixels {
    /// Palette indices, 0 is transparent
    Indexed(Vec<u8>),
    /// Final colors
    Rgba(Vec<Rgba<u8>>),
}

/// A rectangular grid of pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub pixels: Pixels,
}

impl Canvas {
    /// The zero-sized canvas produced by an empty tile list.
    pub fn nil() -> Self {
        Self { width: 0, height: 0, pixels: Pixels::Indexed(Vec::new()) }
    }

    /// A fully transparent RGBA canvas.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: Pixels::Rgba(vec![TRANSPARENT; area(width, height)]),
        }
    }

    /// An RGBA canvas from a row-major list of colors, `None` unless there is
    /// exactly one color per pixel.
    pub fn from_rgba(width: u32, height: u32, colors: Vec<Rgba<u8>>) -> Option<Self> {
        (colors.len() == area(width, height)).then_some(Self { width, height, pixels: Pixels::Rgba(colors) })
    }

    pub fn is_nil(&self) -> bool {
        self.width == 0 && self.height == 0
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self.pixels, Pixels::Indexed(_))
    }

    /// Palette index at a position, `None` for RGBA canvases or out of range.
    pub fn index_at(&self, x: u32, y: u32) -> Option<u8> {
        match &self.pixels {
            Pixels::Indexed(data) if x < self.width && y < self.height => {
                data.get(x as usize + y as usize * self.width as usize).copied()
            }
            _ => None,
        }
    }

    /// Convert to an `image` buffer. Indexed pixels are shown as grayscale.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut img = RgbaImage::from_pixel(self.width, self.height, TRANSPARENT);
        for y in 0..self.height {
            for x in 0..self.width {
                let i = x as usize + y as usize * self.width as usize;
                let pixel = match &self.pixels {
                    Pixels::Rgba(data) => data.get(i).copied(),
                    Pixels::Indexed(data) => data.get(i).copied().filter(|&v| v != 0).map(|v| {
                        let level = v.saturating_mul(17);
                        Rgba([level, level, level, 0xFF])
                    }),
                };
                if let Some(p) = pixel {
                    img.put_pixel(x, y, p);
                }
            }
        }
        img
    }
}

/// A decoded tile at an offset from the sprite origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePlacement {
    pub x: i32,
    pub y: i32,
    pub tile: Tile,
}

/// Expand tilemap entries into flipped 8x8 tile placements.
///
/// A big entry covers the four VRAM tiles `index`, `index + 1`,
/// `index + 0x10` and `index + 0x11`; flips swap which corner each lands in.
pub fn placements_from_tilemaps(tilemaps: &[TilemapEntry], vram: &VramTiles) -> Vec<TilePlacement> {
    let mut placements = Vec::new();
    for entry in tilemaps {
        let x = entry.signed_x();
        let y = entry.signed_y();
        let (h, v) = (entry.hflip, entry.vflip);

        let mut add = |dx: i32, dy: i32, index: u16| {
            let mut tile = vram.tile(index);
            if h {
                tile = tile.flip_horizontal();
            }
            if v {
                tile = tile.flip_vertical();
            }
            placements.push(TilePlacement { x: x + dx, y: y + dy, tile });
        };

        if entry.big {
            let near = |flip: bool| if flip { 8 } else { 0 };
            let far = |flip: bool| if flip { 0 } else { 8 };
            add(near(h), near(v), entry.index);
            add(far(h), near(v), entry.index + 0x01);
            add(near(h), far(v), entry.index + 0x10);
            add(far(h), far(v), entry.index + 0x11);
        } else {
            add(0, 0, entry.index);
        }
    }
    placements
}

fn area(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

/// Compose placements into an indexed canvas covering `bbox`.
///
/// Transparent tile pixels never overwrite; otherwise the last placement
/// wins. An empty list yields [`Canvas::nil`].
pub fn canvas_from_tiles(tiles: &[TilePlacement], bbox: BoundingBox) -> Canvas {
    if tiles.is_empty() {
        return Canvas::nil();
    }

    // Shift everything so the leftmost/topmost tile sits at non-negative coordinates
    let x_min = tiles.iter().map(|t| t.x).min().unwrap_or(0).min(0);
    let y_min = tiles.iter().map(|t| t.y).min().unwrap_or(0).min(0);
    let clip = BoundingBox::new(bbox.x0 - x_min, bbox.y0 - y_min, bbox.x1 - x_min, bbox.y1 - y_min);

    let width = clip.width().max(0) as u32;
    let height = clip.height().max(0) as u32;
    let mut data = vec![0u8; area(width, height)];

    for placement in tiles {
        for (i, &v) in placement.tile.0.iter().enumerate() {
            if v == 0 {
                continue;
            }
            let x = (i % 8) as i32 + placement.x - x_min;
            let y = (i / 8) as i32 + placement.y - y_min;
            if clip.contains(x, y) {
                let offset = (x - clip.x0) as usize + (y - clip.y0) as usize * width as usize;
                data[offset] = v;
            }
        }
    }

    Canvas { width, height, pixels: Pixels::Indexed(data) }
}

/// Rasterize tilemap entries against VRAM contents.
pub fn canvas_from_raw_data(tilemaps: &[TilemapEntry], vram: &VramTiles, bbox: BoundingBox) -> Canvas {
    canvas_from_tiles(&placements_from_tilemaps(tilemaps, vram), bbox)
}

/// Resolve palette indices to colors.
///
/// Index `i` maps to `palette[i - 1]`; index 0 and indices past the end of the
/// palette are transparent. RGBA canvases are returned unchanged.
pub fn apply_palette(canvas: &Canvas, palette: &[Rgba<u8>]) -> Canvas {
    match &canvas.pixels {
        Pixels::Indexed(data) => {
            let colors = data
                .iter()
                .map(|&i| match i {
                    0 => TRANSPARENT,
                    i => palette.get(i as usize - 1).copied().unwrap_or(TRANSPARENT),
                })
                .collect();
            Canvas { width: canvas.width, height: canvas.height, pixels: Pixels::Rgba(colors) }
        }
        Pixels::Rgba(_) => canvas.clone(),
    }
}
