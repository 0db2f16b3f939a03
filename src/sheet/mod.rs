//! Sprite sheet metadata
//!
//! A sheet is a JSON document listing named images. Each image says where it
//! goes on the sheet (`layout`), which animation and pose it shows (`usage`),
//! and how it is framed. Images may inherit any attribute except `spacing`
//! from a `parent`, resolved through [`Hierarchy`].
//!
//! ```json
//! {
//!   "border_size": 1,
//!   "border_color": [64, 64, 64],
//!   "images": [
//!     { "name": "base", "dimensions": [-16, -32, 16, 16], "palette range": [0, 15] },
//!     { "name": "stand_right", "parent": "base", "layout": [0, 0], "usage": [[1, 0]] }
//!   ]
//! }
//! ```

mod render;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use image::Rgba;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::canvas::BoundingBox;
use crate::hierarchy::{Hierarchy, HierarchyError, HierarchyNode};

pub use render::{frame_image, render_sheet, FramedImage};

/// Error when loading a sheet
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SheetError {
    /// Failed to read the sheet file
    #[error("Failed to read sheet: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed JSON or unexpected field types
    #[error("Failed to parse sheet: {0}")]
    Json(#[from] serde_json::Error),
    /// Broken parent links
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
    /// Well-formed but unusable data
    #[error("Invalid sheet: {0}")]
    Invalid(String),
}

/// Largest coordinate magnitude in `dimensions`, `shift` and `spacing`.
pub const MAX_COORDINATE: i32 = 2048;
/// Largest `scale` of a single image.
pub const MAX_IMAGE_SCALE: u32 = 16;
/// Largest side of an image after scaling, in pixels.
pub const MAX_IMAGE_SIDE: i32 = 4096;
/// Largest border around each image.
pub const MAX_BORDER_SIZE: u32 = 64;

fn default_border_size() -> u32 {
    1
}

fn default_border_color() -> [u8; 3] {
    [0x40, 0x40, 0x40]
}

/// The sheet document as written.
#[derive(Debug, Clone, Deserialize)]
pub struct SheetData {
    #[serde(default = "default_border_size")]
    pub border_size: u32,
    #[serde(default = "default_border_color")]
    pub border_color: [u8; 3],
    pub images: Vec<SheetImage>,
}

/// Animation half of a usage pair: an animation number, a `"0x.."` string,
/// or the name of a special import.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(untagged)]
pub enum UsageAnimation {
    Index(u16),
    Name(String),
}

/// One image entry with only the attributes it sets itself.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SheetImage {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    /// `[row, position within row]`
    #[serde(default)]
    pub layout: Option<[i64; 2]>,
    /// `(animation, pose)` pairs showing this image, the first is imported
    #[serde(default)]
    pub usage: Option<Vec<(UsageAnimation, u16)>>,
    /// `[x0, y0, x1, y1]` around the sprite origin
    #[serde(default)]
    pub dimensions: Option<[i32; 4]>,
    /// Extra rectangles shown next to the primary one
    #[serde(default, rename = "dimensions+")]
    pub extra_dimensions: Option<Vec<[i32; 4]>>,
    #[serde(default)]
    pub scale: Option<u32>,
    /// Vertical offset used to line up the row
    #[serde(default)]
    pub shift: Option<i32>,
    /// Horizontal padding, negative values pad on the left
    #[serde(default)]
    pub spacing: Option<i32>,
    /// Slice of the master palette, `[start, end)`
    #[serde(default, rename = "palette range")]
    pub palette_range: Option<[usize; 2]>,
    /// Restrict the import to the `upper` or `lower` body
    #[serde(default, rename = "import table")]
    pub import_table: Option<String>,
}

impl HierarchyNode for SheetImage {
    fn name(&self) -> &str {
        &self.name
    }

    fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }
}

/// An image with every attribute looked up along its parent chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub name: String,
    pub usage: Vec<(UsageAnimation, u16)>,
    pub dimensions: BoundingBox,
    pub extra_dimensions: Vec<BoundingBox>,
    pub scale: u32,
    pub shift: i32,
    pub spacing: i32,
    pub palette_range: Option<[usize; 2]>,
    pub import_table: Option<String>,
}

impl ResolvedImage {
    /// Union of all dimension rectangles, unscaled.
    pub fn raw_bounding_box(&self) -> BoundingBox {
        self.extra_dimensions
            .iter()
            .fold(self.dimensions, |acc, rect| acc.union(rect))
    }

    /// Bounding box and the list of rectangles, multiplied by `scale`.
    pub fn scaled_dimensions(&self) -> (BoundingBox, Vec<BoundingBox>) {
        let s = self.scale.max(1) as i32;
        let scale = |b: &BoundingBox| BoundingBox::new(b.x0 * s, b.y0 * s, b.x1 * s, b.y1 * s);
        let rects: Vec<BoundingBox> = std::iter::once(&self.dimensions)
            .chain(&self.extra_dimensions)
            .map(scale)
            .collect();
        (scale(&self.raw_bounding_box()), rects)
    }

    /// The `(animation, pose)` pair to import.
    pub fn representative_usage(&self) -> Option<&(UsageAnimation, u16)> {
        self.usage.first()
    }
}

/// A validated sheet with its layout rows and usage table.
#[derive(Debug, Clone)]
pub struct Sheet {
    border_size: u32,
    border_color: Rgba<u8>,
    hierarchy: Hierarchy<SheetImage>,
    layout: Vec<Vec<String>>,
    usage: BTreeMap<(UsageAnimation, u16), Vec<String>>,
}

impl Sheet {
    /// Link parents, then build the layout rows and the usage table.
    pub fn new(data: SheetData) -> Result<Self, SheetError> {
        let [r, g, b] = data.border_color;
        if data.border_size > MAX_BORDER_SIZE {
            return Err(SheetError::Invalid(format!(
                "border_size {} is larger than {}",
                data.border_size, MAX_BORDER_SIZE
            )));
        }
        let hierarchy = Hierarchy::build(data.images)?;
        for image in hierarchy.iter() {
            check_limits(image)?;
        }

        // Rows in order of layout[0], entries sorted by layout[1]
        let mut rows: BTreeMap<i64, Vec<(i64, String)>> = BTreeMap::new();
        for image in hierarchy.iter() {
            match hierarchy.lookup(&image.name, |n| n.layout) {
                Some([row, column]) => rows.entry(row).or_default().push((column, image.name.clone())),
                None => debug!("Image '{}' is not part of the layout", image.name),
            }
        }
        let layout: Vec<Vec<String>> = rows
            .into_values()
            .map(|mut row| {
                row.sort_by_key(|(column, _)| *column);
                row.into_iter().map(|(_, name)| name).collect()
            })
            .collect();

        for name in layout.iter().flatten() {
            if hierarchy.lookup(name, |n| n.dimensions).is_none() {
                return Err(SheetError::Invalid(format!("image '{}' in the layout has no dimensions", name)));
            }
        }

        let mut usage: BTreeMap<(UsageAnimation, u16), Vec<String>> = BTreeMap::new();
        for image in hierarchy.iter() {
            let pairs = hierarchy.lookup(&image.name, |n| n.usage.as_ref());
            for pair in pairs.into_iter().flatten() {
                usage.entry(pair.clone()).or_default().push(image.name.clone());
            }
        }

        let sheet = Self { border_size: data.border_size, border_color: Rgba([r, g, b, 0xFF]), hierarchy, layout, usage };
        for image in sheet.hierarchy.iter() {
            let Some(resolved) = sheet.resolve(&image.name) else {
                continue;
            };
            let (bounds, _) = resolved.scaled_dimensions();
            if bounds.width() > MAX_IMAGE_SIDE || bounds.height() > MAX_IMAGE_SIDE {
                return Err(SheetError::Invalid(format!(
                    "image '{}' is {}x{} pixels, more than {} on a side",
                    image.name,
                    bounds.width(),
                    bounds.height(),
                    MAX_IMAGE_SIDE
                )));
            }
        }
        Ok(sheet)
    }

    pub fn from_json(json: &str) -> Result<Self, SheetError> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, SheetError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Replace the border settings, typically from configuration. The size
    /// is capped at [`MAX_BORDER_SIZE`].
    pub fn with_border(mut self, size: Option<u32>, color: Option<Rgba<u8>>) -> Self {
        if let Some(size) = size {
            self.border_size = size.min(MAX_BORDER_SIZE);
        }
        if let Some(color) = color {
            self.border_color = color;
        }
        self
    }

    pub fn border_size(&self) -> u32 {
        self.border_size
    }

    pub fn border_color(&self) -> Rgba<u8> {
        self.border_color
    }

    pub fn hierarchy(&self) -> &Hierarchy<SheetImage> {
        &self.hierarchy
    }

    /// Image names per row, top to bottom.
    pub fn layout(&self) -> &[Vec<String>] {
        &self.layout
    }

    /// Every image on the sheet, row by row.
    pub fn layout_images(&self) -> impl Iterator<Item = &str> {
        self.layout.iter().flatten().map(String::as_str)
    }

    /// Images that show a given animation and pose.
    pub fn images_for(&self, animation: &UsageAnimation, pose: u16) -> &[String] {
        self.usage
            .get(&(animation.clone(), pose))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every `(animation, pose)` pair used by some image.
    pub fn usages(&self) -> impl Iterator<Item = &(UsageAnimation, u16)> {
        self.usage.keys()
    }

    /// Look up all attributes of an image. `spacing` is never inherited.
    pub fn resolve(&self, name: &str) -> Option<ResolvedImage> {
        let h = &self.hierarchy;
        let own = h.get(name)?;
        Some(ResolvedImage {
            name: own.name.clone(),
            usage: h.lookup(name, |n| n.usage.clone()).unwrap_or_default(),
            dimensions: h.lookup(name, |n| n.dimensions).map(BoundingBox::from_array).unwrap_or_default(),
            extra_dimensions: h
                .lookup(name, |n| n.extra_dimensions.clone())
                .unwrap_or_default()
                .into_iter()
                .map(BoundingBox::from_array)
                .collect(),
            scale: h.lookup(name, |n| n.scale).unwrap_or(1),
            shift: h.lookup(name, |n| n.shift).unwrap_or(0),
            spacing: own.spacing.unwrap_or(0),
            palette_range: h.lookup(name, |n| n.palette_range),
            import_table: h.lookup(name, |n| n.import_table.clone()),
        })
    }
}

/// Bounds on the attributes an image sets itself, so that framing
/// arithmetic stays within `i32`.
fn check_limits(image: &SheetImage) -> Result<(), SheetError> {
    let invalid = |what: &str| SheetError::Invalid(format!("image '{}' has an out of range {}", image.name, what));

    let out_of_range = |c: &i32| c.unsigned_abs() > MAX_COORDINATE.unsigned_abs();

    let rects = image.dimensions.iter().chain(image.extra_dimensions.iter().flatten());
    if rects.flatten().any(out_of_range) {
        return Err(invalid("dimension"));
    }
    if image.scale.is_some_and(|scale| scale > MAX_IMAGE_SCALE) {
        return Err(invalid("scale"));
    }
    if image.shift.as_ref().is_some_and(out_of_range) {
        return Err(invalid("shift"));
    }
    if image.spacing.as_ref().is_some_and(out_of_range) {
        return Err(invalid("spacing"));
    }
    Ok(())
}
