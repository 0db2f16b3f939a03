//! Sheet rendering - frames every image and stacks the layout rows

use std::collections::BTreeMap;

use image::{Rgba, RgbaImage};

use super::{ResolvedImage, Sheet};
use crate::canvas::{apply_palette, Canvas};
use crate::color::TRANSPARENT;
use crate::output::scale_image;

/// An image surrounded by its border, with the row of its sprite origin.
#[derive(Debug, Clone)]
pub struct FramedImage {
    pub image: RgbaImage,
    pub y_origin: i32,
}

/// Render the whole sheet.
///
/// # Arguments
///
/// * `sheet` - Layout and framing information
/// * `canvases` - Imported canvases by image name, missing ones are drawn empty
/// * `master` - Master palette the images' palette ranges index into
///
/// # Returns
///
/// One RGBA image with every layout row centered horizontally.
pub fn render_sheet(sheet: &Sheet, canvases: &BTreeMap<String, Canvas>, master: &[Rgba<u8>]) -> RgbaImage {
    let rows: Vec<RgbaImage> = sheet
        .layout()
        .iter()
        .map(|row| {
            let entries: Vec<FramedImage> = row
                .iter()
                .filter_map(|name| sheet.resolve(name))
                .map(|image| frame_image(sheet, &image, canvases.get(&image.name), master))
                .collect();
            horizontal_collage(&entries, sheet.border_color())
        })
        .collect();
    vertical_collage(&rows)
}

/// Color, scale and frame a single image.
///
/// Pixels inside the image's dimension rectangles show the canvas; the rest
/// of the frame is border colored.
pub fn frame_image(sheet: &Sheet, image: &ResolvedImage, canvas: Option<&Canvas>, master: &[Rgba<u8>]) -> FramedImage {
    let border = sheet.border_size() as i32;
    let (bounds, rects) = image.scaled_dimensions();

    let rgba = match canvas {
        Some(canvas) => {
            let palette = image
                .palette_range
                .map(|[start, end]| palette_slice(master, start, end))
                .unwrap_or(&[]);
            apply_palette(canvas, palette).to_rgba_image()
        }
        None => {
            let raw = image.raw_bounding_box();
            RgbaImage::from_pixel(raw.width().max(0) as u32, raw.height().max(0) as u32, TRANSPARENT)
        }
    };
    let bitmap = scale_image(rgba, image.scale);

    let width = bitmap.width() as i32 + border * 2 + image.spacing.abs();
    let height = bitmap.height() as i32 + border * 2;
    let x_origin = border - bounds.x0 - image.spacing.min(0);
    let y_origin = border - bounds.y0;

    let mut framed = RgbaImage::from_pixel(width as u32, height as u32, sheet.border_color());
    for fy in 0..height {
        for fx in 0..width {
            let (x, y) = (fx - x_origin, fy - y_origin);
            if !rects.iter().any(|r| r.contains(x, y)) {
                continue;
            }
            let (bx, by) = (x - bounds.x0, y - bounds.y0);
            let inside = bx >= 0 && by >= 0 && (bx as u32) < bitmap.width() && (by as u32) < bitmap.height();
            let pixel = if inside { *bitmap.get_pixel(bx as u32, by as u32) } else { TRANSPARENT };
            framed.put_pixel(fx as u32, fy as u32, pixel);
        }
    }

    FramedImage { image: framed, y_origin: y_origin - image.shift }
}

fn palette_slice(master: &[Rgba<u8>], start: usize, end: usize) -> &[Rgba<u8>] {
    let end = end.min(master.len());
    master.get(start.min(end)..end).unwrap_or(&[])
}

/// Place images left to right with their origins on one line.
fn horizontal_collage(entries: &[FramedImage], background: Rgba<u8>) -> RgbaImage {
    let top = entries.iter().map(|e| -e.y_origin).min().unwrap_or(0);
    let bottom = entries.iter().map(|e| e.image.height() as i32 - e.y_origin).max().unwrap_or(0);
    let width: u32 = entries.iter().map(|e| e.image.width()).sum();
    let height = (bottom - top).max(0) as u32;

    let mut row = RgbaImage::from_pixel(width, height, background);
    let mut x = 0;
    for entry in entries {
        let y = (-(top + entry.y_origin)) as u32;
        for (px, py, pixel) in entry.image.enumerate_pixels() {
            row.put_pixel(x + px, y + py, *pixel);
        }
        x += entry.image.width();
    }
    row
}

/// Stack rows top to bottom, each centered.
fn vertical_collage(rows: &[RgbaImage]) -> RgbaImage {
    let width = rows.iter().map(|r| r.width()).max().unwrap_or(0);
    let height = rows.iter().map(|r| r.height()).sum();

    let mut sheet = RgbaImage::from_pixel(width, height, TRANSPARENT);
    let mut y = 0;
    for row in rows {
        let x = (width - row.width()) / 2;
        for (px, py, pixel) in row.enumerate_pixels() {
            sheet.put_pixel(x + px, y + py, *pixel);
        }
        y += row.height();
    }
    sheet
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Pixels;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GRAY: Rgba<u8> = Rgba([10, 20, 30, 255]);

    fn sheet(images: &str) -> Sheet {
        Sheet::from_json(&format!(
            r#"{{ "border_size": 1, "border_color": [10, 20, 30], "images": [{}] }}"#,
            images
        ))
        .unwrap()
    }

    fn solid(width: u32, height: u32, index: u8) -> Canvas {
        Canvas { width, height, pixels: Pixels::Indexed(vec![index; (width * height) as usize]) }
    }

    #[test]
    fn test_frame_size_and_border() {
        let sheet = sheet(r#"{ "name": "a", "layout": [0, 0], "dimensions": [-2, -2, 2, 2], "palette range": [0, 1] }"#);
        let image = sheet.resolve("a").unwrap();
        let framed = frame_image(&sheet, &image, Some(&solid(4, 4, 1)), &[RED]);
        assert_eq!(framed.image.dimensions(), (6, 6));
        assert_eq!(framed.y_origin, 3);
        assert_eq!(*framed.image.get_pixel(0, 0), GRAY);
        assert_eq!(*framed.image.get_pixel(1, 1), RED);
        assert_eq!(*framed.image.get_pixel(4, 4), RED);
        assert_eq!(*framed.image.get_pixel(5, 5), GRAY);
    }

    #[test]
    fn test_missing_canvas_is_transparent() {
        let sheet = sheet(r#"{ "name": "a", "layout": [0, 0], "dimensions": [0, 0, 3, 2] }"#);
        let image = sheet.resolve("a").unwrap();
        let framed = frame_image(&sheet, &image, None, &[]);
        assert_eq!(framed.image.dimensions(), (5, 4));
        assert_eq!(*framed.image.get_pixel(1, 1), TRANSPARENT);
    }

    #[test]
    fn test_scale_and_spacing() {
        let sheet = sheet(r#"{ "name": "a", "layout": [0, 0], "dimensions": [0, 0, 2, 2], "scale": 3, "spacing": -4 }"#);
        let image = sheet.resolve("a").unwrap();
        let framed = frame_image(&sheet, &image, Some(&solid(2, 2, 1)), &[RED]);
        // 6 scaled pixels, 2 border, 4 spacing on the left
        assert_eq!(framed.image.dimensions(), (12, 8));
        assert_eq!(*framed.image.get_pixel(4, 3), GRAY);
        // no palette range means every index is transparent
        assert_eq!(*framed.image.get_pixel(5, 3), TRANSPARENT);
    }

    #[test]
    fn test_outside_rectangles_keeps_border() {
        let sheet = sheet(
            r#"{ "name": "a", "layout": [0, 0], "dimensions": [0, 0, 2, 2], "dimensions+": [[2, 0, 4, 1]],
                 "palette range": [0, 1] }"#,
        );
        let image = sheet.resolve("a").unwrap();
        let framed = frame_image(&sheet, &image, Some(&solid(4, 2, 1)), &[RED]);
        assert_eq!(framed.image.dimensions(), (6, 4));
        assert_eq!(*framed.image.get_pixel(3, 1), RED);
        assert_eq!(*framed.image.get_pixel(3, 2), GRAY);
        assert_eq!(*framed.image.get_pixel(4, 2), GRAY);
    }

    #[test]
    fn test_rows_align_origins() {
        let sheet = sheet(
            r#"{ "name": "tall", "layout": [0, 0], "dimensions": [0, -4, 2, 0] },
               { "name": "low", "layout": [0, 1], "dimensions": [0, 0, 2, 2] },
               { "name": "next", "layout": [1, 0], "dimensions": [0, 0, 1, 1] }"#,
        );
        let img = render_sheet(&sheet, &BTreeMap::new(), &[]);
        // row 0: heights 6 (origin 5) and 4 (origin 1) -> spans -5..3
        // row 1: 3x3, centered under the 8 pixel wide first row
        assert_eq!(img.dimensions(), (8, 11));
        assert_eq!(*img.get_pixel(0, 8), TRANSPARENT);
        assert_eq!(*img.get_pixel(3, 8), GRAY);
    }

    #[test]
    fn test_palette_slice_clamps() {
        let master = [RED, GRAY];
        assert_eq!(palette_slice(&master, 1, 5), &[GRAY]);
        assert!(palette_slice(&master, 4, 6).is_empty());
    }

    #[test]
    fn test_empty_sheet() {
        let sheet = sheet("");
        let img = render_sheet(&sheet, &BTreeMap::new(), &[]);
        assert_eq!(img.dimensions(), (0, 0));
    }
}
