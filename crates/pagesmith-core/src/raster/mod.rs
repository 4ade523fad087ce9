//! Raster primitives: canvases, simple drawing, codecs and resampling.
//!
//! Every filter works on [`RgbaImage`]. Drawing helpers mutate a canvas the
//! caller owns and silently clip anything outside its bounds.

mod codec;
mod transform;

pub use codec::{is_supported_image, load_image, save_jpeg, to_jpeg_bytes, SUPPORTED_EXTENSIONS};
pub use transform::{resize_image, rotate_image};

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgba, RgbaImage};

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Width of one label glyph in pixels at scale 1.
pub const GLYPH_WIDTH: u32 = 8;
/// Height of one label glyph in pixels at scale 1.
pub const GLYPH_HEIGHT: u32 = 16;

/// Create a canvas filled with a single color.
pub fn create_image(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(width, height, color)
}

/// Fill the half-open rectangle `[x1, x2) x [y1, y2)`.
pub fn fill_rect(image: &mut RgbaImage, x1: i64, y1: i64, x2: i64, y2: i64, color: Rgba<u8>) {
    let x_start = x1.max(0);
    let y_start = y1.max(0);
    let x_end = x2.min(i64::from(image.width()));
    let y_end = y2.min(i64::from(image.height()));

    for y in y_start..y_end {
        for x in x_start..x_end {
            image.put_pixel(x as u32, y as u32, color);
        }
    }
}

/// Draw a one pixel line from `(x1, y1)` up to, but excluding, `(x2, y2)`.
pub fn draw_line(image: &mut RgbaImage, x1: i64, y1: i64, x2: i64, y2: i64, color: Rgba<u8>) {
    let dx = x2 - x1;
    let dy = y2 - y1;
    let steps = dx.abs().max(dy.abs());
    if steps == 0 {
        return;
    }

    let inc_x = dx as f64 / steps as f64;
    let inc_y = dy as f64 / steps as f64;
    for i in 0..steps {
        let x = x1 + (inc_x * i as f64).round() as i64;
        let y = y1 + (inc_y * i as f64).round() as i64;
        put_clipped(image, x, y, color);
    }
}

/// Draw `label` with its top-left corner at `(x, y)`.
///
/// Glyphs come from an 8x8 bitmap font with every row doubled, giving 8x16
/// cells, then enlarged by the integer `scale`. Characters outside the basic
/// font leave a blank cell.
pub fn draw_label(image: &mut RgbaImage, x: i64, y: i64, label: &str, scale: u32, color: Rgba<u8>) {
    let scale = i64::from(scale.max(1));
    let cell = i64::from(GLYPH_WIDTH) * scale;

    for (i, ch) in label.chars().enumerate() {
        let Some(glyph) = BASIC_FONTS.get(ch) else {
            continue;
        };
        let origin_x = x + i as i64 * cell;

        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..8 {
                if bits & (1 << col) == 0 {
                    continue;
                }
                let px = origin_x + col * scale;
                let py = y + row as i64 * 2 * scale;
                fill_rect(image, px, py, px + scale, py + 2 * scale, color);
            }
        }
    }
}

/// Pixel width of `label` when drawn at `scale`.
pub fn label_width(label: &str, scale: u32) -> u32 {
    label.chars().count() as u32 * GLYPH_WIDTH * scale.max(1)
}

/// Mark the four corner pixels black so page edges survive viewer cropping.
pub fn mark_edge_points(image: &mut RgbaImage) {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    for (x, y) in [(0, 0), (w - 1, 0), (0, h - 1), (w - 1, h - 1)] {
        image.put_pixel(x, y, BLACK);
    }
}

fn put_clipped(image: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && x < i64::from(image.width()) && y < i64::from(image.height()) {
        image.put_pixel(x as u32, y as u32, color);
    }
}
