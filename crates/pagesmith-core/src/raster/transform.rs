//! Whole-image geometric transforms: rotation and resampling.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};

use super::{create_image, WHITE};
use crate::geometry::{rotated_size, sin_cos_deg};

/// Rotate `src` counter-clockwise by `angle` degrees.
///
/// The result is sized to the rotated bounding box and starts out white, so
/// corners uncovered by the rotation stay white. Sampling is bicubic.
pub fn rotate_image(src: &RgbaImage, angle: f32) -> RgbaImage {
    let (width, height) = src.dimensions();
    let (new_width, new_height) = rotated_size(width, height, angle);
    let mut dest = create_image(new_width, new_height, WHITE);
    if new_width == 0 || new_height == 0 {
        return dest;
    }

    let (sin, cos) = sin_cos_deg(angle);
    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;
    let ncx = (new_width as f32 - 1.0) / 2.0;
    let ncy = (new_height as f32 - 1.0) / 2.0;

    // Maps source coordinates to destination coordinates, pivoting on the
    // center of each canvas.
    let tx = ncx - cos * cx - sin * cy;
    let ty = ncy + sin * cx - cos * cy;
    let matrix = [cos, sin, tx, -sin, cos, ty, 0.0, 0.0, 1.0];

    match Projection::from_matrix(matrix) {
        Some(projection) => {
            warp_into(src, &projection, Interpolation::Bicubic, WHITE, &mut dest);
            dest
        }
        None => {
            tracing::warn!("Rotation by {angle} is not invertible, leaving image unrotated");
            src.clone()
        }
    }
}

/// Resample `src` to `width` x `height` with a Lanczos3 kernel.
///
/// With `keep_aspect_ratio` the image is scaled to fit inside the box. A zero
/// dimension leaves that axis unconstrained; zero for both returns the source
/// unchanged. An image that already has the target size is copied without
/// resampling.
pub fn resize_image(src: &RgbaImage, width: u32, height: u32, keep_aspect_ratio: bool) -> RgbaImage {
    let (src_w, src_h) = src.dimensions();
    if (width == 0 && height == 0) || src_w == 0 || src_h == 0 {
        return src.clone();
    }

    let (new_w, new_h) = if keep_aspect_ratio {
        fit_within(src_w, src_h, width, height)
    } else {
        (
            if width == 0 { src_w } else { width },
            if height == 0 { src_h } else { height },
        )
    };

    if (new_w, new_h) == (src_w, src_h) {
        return src.clone();
    }
    imageops::resize(src, new_w, new_h, FilterType::Lanczos3)
}

fn fit_within(src_w: u32, src_h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    let scale_w = if max_w == 0 { f64::MAX } else { f64::from(max_w) / f64::from(src_w) };
    let scale_h = if max_h == 0 { f64::MAX } else { f64::from(max_h) / f64::from(src_h) };
    let scale = scale_w.min(scale_h);

    let w = (f64::from(src_w) * scale).round().max(1.0) as u32;
    let h = (f64::from(src_h) * scale).round().max(1.0) as u32;
    (w.min(if max_w == 0 { u32::MAX } else { max_w }), h.min(if max_h == 0 { u32::MAX } else { max_h }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{fill_rect, BLACK};

    #[test]
    fn test_rotate_zero_keeps_pixels() {
        let mut img = create_image(20, 30, WHITE);
        fill_rect(&mut img, 5, 5, 15, 25, BLACK);

        let rotated = rotate_image(&img, 0.0);
        assert_eq!(rotated.dimensions(), (20, 30));
        assert_eq!(rotated.get_pixel(10, 15)[0], 0);
        assert_eq!(rotated.get_pixel(10, 28)[0], 255);
    }

    #[test]
    fn test_rotate_fills_corners_white() {
        let img = create_image(100, 160, BLACK);
        let rotated = rotate_image(&img, 5.0);

        assert!(rotated.width() > 100 && rotated.height() > 160);
        assert_eq!(*rotated.get_pixel(0, 0), WHITE);
        let (w, h) = rotated.dimensions();
        assert_eq!(rotated.get_pixel(w / 2, h / 2)[0], 0);
    }

    #[test]
    fn test_rotate_counter_clockwise_lifts_right_side() {
        // A horizontal bar; after a CCW turn its right end sits higher than its left
        let mut img = create_image(200, 100, WHITE);
        fill_rect(&mut img, 0, 48, 200, 52, BLACK);
        let rotated = rotate_image(&img, 10.0);

        let dark_rows = |x: u32| -> Vec<u32> {
            (0..rotated.height())
                .filter(|&y| rotated.get_pixel(x, y)[0] < 128)
                .collect()
        };
        let left = dark_rows(40);
        let right = dark_rows(rotated.width() - 40);
        assert!(!left.is_empty() && !right.is_empty());
        assert!(right[0] < left[0]);
    }

    #[test]
    fn test_resize_fit_keeps_aspect() {
        let img = create_image(200, 100, WHITE);
        let resized = resize_image(&img, 100, 100, true);
        assert_eq!(resized.dimensions(), (100, 50));
    }

    #[test]
    fn test_resize_exact() {
        let img = create_image(200, 100, WHITE);
        let resized = resize_image(&img, 50, 80, false);
        assert_eq!(resized.dimensions(), (50, 80));
    }

    #[test]
    fn test_resize_zero_target_is_noop() {
        let img = create_image(33, 44, WHITE);
        assert_eq!(resize_image(&img, 0, 0, true).dimensions(), (33, 44));
    }

    #[test]
    fn test_resize_single_axis() {
        let img = create_image(200, 100, WHITE);
        assert_eq!(resize_image(&img, 0, 50, true).dimensions(), (100, 50));
    }

    #[test]
    fn test_resize_already_sized_is_identical() {
        let mut img = create_image(120, 160, WHITE);
        fill_rect(&mut img, 10, 10, 60, 90, BLACK);

        let once = resize_image(&img, 120, 160, true);
        let twice = resize_image(&once, 120, 160, true);
        assert_eq!(once, img);
        assert_eq!(twice, once);
    }
}
