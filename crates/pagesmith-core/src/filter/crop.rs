//! Crop rectangle solver and the fixed-margin `crop` filter.
//!
//! The solver takes a proposed crop box and widens it until it respects two
//! kinds of limit: how much of each dimension may be cut away, and the
//! allowed height/width ratio. Growth is split evenly between opposite sides
//! where the image has room, and never leaves the image.

use image::imageops;
use image::{GenericImageView, RgbaImage};
use serde::{Deserialize, Serialize};

use super::{Filter, FilterKind, FilterOutcome, FilterReport, FilterSource};
use crate::raster::{create_image, WHITE};

/// A crop box in pixel coordinates, right and bottom exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropRect {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Height divided by width.
    pub fn ratio(&self) -> f32 {
        self.height() as f32 / self.width().max(1) as f32
    }

    pub fn contains(&self, other: &CropRect) -> bool {
        self.left <= other.left
            && self.top <= other.top
            && self.right >= other.right
            && self.bottom >= other.bottom
    }
}

/// Limits applied by [`solve_crop_rect`]. Ratios are height / width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CropConstraints {
    /// Largest fraction of the width that may be cut away
    pub max_width_crop_rate: f32,
    /// Largest fraction of the height that may be cut away
    pub max_height_crop_rate: f32,
    pub min_ratio: f32,
    pub max_ratio: f32,
}

impl Default for CropConstraints {
    fn default() -> Self {
        Self {
            max_width_crop_rate: 0.1,
            max_height_crop_rate: 0.1,
            min_ratio: 1.0,
            max_ratio: 2.0,
        }
    }
}

/// Widen `initial` until it satisfies `constraints` inside an
/// `image_width` x `image_height` image.
///
/// The result always contains `initial` (clamped to the image) and never
/// exceeds the image bounds. The ratio limits hold unless meeting them would
/// need more room than the image has.
pub fn solve_crop_rect(
    initial: CropRect,
    image_width: u32,
    image_height: u32,
    constraints: &CropConstraints,
) -> CropRect {
    let img_w = i64::from(image_width);
    let img_h = i64::from(image_height);
    let left = i64::from(initial.left).min(img_w);
    let top = i64::from(initial.top).min(img_h);
    let right = i64::from(initial.right).clamp(left, img_w);
    let bottom = i64::from(initial.bottom).clamp(top, img_h);

    let min_w = (image_width as f32 * (1.0 - constraints.max_width_crop_rate)) as i64;
    let min_h = (image_height as f32 * (1.0 - constraints.max_height_crop_rate)) as i64;
    let mut width = (right - left).max(min_w).max(1);
    let mut height = (bottom - top).max(min_h).max(1);

    let ratio = height as f32 / width as f32;
    if ratio < constraints.min_ratio {
        height = height.max((width as f32 * constraints.min_ratio).ceil() as i64);
    } else if constraints.max_ratio > 0.0 && ratio > constraints.max_ratio {
        width = width.max((height as f32 / constraints.max_ratio).ceil() as i64);
    }

    let (left, right) = expand_axis(left, right, width.min(img_w), img_w);
    let (top, bottom) = expand_axis(top, bottom, height.min(img_h), img_h);

    CropRect::new(left as u32, top as u32, right as u32, bottom as u32)
}

/// Grow `[start, end)` to `target` inside `[0, limit)`.
///
/// Each side first takes up to half the growth from its own margin, with the
/// opposite side absorbing what one side could not take. Whatever is still
/// missing is split by the margin each side has left.
fn expand_axis(mut start: i64, mut end: i64, target: i64, limit: i64) -> (i64, i64) {
    let inc = target - (end - start);
    if inc <= 0 {
        return (start, end);
    }

    let before = start.min(inc / 2);
    let after = (limit - end).min(inc - before);
    start -= before;
    end += after;

    let deficit = target - (end - start);
    if deficit > 0 {
        let space = start + (limit - end);
        if space > 0 {
            let share = ((deficit as f64) * (start as f64) / (space as f64)).round() as i64;
            let before = share.min(start);
            let after = (deficit - before).min(limit - end);
            start -= before;
            end += after;

            let rest = target - (end - start);
            if rest > 0 {
                start -= rest.min(start);
            }
        }
    }

    (start, end)
}

/// Copy `rect` out of `src` onto a fresh white canvas of the rect's size.
pub fn crop_image(src: &RgbaImage, rect: &CropRect) -> RgbaImage {
    let mut dest = create_image(rect.width(), rect.height(), WHITE);

    let left = rect.left.min(src.width());
    let top = rect.top.min(src.height());
    let w = rect.width().min(src.width() - left);
    let h = rect.height().min(src.height() - top);
    if w > 0 && h > 0 {
        imageops::replace(&mut dest, &*src.view(left, top, w, h), 0, 0);
    }
    dest
}

/// Options for the `crop` filter: margins to cut, then solver limits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CropOption {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    #[serde(flatten)]
    pub constraints: CropConstraints,
}

/// Cuts fixed margins, widening the box as the constraints require.
pub struct CropFilter {
    option: CropOption,
}

impl CropFilter {
    pub fn new(option: CropOption) -> Self {
        Self { option }
    }

    fn rect_for(&self, width: u32, height: u32) -> Option<CropRect> {
        let opt = &self.option;
        if opt.left + opt.right >= width || opt.top + opt.bottom >= height {
            return None;
        }
        let initial = CropRect::new(opt.left, opt.top, width - opt.right, height - opt.bottom);
        Some(solve_crop_rect(initial, width, height, &opt.constraints))
    }
}

impl Filter for CropFilter {
    fn kind(&self) -> FilterKind {
        FilterKind::Crop
    }

    fn run(&self, source: &FilterSource<'_>) -> FilterOutcome {
        let rect = self.rect_for(source.image.width(), source.image.height());
        let image = rect.map(|r| crop_image(source.image, &r));
        FilterOutcome::new(
            image,
            FilterReport::Crop {
                filename: source.filename.to_string(),
                rect,
            },
        )
    }
}
