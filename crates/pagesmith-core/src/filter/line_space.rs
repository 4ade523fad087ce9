//! Line-space compaction.
//!
//! Rows are classified as blank or ink, grouped into contiguous bands, and
//! blank bands are shortened. When shortening would make the page flatter
//! than the configured aspect ratio, height is handed back to the blank
//! bands in proportion to what they lost.
//!
//! The redistribution is a heuristic: a bounded number of proportional
//! rounds, then one pass that nudges blank bands a row at a time. It usually
//! lands on the exact minimum height but does not guarantee it.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use super::{Filter, FilterKind, FilterOutcome, FilterReport, FilterSource};
use crate::raster::{create_image, WHITE};

/// Proportional redistribution rounds before the final one-row pass.
const MAX_ROUNDS: usize = 5;

/// Options for the `changeLineSpace` filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangeLineSpaceOption {
    /// Width part of the minimum page aspect ratio
    pub width_ratio: f64,
    /// Height part of the minimum page aspect ratio
    pub height_ratio: f64,
    /// Factor applied to blank bands taller than `min_space`
    pub line_space_scale: f64,
    /// Blank bands never shrink below this many rows
    pub min_space: u32,
    /// Most rows removed from a single blank band
    pub max_remove: u32,
    /// Brightness (0-255) below which a pixel counts as ink
    pub threshold: u32,
    /// Ink pixels that make a row non-blank: absolute when >= 1, else a
    /// fraction of the width
    pub empty_line_threshold: f64,
    /// Log the planned heights
    pub debug_mode: bool,
}

impl Default for ChangeLineSpaceOption {
    fn default() -> Self {
        Self {
            width_ratio: 3.0,
            height_ratio: 4.0,
            line_space_scale: 0.5,
            min_space: 8,
            max_remove: 1000,
            threshold: 128,
            empty_line_threshold: 0.005,
            debug_mode: false,
        }
    }
}

/// A maximal band of rows with the same classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    /// First row of the band
    pub start: u32,
    /// One past the last row
    pub end: u32,
    pub height: u32,
    /// Rows kept in the output
    pub target_height: u32,
    pub is_empty: bool,
}

impl LineRange {
    fn new(start: u32, is_empty: bool) -> Self {
        Self {
            start,
            end: start + 1,
            height: 1,
            target_height: 1,
            is_empty,
        }
    }

    fn reduced_height(&self) -> u32 {
        self.height.saturating_sub(self.target_height)
    }
}

/// Shrinks blank bands between text lines.
pub struct ChangeLineSpaceFilter {
    option: ChangeLineSpaceOption,
}

impl ChangeLineSpaceFilter {
    pub fn new(option: ChangeLineSpaceOption) -> Self {
        Self { option }
    }

    /// Partition the rows of `image` into blank and ink bands.
    ///
    /// The bands are ordered, contiguous and cover `[0, height)` exactly.
    pub fn line_ranges(&self, image: &RgbaImage) -> Vec<LineRange> {
        let (width, height) = (image.width() as usize, image.height());
        let raw = image.as_raw();
        let threshold16 = self.option.threshold * 256;
        let cutoff = if self.option.empty_line_threshold >= 1.0 {
            self.option.empty_line_threshold as usize
        } else {
            (width as f64 * self.option.empty_line_threshold) as usize
        };

        let mut ranges: Vec<LineRange> = Vec::new();
        for y in 0..height {
            let row = &raw[y as usize * width * 4..(y as usize + 1) * width * 4];
            let mut dots = 0;
            let mut is_empty = true;
            for px in row.chunks_exact(4) {
                let brightness = (u32::from(px[0]) + u32::from(px[1]) + u32::from(px[2])) * 257 / 3;
                if brightness < threshold16 {
                    dots += 1;
                    if dots >= cutoff {
                        is_empty = false;
                        break;
                    }
                }
            }

            match ranges.last_mut() {
                Some(last) if last.is_empty == is_empty => {
                    last.end = y + 1;
                    last.height += 1;
                    last.target_height = last.height;
                }
                _ => ranges.push(LineRange::new(y, is_empty)),
            }
        }
        ranges
    }

    /// Fill in `target_height` for every band and return the output height.
    pub fn plan_heights(&self, ranges: &mut [LineRange], width: u32) -> u32 {
        let opt = &self.option;
        for r in ranges.iter_mut() {
            r.target_height = if !r.is_empty || r.height <= opt.min_space {
                r.height
            } else {
                let scaled = (f64::from(r.height) * opt.line_space_scale).round() as u32;
                let target = scaled.max(opt.min_space).min(r.height);
                target.max(r.height.saturating_sub(opt.max_remove))
            };
        }

        let min_total = if opt.width_ratio > 0.0 {
            (opt.height_ratio * f64::from(width) / opt.width_ratio).round() as u32
        } else {
            0
        };
        let empty_count = ranges.iter().filter(|r| r.is_empty).count() as u64;
        let mut total = total_target(ranges);
        if opt.debug_mode {
            tracing::debug!("min targetHeight: {}", min_total);
        }

        let mut round = 0;
        while total < min_total && round < MAX_ROUNDS {
            let slack: u64 = ranges
                .iter()
                .filter(|r| r.is_empty)
                .map(|r| u64::from(r.reduced_height()))
                .sum();

            let mut total_inc = 0u64;
            if slack > 0 {
                let needed = u64::from(min_total - total);
                for r in ranges.iter_mut().filter(|r| r.is_empty) {
                    let reduced = u64::from(r.reduced_height());
                    let inc = reduced.min(reduced * needed / slack);
                    r.target_height += inc as u32;
                    total_inc += inc;
                }
            }

            total = total_target(ranges);
            round += 1;
            if opt.debug_mode {
                tracing::debug!("[{}] totalInc={}, targetHeight={}", round - 1, total_inc, total);
            }

            // Proportional shares have rounded down to almost nothing
            if total_inc <= empty_count {
                nudge_to_target(ranges, i64::from(min_total) - i64::from(total));
                total = total_target(ranges);
                break;
            }
        }

        if opt.debug_mode {
            tracing::debug!("TargetHeight: {}", total);
        }
        total
    }

    /// Compact `image`, returning the new page.
    pub fn compact(&self, image: &RgbaImage) -> RgbaImage {
        let mut ranges = self.line_ranges(image);
        if ranges.len() <= 1 {
            return image.clone();
        }

        let width = image.width();
        let total = self.plan_heights(&mut ranges, width);
        let row_bytes = width as usize * 4;
        let src = image.as_raw();
        let mut dest = create_image(width, total, WHITE);
        let dst: &mut [u8] = &mut dest;

        let mut dest_row = 0usize;
        for r in &ranges {
            let rows = r.target_height as usize;
            let from = r.start as usize * row_bytes;
            let to = dest_row * row_bytes;
            dst[to..to + rows * row_bytes].copy_from_slice(&src[from..from + rows * row_bytes]);
            dest_row += rows;
        }
        dest
    }
}

fn total_target(ranges: &[LineRange]) -> u32 {
    ranges.iter().map(|r| r.target_height).sum()
}

/// Move blank bands one row at a time toward the target, tallest first.
///
/// Each band is visited once, so the remainder may stay non-zero.
fn nudge_to_target(ranges: &mut [LineRange], mut remain: i64) {
    if remain == 0 {
        return;
    }

    let mut order: Vec<usize> = (0..ranges.len()).collect();
    order.sort_by(|&a, &b| ranges[b].target_height.cmp(&ranges[a].target_height));

    for idx in order {
        if remain == 0 {
            break;
        }
        let r = &mut ranges[idx];
        if !r.is_empty {
            continue;
        }
        if remain > 0 && r.target_height < r.height {
            r.target_height += 1;
            remain -= 1;
        } else if remain < 0 && r.target_height > 0 {
            r.target_height -= 1;
            remain += 1;
        }
    }
}

impl Filter for ChangeLineSpaceFilter {
    fn kind(&self) -> FilterKind {
        FilterKind::ChangeLineSpace
    }

    fn run(&self, source: &FilterSource<'_>) -> FilterOutcome {
        let image = self.compact(source.image);
        let report = FilterReport::ChangeLineSpace {
            filename: source.filename.to_string(),
            from_height: source.image.height(),
            to_height: image.height(),
        };
        FilterOutcome::new(Some(image), report)
    }
}
