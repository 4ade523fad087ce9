//! Skew detection and correction.
//!
//! Text lines on a straight page leave many fully blank rows between them.
//! When the page is tilted, every row clips some ink. Detection sweeps
//! candidate angles and, for each, walks every row along a slope of
//! `sin(angle)` counting rows that still hit dark pixels. The angle with the
//! fewest non-empty rows wins.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use super::{Filter, FilterKind, FilterOutcome, FilterReport, FilterSource};
use crate::geometry::sin_cos_deg;
use crate::raster::rotate_image;

/// Options for the `deskew` filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeskewOption {
    /// Largest angle tried in either direction, in degrees
    pub max_rotation: f32,
    /// Angle increment between candidates; zero or negative disables detection
    pub incr_step: f32,
    /// Brightness (0-255) at or below which a pixel counts as ink
    pub threshold: u8,
    /// Ink pixels a row may hold and still count as empty; 0 uses the rate
    pub empty_line_max_dot_count: usize,
    /// Same cutoff as a fraction of the image width
    pub empty_line_max_dot_rate: f32,
    /// A direction stops once its count exceeds the best by this fraction of the width
    pub detect_tolerance_rate: f32,
    /// Log the count for every candidate angle
    pub debug_mode: bool,
}

impl Default for DeskewOption {
    fn default() -> Self {
        Self {
            max_rotation: 2.0,
            incr_step: 0.2,
            threshold: 220,
            empty_line_max_dot_count: 0,
            empty_line_max_dot_rate: 0.01,
            detect_tolerance_rate: 0.005,
            debug_mode: false,
        }
    }
}

/// Detects page rotation and rotates the page back.
pub struct DeskewFilter {
    option: DeskewOption,
}

impl DeskewFilter {
    pub fn new(option: DeskewOption) -> Self {
        Self { option }
    }

    /// Find the skew angle of `image` in degrees.
    ///
    /// Positive and negative candidates are probed independently at each
    /// step. A direction is abandoned once its count reaches the best count
    /// plus the tolerance; the other keeps going. Returns 0 when no candidate
    /// beats the unrotated baseline.
    pub fn detect_angle(&self, image: &RgbaImage) -> f32 {
        let step = self.option.incr_step;
        if step <= 0.0 {
            return 0.0;
        }

        let tolerance = (image.width() as f32 * self.option.detect_tolerance_rate) as usize;
        let mut best = Probe {
            angle: 0.0,
            count: self.count_non_empty_lines(image, 0.0),
        };
        let mut positive = true;
        let mut negative = true;

        for i in 1.. {
            let angle = step * i as f32;
            if angle > self.option.max_rotation || !(positive || negative) {
                break;
            }
            if positive {
                positive = self.probe(image, angle, tolerance, &mut best);
            }
            if negative {
                negative = self.probe(image, -angle, tolerance, &mut best);
            }
        }

        best.angle
    }

    /// Try one candidate; returns whether its direction should keep searching.
    fn probe(&self, image: &RgbaImage, angle: f32, tolerance: usize, best: &mut Probe) -> bool {
        let count = self.count_non_empty_lines(image, angle);
        if count < best.count {
            *best = Probe { angle, count };
            true
        } else {
            count < best.count + tolerance
        }
    }

    /// Count rows that hit more ink than the empty-line cutoff when sampled
    /// along a slope of `sin(angle)`.
    fn count_non_empty_lines(&self, image: &RgbaImage, angle: f32) -> usize {
        let (dy, _) = sin_cos_deg(angle);
        let (width, height) = (image.width() as usize, image.height() as usize);
        let raw = image.as_raw();

        // 16-bit channel sum, matching `u8 * 257` expansion
        let threshold_sum = u32::from(self.option.threshold) * 256 * 3;
        let cutoff = match self.option.empty_line_max_dot_count {
            0 => (self.option.empty_line_max_dot_rate * width as f32) as usize,
            count => count,
        };

        let mut non_empty = 0;
        for y in 0..height {
            let mut y_pos = y as f32;
            let mut dots = 0;

            for x in 0..width {
                // truncation toward zero keeps row 0 for small negative offsets
                let row = y_pos as i64;
                if row < 0 || row >= height as i64 {
                    break;
                }
                let i = (row as usize * width + x) * 4;
                let sum = (u32::from(raw[i]) + u32::from(raw[i + 1]) + u32::from(raw[i + 2])) * 257;
                if sum <= threshold_sum {
                    dots += 1;
                }
                y_pos += dy;
            }

            if dots > cutoff {
                non_empty += 1;
            }
        }

        if self.option.debug_mode {
            tracing::debug!("angle={}, nonEmptyLineCount={}", angle, non_empty);
        }
        non_empty
    }
}

struct Probe {
    angle: f32,
    count: usize,
}

impl Filter for DeskewFilter {
    fn kind(&self) -> FilterKind {
        FilterKind::Deskew
    }

    fn run(&self, source: &FilterSource<'_>) -> FilterOutcome {
        let angle = self.detect_angle(source.image);
        let image = if angle == 0.0 {
            source.image.clone()
        } else {
            rotate_image(source.image, angle)
        };

        FilterOutcome::new(
            Some(image),
            FilterReport::Deskew {
                filename: source.filename.to_string(),
                angle,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::in_range_f32;
    use crate::raster::{create_image, fill_rect, BLACK, WHITE};

    fn detected_angle(image: &RgbaImage, option: DeskewOption) -> f32 {
        let outcome = DeskewFilter::new(option).run(&FilterSource::new(image, "page.png", Some(0)));
        match outcome.report() {
            FilterReport::Deskew { angle, .. } => *angle,
            other => panic!("unexpected report {other:?}"),
        }
    }

    #[test]
    fn test_detects_counter_clockwise_correction() {
        let mut img = create_image(400, 700, WHITE);
        fill_rect(&mut img, 50, 50, 350, 650, BLACK);
        let tilted = rotate_image(&img, -1.4);

        let option = DeskewOption {
            max_rotation: 2.0,
            incr_step: 0.2,
            threshold: 220,
            empty_line_max_dot_count: 0,
            empty_line_max_dot_rate: 0.01,
            detect_tolerance_rate: 0.005,
            debug_mode: false,
        };
        let angle = detected_angle(&tilted, option);
        assert!(in_range_f32(angle, 1.2, 1.6), "angle was {angle}");
    }

    #[test]
    fn test_detects_clockwise_correction() {
        let mut img = create_image(400, 700, WHITE);
        fill_rect(&mut img, 50, 50, 550, 650, BLACK);
        let tilted = rotate_image(&img, 1.4);

        let option = DeskewOption {
            max_rotation: 2.0,
            incr_step: 0.2,
            threshold: 220,
            empty_line_max_dot_count: 0,
            empty_line_max_dot_rate: 0.0,
            detect_tolerance_rate: 0.0,
            debug_mode: false,
        };
        let angle = detected_angle(&tilted, option);
        assert!(in_range_f32(angle, -1.6, -1.2), "angle was {angle}");
    }

    #[test]
    fn test_straight_page_is_untouched() {
        let mut img = create_image(200, 300, WHITE);
        for top in (20..280).step_by(20) {
            fill_rect(&mut img, 20, top, 180, top + 6, BLACK);
        }

        let outcome = DeskewFilter::new(DeskewOption::default())
            .run(&FilterSource::new(&img, "page.png", None));
        assert_eq!(outcome.report(), &FilterReport::Deskew { filename: "page.png".into(), angle: 0.0 });
        assert_eq!(outcome.image().unwrap(), &img);
    }

    #[test]
    fn test_zero_step_disables_detection() {
        let mut img = create_image(100, 100, WHITE);
        fill_rect(&mut img, 10, 10, 90, 90, BLACK);
        let tilted = rotate_image(&img, 1.0);

        let option = DeskewOption {
            incr_step: 0.0,
            ..DeskewOption::default()
        };
        assert_eq!(DeskewFilter::new(option).detect_angle(&tilted), 0.0);
    }

    #[test]
    fn test_option_keys_are_camel_case() {
        let table: toml::Table =
            toml::from_str("maxRotation = 3.0\nemptyLineMaxDotCount = 4\ndebugMode = true").unwrap();
        let option: DeskewOption = toml::Value::Table(table).try_into().unwrap();
        assert_eq!(option.max_rotation, 3.0);
        assert_eq!(option.empty_line_max_dot_count, 4);
        assert!(option.debug_mode);
        assert_eq!(option.threshold, 220);
    }
}
