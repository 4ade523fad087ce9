//! Text stamp filter.

use serde::{Deserialize, Serialize};

use super::{Filter, FilterKind, FilterOutcome, FilterReport, FilterSource};
use crate::raster::{draw_label, label_width, BLACK, GLYPH_HEIGHT};

/// Anchor of the label on the page: vertical then horizontal
/// (`T`op/`C`enter/`B`ottom, `L`eft/`C`enter/`R`ight).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatermarkLocation {
    TL,
    TC,
    TR,
    CL,
    CC,
    CR,
    BL,
    #[default]
    BC,
    BR,
}

impl WatermarkLocation {
    /// Top-left corner of a `text_w` x `text_h` label on a `width` x `height` page.
    fn origin(self, width: u32, height: u32, text_w: u32, text_h: u32) -> (i64, i64) {
        let free_x = i64::from(width) - i64::from(text_w);
        let free_y = i64::from(height) - i64::from(text_h);

        let x = match self {
            Self::TL | Self::CL | Self::BL => 0,
            Self::TC | Self::CC | Self::BC => free_x / 2,
            Self::TR | Self::CR | Self::BR => free_x,
        };
        let y = match self {
            Self::TL | Self::TC | Self::TR => 0,
            Self::CL | Self::CC | Self::CR => free_y / 2,
            Self::BL | Self::BC | Self::BR => free_y,
        };
        (x, y)
    }
}

/// Options for the `watermark` filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WatermarkOption {
    pub text: String,
    pub location: WatermarkLocation,
    /// Glyph height in pixels, rounded down to a multiple of 16
    pub font_size: u32,
}

impl Default for WatermarkOption {
    fn default() -> Self {
        Self {
            text: String::new(),
            location: WatermarkLocation::default(),
            font_size: GLYPH_HEIGHT,
        }
    }
}

pub struct WatermarkFilter {
    option: WatermarkOption,
}

impl WatermarkFilter {
    pub fn new(option: WatermarkOption) -> Self {
        Self { option }
    }

    fn scale(&self) -> u32 {
        (self.option.font_size / GLYPH_HEIGHT).max(1)
    }
}

impl Filter for WatermarkFilter {
    fn kind(&self) -> FilterKind {
        FilterKind::Watermark
    }

    fn run(&self, source: &FilterSource<'_>) -> FilterOutcome {
        let mut image = source.image.clone();
        let text = &self.option.text;

        if !text.is_empty() {
            let scale = self.scale();
            let (x, y) = self.option.location.origin(
                image.width(),
                image.height(),
                label_width(text, scale),
                GLYPH_HEIGHT * scale,
            );
            draw_label(&mut image, x, y, text, scale, BLACK);
        }

        FilterOutcome::new(Some(image), FilterReport::Watermark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{create_image, WHITE};
    use image::RgbaImage;

    fn dark_bounds(img: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (x, y, p) in img.enumerate_pixels() {
            if p[0] < 128 {
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((l, t, r, b)) => (l.min(x), t.min(y), r.max(x), b.max(y)),
                });
            }
        }
        bounds
    }

    fn stamp(text: &str, location: WatermarkLocation, font_size: u32) -> RgbaImage {
        let img = create_image(200, 100, WHITE);
        let filter = WatermarkFilter::new(WatermarkOption {
            text: text.to_string(),
            location,
            font_size,
        });
        filter
            .run(&FilterSource::new(&img, "p.png", None))
            .into_image()
            .unwrap()
    }

    #[test]
    fn test_empty_text_is_noop() {
        let out = stamp("", WatermarkLocation::CC, 16);
        assert_eq!(out, create_image(200, 100, WHITE));
    }

    #[test]
    fn test_locations_anchor_label() {
        let (l, t, _, _) = dark_bounds(&stamp("HI", WatermarkLocation::TL, 16)).unwrap();
        assert!(l < 8 && t < 16);

        let (_, _, r, b) = dark_bounds(&stamp("HI", WatermarkLocation::BR, 16)).unwrap();
        assert!(r >= 200 - 8 && b >= 100 - 16);

        let (l, t, r, b) = dark_bounds(&stamp("HI", WatermarkLocation::CC, 16)).unwrap();
        assert!(l >= 92 && r < 108, "x {l}..{r}");
        assert!(t >= 42 && b < 58, "y {t}..{b}");
    }

    #[test]
    fn test_font_size_scales_glyphs() {
        let (l1, t1, r1, b1) = dark_bounds(&stamp("H", WatermarkLocation::TL, 16)).unwrap();
        let (l2, t2, r2, b2) = dark_bounds(&stamp("H", WatermarkLocation::TL, 32)).unwrap();
        assert!(r2 - l2 > r1 - l1);
        assert!(b2 - t2 > b1 - t1);

        // sizes below one glyph height still draw at scale 1
        assert_eq!(stamp("H", WatermarkLocation::TL, 4), stamp("H", WatermarkLocation::TL, 16));
    }

    #[test]
    fn test_location_from_config_string() {
        let table: toml::Table = toml::from_str("text = \"x\"\nlocation = \"BL\"").unwrap();
        let option: WatermarkOption = toml::Value::Table(table).try_into().unwrap();
        assert_eq!(option.location, WatermarkLocation::BL);
        assert_eq!(option.font_size, 16);
    }
}
