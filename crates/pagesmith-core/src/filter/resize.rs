//! Fixed-factor scaling filter.

use serde::{Deserialize, Serialize};

use super::{Filter, FilterKind, FilterOutcome, FilterReport, FilterSource};
use crate::raster::resize_image;

/// Options for the `resize` filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResizeOption {
    pub width_scale: f32,
    pub height_scale: f32,
    /// Also scale the first page of a sequence
    pub scale_cover: bool,
}

impl Default for ResizeOption {
    fn default() -> Self {
        Self {
            width_scale: 1.0,
            height_scale: 1.0,
            scale_cover: true,
        }
    }
}

pub struct ResizeFilter {
    option: ResizeOption,
}

impl ResizeFilter {
    pub fn new(option: ResizeOption) -> Self {
        Self { option }
    }

    fn scaled_size(&self, width: u32, height: u32) -> (u32, u32) {
        let w = (width as f32 * self.option.width_scale) as u32;
        let h = (height as f32 * self.option.height_scale) as u32;
        (w.max(1), h.max(1))
    }
}

impl Filter for ResizeFilter {
    fn kind(&self) -> FilterKind {
        FilterKind::Resize
    }

    fn run(&self, source: &FilterSource<'_>) -> FilterOutcome {
        let filename = source.filename.to_string();

        if !self.option.scale_cover && source.is_first() {
            return FilterOutcome::new(
                Some(source.image.clone()),
                FilterReport::Resize {
                    filename,
                    scaled: false,
                },
            );
        }

        let (width, height) = self.scaled_size(source.image.width(), source.image.height());
        let image = resize_image(source.image, width, height, false);
        FilterOutcome::new(
            Some(image),
            FilterReport::Resize {
                filename,
                scaled: true,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{create_image, WHITE};

    fn option(width_scale: f32, height_scale: f32, scale_cover: bool) -> ResizeOption {
        ResizeOption {
            width_scale,
            height_scale,
            scale_cover,
        }
    }

    #[test]
    fn test_scales_by_factors() {
        let img = create_image(200, 300, WHITE);
        let outcome = ResizeFilter::new(option(0.5, 2.0, true))
            .run(&FilterSource::new(&img, "p.png", Some(3)));
        assert_eq!(outcome.image().unwrap().dimensions(), (100, 600));
    }

    #[test]
    fn test_cover_skipped_when_disabled() {
        let img = create_image(200, 300, WHITE);
        let filter = ResizeFilter::new(option(0.5, 0.5, false));

        let cover = filter.run(&FilterSource::new(&img, "cover.png", Some(0)));
        assert_eq!(cover.image().unwrap().dimensions(), (200, 300));
        assert_eq!(
            cover.report(),
            &FilterReport::Resize {
                filename: "cover.png".into(),
                scaled: false
            }
        );

        let page = filter.run(&FilterSource::new(&img, "p1.png", Some(1)));
        assert_eq!(page.image().unwrap().dimensions(), (100, 150));

        // unknown position is never treated as the cover
        let watched = filter.run(&FilterSource::new(&img, "w.png", None));
        assert_eq!(watched.image().unwrap().dimensions(), (100, 150));
    }

    #[test]
    fn test_unit_scale_keeps_size() {
        let img = create_image(64, 48, WHITE);
        let outcome = ResizeFilter::new(ResizeOption::default())
            .run(&FilterSource::new(&img, "p.png", Some(0)));
        assert_eq!(outcome.image().unwrap(), &img);
    }
}
