//! Page filters and the chain executor.
//!
//! A filter takes one page image and produces a new one, or nothing to stop
//! the chain. Filters are built once from configuration and shared read-only
//! between worker threads.
//!
//! Available filters:
//! - **deskew**: detect and undo page rotation
//! - **changeLineSpace**: compact blank bands between text lines
//! - **crop**: cut fixed margins, widened to satisfy ratio limits
//! - **resize**: scale by fixed factors
//! - **watermark**: stamp a short text label

pub mod crop;
pub mod deskew;
pub mod line_space;
pub mod resize;
pub mod watermark;

pub use crop::{crop_image, solve_crop_rect, CropConstraints, CropFilter, CropOption, CropRect};
pub use deskew::{DeskewFilter, DeskewOption};
pub use line_space::{ChangeLineSpaceFilter, ChangeLineSpaceOption, LineRange};
pub use resize::{ResizeFilter, ResizeOption};
pub use watermark::{WatermarkFilter, WatermarkLocation, WatermarkOption};

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;
use serde::de::DeserializeOwned;

use crate::error::{PipelineError, PipelineResult};

/// Ordered, immutable filter chain shared across workers.
pub type FilterChain = Arc<[Box<dyn Filter>]>;

/// Input handed to a filter.
#[derive(Debug, Clone, Copy)]
pub struct FilterSource<'a> {
    pub image: &'a RgbaImage,
    pub filename: &'a str,
    /// Position in the source sequence; `None` when unknown (watch mode).
    pub index: Option<usize>,
}

impl<'a> FilterSource<'a> {
    pub fn new(image: &'a RgbaImage, filename: &'a str, index: Option<usize>) -> Self {
        Self {
            image,
            filename,
            index,
        }
    }

    /// True for the first page of a sequence, usually the cover.
    pub fn is_first(&self) -> bool {
        self.index == Some(0)
    }
}

/// Filter identity, used for logging and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Deskew,
    ChangeLineSpace,
    Crop,
    Resize,
    Watermark,
}

impl FilterKind {
    /// Configuration name of the filter.
    pub fn name(self) -> &'static str {
        match self {
            FilterKind::Deskew => "deskew",
            FilterKind::ChangeLineSpace => "changeLineSpace",
            FilterKind::Crop => "crop",
            FilterKind::Resize => "resize",
            FilterKind::Watermark => "watermark",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A page transform.
pub trait Filter: Send + Sync {
    fn kind(&self) -> FilterKind;

    fn run(&self, source: &FilterSource<'_>) -> FilterOutcome;
}

/// What a filter did, beyond the image it produced.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterReport {
    Deskew {
        filename: String,
        angle: f32,
    },
    ChangeLineSpace {
        filename: String,
        from_height: u32,
        to_height: u32,
    },
    Crop {
        filename: String,
        rect: Option<CropRect>,
    },
    Resize {
        filename: String,
        scaled: bool,
    },
    Watermark,
}

/// Result of running one filter.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    image: Option<RgbaImage>,
    report: FilterReport,
}

impl FilterOutcome {
    pub fn new(image: Option<RgbaImage>, report: FilterReport) -> Self {
        Self { image, report }
    }

    /// The produced image; `None` aborts the chain.
    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    pub fn into_image(self) -> Option<RgbaImage> {
        self.image
    }

    pub fn report(&self) -> &FilterReport {
        &self.report
    }

    pub fn kind(&self) -> FilterKind {
        match self.report {
            FilterReport::Deskew { .. } => FilterKind::Deskew,
            FilterReport::ChangeLineSpace { .. } => FilterKind::ChangeLineSpace,
            FilterReport::Crop { .. } => FilterKind::Crop,
            FilterReport::Resize { .. } => FilterKind::Resize,
            FilterReport::Watermark => FilterKind::Watermark,
        }
    }

    /// Emit the filter-specific log line.
    pub fn log(&self) {
        match &self.report {
            FilterReport::Deskew { filename, angle } => {
                if *angle != 0.0 {
                    tracing::info!("[ROTATE] {} : {:.1}", filename, angle);
                }
            }
            FilterReport::ChangeLineSpace {
                filename,
                from_height,
                to_height,
            } => {
                if from_height != to_height {
                    tracing::debug!("[SPACE] {} : {} -> {}", filename, from_height, to_height);
                }
            }
            FilterReport::Crop { filename, rect } => match rect {
                Some(r) => tracing::debug!(
                    "[CROP] {} : ({}, {}) - ({}, {})",
                    filename,
                    r.left,
                    r.top,
                    r.right,
                    r.bottom
                ),
                None => tracing::warn!("Crop margins leave no page area : {}", filename),
            },
            FilterReport::Resize { filename, scaled } => {
                if !scaled {
                    tracing::info!("Resize skipped : {}", filename);
                }
            }
            FilterReport::Watermark => {}
        }
    }
}

/// Build a filter from its configuration name and option table.
///
/// Unknown names and options that fail to deserialize yield `None` with a
/// warning, so one bad entry never stops a run.
pub fn build_filter(name: &str, options: &toml::Table) -> Option<Box<dyn Filter>> {
    let filter: Box<dyn Filter> = match name {
        "deskew" => Box::new(DeskewFilter::new(parse_options(name, options)?)),
        "changeLineSpace" => Box::new(ChangeLineSpaceFilter::new(parse_options(name, options)?)),
        "crop" => Box::new(CropFilter::new(parse_options(name, options)?)),
        "resize" => Box::new(ResizeFilter::new(parse_options(name, options)?)),
        "watermark" => Box::new(WatermarkFilter::new(parse_options(name, options)?)),
        "autoCrop" | "deskewED" | "autoCropED" => {
            tracing::warn!("Filter '{}' is not supported, skipping", name);
            return None;
        }
        _ => {
            tracing::warn!("Unhandled filter name : {}", name);
            return None;
        }
    };
    tracing::debug!("Filter added : {}", name);
    Some(filter)
}

fn parse_options<T: DeserializeOwned>(name: &str, options: &toml::Table) -> Option<T> {
    match toml::Value::Table(options.clone()).try_into::<T>() {
        Ok(option) => Some(option),
        Err(e) => {
            tracing::warn!("Failed to read filter : {} : {}", name, e);
            None
        }
    }
}

/// Run `chain` over a decoded page.
///
/// Each filter's output feeds the next one. A filter that produces no image
/// stops the chain and the last produced image is returned; when the very
/// first filter produces nothing the page fails with
/// [`PipelineError::FilterAborted`]. An empty chain returns the input.
pub fn run_chain(
    image: RgbaImage,
    path: &Path,
    filename: &str,
    index: Option<usize>,
    chain: &[Box<dyn Filter>],
) -> PipelineResult<RgbaImage> {
    let mut current = image;

    for (position, filter) in chain.iter().enumerate() {
        let outcome = filter.run(&FilterSource::new(&current, filename, index));
        outcome.log();

        match outcome.into_image() {
            Some(produced) => current = produced,
            None if position == 0 => {
                return Err(PipelineError::FilterAborted {
                    path: path.to_path_buf(),
                    filter: filter.kind().to_string(),
                });
            }
            None => {
                tracing::warn!(
                    "Filter result is empty, stopping chain. filter: {}, file: {}",
                    filter.kind(),
                    filename
                );
                break;
            }
        }
    }

    Ok(current)
}

/// Build the shared chain from `(name, options)` pairs, skipping bad entries.
pub fn build_chain<'a, I>(entries: I) -> FilterChain
where
    I: IntoIterator<Item = (&'a str, &'a toml::Table)>,
{
    entries
        .into_iter()
        .filter_map(|(name, options)| build_filter(name, options))
        .collect::<Vec<_>>()
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{create_image, WHITE};

    /// Test double: returns a fixed-size canvas or nothing.
    struct Fixed {
        size: Option<(u32, u32)>,
    }

    impl Filter for Fixed {
        fn kind(&self) -> FilterKind {
            FilterKind::Watermark
        }

        fn run(&self, _source: &FilterSource<'_>) -> FilterOutcome {
            let image = self.size.map(|(w, h)| create_image(w, h, WHITE));
            FilterOutcome::new(image, FilterReport::Watermark)
        }
    }

    #[test]
    fn test_chain_feeds_output_forward() {
        let filters: Vec<Box<dyn Filter>> = vec![
            Box::new(Fixed { size: Some((10, 20)) }),
            Box::new(Fixed { size: Some((30, 40)) }),
        ];
        let out = run_chain(create_image(5, 5, WHITE), Path::new("a.jpg"), "a.jpg", Some(0), &filters)
            .unwrap();
        assert_eq!(out.dimensions(), (30, 40));
    }

    #[test]
    fn test_chain_abort_keeps_last_image() {
        let filters: Vec<Box<dyn Filter>> = vec![
            Box::new(Fixed { size: Some((10, 20)) }),
            Box::new(Fixed { size: None }),
            Box::new(Fixed { size: Some((30, 40)) }),
        ];
        let out = run_chain(create_image(5, 5, WHITE), Path::new("a.jpg"), "a.jpg", None, &filters)
            .unwrap();
        assert_eq!(out.dimensions(), (10, 20));
    }

    #[test]
    fn test_chain_first_filter_abort_is_error() {
        let filters: Vec<Box<dyn Filter>> = vec![Box::new(Fixed { size: None })];
        let err = run_chain(create_image(5, 5, WHITE), Path::new("a.jpg"), "a.jpg", None, &filters)
            .unwrap_err();
        assert!(matches!(err, PipelineError::FilterAborted { .. }));
    }

    #[test]
    fn test_empty_chain_returns_input() {
        let out = run_chain(create_image(7, 9, WHITE), Path::new("a.jpg"), "a.jpg", None, &[]).unwrap();
        assert_eq!(out.dimensions(), (7, 9));
    }

    #[test]
    fn test_build_filter_known_names() {
        let empty = toml::Table::new();
        for name in ["deskew", "changeLineSpace", "crop", "resize", "watermark"] {
            let filter = build_filter(name, &empty).unwrap();
            assert_eq!(filter.kind().name(), name);
        }
    }

    #[test]
    fn test_build_filter_unknown_and_unsupported() {
        let empty = toml::Table::new();
        assert!(build_filter("sharpen", &empty).is_none());
        assert!(build_filter("autoCrop", &empty).is_none());
        assert!(build_filter("deskewED", &empty).is_none());
    }

    #[test]
    fn test_build_filter_malformed_options() {
        let options: toml::Table = toml::from_str(r#"maxRotation = "lots""#).unwrap();
        assert!(build_filter("deskew", &options).is_none());
    }

    #[test]
    fn test_build_filter_integer_for_float_option() {
        let options: toml::Table = toml::from_str("maxRotation = 2\nincrStep = 0.2").unwrap();
        assert!(build_filter("deskew", &options).is_some());
    }

    #[test]
    fn test_build_chain_skips_bad_entries() {
        let empty = toml::Table::new();
        let chain = build_chain([("deskew", &empty), ("nope", &empty), ("resize", &empty)]);
        let kinds: Vec<_> = chain.iter().map(|f| f.kind()).collect();
        assert_eq!(kinds, vec![FilterKind::Deskew, FilterKind::Resize]);
    }
}
