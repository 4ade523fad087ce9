//! Per-page work items and the processing a worker applies to each.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::PipelineResult;
use crate::filter::{run_chain, FilterChain};
use crate::raster::{load_image, resize_image, save_jpeg};

use super::discovery::base_name;

/// Final page size applied after the filter chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
    pub keep_aspect_ratio: bool,
}

/// One source page to process.
#[derive(Clone)]
pub struct WorkItem {
    pub source_dir: PathBuf,
    pub filename: String,
    /// Position in the source sequence; `None` in watch mode
    pub index: Option<usize>,
    pub dest_dir: PathBuf,
    /// Resize after filtering; `None` keeps the filtered size
    pub target: Option<TargetSize>,
    pub quality: u8,
    pub filters: FilterChain,
    /// Delete the source file once processed (extracted archive pages)
    pub remove_source: bool,
}

impl fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem")
            .field("source_dir", &self.source_dir)
            .field("filename", &self.filename)
            .field("index", &self.index)
            .field("dest_dir", &self.dest_dir)
            .field("target", &self.target)
            .field("quality", &self.quality)
            .field("filters", &self.filters.len())
            .field("remove_source", &self.remove_source)
            .finish()
    }
}

/// Message on the work queue.
#[derive(Debug)]
pub enum WorkMessage {
    Process(WorkItem),
    /// Tells exactly one worker to exit
    Quit,
}

impl WorkItem {
    pub fn source_path(&self) -> PathBuf {
        self.source_dir.join(&self.filename)
    }

    /// Name of the written page: lowercased base name with a `.jpg` extension.
    pub fn output_filename(&self) -> String {
        output_filename(&self.filename)
    }

    /// Decode, filter, resize and write the page. Returns the written path.
    ///
    /// The source is removed afterwards when `remove_source` is set, whether
    /// or not processing succeeded.
    pub fn run(&self) -> PipelineResult<PathBuf> {
        let path = self.source_path();
        let result = self.process(&path);

        if self.remove_source {
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!("Failed to remove {}: {}", path.display(), e);
            }
        }
        result
    }

    fn process(&self, path: &Path) -> PipelineResult<PathBuf> {
        tracing::info!("[READ] {}", self.filename);

        let image = load_image(path)?;
        let image = run_chain(image, path, &self.filename, self.index, &self.filters)?;
        let image = match self.target {
            Some(t) => resize_image(&image, t.width, t.height, t.keep_aspect_ratio),
            None => image,
        };

        let written = save_jpeg(&image, &self.dest_dir, &self.output_filename(), self.quality)?;
        tracing::debug!("[WRITE] {}", written.display());
        Ok(written)
    }
}

/// Lowercased base name of `filename` with a `.jpg` extension.
pub fn output_filename(filename: &str) -> String {
    format!("{}.jpg", base_name(filename).to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::filter::{build_chain, CropFilter, CropOption, Filter};
    use crate::raster::{create_image, WHITE};
    use std::sync::Arc;

    fn item(source_dir: &Path, filename: &str, dest_dir: &Path, filters: FilterChain) -> WorkItem {
        WorkItem {
            source_dir: source_dir.to_path_buf(),
            filename: filename.to_string(),
            index: Some(0),
            dest_dir: dest_dir.to_path_buf(),
            target: None,
            quality: 90,
            filters,
            remove_source: false,
        }
    }

    fn no_filters() -> FilterChain {
        Arc::from(Vec::<Box<dyn Filter>>::new())
    }

    #[test]
    fn test_output_filename() {
        assert_eq!(output_filename("Page_01.PNG"), "page_01.jpg");
        assert_eq!(output_filename("cover.jpeg"), "cover.jpg");
    }

    #[test]
    fn test_run_filters_resizes_and_writes() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        create_image(100, 200, WHITE).save(src.path().join("P1.png")).unwrap();

        let resize: toml::Table = toml::from_str("widthScale = 0.5\nheightScale = 0.5").unwrap();
        let mut work = item(src.path(), "P1.png", dest.path(), build_chain([("resize", &resize)]));
        work.target = Some(TargetSize {
            width: 40,
            height: 40,
            keep_aspect_ratio: true,
        });

        let written = work.run().unwrap();
        assert_eq!(written, dest.path().join("p1.jpg"));
        let out = image::open(&written).unwrap();
        assert_eq!((out.width(), out.height()), (20, 40));
        assert!(src.path().join("P1.png").exists());
    }

    #[test]
    fn test_run_removes_source_when_asked() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        create_image(10, 10, WHITE).save(src.path().join("x.png")).unwrap();

        let mut work = item(src.path(), "x.png", dest.path(), no_filters());
        work.remove_source = true;
        work.run().unwrap();
        assert!(!src.path().join("x.png").exists());
        assert!(dest.path().join("x.jpg").exists());
    }

    #[test]
    fn test_run_reports_per_file_errors() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("broken.png"), b"not a png").unwrap();
        create_image(10, 10, WHITE).save(src.path().join("small.png")).unwrap();

        let work = item(src.path(), "broken.png", dest.path(), no_filters());
        assert!(matches!(work.run(), Err(PipelineError::Decode { .. })));

        let crop: Vec<Box<dyn Filter>> = vec![Box::new(CropFilter::new(CropOption {
            left: 20,
            ..CropOption::default()
        }))];
        let work = item(src.path(), "small.png", dest.path(), Arc::from(crop));
        assert!(matches!(work.run(), Err(PipelineError::FilterAborted { .. })));
        assert!(!dest.path().join("small.jpg").exists());
    }
}
