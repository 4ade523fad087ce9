//! Run orchestration: collector thread, worker pool, then packaging.
//!
//! A run moves through four phases. The pool starts idle, the collector
//! fills the queue while workers drain it, the orchestrator waits for the
//! collector and sends one `Quit` per worker, and once every worker has been
//! joined the output is packaged and scratch directories are removed.

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult, Result};
use crate::package::{self, create_image_pdf, create_image_zip, BookMetadata, OutputFormat, PdfOption};

use super::collector::{collect, ItemTemplate, Source, WatchSource};
use super::discovery::{base_name, file_name};
use super::pool::{PipelineObserver, WorkerPool};
use super::work::TargetSize;

/// Outcome counts of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunStats {
    pub queued: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub duration: Duration,
}

impl RunStats {
    /// Processed pages per second.
    pub fn rate(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            (self.succeeded + self.failed) as f64 / secs
        } else {
            0.0
        }
    }
}

/// Collect `source` into a pool of `workers` threads and wait for all of it
/// to be processed.
///
/// A collector failure is returned only after the workers have drained what
/// was already queued and exited.
pub fn run_pipeline(
    source: Source,
    template: ItemTemplate,
    workers: usize,
    capacity: usize,
    observer: Arc<dyn PipelineObserver>,
) -> PipelineResult<RunStats> {
    let started = Instant::now();
    let pool = WorkerPool::new(workers, capacity, Arc::clone(&observer))?;

    let sender = pool.sender();
    let spawned = thread::Builder::new()
        .name("pagesmith-collector".to_string())
        .spawn(move || collect(&source, &template, &sender, observer.as_ref()));

    let collected = match spawned {
        Ok(handle) => handle
            .join()
            .unwrap_or_else(|_| Err(PipelineError::Worker("collector thread panicked".into()))),
        Err(e) => Err(PipelineError::Worker(format!("failed to spawn collector: {e}"))),
    };

    let summary = pool.shutdown()?;
    let queued = collected?;

    Ok(RunStats {
        queued,
        succeeded: summary.succeeded,
        failed: summary.failed,
        duration: started.elapsed(),
    })
}

/// Result of a `conv` run.
#[derive(Debug, Clone)]
pub struct ConvertReport {
    pub stats: RunStats,
    pub format: OutputFormat,
    /// Package file, or the destination directory for plain output
    pub output: PathBuf,
}

/// Run the full conversion: filters, final resize, JPEG, then packaging by
/// the extension of the destination file name.
pub fn run_conversion(config: &Config, observer: Arc<dyn PipelineObserver>) -> Result<ConvertReport> {
    let source_path = config.source_path();
    if !source_path.exists() {
        return Err(PipelineError::SourceNotFound(source_path).into());
    }

    let dest_root = config.dest_dir();
    let dest_filename = config.format_dest_filename(&source_path);
    let format = OutputFormat::from_filename(&dest_filename);
    std::fs::create_dir_all(&dest_root)?;

    // Dropped at the end of the run, which deletes them
    let scratch = if format.is_packaged() {
        Some(scratch_dir(&dest_root)?)
    } else {
        None
    };
    let mut extraction: Option<TempDir> = None;

    let work_dir = scratch
        .as_ref()
        .map(|d| d.path().to_path_buf())
        .unwrap_or_else(|| dest_root.clone());

    let source = if source_path.is_dir() {
        Source::Directory {
            dir: source_path.clone(),
            recursive: config.source.recursive,
        }
    } else if package::is_archive(&source_path) {
        let dir = extraction.insert(scratch_dir(&dest_root)?);
        Source::Archive {
            path: source_path.clone(),
            extract_dir: dir.path().to_path_buf(),
        }
    } else {
        return Err(PipelineError::UnsupportedFormat {
            path: source_path,
            format: "expected a directory or a zip/cbz archive".into(),
        }
        .into());
    };

    let output = &config.output;
    let template = ItemTemplate {
        dest_dir: work_dir.clone(),
        target: Some(TargetSize {
            width: output.width,
            height: output.height,
            keep_aspect_ratio: output.keep_aspect_ratio,
        }),
        quality: output.quality,
        filters: config.filter_chain(),
        indexed: true,
    };

    let stats = run_pipeline(
        source,
        template,
        config.worker_count(),
        config.processing.queue_capacity,
        observer,
    )?;

    let metadata = BookMetadata::from_filename(&source_base_name(&source_path));
    let output_path = package_output(config, format, &work_dir, &dest_root, &dest_filename, metadata)?;
    Ok(ConvertReport {
        stats,
        format,
        output: output_path,
    })
}

fn package_output(
    config: &Config,
    format: OutputFormat,
    work_dir: &Path,
    dest_root: &Path,
    dest_filename: &str,
    metadata: BookMetadata,
) -> Result<PathBuf> {
    let path = dest_root.join(dest_filename);
    match format {
        OutputFormat::Directory => return Ok(dest_root.to_path_buf()),
        OutputFormat::Zip => {
            create_image_zip(work_dir, &path)?;
        }
        OutputFormat::Pdf => {
            let option = PdfOption {
                quality: config.output.quality,
                show_edge_point: config.output.show_edge_point,
                metadata,
            };
            create_image_pdf(work_dir, &path, &option)?;
        }
    }
    tracing::info!("[WRITE] {}", path.display());
    Ok(path)
}

/// Book metadata comes from the source name, so a fixed output name keeps
/// the author and title. Archives lose their extension.
fn source_base_name(source: &Path) -> String {
    let name = file_name(source);
    if source.is_dir() {
        name
    } else {
        base_name(&name).to_string()
    }
}

fn scratch_dir(parent: &Path) -> std::io::Result<TempDir> {
    tempfile::Builder::new().prefix("_temp_").tempdir_in(parent)
}

/// Run the filter chain only: no final resize and no packaging, pages
/// written straight into the destination directory.
///
/// With watching enabled the source is polled until `stop` is set.
pub fn run_image_processing(
    config: &Config,
    stop: Arc<AtomicBool>,
    observer: Arc<dyn PipelineObserver>,
) -> Result<RunStats> {
    let dir = config.source_path();
    if !dir.is_dir() {
        return Err(PipelineError::SourceNotFound(dir).into());
    }

    let source = if config.watch.enabled {
        tracing::info!("Watching {} for new images", dir.display());
        Source::Watch(WatchSource {
            dir,
            recursive: config.source.recursive,
            delay: Duration::from_secs(config.watch.delay_secs),
            poll_interval: Duration::from_secs(config.watch.poll_interval_secs),
            stop,
        })
    } else {
        Source::Directory {
            dir,
            recursive: config.source.recursive,
        }
    };

    let template = ItemTemplate {
        dest_dir: config.dest_dir(),
        target: None,
        quality: config.output.quality,
        filters: config.filter_chain(),
        indexed: false,
    };

    let stats = run_pipeline(
        source,
        template,
        config.worker_count(),
        config.processing.queue_capacity,
        observer,
    )?;
    Ok(stats)
}
