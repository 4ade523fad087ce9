//! Source collection: turns a directory, an archive or a watched directory
//! into work items on the queue.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, UNIX_EPOCH};

use crate::error::{PipelineError, PipelineResult};
use crate::filter::FilterChain;
use crate::package;

use super::channel::WorkSender;
use super::discovery::{file_name, list_images, list_modified_images};
use super::pool::PipelineObserver;
use super::work::{TargetSize, WorkItem, WorkMessage};

/// Where pages come from.
#[derive(Debug, Clone)]
pub enum Source {
    /// Every image in a directory, listed once
    Directory { dir: PathBuf, recursive: bool },
    /// A zip/cbz archive, extracted into `extract_dir`
    Archive { path: PathBuf, extract_dir: PathBuf },
    /// A directory polled for new files until `stop` is set
    Watch(WatchSource),
}

#[derive(Debug, Clone)]
pub struct WatchSource {
    pub dir: PathBuf,
    pub recursive: bool,
    /// Minimum file age before pickup
    pub delay: Duration,
    pub poll_interval: Duration,
    pub stop: Arc<AtomicBool>,
}

/// Settings shared by every item of a run.
#[derive(Clone)]
pub struct ItemTemplate {
    pub dest_dir: PathBuf,
    pub target: Option<TargetSize>,
    pub quality: u8,
    pub filters: FilterChain,
    /// Pass each page's position to the filters
    pub indexed: bool,
}

impl ItemTemplate {
    fn item(&self, source_dir: &Path, filename: &str, index: usize, remove_source: bool) -> WorkItem {
        WorkItem {
            source_dir: source_dir.to_path_buf(),
            filename: filename.to_string(),
            index: self.indexed.then_some(index),
            dest_dir: self.dest_dir.clone(),
            target: self.target,
            quality: self.quality,
            filters: Arc::clone(&self.filters),
            remove_source,
        }
    }
}

struct Queue<'a> {
    sender: &'a WorkSender,
    observer: &'a dyn PipelineObserver,
    queued: usize,
}

impl Queue<'_> {
    fn push(&mut self, item: WorkItem) -> PipelineResult<()> {
        self.observer.item_queued(&item);
        self.sender
            .send(WorkMessage::Process(item))
            .map_err(|_| PipelineError::Worker("work queue closed".into()))?;
        self.queued += 1;
        Ok(())
    }
}

/// Push one work item per source image. Returns how many were queued.
///
/// Listing and extraction failures end the collection with an error. Watch
/// sources only return once their stop flag is set.
pub fn collect(
    source: &Source,
    template: &ItemTemplate,
    sender: &WorkSender,
    observer: &dyn PipelineObserver,
) -> PipelineResult<usize> {
    let mut queue = Queue {
        sender,
        observer,
        queued: 0,
    };

    match source {
        Source::Directory { dir, recursive } => {
            for (index, path) in list_images(dir, *recursive)?.iter().enumerate() {
                let parent = path.parent().unwrap_or(dir.as_path());
                queue.push(template.item(parent, &file_name(path), index, false))?;
            }
        }
        Source::Archive { path, extract_dir } => collect_archive(path, extract_dir, template, &mut queue)?,
        Source::Watch(watch) => collect_watch(watch, template, &mut queue)?,
    }

    Ok(queue.queued)
}

fn collect_archive(
    path: &Path,
    extract_dir: &Path,
    template: &ItemTemplate,
    queue: &mut Queue<'_>,
) -> PipelineResult<()> {
    let mut pushed = Ok(());
    package::unzip(path, extract_dir, |dir, filename, index| {
        if pushed.is_ok() {
            pushed = queue.push(template.item(dir, filename, index, true));
        }
    })
    .map_err(|e| PipelineError::Extract {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    pushed
}

fn collect_watch(watch: &WatchSource, template: &ItemTemplate, queue: &mut Queue<'_>) -> PipelineResult<()> {
    let mut last_check = UNIX_EPOCH;

    while !watch.stop.load(Ordering::Relaxed) {
        let (files, checked) = list_modified_images(&watch.dir, watch.recursive, watch.delay, last_check)?;
        last_check = checked;

        for (index, path) in files.iter().enumerate() {
            let parent = path.parent().unwrap_or(watch.dir.as_path());
            queue.push(template.item(parent, &file_name(path), index, false))?;
        }

        sleep_unless_stopped(watch.poll_interval, &watch.stop);
    }

    tracing::debug!("Watch stopped after {} items", queue.queued);
    Ok(())
}

fn sleep_unless_stopped(duration: Duration, stop: &AtomicBool) {
    let until = Instant::now() + duration;
    let slice = Duration::from_millis(50);
    while !stop.load(Ordering::Relaxed) {
        let now = Instant::now();
        if now >= until {
            break;
        }
        std::thread::sleep(slice.min(until - now));
    }
}
