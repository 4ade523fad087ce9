//! Fixed-size pool of worker threads draining the work queue.

use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::{PipelineError, PipelineResult};

use super::channel::{work_queue, WorkReceiver, WorkSender};
use super::work::{WorkItem, WorkMessage};

/// Hooks for following a run from outside the pipeline, e.g. a progress bar.
///
/// Called from the collector and worker threads; implementations must be
/// cheap and thread-safe.
pub trait PipelineObserver: Send + Sync {
    /// An item was put on the queue.
    fn item_queued(&self, _item: &WorkItem) {}

    /// A worker finished an item, successfully or not.
    fn item_finished(&self, _filename: &str, _result: Result<&Path, &PipelineError>) {}
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// What one worker did before it exited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Whether the worker stopped on a `Quit` rather than a closed queue
    pub quit_seen: bool,
}

impl WorkerSummary {
    fn merge(self, other: WorkerSummary) -> WorkerSummary {
        WorkerSummary {
            succeeded: self.succeeded + other.succeeded,
            failed: self.failed + other.failed,
            quit_seen: self.quit_seen && other.quit_seen,
        }
    }
}

/// `workers` OS threads sharing one bounded queue. Lives for one run.
pub struct WorkerPool {
    sender: WorkSender,
    handles: Vec<JoinHandle<WorkerSummary>>,
}

impl WorkerPool {
    /// Spawn `workers` threads (at least one) behind a queue of `capacity`.
    pub fn new(
        workers: usize,
        capacity: usize,
        observer: Arc<dyn PipelineObserver>,
    ) -> PipelineResult<Self> {
        let (sender, receiver) = work_queue(capacity);
        let workers = workers.max(1);
        let mut handles = Vec::with_capacity(workers);

        for id in 0..workers {
            let receiver = receiver.clone();
            let observer = Arc::clone(&observer);
            let handle = thread::Builder::new()
                .name(format!("pagesmith-worker-{id}"))
                .spawn(move || worker_loop(receiver, observer.as_ref()))
                .map_err(|e| PipelineError::Worker(format!("failed to spawn worker {id}: {e}")))?;
            handles.push(handle);
        }

        tracing::debug!("Started {} workers, queue capacity {}", workers, capacity);
        Ok(Self { sender, handles })
    }

    /// Handle for queueing work. Blocks while the queue is full.
    pub fn sender(&self) -> WorkSender {
        self.sender.clone()
    }

    pub fn workers(&self) -> usize {
        self.handles.len()
    }

    /// Send one `Quit` per worker, then wait for all of them.
    ///
    /// Items queued before the call are processed first since the queue is
    /// FIFO.
    pub fn shutdown(self) -> PipelineResult<WorkerSummary> {
        for _ in 0..self.handles.len() {
            // A send only fails once every worker is gone; the join below
            // reports why.
            if self.sender.send(WorkMessage::Quit).is_err() {
                break;
            }
        }

        let mut total = WorkerSummary {
            quit_seen: true,
            ..WorkerSummary::default()
        };
        let mut panicked = 0;
        for handle in self.handles {
            match handle.join() {
                Ok(summary) => total = total.merge(summary),
                Err(_) => panicked += 1,
            }
        }

        if panicked > 0 {
            return Err(PipelineError::Worker(format!("{panicked} worker thread(s) panicked")));
        }
        Ok(total)
    }
}

fn worker_loop(receiver: WorkReceiver, observer: &dyn PipelineObserver) -> WorkerSummary {
    let mut summary = WorkerSummary::default();

    while let Ok(message) = receiver.recv() {
        let item = match message {
            WorkMessage::Process(item) => item,
            WorkMessage::Quit => {
                summary.quit_seen = true;
                break;
            }
        };

        match item.run() {
            Ok(written) => {
                summary.succeeded += 1;
                observer.item_finished(&item.filename, Ok(&written));
            }
            Err(e) => {
                summary.failed += 1;
                tracing::error!("Error : {} : {}", item.filename, e);
                observer.item_finished(&item.filename, Err(&e));
            }
        }
    }

    summary
}
