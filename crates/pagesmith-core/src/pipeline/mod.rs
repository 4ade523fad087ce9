//! Page processing pipeline.
//!
//! - **discovery**: List source images, once or by modification window
//! - **channel**: Bounded work queue for backpressure
//! - **work**: One page from load to written JPEG
//! - **pool**: Fixed set of worker threads draining the queue
//! - **collector**: Turns a source into queued work items
//! - **runner**: Orchestrates a whole `conv` or `ip` run

pub mod channel;
pub mod collector;
pub mod discovery;
pub mod pool;
pub mod runner;
pub mod work;

pub use channel::{work_queue, WorkReceiver, WorkSender};
pub use collector::{collect, ItemTemplate, Source, WatchSource};
pub use discovery::{list_images, list_modified_images};
pub use pool::{NoopObserver, PipelineObserver, WorkerPool, WorkerSummary};
pub use runner::{run_conversion, run_image_processing, run_pipeline, ConvertReport, RunStats};
pub use work::{TargetSize, WorkItem, WorkMessage};
