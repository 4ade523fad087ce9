//! Pagesmith Core - batch processing of scanned book pages.
//!
//! Pages are read from a directory or a zip/cbz archive, run through an
//! ordered chain of filters on a pool of worker threads, written as JPEG and
//! optionally packaged into a zip/cbz archive or an image PDF.
//!
//! # Architecture
//!
//! ```text
//! Source → Collector → Queue → Workers (Filters → Resize → JPEG) → Package
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pagesmith_core::{run_conversion, Config, NoopObserver};
//!
//! fn main() -> pagesmith_core::Result<()> {
//!     let config = Config::load()?;
//!     let report = run_conversion(&config, Arc::new(NoopObserver))?;
//!     println!("{} pages written to {}", report.stats.succeeded, report.output.display());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod package;
pub mod pipeline;
pub mod raster;

pub use config::Config;
pub use error::{ConfigError, PackageError, PagesmithError, PipelineError, PipelineResult, Result};
pub use filter::{Filter, FilterChain, FilterKind};
pub use package::OutputFormat;
pub use pipeline::{
    run_conversion, run_image_processing, ConvertReport, NoopObserver, PipelineObserver, RunStats,
    WorkItem,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
