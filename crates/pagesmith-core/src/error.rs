//! Error types for the Pagesmith page-processing pipeline.
//!
//! Errors are organized by stage so that a failed run names the offending
//! file and what went wrong with it.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Pagesmith operations.
#[derive(Error, Debug)]
pub enum PagesmithError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Archive or PDF packaging errors
    #[error("Packaging error: {0}")]
    Package(#[from] PackageError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// JPEG encoding or writing the output file failed
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// The first filter of the chain produced no image
    #[error("Filter '{filter}' produced no image for {path}")]
    FilterAborted { path: PathBuf, filter: String },

    /// Source file or directory does not exist
    #[error("Source not found: {0}")]
    SourceNotFound(PathBuf),

    /// Listing a source directory failed
    #[error("Failed to list {path}: {message}")]
    Listing { path: PathBuf, message: String },

    /// Extracting a source archive failed
    #[error("Failed to extract {path}: {message}")]
    Extract { path: PathBuf, message: String },

    /// A pipeline thread could not be started or panicked
    #[error("Worker failure: {0}")]
    Worker(String),
}

/// Output packaging errors.
#[derive(Error, Debug)]
pub enum PackageError {
    /// Writing or reading a zip archive failed
    #[error("Zip error for {path}: {message}")]
    Zip { path: PathBuf, message: String },

    /// Assembling the PDF document failed
    #[error("PDF error for {path}: {message}")]
    Pdf { path: PathBuf, message: String },

    /// A page image could not be loaded for packaging
    #[error("Image error for {path}: {message}")]
    Image { path: PathBuf, message: String },

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Pagesmith results.
pub type Result<T> = std::result::Result<T, PagesmithError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Convenience type alias for packaging results.
pub type PackageResult<T> = std::result::Result<T, PackageError>;
