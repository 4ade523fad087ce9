//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where source pages come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory of images, or a .zip/.cbz archive for `conv`
    pub path: PathBuf,

    /// Descend into subdirectories when listing
    pub recursive: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./"),
            recursive: false,
        }
    }
}

/// Where results are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DestConfig {
    /// Output directory
    pub dir: PathBuf,

    /// Output name pattern. `${filename}` and `${baseFilename}` are replaced by
    /// the source name with and without its extension. A `.zip`, `.cbz` or
    /// `.pdf` extension selects the package format.
    pub filename: String,
}

impl Default for DestConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./output"),
            filename: "${filename}".to_string(),
        }
    }
}

/// Final page size and encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Target width in pixels (0 = unconstrained)
    pub width: u32,

    /// Target height in pixels (0 = unconstrained)
    pub height: u32,

    /// Fit inside the target box instead of stretching to it
    pub keep_aspect_ratio: bool,

    /// JPEG quality, 1-100
    pub quality: u8,

    /// Mark page corners black in PDF output
    pub show_edge_point: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            keep_aspect_ratio: true,
            quality: 80,
            show_edge_point: false,
        }
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of worker threads (0 = available parallelism)
    pub max_workers: usize,

    /// Max work items buffered between the collector and the workers
    pub queue_capacity: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_workers: 0,
            queue_capacity: 100,
        }
    }
}

/// Directory watching for the `ip` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Keep polling the source directory for new files
    pub enabled: bool,

    /// Only pick up files at least this old, so writers can finish
    pub delay_secs: u64,

    /// Seconds between directory scans
    pub poll_interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            delay_secs: 5,
            poll_interval_secs: 5,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// One entry of the filter chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Filter name, e.g. `deskew` or `changeLineSpace`
    pub name: String,

    /// Filter-specific options with camelCase keys
    #[serde(default)]
    pub options: toml::Table,
}
