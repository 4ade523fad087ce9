//! Configuration management for Pagesmith.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. All config structs implement `Default`, so a partial file only
//! needs the sections it changes.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use crate::filter::{build_chain, FilterChain};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Pagesmith.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source pages
    pub source: SourceConfig,

    /// Output location and naming
    pub dest: DestConfig,

    /// Final page size and encoding
    pub output: OutputConfig,

    /// Worker pool settings
    pub processing: ProcessingConfig,

    /// Directory watching
    pub watch: WatchConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Ordered filter chain
    pub filters: Vec<FilterConfig>,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.pagesmith.pagesmith/config.toml
    /// - Linux: ~/.config/pagesmith/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\pagesmith\config\config.toml
    ///
    /// Falls back to ~/.pagesmith/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "pagesmith", "pagesmith")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".pagesmith").join("config.toml")
            })
    }

    /// Source path with `~` expanded.
    pub fn source_path(&self) -> PathBuf {
        expand(&self.source.path)
    }

    /// Destination directory with `~` expanded.
    pub fn dest_dir(&self) -> PathBuf {
        expand(&self.dest.dir)
    }

    /// Worker thread count, resolving 0 to the available parallelism.
    pub fn worker_count(&self) -> usize {
        match self.processing.max_workers {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        }
    }

    /// Output name for `source` according to `dest.filename`.
    pub fn format_dest_filename(&self, source: &Path) -> String {
        format_dest_filename(&self.dest.filename, source)
    }

    /// Build the shared filter chain. Entries that fail to build are skipped.
    pub fn filter_chain(&self) -> FilterChain {
        build_chain(
            self.filters
                .iter()
                .map(|f| (f.name.as_str(), &f.options)),
        )
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    let expanded = shellexpand::tilde(&path_str);
    PathBuf::from(expanded.into_owned())
}

/// Substitute `${filename}` and `${baseFilename}` in `pattern` with the name
/// of `source`, with and without its extension.
pub fn format_dest_filename(pattern: &str, source: &Path) -> String {
    let filename = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let base = match source.extension() {
        Some(ext) => filename
            .strip_suffix(&format!(".{}", ext.to_string_lossy()))
            .unwrap_or(&filename)
            .to_string(),
        None => filename.clone(),
    };

    pattern
        .replace("${filename}", &filename)
        .replace("${baseFilename}", &base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.processing.queue_capacity, 100);
        assert_eq!(config.output.quality, 80);
        assert_eq!(config.watch.poll_interval_secs, 5);
        assert!(config.filters.is_empty());
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[source]"));
        assert!(toml.contains("[output]"));
    }

    #[test]
    fn test_partial_file_with_filters() {
        let content = r#"
[dest]
dir = "/tmp/out"
filename = "${baseFilename}.cbz"

[output]
height = 1600

[[filters]]
name = "deskew"
[filters.options]
maxRotation = 3.0

[[filters]]
name = "resize"
"#;
        let config: Config = toml::from_str(content).unwrap();
        assert_eq!(config.output.height, 1600);
        assert_eq!(config.output.width, 0);
        assert_eq!(config.filters.len(), 2);
        assert_eq!(config.filters[1].name, "resize");
        assert!(config.filters[1].options.is_empty());

        let chain = config.filter_chain();
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_load_from_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[output]\nquality = 0\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ValidationError(_))
        ));

        std::fs::write(&path, "[output\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_format_dest_filename() {
        let src = Path::new("/books/Jane Doe - Tales (1999).cbz");
        assert_eq!(
            format_dest_filename("${baseFilename}.pdf", src),
            "Jane Doe - Tales (1999).pdf"
        );
        assert_eq!(
            format_dest_filename("${filename}", src),
            "Jane Doe - Tales (1999).cbz"
        );
        assert_eq!(format_dest_filename("${filename}.zip", Path::new("/scans/vol1")), "vol1.zip");
        assert_eq!(format_dest_filename("fixed", src), "fixed");
    }

    #[test]
    fn test_tilde_expansion() {
        let mut config = Config::default();
        config.dest.dir = PathBuf::from("~/out");
        assert!(!config.dest_dir().to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_worker_count_resolves_zero() {
        let mut config = Config::default();
        assert!(config.worker_count() >= 1);
        config.processing.max_workers = 3;
        assert_eq!(config.worker_count(), 3);
    }
}
