//! Command handlers and the helpers they share.

pub mod config;
pub mod conv;
pub mod ip;
pub mod progress;

use std::path::{Path, PathBuf};

use pagesmith_core::Config;

/// Load `cfg` when given, otherwise the default config file.
///
/// An explicit file must load; a broken default file only warns and falls
/// back to the defaults.
pub fn load_config(cfg: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = cfg {
        let path = expand_path(path);
        return Config::load_from(&path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display()));
    }

    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `pagesmith config path`."
            );
            Ok(Config::default())
        }
    }
}

/// Apply `--src` and `--dest` on top of the loaded config.
pub fn apply_paths(config: &mut Config, src: Option<&Path>, dest: Option<&Path>) {
    if let Some(src) = src {
        config.source.path = expand_path(src);
    }
    if let Some(dest) = dest {
        config.dest.dir = expand_path(dest);
    }
}

fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_paths_overrides_only_given() {
        let mut config = Config::default();
        apply_paths(&mut config, Some(Path::new("/scans/book.cbz")), None);
        assert_eq!(config.source.path, PathBuf::from("/scans/book.cbz"));
        assert_eq!(config.dest.dir, Config::default().dest.dir);

        apply_paths(&mut config, None, Some(Path::new("/out")));
        assert_eq!(config.dest.dir, PathBuf::from("/out"));
    }

    #[test]
    fn test_explicit_config_must_load() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(load_config(Some(&missing)).is_err());

        let path = dir.path().join("pagesmith.toml");
        std::fs::write(&path, "[output]\nquality = 90\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.output.quality, 90);
    }
}
