//! Source image listing.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use walkdir::WalkDir;

use crate::error::{PipelineError, PipelineResult};
use crate::raster::is_supported_image;

/// List supported images under `dir`, sorted by path.
///
/// Only direct children are listed unless `recursive` is set. A missing
/// directory is [`PipelineError::SourceNotFound`]; any error while walking is
/// [`PipelineError::Listing`].
pub fn list_images(dir: &Path, recursive: bool) -> PipelineResult<Vec<PathBuf>> {
    Ok(walk_images(dir, recursive)?
        .into_iter()
        .map(|(path, _)| path)
        .collect())
}

/// List images modified since the previous scan.
///
/// Keeps files whose modification time lies in `[last_check - delay,
/// now - delay]`. The lower bound is only shifted once a real check time
/// exists. Returns the matches together with the time to pass as
/// `last_check` next round.
pub fn list_modified_images(
    dir: &Path,
    recursive: bool,
    delay: Duration,
    last_check: SystemTime,
) -> PipelineResult<(Vec<PathBuf>, SystemTime)> {
    let now = SystemTime::now();

    let after = if last_check > UNIX_EPOCH && !delay.is_zero() {
        last_check.checked_sub(delay).unwrap_or(UNIX_EPOCH)
    } else {
        last_check
    };
    let before = now.checked_sub(delay).unwrap_or(UNIX_EPOCH);

    let files: Vec<PathBuf> = walk_images(dir, recursive)?
        .into_iter()
        .filter(|(_, modified)| *modified >= after && *modified <= before)
        .map(|(path, _)| path)
        .collect();

    if !files.is_empty() {
        tracing::info!("[+] {}", files.len());
    }
    Ok((files, now))
}

fn walk_images(dir: &Path, recursive: bool) -> PipelineResult<Vec<(PathBuf, SystemTime)>> {
    if !dir.is_dir() {
        return Err(PipelineError::SourceNotFound(dir.to_path_buf()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(max_depth).follow_links(true) {
        let entry = entry.map_err(|e| listing_error(dir, e))?;
        if !entry.file_type().is_file() || !is_supported_image(entry.path()) {
            continue;
        }
        let modified = entry
            .metadata()
            .map_err(|e| listing_error(dir, e))?
            .modified()
            .unwrap_or(UNIX_EPOCH);
        files.push((entry.into_path(), modified));
    }

    // Sort by path for deterministic ordering
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

fn listing_error(dir: &Path, e: impl std::fmt::Display) -> PipelineError {
    PipelineError::Listing {
        path: dir.to_path_buf(),
        message: e.to_string(),
    }
}

/// File name of `path` as a string, or empty when it has none.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// File name without its extension.
pub fn base_name(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"x").unwrap();
        path
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths.iter().map(|p| file_name(p)).collect()
    }

    #[test]
    fn test_list_images_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.png");
        touch(dir.path(), "a.JPG");
        touch(dir.path(), "c.gif");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "d.webp");
        fs::create_dir(dir.path().join("sub")).unwrap();
        touch(&dir.path().join("sub"), "e.jpeg");

        let files = list_images(dir.path(), false).unwrap();
        assert_eq!(names(&files), vec!["a.JPG", "b.png", "c.gif"]);

        let files = list_images(dir.path(), true).unwrap();
        assert_eq!(names(&files), vec!["a.JPG", "b.png", "c.gif", "e.jpeg"]);
    }

    #[test]
    fn test_list_images_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            list_images(&missing, false),
            Err(PipelineError::SourceNotFound(_))
        ));
    }

    #[test]
    fn test_modified_window() {
        let dir = tempfile::tempdir().unwrap();
        let old = touch(dir.path(), "old.png");
        touch(dir.path(), "new.png");

        let hour_ago = SystemTime::now() - Duration::from_secs(3600);
        File::options()
            .write(true)
            .open(&old)
            .unwrap()
            .set_modified(hour_ago)
            .unwrap();

        // first scan sees everything old enough
        let (files, check) =
            list_modified_images(dir.path(), false, Duration::ZERO, UNIX_EPOCH).unwrap();
        assert_eq!(names(&files), vec!["new.png", "old.png"]);
        assert!(check > hour_ago);

        // files younger than the delay wait for a later scan
        let (files, _) =
            list_modified_images(dir.path(), false, Duration::from_secs(600), UNIX_EPOCH).unwrap();
        assert_eq!(names(&files), vec!["old.png"]);

        // nothing older than the previous check comes back
        let since = SystemTime::now() - Duration::from_secs(600);
        let (files, _) = list_modified_images(dir.path(), false, Duration::ZERO, since).unwrap();
        assert_eq!(names(&files), vec!["new.png"]);
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("Page01.PNG"), "Page01");
        assert_eq!(base_name("noext"), "noext");
        assert_eq!(base_name("a.b.jpg"), "a.b");
    }
}
