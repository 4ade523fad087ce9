//! Zip/cbz archives of page images.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use ::zip::write::SimpleFileOptions;
use ::zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{PackageError, PackageResult};
use crate::pipeline::discovery::{file_name, list_images};
use crate::raster::is_supported_image;

/// Whether `path` names a zip or cbz archive.
pub fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_lowercase().as_str(), "zip" | "cbz"))
        .unwrap_or(false)
}

/// Store every image of `src_dir` in a new archive at `dest_path`.
///
/// Entries are uncompressed, named after the files, in filename order.
/// Returns the number of entries written.
pub fn create_image_zip(src_dir: &Path, dest_path: &Path) -> PackageResult<usize> {
    let files = list_images(src_dir, false).map_err(|e| zip_error(dest_path, e))?;

    let file = File::create(dest_path)?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    for path in &files {
        writer
            .start_file(file_name(path), options)
            .map_err(|e| zip_error(dest_path, e))?;
        io::copy(&mut File::open(path)?, &mut writer)?;
    }

    writer.finish().map_err(|e| zip_error(dest_path, e))?;
    tracing::debug!("Stored {} pages in {}", files.len(), dest_path.display());
    Ok(files.len())
}

/// Extract the images of `archive` into `dest_dir`.
///
/// `on_file` is called with the directory and name of each extracted image
/// and its position among the archive's images. Entries whose path would
/// leave `dest_dir` and non-image entries are skipped. Returns the number of
/// images extracted.
pub fn unzip<F>(archive: &Path, dest_dir: &Path, mut on_file: F) -> PackageResult<usize>
where
    F: FnMut(&Path, &str, usize),
{
    let mut zip = ZipArchive::new(File::open(archive)?).map_err(|e| zip_error(archive, e))?;
    fs::create_dir_all(dest_dir)?;

    let mut index = 0;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| zip_error(archive, e))?;
        if entry.is_dir() {
            continue;
        }
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!("Skipping unsafe archive entry: {}", entry.name());
            continue;
        };
        if !is_supported_image(&relative) {
            tracing::debug!("Skipping non-image archive entry: {}", entry.name());
            continue;
        }

        let out_path: PathBuf = dest_dir.join(&relative);
        let parent = out_path.parent().unwrap_or(dest_dir).to_path_buf();
        fs::create_dir_all(&parent)?;
        io::copy(&mut entry, &mut File::create(&out_path)?)?;

        on_file(&parent, &file_name(&out_path), index);
        index += 1;
    }

    Ok(index)
}

fn zip_error(path: &Path, e: impl std::fmt::Display) -> PackageError {
    PackageError::Zip {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}
