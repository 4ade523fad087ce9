//! Output packaging: zip/cbz archives and image PDFs.
//!
//! Workers write pages into a directory; packaging runs once they are done
//! and re-lists that directory in filename order.

pub mod metadata;
pub mod pdf;
pub mod zip;

pub use self::metadata::BookMetadata;
pub use self::pdf::{create_image_pdf, PdfOption};
pub use self::zip::{create_image_zip, is_archive, unzip};

use std::path::Path;

/// How the processed pages are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pages stay as JPEG files in the destination directory
    Directory,
    /// A zip archive (`.zip` or `.cbz`)
    Zip,
    Pdf,
}

impl OutputFormat {
    /// Pick the format from the extension of the destination file name.
    pub fn from_filename(filename: &str) -> Self {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match ext.as_deref() {
            Some("zip") | Some("cbz") => OutputFormat::Zip,
            Some("pdf") => OutputFormat::Pdf,
            _ => OutputFormat::Directory,
        }
    }

    /// True when pages go through a scratch directory before packaging.
    pub fn is_packaged(self) -> bool {
        self != OutputFormat::Directory
    }
}
