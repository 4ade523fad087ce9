//! Image PDFs: one page per image, page size taken from the pixels.

use std::path::Path;

use lopdf::{dictionary, Document, Object, Stream};

use super::metadata::BookMetadata;
use crate::error::{PackageError, PackageResult};
use crate::pipeline::discovery::list_images;
use crate::raster::{load_image, mark_edge_points, to_jpeg_bytes};

/// Pixels per 72 points on a PDF page.
const PIXELS_PER_INCH: f32 = 128.0;

/// Settings for [`create_image_pdf`].
#[derive(Debug, Clone, PartialEq)]
pub struct PdfOption {
    /// JPEG quality of the embedded pages
    pub quality: u8,
    /// Blacken the four corner pixels of every page
    pub show_edge_point: bool,
    pub metadata: BookMetadata,
}

impl Default for PdfOption {
    fn default() -> Self {
        Self {
            quality: 80,
            show_edge_point: false,
            metadata: BookMetadata::default(),
        }
    }
}

fn to_pdf_point(pixels: u32) -> f32 {
    pixels as f32 / PIXELS_PER_INCH * 72.0
}

/// Write every image of `src_dir`, in filename order, as the pages of a new
/// PDF at `dest_path`. Returns the page count.
pub fn create_image_pdf(src_dir: &Path, dest_path: &Path, option: &PdfOption) -> PackageResult<usize> {
    let files = list_images(src_dir, false).map_err(|e| pdf_error(dest_path, e))?;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(files.len());

    for path in &files {
        let image_err = |message: String| PackageError::Image {
            path: path.clone(),
            message,
        };

        let mut image = load_image(path).map_err(|e| image_err(e.to_string()))?;
        if option.show_edge_point {
            mark_edge_points(&mut image);
        }
        let (width, height) = image.dimensions();
        let jpeg = to_jpeg_bytes(&image, option.quality).map_err(|e| image_err(e.to_string()))?;

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        ));

        let (w_pt, h_pt) = (to_pdf_point(width), to_pdf_point(height));
        let content = format!("q {w_pt} 0 0 {h_pt} 0 0 cm /Im0 Do Q");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), w_pt.into(), h_pt.into()],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let created = chrono::Local::now().format("D:%Y%m%d%H%M%S").to_string();
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(option.metadata.title.as_str()),
        "Author" => Object::string_literal(option.metadata.author.as_str()),
        "Creator" => Object::string_literal("pagesmith"),
        "CreationDate" => Object::string_literal(created),
    });
    doc.trailer.set("Info", info_id);

    doc.save(dest_path).map_err(|e| pdf_error(dest_path, e))?;
    tracing::debug!("Wrote {} pages to {}", count, dest_path.display());
    Ok(count)
}

fn pdf_error(path: &Path, e: impl std::fmt::Display) -> PackageError {
    PackageError::Pdf {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{create_image, WHITE};

    #[test]
    fn test_pages_sized_from_pixels() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        create_image(256, 384, WHITE).save(src.path().join("b.png")).unwrap();
        create_image(128, 128, WHITE).save(src.path().join("a.png")).unwrap();

        let dest = out.path().join("book.pdf");
        let option = PdfOption {
            show_edge_point: true,
            metadata: BookMetadata::from_filename("Jane Doe - Tales"),
            ..PdfOption::default()
        };
        assert_eq!(create_image_pdf(src.path(), &dest, &option).unwrap(), 2);

        let doc = Document::load(&dest).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);

        let media_box = |page: u32| -> Vec<f32> {
            let id = pages[&page];
            doc.get_dictionary(id)
                .unwrap()
                .get(b"MediaBox")
                .unwrap()
                .as_array()
                .unwrap()
                .iter()
                .map(|o| o.as_float().unwrap())
                .collect()
        };
        // a.png comes first
        assert_eq!(media_box(1), vec![0.0, 0.0, 72.0, 72.0]);
        assert_eq!(media_box(2), vec![0.0, 0.0, 144.0, 216.0]);

        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_dictionary(info_id).unwrap();
        assert_eq!(info.get(b"Title").unwrap().as_str().unwrap(), b"Tales");
        assert_eq!(info.get(b"Author").unwrap().as_str().unwrap(), b"Jane Doe");
        assert_eq!(info.get(b"Creator").unwrap().as_str().unwrap(), b"pagesmith");
    }

    #[test]
    fn test_unreadable_page_fails() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("bad.jpg"), b"nope").unwrap();

        let err = create_image_pdf(src.path(), &out.path().join("x.pdf"), &PdfOption::default())
            .unwrap_err();
        assert!(matches!(err, PackageError::Image { .. }));
    }
}
