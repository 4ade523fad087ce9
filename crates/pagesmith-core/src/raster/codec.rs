//! Image decoding and JPEG encoding.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageReader, RgbImage, RgbaImage};

use crate::error::PipelineError;

/// File extensions accepted as source pages (lowercase, without the dot).
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// Check if a path has a supported image extension (case-insensitive).
pub fn is_supported_image(path: &Path) -> bool {
    lowercase_extension(path)
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Decode an image file into an RGBA canvas.
///
/// The extension decides whether the file is accepted at all; the actual
/// codec is detected from the content.
pub fn load_image(path: &Path) -> Result<RgbaImage, PipelineError> {
    if !is_supported_image(path) {
        return Err(PipelineError::UnsupportedFormat {
            path: path.to_path_buf(),
            format: lowercase_extension(path).unwrap_or_else(|| "none".to_string()),
        });
    }

    let decode_err = |message: String| PipelineError::Decode {
        path: path.to_path_buf(),
        message,
    };

    let reader = ImageReader::open(path)
        .map_err(|e| decode_err(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| decode_err(format!("Cannot detect image format: {e}")))?;
    let image = reader.decode().map_err(|e| decode_err(e.to_string()))?;

    Ok(image.to_rgba8())
}

/// Encode `image` as JPEG into `dir/filename`, creating `dir` if needed.
///
/// Returns the path of the written file.
pub fn save_jpeg(
    image: &RgbaImage,
    dir: &Path,
    filename: &str,
    quality: u8,
) -> Result<PathBuf, PipelineError> {
    let path = dir.join(filename);
    let encode_err = |message: String| PipelineError::Encode {
        path: path.clone(),
        message,
    };

    std::fs::create_dir_all(dir).map_err(|e| encode_err(e.to_string()))?;
    let file = File::create(&path).map_err(|e| encode_err(e.to_string()))?;
    let mut writer = BufWriter::new(file);

    let rgb: RgbImage = image.convert();
    JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100))
        .encode_image(&rgb)
        .map_err(|e| encode_err(e.to_string()))?;

    Ok(path)
}

/// Encode `image` as an in-memory JPEG.
pub fn to_jpeg_bytes(image: &RgbaImage, quality: u8) -> image::ImageResult<Vec<u8>> {
    let mut bytes = Vec::new();
    let rgb: RgbImage = image.convert();
    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100)).encode_image(&rgb)?;
    Ok(bytes)
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}
