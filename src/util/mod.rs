//! Image file helpers: PNG encoding and saving or loading rendered images.

use image::{ImageFormat, RgbImage};
use std::fs;
use std::io::Cursor;
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum UtilError {
    #[error("Image encoding failed: {0}")]
    EncodingError(String),
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
    #[error("IO Error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for UtilError {
    fn from(err: std::io::Error) -> Self {
        UtilError::IOError(err.to_string())
    }
}

/// Encode an image as PNG bytes
///
/// # Arguments
///
/// * `image` - Image to encode
///
/// # Returns
///
/// * `Result<Vec<u8>, UtilError>` - PNG file contents
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, UtilError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(UtilError::InvalidParams(format!(
            "cannot encode an empty {}x{} image",
            image.width(),
            image.height()
        )));
    }
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| UtilError::EncodingError(e.to_string()))?;
    Ok(buffer.into_inner())
}

/// Save an image, creating the parent directory when needed
///
/// The format is chosen from the file extension.
pub fn save_image(image: &RgbImage, path: &str) -> Result<(), UtilError> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    image
        .save(path)
        .map_err(|e| UtilError::EncodingError(format!("Failed to save {path}: {e}")))
}

/// Load an image from disk as RGB
pub fn load_image(image_path: &str) -> Result<RgbImage, UtilError> {
    let img = image::open(image_path)
        .map_err(|e| UtilError::InvalidParams(format!("Failed to load image: {e}")))?;

    Ok(img.to_rgb8())
}
