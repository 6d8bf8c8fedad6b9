use std::io::Cursor;

use image::{imageops::FilterType, ImageFormat};

use super::error::{PhotoError, PhotoResult};

/// Width of the small variant
pub const SMALL_WIDTH: u32 = 800;
/// Height of the small variant
pub const SMALL_HEIGHT: u32 = 600;

/// Decodes `bytes`, resizes to exactly 800x600 with Lanczos3 and re-encodes as PNG.
///
/// CPU bound; call from a blocking task.
///
/// # Errors
///
/// - `PhotoError::Decode` if the payload is not a supported image
/// - `PhotoError::Encode` if PNG encoding fails
pub fn resize_to_small_png(key: &str, bytes: &[u8]) -> PhotoResult<Vec<u8>> {
    let original = image::load_from_memory(bytes).map_err(|source| PhotoError::Decode {
        key: key.to_string(),
        source,
    })?;

    let resized = original.resize_exact(SMALL_WIDTH, SMALL_HEIGHT, FilterType::Lanczos3);

    let mut encoded = Cursor::new(Vec::new());
    resized
        .write_to(&mut encoded, ImageFormat::Png)
        .map_err(|source| PhotoError::Encode {
            key: key.to_string(),
            source,
        })?;

    Ok(encoded.into_inner())
}
