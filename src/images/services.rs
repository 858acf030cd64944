use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;

use crate::error::ApiError;

pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024; // 10MiB
const MAX_DIMENSION: u32 = 1200;
const JPEG_QUALITY: u8 = 85;

/// Checked before the bytes are touched; violations never reach the model.
pub fn validate_upload(content_type: &str, size: usize) -> Result<(), ApiError> {
    if !is_supported_mime(content_type) {
        return Err(ApiError::Validation(
            "Only image files (jpg, jpeg, png, webp) are allowed".into(),
        ));
    }
    if size > MAX_FILE_SIZE {
        return Err(ApiError::Validation(format!(
            "File too large. Max size is {} bytes",
            MAX_FILE_SIZE
        )));
    }
    Ok(())
}

fn is_supported_mime(ct: &str) -> bool {
    matches!(
        ct,
        "image/jpeg" | "image/jpg" | "image/png" | "image/webp"
    )
}

/// Normalize an upload for the vision model: fit within 1200px per side
/// (downscale only), re-encode as JPEG quality 85. Pure transform.
pub fn preprocess(bytes: &[u8]) -> Result<Vec<u8>, ApiError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| ApiError::Processing(format!("Failed to decode image: {}", e)))?;

    let (width, height) = img.dimensions();
    let img = if width > MAX_DIMENSION || height > MAX_DIMENSION {
        img.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Lanczos3)
    } else {
        img
    };

    // JPEG has no alpha channel
    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    encoder
        .encode_image(&rgb)
        .map_err(|e| ApiError::Processing(format!("Failed to encode JPEG: {}", e)))?;
    Ok(out)
}
