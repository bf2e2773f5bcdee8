//! Downsizing of uploaded product and customer images.

use std::io::Cursor;

use axum::{
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType};

use crate::Error;

/// Controls when and how uploaded images are shrunk before they are stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageConfig {
    /// Uploads up to this many bytes are stored unchanged.
    pub compress_threshold_bytes: usize,
    /// The widest a re-encoded image may be, in pixels.
    pub max_width: u32,
    /// The JPEG quality used when re-encoding, from 1 to 100.
    pub jpeg_quality: u8,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            compress_threshold_bytes: 10 * 1024,
            max_width: 200,
            jpeg_quality: 80,
        }
    }
}

/// Prepare an uploaded image for storage.
///
/// Small uploads are kept as they are. Larger ones are decoded, scaled down
/// to at most [ImageConfig::max_width] pixels wide with the aspect ratio
/// kept, and re-encoded as JPEG. Images are never scaled up.
///
/// # Errors
///
/// Returns [Error::InvalidImage] if a large upload is not a readable image,
/// or [Error::ImageError] if it could not be re-encoded.
pub fn prepare_image(bytes: Vec<u8>, config: &ImageConfig) -> Result<Vec<u8>, Error> {
    if bytes.len() <= config.compress_threshold_bytes {
        return Ok(bytes);
    }

    let decoded =
        image::load_from_memory(&bytes).map_err(|error| Error::InvalidImage(error.to_string()))?;

    let resized = if decoded.width() > config.max_width {
        let height = u64::from(decoded.height()) * u64::from(config.max_width)
            / u64::from(decoded.width());
        let height = u32::try_from(height).unwrap_or(u32::MAX).max(1);
        decoded.resize_exact(config.max_width, height, FilterType::Triangle)
    } else {
        decoded
    };

    let mut buffer = Cursor::new(Vec::new());
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, config.jpeg_quality);
    encoder
        .encode_image(&resized.to_rgb8())
        .map_err(|error| Error::ImageError(error.to_string()))?;

    tracing::debug!(
        "compressed image from {} to {} bytes",
        bytes.len(),
        buffer.get_ref().len()
    );

    Ok(buffer.into_inner())
}

/// A response with the raw image bytes and a content type guessed from them.
pub fn image_response(bytes: Vec<u8>) -> Response {
    let content_type = image::guess_format(&bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream");

    ([(CONTENT_TYPE, content_type)], bytes).into_response()
}
