//! Image encoding: `DynamicImage` → PNG bytes, and the base64/sha256 helpers
//! the stateless JSON envelope needs.
//!
//! PNG is lossless, so text on a rendered page stays crisp at any zoom the
//! frontend applies to the thumbnail.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use sha2::{Digest, Sha256};
use std::io::Cursor;
use tracing::debug;

/// MIME type of every thumbnail this crate produces.
pub const PNG_MIME: &str = "image/png";

/// Encode a rasterised page as PNG bytes.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!(
        width = img.width(),
        height = img.height(),
        bytes = buf.len(),
        "Encoded PNG"
    );
    Ok(buf)
}

/// Standard (padded) base64 of `bytes`.
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Lowercase hex SHA-256 digest of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
