//! Photo attachments.
//!
//! Uploaded images are embedded in the record itself as a `data:` URL so the
//! item list stays a single self-contained JSON document.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::ImageFormat;

use crate::error::{Error, Result};

/// Encodes image bytes as an inline `data:<mime>;base64,...` URL.
///
/// The declared content type is trusted when it names an image; otherwise the
/// format is sniffed from the bytes.
///
/// # Errors
/// * Returns [`Error::UnsupportedImage`] when the bytes are not an image
pub fn to_data_url(bytes: &[u8], declared_mime: Option<&str>) -> Result<String> {
    let mime = match declared_mime.map(str::trim) {
        Some(mime) if mime.starts_with("image/") => mime.to_string(),
        _ => sniff_mime(bytes).ok_or(Error::UnsupportedImage)?.to_string(),
    };

    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

/// Guesses the MIME type from the file's magic bytes.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(bytes).ok()?;
    let mime = match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Ico => "image/x-icon",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::Avif => "image/avif",
        _ => return None,
    };
    Some(mime)
}
