use std::fs;
use std::io::Cursor;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use decoviz_contracts::image::{ImagePayload, DEFAULT_MIME_TYPE};
use decoviz_contracts::session::OriginalUpload;
use image::{DynamicImage, ImageFormat};

use crate::error::{RedesignError, Result};

fn supported_mime(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Png => Some("image/png"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Gif => Some("image/gif"),
        _ => None,
    }
}

/// Sniffs the bytes and wraps them as an inline payload. Only the formats the
/// model accepts for uploads pass.
pub fn payload_from_bytes(bytes: &[u8]) -> Result<ImagePayload> {
    if bytes.is_empty() {
        return Err(RedesignError::InvalidImage("file is empty".to_string()));
    }
    let format = image::guess_format(bytes)
        .map_err(|_| RedesignError::InvalidImage("not a recognised image".to_string()))?;
    let mime = supported_mime(format).ok_or_else(|| {
        RedesignError::InvalidImage(format!("unsupported image format {format:?}"))
    })?;
    Ok(ImagePayload::new(mime, BASE64.encode(bytes)))
}

pub fn decode(payload: &ImagePayload) -> Result<Vec<u8>> {
    decode_base64(&payload.data)
}

pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(data.trim().as_bytes())
        .map_err(|err| RedesignError::InvalidImage(format!("base64 decode failed: {err}")))
}

pub fn load_upload(path: &Path, instructions: &str) -> Result<OriginalUpload> {
    let bytes = fs::read(path)?;
    let image = payload_from_bytes(&bytes)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    Ok(OriginalUpload {
        file_name,
        image,
        instructions: instructions.trim().to_string(),
    })
}

/// Rebuilds a payload for base64 data kept without its mime type, sniffing the
/// format and assuming JPEG when the bytes say nothing.
pub fn stored_payload(data: &str) -> ImagePayload {
    let mime = decode_base64(data)
        .ok()
        .and_then(|bytes| image::guess_format(&bytes).ok())
        .and_then(supported_mime)
        .unwrap_or(DEFAULT_MIME_TYPE);
    ImagePayload::new(mime, data)
}

/// JPEG bytes for a base64 image. JPEG input is passed through untouched,
/// anything else is decoded and re-encoded.
pub fn to_jpeg(data: &str) -> Result<Vec<u8>> {
    let bytes = decode_base64(data)?;
    if matches!(image::guess_format(&bytes), Ok(ImageFormat::Jpeg)) {
        return Ok(bytes);
    }
    let decoded = image::load_from_memory(&bytes)
        .map_err(|err| RedesignError::InvalidImage(err.to_string()))?;
    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
    let mut out = Cursor::new(Vec::new());
    rgb.write_to(&mut out, ImageFormat::Jpeg)
        .map_err(|err| RedesignError::InvalidImage(err.to_string()))?;
    Ok(out.into_inner())
}
