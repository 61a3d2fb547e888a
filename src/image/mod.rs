//! Image inspection, preview, and download helpers
//!
//! Checks that bytes really hold an image, converts payloads to and from
//! `data:` URLs, and derives the file name the processed image is saved under.

use crate::models::ImagePayload;
use crate::{Error, Result};
use ::image::{ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// Suffix appended to the input file stem for the downloaded result.
pub const DOWNLOAD_SUFFIX: &str = "-sem-fundo";

/// Renders a payload as a `data:<type>;base64,<data>` URL for previews.
pub fn to_data_url(payload: &ImagePayload) -> String {
    format!("data:{};base64,{}", payload.content_type, payload.data)
}

/// Splits a base64 `data:` URL back into a payload.
pub fn from_data_url(url: &str) -> Result<ImagePayload> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| Error::InvalidInput("not a data URL".to_string()))?;
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| Error::InvalidInput("data URL has no payload".to_string()))?;
    let content_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| Error::InvalidInput("data URL is not base64 encoded".to_string()))?;

    if !content_type.starts_with("image/") {
        return Err(Error::InvalidInput(format!(
            "data URL does not hold an image (content type '{}')",
            content_type
        )));
    }

    Ok(ImagePayload::new(data.to_string(), content_type))
}

/// `photo.final.jpg` becomes `photo.final-sem-fundo.png`. Only the last
/// extension is dropped; a name without one is used as is.
pub fn download_file_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "image".to_string());
    format!("{}{}.png", stem, DOWNLOAD_SUFFIX)
}

/// Format and size read from an image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl ImageInfo {
    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

/// Identifies the format from the magic bytes, then parses the header with
/// the matching decoder. Bytes that merely start like an image are rejected.
pub fn inspect_image(bytes: &[u8]) -> Result<ImageInfo> {
    let format = ::image::guess_format(bytes)?;
    let (width, height) =
        ImageReader::with_format(Cursor::new(bytes), format).into_dimensions()?;
    Ok(ImageInfo {
        format,
        width,
        height,
    })
}

/// Confirms decoded service output is an image before it is saved.
pub fn ensure_image(bytes: &[u8]) -> Result<ImageInfo> {
    let info = inspect_image(bytes)?;
    if info.format != ImageFormat::Png {
        tracing::warn!(
            "Service returned {:?} data; saving it with a .png name",
            info.format
        );
    }
    Ok(info)
}
