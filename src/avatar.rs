//! Avatar images as self-contained data URIs.
//!
//! Local files keep their original bytes (like a browser file reader would),
//! remote images are decoded and re-encoded as PNG so the card never depends
//! on a second fetch.

use crate::error::AvatarError;
use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;

/// An avatar image embedded as a `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarRef(String);

impl AvatarRef {
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        Self(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn mime(&self) -> Option<&str> {
        let header = self.0.strip_prefix("data:")?.split_once(',')?.0;
        header.split(';').next().filter(|m| !m.is_empty())
    }

    /// Raw bytes carried by the URI.
    pub fn bytes(&self) -> Result<Vec<u8>, AvatarError> {
        let rest = self
            .0
            .strip_prefix("data:")
            .ok_or_else(|| AvatarError::DataUri("missing data: scheme".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| AvatarError::DataUri("missing payload separator".to_string()))?;

        if !header.split(';').any(|part| part == "base64") {
            return Err(AvatarError::DataUri(
                "only base64 payloads are supported".to_string(),
            ));
        }

        STANDARD
            .decode(payload.trim())
            .map_err(|e| AvatarError::DataUri(e.to_string()))
    }

    pub fn decode(&self) -> Result<DynamicImage, AvatarError> {
        let bytes = self.bytes()?;
        Ok(image::load_from_memory(&bytes)?)
    }
}

/// Read a local image file into a data URI, keeping the file's own bytes.
pub async fn load_file(path: &Path) -> Result<AvatarRef, AvatarError> {
    let bytes = tokio::fs::read(path).await?;
    avatar_from_file_bytes(&bytes)
}

fn avatar_from_file_bytes(bytes: &[u8]) -> Result<AvatarRef, AvatarError> {
    let format = image::guess_format(bytes)?;
    // Reject files that only look like images.
    image::load_from_memory_with_format(bytes, format)?;
    Ok(AvatarRef::from_bytes(format.to_mime_type(), bytes))
}

/// Download an image and re-encode it as a PNG data URI.
pub async fn fetch_remote(client: &reqwest::Client, url: &str) -> Result<AvatarRef, AvatarError> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(AvatarError::Status(response.status()));
    }

    let bytes = response.bytes().await?;
    let img = image::load_from_memory(&bytes)?;
    encode_png(&img)
}

pub fn encode_png(img: &DynamicImage) -> Result<AvatarRef, AvatarError> {
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(AvatarRef::from_bytes("image/png", &png))
}

#[cfg(test)]
pub(crate) fn sample_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .expect("encode sample png");
    png
}
