//! Page image format detection.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Raster formats accepted as page images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Portable Network Graphics
    Png,
    /// JPEG / JFIF
    Jpeg,
    /// TIFF, little or big endian
    Tiff,
    /// Windows bitmap
    Bmp,
    /// GIF87a / GIF89a
    Gif,
    /// RIFF WebP
    Webp,
}

impl ImageFormat {
    /// Canonical lowercase extension.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Gif => "gif",
            ImageFormat::Webp => "webp",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension().to_uppercase())
    }
}

/// File extensions treated as page images (lowercase, without dot).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp", "gif", "webp"];

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = b"\xff\xd8\xff";
const TIFF_LE_MAGIC: &[u8] = b"II*\x00";
const TIFF_BE_MAGIC: &[u8] = b"MM\x00*";
const BMP_MAGIC: &[u8] = b"BM";
const GIF87_MAGIC: &[u8] = b"GIF87a";
const GIF89_MAGIC: &[u8] = b"GIF89a";
const PDF_MAGIC: &[u8] = b"%PDF-";
const HEADER_LEN: usize = 16;

/// Detect the image format from a file path.
///
/// # Example
/// ```no_run
/// use docsift::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("page_1.png").unwrap();
/// println!("format: {}", format);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<ImageFormat> {
    let mut file = File::open(path)?;
    let mut header = Vec::with_capacity(HEADER_LEN);
    file.by_ref()
        .take(HEADER_LEN as u64)
        .read_to_end(&mut header)?;
    detect_format_from_bytes(&header)
}

/// Detect the image format from the leading bytes of a file.
///
/// # Returns
/// * `Ok(ImageFormat)` for a supported raster format
/// * `Err(Error::UnsupportedFormat)` for PDF input
/// * `Err(Error::UnknownFormat)` otherwise
pub fn detect_format_from_bytes(data: &[u8]) -> Result<ImageFormat> {
    if data.len() < 4 {
        return Err(Error::UnknownFormat);
    }

    if data.starts_with(PNG_MAGIC) {
        return Ok(ImageFormat::Png);
    }
    if data.starts_with(JPEG_MAGIC) {
        return Ok(ImageFormat::Jpeg);
    }
    if data.starts_with(TIFF_LE_MAGIC) || data.starts_with(TIFF_BE_MAGIC) {
        return Ok(ImageFormat::Tiff);
    }
    if data.starts_with(GIF87_MAGIC) || data.starts_with(GIF89_MAGIC) {
        return Ok(ImageFormat::Gif);
    }
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Ok(ImageFormat::Webp);
    }
    // BMP last: two bytes of magic are easy to hit by accident
    if data.starts_with(BMP_MAGIC) && data.len() >= 14 {
        return Ok(ImageFormat::Bmp);
    }
    if data.starts_with(PDF_MAGIC) {
        return Err(Error::UnsupportedFormat(
            "pdf (rasterize pages to images first)".to_string(),
        ));
    }

    Err(Error::UnknownFormat)
}

/// Check whether a path carries a page image extension.
pub fn is_image_path<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Check if bytes represent a supported page image.
pub fn is_image_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_png() {
        let data = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";
        assert_eq!(detect_format_from_bytes(data).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_detect_jpeg_and_tiff() {
        assert_eq!(
            detect_format_from_bytes(b"\xff\xd8\xff\xe0\x00\x10JFIF").unwrap(),
            ImageFormat::Jpeg
        );
        assert_eq!(
            detect_format_from_bytes(b"II*\x00\x08\x00\x00\x00").unwrap(),
            ImageFormat::Tiff
        );
        assert_eq!(
            detect_format_from_bytes(b"RIFF\x00\x00\x00\x00WEBPVP8 ").unwrap(),
            ImageFormat::Webp
        );
    }

    #[test]
    fn test_detect_pdf_is_unsupported() {
        let result = detect_format_from_bytes(b"%PDF-1.7\n%test");
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_detect_unknown() {
        assert!(matches!(
            detect_format_from_bytes(b"<!DOCTYPE html>"),
            Err(Error::UnknownFormat)
        ));
        assert!(matches!(
            detect_format_from_bytes(b""),
            Err(Error::UnknownFormat)
        ));
        assert!(!is_image_bytes(b"abc"));
    }

    #[test]
    fn test_is_image_path() {
        assert!(is_image_path("scans/page_01.PNG"));
        assert!(is_image_path("a.jpeg"));
        assert!(!is_image_path("page.json"));
        assert!(!is_image_path("README"));
    }
}
