//! Signature image blobs
//!
//! A signature is kept as the encoded bytes the user produced (a PNG from the
//! drawing pad, or an uploaded PNG/JPEG) together with its declared MIME type.
//! Decoding into PDF image objects happens at export time.

use crate::error::SignPdfError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::codecs::jpeg::JpegDecoder;
use image::{ExtendedColorType, ImageDecoder};
use sha2::{Digest, Sha256};
use std::io::Cursor;

/// Raster formats that can be embedded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Pick the format from a declared MIME type; anything that is not JPEG
    /// is treated as PNG, which is what drawn signatures are.
    pub fn from_mime(mime: &str) -> Self {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => ImageFormat::Jpeg,
            _ => ImageFormat::Png,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

/// An encoded signature image
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureImage {
    mime: String,
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    digest: [u8; 32],
}

impl SignatureImage {
    /// Wrap encoded bytes, reading the intrinsic size from the header.
    /// The MIME type decides how the bytes are decoded.
    pub fn new(mime: &str, bytes: Vec<u8>) -> Result<Self, SignPdfError> {
        if bytes.is_empty() {
            return Err(SignPdfError::InvalidImage("image is empty".to_string()));
        }

        let mime = mime.trim().to_ascii_lowercase();
        let (width, height) = match ImageFormat::from_mime(&mime) {
            ImageFormat::Png => png_dimensions(&bytes)?,
            ImageFormat::Jpeg => jpeg_header(&bytes)?.dimensions,
        };
        if width == 0 || height == 0 {
            return Err(SignPdfError::InvalidImage(format!(
                "image has zero size ({}x{})",
                width, height
            )));
        }

        let digest = Sha256::digest(&bytes).into();
        Ok(Self {
            mime,
            bytes,
            width,
            height,
            digest,
        })
    }

    /// Accept a user-selected file. Only PNG and JPEG are allowed.
    pub fn from_upload(mime: &str, bytes: Vec<u8>) -> Result<Self, SignPdfError> {
        let normalized = mime.trim().to_ascii_lowercase();
        let supported = matches!(
            normalized.as_str(),
            "image/png" | "image/jpeg" | "image/jpg" | "image/pjpeg"
        );
        if !supported {
            tracing::warn!(mime = %mime, "rejected signature upload");
            return Err(SignPdfError::UnsupportedImage(mime.to_string()));
        }
        Self::new(&normalized, bytes)
    }

    /// Parse a `data:<mime>;base64,<payload>` URL as produced by a canvas or
    /// a file reader.
    pub fn from_data_url(url: &str) -> Result<Self, SignPdfError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| SignPdfError::InvalidImage("not a data URL".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| SignPdfError::InvalidImage("data URL has no payload".to_string()))?;

        let mut params = header.split(';');
        let mime = params.next().unwrap_or_default();
        let is_base64 = params.any(|p| p.eq_ignore_ascii_case("base64"));
        if !is_base64 {
            return Err(SignPdfError::InvalidImage(
                "data URL must be base64 encoded".to_string(),
            ));
        }
        if !mime.to_ascii_lowercase().starts_with("image/") {
            return Err(SignPdfError::UnsupportedImage(mime.to_string()));
        }

        let bytes = BASE64
            .decode(payload.trim())
            .map_err(|e| SignPdfError::InvalidImage(format!("bad base64 payload: {}", e)))?;
        Self::new(mime, bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(&self.bytes))
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn format(&self) -> ImageFormat {
        ImageFormat::from_mime(&self.mime)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Intrinsic size in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Width divided by height
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// SHA-256 of the encoded bytes
    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }
}

fn png_dimensions(bytes: &[u8]) -> Result<(u32, u32), SignPdfError> {
    let reader = png::Decoder::new(Cursor::new(bytes))
        .read_info()
        .map_err(|e| SignPdfError::InvalidImage(format!("PNG: {}", e)))?;
    let info = reader.info();
    Ok((info.width, info.height))
}

/// What a JPEG header tells us about the embedded colour data
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct JpegHeader {
    pub dimensions: (u32, u32),
    pub color_type: ExtendedColorType,
}

pub(crate) fn jpeg_header(bytes: &[u8]) -> Result<JpegHeader, SignPdfError> {
    let decoder = JpegDecoder::new(Cursor::new(bytes))
        .map_err(|e| SignPdfError::InvalidImage(format!("JPEG: {}", e)))?;
    Ok(JpegHeader {
        dimensions: decoder.dimensions(),
        color_type: decoder.original_color_type(),
    })
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_format_from_mime() {
        assert_eq!(ImageFormat::from_mime("image/png"), ImageFormat::Png);
        assert_eq!(ImageFormat::from_mime("image/jpeg"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_mime("IMAGE/JPG"), ImageFormat::Jpeg);
        // Unknown types default to PNG
        assert_eq!(ImageFormat::from_mime("image/webp"), ImageFormat::Png);
        assert_eq!(ImageFormat::from_mime(""), ImageFormat::Png);
    }

    #[test]
    fn test_png_dimensions_are_read() {
        let image = SignatureImage::new("image/png", png_rgba(40, 10, [0, 0, 0, 255])).unwrap();
        assert_eq!(image.dimensions(), (40, 10));
        assert_eq!(image.aspect_ratio(), 4.0);
        assert_eq!(image.format(), ImageFormat::Png);
    }

    #[test]
    fn test_jpeg_dimensions_are_read() {
        let image = SignatureImage::from_upload("image/jpeg", jpeg_rgb(16, 8)).unwrap();
        assert_eq!(image.dimensions(), (16, 8));
        assert_eq!(image.format(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_upload_rejects_non_image() {
        let err = SignatureImage::from_upload("application/pdf", b"%PDF-1.7".to_vec()).unwrap_err();
        assert!(matches!(err, SignPdfError::UnsupportedImage(_)));
    }

    #[test]
    fn test_upload_rejects_gif() {
        let err = SignatureImage::from_upload("image/gif", b"GIF89a".to_vec()).unwrap_err();
        assert!(matches!(err, SignPdfError::UnsupportedImage(_)));
    }

    #[test]
    fn test_corrupt_png_is_invalid() {
        let err = SignatureImage::new("image/png", b"not a png".to_vec()).unwrap_err();
        assert!(matches!(err, SignPdfError::InvalidImage(_)));
    }

    #[test]
    fn test_empty_bytes_are_invalid() {
        let err = SignatureImage::new("image/png", Vec::new()).unwrap_err();
        assert!(matches!(err, SignPdfError::InvalidImage(_)));
    }

    #[test]
    fn test_data_url_roundtrip() {
        let original = SignatureImage::new("image/png", png_gray(3, 2)).unwrap();
        let url = original.to_data_url();
        assert!(url.starts_with("data:image/png;base64,"));

        let parsed = SignatureImage::from_data_url(&url).unwrap();
        assert_eq!(parsed, original);
        assert_eq!(parsed.digest(), original.digest());
    }

    #[test]
    fn test_data_url_requires_base64() {
        let err = SignatureImage::from_data_url("data:image/png,rawbytes").unwrap_err();
        assert!(matches!(err, SignPdfError::InvalidImage(_)));
    }

    #[test]
    fn test_data_url_rejects_non_image_mime() {
        let err = SignatureImage::from_data_url("data:text/plain;base64,aGVsbG8=").unwrap_err();
        assert!(matches!(err, SignPdfError::UnsupportedImage(_)));
    }

    #[test]
    fn test_not_a_data_url() {
        let err = SignatureImage::from_data_url("https://example.com/sig.png").unwrap_err();
        assert!(matches!(err, SignPdfError::InvalidImage(_)));
    }

    #[test]
    fn test_identical_bytes_share_digest() {
        let a = SignatureImage::new("image/png", png_gray(4, 4)).unwrap();
        let b = SignatureImage::new("image/png", png_gray(4, 4)).unwrap();
        let c = SignatureImage::new("image/png", png_gray(5, 4)).unwrap();
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
    }
}
