//! Image encoding: page images ⇄ `data:` URIs.
//!
//! Attachments travel through the transcript as plain strings: either a remote
//! URL or a base64 `data:` URI. This module produces data URIs from local
//! image bytes or rasterised PDF pages, and splits them back into
//! `(mime, base64)` for providers that want the two separately.
//!
//! Rendered pages are encoded as PNG: lossless compression keeps text crisp,
//! and JPEG artefacts on rendered glyphs degrade transcription accuracy.

use crate::error::Page2MdError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Prefix every embedded image URI starts with.
pub const DATA_IMAGE_PREFIX: &str = "data:image";

pub fn is_data_uri(source: &str) -> bool {
    source.starts_with("data:")
}

/// Build a base64 data URI.
pub fn to_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Encode a rasterised page as a PNG data URI.
pub fn encode_page(img: &DynamicImage) -> Result<String, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;

    let uri = to_data_uri("image/png", &buf);
    debug!("Encoded page image → {} bytes data URI", uri.len());
    Ok(uri)
}

/// Wrap raw image file bytes in a data URI, sniffing the format from the
/// magic bytes rather than trusting a file extension.
pub fn image_bytes_to_data_uri(bytes: &[u8]) -> Result<String, Page2MdError> {
    let format = image::guess_format(bytes)
        .map_err(|e| Page2MdError::InvalidRequest(format!("not a recognised image: {e}")))?;
    Ok(to_data_uri(format.to_mime_type(), bytes))
}

/// Split a base64 data URI into `(mime_type, base64_payload)`.
///
/// Returns `None` for anything that is not a base64 data URI.
pub fn parse_data_uri(source: &str) -> Option<(&str, &str)> {
    let rest = source.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    if mime.is_empty() {
        return None;
    }
    Some((mime, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let uri = encode_page(&img).expect("encode should succeed");
        let (mime, payload) = parse_data_uri(&uri).expect("valid data URI");
        assert_eq!(mime, "image/png");
        let decoded = STANDARD.decode(payload).expect("valid base64");
        assert_eq!(image::guess_format(&decoded).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn sniff_png_bytes() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        let uri = image_bytes_to_data_uri(&buf).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
        assert!(uri.starts_with(DATA_IMAGE_PREFIX));
    }

    #[test]
    fn reject_non_image_bytes() {
        let err = image_bytes_to_data_uri(b"plain text, not an image").unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn parse_data_uri_variants() {
        assert_eq!(
            parse_data_uri("data:image/jpeg;base64,QUJD"),
            Some(("image/jpeg", "QUJD"))
        );
        assert_eq!(parse_data_uri("data:text/plain,hello"), None);
        assert_eq!(parse_data_uri("https://example.org/a.png"), None);
        assert_eq!(parse_data_uri("data:;base64,QUJD"), None);
    }

    #[test]
    fn data_uri_detection() {
        assert!(is_data_uri("data:image/png;base64,AA"));
        assert!(!is_data_uri("https://example.org/a.png"));
    }
}
