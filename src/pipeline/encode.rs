//! Image encoding: `DynamicImage` → base64 PNG wrapped in [`EncodedPage`].
//!
//! The Gemini API accepts images as base64 blobs embedded in the JSON request
//! body. PNG is chosen over JPEG because it is lossless — dashboards are
//! mostly text and thin chart lines, and compression artefacts on either
//! degrade exactly the details the rubric weights highest.

use crate::error::CompareError;
use crate::output::EncodedPage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rasterised page as a base64 PNG ready for the model API.
pub fn encode_page(img: &DynamicImage) -> Result<EncodedPage, CompareError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| CompareError::ImageEncode { source: e })?;

    let b64 = STANDARD.encode(&buf);
    debug!(
        width = img.width(),
        height = img.height(),
        base64_len = b64.len(),
        "encoded page"
    );

    Ok(EncodedPage {
        width: img.width(),
        height: img.height(),
        base64: b64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 4, Rgb([255, 0, 0])));
        let page = encode_page(&img).expect("encode should succeed");
        assert_eq!((page.width, page.height), (10, 4));
        assert_eq!(page.mime_type(), "image/png");
        // The payload must round back out of base64 into a PNG header.
        let decoded = STANDARD.decode(&page.base64).expect("valid base64");
        assert_eq!(&decoded[..8], b"\x89PNG\r\n\x1a\n");
    }
}
