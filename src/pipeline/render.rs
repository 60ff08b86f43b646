//! Rasterisation: turn one upload into the RGB image the model will see.
//!
//! PDFs are rendered with pdfium; PNG and JPEG uploads are decoded directly.
//! Both paths normalise to RGB so downstream encoding never has to care about
//! alpha channels or the source format.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations, preventing the Tokio worker
//! threads from stalling during CPU-heavy rendering.
//!
//! ## Why only the first page?
//!
//! A dashboard export is a one-page artefact; trailing pages are appendix
//! noise. Pages after the first are never even touched, so a 300-page PDF
//! costs the same as a 1-page one.

use crate::config::CompareConfig;
use crate::error::CompareError;
use crate::pipeline::input::{MediaType, UploadedFile};
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::debug;

/// Rasterise the first page of an upload into an RGB image.
///
/// The branch follows the upload's declared media type: PDFs go through
/// pdfium on a blocking thread, images are decoded in place. Rendered
/// dimensions are capped at `config.max_rendered_pixels` on the longest
/// edge for PDFs; direct image uploads keep their native dimensions.
pub async fn first_page_image(
    file: &UploadedFile,
    config: &CompareConfig,
) -> Result<DynamicImage, CompareError> {
    match file.media_type {
        MediaType::Pdf => {
            let label = file.label.clone();
            let bytes = file.bytes.clone();
            let max_pixels = config.max_rendered_pixels;

            tokio::task::spawn_blocking(move || {
                render_first_page_blocking(&label, &bytes, max_pixels)
            })
            .await
            .map_err(|e| CompareError::Internal(format!("Render task panicked: {}", e)))?
        }
        MediaType::Png | MediaType::Jpeg => decode_image(file),
    }
}

/// Blocking implementation of first-page rendering.
fn render_first_page_blocking(
    label: &str,
    bytes: &[u8],
    max_pixels: u32,
) -> Result<DynamicImage, CompareError> {
    let pdfium = bind_pdfium()?;

    // The upload never touches disk: pdfium reads the in-memory bytes.
    let document =
        pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| CompareError::CorruptDocument {
                label: label.to_string(),
                detail: format!("{:?}", e),
            })?;

    let pages = document.pages();
    if pages.len() == 0 {
        return Err(CompareError::EmptyDocument {
            label: label.to_string(),
        });
    }
    debug!(label = %label, total_pages = pages.len(), "PDF loaded");

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let page = pages
        .get(0)
        .map_err(|e| CompareError::RasterisationFailed {
            label: label.to_string(),
            detail: format!("{:?}", e),
        })?;

    let bitmap =
        page.render_with_config(&render_config)
            .map_err(|e| CompareError::RasterisationFailed {
                label: label.to_string(),
                detail: format!("{:?}", e),
            })?;

    let image = bitmap.as_image();
    debug!(
        label = %label,
        width = image.width(),
        height = image.height(),
        "rendered first page"
    );

    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}

/// Decode a PNG or JPEG upload to RGB.
///
/// The decoder is chosen by the declared type, mirroring the PDF branch: a
/// PNG that is really a JPEG fails here with a decode error instead of being
/// quietly reinterpreted.
fn decode_image(file: &UploadedFile) -> Result<DynamicImage, CompareError> {
    let format = match file.media_type {
        MediaType::Png => image::ImageFormat::Png,
        MediaType::Jpeg => image::ImageFormat::Jpeg,
        MediaType::Pdf => {
            return Err(CompareError::Internal(
                "decode_image called with a PDF upload".into(),
            ))
        }
    };

    let img = image::load_from_memory_with_format(&file.bytes, format).map_err(|e| {
        CompareError::ImageDecode {
            label: file.label.clone(),
            source: e,
        }
    })?;

    debug!(
        label = %file.label,
        width = img.width(),
        height = img.height(),
        "decoded image upload"
    );

    Ok(DynamicImage::ImageRgb8(img.to_rgb8()))
}

/// Bind to a pdfium shared library.
///
/// Resolution order: the directory named by `PDFIUM_LIB_PATH`, then the
/// current directory, then the system library path.
fn bind_pdfium() -> Result<Pdfium, CompareError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(dir) if !dir.trim().is_empty() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
        }
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| CompareError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[tokio::test]
    async fn png_upload_decodes_to_native_dimensions() {
        let file = UploadedFile::new("File 1", png_bytes(6, 3), MediaType::Png);
        let img = first_page_image(&file, &CompareConfig::default())
            .await
            .unwrap();
        assert_eq!((img.width(), img.height()), (6, 3));
    }

    #[tokio::test]
    async fn declared_jpeg_with_png_bytes_fails_to_decode() {
        let file = UploadedFile::new("File 2", png_bytes(4, 4), MediaType::Jpeg);
        let err = first_page_image(&file, &CompareConfig::default())
            .await
            .unwrap_err();
        match err {
            CompareError::ImageDecode { label, .. } => assert_eq!(label, "File 2"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn truncated_png_fails_to_decode() {
        let mut bytes = png_bytes(8, 8);
        bytes.truncate(bytes.len() / 2);
        let file = UploadedFile::new("File 1", bytes, MediaType::Png);
        let result = first_page_image(&file, &CompareConfig::default()).await;
        assert!(matches!(result, Err(CompareError::ImageDecode { .. })));
    }
}
