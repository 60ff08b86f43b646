//! Input classification: decide how an uploaded file will be turned into
//! pixels.
//!
//! ## Why classify instead of sniff?
//!
//! The branch is driven by what the upload *declares* (content type, then
//! filename extension), never by inspecting the bytes. Classification stays
//! trivially fast and predictable, and a file that lies about its type fails
//! in the rasteriser with a clear document error instead of being silently
//! reinterpreted as something else. Corrupt content is the next stage's
//! problem.

use crate::error::CompareError;
use tracing::debug;

/// How an upload will be rasterised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    /// PDF document: the first page is rendered via pdfium.
    Pdf,
    /// PNG image: decoded directly, no pdfium involved.
    Png,
    /// JPEG image: decoded directly, no pdfium involved.
    Jpeg,
}

impl MediaType {
    /// Classify from the declared content type, falling back to the filename
    /// extension when the content type is absent or non-committal
    /// (`application/octet-stream`).
    pub fn from_declared(content_type: Option<&str>, filename: Option<&str>) -> Option<MediaType> {
        let by_type = content_type
            .map(|ct| ct.trim().to_ascii_lowercase())
            .and_then(|ct| match ct.split(';').next().unwrap_or("").trim() {
                "application/pdf" => Some(MediaType::Pdf),
                "image/png" => Some(MediaType::Png),
                "image/jpeg" | "image/jpg" => Some(MediaType::Jpeg),
                _ => None,
            });
        if by_type.is_some() {
            return by_type;
        }

        let ext = filename?.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(MediaType::Pdf),
            "png" => Some(MediaType::Png),
            "jpg" | "jpeg" => Some(MediaType::Jpeg),
            _ => None,
        }
    }

    /// The canonical MIME string for this type.
    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::Pdf => "application/pdf",
            MediaType::Png => "image/png",
            MediaType::Jpeg => "image/jpeg",
        }
    }
}

/// One uploaded file, held entirely in memory.
///
/// Nothing is ever written to disk: the bytes travel from the multipart
/// field straight into pdfium or the image decoder.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// User-facing slot name ("File 1", "File 2") used in error messages.
    pub label: String,
    /// Raw upload bytes.
    pub bytes: Vec<u8>,
    /// The declared type driving the rasterisation branch.
    pub media_type: MediaType,
}

impl UploadedFile {
    /// Construct from already-classified parts.
    pub fn new(label: impl Into<String>, bytes: Vec<u8>, media_type: MediaType) -> Self {
        Self {
            label: label.into(),
            bytes,
            media_type,
        }
    }

    /// Classify an upload, rejecting anything that is not PDF, PNG, or JPEG.
    pub fn classify(
        label: impl Into<String>,
        content_type: Option<&str>,
        filename: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<UploadedFile, CompareError> {
        let label = label.into();
        match MediaType::from_declared(content_type, filename) {
            Some(media_type) => {
                debug!(
                    label = %label,
                    media_type = ?media_type,
                    size = bytes.len(),
                    "classified upload"
                );
                Ok(UploadedFile {
                    label,
                    bytes,
                    media_type,
                })
            }
            None => Err(CompareError::UnsupportedMediaType {
                label,
                declared: content_type
                    .filter(|ct| !ct.trim().is_empty())
                    .or(filename)
                    .unwrap_or("unknown")
                    .to_string(),
            }),
        }
    }
}
