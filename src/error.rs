//! Error types for the dashcompare library.
//!
//! A comparison is all-or-nothing: there is no partial output, so a single
//! error enum covers the whole pipeline. Variants are grouped by the stage
//! that raises them, which is also how the HTTP layer maps them to status
//! codes (upload and document problems are the caller's fault, model-side
//! problems are the upstream service's, everything else is ours).
//!
//! Display strings are written for end users. The web UI shows them verbatim,
//! so they name the offending file by its upload slot ("File 1", "File 2")
//! rather than by an internal field name.

use thiserror::Error;

/// All errors returned by the dashcompare library.
#[derive(Debug, Error)]
pub enum CompareError {
    // ── Upload errors ─────────────────────────────────────────────────────
    /// Fewer than two files were supplied.
    #[error("Please upload both PDF files for comparison.")]
    MissingUpload,

    /// The multipart request body could not be read.
    #[error("Could not read the upload request: {detail}")]
    UploadRead { detail: String },

    /// The declared content type and the filename extension both failed to
    /// identify the file as PDF, PNG, or JPEG.
    #[error("{label} has an unsupported file type '{declared}'.\nAllowed: pdf, png, jpg, jpeg.")]
    UnsupportedMediaType { label: String, declared: String },

    // ── Document errors ───────────────────────────────────────────────────
    /// The bytes could not be opened as a PDF document.
    #[error("{label} is not a valid PDF document: {detail}")]
    CorruptDocument { label: String, detail: String },

    /// The document opened but contains no pages to render.
    #[error("{label} is a PDF with no pages; there is nothing to compare.")]
    EmptyDocument { label: String },

    /// pdfium returned an error while rendering the first page.
    #[error("Rasterisation of the first page of {label} failed: {detail}")]
    RasterisationFailed { label: String, detail: String },

    /// A PNG or JPEG upload could not be decoded.
    #[error("{label} could not be decoded as an image: {source}")]
    ImageDecode {
        label: String,
        #[source]
        source: image::ImageError,
    },

    /// Re-encoding a rendered page as PNG failed.
    #[error("Failed to encode the rendered page as PNG: {source}")]
    ImageEncode {
        #[source]
        source: image::ImageError,
    },

    // ── Model API errors ──────────────────────────────────────────────────
    /// No API key was available when the comparison was invoked.
    #[error(
        "GEMINI_API_KEY is not set.\n\
Export it or add it to a .env file, then retry the comparison."
    )]
    ApiKeyMissing,

    /// The Gemini API rejected the credentials (HTTP 401/403).
    #[error("Authentication with the Gemini API failed (HTTP {status}): {detail}")]
    ApiAuth { status: u16, detail: String },

    /// The Gemini API returned any other non-success status.
    #[error("Gemini API error (HTTP {status}): {detail}")]
    ApiError { status: u16, detail: String },

    /// The API call exceeded the configured request timeout.
    #[error("Gemini API call timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    /// The request never completed: DNS, TLS, connection reset.
    #[error("Could not reach the Gemini API: {source}")]
    ApiTransport {
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not the expected generateContent JSON.
    #[error("Could not parse the Gemini API response: {detail}")]
    MalformedModelResponse { detail: String },

    /// HTTP 200, valid JSON, but no comparison text inside.
    #[error("The model returned no comparison text (finish reason: {finish_reason})")]
    EmptyModelResponse { finish_reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
The pdfium shared library must be available at runtime.\n\
  • Set PDFIUM_LIB_PATH=/path/to/dir containing libpdfium.\n\
  • Or place libpdfium next to the binary.\n\
  • Or install pdfium as a system library.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CompareError {
    /// True when the failure originated in the hosted model service rather
    /// than in the uploads or in this process.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            CompareError::ApiAuth { .. }
                | CompareError::ApiError { .. }
                | CompareError::ApiTimeout { .. }
                | CompareError::ApiTransport { .. }
                | CompareError::MalformedModelResponse { .. }
                | CompareError::EmptyModelResponse { .. }
        )
    }
}
