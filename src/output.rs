//! Output types for a completed comparison.

use serde::{Deserialize, Serialize};

/// A rendered first page, PNG-encoded and base64-wrapped for the model API.
///
/// The pixel dimensions are kept so callers can display or log what was
/// actually sent without decoding the payload again.
#[derive(Debug, Clone)]
pub struct EncodedPage {
    /// Width of the rendered image in pixels.
    pub width: u32,
    /// Height of the rendered image in pixels.
    pub height: u32,
    /// Base64-encoded PNG bytes (standard alphabet, padded).
    pub base64: String,
}

impl EncodedPage {
    /// MIME type of the encoded payload. Always PNG: uploads that arrive as
    /// JPEG are decoded and re-encoded so the model sees one format.
    pub fn mime_type(&self) -> &'static str {
        "image/png"
    }

    /// `data:` URI for direct embedding in an `<img>` tag.
    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", self.base64)
    }
}

/// Result of comparing two dashboard uploads.
#[derive(Debug, Clone)]
pub struct CompareOutput {
    /// First upload, rendered and encoded as sent to the model.
    pub first: EncodedPage,
    /// Second upload, rendered and encoded as sent to the model.
    pub second: EncodedPage,
    /// The model's verdict, verbatim. No parsing, no reformatting: the
    /// per-parameter scores and the weighted overall score are whatever
    /// prose the model produced.
    pub verdict: String,
    /// Timing and token accounting for this comparison.
    pub stats: CompareStats,
}

/// Timing and token statistics for one comparison.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompareStats {
    /// Milliseconds spent rasterising and decoding both uploads.
    pub render_ms: u64,
    /// Milliseconds spent in the model API call.
    pub model_ms: u64,
    /// End-to-end milliseconds for the comparison.
    pub total_ms: u64,
    /// Prompt tokens reported by the API, when present.
    pub prompt_tokens: Option<u64>,
    /// Completion tokens reported by the API, when present.
    pub completion_tokens: Option<u64>,
}
