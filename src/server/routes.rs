//! HTTP handlers: the upload page, the comparison API, and health.

use axum::extract::{Multipart, State};
use axum::response::Html;
use axum::Json;
use serde::Serialize;
use tracing::{debug, warn};

use crate::compare::compare;
use crate::error::CompareError;
use crate::output::{CompareStats, EncodedPage};
use crate::pipeline::input::UploadedFile;
use crate::server::AppState;

/// The single-page upload UI, embedded at compile time so the binary is
/// self-contained.
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// One rendered upload as displayed by the UI.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    caption: String,
    width: u32,
    height: u32,
    /// `data:image/png;base64,…` ready for an `<img src>`.
    data_uri: String,
}

impl PageView {
    fn new(caption: &str, page: &EncodedPage) -> Self {
        Self {
            caption: caption.to_string(),
            width: page.width,
            height: page.height,
            data_uri: page.data_uri(),
        }
    }
}

/// Response body for a successful comparison.
#[derive(Serialize)]
pub struct CompareResponse {
    pub first: PageView,
    pub second: PageView,
    /// The model's verdict, verbatim.
    pub verdict: String,
    pub stats: CompareStats,
}

/// POST /api/compare — accept two uploads, run the pipeline, return the
/// verdict.
///
/// Expects multipart fields `file1` and `file2`. Requests are handled
/// independently; nothing is shared between comparisons except the model
/// client, so concurrent users cannot see each other's uploads.
pub async fn compare_uploads(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CompareResponse>, CompareError> {
    let mut first: Option<UploadedFile> = None;
    let mut second: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CompareError::UploadRead {
            detail: e.to_string(),
        })?
    {
        let name = field.name().unwrap_or("").to_string();
        let filename = field.file_name().map(|s| s.to_string());
        let content_type = field.content_type().map(|s| s.to_string());

        let (slot, label) = match name.as_str() {
            "file1" => (&mut first, "File 1"),
            "file2" => (&mut second, "File 2"),
            other => {
                warn!(field = %other, "ignoring unknown multipart field");
                continue;
            }
        };

        let data = field.bytes().await.map_err(|e| CompareError::UploadRead {
            detail: e.to_string(),
        })?;

        // A form submitted with an empty picker produces a zero-byte part
        // with no filename. Treat it as "nothing uploaded" for that slot.
        if data.is_empty() && filename.as_deref().unwrap_or("").is_empty() {
            continue;
        }

        debug!(
            field = %name,
            filename = ?filename,
            content_type = ?content_type,
            size = data.len(),
            "received upload"
        );

        *slot = Some(UploadedFile::classify(
            label,
            content_type.as_deref(),
            filename.as_deref(),
            data.to_vec(),
        )?);
    }

    // Both slots must be filled before any rendering or model work starts.
    let (first, second) = match (first, second) {
        (Some(f), Some(s)) => (f, s),
        _ => return Err(CompareError::MissingUpload),
    };

    let output = compare(&first, &second, state.client(), state.config()).await?;

    Ok(Json(CompareResponse {
        first: PageView::new("PDF 1 - Dashboard", &output.first),
        second: PageView::new("PDF 2 - Dashboard", &output.second),
        verdict: output.verdict,
        stats: output.stats,
    }))
}
