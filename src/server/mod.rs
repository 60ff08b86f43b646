//! The web layer: a single-page upload UI plus a JSON comparison API.
//!
//! Everything here is feature-gated behind `server`. The library pipeline
//! stays usable without axum for callers embedding comparison in their own
//! service.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::CompareConfig;
use crate::error::CompareError;
use crate::gemini::GeminiClient;

pub mod routes;

/// Upload cap per request body. Two dashboard exports fit in a fraction of
/// this; the cap exists so a stray upload cannot exhaust memory.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared application state: one model client and one config for the
/// process lifetime.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    client: GeminiClient,
    config: CompareConfig,
}

impl AppState {
    pub fn new(client: GeminiClient, config: CompareConfig) -> Self {
        Self {
            inner: Arc::new(AppStateInner { client, config }),
        }
    }

    pub fn client(&self) -> &GeminiClient {
        &self.inner.client
    }

    pub fn config(&self) -> &CompareConfig {
        &self.inner.config
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .route("/api/compare", post(routes::compare_uploads))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve the router on an already-bound listener until shutdown.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}

/// Error response body returned by every failing endpoint.
#[derive(serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for CompareError {
    fn into_response(self) -> Response {
        let (status, kind) = status_for(&self);

        // User-caused and upstream failures keep their Display text, which is
        // written for the UI. Internal faults are masked and logged instead.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR
            && !matches!(self, CompareError::ApiKeyMissing)
        {
            tracing::error!(error = %self, "comparison failed");
            "An internal error occurred".to_string()
        } else {
            if self.is_upstream() {
                tracing::warn!(error = %self, "model call failed");
            }
            self.to_string()
        };

        let details = if cfg!(debug_assertions) {
            Some(format!("{:?}", self))
        } else {
            None
        };

        (
            status,
            Json(ErrorResponse {
                error: kind.to_string(),
                message,
                details,
            }),
        )
            .into_response()
    }
}

fn status_for(err: &CompareError) -> (StatusCode, &'static str) {
    match err {
        CompareError::MissingUpload => (StatusCode::BAD_REQUEST, "missing_input"),
        CompareError::UploadRead { .. } => (StatusCode::BAD_REQUEST, "bad_upload"),
        CompareError::UnsupportedMediaType { .. } => {
            (StatusCode::BAD_REQUEST, "unsupported_media_type")
        }
        CompareError::CorruptDocument { .. } => (StatusCode::BAD_REQUEST, "corrupt_document"),
        CompareError::EmptyDocument { .. } => (StatusCode::BAD_REQUEST, "empty_document"),
        CompareError::RasterisationFailed { .. } => {
            (StatusCode::BAD_REQUEST, "rasterisation_failed")
        }
        CompareError::ImageDecode { .. } => (StatusCode::BAD_REQUEST, "image_decode"),
        CompareError::ApiKeyMissing => (StatusCode::INTERNAL_SERVER_ERROR, "api_key_missing"),
        CompareError::ApiAuth { .. } => (StatusCode::BAD_GATEWAY, "model_auth"),
        CompareError::ApiError { .. } => (StatusCode::BAD_GATEWAY, "model_error"),
        CompareError::ApiTimeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "model_timeout"),
        CompareError::ApiTransport { .. } => (StatusCode::BAD_GATEWAY, "model_unreachable"),
        CompareError::MalformedModelResponse { .. } | CompareError::EmptyModelResponse { .. } => {
            (StatusCode::BAD_GATEWAY, "model_response")
        }
        CompareError::ImageEncode { .. }
        | CompareError::InvalidConfig(_)
        | CompareError::PdfiumBindingFailed(_)
        | CompareError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_map_to_400() {
        for err in [
            CompareError::MissingUpload,
            CompareError::UnsupportedMediaType {
                label: "File 1".into(),
                declared: "image/gif".into(),
            },
            CompareError::EmptyDocument {
                label: "File 2".into(),
            },
        ] {
            assert_eq!(status_for(&err).0, StatusCode::BAD_REQUEST, "{err}");
        }
    }

    #[test]
    fn upstream_errors_map_to_gateway_statuses() {
        assert_eq!(
            status_for(&CompareError::ApiError {
                status: 500,
                detail: "x".into()
            })
            .0,
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&CompareError::ApiTimeout { secs: 10 }).0,
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn missing_key_is_a_server_error_with_its_own_kind() {
        let (status, kind) = status_for(&CompareError::ApiKeyMissing);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(kind, "api_key_missing");
    }
}
