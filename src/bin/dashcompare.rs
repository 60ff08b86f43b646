//! dashcompare server binary.
//!
//! Configuration is environment-only (optionally via a local `.env` file):
//!
//! ```text
//! GEMINI_API_KEY                 model credentials (checked per comparison)
//! GEMINI_API_BASE                endpoint override, mainly for tests
//! DASHCOMPARE_HOST / _PORT       listen address (default 0.0.0.0:3000)
//! DASHCOMPARE_MODEL              model id (default gemini-1.5-pro-latest)
//! DASHCOMPARE_TEMPERATURE        sampling temperature (default: API default)
//! DASHCOMPARE_MAX_TOKENS         output token cap (default: API default)
//! DASHCOMPARE_MAX_PIXELS         render cap per edge (default 2000)
//! DASHCOMPARE_API_TIMEOUT_SECS   per-call timeout (default: none)
//! PDFIUM_LIB_PATH                directory containing libpdfium
//! ```

use anyhow::Context;
use dashcompare::server::{serve, AppState};
use dashcompare::{CompareConfig, GeminiClient, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dashcompare=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let server_config = ServerConfig::from_env();
    let compare_config = CompareConfig::from_env().context("invalid comparison configuration")?;
    let client = GeminiClient::from_env().context("failed to build the Gemini client")?;

    tracing::info!(
        model = %compare_config.model,
        "starting dashcompare v{}",
        env!("CARGO_PKG_VERSION")
    );
    if !client.has_api_key() {
        // Startup proceeds anyway: the key is only needed once a comparison
        // is actually triggered, and the upload page works without one.
        tracing::warn!(
            "GEMINI_API_KEY is not set; comparisons will fail until it is provided"
        );
    }

    let listener = tokio::net::TcpListener::bind(server_config.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", server_config.bind_addr()))?;
    tracing::info!("listening on http://{}", listener.local_addr()?);

    serve(listener, AppState::new(client, compare_config))
        .await
        .context("server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}
