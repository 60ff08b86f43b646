//! The comparison entry point: two uploads in, one verdict out.
//!
//! ## Why strictly sequential?
//!
//! A comparison is one interactive request: render file 1, render file 2,
//! make exactly one model call. The stages could overlap, but the render
//! step is tens of milliseconds against a model call measured in seconds,
//! so sequencing keeps the flow trivially easy to reason about at no
//! perceptible cost. Nothing is cached and nothing is written to disk;
//! re-submitting the same pair repeats the whole pipeline.

use crate::config::CompareConfig;
use crate::error::CompareError;
use crate::gemini::GeminiClient;
use crate::output::{CompareOutput, CompareStats};
use crate::pipeline::{encode, input::UploadedFile, render};
use crate::prompts::COMPARISON_RUBRIC;
use std::time::Instant;
use tracing::{debug, info};

/// Compare two dashboard uploads and return the model's verdict.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `first`, `second` — the uploads, in display order
/// * `client` — a constructed [`GeminiClient`] (the key is checked at call
///   time, not here)
/// * `config` — comparison configuration
///
/// # Errors
/// Any stage failure aborts the whole comparison; there is no partial
/// output. See [`CompareError`] for the taxonomy.
pub async fn compare(
    first: &UploadedFile,
    second: &UploadedFile,
    client: &GeminiClient,
    config: &CompareConfig,
) -> Result<CompareOutput, CompareError> {
    let total_start = Instant::now();
    info!(first = %first.label, second = %second.label, model = %config.model, "starting comparison");

    // ── Step 1: Rasterise both first pages ───────────────────────────────
    let render_start = Instant::now();
    let first_image = render::first_page_image(first, config).await?;
    let second_image = render::first_page_image(second, config).await?;
    let render_ms = render_start.elapsed().as_millis() as u64;
    debug!(
        first_px = format!("{}x{}", first_image.width(), first_image.height()),
        second_px = format!("{}x{}", second_image.width(), second_image.height()),
        render_ms,
        "rasterisation complete"
    );

    // ── Step 2: Encode for the API ───────────────────────────────────────
    let first_page = encode::encode_page(&first_image)?;
    let second_page = encode::encode_page(&second_image)?;

    // ── Step 3: One model call ───────────────────────────────────────────
    let model_start = Instant::now();
    let reply = client
        .generate(COMPARISON_RUBRIC, &first_page, &second_page, config)
        .await?;
    let model_ms = model_start.elapsed().as_millis() as u64;

    let stats = CompareStats {
        render_ms,
        model_ms,
        total_ms: total_start.elapsed().as_millis() as u64,
        prompt_tokens: reply.prompt_tokens,
        completion_tokens: reply.completion_tokens,
    };
    info!(
        verdict_len = reply.text.len(),
        model_ms = stats.model_ms,
        total_ms = stats.total_ms,
        "comparison complete"
    );

    Ok(CompareOutput {
        first: first_page,
        second: second_page,
        // Verbatim: the verdict is the model's prose, not a parsed score.
        verdict: reply.text,
        stats,
    })
}
