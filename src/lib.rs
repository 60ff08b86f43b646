//! # dashcompare
//!
//! Compare two dashboard exports (PDF or image) with a multimodal vision
//! model and get a weighted similarity verdict.
//!
//! ## Why this crate?
//!
//! Pixel-diffing two dashboard screenshots answers the wrong question: a
//! one-pixel anti-aliasing shift lights up the whole diff while a changed KPI
//! value barely registers. Instead this crate rasterises the first page of
//! each export and lets a vision model judge them against a fixed six-
//! parameter rubric (text 30 %, numbers 20 %, graphs 20 %, layout/colour/
//! fonts 10 % each), so the verdict tracks what a human reviewer of the
//! dashboards would care about.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload ×2
//!  │
//!  ├─ 1. Input    classify by declared type (PDF / PNG / JPEG)
//!  ├─ 2. Render   rasterise the first page via pdfium (spawn_blocking),
//!  │              or decode the image directly
//!  ├─ 3. Encode   PNG → base64 blob
//!  ├─ 4. Model    one Gemini generateContent call: rubric + both images
//!  └─ 5. Output   the verdict verbatim + render/model timings
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dashcompare::{compare, CompareConfig, GeminiClient, MediaType, UploadedFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CompareConfig::default();
//!     let client = GeminiClient::from_env()?; // reads GEMINI_API_KEY
//!
//!     let a = UploadedFile::new("File 1", std::fs::read("before.pdf")?, MediaType::Pdf);
//!     let b = UploadedFile::new("File 2", std::fs::read("after.pdf")?, MediaType::Pdf);
//!
//!     let output = compare(&a, &b, &client, &config).await?;
//!     println!("{}", output.verdict);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | Embedded web UI, upload API, and the `dashcompare` binary (axum + tower-http) |
//!
//! Disable `server` when using only the library:
//! ```toml
//! dashcompare = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod compare;
pub mod config;
pub mod error;
pub mod gemini;
pub mod output;
pub mod pipeline;
pub mod prompts;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use compare::compare;
pub use config::{CompareConfig, CompareConfigBuilder, ServerConfig, DEFAULT_MODEL};
pub use error::CompareError;
pub use gemini::{GeminiClient, ModelReply};
pub use output::{CompareOutput, CompareStats, EncodedPage};
pub use pipeline::input::{MediaType, UploadedFile};
