//! Pipeline stages for dashboard comparison.
//!
//! One transformation per submodule, so each stage can be unit-tested with
//! plain byte fixtures and the rendering backend could change without the
//! neighbouring stages noticing.
//!
//! ## Data Flow
//!
//! ```text
//! input ───▶ render ───▶ encode
//! (classify)  (pdfium /   (base64
//!             decoder)     PNG)
//! ```
//!
//! 1. [`input`]  — classify each upload by its declared type (PDF, PNG, JPEG)
//! 2. [`render`] — rasterise the first page; PDFs run in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`encode`] — turn the rendered pixels into the base64 PNG blob the
//!    model request embeds
//!
//! Both uploads travel the same three stages; the model call itself lives in
//! [`crate::gemini`] and the sequencing in [`crate::compare`].

pub mod encode;
pub mod input;
pub mod render;
