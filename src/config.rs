//! Configuration types for dashboard comparison.
//!
//! All comparison behaviour is controlled through [`CompareConfig`], built via
//! its [`CompareConfigBuilder`] or loaded from the environment. Keeping every
//! knob in one struct makes it trivial to share across requests and to log the
//! effective settings at startup.
//!
//! # Design choice: builder over constructor
//! The builder lets callers set only what they care about and rely on
//! well-documented defaults for the rest; `from_env` is a thin layer that
//! feeds `DASHCOMPARE_*` variables into the same builder.

use crate::error::CompareError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default Gemini model used for comparisons.
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro-latest";

/// Configuration for a dashboard comparison.
///
/// Built via [`CompareConfig::builder()`], [`CompareConfig::from_env()`], or
/// [`CompareConfig::default()`].
///
/// # Example
/// ```rust
/// use dashcompare::CompareConfig;
///
/// let config = CompareConfig::builder()
///     .model("gemini-1.5-flash-latest")
///     .temperature(0.2)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Gemini model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Sampling temperature, if set. Default: `None` (API default).
    ///
    /// The verdict is prose, not a transcription, so the API default is left
    /// in place unless the operator pins one. Low values make repeated
    /// comparisons of the same pair more reproducible.
    pub temperature: Option<f32>,

    /// Maximum tokens the model may generate, if set. Default: `None`.
    ///
    /// A full six-parameter verdict fits comfortably in the API default.
    /// Setting this too low truncates the verdict mid-sentence, so it is only
    /// worth pinning to cap cost.
    pub max_output_tokens: Option<u32>,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 2000.
    ///
    /// A safety cap on rasterisation. An A0-sized dashboard export could
    /// produce a 13 000 × 18 000 px image and exhaust memory; this field caps
    /// either dimension, scaling the other proportionally. 2000 px keeps
    /// dashboard text legible to the model while the base64 payload stays
    /// well below API upload limits.
    pub max_rendered_pixels: u32,

    /// Per-API-call timeout in seconds, if set. Default: `None`.
    ///
    /// `None` means no client-side deadline: the request waits as long as the
    /// API takes. Comparisons are single-shot with no retry, so a timeout
    /// turns directly into a user-visible failure; set one only when an
    /// upstream proxy would otherwise hold the connection open forever.
    pub api_timeout_secs: Option<u64>,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            max_output_tokens: None,
            max_rendered_pixels: 2000,
            api_timeout_secs: None,
        }
    }
}

impl CompareConfig {
    /// Create a new builder for `CompareConfig`.
    pub fn builder() -> CompareConfigBuilder {
        CompareConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a configuration from `DASHCOMPARE_*` environment variables.
    ///
    /// Recognised variables: `DASHCOMPARE_MODEL`, `DASHCOMPARE_TEMPERATURE`,
    /// `DASHCOMPARE_MAX_TOKENS`, `DASHCOMPARE_MAX_PIXELS`,
    /// `DASHCOMPARE_API_TIMEOUT_SECS`. Unset or unparseable values fall back
    /// to the defaults.
    pub fn from_env() -> Result<CompareConfig, CompareError> {
        let mut builder = Self::builder();
        if let Ok(model) = std::env::var("DASHCOMPARE_MODEL") {
            if !model.trim().is_empty() {
                builder = builder.model(model.trim());
            }
        }
        if let Some(t) = env_parse::<f32>("DASHCOMPARE_TEMPERATURE") {
            builder = builder.temperature(t);
        }
        if let Some(n) = env_parse::<u32>("DASHCOMPARE_MAX_TOKENS") {
            builder = builder.max_output_tokens(n);
        }
        if let Some(px) = env_parse::<u32>("DASHCOMPARE_MAX_PIXELS") {
            builder = builder.max_rendered_pixels(px);
        }
        if let Some(secs) = env_parse::<u64>("DASHCOMPARE_API_TIMEOUT_SECS") {
            builder = builder.api_timeout_secs(secs);
        }
        builder.build()
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Builder for [`CompareConfig`].
#[derive(Debug)]
pub struct CompareConfigBuilder {
    config: CompareConfig,
}

impl CompareConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.config.max_output_tokens = Some(n);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CompareConfig, CompareError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(CompareError::InvalidConfig(
                "Model name must not be empty".into(),
            ));
        }
        if let Some(0) = c.max_output_tokens {
            return Err(CompareError::InvalidConfig(
                "max_output_tokens must be ≥ 1 when set".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Listen address for the web server, read from `DASHCOMPARE_HOST` and
/// `DASHCOMPARE_PORT`. Plain data with no server machinery so that callers
/// embedding the library can still reuse the parsing.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind. Default: "0.0.0.0".
    pub host: String,
    /// TCP port. Default: 3000.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// Read the listen address from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("DASHCOMPARE_HOST")
                .ok()
                .filter(|h| !h.trim().is_empty())
                .unwrap_or(defaults.host),
            port: env_parse("DASHCOMPARE_PORT").unwrap_or(defaults.port),
        }
    }

    /// The `host:port` string handed to the TCP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
