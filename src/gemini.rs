//! Gemini API client: send the rubric plus two page images, return the
//! verdict text.
//!
//! This module speaks the `generateContent` REST endpoint directly with
//! reqwest rather than going through a provider-abstraction crate. The call
//! shape is fixed (one user turn, one text part, exactly two inline images)
//! and a hand-rolled client keeps the wire format in one screenful of code.
//!
//! ## Call discipline
//!
//! Exactly one API call per comparison, no retry, no backoff. A comparison
//! is interactive: the user is watching, and a transparent failure they can
//! re-trigger beats a silent half-minute of retries. By default there is no
//! client-side timeout either; [`crate::config::CompareConfig::api_timeout_secs`]
//! adds one per request when set.

use crate::config::CompareConfig;
use crate::error::CompareError;
use crate::output::EncodedPage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Hosted endpoint for the Gemini API.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Client for the Gemini `generateContent` endpoint.
///
/// Construct once and share; the underlying `reqwest::Client` pools
/// connections. The key may be empty at construction time: it is checked
/// when a call is made, so the server can start without credentials and
/// fail only the comparisons that actually need them.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiClient {
    /// Create a client with an explicit API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self, CompareError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| CompareError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE.to_string(),
        })
    }

    /// Create a client from the environment.
    ///
    /// `GEMINI_API_KEY` supplies the key (may be absent; calls will then fail
    /// with [`CompareError::ApiKeyMissing`]). `GEMINI_API_BASE` overrides the
    /// endpoint, which is how tests point the client at a local stand-in.
    pub fn from_env() -> Result<Self, CompareError> {
        let key = std::env::var("GEMINI_API_KEY").unwrap_or_default();
        let mut client = Self::new(key)?;
        if let Ok(base) = std::env::var("GEMINI_API_BASE") {
            if !base.trim().is_empty() {
                client = client.with_base_url(base.trim());
            }
        }
        Ok(client)
    }

    /// Override the API base URL (scheme + host, no trailing slash).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether a non-empty API key is configured.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Send the rubric and both page images, returning the model's reply.
    ///
    /// The request is a single user turn whose parts are the prompt text
    /// followed by the two images in upload order. Order matters: the rubric
    /// refers to differences "between these two images" and the model sees
    /// them in the order the user uploaded them.
    pub async fn generate(
        &self,
        prompt: &str,
        first: &EncodedPage,
        second: &EncodedPage,
        config: &CompareConfig,
    ) -> Result<ModelReply, CompareError> {
        if !self.has_api_key() {
            return Err(CompareError::ApiKeyMissing);
        }

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text { text: prompt },
                    Part::inline(first),
                    Part::inline(second),
                ],
            }],
            generation_config: GenerationConfig::from_config(config),
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, config.model
        );
        debug!(model = %config.model, url = %url, "calling generateContent");

        let mut builder = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request);
        if let Some(secs) = config.api_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                CompareError::ApiTimeout {
                    secs: config.api_timeout_secs.unwrap_or(0),
                }
            } else {
                CompareError::ApiTransport { source: e }
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CompareError::ApiTransport { source: e })?;

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(CompareError::ApiAuth {
                status: status.as_u16(),
                detail: truncate_detail(&body),
            });
        }
        if !status.is_success() {
            return Err(CompareError::ApiError {
                status: status.as_u16(),
                detail: truncate_detail(&body),
            });
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| CompareError::MalformedModelResponse {
                detail: e.to_string(),
            })?;

        extract_reply(parsed)
    }
}

/// The model's reply plus token accounting when the API reports it.
#[derive(Debug, Clone)]
pub struct ModelReply {
    /// Verdict text, exactly as returned (multi-part replies concatenated).
    pub text: String,
    /// Prompt tokens from `usageMetadata`, when present.
    pub prompt_tokens: Option<u64>,
    /// Completion tokens from `usageMetadata`, when present.
    pub completion_tokens: Option<u64>,
}

fn extract_reply(response: GenerateContentResponse) -> Result<ModelReply, CompareError> {
    let usage = response.usage_metadata;
    let candidate = response.candidates.into_iter().next();
    let finish_reason = candidate
        .as_ref()
        .and_then(|c| c.finish_reason.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let text: String = candidate
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        warn!(finish_reason = %finish_reason, "model reply contained no text");
        return Err(CompareError::EmptyModelResponse { finish_reason });
    }

    Ok(ModelReply {
        text,
        prompt_tokens: usage.as_ref().and_then(|u| u.prompt_token_count),
        completion_tokens: usage.as_ref().and_then(|u| u.candidates_token_count),
    })
}

/// Cap error-body details so a misbehaving proxy cannot flood logs or the UI.
fn truncate_detail(body: &str) -> String {
    const MAX: usize = 600;
    let trimmed = body.trim();
    if trimmed.len() <= MAX {
        trimmed.to_string()
    } else {
        let mut end = MAX;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &trimmed[..end])
    }
}

// ── Wire types ───────────────────────────────────────────────────────────
// Field names follow the REST API's canonical camelCase JSON.

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: Blob<'a>,
    },
}

impl<'a> Part<'a> {
    fn inline(page: &'a EncodedPage) -> Part<'a> {
        Part::Inline {
            inline_data: Blob {
                mime_type: page.mime_type(),
                data: &page.base64,
            },
        }
    }
}

#[derive(Serialize)]
struct Blob<'a> {
    #[serde(rename = "mimeType")]
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    /// `None` when no knob is set, so the field is omitted from the request
    /// and the API applies its own defaults.
    fn from_config(config: &CompareConfig) -> Option<GenerationConfig> {
        if config.temperature.is_none() && config.max_output_tokens.is_none() {
            return None;
        }
        Some(GenerationConfig {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<u64>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<u64>,
}
