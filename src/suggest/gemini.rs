//! Gemini `generateContent` client.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::suggest::error::SuggestionError;
use crate::suggest::requester::VisionModel;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData {
        #[serde(alias = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineData {
    #[serde(alias = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// One user turn: the prompt text, then the image if any.
    pub fn user_turn(prompt: &str, image_png: Option<&[u8]>, json_output: bool) -> Self {
        let mut parts = vec![Part::Text {
            text: prompt.to_string(),
        }];
        if let Some(png) = image_png {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: "image/png".to_string(),
                    data: BASE64_STANDARD.encode(png),
                },
            });
        }
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: json_output.then(|| GenerationConfig {
                temperature: Some(0.2),
                response_mime_type: Some("application/json".to_string()),
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                Part::InlineData { .. } => None,
            })
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiError {
    pub error: GeminiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiErrorDetail {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

/// Extract the model's text from a successful response body.
///
/// A candidate stopped early (e.g. `SAFETY`) carries no text; its finish
/// reason goes into the error so the report's status has a cause in the logs.
pub fn response_text(body: &str) -> Result<String, SuggestionError> {
    let parsed: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| SuggestionError::Parse(format!("unexpected response envelope: {}", e)))?;
    if let Some(text) = parsed.text() {
        return Ok(text);
    }

    let reason = parsed
        .candidates
        .first()
        .and_then(|c| c.finish_reason.as_deref())
        .unwrap_or("no candidates");
    warn!(finish_reason = reason, "model returned no text");
    Err(SuggestionError::Parse(format!(
        "response contained no text (finish reason: {})",
        reason
    )))
}

/// Classify a non-success response body.
pub fn classify_failure(status: u16, body: &str) -> SuggestionError {
    match serde_json::from_str::<GeminiError>(body) {
        Ok(e) => SuggestionError::from_http(status, Some(e.error.status.as_str()), e.error.message),
        Err(_) => SuggestionError::from_http(status, None, body.trim().to_string()),
    }
}

// ============================================================================
// Backend
// ============================================================================

#[derive(Debug, Clone)]
pub struct GeminiOptions {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

pub struct GeminiBackend {
    client: reqwest::blocking::Client,
    options: GeminiOptions,
}

impl GeminiBackend {
    pub fn new(options: GeminiOptions) -> Result<Self, SuggestionError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| SuggestionError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, options })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.options.endpoint.trim_end_matches('/'),
            self.options.model
        )
    }

    fn send(&self, request: &GenerateContentRequest) -> Result<String, SuggestionError> {
        debug!(model = %self.options.model, "gemini generateContent");

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.options.api_key)
            .json(request)
            .send()
            .map_err(|e| SuggestionError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| SuggestionError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), &body));
        }

        response_text(&body)
    }
}

impl VisionModel for GeminiBackend {
    fn model_name(&self) -> &str {
        &self.options.model
    }

    fn generate(&self, prompt: &str, image_png: Option<&[u8]>) -> Result<String, SuggestionError> {
        let request = GenerateContentRequest::user_turn(prompt, image_png, image_png.is_some());
        self.send(&request)
    }
}
