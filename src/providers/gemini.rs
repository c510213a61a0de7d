use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::classify::classify_failure;
use super::{GenerateError, GenerateFuture, Generator};
use crate::credential::Credential;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Clone)]
pub struct Gemini {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl Default for Gemini {
    fn default() -> Self {
        Self::new()
    }
}

impl Gemini {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        if !model.trim().is_empty() {
            self.model = model;
        }
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Generator for Gemini {
    fn generate(&self, prompt: &str, credential: &Credential) -> GenerateFuture {
        let client = self.client.clone();
        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        let key = credential.expose().to_string();
        let body = request_body(prompt);
        let model = self.model.clone();
        Box::pin(async move {
            debug!("gemini generateContent (model={})", model);
            let response = client
                .post(&url)
                .header("x-goog-api-key", key)
                .json(&body)
                .send()
                .await
                .map_err(|err| GenerateError::Failed(format!("Gemini request failed: {}", err)))?;

            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            if status.is_success() {
                return extract_text(&text);
            }
            let message = extract_gemini_error(&text).unwrap_or_else(|| text.clone());
            let err = classify_failure(status, &text, message);
            warn!("Gemini API error ({}): {}", status, err);
            Err(err)
        })
    }
}

fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [
            {
                "role": "user",
                "parts": [{"text": prompt}]
            }
        ]
    })
}

fn extract_text(body: &str) -> Result<String, GenerateError> {
    let payload: GeminiResponse = serde_json::from_str(body).map_err(|err| {
        GenerateError::Failed(format!("failed to parse Gemini response JSON: {}", err))
    })?;
    let Some(candidate) = payload.candidates.first() else {
        let reason = payload
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .map(|reason| format!("prompt blocked: {}", reason))
            .unwrap_or_else(|| "no candidate returned from Gemini".to_string());
        return Err(GenerateError::Failed(reason));
    };
    let text = candidate
        .content
        .iter()
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| part.text.as_deref())
        .collect::<String>();
    if text.trim().is_empty() {
        return Err(GenerateError::Failed("Gemini returned no text".to_string()));
    }
    Ok(text)
}

fn extract_gemini_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<GeminiError>,
    }

    #[derive(Deserialize)]
    struct GeminiError {
        message: Option<String>,
        status: Option<String>,
        code: Option<i32>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let error = parsed.error?;
    Some(format_error_parts(
        error.message,
        error.status,
        error.code.map(|value| value.to_string()),
    ))
}

fn format_error_parts(
    message: Option<String>,
    kind: Option<String>,
    code: Option<String>,
) -> String {
    let mut parts = Vec::new();
    if let Some(message) = message
        && !message.trim().is_empty()
    {
        parts.push(message);
    }
    if let Some(kind) = kind
        && !kind.trim().is_empty()
    {
        parts.push(format!("type: {}", kind));
    }
    if let Some(code) = code
        && !code.trim().is_empty()
    {
        parts.push(format!("code: {}", code));
    }
    if parts.is_empty() {
        "unknown error".to_string()
    } else {
        parts.join(" | ")
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct GeminiPromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}
