//! Text-generation collaborator: prompt in, completion text out.
//!
//! The analyzer only depends on [`TextCompletion`]; [`GeminiClient`] is the
//! production implementation over the Generative Language REST API.

use crate::data::http::{HttpClient, HttpError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("API key not set (expected environment variable {0})")]
    MissingApiKey(String),

    #[error("model returned no text")]
    EmptyResponse,

    #[error("unreadable model response: {0}")]
    Malformed(String),
}

impl CompletionError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, CompletionError::Http(e) if e.is_connectivity())
    }
}

/// Black-box text completion. No schema guarantees on the returned text.
pub trait TextCompletion: Send + Sync {
    fn complete(&self, model: &str, prompt: &str) -> Result<String, CompletionError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

pub struct GeminiClient {
    http: HttpClient,
    api_key: String,
}

impl GeminiClient {
    pub fn new(http: HttpClient, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
        }
    }

    /// Read the API key from the named environment variable.
    pub fn from_env(http: HttpClient, var: &str) -> Result<Self, CompletionError> {
        let key = std::env::var(var)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| CompletionError::MissingApiKey(var.to_string()))?;
        Ok(Self::new(http, key))
    }

    /// `models/gemini-2.5-flash` and `gemini-2.5-flash` address the same model.
    fn endpoint(model: &str) -> String {
        let model = model.trim();
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{GEMINI_BASE_URL}/models/{model}:generateContent")
    }

    fn extract_text(body: &str) -> Result<String, CompletionError> {
        let resp: GenerateResponse =
            serde_json::from_str(body).map_err(|e| CompletionError::Malformed(e.to_string()))?;
        let text: String = resp
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(CompletionError::EmptyResponse);
        }
        Ok(text)
    }
}

impl TextCompletion for GeminiClient {
    fn complete(&self, model: &str, prompt: &str) -> Result<String, CompletionError> {
        let url = Self::endpoint(model);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        info!(model, prompt_chars = prompt.chars().count(), "requesting completion");
        let body = self.http.send(&url, || {
            self.http
                .client()
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&request)
        })?;
        Self::extract_text(&body)
    }
}
