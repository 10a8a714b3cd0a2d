use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::error::{Error, ErrorKind, Result};

/// One structured-output request to a generative-text service.
#[derive(Debug, Clone)]
pub struct GenerateRequest<'a> {
    pub api_key: &'a str,
    pub model: &'a str,
    pub prompt: &'a str,
    pub schema: &'a Value,
}

/// Service that answers a prompt with JSON text matching a schema.
pub trait GenerativeBackend: Send + Sync {
    fn generate_json(&self, request: &GenerateRequest<'_>) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Concatenated text parts of the first candidate.
pub fn extract_candidate_text(body: &str) -> Result<String> {
    let response: GenerateResponse = serde_json::from_str(body)?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(Error::new(ErrorKind::ServiceFailure, "Empty response"));
    }
    Ok(text)
}

/// Gemini REST backend (`models/{model}:generateContent`).
pub struct GeminiBackend {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl GeminiBackend {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(GeminiBackend {
            client,
            endpoint: endpoint.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, model)
    }
}

impl GenerativeBackend for GeminiBackend {
    fn generate_json(&self, request: &GenerateRequest<'_>) -> Result<String> {
        let body = json!({
            "contents": [{ "parts": [{ "text": request.prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": request.schema,
            },
        });

        let response = self
            .client
            .post(self.url(request.model))
            .header("x-goog-api-key", request.api_key)
            .json(&body)
            .send()?
            .error_for_status()?;

        extract_candidate_text(&response.text()?)
    }
}
