//! Client for the upstream model's `generateContent` endpoint.
//!
//! Everything above this module talks to [`ModelClient`], so tests and the
//! offline demo feed can stand in for the network.

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::http_client::http_client;
use crate::state::Sport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPurpose {
    Fixtures { sport: Sport, date: String },
    BookingCode { code: String },
    Analysis { sport: Sport, match_query: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub grounding: bool,
    pub thinking_budget: Option<u32>,
    pub purpose: RequestPurpose,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub text: String,
    /// Raw `groundingChunks` entries, shape owned by the upstream.
    pub grounding_chunks: Vec<Value>,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model api key not configured")]
    MissingApiKey,
    #[error("model request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model returned http {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed model envelope: {0}")]
    Malformed(String),
}

impl ModelError {
    /// Rate limited or temporarily unavailable.
    pub fn is_capacity(&self) -> bool {
        matches!(self, ModelError::Status { status: 429 | 503, .. })
    }
}

pub trait ModelClient: Send + Sync {
    fn generate(&self, request: &GenerateRequest) -> Result<ModelResponse, ModelError>;
}

/// Runs `primary`; when it fails with an error matching `should_fallback`,
/// runs `secondary` once. Any other error, or a second failure, is returned.
pub fn with_tier_fallback<T, P, S, F>(
    primary: P,
    secondary: S,
    should_fallback: F,
) -> Result<T, ModelError>
where
    P: FnOnce() -> Result<T, ModelError>,
    S: FnOnce() -> Result<T, ModelError>,
    F: Fn(&ModelError) -> bool,
{
    match primary() {
        Ok(value) => Ok(value),
        Err(err) if should_fallback(&err) => {
            warn!(error = %err, "primary model tier unavailable, retrying on fallback tier");
            secondary()
        }
        Err(err) => Err(err),
    }
}

pub struct GeminiClient {
    api_key: String,
    base_url: String,
    http: &'static Client,
}

impl GeminiClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .context("GEMINI_API_KEY is not set")?;
        let http = http_client(config.request_timeout)?;
        Ok(Self {
            api_key,
            base_url: config.base_url.clone(),
            http,
        })
    }
}

impl ModelClient for GeminiClient {
    fn generate(&self, request: &GenerateRequest) -> Result<ModelResponse, ModelError> {
        if self.api_key.is_empty() {
            return Err(ModelError::MissingApiKey);
        }
        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);
        debug!(model = %request.model, grounding = request.grounding, "generateContent");

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateBody::from_request(request))
            .send()?;
        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        parse_generate_reply(&body)
    }
}

fn status_error(status: StatusCode, body: &str) -> ModelError {
    let message = serde_json::from_str::<ErrorReply>(body)
        .ok()
        .and_then(|reply| reply.error)
        .map(|err| err.message)
        .filter(|msg| !msg.is_empty())
        .unwrap_or_else(|| body.chars().take(200).collect());
    ModelError::Status {
        status: status.as_u16(),
        message,
    }
}

pub fn parse_generate_reply(body: &str) -> Result<ModelResponse, ModelError> {
    let reply: GenerateReply =
        serde_json::from_str(body).map_err(|err| ModelError::Malformed(err.to_string()))?;
    let Some(candidate) = reply.candidates.into_iter().next() else {
        return Err(ModelError::Malformed("no candidates".to_string()));
    };
    let text = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter(|part| !part.thought)
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    let grounding_chunks = candidate
        .grounding_metadata
        .map(|meta| meta.grounding_chunks)
        .unwrap_or_default();
    Ok(ModelResponse {
        text,
        grounding_chunks,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl<'a> GenerateBody<'a> {
    fn from_request(request: &'a GenerateRequest) -> Self {
        let tools = if request.grounding {
            vec![Tool {
                google_search: GoogleSearch {},
            }]
        } else {
            Vec::new()
        };
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            tools,
            generation_config: request.thinking_budget.map(|budget| GenerationConfig {
                thinking_config: ThinkingConfig {
                    thinking_budget: budget,
                },
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Debug, Deserialize)]
struct ReplyPart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorReply {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;

    use super::*;

    fn status(code: u16) -> ModelError {
        ModelError::Status {
            status: code,
            message: "x".to_string(),
        }
    }

    #[test]
    fn capacity_errors_are_429_and_503() {
        assert!(status(429).is_capacity());
        assert!(status(503).is_capacity());
        assert!(!status(500).is_capacity());
        assert!(!ModelError::MissingApiKey.is_capacity());
    }

    #[test]
    fn fallback_runs_only_on_matching_error() {
        let secondary_calls = Cell::new(0);
        let out = with_tier_fallback(
            || Err::<u8, _>(status(429)),
            || {
                secondary_calls.set(secondary_calls.get() + 1);
                Ok(7)
            },
            ModelError::is_capacity,
        );
        assert_eq!(out.unwrap(), 7);
        assert_eq!(secondary_calls.get(), 1);

        let out = with_tier_fallback(
            || Err::<u8, _>(status(400)),
            || {
                secondary_calls.set(secondary_calls.get() + 1);
                Ok(7)
            },
            ModelError::is_capacity,
        );
        assert!(matches!(out, Err(ModelError::Status { status: 400, .. })));
        assert_eq!(secondary_calls.get(), 1);
    }

    #[test]
    fn second_failure_is_returned() {
        let out = with_tier_fallback(
            || Err::<u8, _>(status(503)),
            || Err(status(429)),
            ModelError::is_capacity,
        );
        assert!(matches!(out, Err(ModelError::Status { status: 429, .. })));
    }

    #[test]
    fn request_body_shape() {
        let request = GenerateRequest {
            model: "m".to_string(),
            prompt: "hello".to_string(),
            grounding: true,
            thinking_budget: Some(512),
            purpose: RequestPurpose::Analysis {
                sport: Sport::Football,
                match_query: "A vs B".to_string(),
            },
        };
        let body = serde_json::to_value(GenerateBody::from_request(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{"role": "user", "parts": [{"text": "hello"}]}],
                "tools": [{"googleSearch": {}}],
                "generationConfig": {"thinkingConfig": {"thinkingBudget": 512}}
            })
        );

        let plain = GenerateRequest {
            grounding: false,
            thinking_budget: None,
            ..request
        };
        let body = serde_json::to_value(GenerateBody::from_request(&plain)).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn reply_joins_text_parts_and_keeps_chunks() {
        let body = json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "thinking...", "thought": true},
                    {"text": "```json\n{\"a\":"},
                    {"text": " 1}\n```"}
                ]},
                "groundingMetadata": {"groundingChunks": [{"web": {"uri": "https://a", "title": "A"}}]}
            }]
        })
        .to_string();
        let reply = parse_generate_reply(&body).unwrap();
        assert_eq!(reply.text, "```json\n{\"a\": 1}\n```");
        assert_eq!(reply.grounding_chunks.len(), 1);
    }

    #[test]
    fn empty_candidates_is_malformed() {
        assert!(matches!(
            parse_generate_reply("{\"candidates\": []}"),
            Err(ModelError::Malformed(_))
        ));
    }

    #[test]
    fn status_error_prefers_upstream_message() {
        let body = r#"{"error": {"code": 429, "message": "Resource exhausted", "status": "RESOURCE_EXHAUSTED"}}"#;
        let err = status_error(StatusCode::TOO_MANY_REQUESTS, body);
        assert!(err.is_capacity());
        assert_eq!(err.to_string(), "model returned http 429: Resource exhausted");
    }
}
