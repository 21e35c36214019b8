//! Google Gemini text generation provider.
//!
//! Talks to the Gemini `generateContent` REST endpoint with a single shared
//! `reqwest::Client`. One call per request: retry policy belongs to callers.
//!
//! # Authentication
//!
//! Uses the API key from [`GeminiConfig`], normally read from
//! `GEMINI_API_KEY`, `GOOGLE_GENERATIVE_AI_API_KEY` or `GOOGLE_API_KEY`.
//! A missing key is reported as [`GenerationError::Auth`] at call time so the
//! process can still start and report itself degraded.
//!
//! # Response envelopes
//!
//! Gemini itself answers with `candidates[].content.parts[].text`. Proxies and
//! older SDK bridges in front of it answer with either `{"response": ...}` or
//! a bare `{"text": ...}`. Those three shapes are the closed set this provider
//! accepts; anything else is [`GenerationError::UnknownResponseShape`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::llms::base_llm::{preview, GenerationError, TextGenerator, ERROR_BODY_PREVIEW_CHARS};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Public Gemini API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Settings for [`GeminiClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeminiConfig {
    /// API key; `None` makes every call fail with an auth error.
    pub api_key: Option<String>,
    /// Base URL without trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Optional sampling temperature.
    pub temperature: Option<f64>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            temperature: None,
        }
    }
}

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

/// Gemini implementation of [`TextGenerator`].
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    /// Build the client and its HTTP connection pool.
    pub fn new(config: GeminiConfig) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::Transport(e.without_url().to_string()))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    pub fn has_api_key(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }

    /// Build the generation config object.
    pub fn generation_config(&self) -> Value {
        let mut config = serde_json::Map::new();
        if let Some(temp) = self.config.temperature {
            config.insert("temperature".to_string(), json!(temp));
        }
        Value::Object(config)
    }

    fn build_request_body(&self, prompt: &str) -> Value {
        json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": self.generation_config(),
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, model: &str) -> Result<String, GenerationError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                GenerationError::Auth(
                    "Gemini API key not set. Set GEMINI_API_KEY or GOOGLE_API_KEY.".to_string(),
                )
            })?;

        log::debug!(
            "GeminiClient.generate: model={}, prompt_chars={}",
            model,
            prompt.chars().count()
        );

        let response = self
            .http
            .post(self.endpoint(model))
            .query(&[("key", api_key)])
            .json(&self.build_request_body(prompt))
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::Transport(e.without_url().to_string()))?;

        if !status.is_success() {
            let err = classify_status(status, &body);
            log::warn!("Gemini call failed: model={}, status={}, kind={}", model, status, err.kind());
            return Err(err);
        }

        let json: Value = serde_json::from_str(&body).map_err(|e| {
            GenerationError::UnknownResponseShape(format!(
                "body is not JSON ({}): {}",
                e,
                preview(&body, ERROR_BODY_PREVIEW_CHARS)
            ))
        })?;

        if let Some(error) = json.get("error") {
            return Err(classify_error_object(error));
        }

        resolve_text(&json)
    }

    fn provider(&self) -> &str {
        "gemini"
    }
}

// ---------------------------------------------------------------------------
// Response envelopes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResponseEnvelope {
    GenerateContent { candidates: Vec<Candidate> },
    Wrapped { response: WrappedResponse },
    Plain { text: String },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WrappedResponse {
    Text(String),
    Object { text: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// Resolve generated text out of any recognized response envelope.
pub fn resolve_text(body: &Value) -> Result<String, GenerationError> {
    let envelope: ResponseEnvelope = serde_json::from_value(body.clone()).map_err(|_| {
        GenerationError::UnknownResponseShape(preview(&body.to_string(), ERROR_BODY_PREVIEW_CHARS))
    })?;

    let text = match envelope {
        ResponseEnvelope::GenerateContent { candidates } => {
            let first = candidates.first().ok_or_else(|| {
                GenerationError::UnknownResponseShape("empty candidates array".to_string())
            })?;
            let text: String = first
                .content
                .iter()
                .flat_map(|c| c.parts.iter())
                .filter_map(|p| p.text.as_deref())
                .collect();
            if text.trim().is_empty() {
                return Err(GenerationError::UnknownResponseShape(format!(
                    "candidate carried no text (finishReason={})",
                    first.finish_reason.as_deref().unwrap_or("unknown")
                )));
            }
            text
        }
        ResponseEnvelope::Wrapped { response: WrappedResponse::Text(text) } => text,
        ResponseEnvelope::Wrapped { response: WrappedResponse::Object { text } } => text,
        ResponseEnvelope::Plain { text } => text,
    };

    if text.trim().is_empty() {
        return Err(GenerationError::UnknownResponseShape(
            "response envelope carried empty text".to_string(),
        ));
    }
    Ok(text)
}

// ---------------------------------------------------------------------------
// Error classification
// ---------------------------------------------------------------------------

/// Map a non-success HTTP status (and its body) onto a [`GenerationError`].
pub fn classify_status(status: StatusCode, body: &str) -> GenerationError {
    let detail = format!("HTTP {}: {}", status.as_u16(), preview(body, ERROR_BODY_PREVIEW_CHARS));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerationError::Auth(detail),
        StatusCode::TOO_MANY_REQUESTS => GenerationError::Quota(detail),
        _ if body.contains("RESOURCE_EXHAUSTED") => GenerationError::Quota(detail),
        _ if body.contains("API_KEY_INVALID") || body.contains("PERMISSION_DENIED") => {
            GenerationError::Auth(detail)
        }
        _ => GenerationError::Transport(detail),
    }
}

/// Classify an `{"error": {...}}` object returned with a success status.
fn classify_error_object(error: &Value) -> GenerationError {
    let message = error
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("Unknown Gemini API error")
        .to_string();
    let code = error
        .get("code")
        .and_then(|c| c.as_u64())
        .and_then(|c| u16::try_from(c).ok())
        .and_then(|c| StatusCode::from_u16(c).ok());
    let status_name = error.get("status").and_then(|s| s.as_str()).unwrap_or("");

    match code {
        Some(code) if !code.is_success() => classify_status(code, &format!("{status_name} {message}")),
        _ if status_name == "RESOURCE_EXHAUSTED" => GenerationError::Quota(message),
        _ if status_name == "UNAUTHENTICATED" || status_name == "PERMISSION_DENIED" => {
            GenerationError::Auth(message)
        }
        _ => GenerationError::Transport(message),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query},
        http::StatusCode as AxumStatus,
        routing::post,
        Json, Router,
    };
    use std::collections::HashMap;

    #[test]
    fn test_resolve_generate_content_envelope() {
        let body = json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Hello " }, { "text": "world" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 3 }
        });
        assert_eq!(resolve_text(&body).unwrap(), "Hello world");
    }

    #[test]
    fn test_resolve_wrapped_and_plain_envelopes() {
        assert_eq!(resolve_text(&json!({"response": "plain"})).unwrap(), "plain");
        assert_eq!(resolve_text(&json!({"response": {"text": "nested"}})).unwrap(), "nested");
        assert_eq!(resolve_text(&json!({"text": "bare"})).unwrap(), "bare");
    }

    #[test]
    fn test_unknown_shapes_are_rejected() {
        for body in [
            json!({"output": "nope"}),
            json!({"response": 42}),
            json!(["text"]),
            json!({"candidates": []}),
            json!({"candidates": [{"finishReason": "SAFETY"}]}),
            json!({"text": "   "}),
        ] {
            let err = resolve_text(&body).unwrap_err();
            assert!(
                matches!(err, GenerationError::UnknownResponseShape(_)),
                "expected unknown shape for {body}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_safety_block_mentions_finish_reason() {
        let err = resolve_text(&json!({"candidates": [{"finishReason": "SAFETY"}]})).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(classify_status(StatusCode::UNAUTHORIZED, ""), GenerationError::Auth(_)));
        assert!(matches!(classify_status(StatusCode::FORBIDDEN, ""), GenerationError::Auth(_)));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, ""),
            GenerationError::Quota(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#),
            GenerationError::Quota(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, r#"{"reason":"API_KEY_INVALID"}"#),
            GenerationError::Auth(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE, "down"),
            GenerationError::Transport(_)
        ));
    }

    #[test]
    fn test_classify_error_object() {
        let quota = json!({"code": 429, "message": "slow down", "status": "RESOURCE_EXHAUSTED"});
        assert!(matches!(classify_error_object(&quota), GenerationError::Quota(_)));
        let auth = json!({"message": "bad key", "status": "UNAUTHENTICATED"});
        assert!(matches!(classify_error_object(&auth), GenerationError::Auth(_)));
        let other = json!({"message": "boom"});
        assert!(matches!(classify_error_object(&other), GenerationError::Transport(_)));
    }

    #[test]
    fn test_generation_config_only_sets_temperature_when_configured() {
        let client = GeminiClient::new(GeminiConfig::default()).unwrap();
        assert_eq!(client.generation_config(), json!({}));

        let client = GeminiClient::new(GeminiConfig {
            temperature: Some(0.2),
            ..GeminiConfig::default()
        })
        .unwrap();
        assert_eq!(client.generation_config(), json!({"temperature": 0.2}));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_auth_error() {
        let client = GeminiClient::new(GeminiConfig::default()).unwrap();
        assert!(!client.has_api_key());
        let err = client.generate("hi", "gemini-1.5-flash").await.unwrap_err();
        assert!(matches!(err, GenerationError::Auth(_)));
    }

    /// Serve a stand-in for the Gemini endpoint on an ephemeral port.
    async fn spawn_stub() -> String {
        async fn handler(
            Path(call): Path<String>,
            Query(query): Query<HashMap<String, String>>,
            Json(body): Json<Value>,
        ) -> (AxumStatus, Json<Value>) {
            if query.get("key").map(String::as_str) != Some("good-key") {
                return (
                    AxumStatus::UNAUTHORIZED,
                    Json(json!({"error": {"code": 401, "status": "UNAUTHENTICATED"}})),
                );
            }
            let model = call.trim_end_matches(":generateContent");
            match model {
                "quota-model" => (
                    AxumStatus::TOO_MANY_REQUESTS,
                    Json(json!({"error": {"code": 429, "status": "RESOURCE_EXHAUSTED"}})),
                ),
                "broken-model" => (AxumStatus::INTERNAL_SERVER_ERROR, Json(json!({}))),
                "odd-model" => (AxumStatus::OK, Json(json!({"result": "??"}))),
                _ => {
                    let prompt = body["contents"][0]["parts"][0]["text"]
                        .as_str()
                        .unwrap_or_default()
                        .to_string();
                    (
                        AxumStatus::OK,
                        Json(json!({
                            "candidates": [{
                                "content": { "parts": [{ "text": format!("{model} says {prompt}") }] },
                                "finishReason": "STOP"
                            }]
                        })),
                    )
                }
            }
        }

        let app = Router::new().route("/models/:call", post(handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client_for(base_url: String, key: &str) -> GeminiClient {
        GeminiClient::new(GeminiConfig {
            api_key: Some(key.to_string()),
            base_url,
            timeout: Duration::from_secs(5),
            temperature: None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_round_trip_against_stub() {
        let base = spawn_stub().await;
        let client = client_for(base, "good-key");
        let text = client.generate("ping", "gemini-1.5-flash").await.unwrap();
        assert_eq!(text, "gemini-1.5-flash says ping");
    }

    #[tokio::test]
    async fn test_http_failures_are_classified() {
        let base = spawn_stub().await;

        let bad_key = client_for(base.clone(), "wrong");
        let err = bad_key.generate("ping", "gemini-1.5-flash").await.unwrap_err();
        assert!(matches!(err, GenerationError::Auth(_)), "{err:?}");

        let client = client_for(base, "good-key");
        let err = client.generate("ping", "quota-model").await.unwrap_err();
        assert!(matches!(err, GenerationError::Quota(_)), "{err:?}");

        let err = client.generate("ping", "broken-model").await.unwrap_err();
        assert!(matches!(err, GenerationError::Transport(_)), "{err:?}");

        let err = client.generate("ping", "odd-model").await.unwrap_err();
        assert!(matches!(err, GenerationError::UnknownResponseShape(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport() {
        let client = client_for("http://127.0.0.1:1".to_string(), "good-key");
        let err = client.generate("ping", "gemini-1.5-flash").await.unwrap_err();
        assert!(matches!(err, GenerationError::Transport(_)), "{err:?}");
        assert!(!err.to_string().contains("good-key"));
    }
}
