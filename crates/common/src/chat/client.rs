//! Generative-language backend abstraction
//!
//! Provides a unified interface over the text generation provider:
//! - Gemini REST API (generateContent + model catalog)
//! - A mock backend for local development and tests

use super::context::{BackendMessage, ChatContext};
use crate::config::GenerativeConfig;
use crate::errors::{AppError, Result};
use crate::metrics::UpstreamTimer;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Service label used in errors and metrics
pub const GENERATIVE_SERVICE: &str = "generative";

/// Default Gemini API base
pub const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Trait for text generation backends
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Send the assembled context and return the reply text
    async fn generate(&self, context: &ChatContext) -> Result<String>;

    /// Fetch the upstream model catalog, unmodified
    async fn list_models(&self) -> Result<serde_json::Value>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Gemini REST client
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default, rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(default, rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct PromptFeedback {
    #[serde(default, rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key,
            model: model.unwrap_or_else(|| "gemini-flash-latest".to_string()),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn models_url(&self) -> String {
        format!("{}/models", self.base_url)
    }

    /// Turn a non-success response into an upstream error, keeping the
    /// backend's own message when it sent one
    async fn upstream_error(response: reqwest::Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        AppError::Upstream {
            service: GENERATIVE_SERVICE.to_string(),
            status: status.as_u16(),
            message: backend_error_message(&body)
                .unwrap_or_else(|| format!("request failed with status {}", status)),
        }
    }
}

/// Build the request body the generateContent endpoint expects
fn request_body(messages: &[BackendMessage]) -> GenerateContentRequest<'_> {
    GenerateContentRequest {
        contents: messages
            .iter()
            .map(|m| Content {
                role: match m.role {
                    super::context::BackendRole::User => "user",
                    super::context::BackendRole::Model => "model",
                },
                parts: [Part { text: &m.text }],
            })
            .collect(),
    }
}

/// Pull `error.message` out of a backend error body
fn backend_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error.message)
        .filter(|m| !m.trim().is_empty())
}

/// Concatenate the text parts of the first candidate
fn reply_text(response: GenerateContentResponse) -> Result<String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(AppError::InvalidUpstreamResponse {
            service: GENERATIVE_SERVICE.to_string(),
            message: format!("prompt was blocked ({})", reason),
        });
    }

    let candidate = response.candidates.into_iter().next().ok_or_else(|| {
        AppError::InvalidUpstreamResponse {
            service: GENERATIVE_SERVICE.to_string(),
            message: "response contained no candidates".to_string(),
        }
    })?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(AppError::InvalidUpstreamResponse {
            service: GENERATIVE_SERVICE.to_string(),
            message: format!(
                "response contained no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ),
        });
    }

    Ok(text)
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate(&self, context: &ChatContext) -> Result<String> {
        let contents = context.contents();
        let timer = UpstreamTimer::start(GENERATIVE_SERVICE, "generate");

        tracing::debug!(
            model = %self.model,
            turns = contents.len(),
            "Sending chat context to generative backend"
        );

        let response = match self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(&contents))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                timer.finish(false);
                return Err(e.into());
            }
        };

        if !response.status().is_success() {
            timer.finish(false);
            return Err(Self::upstream_error(response).await);
        }

        let parsed = response.json::<GenerateContentResponse>().await.map_err(|e| {
            AppError::InvalidUpstreamResponse {
                service: GENERATIVE_SERVICE.to_string(),
                message: format!("failed to parse response: {}", e),
            }
        });
        let result = parsed.and_then(reply_text);
        timer.finish(result.is_ok());
        result
    }

    async fn list_models(&self) -> Result<serde_json::Value> {
        let timer = UpstreamTimer::start(GENERATIVE_SERVICE, "models");

        let response = match self
            .client
            .get(self.models_url())
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                timer.finish(false);
                return Err(e.into());
            }
        };

        if !response.status().is_success() {
            timer.finish(false);
            return Err(Self::upstream_error(response).await);
        }

        let body = response.json::<serde_json::Value>().await;
        timer.finish(body.is_ok());
        Ok(body?)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Mock backend for development and testing
///
/// Replies with a fixed text and records every context it receives.
pub struct MockGenerativeBackend {
    reply: String,
    catalog: serde_json::Value,
    calls: Mutex<Vec<ChatContext>>,
    catalog_calls: Mutex<usize>,
}

impl MockGenerativeBackend {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            catalog: serde_json::json!({ "models": [{ "name": "models/mock" }] }),
            calls: Mutex::new(Vec::new()),
            catalog_calls: Mutex::new(0),
        }
    }

    /// Contexts received so far, oldest first
    pub fn calls(&self) -> Vec<ChatContext> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of catalog requests received
    pub fn catalog_calls(&self) -> usize {
        self.catalog_calls.lock().map(|c| *c).unwrap_or_default()
    }
}

#[async_trait]
impl GenerativeBackend for MockGenerativeBackend {
    async fn generate(&self, context: &ChatContext) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(context.clone());
        }
        Ok(self.reply.clone())
    }

    async fn list_models(&self) -> Result<serde_json::Value> {
        if let Ok(mut count) = self.catalog_calls.lock() {
            *count += 1;
        }
        Ok(self.catalog.clone())
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

/// Create a backend based on configuration.
///
/// Returns `None` when the selected provider needs a credential that is not
/// configured; callers report that as a configuration error per request.
pub fn create_backend(config: &GenerativeConfig) -> Result<Option<Arc<dyn GenerativeBackend>>> {
    match config.provider.as_str() {
        "mock" => Ok(Some(Arc::new(MockGenerativeBackend::new(
            "Waheguru Ji Ka Khalsa, Waheguru Ji Ki Fateh. (mock reply)",
        )))),
        "gemini" => match config.api_key.clone() {
            Some(key) => Ok(Some(Arc::new(GeminiClient::new(
                key,
                Some(config.model.clone()),
                config.api_base.clone(),
                config.timeout(),
            )?))),
            None => {
                tracing::warn!("No generative API key configured; chat and model catalog are disabled");
                Ok(None)
            }
        },
        other => Err(AppError::Configuration {
            message: format!("Unknown generative provider: {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::context::{assemble_context, ChatTurn};

    #[test]
    fn test_request_body_shape() {
        let ctx = assemble_context("What is hukam?", &[ChatTurn::user("hi")], 10);
        let contents = ctx.contents();
        let body = serde_json::to_value(request_body(&contents)).unwrap();

        let items = body["contents"].as_array().unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0]["role"], "user");
        assert_eq!(items[1]["role"], "model");
        assert_eq!(items[3]["parts"][0]["text"], "What is hukam?");
    }

    #[test]
    fn test_reply_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Sat " }, { "text": "Nam" }] },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(reply_text(response).unwrap(), "Sat Nam");
    }

    #[test]
    fn test_reply_without_candidates_is_malformed() {
        let response: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({})).unwrap();
        let err = reply_text(response).unwrap_err();
        assert!(matches!(err, AppError::InvalidUpstreamResponse { .. }));
    }

    #[test]
    fn test_blocked_prompt_is_reported() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap();
        let err = reply_text(response).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_backend_error_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(backend_error_message(body).as_deref(), Some("API key not valid"));
        assert_eq!(backend_error_message("<html>bad gateway</html>"), None);
    }

    #[test]
    fn test_urls() {
        let client = GeminiClient::new(
            "key".into(),
            None,
            Some("http://localhost:9000/v1beta/".into()),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.generate_url(),
            "http://localhost:9000/v1beta/models/gemini-flash-latest:generateContent"
        );
        assert_eq!(client.models_url(), "http://localhost:9000/v1beta/models");
    }

    #[test]
    fn test_create_backend_without_key() {
        let config = GenerativeConfig::default();
        assert!(create_backend(&config).unwrap().is_none());
    }

    #[test]
    fn test_create_backend_unknown_provider() {
        let config = GenerativeConfig {
            provider: "carrier-pigeon".into(),
            ..GenerativeConfig::default()
        };
        assert!(matches!(
            create_backend(&config),
            Err(AppError::Configuration { .. })
        ));
    }

    #[tokio::test]
    async fn test_mock_backend_records_calls() {
        let backend = MockGenerativeBackend::new("reply");
        let ctx = assemble_context("hello", &[], 10);
        assert_eq!(backend.generate(&ctx).await.unwrap(), "reply");
        assert_eq!(backend.calls(), vec![ctx]);
        assert_eq!(backend.catalog_calls(), 0);
    }
}
