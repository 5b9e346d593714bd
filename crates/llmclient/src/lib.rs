//! The provider-agnostic LLM client interface.
//!
//! The concrete Gemini/OpenAI/local provider bindings are an external
//! collaborator; this crate owns the seam itself: the `LlmClient`
//! trait, one concrete HTTP-JSON implementation usable
//! against any provider exposing that shape, and a `NullLlmClient` for
//! tests and credential-free construction. Grounded on
//! `original_source/doc2mcp/llm/base.py` (`LLMProvider.generate`) for the
//! method shape and `original_source/doc2mcp/llm/gemini.py` for the
//! `json_response` -> response-format-hint translation, restructured in
//! the teacher's `ai-agent-common::llm::EmbeddingClient` idiom (a small
//! struct wrapping one concrete HTTP backend behind a trait boundary).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use docsearch_common::LlmResponse;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM credentials missing: {0}")]
    MissingCredentials(&'static str),

    #[error("LLM request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("LLM response was not valid JSON: {0}")]
    InvalidResponse(String),
}

/// A single `generate` request.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    pub system_instruction: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Signals that the response must be valid JSON. Providers that
    /// support a response-format hint should use it; the caller always
    /// gets a schema-tolerant parser regardless.
    pub json_mode: bool,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_instruction: None,
            max_tokens: 4096,
            temperature: 0.1,
            json_mode: false,
        }
    }

    pub fn with_system(mut self, system_instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(system_instruction.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }
}

/// Provider-agnostic generation operation. Implementations are
/// interchangeable; selection is a configuration concern.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<LlmResponse, LlmError>;

    fn name(&self) -> &str;
}

#[derive(Serialize)]
struct HttpGenerateBody<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<&'a str>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<&'static str>,
}

#[derive(Deserialize)]
struct HttpGenerateResponse {
    text: String,
    #[serde(default)]
    tokens_in: Option<u32>,
    #[serde(default)]
    tokens_out: Option<u32>,
}

/// Generic HTTP+JSON client usable against any provider exposing a
/// `POST {endpoint} -> {text, tokens_in?, tokens_out?}` contract, with a
/// bearer-token `api_key` and a `response_format` hint sent when
/// `json_mode` is requested.
pub struct HttpJsonLlmClient {
    endpoint: String,
    api_key: String,
    model: String,
    client: Client,
}

impl HttpJsonLlmClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = api_key.ok_or(LlmError::MissingCredentials("LLM API key"))?;
        Ok(Self {
            endpoint: endpoint.into(),
            api_key,
            model: model.into(),
            client: Client::new(),
        })
    }
}

#[async_trait]
impl LlmClient for HttpJsonLlmClient {
    #[instrument(skip(self, request), fields(model = %self.model, json_mode = request.json_mode))]
    async fn generate(&self, request: GenerateRequest) -> Result<LlmResponse, LlmError> {
        let body = HttpGenerateBody {
            prompt: &request.prompt,
            system_instruction: request.system_instruction.as_deref(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: request.json_mode.then_some("json"),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let parsed: HttpGenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(LlmResponse {
            text: parsed.text,
            tokens_in: parsed.tokens_in,
            tokens_out: parsed.tokens_out,
            model: Some(self.model.clone()),
        })
    }

    fn name(&self) -> &str {
        "http-json"
    }
}

/// Canned client for tests and offline construction: always returns the
/// fixed `text` it was built with.
pub struct NullLlmClient {
    text: String,
}

impl NullLlmClient {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl LlmClient for NullLlmClient {
    async fn generate(&self, _request: GenerateRequest) -> Result<LlmResponse, LlmError> {
        Ok(LlmResponse {
            text: self.text.clone(),
            tokens_in: None,
            tokens_out: None,
            model: Some("null".to_string()),
        })
    }

    fn name(&self) -> &str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn http_client_requires_api_key() {
        let result = HttpJsonLlmClient::new("http://unused", None, "test-model");
        assert!(matches!(result, Err(LlmError::MissingCredentials(_))));
    }

    #[tokio::test]
    async fn http_client_generates_from_configured_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "text": "{\"has_sufficient_info\": false}",
                "tokens_in": 120,
                "tokens_out": 40,
            })))
            .mount(&server)
            .await;

        let client = HttpJsonLlmClient::new(server.uri(), Some("key".to_string()), "test-model").unwrap();
        let response = client
            .generate(GenerateRequest::new("analyze this page").with_json_mode(true))
            .await
            .unwrap();

        assert_eq!(response.tokens_in, Some(120));
        assert_eq!(response.model.as_deref(), Some("test-model"));
    }

    #[tokio::test]
    async fn null_client_returns_fixed_text() {
        let client = NullLlmClient::new("canned answer");
        let response = client.generate(GenerateRequest::new("anything")).await.unwrap();
        assert_eq!(response.text, "canned answer");
    }
}
