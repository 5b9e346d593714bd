//! Optional token reduction over long content.
//!
//! Grounded on `original_source/doc2mcp/compression.py::ContentCompressor`
//! (short-circuit on disabled/too-short input, always-safe failure
//! handling) restructured as an HTTP client over a configurable
//! compression-service endpoint in the teacher's `reqwest::Client` idiom
//! (`ai-agent-rag::searxng_client::SearXNGClient`), except every failure
//! is swallowed into the identity result rather than bailing: the
//! compressor must never raise across the component boundary.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use docsearch_common::ContentCompressionResult;

/// Tuning knobs mirroring `settings.compression`.
#[derive(Debug, Clone)]
pub struct CompressorSettings {
    pub enabled: bool,
    pub min_content_length: usize,
    /// Base URL of the external compression service. `None` disables
    /// compression regardless of `enabled` (no client configured).
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
}

impl Default for CompressorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            min_content_length: 1000,
            endpoint: None,
            api_key: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Serialize)]
struct CompressRequest<'a> {
    input: &'a str,
    aggressiveness: f64,
}

#[derive(Deserialize)]
struct CompressResponse {
    output: String,
    original_input_tokens: u32,
    output_tokens: u32,
}

/// Compresses documentation content to reduce LLM token usage. Always
/// identity-safe: any missing configuration, network failure, or
/// malformed response degrades to returning the input unchanged.
pub struct Compressor {
    settings: CompressorSettings,
    client: Client,
}

impl Compressor {
    pub fn new(settings: CompressorSettings) -> Self {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .unwrap_or_default();
        Self { settings, client }
    }

    /// `true` once an endpoint is configured and compression is enabled
    /// — mirrors `ContentCompressor.is_available`.
    pub fn is_available(&self) -> bool {
        self.settings.enabled && self.settings.endpoint.is_some()
    }

    #[instrument(skip(self, text))]
    pub async fn compress(&self, text: &str, aggressiveness: f64) -> ContentCompressionResult {
        if !self.is_available() || text.len() < self.settings.min_content_length {
            return ContentCompressionResult::identity(text);
        }

        match self.try_compress(text, aggressiveness).await {
            Some(result) => result,
            None => ContentCompressionResult::identity(text),
        }
    }

    async fn try_compress(&self, text: &str, aggressiveness: f64) -> Option<ContentCompressionResult> {
        let endpoint = self.settings.endpoint.as_ref()?;
        let mut request = self.client.post(endpoint).json(&CompressRequest { input: text, aggressiveness });
        if let Some(api_key) = &self.settings.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let parsed: CompressResponse = response.json().await.ok()?;

        let original_tokens = parsed.original_input_tokens;
        let output_tokens = parsed.output_tokens;
        let ratio = if original_tokens > 0 {
            output_tokens as f64 / original_tokens as f64
        } else {
            1.0
        };

        Some(ContentCompressionResult {
            output_text: parsed.output,
            original_tokens,
            output_tokens,
            was_compressed: true,
            ratio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn identity_when_disabled() {
        let compressor = Compressor::new(CompressorSettings {
            enabled: false,
            endpoint: Some("http://unused".to_string()),
            ..CompressorSettings::default()
        });
        let result = compressor.compress(&"x".repeat(5000), 0.4).await;
        assert!(!result.was_compressed);
        assert_eq!(result.output_text.len(), 5000);
    }

    #[tokio::test]
    async fn identity_when_below_min_length() {
        let compressor = Compressor::new(CompressorSettings {
            endpoint: Some("http://unused".to_string()),
            min_content_length: 1000,
            ..CompressorSettings::default()
        });
        let result = compressor.compress("short text", 0.4).await;
        assert!(!result.was_compressed);
    }

    #[tokio::test]
    async fn identity_when_no_endpoint_configured() {
        let compressor = Compressor::new(CompressorSettings::default());
        let result = compressor.compress(&"x".repeat(5000), 0.4).await;
        assert!(!result.was_compressed);
    }

    #[tokio::test]
    async fn compresses_via_configured_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "output": "short",
                "original_input_tokens": 100,
                "output_tokens": 40,
            })))
            .mount(&server)
            .await;

        let compressor = Compressor::new(CompressorSettings {
            endpoint: Some(server.uri()),
            min_content_length: 10,
            ..CompressorSettings::default()
        });
        let result = compressor.compress(&"x".repeat(5000), 0.4).await;
        assert!(result.was_compressed);
        assert_eq!(result.output_text, "short");
        assert_eq!(result.ratio, 0.4);
    }

    #[tokio::test]
    async fn identity_on_service_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let compressor = Compressor::new(CompressorSettings {
            endpoint: Some(server.uri()),
            min_content_length: 10,
            ..CompressorSettings::default()
        });
        let long_text = "x".repeat(5000);
        let result = compressor.compress(&long_text, 0.4).await;
        assert!(!result.was_compressed);
        assert_eq!(result.output_text, long_text);
    }
}
