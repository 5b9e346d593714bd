//! The per-page navigate decision. Grounded on
//! `original_source/doc2mcp/agents/doc_search.py::_analyze_page` for the
//! exact truncation length, link-list cap, and safe-default fallback,
//! using `docsearch-compress`/`docsearch-llmclient` in place of the
//! original's inline compressor/LLM calls.

use docsearch_common::{FetchResult, NavigatorDecision};
use docsearch_compress::Compressor;
use docsearch_llmclient::{GenerateRequest, LlmClient};
use tracing::instrument;

const CONTENT_TRUNCATE_CHARS: usize = 50_000;
const MAX_LINKS_SHOWN: usize = 50;

pub fn system_instruction() -> &'static str {
    "You are a documentation research assistant. Analyze documentation pages and decide \
how to navigate to find relevant information.\n\n\
Respond with a JSON object of this exact shape:\n\
{\"has_sufficient_info\": boolean, \"relevant_content\": string, \"summary\": string, \
\"links_to_explore\": [{\"url\": string, \"reason\": string}]}\n\n\
Guidelines:\n\
- Be conservative with has_sufficient_info: only true if the query is fully answered.\n\
- Extract only directly relevant content, not the whole page.\n\
- Suggest at most three links, most promising first.\n\
- If the page isn't relevant, return empty relevant_content and suggest better links."
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

fn build_prompt(query: &str, fetch_result: &FetchResult, compressed_content: &str) -> String {
    let links_text: String = fetch_result
        .links
        .iter()
        .take(MAX_LINKS_SHOWN)
        .map(|link| format!("- [{}]({})", link.text, link.url))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Query: {query}\n\n\
Current page: {url}\n\
Title: {title}\n\n\
Page content:\n{content}\n\n\
Available links on this page:\n{links}\n\n\
Analyze this page and respond with a JSON object.",
        query = query,
        url = fetch_result.url,
        title = fetch_result.title,
        content = compressed_content,
        links = links_text,
    )
}

/// Produce a [`NavigatorDecision`] for one fetched page. Any LLM or
/// parse failure degrades to the safe default.
#[instrument(skip(llm, compressor, fetch_result), fields(url = %fetch_result.url))]
pub async fn analyze(
    llm: &dyn LlmClient,
    compressor: &Compressor,
    query: &str,
    fetch_result: &FetchResult,
    analysis_aggressiveness: f64,
) -> NavigatorDecision {
    let truncated = truncate_chars(&fetch_result.content, CONTENT_TRUNCATE_CHARS);
    let compressed = compressor.compress(truncated, analysis_aggressiveness).await;

    let prompt = build_prompt(query, fetch_result, &compressed.output_text);

    let request = GenerateRequest::new(prompt)
        .with_system(system_instruction())
        .with_max_tokens(4096)
        .with_json_mode(true);

    match llm.generate(request).await {
        Ok(response) => parse_decision(&response.text, &fetch_result.title),
        Err(_) => NavigatorDecision::safe_default(fetch_result.title.clone()),
    }
}

fn parse_decision(text: &str, fallback_title: &str) -> NavigatorDecision {
    serde_json::from_str(text).unwrap_or_else(|_| NavigatorDecision::safe_default(fallback_title.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docsearch_common::Link;
    use docsearch_compress::CompressorSettings;
    use docsearch_llmclient::LlmError;

    struct FixedLlm(String);

    #[async_trait]
    impl LlmClient for FixedLlm {
        async fn generate(&self, _req: GenerateRequest) -> Result<docsearch_common::LlmResponse, LlmError> {
            Ok(docsearch_common::LlmResponse { text: self.0.clone(), tokens_in: None, tokens_out: None, model: None })
        }
        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn generate(&self, _req: GenerateRequest) -> Result<docsearch_common::LlmResponse, LlmError> {
            Err(LlmError::MissingCredentials("test"))
        }
        fn name(&self) -> &str {
            "failing"
        }
    }

    fn sample_page() -> FetchResult {
        FetchResult {
            url: "https://docs.example.com/install".to_string(),
            title: "Install Guide".to_string(),
            content: "Run `cargo install foo` to install.".to_string(),
            links: vec![Link { url: "https://docs.example.com/api".to_string(), text: "API".to_string() }],
        }
    }

    #[tokio::test]
    async fn parses_well_formed_json_decision() {
        let llm = FixedLlm(
            r#"{"has_sufficient_info": true, "relevant_content": "Run cargo install foo.", "summary": "Install guide", "links_to_explore": []}"#
                .to_string(),
        );
        let compressor = Compressor::new(CompressorSettings::default());
        let decision = analyze(&llm, &compressor, "how to install", &sample_page(), 0.4).await;
        assert!(decision.has_sufficient_info);
        assert_eq!(decision.summary, "Install guide");
    }

    #[tokio::test]
    async fn malformed_json_falls_back_to_safe_default() {
        let llm = FixedLlm("not json at all".to_string());
        let compressor = Compressor::new(CompressorSettings::default());
        let decision = analyze(&llm, &compressor, "how to install", &sample_page(), 0.4).await;
        assert!(!decision.has_sufficient_info);
        assert_eq!(decision.relevant_content, "");
        assert_eq!(decision.summary, "Install Guide");
    }

    #[tokio::test]
    async fn llm_failure_falls_back_to_safe_default() {
        let compressor = Compressor::new(CompressorSettings::default());
        let decision = analyze(&FailingLlm, &compressor, "how to install", &sample_page(), 0.4).await;
        assert!(!decision.has_sufficient_info);
        assert_eq!(decision.summary, "Install Guide");
    }

    #[test]
    fn truncate_chars_respects_char_boundaries() {
        let text = "hello world";
        assert_eq!(truncate_chars(text, 5), "hello");
        assert_eq!(truncate_chars(text, 100), "hello world");
    }
}
