//! The terminal synthesis pass. Grounded on
//! `original_source/doc2mcp/agents/doc_search.py::_synthesize_answer`
//! for the join format, the 100,000-char truncation cap, and the light
//! synthesis-aggressiveness compression pass.

use docsearch_compress::Compressor;
use docsearch_llmclient::{GenerateRequest, LlmClient, LlmError};
use tracing::instrument;

const COMBINED_TRUNCATE_CHARS: usize = 100_000;
const TRUNCATION_MARKER: &str = "\n\n[Content truncated...]";

pub fn system_instruction() -> &'static str {
    "You are a documentation search assistant. Read the provided documentation excerpts \
from multiple sources and synthesize a comprehensive answer to the user's query.\n\n\
Preserve code blocks and API signatures exactly as given. Reference which source each \
claim comes from. If the documentation doesn't fully answer the query, say what's missing. \
Do not invent facts — only use what is in the provided excerpts."
}

/// One excerpt collected during exploration, keyed by its source URL
/// (or the literal markers `[cached]`/`[local]` the engine uses).
pub struct Excerpt {
    pub url: String,
    pub content: String,
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

fn join_excerpts(excerpts: &[Excerpt]) -> String {
    let combined = excerpts
        .iter()
        .map(|excerpt| format!("## Source: {}\n\n{}", excerpt.url, excerpt.content))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");
    truncate_chars(&combined, COMBINED_TRUNCATE_CHARS).to_string()
}

/// Join, truncate, compress, and synthesize a final answer from
/// accumulated excerpts. Returns `LlmError` on synthesis failure —
/// unlike navigation, this is the one per-query failure the caller
/// sees.
#[instrument(skip(llm, compressor, excerpts), fields(excerpt_count = excerpts.len()))]
pub async fn synthesize(
    llm: &dyn LlmClient,
    compressor: &Compressor,
    query: &str,
    excerpts: &[Excerpt],
    synthesis_aggressiveness: f64,
) -> Result<String, LlmError> {
    let combined = join_excerpts(excerpts);
    let compressed = compressor.compress(&combined, synthesis_aggressiveness).await;

    let prompt = format!(
        "Query: {query}\n\nDocumentation excerpts found:\n\n{content}\n\n\
Please synthesize a comprehensive answer to the query using the documentation above. \
Include code examples if available.",
        query = query,
        content = compressed.output_text,
    );

    let request = GenerateRequest::new(prompt).with_system(system_instruction()).with_max_tokens(8192);
    let response = llm.generate(request).await?;
    Ok(response.text)
}

/// Truncate the synthesizer's output to `max_content_length` characters,
/// appending [`TRUNCATION_MARKER`] when truncation occurs.
pub fn enforce_output_cap(content: String, max_content_length: usize) -> String {
    if content.chars().count() <= max_content_length {
        return content;
    }
    let mut truncated = truncate_chars(&content, max_content_length).to_string();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docsearch_compress::CompressorSettings;

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

    #[tokio::test]
    async fn synthesizes_from_excerpts() {
        let llm = FixedLlm("Install by running `cargo install foo`.".to_string());
        let compressor = Compressor::new(CompressorSettings::default());
        let excerpts = vec![Excerpt { url: "https://docs.example.com/install".to_string(), content: "Run cargo install foo.".to_string() }];
        let answer = synthesize(&llm, &compressor, "how do I install", &excerpts, 0.3).await.unwrap();
        assert_eq!(answer, "Install by running `cargo install foo`.");
    }

    #[test]
    fn join_excerpts_uses_source_headers() {
        let excerpts = vec![
            Excerpt { url: "https://a".to_string(), content: "A content".to_string() },
            Excerpt { url: "https://b".to_string(), content: "B content".to_string() },
        ];
        let joined = join_excerpts(&excerpts);
        assert!(joined.contains("## Source: https://a"));
        assert!(joined.contains("---"));
        assert!(joined.contains("## Source: https://b"));
    }

    #[test]
    fn enforce_output_cap_appends_marker_when_truncated() {
        let content = "x".repeat(120);
        let result = enforce_output_cap(content, 100);
        assert!(result.len() <= 100 + TRUNCATION_MARKER.len());
        assert!(result.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn enforce_output_cap_leaves_short_content_untouched() {
        let content = "short".to_string();
        let result = enforce_output_cap(content.clone(), 100);
        assert_eq!(result, content);
    }
}
