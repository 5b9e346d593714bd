//! Shared value types passed across component boundaries.
//!
//! These are plain data, copied by value between `docsearch-fetch`,
//! `docsearch-cache`, `docsearch-urlindex`, `docsearch-llmclient` and
//! `docsearch-engine`. None of them own I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// An outbound link discovered on a fetched page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Link {
    pub url: String,
    pub text: String,
}

/// The result of fetching and parsing one page. Produced by the fetcher,
/// has no side effects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResult {
    pub url: String,
    pub title: String,
    pub content: String,
    pub links: Vec<Link>,
}

/// A page persisted in the page cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedPage {
    pub url: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub links: Vec<Link>,
    pub fetched_at: DateTime<Utc>,
    pub domain: String,
}

/// First 16 hex characters of SHA-256(url). The cache key.
pub fn cache_key(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// A condensed cache listing entry, as returned by `get_index`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheIndexEntry {
    pub url: String,
    pub title: String,
    pub summary: String,
}

/// One URL discovered by sitemap parsing or BFS crawl, with scoring metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedUrl {
    pub url: String,
    pub path_segments: Vec<String>,
    pub title_hint: String,
    pub keywords: Vec<String>,
    pub depth: u32,
    pub priority: f64,
    pub changefreq: Option<String>,
}

/// How a [`DomainIndex`] was built.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IndexSourceType {
    Sitemap,
    Crawl,
}

/// The persisted per-domain URL index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainIndex {
    pub domain: String,
    pub indexed_at: DateTime<Utc>,
    pub sitemap_url: Option<String>,
    pub source_type: IndexSourceType,
    pub urls: Vec<IndexedUrl>,
    pub url_count: usize,
}

impl DomainIndex {
    pub fn new(domain: String, sitemap_url: Option<String>, source_type: IndexSourceType, urls: Vec<IndexedUrl>) -> Self {
        let url_count = urls.len();
        Self {
            domain,
            indexed_at: Utc::now(),
            sitemap_url,
            source_type,
            urls,
            url_count,
        }
    }
}

/// Summary statistics for a domain's index, as returned by `stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainIndexStats {
    pub domain: String,
    pub indexed_at: DateTime<Utc>,
    pub source_type: IndexSourceType,
    pub url_count: usize,
}

/// A scored candidate URL, transient per query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlMatch {
    pub url: String,
    pub title_hint: String,
    pub score: f64,
    pub reasons: Vec<String>,
}

/// Output of the compressor. Identity when compression did not happen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentCompressionResult {
    pub output_text: String,
    pub original_tokens: u32,
    pub output_tokens: u32,
    pub was_compressed: bool,
    pub ratio: f64,
}

impl ContentCompressionResult {
    pub fn identity(text: &str) -> Self {
        Self {
            output_text: text.to_string(),
            original_tokens: 0,
            output_tokens: 0,
            was_compressed: false,
            ratio: 1.0,
        }
    }
}

/// A link the navigator recommends exploring next.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedLink {
    pub url: String,
    pub reason: String,
}

/// JSON-shaped decision produced by the navigator for one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigatorDecision {
    pub has_sufficient_info: bool,
    pub relevant_content: String,
    pub summary: String,
    #[serde(default)]
    pub links_to_explore: Vec<SuggestedLink>,
}

impl NavigatorDecision {
    /// Used on any parse or network failure from the LLM call.
    pub fn safe_default(fallback_summary: impl Into<String>) -> Self {
        Self {
            has_sufficient_info: false,
            relevant_content: String::new(),
            summary: fallback_summary.into(),
            links_to_explore: Vec::new(),
        }
    }
}

/// Raw response shape from an [`crate::LlmClient`] implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub tokens_in: Option<u32>,
    pub tokens_out: Option<u32>,
    pub model: Option<String>,
}

/// Identity + description of a configured tool, for listing and
/// "tool not found" error payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Final result of a `search()` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub content: String,
    pub sources: Vec<String>,
    pub pages_explored: usize,
    pub sitemap_used: bool,
    pub sitemap_candidates: usize,
    pub tool: ToolInfo,
}

/// The structured error payload returned for an unknown tool id, or a
/// failed synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchError {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_tools: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_16_hex_chars() {
        let key = cache_key("https://docs.example.com/install");
        assert_eq!(key.len(), 16);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn cache_key_is_deterministic() {
        assert_eq!(cache_key("https://a.example.com/x"), cache_key("https://a.example.com/x"));
        assert_ne!(cache_key("https://a.example.com/x"), cache_key("https://a.example.com/y"));
    }
}
