//! Orchestrates the fetch, navigate, and synthesize stages into the
//! bounded, LLM-steered crawl. One `SearchEngine` is constructed per
//! process and shared across concurrent `search()` calls; `PageCache`
//! and `DomainIndexer` carry their own internal mutual exclusion.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info_span, instrument, Instrument};
use url::Url;

use docsearch_cache::PageCache;
use docsearch_common::{CachedPage, Config, FetchResult, SearchError, SearchOutcome, Source, ToolInfo};
use docsearch_compress::Compressor;
use docsearch_fetch::{Fetcher, Selectors};
use docsearch_llmclient::LlmClient;
use docsearch_urlindex::DomainIndexer;

use crate::frontier::Frontier;
use crate::navigator;
use crate::synthesizer::{self, Excerpt};

const CACHED_EXCERPT_CHARS: usize = 5_000;

/// Shared collaborators a `SearchEngine` is built from. Grouped into one
/// struct so construction reads like the teacher's
/// `WebCrawlerRetriever::new(qdrant, redis, embedder, config)` — every
/// dependency named, nothing hidden behind a default.
pub struct SearchEngineDeps {
    pub config: Config,
    pub cache: PageCache,
    pub indexer: DomainIndexer,
    pub fetcher: Fetcher,
    pub compressor: Compressor,
    pub llm: Arc<dyn LlmClient>,
    pub max_pages: usize,
}

/// Either a successful answer, a structured "tool not found" payload, a
/// synthesis failure carrying whatever sources were gathered, or a
/// cancellation.
pub enum SearchOutput {
    Found(SearchOutcome),
    NotFound(SearchError),
    SynthesisFailed(SearchError),
    Cancelled,
}

pub struct SearchEngine {
    deps: SearchEngineDeps,
}

impl SearchEngine {
    pub fn new(deps: SearchEngineDeps) -> Self {
        Self { deps }
    }

    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.deps
            .config
            .tools
            .iter()
            .map(|(id, tool)| ToolInfo { id: id.clone(), name: tool.name.clone(), description: tool.description.clone() })
            .collect()
    }

    pub fn cache(&self) -> &PageCache {
        &self.deps.cache
    }

    pub fn indexer(&self) -> &DomainIndexer {
        &self.deps.indexer
    }

    #[instrument(skip(self, cancel), fields(tool_id, query))]
    pub async fn search(&self, tool_id: &str, query: &str, cancel: CancellationToken) -> SearchOutput {
        let Some(tool_config) = self.deps.config.tools.get(tool_id).cloned() else {
            let available: Vec<String> = self.deps.config.tools.keys().cloned().collect();
            return SearchOutput::NotFound(SearchError {
                error: format!("Tool '{tool_id}' not found"),
                available_tools: Some(available),
                sources: None,
            });
        };

        let web_sources: Vec<docsearch_common::WebSource> = tool_config
            .sources
            .iter()
            .filter_map(|s| match s {
                Source::Web(w) => Some(w.clone()),
                Source::Local(_) => None,
            })
            .collect();
        let local_sources: Vec<docsearch_common::LocalSource> = tool_config
            .sources
            .iter()
            .filter_map(|s| match s {
                Source::Local(l) => Some(l.clone()),
                Source::Web(_) => None,
            })
            .collect();

        let mut domains: Vec<String> = Vec::new();
        for web in &web_sources {
            if let Some(domain) = domain_of(&web.url) {
                if !domains.contains(&domain) {
                    domains.push(domain);
                }
            }
        }

        let mut visited: HashSet<String> = HashSet::new();
        let mut sources: Vec<String> = Vec::new();
        let mut collected: Vec<Excerpt> = Vec::new();

        self.prime_from_cache(query, &domains, &mut visited, &mut sources, &mut collected).await;

        let mut frontier = Frontier::new();
        let (sitemap_used, sitemap_candidates) = self
            .prime_candidates(query, &web_sources, &mut visited, &mut sources, &mut frontier)
            .await;

        for web in &web_sources {
            frontier.push(web.url.clone(), 10);
        }

        let mut pages_explored = 0usize;
        let mut has_sufficient = false;
        let mut cancelled = false;

        while !frontier.is_empty() && pages_explored < self.deps.max_pages && !has_sufficient {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let Some(url) = frontier.pop() else { break };
            if visited.contains(&url) {
                continue;
            }
            visited.insert(url.clone());
            pages_explored += 1;

            let cached_page = self.deps.cache.get(&url).await;
            let fetch_result = match &cached_page {
                Some(page) => Some(from_cached_page(page)),
                None => {
                    let base_domain = domains.first().map(String::as_str);
                    let selectors = selectors_for(&web_sources, &url);
                    match run_cancellable(&cancel, self.deps.fetcher.fetch(&url, base_domain, selectors.as_ref())).await {
                        None => {
                            cancelled = true;
                            break;
                        }
                        Some(Ok(result)) => Some(result),
                        Some(Err(_)) => None,
                    }
                }
            };

            let Some(fetch_result) = fetch_result else {
                continue;
            };

            let analysis_aggressiveness = self.deps.config.settings.compression.analysis_aggressiveness;
            let decision = match run_cancellable(
                &cancel,
                navigator::analyze(self.deps.llm.as_ref(), &self.deps.compressor, query, &fetch_result, analysis_aggressiveness)
                    .instrument(info_span!("navigate", url = %url)),
            )
            .await
            {
                None => {
                    cancelled = true;
                    break;
                }
                Some(decision) => decision,
            };

            if cached_page.is_none() && !fetch_result.content.is_empty() {
                let domain = domains.first().cloned().unwrap_or_else(|| domain_of(&url).unwrap_or_default());
                let _ = self
                    .deps
                    .cache
                    .put(&url, &fetch_result.title, &decision.summary, &fetch_result.content, fetch_result.links.clone(), &domain)
                    .await;
            }

            if !decision.relevant_content.is_empty() {
                collected.push(Excerpt { url: url.clone(), content: decision.relevant_content.clone() });
                sources.push(url.clone());
            }

            if decision.has_sufficient_info {
                has_sufficient = true;
                break;
            }

            for (i, link) in decision.links_to_explore.iter().enumerate() {
                if !visited.contains(&link.url) {
                    frontier.push(link.url.clone(), pages_explored as i64 * 10 + i as i64);
                }
            }
        }

        if let Some(local_content) = fold_in_local_sources(&local_sources).await {
            collected.push(Excerpt { url: "[local]".to_string(), content: local_content });
            sources.push("[local sources]".to_string());
        }

        if collected.is_empty() {
            if cancelled {
                return SearchOutput::Cancelled;
            }
            return SearchOutput::Found(SearchOutcome {
                content: "No relevant documentation found.".to_string(),
                sources,
                pages_explored,
                sitemap_used,
                sitemap_candidates,
                tool: tool_info(tool_id, &tool_config),
            });
        }

        let synthesis_aggressiveness = self.deps.config.settings.compression.synthesis_aggressiveness;
        let synthesis = run_cancellable(
            &cancel,
            synthesizer::synthesize(self.deps.llm.as_ref(), &self.deps.compressor, query, &collected, synthesis_aggressiveness),
        )
        .await;

        match synthesis {
            None => SearchOutput::Cancelled,
            Some(Err(_)) => SearchOutput::SynthesisFailed(SearchError {
                error: "synthesis failed".to_string(),
                available_tools: None,
                sources: Some(sources),
            }),
            Some(Ok(content)) => {
                let content = synthesizer::enforce_output_cap(content, self.deps.config.settings.max_content_length);
                SearchOutput::Found(SearchOutcome {
                    content,
                    sources,
                    pages_explored,
                    sitemap_used,
                    sitemap_candidates,
                    tool: tool_info(tool_id, &tool_config),
                })
            }
        }
    }

    async fn prime_from_cache(
        &self,
        query: &str,
        domains: &[String],
        visited: &mut HashSet<String>,
        sources: &mut Vec<String>,
        collected: &mut Vec<Excerpt>,
    ) {
        for domain in domains {
            let cached = self.deps.cache.find_similar(query, Some(domain)).await;
            for page in cached.into_iter().take(3) {
                if visited.insert(page.url.clone()) {
                    let truncated = truncate_chars(&page.content, CACHED_EXCERPT_CHARS).to_string();
                    collected.push(Excerpt { url: page.url.clone(), content: truncated });
                    sources.push(format!("[cached] {}", page.url));
                }
            }
        }
    }

    async fn prime_candidates(
        &self,
        query: &str,
        web_sources: &[docsearch_common::WebSource],
        visited: &HashSet<String>,
        sources: &mut Vec<String>,
        frontier: &mut Frontier,
    ) -> (bool, usize) {
        if !self.deps.config.settings.sitemap_index.enabled {
            return (false, 0);
        }

        let settings = &self.deps.config.settings.sitemap_index;
        let mut sitemap_used = false;
        let mut sitemap_candidates = 0usize;

        for web in web_sources {
            let Some(domain) = domain_of(&web.url) else { continue };
            if self.deps.indexer.ensure_indexed(&domain, Some(&web.url)).await.is_err() {
                continue;
            }

            let matches = self.deps.indexer.find_relevant(query, &domain, settings.max_url_candidates).await;
            for m in matches {
                if m.score < settings.min_match_score || visited.contains(&m.url) {
                    continue;
                }
                let priority = ((10.0 - m.score).floor() as i64).clamp(0, 9);
                frontier.push(m.url.clone(), priority);
                sources.push(format!("[sitemap-match] {}", m.url));
                sitemap_used = true;
                sitemap_candidates += 1;
            }
        }

        (sitemap_used, sitemap_candidates)
    }
}

fn tool_info(tool_id: &str, tool_config: &docsearch_common::ToolConfig) -> ToolInfo {
    ToolInfo { id: tool_id.to_string(), name: tool_config.name.clone(), description: tool_config.description.clone() }
}

fn from_cached_page(page: &CachedPage) -> FetchResult {
    FetchResult { url: page.url.clone(), title: page.title.clone(), content: page.content.clone(), links: page.links.clone() }
}

fn selectors_for(web_sources: &[docsearch_common::WebSource], url: &str) -> Option<Selectors> {
    let domain = domain_of(url)?;
    web_sources.iter().find_map(|w| {
        if domain_of(&w.url).as_deref() == Some(domain.as_str()) {
            w.selectors.as_ref().map(|s| Selectors { content: s.content.clone(), exclude: s.exclude.clone() })
        } else {
            None
        }
    })
}

async fn fold_in_local_sources(local_sources: &[docsearch_common::LocalSource]) -> Option<String> {
    let mut parts = Vec::new();
    for local in local_sources {
        if let Ok(content) = docsearch_fetch::fetch_local(&local.path, &local.patterns).await {
            if !content.is_empty() {
                parts.push(content);
            }
        }
    }
    (!parts.is_empty()).then(|| parts.join("\n\n"))
}

/// Normalized `host[:port]`, lowercased, used for exact domain matching
/// throughout.
fn domain_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    Some(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    })
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Race `fut` against cancellation. Returns `None` if `cancel` fires
/// first, abandoning `fut`.
async fn run_cancellable<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        _ = cancel.cancelled() => None,
        out = fut => Some(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_of_lowercases_and_keeps_port() {
        assert_eq!(domain_of("https://Docs.Example.com/x").as_deref(), Some("docs.example.com"));
        assert_eq!(domain_of("http://localhost:8080/x").as_deref(), Some("localhost:8080"));
    }

    #[test]
    fn domain_of_rejects_unparseable_urls() {
        assert_eq!(domain_of("not a url"), None);
    }

    #[test]
    fn truncate_chars_is_char_boundary_safe() {
        assert_eq!(truncate_chars("hello world", 5), "hello");
    }
}
