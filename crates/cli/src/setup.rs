//! Wires the `docsearch-*` crates into one [`SearchEngine`], reading
//! configuration the way `doc2mcp.config.load_config`/`server.py` do:
//! a YAML tools file plus a handful of environment variables for the
//! pieces that stay external collaborators — the LLM endpoint and the
//! on-disk cache/index location.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use docsearch_cache::PageCache;
use docsearch_common::Config;
use docsearch_compress::{Compressor, CompressorSettings};
use docsearch_engine::{SearchEngine, SearchEngineDeps};
use docsearch_fetch::Fetcher;
use docsearch_llmclient::{HttpJsonLlmClient, LlmClient, NullLlmClient};
use docsearch_urlindex::{DomainIndexer, IndexSettings};

const DEFAULT_TOOLS_CONFIG: &str = "./tools.yaml";
const DEFAULT_CACHE_DIR: &str = "./.docsearch_cache";
const DEFAULT_MAX_PAGES: usize = 10;

/// Command-line overrides that take priority over environment variables
/// and config defaults. Every field is optional; `None` means "use the
/// normal resolution order".
#[derive(Debug, Default, Clone)]
pub struct SetupOverrides {
    pub tools_config: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub max_pages: Option<usize>,
}

fn resolve_tools_config(overrides: &SetupOverrides) -> PathBuf {
    overrides
        .tools_config
        .clone()
        .or_else(|| std::env::var_os("DOCSEARCH_TOOLS_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TOOLS_CONFIG))
}

fn resolve_cache_dir(overrides: &SetupOverrides) -> PathBuf {
    overrides
        .cache_dir
        .clone()
        .or_else(|| std::env::var_os("DOCSEARCH_CACHE_DIR").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR))
}

/// Load the tools config, falling back to an empty one when the file is
/// simply absent (mirrors `load_config`'s "no file yet" behavior) while
/// still surfacing a real parse error.
fn load_config(path: &std::path::Path) -> anyhow::Result<Config> {
    match Config::load_yaml(path) {
        Ok(config) => Ok(config),
        Err(docsearch_common::ConfigError::NotFound(_)) => {
            tracing::warn!(path = %path.display(), "tools config not found, starting with no tools configured");
            Ok(Config::default())
        }
        Err(err) => Err(err).with_context(|| format!("failed to load tools config at {}", path.display())),
    }
}

/// Build an LLM client from `DOCSEARCH_LLM_*` environment variables,
/// falling back to [`NullLlmClient`] when no endpoint is configured so
/// that `tools`/`cache`/`index` subcommands work without credentials.
fn build_llm_client() -> anyhow::Result<Arc<dyn LlmClient>> {
    let Some(endpoint) = std::env::var("DOCSEARCH_LLM_ENDPOINT").ok() else {
        tracing::warn!("DOCSEARCH_LLM_ENDPOINT not set, using a null LLM client that cannot answer queries");
        return Ok(Arc::new(NullLlmClient::new(String::new())));
    };
    let api_key = std::env::var("DOCSEARCH_LLM_API_KEY").ok();
    let model = std::env::var("DOCSEARCH_LLM_MODEL").unwrap_or_else(|_| "default".to_string());
    let client = HttpJsonLlmClient::new(endpoint, api_key, model).context("failed to construct LLM client")?;
    Ok(Arc::new(client))
}

/// Assemble a ready-to-use [`SearchEngine`] the way a long-lived server
/// process would at startup: one `PageCache`, one `DomainIndexer`, one
/// `Fetcher`, one `Compressor`, and one `LlmClient`, all sharing the
/// config's `Settings`.
pub async fn build_engine(overrides: &SetupOverrides) -> anyhow::Result<SearchEngine> {
    let tools_config_path = resolve_tools_config(overrides);
    let cache_dir = resolve_cache_dir(overrides);
    std::fs::create_dir_all(&cache_dir)
        .with_context(|| format!("failed to create cache directory {}", cache_dir.display()))?;

    let config = load_config(&tools_config_path)?;

    let cache = PageCache::open(cache_dir.join("pages.json")).await;
    let index_settings = IndexSettings {
        ttl: chrono::Duration::seconds(config.settings.sitemap_index.ttl),
        max_urls_per_domain: config.settings.sitemap_index.max_urls_per_domain,
        parallel_fetch_limit: config.settings.sitemap_index.parallel_fetch_limit,
        crawl_depth: config.settings.sitemap_index.crawl_depth,
        request_timeout: Duration::from_secs(config.settings.request_timeout),
    };
    let indexer = DomainIndexer::open(cache_dir.join("index.json"), index_settings).await;

    let fetcher = Fetcher::direct(Duration::from_secs(config.settings.request_timeout));

    let compressor = Compressor::new(CompressorSettings {
        enabled: config.settings.compression.enabled,
        min_content_length: config.settings.compression.min_content_length,
        endpoint: std::env::var("DOCSEARCH_COMPRESSOR_ENDPOINT").ok(),
        api_key: std::env::var("DOCSEARCH_COMPRESSOR_API_KEY").ok(),
        request_timeout: Duration::from_secs(config.settings.request_timeout),
    });

    let llm = build_llm_client()?;

    let max_pages = overrides.max_pages.unwrap_or(DEFAULT_MAX_PAGES);

    Ok(SearchEngine::new(SearchEngineDeps { config, cache, indexer, fetcher, compressor, llm, max_pages }))
}
