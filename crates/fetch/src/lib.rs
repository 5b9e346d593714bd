//! The fetch pipeline.
//!
//! Two interchangeable modes selected at construction: `Direct` HTTP
//! GET + HTML parsing, or `ReaderProxy` delegation to an external
//! markdown-rendering endpoint. Link extraction and normalization are
//! shared by both. Also hosts the local-filesystem source fetcher
//! folded into the engine's final excerpt, since
//! `original_source/doc2mcp/fetchers/` keeps both fetchers as siblings
//! behind the same module.

mod direct;
mod local;
mod links;
mod reader_proxy;

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::instrument;

pub use local::{fetch as fetch_local, LocalFetchError};

use docsearch_common::FetchResult;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },
}

/// CSS selectors narrowing HTML extraction, mirroring
/// `WebSource.selectors`.
#[derive(Debug, Clone, Default)]
pub struct Selectors {
    pub content: Option<String>,
    pub exclude: Option<String>,
}

enum Mode {
    Direct,
    ReaderProxy { endpoint_prefix: String },
}

/// Retrieves a URL and returns normalized text plus outbound links. No
/// side effects; does not touch the page cache (that's the caller's
/// job).
pub struct Fetcher {
    client: Client,
    mode: Mode,
}

impl Fetcher {
    /// Direct HTTP GET + HTML parsing mode.
    pub fn direct(timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            mode: Mode::Direct,
        }
    }

    /// Reader-proxy mode: `endpoint_prefix` is a URL prefix that the
    /// target URL is appended to.
    pub fn reader_proxy(endpoint_prefix: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            mode: Mode::ReaderProxy { endpoint_prefix: endpoint_prefix.into() },
        }
    }

    /// Fetch `url`. `base_domain`, if set, restricts extracted outbound
    /// links to that host. `selectors` only applies in `Direct` mode.
    #[instrument(skip(self, selectors), fields(url))]
    pub async fn fetch(
        &self,
        url: &str,
        base_domain: Option<&str>,
        selectors: Option<&Selectors>,
    ) -> Result<FetchResult, FetchError> {
        match &self.mode {
            Mode::Direct => direct::fetch(&self.client, url, base_domain, selectors).await,
            Mode::ReaderProxy { endpoint_prefix } => {
                reader_proxy::fetch(&self.client, endpoint_prefix, url, base_domain).await
            }
        }
    }

    /// No persistent resources to release beyond the pooled HTTP client,
    /// which `reqwest::Client` already shuts down on drop; kept as a
    /// named operation to mirror the spec's `close()` and the teacher's
    /// `WebFetcher.close()`/`WebCrawlerRetriever` lifecycle symmetry.
    pub async fn close(&self) {}
}

fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .user_agent("docsearch/0.1 (Documentation Fetcher)")
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .unwrap_or_default()
}
