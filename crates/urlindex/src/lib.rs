//! The per-domain URL index.
//!
//! Lazily builds a `{domain -> DomainIndex}` map, sitemap-derived when
//! possible and BFS-crawled otherwise, and answers keyword-scored
//! candidate queries against it. Grounded on
//! `original_source/doc2mcp/sitemap_index.py` (`SitemapIndex`) for the
//! exact probe order, scoring formula and TTL staleness check, with the
//! concurrent-fetch shape borrowed from the teacher's
//! `WebCrawlerRetriever::crawl_urls_parallel` (`Semaphore` + bounded batch).

mod crawl;
mod scoring;
mod sitemap;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use docsearch_common::{DomainIndex, DomainIndexStats, IndexSourceType, UrlMatch};
use docsearch_persist::PersistError;
use reqwest::Client;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

pub use scoring::find_relevant as score_urls;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error(transparent)]
    Persist(#[from] PersistError),
}

type DomainMap = HashMap<String, DomainIndex>;

/// Tuning knobs mirroring `settings.sitemap_index`.
#[derive(Debug, Clone)]
pub struct IndexSettings {
    pub ttl: chrono::Duration,
    pub max_urls_per_domain: usize,
    pub parallel_fetch_limit: usize,
    pub crawl_depth: u32,
    pub request_timeout: Duration,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            ttl: chrono::Duration::seconds(86_400),
            max_urls_per_domain: 1000,
            parallel_fetch_limit: 10,
            crawl_depth: 3,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Persistent, lazily-built `{domain -> DomainIndex}` store with the
/// LLM-free candidate ranker.
pub struct DomainIndexer {
    path: std::path::PathBuf,
    settings: IndexSettings,
    client: Client,
    domains: RwLock<DomainMap>,
    /// Per-domain build locks, guarded by a global lock so two
    /// concurrent first-touch queries for the *same* domain collapse to
    /// one network build, while different domains proceed in parallel.
    build_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DomainIndexer {
    pub async fn open(path: impl Into<std::path::PathBuf>, settings: IndexSettings) -> Self {
        let path = path.into();
        let domains: DomainMap = docsearch_persist::load(&path).await;
        let client = Client::builder()
            .user_agent("docsearch/0.1 (Documentation Indexer)")
            .timeout(settings.request_timeout)
            .build()
            .unwrap_or_default();
        Self {
            path,
            settings,
            client,
            domains: RwLock::new(domains),
            build_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, domain: &str) -> Arc<Mutex<()>> {
        let mut locks = self.build_locks.lock().await;
        locks
            .entry(domain.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn is_fresh(&self, index: &DomainIndex) -> bool {
        Utc::now().signed_duration_since(index.indexed_at) <= self.settings.ttl
    }

    /// Ensure `domain` has a fresh index, building it if missing or
    /// stale. Idempotent and safe under concurrent calls.
    #[instrument(skip(self))]
    pub async fn ensure_indexed(&self, domain: &str, start_url: Option<&str>) -> Result<DomainIndex, IndexError> {
        let domain_lock = self.lock_for(domain).await;
        let _guard = domain_lock.lock().await;

        if let Some(existing) = self.domains.read().await.get(domain).cloned() {
            if self.is_fresh(&existing) {
                return Ok(existing);
            }
        }

        let (urls, source_type, sitemap_url) =
            match sitemap::discover(&self.client, domain, self.settings.max_urls_per_domain).await {
                Some((urls, sitemap_url)) => (urls, IndexSourceType::Sitemap, Some(sitemap_url)),
                None => {
                    let crawl_start = start_url
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("https://{domain}/"));
                    let urls = crawl::crawl(
                        &self.client,
                        &crawl_start,
                        domain,
                        self.settings.crawl_depth,
                        self.settings.parallel_fetch_limit,
                        self.settings.max_urls_per_domain,
                    )
                    .await;
                    (urls, IndexSourceType::Crawl, None)
                }
            };

        let index = DomainIndex::new(domain.to_string(), sitemap_url, source_type, urls);

        let mut guard = self.domains.write().await;
        guard.insert(domain.to_string(), index.clone());
        docsearch_persist::save(&self.path, &*guard).await?;

        Ok(index)
    }

    /// Rank the already-built index for `domain` against `query`. Returns
    /// an empty vec if the domain hasn't been indexed yet — callers are
    /// expected to call `ensure_indexed` first.
    #[instrument(skip(self))]
    pub async fn find_relevant(&self, query: &str, domain: &str, max_results: usize) -> Vec<UrlMatch> {
        let guard = self.domains.read().await;
        match guard.get(domain) {
            Some(index) => scoring::find_relevant(query, &index.urls, max_results),
            None => Vec::new(),
        }
    }

    #[instrument(skip(self))]
    pub async fn stats(&self, domain: &str) -> Option<DomainIndexStats> {
        self.domains.read().await.get(domain).map(|index| DomainIndexStats {
            domain: index.domain.clone(),
            indexed_at: index.indexed_at,
            source_type: index.source_type,
            url_count: index.url_count,
        })
    }

    #[instrument(skip(self))]
    pub async fn clear(&self, domain: Option<&str>) -> Result<usize, IndexError> {
        let mut guard = self.domains.write().await;
        let removed = match domain {
            None => {
                let count = guard.len();
                guard.clear();
                count
            }
            Some(d) => usize::from(guard.remove(d).is_some()),
        };
        docsearch_persist::save(&self.path, &*guard).await?;
        Ok(removed)
    }
}
