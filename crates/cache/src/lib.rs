//! The persistent page cache.
//!
//! A process-wide `{url -> CachedPage}` map backed by a single JSON file,
//! with a similarity-based lookup the navigator/search engine uses to
//! short-circuit re-fetching. Grounded on `original_source/doc2mcp/cache.py`
//! (`PageCache`) almost directly: same key derivation, same scoring
//! formula, restructured into the teacher's `Arc<RwLock<HashMap<..>>>` +
//! single-writer-lock idiom (`ai-agent-rag::web_crawler::WebCrawlerRetriever`
//! wraps its LSH index the same way, behind `Arc<Mutex<..>>`).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use docsearch_common::{cache_key, CacheIndexEntry, CachedPage, Link};
use docsearch_persist::PersistError;
use tokio::sync::RwLock;
use tracing::instrument;

type CacheMap = HashMap<String, CachedPage>;

/// Persistent `{url -> page}` store with similarity lookup.
///
/// Reads take the `RwLock` read side; `put`/`clear` take the write side
/// and hold it across the atomic-rename save so that no two writers can
/// interleave their disk writes.
#[derive(Clone)]
pub struct PageCache {
    path: PathBuf,
    inner: Arc<RwLock<CacheMap>>,
}

impl PageCache {
    /// Load (or lazily create) the cache backed by the JSON file at `path`.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let map: CacheMap = docsearch_persist::load(&path).await;
        Self {
            path,
            inner: Arc::new(RwLock::new(map)),
        }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, url: &str) -> Option<CachedPage> {
        let key = cache_key(url);
        self.inner.read().await.get(&key).cloned()
    }

    #[instrument(skip(self, title, summary, content, links))]
    pub async fn put(
        &self,
        url: &str,
        title: &str,
        summary: &str,
        content: &str,
        links: Vec<Link>,
        domain: &str,
    ) -> Result<(), PersistError> {
        let key = cache_key(url);
        let page = CachedPage {
            url: url.to_string(),
            title: title.to_string(),
            summary: summary.to_string(),
            content: content.to_string(),
            links,
            fetched_at: Utc::now(),
            domain: domain.to_string(),
        };

        let mut guard = self.inner.write().await;
        guard.insert(key, page);
        docsearch_persist::save(&self.path, &*guard).await
    }

    /// Tokenize `query` on whitespace and lowercase, score every page as
    /// `2*|Q ∩ title_words| + |Q ∩ summary_words|`, drop zero scores,
    /// sort descending. Filters by `domain` when given.
    #[instrument(skip(self))]
    pub async fn find_similar(&self, query: &str, domain: Option<&str>) -> Vec<CachedPage> {
        let query_words: std::collections::HashSet<String> =
            query.to_lowercase().split_whitespace().map(str::to_string).collect();

        let guard = self.inner.read().await;
        let mut scored: Vec<(i64, CachedPage)> = guard
            .values()
            .filter(|page| domain.map_or(true, |d| page.domain == d))
            .filter_map(|page| {
                let title_words: std::collections::HashSet<String> =
                    page.title.to_lowercase().split_whitespace().map(str::to_string).collect();
                let summary_words: std::collections::HashSet<String> =
                    page.summary.to_lowercase().split_whitespace().map(str::to_string).collect();

                let title_matches = query_words.intersection(&title_words).count() as i64;
                let summary_matches = query_words.intersection(&summary_words).count() as i64;
                let score = title_matches * 2 + summary_matches;

                (score > 0).then(|| (score, page.clone()))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, page)| page).collect()
    }

    #[instrument(skip(self))]
    pub async fn get_all_for_domain(&self, domain: &str) -> Vec<CachedPage> {
        self.inner
            .read()
            .await
            .values()
            .filter(|page| page.domain == domain)
            .cloned()
            .collect()
    }

    /// Condensed `{url, title, summary}` listing, for diagnostics/admin
    /// surfaces built atop the core (`original_source` `get_index`).
    #[instrument(skip(self))]
    pub async fn get_index(&self, domain: Option<&str>) -> Vec<CacheIndexEntry> {
        self.inner
            .read()
            .await
            .values()
            .filter(|page| domain.map_or(true, |d| page.domain == d))
            .map(|page| CacheIndexEntry {
                url: page.url.clone(),
                title: page.title.clone(),
                summary: page.summary.clone(),
            })
            .collect()
    }

    /// Clear cached pages, optionally scoped to one domain. Returns the
    /// number of pages removed.
    #[instrument(skip(self))]
    pub async fn clear(&self, domain: Option<&str>) -> Result<usize, PersistError> {
        let mut guard = self.inner.write().await;
        let removed = match domain {
            None => {
                let count = guard.len();
                guard.clear();
                count
            }
            Some(d) => {
                let keys: Vec<String> = guard
                    .iter()
                    .filter(|(_, page)| page.domain == d)
                    .map(|(key, _)| key.clone())
                    .collect();
                let count = keys.len();
                for key in keys {
                    guard.remove(&key);
                }
                count
            }
        };
        docsearch_persist::save(&self.path, &*guard).await?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn new_cache() -> (tempfile::TempDir, PageCache) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pages.json");
        let cache = PageCache::open(&path).await;
        (dir, cache)
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let (_dir, cache) = new_cache().await;
        cache
            .put(
                "https://docs.example.com/install",
                "Install Guide",
                "How to install on ubuntu",
                "full content",
                vec![],
                "docs.example.com",
            )
            .await
            .unwrap();

        let page = cache.get("https://docs.example.com/install").await.unwrap();
        assert_eq!(page.title, "Install Guide");
        assert_eq!(page.domain, "docs.example.com");
    }

    #[tokio::test]
    async fn two_identical_puts_are_equivalent_to_one() {
        let (_dir, cache) = new_cache().await;
        for _ in 0..2 {
            cache
                .put("https://a.example.com/x", "X", "about x", "content", vec![], "a.example.com")
                .await
                .unwrap();
        }
        assert_eq!(cache.get_all_for_domain("a.example.com").await.len(), 1);
    }

    #[tokio::test]
    async fn find_similar_scores_title_higher_than_summary() {
        let (_dir, cache) = new_cache().await;
        cache
            .put(
                "https://docs.example.com/ubuntu-install",
                "Install on Ubuntu",
                "generic setup notes",
                "content",
                vec![],
                "docs.example.com",
            )
            .await
            .unwrap();
        cache
            .put(
                "https://docs.example.com/other",
                "Unrelated",
                "covers install and ubuntu topics",
                "content",
                vec![],
                "docs.example.com",
            )
            .await
            .unwrap();

        let results = cache.find_similar("install ubuntu", None).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Install on Ubuntu");
    }

    #[tokio::test]
    async fn find_similar_excludes_zero_score_pages() {
        let (_dir, cache) = new_cache().await;
        cache
            .put("https://docs.example.com/x", "Unrelated title", "nothing matching", "c", vec![], "docs.example.com")
            .await
            .unwrap();

        let results = cache.find_similar("completely different query", None).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn find_similar_filters_by_domain() {
        let (_dir, cache) = new_cache().await;
        cache
            .put("https://a.example.com/install", "Install", "install guide", "c", vec![], "a.example.com")
            .await
            .unwrap();
        cache
            .put("https://b.example.com/install", "Install", "install guide", "c", vec![], "b.example.com")
            .await
            .unwrap();

        let results = cache.find_similar("install", Some("a.example.com")).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].domain, "a.example.com");
    }

    #[tokio::test]
    async fn clear_scoped_to_domain_leaves_others() {
        let (_dir, cache) = new_cache().await;
        cache
            .put("https://a.example.com/x", "A", "a", "c", vec![], "a.example.com")
            .await
            .unwrap();
        cache
            .put("https://b.example.com/x", "B", "b", "c", vec![], "b.example.com")
            .await
            .unwrap();

        let removed = cache.clear(Some("a.example.com")).await.unwrap();
        assert_eq!(removed, 1);
        assert!(cache.get_all_for_domain("a.example.com").await.is_empty());
        assert_eq!(cache.get_all_for_domain("b.example.com").await.len(), 1);
    }

    #[tokio::test]
    async fn cache_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pages.json");
        {
            let cache = PageCache::open(&path).await;
            cache
                .put("https://docs.example.com/x", "X", "x", "content", vec![], "docs.example.com")
                .await
                .unwrap();
        }
        let reopened = PageCache::open(&path).await;
        assert!(reopened.get("https://docs.example.com/x").await.is_some());
    }
}
