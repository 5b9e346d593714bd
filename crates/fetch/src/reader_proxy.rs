//! Reader-proxy fetch mode: delegates HTML-to-markdown conversion to an
//! external rendering endpoint. Grounded on the teacher's
//! `SearXNGClient` (`endpoint` + `reqwest::Client` GET, in
//! `searxng_client.rs`) restructured for a markdown response body
//! instead of a JSON search response.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use tracing::instrument;
use url::Url;

use docsearch_common::{FetchResult, Link};

use crate::links::{dedupe, normalize_href};
use crate::FetchError;

static HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#\s+(.+)$").unwrap());
static LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]*)\]\(([^)\s]+)\)").unwrap());

#[instrument(skip(client), fields(url))]
pub async fn fetch(
    client: &Client,
    endpoint_prefix: &str,
    url: &str,
    base_domain: Option<&str>,
) -> Result<FetchResult, FetchError> {
    let proxy_url = format!("{}{}", endpoint_prefix.trim_end_matches('/'), url);

    let response = client
        .get(&proxy_url)
        .send()
        .await
        .map_err(|source| FetchError::Request { url: url.to_string(), source })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status { url: url.to_string(), status: status.as_u16() });
    }

    let markdown = response
        .text()
        .await
        .map_err(|source| FetchError::Request { url: url.to_string(), source })?;

    let title = HEADING_RE
        .captures(&markdown)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    let page_url = Url::parse(url).map_err(|_| FetchError::Status { url: url.to_string(), status: 0 })?;
    let links = extract_markdown_links(&markdown, &page_url, base_domain);

    Ok(FetchResult {
        url: url.to_string(),
        title,
        content: markdown,
        links,
    })
}

/// Scan `[text](url)` patterns to recover links from a markdown body.
fn extract_markdown_links(markdown: &str, page_url: &Url, base_domain: Option<&str>) -> Vec<Link> {
    let links: Vec<Link> = LINK_RE
        .captures_iter(markdown)
        .filter_map(|caps| {
            let text = caps.get(1)?.as_str().trim().to_string();
            let href = caps.get(2)?.as_str();
            let normalized = normalize_href(page_url, href)?;
            if let Some(domain) = base_domain {
                let host = Url::parse(&normalized).ok()?.host_str()?.to_lowercase();
                if host != domain.to_lowercase() {
                    return None;
                }
            }
            Some(Link { url: normalized, text })
        })
        .collect();
    dedupe(links)
}
