//! Bounded BFS crawl fallback used when sitemap discovery fails entirely.
//! Regex-based title/link extraction, speed-oriented rather than
//! HTML-correct, translated directly from
//! `original_source/doc2mcp/sitemap_index.py::_crawl_urls`/`_fetch_links`.

use std::collections::{HashSet, VecDeque};

use regex::Regex;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::scoring::{extract_keywords, extract_path_segments};
use docsearch_common::IndexedUrl;

struct Frontier {
    url: String,
    depth: u32,
    title_hint: String,
}

/// BFS-crawl from `start_url`, restricted to URLs whose normalized host
/// exactly matches `domain` or any host observed via redirect during this
/// run. Bounded by `crawl_depth` and fetched with concurrency
/// `parallel_fetch_limit` per batch.
pub async fn crawl(
    client: &Client,
    start_url: &str,
    domain: &str,
    crawl_depth: u32,
    parallel_fetch_limit: usize,
    max_urls: usize,
) -> Vec<IndexedUrl> {
    let mut urls = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut allowed_hosts: HashSet<String> = HashSet::from([domain.to_string()]);
    let mut queue: VecDeque<Frontier> = VecDeque::from([Frontier {
        url: start_url.to_string(),
        depth: 0,
        title_hint: String::new(),
    }]);

    let title_re = Regex::new(r"(?is)<title[^>]*>([^<]+)</title>").unwrap();
    let link_re = Regex::new(r#"(?is)<a[^>]+href=["']([^"']+)["'][^>]*>([^<]*)</a>"#).unwrap();

    while !queue.is_empty() && urls.len() < max_urls {
        let mut batch = Vec::new();
        while let Some(item) = queue.pop_front() {
            if !visited.contains(&item.url) && item.depth <= crawl_depth {
                visited.insert(item.url.clone());
                batch.push(item);
            }
            if batch.len() >= parallel_fetch_limit {
                break;
            }
        }
        if batch.is_empty() {
            break;
        }

        let fetches = batch.iter().map(|item| {
            fetch_links(client, &item.url, &title_re, &link_re)
        });
        let results = futures::future::join_all(fetches).await;

        for (item, result) in batch.into_iter().zip(results) {
            let Some((final_host, title, links)) = result else {
                continue;
            };
            allowed_hosts.insert(final_host);

            let final_title = if title.is_empty() { item.title_hint.clone() } else { title };
            let path_segments = extract_path_segments(&item.url);
            urls.push(IndexedUrl {
                keywords: extract_keywords(&item.url, &final_title),
                depth: item.depth,
                priority: (1.0 - item.depth as f64 * 0.2).max(0.1),
                changefreq: None,
                path_segments,
                url: item.url.clone(),
                title_hint: final_title,
            });

            for (link_url, link_text) in links {
                if let Ok(parsed) = Url::parse(&link_url) {
                    let host = parsed.host_str().unwrap_or("").to_lowercase();
                    if allowed_hosts.contains(&host) && !visited.contains(&link_url) {
                        queue.push_back(Frontier {
                            url: link_url,
                            depth: item.depth + 1,
                            title_hint: link_text,
                        });
                    }
                }
            }

            if urls.len() >= max_urls {
                break;
            }
        }
    }

    debug!(start_url, url_count = urls.len(), "BFS crawl complete");
    urls
}

/// Fetch one page, return `(final_host, title, [(normalized_url, link_text)])`.
async fn fetch_links(
    client: &Client,
    url: &str,
    title_re: &Regex,
    link_re: &Regex,
) -> Option<(String, String, Vec<(String, String)>)> {
    let resp = client.get(url).send().await.ok()?;
    let final_url = resp.url().clone();
    let final_host = final_url.host_str().unwrap_or("").to_lowercase();
    if !resp.status().is_success() {
        return None;
    }
    let html = resp.text().await.ok()?;

    let title = title_re
        .captures(&html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    let mut links = Vec::new();
    let mut seen = HashSet::new();
    for caps in link_re.captures_iter(&html) {
        let href = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let text = caps.get(2).map(|m| m.as_str()).unwrap_or("").trim().to_string();

        if href.starts_with('#')
            || href.starts_with("mailto:")
            || href.starts_with("javascript:")
            || href.starts_with("tel:")
        {
            continue;
        }

        let Ok(resolved) = final_url.join(href) else {
            continue;
        };
        let normalized = normalize(&resolved);
        if seen.insert(normalized.clone()) {
            links.push((normalized, text));
        }
    }

    Some((final_host, title, links))
}

fn normalize(url: &Url) -> String {
    let mut normalized = format!("{}://{}{}", url.scheme(), url.host_str().unwrap_or(""), url.path());
    if let Some(query) = url.query() {
        normalized.push('?');
        normalized.push_str(query);
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_extracts_title_and_links() {
        let title_re = Regex::new(r"(?is)<title[^>]*>([^<]+)</title>").unwrap();
        let link_re = Regex::new(r#"(?is)<a[^>]+href=["']([^"']+)["'][^>]*>([^<]*)</a>"#).unwrap();
        let html = r#"<html><head><title> Docs Home </title></head>
            <body><a href="/guide">Guide</a> <a href="mailto:x@y.com">Mail</a></body></html>"#;

        let title = title_re.captures(html).and_then(|c| c.get(1)).map(|m| m.as_str().trim());
        assert_eq!(title, Some("Docs Home"));

        let hrefs: Vec<&str> = link_re
            .captures_iter(html)
            .map(|c| c.get(1).unwrap().as_str())
            .collect();
        assert_eq!(hrefs, vec!["/guide", "mailto:x@y.com"]);
    }
}
