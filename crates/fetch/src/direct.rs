//! Direct HTTP + HTML parsing fetch mode.
//!
//! Grounded on `original_source/doc2mcp/fetchers/web.py::WebFetcher`
//! (script/style/noscript removal, content/exclude selectors, whitespace
//! collapse) restructured into the teacher's `scraper`-based extraction
//! shape used for BFS-crawled pages in `docsearch-urlindex`.

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::instrument;
use url::Url;

use docsearch_common::{FetchResult, Link};

use crate::links::{collapse_whitespace, dedupe, normalize_href};
use crate::{FetchError, Selectors};

const SCRUBBED_ELEMENTS: &[&str] = &["script", "style", "noscript"];

#[instrument(skip(client, selectors), fields(url))]
pub async fn fetch(
    client: &Client,
    url: &str,
    base_domain: Option<&str>,
    selectors: Option<&Selectors>,
) -> Result<FetchResult, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Request { url: url.to_string(), source })?;

    let final_url = response.url().clone();
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status { url: url.to_string(), status: status.as_u16() });
    }

    let html = response
        .text()
        .await
        .map_err(|source| FetchError::Request { url: url.to_string(), source })?;

    let (title, content, links) = extract(&html, &final_url, base_domain, selectors);

    Ok(FetchResult {
        url: final_url.to_string(),
        title,
        content,
        links,
    })
}

fn extract(
    html: &str,
    page_url: &Url,
    base_domain: Option<&str>,
    selectors: Option<&Selectors>,
) -> (String, String, Vec<Link>) {
    let document = Html::parse_document(html);

    let title = document
        .select(&Selector::parse("title").unwrap())
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let links = extract_links(&document, page_url, base_domain);
    let content = extract_content_text(html, selectors);

    (title, content, links)
}

/// Re-parse with scrub/exclude applied, honoring optional content/exclude
/// CSS selectors, then collapse whitespace.
fn extract_content_text(html: &str, selectors: Option<&Selectors>) -> String {
    // `scraper`'s tree has no node-removal API, so we serialize a filtered
    // walk instead of mutating in place: collect text from the chosen
    // content root, skipping script/style/noscript subtrees and any
    // exclude-selector matches.
    let document = Html::parse_document(html);

    let exclude_selectors: Vec<Selector> = selectors
        .and_then(|s| s.exclude.as_ref())
        .map(|raw| parse_selector_list(raw))
        .unwrap_or_default();

    let content_root = selectors
        .and_then(|s| s.content.as_ref())
        .and_then(|raw| parse_selector_list(raw).into_iter().find_map(|sel| document.select(&sel).next()));

    let scrub_selector = Selector::parse(&SCRUBBED_ELEMENTS.join(",")).unwrap();
    let scrubbed: std::collections::HashSet<_> = document.select(&scrub_selector).map(|el| el.id()).collect();
    let excluded: std::collections::HashSet<_> = exclude_selectors
        .iter()
        .flat_map(|sel| document.select(sel))
        .map(|el| el.id())
        .collect();

    let root = content_root.unwrap_or_else(|| document.root_element());

    let mut text = String::new();
    for node in root.descendants() {
        if let Some(element) = scraper::ElementRef::wrap(node) {
            if scrubbed.contains(&element.id()) || excluded.contains(&element.id()) {
                continue;
            }
        }
        if let Some(text_node) = node.value().as_text() {
            let parent_is_scrubbed = node
                .ancestors()
                .filter_map(scraper::ElementRef::wrap)
                .any(|anc| scrubbed.contains(&anc.id()) || excluded.contains(&anc.id()));
            if !parent_is_scrubbed {
                text.push_str(text_node);
                text.push('\n');
            }
        }
    }

    collapse_whitespace(&text)
}

fn parse_selector_list(raw: &str) -> Vec<Selector> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
}

fn extract_links(document: &Html, page_url: &Url, base_domain: Option<&str>) -> Vec<Link> {
    let selector = Selector::parse("a[href]").unwrap();
    let links: Vec<Link> = document
        .select(&selector)
        .filter_map(|el| {
            let href = el.value().attr("href")?;
            let normalized = normalize_href(page_url, href)?;
            if let Some(domain) = base_domain {
                let host = Url::parse(&normalized).ok()?.host_str()?.to_lowercase();
                if host != domain.to_lowercase() {
                    return None;
                }
            }
            let text = el.text().collect::<String>().trim().to_string();
            Some(Link { url: normalized, text })
        })
        .collect();
    dedupe(links)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_style_and_collapses_whitespace() {
        let html = r#"<html><head><title>  Docs  </title><style>.x{color:red}</style></head>
            <body><script>var x=1;</script>


            <p>Hello   world</p></body></html>"#;
        let page_url = Url::parse("https://docs.example.com/").unwrap();
        let (title, content, _links) = extract(html, &page_url, None, None);
        assert_eq!(title, "Docs");
        assert!(content.contains("Hello world"));
        assert!(!content.contains("var x=1"));
        assert!(!content.contains("color:red"));
    }

    #[test]
    fn filters_links_to_base_domain() {
        let html = r#"<html><body>
            <a href="/guide">Guide</a>
            <a href="https://other.example.com/x">Other</a>
        </body></html>"#;
        let page_url = Url::parse("https://docs.example.com/").unwrap();
        let (_title, _content, links) = extract(html, &page_url, Some("docs.example.com"), None);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://docs.example.com/guide");
    }

    #[test]
    fn exclude_selector_drops_matching_subtree() {
        let html = r#"<html><body>
            <nav class="sidebar">Sidebar link text</nav>
            <main>Real content</main>
        </body></html>"#;
        let selectors = Selectors { content: None, exclude: Some(".sidebar".to_string()) };
        let content = extract_content_text(html, Some(&selectors));
        assert!(content.contains("Real content"));
        assert!(!content.contains("Sidebar link text"));
    }

    #[test]
    fn content_selector_narrows_extraction() {
        let html = r#"<html><body>
            <nav>Nav text</nav>
            <article class="post">Article body</article>
        </body></html>"#;
        let selectors = Selectors { content: Some(".post".to_string()), exclude: None };
        let content = extract_content_text(html, Some(&selectors));
        assert!(content.contains("Article body"));
        assert!(!content.contains("Nav text"));
    }
}
