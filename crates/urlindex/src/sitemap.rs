//! Sitemap discovery and XML parsing.
//!
//! Probe order mirrors `original_source/doc2mcp/sitemap_index.py`
//! (`_fetch_sitemap`): `/sitemap.xml`, `/sitemap_index.xml`, a `www.`
//! variant, then `robots.txt`'s `Sitemap:` lines.

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use reqwest::Client;
use tracing::debug;

use crate::scoring::{extract_keywords, extract_path_segments};
use docsearch_common::IndexedUrl;

/// Try every sitemap probe for `domain` in order; return the parsed URLs
/// and the sitemap URL that produced them, or `None` on total failure.
pub async fn discover(client: &Client, domain: &str, max_urls: usize) -> Option<(Vec<IndexedUrl>, String)> {
    let mut candidates = vec![
        format!("https://{domain}/sitemap.xml"),
        format!("https://{domain}/sitemap_index.xml"),
    ];
    if !domain.starts_with("www.") {
        candidates.push(format!("https://www.{domain}/sitemap.xml"));
    }

    for sitemap_url in &candidates {
        if let Some(urls) = try_fetch_and_parse(client, sitemap_url, max_urls).await {
            if !urls.is_empty() {
                return Some((urls, sitemap_url.clone()));
            }
        }
    }

    // robots.txt-advertised Sitemap: lines.
    let robots_url = format!("https://{domain}/robots.txt");
    if let Ok(resp) = client.get(&robots_url).send().await {
        if resp.status().is_success() {
            if let Ok(text) = resp.text().await {
                for line in text.lines() {
                    if line.to_lowercase().starts_with("sitemap:") {
                        let sitemap_url = line.splitn(2, ':').nth(1).unwrap_or("").trim().to_string();
                        if sitemap_url.is_empty() {
                            continue;
                        }
                        if let Some(urls) = try_fetch_and_parse(client, &sitemap_url, max_urls).await {
                            if !urls.is_empty() {
                                return Some((urls, sitemap_url));
                            }
                        }
                    }
                }
            }
        }
    }

    None
}

async fn try_fetch_and_parse(client: &Client, sitemap_url: &str, max_urls: usize) -> Option<Vec<IndexedUrl>> {
    let resp = client.get(sitemap_url).send().await.ok()?;
    if !resp.status().is_success() {
        return None;
    }
    let body = resp.text().await.ok()?;
    let urls = parse_sitemap_xml(&body, max_urls);
    debug!(sitemap_url, count = urls.len(), "parsed sitemap");
    Some(urls)
}

/// Parse `<url><loc>..</loc><priority>..</priority><changefreq>..</changefreq></url>`
/// triples out of sitemap XML, tolerant of any namespace prefix. Returns
/// an empty vec on malformed XML rather than erroring (sitemap discovery
/// falls back to BFS crawl on total failure).
pub fn parse_sitemap_xml(xml: &str, max_urls: usize) -> Vec<IndexedUrl> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut urls = Vec::new();
    let mut buf = Vec::new();

    let mut in_url = false;
    let mut current_tag: Option<String> = None;
    let mut loc: Option<String> = None;
    let mut priority: f64 = 0.5;
    let mut changefreq: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                let name = local_name(&e.name().as_ref().to_vec());
                if name == "url" {
                    in_url = true;
                    loc = None;
                    priority = 0.5;
                    changefreq = None;
                } else if in_url {
                    current_tag = Some(name);
                }
            }
            Ok(Event::Text(t)) => {
                if in_url {
                    if let Some(tag) = current_tag.as_deref() {
                        let text = t.unescape().unwrap_or_default().to_string();
                        match tag {
                            "loc" => loc = Some(text),
                            "priority" => {
                                if let Ok(p) = text.parse::<f64>() {
                                    priority = p;
                                }
                            }
                            "changefreq" => changefreq = Some(text),
                            _ => {}
                        }
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = local_name(&e.name().as_ref().to_vec());
                if name == "url" {
                    in_url = false;
                    if let Some(url) = loc.take() {
                        let path_segments = extract_path_segments(&url);
                        let title_hint = path_segments
                            .last()
                            .map(|s| s.replace(['-', '_'], " "))
                            .unwrap_or_default();
                        urls.push(IndexedUrl {
                            keywords: extract_keywords(&url, &title_hint),
                            depth: path_segments.len() as u32,
                            path_segments,
                            url,
                            title_hint,
                            priority,
                            changefreq: changefreq.take(),
                        });
                        if urls.len() >= max_urls {
                            return urls;
                        }
                    }
                }
                current_tag = None;
            }
            Err(_) => return urls,
            _ => {}
        }
        buf.clear();
    }

    urls
}

fn local_name(qname: &[u8]) -> String {
    let s = String::from_utf8_lossy(qname);
    s.rsplit(':').next().unwrap_or(&s).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_sitemap() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url>
    <loc>https://docs.example.com/install</loc>
    <priority>0.9</priority>
    <changefreq>weekly</changefreq>
  </url>
  <url>
    <loc>https://docs.example.com/api/auth</loc>
    <priority>0.5</priority>
  </url>
</urlset>"#;
        let urls = parse_sitemap_xml(xml, 1000);
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].url, "https://docs.example.com/install");
        assert_eq!(urls[0].priority, 0.9);
        assert_eq!(urls[0].changefreq.as_deref(), Some("weekly"));
        assert_eq!(urls[1].priority, 0.5);
    }

    #[test]
    fn malformed_xml_returns_empty() {
        let urls = parse_sitemap_xml("<not valid", 1000);
        assert!(urls.is_empty());
    }

    #[test]
    fn respects_max_urls_cap() {
        let mut xml = String::from("<urlset>");
        for i in 0..10 {
            xml.push_str(&format!("<url><loc>https://docs.example.com/page{i}</loc></url>"));
        }
        xml.push_str("</urlset>");
        let urls = parse_sitemap_xml(&xml, 3);
        assert_eq!(urls.len(), 3);
    }
}
