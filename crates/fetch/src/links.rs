//! Link normalization shared by the direct (HTML) and reader-proxy
//! (markdown) fetch modes. Grounded on
//! `original_source/doc2mcp/fetchers/web.py` (whitespace/extension rules
//! and href-filtering list).

use url::Url;

const DROPPED_EXTENSIONS: &[&str] = &[
    ".pdf", ".zip", ".jpg", ".png", ".gif", ".svg", ".ico", ".mp4", ".tar", ".gz",
];

/// Resolve `href` against `base`, strip the fragment, and reject
/// unwanted schemes and extensions. Returns `None` for links that
/// should be dropped rather than kept.
pub fn normalize_href(base: &Url, href: &str) -> Option<String> {
    let trimmed = href.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let lower = trimmed.to_lowercase();
    if lower.starts_with("mailto:") || lower.starts_with("javascript:") || lower.starts_with("tel:") {
        return None;
    }

    let resolved = base.join(trimmed).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }

    let path_lower = resolved.path().to_lowercase();
    if DROPPED_EXTENSIONS.iter().any(|ext| path_lower.ends_with(ext)) {
        return None;
    }

    let mut normalized = format!(
        "{}://{}{}",
        resolved.scheme(),
        resolved.host_str().unwrap_or(""),
        resolved.path()
    );
    if let Some(query) = resolved.query() {
        normalized.push('?');
        normalized.push_str(query);
    }
    Some(normalized)
}

/// Collapse whitespace: runs of >= 3 newlines become two, runs of >= 2
/// spaces become one.
pub fn collapse_whitespace(text: &str) -> String {
    let newline_collapsed = {
        let mut out = String::with_capacity(text.len());
        let mut run = 0usize;
        for ch in text.chars() {
            if ch == '\n' {
                run += 1;
                if run <= 2 {
                    out.push(ch);
                }
            } else {
                run = 0;
                out.push(ch);
            }
        }
        out
    };

    let mut out = String::with_capacity(newline_collapsed.len());
    let mut space_run = 0usize;
    for ch in newline_collapsed.chars() {
        if ch == ' ' {
            space_run += 1;
            if space_run <= 1 {
                out.push(ch);
            }
        } else {
            space_run = 0;
            out.push(ch);
        }
    }
    out.trim().to_string()
}

/// Deduplicate links, keeping the first occurrence's text.
pub fn dedupe(links: Vec<docsearch_common::Link>) -> Vec<docsearch_common::Link> {
    let mut seen = std::collections::HashSet::new();
    links
        .into_iter()
        .filter(|link| seen.insert(link.url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_fragment_and_mailto_and_asset_links() {
        let base = Url::parse("https://docs.example.com/guide/").unwrap();
        assert_eq!(normalize_href(&base, "#section"), None);
        assert_eq!(normalize_href(&base, "mailto:a@b.com"), None);
        assert_eq!(normalize_href(&base, "javascript:void(0)"), None);
        assert_eq!(normalize_href(&base, "tel:+1234"), None);
        assert_eq!(normalize_href(&base, "/assets/logo.png"), None);
        assert_eq!(normalize_href(&base, "/assets/doc.pdf"), None);
    }

    #[test]
    fn resolves_relative_and_strips_fragment() {
        let base = Url::parse("https://docs.example.com/guide/install").unwrap();
        let normalized = normalize_href(&base, "../api#top").unwrap();
        assert_eq!(normalized, "https://docs.example.com/api");
    }

    #[test]
    fn preserves_query() {
        let base = Url::parse("https://docs.example.com/guide/").unwrap();
        let normalized = normalize_href(&base, "/search?q=auth").unwrap();
        assert_eq!(normalized, "https://docs.example.com/search?q=auth");
    }

    #[test]
    fn collapse_whitespace_rules() {
        let input = "a\n\n\n\nb    c";
        assert_eq!(collapse_whitespace(input), "a\n\nb c");
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let links = vec![
            docsearch_common::Link { url: "https://a/x".to_string(), text: "first".to_string() },
            docsearch_common::Link { url: "https://a/x".to_string(), text: "second".to_string() },
        ];
        let out = dedupe(links);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "first");
    }
}
