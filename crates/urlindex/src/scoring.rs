//! Keyword extraction and the LLM-free candidate ranker, translated from
//! `original_source/doc2mcp/sitemap_index.py` (`_extract_keywords`,
//! `_extract_path_segments`, `find_relevant_urls`).

use std::collections::HashSet;

use docsearch_common::{IndexedUrl, UrlMatch};
use url::Url;

/// Tokens dropped during keyword extraction as non-informative, mirroring
/// the original's stop-set.
const STOP_WORDS: &[&str] = &["html", "htm", "php", "asp", "www", "com", "org", "index"];

fn split_on_delims(s: &str, delims: &[char]) -> Vec<String> {
    s.split(|c: char| delims.contains(&c))
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

/// Extract meaningful, non-extension, non-"index" path segments from a URL.
pub fn extract_path_segments(url: &str) -> Vec<String> {
    let Ok(parsed) = Url::parse(url) else {
        return Vec::new();
    };
    parsed
        .path()
        .split('/')
        .filter(|s| !s.is_empty())
        .filter_map(|seg| {
            let cleaned = strip_known_extension(seg);
            let lower = cleaned.to_lowercase();
            (!cleaned.is_empty() && lower != "index" && lower != "default")
                .then(|| cleaned.to_string())
        })
        .collect()
}

fn strip_known_extension(segment: &str) -> &str {
    for ext in [".html", ".htm", ".php", ".asp", ".aspx", ".jsp"] {
        if segment.len() > ext.len() && segment.to_lowercase().ends_with(ext) {
            return &segment[..segment.len() - ext.len()];
        }
    }
    segment
}

/// Extract lowercased keywords from the URL path segments and a title
/// hint, excluding the stop-set and tokens of length <= 2.
pub fn extract_keywords(url: &str, title_hint: &str) -> Vec<String> {
    let mut keywords: HashSet<String> = HashSet::new();

    for segment in extract_path_segments(url) {
        for word in split_on_delims(&segment, &['-', '_', '.']) {
            if word.len() > 2 && !STOP_WORDS.contains(&word.as_str()) {
                keywords.insert(word);
            }
        }
    }

    if !title_hint.is_empty() {
        for word in split_on_delims(title_hint, &[' ', '-', '_', '|', '/', '\\', ':']) {
            if word.len() > 2 {
                keywords.insert(word);
            }
        }
    }

    keywords.into_iter().collect()
}

fn tokenize_query(query: &str) -> HashSet<String> {
    split_on_delims(query, &[' ', '\t', '\n', '-', '_', '/', '\\', ':'])
        .into_iter()
        .filter(|w| w.len() > 2)
        .collect()
}

/// Score one [`IndexedUrl`] against a tokenized query:
///
/// ```text
/// score  = 2.0*|Q ∩ keywords|
///        + 1.5*|Q ∩ tokens(path_segments)|
///        + 2.5*|Q ∩ tokens(title_hint)|
/// score *= (0.5 + priority)
/// score *= max(0.5, 1.0 - depth*0.1)
/// ```
fn score_url(query_words: &HashSet<String>, indexed: &IndexedUrl) -> (f64, Vec<String>) {
    let mut score = 0.0;
    let mut reasons = Vec::new();

    let url_keywords: HashSet<String> = indexed.keywords.iter().cloned().collect();
    let keyword_matches: Vec<&String> = query_words.intersection(&url_keywords).collect();
    if !keyword_matches.is_empty() {
        score += keyword_matches.len() as f64 * 2.0;
        reasons.push(format!(
            "keywords: {}",
            keyword_matches.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
        ));
    }

    let mut path_words: HashSet<String> = HashSet::new();
    for segment in &indexed.path_segments {
        for word in split_on_delims(segment, &['-', '_']) {
            path_words.insert(word);
        }
    }
    let path_matches: Vec<&String> = query_words.intersection(&path_words).collect();
    if !path_matches.is_empty() {
        score += path_matches.len() as f64 * 1.5;
        reasons.push(format!(
            "path: {}",
            path_matches.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
        ));
    }

    let title_words: HashSet<String> = split_on_delims(&indexed.title_hint, &[' ', '-', '_']).into_iter().collect();
    let title_matches: Vec<&String> = query_words.intersection(&title_words).collect();
    if !title_matches.is_empty() {
        score += title_matches.len() as f64 * 2.5;
        reasons.push(format!(
            "title: {}",
            title_matches.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
        ));
    }

    score *= 0.5 + indexed.priority;
    score *= (1.0 - indexed.depth as f64 * 0.1).max(0.5);

    (score, reasons)
}

/// Score and rank every `IndexedUrl` against `query`, dropping zero
/// scores, returning the top `max_results` descending.
pub fn find_relevant(query: &str, urls: &[IndexedUrl], max_results: usize) -> Vec<UrlMatch> {
    let query_words = tokenize_query(query);

    let mut matches: Vec<UrlMatch> = urls
        .iter()
        .filter_map(|indexed| {
            let (score, reasons) = score_url(&query_words, indexed);
            (score > 0.0).then(|| UrlMatch {
                url: indexed.url.clone(),
                title_hint: indexed.title_hint.clone(),
                score,
                reasons,
            })
        })
        .collect();

    matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    matches.truncate(max_results);
    matches
}
