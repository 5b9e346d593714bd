//! Local filesystem documentation source, folded into the engine as a
//! single excerpt. Grounded on
//! `original_source/doc2mcp/fetchers/local.py::LocalFetcher`
//! (glob patterns, UTF-8-with-latin-1-fallback read, `# File: <rel>`
//! section headers), walked with `walkdir` per
//! `josephjohncox-axiograph`'s directory-traversal idiom rather than the
//! teacher's `notify`-based watcher (this is a one-shot read, not a
//! watch).

use std::path::{Path, PathBuf};

use glob::Pattern;
use thiserror::Error;
use tracing::instrument;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum LocalFetchError {
    #[error("documentation path not found: {0}")]
    NotFound(PathBuf),
}

/// Match a file name against a glob pattern like `*.md`. An unparseable
/// pattern matches nothing rather than erroring.
fn matches_pattern(name: &str, pattern: &str) -> bool {
    Pattern::new(pattern).map(|p| p.matches(name)).unwrap_or(false)
}

fn read_text_lossy(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8(bytes.clone()).unwrap_or_else(|_| {
        bytes.iter().map(|&b| b as char).collect::<String>()
    }))
}

/// Fetch and concatenate every file under `path` matching any of
/// `patterns`, each prefixed with a `# File: <relative path>` header. A
/// single file path is read directly, bypassing pattern matching.
#[instrument(skip(patterns))]
pub async fn fetch(path: &Path, patterns: &[String]) -> Result<String, LocalFetchError> {
    let path = path.to_path_buf();
    let patterns = patterns.to_vec();
    tokio::task::spawn_blocking(move || fetch_blocking(&path, &patterns))
        .await
        .expect("local fetch task panicked")
}

fn fetch_blocking(base_path: &Path, patterns: &[String]) -> Result<String, LocalFetchError> {
    if !base_path.exists() {
        return Err(LocalFetchError::NotFound(base_path.to_path_buf()));
    }

    if base_path.is_file() {
        return Ok(read_text_lossy(base_path).unwrap_or_default());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(base_path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy();
            patterns.iter().any(|pattern| matches_pattern(&name, pattern))
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();

    let mut parts = Vec::new();
    for file_path in files {
        let Ok(content) = read_text_lossy(&file_path) else { continue };
        let relative = file_path.strip_prefix(base_path).unwrap_or(&file_path);
        parts.push(format!("# File: {}\n\n{}", relative.display(), content));
    }

    Ok(parts.join("\n\n---\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_star_matches_extension() {
        assert!(matches_pattern("readme.md", "*.md"));
        assert!(!matches_pattern("readme.txt", "*.md"));
    }

    #[test]
    fn glob_question_mark_matches_one_char() {
        assert!(matches_pattern("a.md", "?.md"));
        assert!(!matches_pattern("ab.md", "?.md"));
    }

    #[tokio::test]
    async fn fetch_concatenates_matching_files_with_headers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "Alpha content").unwrap();
        std::fs::write(dir.path().join("b.txt"), "ignored").unwrap();

        let content = fetch(dir.path(), &["*.md".to_string()]).await.unwrap();
        assert!(content.contains("# File: a.md"));
        assert!(content.contains("Alpha content"));
        assert!(!content.contains("ignored"));
    }

    #[tokio::test]
    async fn fetch_missing_path_errors() {
        let result = fetch(Path::new("/nonexistent/doc/path"), &["*.md".to_string()]).await;
        assert!(matches!(result, Err(LocalFetchError::NotFound(_))));
    }

    #[tokio::test]
    async fn fetch_single_file_bypasses_patterns() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.rst");
        std::fs::write(&file, "Notes body").unwrap();
        let content = fetch(&file, &["*.md".to_string()]).await.unwrap();
        assert_eq!(content, "Notes body");
    }
}
