//! Exercises `setup::build_engine`'s config/cache-dir resolution and the
//! `cache`/`index` subcommand backends end to end against a temp
//! directory, the way `engine`'s own integration tests drive
//! `SearchEngine` through `wiremock`.

use docsearch_cli::commands;
use docsearch_cli::setup::{build_engine, SetupOverrides};

fn write_tools_yaml(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("tools.yaml");
    std::fs::write(
        &path,
        r#"
tools:
  rustlang:
    name: Rust
    description: The Rust language docs
    sources:
      - type: web
        url: https://doc.rust-lang.org/book/
"#,
    )
    .unwrap();
    path
}

#[tokio::test]
async fn build_engine_loads_configured_tools() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_tools_yaml(dir.path());
    let overrides = SetupOverrides {
        tools_config: Some(config_path),
        cache_dir: Some(dir.path().join("cache")),
        max_pages: None,
    };

    let engine = build_engine(&overrides).await.unwrap();
    let tools = engine.list_tools();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].id, "rustlang");
}

#[tokio::test]
async fn build_engine_tolerates_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let overrides = SetupOverrides {
        tools_config: Some(dir.path().join("nonexistent.yaml")),
        cache_dir: Some(dir.path().join("cache")),
        max_pages: None,
    };

    let engine = build_engine(&overrides).await.unwrap();
    assert!(engine.list_tools().is_empty());
}

#[tokio::test]
async fn cache_clear_removes_only_matching_domain() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_tools_yaml(dir.path());
    let overrides = SetupOverrides {
        tools_config: Some(config_path),
        cache_dir: Some(dir.path().join("cache")),
        max_pages: None,
    };
    let engine = build_engine(&overrides).await.unwrap();

    engine
        .cache()
        .put("https://a.example.com/x", "A", "summary", "content", vec![], "a.example.com")
        .await
        .unwrap();
    engine
        .cache()
        .put("https://b.example.com/y", "B", "summary", "content", vec![], "b.example.com")
        .await
        .unwrap();

    commands::cache::clear(engine.cache(), Some("a.example.com")).await.unwrap();

    assert!(engine.cache().get("https://a.example.com/x").await.is_none());
    assert!(engine.cache().get("https://b.example.com/y").await.is_some());
}

#[tokio::test]
async fn index_stats_reports_none_for_unindexed_domain() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_tools_yaml(dir.path());
    let overrides = SetupOverrides {
        tools_config: Some(config_path),
        cache_dir: Some(dir.path().join("cache")),
        max_pages: None,
    };
    let engine = build_engine(&overrides).await.unwrap();

    // No panics, no indexing side effects — just confirms the plumbing
    // reaches DomainIndexer::stats with the right path.
    commands::index::stats(engine.indexer(), "unindexed.example.com").await;
}
