//! Configuration data model and YAML loader.
//!
//! Mirrors the teacher's `SystemConfig::load` shape, generalized from TOML
//! to YAML: a data model plus a pure loader function. The hot-reload
//! admin API stays an external collaborator.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A single documentation origin: a web URL with optional selectors and
/// sitemap hint, or a local directory with glob patterns. Modeled as a
/// discriminated union tagged on `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Source {
    Web(WebSource),
    Local(LocalSource),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSource {
    pub url: String,
    #[serde(default)]
    pub selectors: Option<Selectors>,
    #[serde(default)]
    pub sitemap_url: Option<String>,
    #[serde(default = "default_index_depth")]
    pub index_depth: u32,
}

fn default_index_depth() -> u32 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selectors {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub exclude: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalSource {
    pub path: PathBuf,
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,
}

fn default_patterns() -> Vec<String> {
    vec!["*.md".to_string(), "*.txt".to_string()]
}

/// Configuration for a single tool's documentation corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    pub name: String,
    pub description: String,
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionSettings {
    pub enabled: bool,
    pub aggressiveness: f64,
    pub min_content_length: usize,
    pub analysis_aggressiveness: f64,
    pub synthesis_aggressiveness: f64,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            aggressiveness: 0.5,
            min_content_length: 1000,
            analysis_aggressiveness: 0.4,
            synthesis_aggressiveness: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SitemapIndexSettings {
    pub enabled: bool,
    pub ttl: i64,
    pub max_urls_per_domain: usize,
    pub parallel_fetch_limit: usize,
    pub min_match_score: f64,
    pub max_url_candidates: usize,
    pub crawl_depth: u32,
}

impl Default for SitemapIndexSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: 86_400,
            max_urls_per_domain: 1000,
            parallel_fetch_limit: 10,
            min_match_score: 1.0,
            max_url_candidates: 5,
            crawl_depth: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub max_content_length: usize,
    pub request_timeout: u64,
    pub cache_ttl: i64,
    pub compression: CompressionSettings,
    pub sitemap_index: SitemapIndexSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_content_length: 50_000,
            request_timeout: 30,
            cache_ttl: 3600,
            compression: CompressionSettings::default(),
            sitemap_index: SitemapIndexSettings::default(),
        }
    }
}

/// Root configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub tools: HashMap<String, ToolConfig>,
    #[serde(default)]
    pub settings: Settings,
}

impl Config {
    /// Load configuration from a YAML file. Unlike the original Python
    /// loader, a missing file is a `ConfigError::NotFound` here rather
    /// than a silently empty config — callers that want that fallback can
    /// match on the error.
    pub fn load_yaml(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}
