//! Per-domain error enums. Each crate that owns a failure domain defines its
//! own `thiserror` enum; this module holds the one shared across crate
//! boundaries plus re-exports for convenience at call sites.

use thiserror::Error;

/// Raised at construction time only (missing LLM credentials, an
/// unreadable config or cache file). Per-query failures never surface
/// this type; exploration degrades instead of propagating errors up.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(std::path::PathBuf),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
