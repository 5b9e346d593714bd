//! Atomic JSON file persistence primitive.
//!
//! Generalizes the teacher's one-adapter-per-backend pattern
//! (`QdrantClient`/`RedisCache`/`PostgresClient`, each a small struct
//! wrapping a concrete store) to a single file-backed backend: the page
//! cache and the domain index both persist as "one JSON document, atomic
//! rename", not an external database. Swapping in a real KV store behind
//! `load`/`save` later would not change any caller.

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Load a JSON document from `path`. Returns `T::default()` (via
/// `Default`) when the file does not exist, or when it exists but fails
/// to parse — mirroring `cache.py`/`sitemap_index.py`'s tolerant
/// `_load_cache`/`_load_index` ("corrupt on disk" degrades to empty
/// rather than crashing construction).
pub async fn load<T>(path: impl AsRef<Path>) -> T
where
    T: DeserializeOwned + Default,
{
    let path = path.as_ref();
    let Ok(content) = tokio::fs::read_to_string(path).await else {
        return T::default();
    };
    serde_json::from_str(&content).unwrap_or_default()
}

/// Serialize `value` as pretty JSON and atomically replace `path`: write
/// to a sibling temp file, then rename over the destination. Rename is
/// atomic on the same filesystem, so no reader ever observes a partial
/// write.
pub async fn save<T>(path: impl AsRef<Path>, value: &T) -> Result<(), PersistError>
where
    T: Serialize,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| PersistError::Write {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
    }

    let serialized = serde_json::to_string_pretty(value).map_err(|source| PersistError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp_path = tmp_path_for(path);
    tokio::fs::write(&tmp_path, serialized.as_bytes())
        .await
        .map_err(|source| PersistError::Write {
            path: tmp_path.clone(),
            source,
        })?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|source| PersistError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "tmp".to_string());
    path.with_file_name(format!(".{file_name}.tmp"))
}
