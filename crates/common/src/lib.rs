//! Shared types, configuration model, and error domain used across all
//! `docsearch-*` crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::*;
pub use error::ConfigError;
pub use types::*;
