//! Thin CLI binary demonstrating the `docsearch-engine` library
//! in-process, the way a single-process caller would embed it. The
//! HTTP/stdio surface is a separate, out-of-scope collaborator.

pub mod commands;
pub mod completions;
pub mod setup;
