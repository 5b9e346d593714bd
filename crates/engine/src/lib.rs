//! The navigator, synthesizer, and search engine that together
//! implement the deep-research loop.
//! Grounded on `original_source/doc2mcp/agents/doc_search.py`
//! (`DocSearchAgent`) for control flow, restructured using the
//! teacher's `WebCrawlerRetriever::retrieve` orchestration shape (tier
//! loop -> cache check -> fetch -> dedupe -> collect,
//! `ai-agent-rag/src/web_crawler.rs`).

mod frontier;
mod navigator;
mod search_engine;
mod synthesizer;

pub use navigator::analyze as analyze_page;
pub use search_engine::{SearchEngine, SearchEngineDeps, SearchOutput};
pub use synthesizer::{enforce_output_cap, synthesize, Excerpt};
