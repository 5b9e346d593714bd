//! `docsearch search <tool> <query>` — runs one query to completion and
//! prints the synthesized answer, mirroring `DocSearchAgent.search`'s
//! top-level entry point but as a one-shot command instead of an MCP
//! tool call.

use tokio_util::sync::CancellationToken;

use docsearch_engine::{SearchEngine, SearchOutput};

pub async fn run(engine: &SearchEngine, tool_id: &str, query: &str) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            watcher.cancel();
        }
    });

    match engine.search(tool_id, query, cancel).await {
        SearchOutput::Found(outcome) => {
            println!("{}\n", outcome.content);
            println!("---");
            println!("Tool: {} ({})", outcome.tool.name, outcome.tool.id);
            println!("Pages explored: {}", outcome.pages_explored);
            if outcome.sitemap_used {
                println!("Sitemap candidates considered: {}", outcome.sitemap_candidates);
            }
            if !outcome.sources.is_empty() {
                println!("Sources:");
                for source in &outcome.sources {
                    println!("  - {source}");
                }
            }
            Ok(())
        }
        SearchOutput::NotFound(err) => {
            eprintln!("error: {}", err.error);
            if let Some(available) = err.available_tools {
                eprintln!("available tools: {}", available.join(", "));
            }
            std::process::exit(1);
        }
        SearchOutput::SynthesisFailed(err) => {
            eprintln!("error: {}", err.error);
            if let Some(sources) = err.sources {
                eprintln!("gathered {} source(s) before synthesis failed", sources.len());
            }
            std::process::exit(1);
        }
        SearchOutput::Cancelled => {
            eprintln!("search cancelled");
            std::process::exit(130);
        }
    }
}
