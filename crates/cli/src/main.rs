use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use docsearch_cli::{commands, completions, setup::SetupOverrides};

#[derive(Parser)]
#[command(name = "docsearch")]
#[command(about = "LLM-steered documentation search")]
struct Cli {
    /// Path to the tools config YAML. Defaults to $DOCSEARCH_TOOLS_CONFIG
    /// or ./tools.yaml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory the page cache and URL index are persisted under.
    /// Defaults to $DOCSEARCH_CACHE_DIR or ./.docsearch_cache.
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a documentation search for one configured tool.
    Search {
        /// Id of the configured tool to search.
        tool: String,
        /// Natural-language query.
        query: String,
        /// Maximum number of pages to explore before synthesizing.
        #[arg(long)]
        max_pages: Option<usize>,
    },
    /// List configured tools.
    Tools,
    /// Inspect or clear the persistent page cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Inspect or clear the persistent per-domain URL index.
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },
    /// Generate shell completion scripts.
    Completions {
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Remove cached pages, optionally scoped to one domain.
    Clear {
        #[arg(long)]
        domain: Option<String>,
    },
    /// List cached pages, optionally scoped to one domain.
    List {
        #[arg(long)]
        domain: Option<String>,
    },
}

#[derive(Subcommand)]
enum IndexAction {
    /// Remove a domain's URL index, optionally scoped to one domain.
    Clear {
        #[arg(long)]
        domain: Option<String>,
    },
    /// Show indexing stats for one domain.
    Stats {
        domain: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        completions::generate(shell, Cli::command());
        return Ok(());
    }

    let overrides = SetupOverrides {
        tools_config: cli.config,
        cache_dir: cli.cache_dir,
        max_pages: match &cli.command {
            Commands::Search { max_pages, .. } => *max_pages,
            _ => None,
        },
    };
    let engine = docsearch_cli::setup::build_engine(&overrides).await?;

    match cli.command {
        Commands::Search { tool, query, .. } => {
            commands::search::run(&engine, &tool, &query).await?;
        }
        Commands::Tools => {
            commands::tools::run(&engine);
        }
        Commands::Cache { action } => match action {
            CacheAction::Clear { domain } => commands::cache::clear(engine.cache(), domain.as_deref()).await?,
            CacheAction::List { domain } => commands::cache::list(engine.cache(), domain.as_deref()).await,
        },
        Commands::Index { action } => match action {
            IndexAction::Clear { domain } => commands::index::clear(engine.indexer(), domain.as_deref()).await?,
            IndexAction::Stats { domain } => commands::index::stats(engine.indexer(), &domain).await,
        },
        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
