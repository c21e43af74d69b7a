//! Command-line interface.

use crate::build::source::collect;
use crate::config::Config;
use crate::error::Result;
use crate::format::{
    render_documents, render_object, render_search_results, render_suggestions,
    render_validation,
};
use crate::index::validate;
use crate::server::IndexServer;
use crate::tools::build::build_index;
use crate::worker::{IndexState, spawn_watcher};
use anyhow::anyhow;
use clap::{Parser, Subcommand};
use rmcp::{ServiceExt, transport::stdio};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Parser)]
#[command(name = "sphinx-index-mcp", version)]
#[command(about = "Query and build Sphinx documentation search indexes", long_about = None)]
pub struct Cli {
    /// Config file (default: ./sphinx-index.toml, then the user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Search index to use instead of the configured default
    #[arg(short, long, global = true, env = "SPHINX_INDEX_PATH")]
    pub index: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the MCP tools over stdio (default)
    Serve,
    /// Search the index
    Search {
        query: String,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Look up an object by full or short name
    Lookup {
        name: String,
        #[arg(short = 'n', long, default_value = "5")]
        limit: usize,
    },
    /// Check the index for structural problems
    Validate,
    /// List the pages of the index
    Documents {
        /// Only show pages whose docname or title contains this text
        filter: Option<String>,
    },
    /// Build a searchindex.js from documentation sources
    Build {
        source: PathBuf,
        #[arg(short, long, default_value = "searchindex.js")]
        output: PathBuf,
        /// List the collected pages without writing anything
        #[arg(long)]
        dry_run: bool,
    },
}

impl Cli {
    /// Run the selected command. Output goes to stdout.
    pub async fn run(self) -> Result<()> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(index) = self.index {
            config.index.path = Some(index);
        }
        let state = Arc::new(IndexState::new(config));

        match self.command.unwrap_or(Commands::Serve) {
            Commands::Serve => serve(state).await,
            Commands::Search { query, limit } => {
                let loaded = state.resolve(None).await?;
                let limit = state.config().search.effective_limit(limit);
                let results = state.engine().search(&loaded.index, &query, limit);
                print!("{}", render_search_results(&query, &results));
                Ok(())
            }
            Commands::Lookup { name, limit } => {
                let loaded = state.resolve(None).await?;
                let engine = state.engine();
                let matches = engine.find_objects(&loaded.index, &name);
                if matches.is_empty() {
                    let suggestions = engine.suggest_objects(&loaded.index, &name, limit);
                    print!("{}", render_suggestions(&name, &suggestions));
                    return Err(anyhow!("object '{}' not found", name));
                }
                for object in matches.iter().take(limit) {
                    println!("{}", render_object(&loaded.index, object));
                }
                Ok(())
            }
            Commands::Validate => {
                let loaded = state.resolve(None).await?;
                let report = validate(&loaded.index);
                print!(
                    "{}",
                    render_validation(&loaded.path, &loaded.index.stats(), &report)
                );
                if report.is_valid() {
                    Ok(())
                } else {
                    Err(anyhow!("{} failed validation", loaded.path.display()))
                }
            }
            Commands::Documents { filter } => {
                let loaded = state.resolve(None).await?;
                print!("{}", render_documents(&loaded.index, filter.as_deref()));
                Ok(())
            }
            Commands::Build {
                source,
                output,
                dry_run,
            } => {
                if dry_run {
                    for page in collect(&source)? {
                        println!(
                            "{} ({}, {} objects)",
                            page.docname,
                            page.title,
                            page.objects.len()
                        );
                    }
                    return Ok(());
                }
                let (path, stats) =
                    tokio::task::spawn_blocking(move || build_index(&source, &output)).await??;
                println!(
                    "Wrote {}: {}",
                    path.display(),
                    crate::format::render_stats(&stats)
                );
                Ok(())
            }
        }
    }
}

async fn serve(state: Arc<IndexState>) -> Result<()> {
    tracing::info!("Starting sphinx-index-mcp MCP server");

    if let Some(path) = state.active().await {
        match state.get(&path).await {
            Ok(loaded) => tracing::info!("Preloaded search index {}", loaded.path.display()),
            Err(e) => tracing::warn!("Configured search index unavailable: {}", e),
        }
    }

    let cancel = CancellationToken::new();
    let watcher = spawn_watcher(state.clone(), cancel.clone());

    let server = IndexServer::new(state);
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Error serving MCP server: {:?}", e);
    })?;

    service.waiting().await?;

    cancel.cancel();
    let _ = watcher.await;
    Ok(())
}
