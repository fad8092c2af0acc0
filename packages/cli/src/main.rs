//! GraphIndex CLI
//!
//! Rebuilds the search index from a content graph snapshot, or removes index
//! generations no alias points to.
//!
//! # Usage
//!
//! ```bash
//! # Full rebuild of the live workspace
//! graphindex build --graph snapshot.json
//!
//! # Update the live generations in place, first 500 nodes per combination
//! graphindex build --graph snapshot.json --update --limit 500
//!
//! # Remove stale generations
//! graphindex cleanup --graph snapshot.json
//! ```
//!
//! # Environment Variables
//!
//! - `GRAPHINDEX_*`: override configuration values (see `graphindex_core::config`)
//! - `RUST_LOG`: logging filter (default: `graphindex=info,graphindex_core=info`)

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use graphindex_core::{
    BuildOptions, GraphIndexConfig, HttpSearchBackend, InMemoryContentGraph,
    InMemorySearchBackend, IndexingOrchestrator, SearchBackend,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build new index generations and swap the aliases over
    Build {
        #[command(flatten)]
        common: CommonArgs,

        /// Generation postfix (default: current unix time)
        #[arg(long)]
        postfix: Option<String>,

        /// Write into the live generations instead of creating new ones
        #[arg(long)]
        update: bool,

        /// Stop each dimension combination after this many nodes
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Delete every generation no alias points to
    Cleanup {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Content graph snapshot (JSON)
    #[arg(long)]
    graph: PathBuf,

    /// Workspace to index (default: configured default workspace)
    #[arg(long)]
    workspace: Option<String>,

    /// Configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use an in-memory backend instead of the configured endpoint
    #[arg(long)]
    dry_run: bool,
}

impl CommonArgs {
    fn orchestrator(&self) -> Result<IndexingOrchestrator> {
        let config = GraphIndexConfig::load(self.config.as_deref())?;
        let graph = Arc::new(InMemoryContentGraph::load(&self.graph)?);

        let backend: Arc<dyn SearchBackend> = if self.dry_run {
            tracing::info!("Dry run, writing to an in-memory backend");
            Arc::new(InMemorySearchBackend::new())
        } else {
            tracing::info!("Using search backend at {}", config.backend.endpoint);
            Arc::new(HttpSearchBackend::new(config.backend.clone())?)
        };

        Ok(IndexingOrchestrator::new(graph, backend, config.indexer))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("graphindex=info,graphindex_core=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            common,
            postfix,
            update,
            limit,
        } => {
            let orchestrator = common.orchestrator()?;
            let report = orchestrator
                .build(BuildOptions {
                    postfix,
                    update,
                    limit,
                    workspace: common.workspace.clone(),
                })
                .await?;

            for combination in &report.combinations {
                println!(
                    "{}\t{}\t{} nodes\t{} documents\t{} failed",
                    combination.generation.name,
                    combination.combination,
                    combination.nodes,
                    combination.documents,
                    combination.flush.errors()
                );
            }
            println!(
                "Indexed {} nodes as {} documents with postfix {} in {:?} ({} errors)",
                report.nodes(),
                report.documents(),
                report.postfix,
                report.duration,
                report.error_count
            );
        }
        Command::Cleanup { common } => {
            let orchestrator = common.orchestrator()?;
            let removed = orchestrator.cleanup(common.workspace.as_deref()).await?;
            for name in &removed {
                println!("Removed {}", name);
            }
            println!("Removed {} stale indices", removed.len());
        }
    }

    Ok(())
}
