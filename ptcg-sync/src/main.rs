//! ptcg-sync command-line entry point
//!
//! Subcommands:
//! - `seed-sets`: import the set catalog from a JSON listing document
//! - `sync`: resolve every card of every known set, newest set first
//! - `retry`: re-run a previously exported retry backlog
//! - `catalog`: refresh the card vocabulary (types, subtypes, rarities, ...)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ptcg_sync::services::{
    import_sets_file, refresh_from_cards, refresh_from_source, PokemonTcgClient,
};
use ptcg_sync::{
    ConfigOverrides, FetchMode, FsSnapshotLoader, ResolutionPipeline, RetryBacklog, RunSummary,
    SnapshotCache, SqliteCatalogStore, SyncConfig, SyncOrchestrator,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "ptcg-sync", version)]
#[command(about = "Synchronize the Pokémon TCG card catalog into SQLite")]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, value_name = "FILE")]
    database: Option<PathBuf>,

    /// Root of the local snapshot tree
    #[arg(long, global = true, value_name = "DIR")]
    data_root: Option<PathBuf>,

    /// Snapshot language
    #[arg(long, global = true)]
    language: Option<String>,

    /// Workers per set
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// TOML config file (defaults to ~/.config/ptcg/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import sets from a `{"data": [...]}` document
    SeedSets {
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
    },

    /// Resolve every card of every known set
    Sync {
        /// Consult the remote catalog before deferring a card
        #[arg(long)]
        remote: bool,

        /// Write unresolved cards to this JSON file
        #[arg(long, value_name = "FILE")]
        backlog_out: Option<PathBuf>,
    },

    /// Retry cards from an exported backlog
    Retry {
        #[arg(long, value_name = "FILE")]
        backlog: PathBuf,

        /// Consult the remote catalog before deferring a card
        #[arg(long)]
        remote: bool,

        /// Where to write cards still unresolved (defaults to the input file)
        #[arg(long, value_name = "FILE")]
        backlog_out: Option<PathBuf>,
    },

    /// Refresh the card vocabulary from stored cards, or from the remote listings
    Catalog {
        /// Fetch the listings from the remote catalog
        #[arg(long)]
        remote: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting ptcg-sync v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let cli = Cli::parse();

    let remote_flag = match &cli.command {
        Command::Sync { remote, .. }
        | Command::Retry { remote, .. }
        | Command::Catalog { remote } => remote.then_some(true),
        Command::SeedSets { .. } => None,
    };
    let toml = ptcg_common::config::load_config_file(cli.config.as_deref())?;
    let config = SyncConfig::resolve(
        ConfigOverrides {
            database: cli.database,
            data_root: cli.data_root,
            language: cli.language,
            concurrency: cli.concurrency,
            remote_enabled: remote_flag,
        },
        toml,
    )?;

    info!("Database: {}", config.database_path.display());
    let store = Arc::new(SqliteCatalogStore::open(&config.database_path).await?);

    match cli.command {
        Command::SeedSets { file } => {
            let written = import_sets_file(store.as_ref(), &file)
                .await
                .with_context(|| format!("Seeding sets from {}", file.display()))?;
            info!("Seeded {} sets from {}", written, file.display());
        }
        Command::Sync { backlog_out, .. } => {
            let (orchestrator, mode) = build_orchestrator(&config, store)?;
            let summary = orchestrator.run(mode).await?;
            report(&summary)?;
            finish_backlog(orchestrator.pipeline().backlog(), backlog_out.as_deref()).await?;
        }
        Command::Retry {
            backlog,
            backlog_out,
            ..
        } => {
            let entries = RetryBacklog::load_json(&backlog)
                .await
                .with_context(|| format!("Reading backlog {}", backlog.display()))?;
            let (orchestrator, mode) = build_orchestrator(&config, store)?;
            let summary = orchestrator.retry(entries, mode).await;
            report(&summary)?;
            let out = backlog_out.unwrap_or(backlog);
            orchestrator.pipeline().backlog().export_json(&out).await?;
        }
        Command::Catalog { .. } => {
            let written = if config.remote_enabled {
                let client = remote_client(&config)?;
                refresh_from_source(store.as_ref(), &client).await?
            } else {
                refresh_from_cards(store.as_ref()).await?
            };
            info!("Catalog vocabulary refreshed with {} values", written);
        }
    }

    Ok(())
}

fn build_orchestrator(
    config: &SyncConfig,
    store: Arc<SqliteCatalogStore>,
) -> Result<(SyncOrchestrator, FetchMode)> {
    info!(
        "Snapshots: {} (language {})",
        config.data_root.display(),
        config.language
    );
    let loader = FsSnapshotLoader::new(&config.data_root, &config.language);
    let cache = Arc::new(SnapshotCache::new(Arc::new(loader)));
    let mut pipeline = ResolutionPipeline::new(store.clone(), cache, Arc::new(RetryBacklog::new()));

    let mode = if config.remote_enabled {
        pipeline = pipeline.with_remote(Arc::new(remote_client(config)?));
        FetchMode::WithRemote
    } else {
        FetchMode::LocalOnly
    };

    let orchestrator = SyncOrchestrator::new(store, Arc::new(pipeline), config.concurrency);
    Ok((orchestrator, mode))
}

fn remote_client(config: &SyncConfig) -> Result<PokemonTcgClient> {
    if config.api_key.is_none() {
        warn!("Remote tier enabled without an API key; requests are heavily rate limited");
    }
    Ok(PokemonTcgClient::new(
        config.api_base_url.clone(),
        config.api_key.clone(),
        config.remote_interval(),
    )?)
}

fn report(summary: &RunSummary) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

async fn finish_backlog(backlog: &RetryBacklog, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            backlog.export_json(path).await?;
        }
        None if !backlog.is_empty() => {
            warn!(
                "{} cards left unresolved; pass --backlog-out to keep them",
                backlog.len()
            );
        }
        None => {}
    }
    Ok(())
}
