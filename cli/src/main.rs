//! reelsync command line
//!
//! Runs one sync cycle against a directory of JSON fixtures and reports
//! what changed:
//!
//! Usage:
//!   reelsync --db catalog.db --fixtures ./fixtures
//!   reelsync --db catalog.db --fixtures ./fixtures --domain series
//!
//! Each fixture is a `DomainPayload` named after its domain
//! (`movies.json`, `series.json`, `live_channels.json`).

use std::{path::PathBuf, sync::Arc};
use anyhow::{Context, Result};
use clap::Parser;
use reelsync_cli::{describe_diff, describe_state, load_config, FixtureSource};
use reelsync_storage::CatalogStore;
use reelsync_sync::{
    content_state, CacheLedger, EventBus, PrefixGrouper, SyncCoordinator, SyncResult,
    SyncStatusBoard,
};
use reelsync_types::ContentDomain;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reelsync")]
#[command(about = "Mirror a media catalog into a local store and report changes")]
struct Args {
    /// Path to the SQLite catalog database
    #[arg(long, default_value = "reelsync.db")]
    db: PathBuf,

    /// Directory holding <domain>.json fixtures
    #[arg(short, long)]
    fixtures: PathBuf,

    /// JSON file with sync configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sync a single domain (movies, series, live_channels)
    #[arg(short, long)]
    domain: Option<ContentDomain>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .compact()
        .init();

    let config = load_config(args.config.as_deref())?;
    let store = CatalogStore::open(&args.db)
        .with_context(|| format!("Failed to open catalog at {}", args.db.display()))?;
    let ledger = CacheLedger::load(store.clone())
        .await
        .context("Failed to load cache ledger")?;
    info!("Opened catalog at {}", args.db.display());

    let bus = EventBus::new(config.event_buffer);
    let mut diffs = bus.subscribe();
    let coordinator = SyncCoordinator::new(
        Arc::new(FixtureSource::new(&args.fixtures)),
        Arc::new(PrefixGrouper),
        store,
        ledger,
        bus,
        SyncStatusBoard::new(),
        config,
    );

    let result = match args.domain {
        Some(domain) => coordinator.sync_domain(domain).await,
        None => coordinator.sync_all().await,
    };

    println!("\n========================================");
    println!("  Sync Result");
    println!("========================================");
    match &result {
        SyncResult::Success { total_diffs, .. } => println!("  Succeeded, {total_diffs} changes"),
        SyncResult::Failure { cause } => println!("  Failed: {cause}"),
    }

    while let Some(batch) = diffs.try_recv() {
        for diff in batch.iter() {
            println!("  {}", describe_diff(diff));
        }
    }

    println!("\n  Content:");
    for domain in ContentDomain::ALL {
        let state = content_state(domain, coordinator.status(), coordinator.ledger());
        println!("  {:<14} {}", domain.as_str(), describe_state(&state));
    }
    println!("========================================\n");

    if let SyncResult::Failure { cause } = result {
        warn!("Every domain failed");
        anyhow::bail!("sync failed: {cause}");
    }
    Ok(())
}
