//! One discovery pass followed by one market-data refresh
//!
//! ```text
//! cargo run --example sync_once
//! ```
//!
//! Reads configuration from the environment (a `.env` file is honoured).
//! `RUST_LOG` controls verbosity, e.g. `RUST_LOG=catalog_sync=debug`.

use catalog_sync::{CatalogSync, Config, Database, HttpCatalogClient};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let started = Instant::now();
    match run().await {
        Ok(()) => {
            tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "Sync finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Sync failed"
            );
            ExitCode::FAILURE
        }
    }
}

async fn run() -> catalog_sync::Result<()> {
    let config = Config::from_env()?;

    let db = Arc::new(Database::new(&config.store.database_path).await?);
    let client = Arc::new(HttpCatalogClient::new(&config.catalog)?);
    let sync = CatalogSync::new(&config, client, db.clone());

    let discovery = sync.discover_new_entries().await?;
    tracing::info!(
        upstream = discovery.upstream_total,
        inserted = discovery.inserted,
        "Discovery complete"
    );

    let report = sync.refresh_market_data().await?;
    tracing::info!(
        ids_found = report.ids_found,
        snapshots_fetched = report.snapshots_fetched,
        records_updated = report.records_updated,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Refresh complete"
    );

    drop(sync);
    if let Ok(db) = Arc::try_unwrap(db) {
        db.close().await;
    }
    Ok(())
}
