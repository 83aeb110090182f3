//! # catalog-sync
//!
//! Keeps a local SQLite catalog in step with a remote market-data catalog.
//!
//! ## Design Philosophy
//!
//! catalog-sync is designed to be:
//! - **Self-tuning** - Batch size and pacing adapt to the upstream's size and rate limits at runtime
//! - **Complete** - Every stored identifier lands in exactly one successful request, or the run fails
//! - **Failure-isolating** - One bad record never aborts the writes around it
//! - **Library-first** - Jobs are plain async functions; scheduling is left to the embedder
//!
//! ## Quick Start
//!
//! ```no_run
//! use catalog_sync::{CatalogSync, Config, Database, HttpCatalogClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!
//!     let client = Arc::new(HttpCatalogClient::new(&config.catalog)?);
//!     let store = Arc::new(Database::new(&config.store.database_path).await?);
//!     let sync = CatalogSync::new(&config, client, store);
//!
//!     let discovered = sync.discover_new_entries().await?;
//!     let report = sync.refresh_market_data().await?;
//!     println!("{} new, {} updated", discovered.inserted, report.records_updated);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Remote catalog client
pub mod catalog;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Discovery of new catalog entries
pub mod discovery;
/// Error types
pub mod error;
/// Rate-adaptive batch fetching
pub mod fetcher;
/// Snapshot to record reconciliation
pub mod reconcile;
/// Record store seam
pub mod store;
/// Sync orchestration
pub mod sync;
/// Core types
pub mod types;
/// Bounded concurrent record writes
pub mod upsert;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use catalog::{CatalogClient, HttpCatalogClient};
pub use config::{CatalogConfig, Config, FetchConfig, StoreConfig};
pub use db::{Database, NewCatalogEntry};
pub use error::{DatabaseError, Error, FetchError, Result};
pub use fetcher::{ClassifyFailure, FailureClass, RateAdaptiveFetcher};
pub use store::CatalogStore;
pub use sync::CatalogSync;
pub use types::{
    BasicEntry, CatalogId, DiscoveryReport, MarketSnapshot, NetworkAddress, NormalizedRecord,
    SyncReport,
};
pub use upsert::BoundedUpserter;
