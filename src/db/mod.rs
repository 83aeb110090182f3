//! Database layer for catalog-sync
//!
//! Handles SQLite persistence for catalog entries and their market data.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`]: Database lifecycle, schema migrations
//! - [`entries`]: Catalog entry inserts, identifier listing, market-data updates

use crate::types::{CatalogId, NetworkAddress};
use sqlx::{FromRow, sqlite::SqlitePool};

mod entries;
mod migrations;

/// New catalog entry to be inserted during discovery
#[derive(Debug, Clone, PartialEq)]
pub struct NewCatalogEntry {
    /// Catalog identifier
    pub id: CatalogId,
    /// Display name
    pub name: String,
    /// Ticker symbol
    pub symbol: String,
    /// Networks the entry is deployed on
    pub networks: Vec<NetworkAddress>,
    /// Unix timestamp when the entry was discovered
    pub created_at: i64,
    /// Unix timestamp of the last write
    pub updated_at: i64,
}

/// Catalog entry record from database
#[derive(Debug, Clone, FromRow)]
pub struct CatalogEntry {
    /// Catalog identifier
    pub id: CatalogId,
    /// Display name
    pub name: String,
    /// Ticker symbol
    pub symbol: String,
    /// JSON array of `{networkId, address}` objects
    pub networks: String,
    /// Logo URL (empty until the first market-data refresh)
    pub image_url: String,
    /// Current price (-1 when unknown)
    pub price: f64,
    /// JSON array of stringified 7-day price samples
    pub price_history: String,
    /// Price change over 24 hours, percent
    pub price_change_24h: f64,
    /// Price change over 7 days, percent
    pub price_change_7d: f64,
    /// Price change over 30 days, percent
    pub price_change_30d: f64,
    /// Price change over 1 year, percent
    pub price_change_1y: f64,
    /// Market capitalization
    pub market_cap: f64,
    /// Circulating supply
    pub circulating_supply: f64,
    /// Fully diluted valuation
    pub fully_diluted_valuation: f64,
    /// Total supply
    pub total_supply: f64,
    /// Unix timestamp when the entry was discovered
    pub created_at: i64,
    /// Unix timestamp of the last write
    pub updated_at: i64,
}

impl CatalogEntry {
    /// Decode the stored network list
    pub fn network_list(&self) -> serde_json::Result<Vec<NetworkAddress>> {
        serde_json::from_str(&self.networks)
    }

    /// Decode the stored price history
    pub fn price_samples(&self) -> serde_json::Result<Vec<String>> {
        serde_json::from_str(&self.price_history)
    }
}

/// Database handle for catalog-sync
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
