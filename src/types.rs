//! Core types for catalog-sync

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Opaque, stable identifier of one catalog entry
#[derive(
    Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CatalogId(pub String);

impl CatalogId {
    /// Create a new CatalogId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CatalogId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CatalogId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl PartialEq<str> for CatalogId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for CatalogId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl std::borrow::Borrow<str> for CatalogId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CatalogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// Implement sqlx Type, Encode, and Decode for database operations
impl sqlx::Type<sqlx::Sqlite> for CatalogId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <String as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for CatalogId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for CatalogId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <String as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self(id))
    }
}

/// Catalog entry as returned by the entry-list endpoint
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BasicEntry {
    /// Catalog identifier
    pub id: CatalogId,
    /// Ticker symbol
    #[serde(default, deserialize_with = "null_as_default")]
    pub symbol: String,
    /// Display name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Network name → contract address (address may be null upstream)
    #[serde(default, deserialize_with = "null_as_default")]
    pub platforms: HashMap<String, Option<String>>,
}

/// One deployment of an entry on a network, as stored
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAddress {
    /// Network name (e.g. "ethereum")
    pub network_id: String,
    /// Contract address, empty when the upstream had none
    pub address: String,
}

/// 7-day price samples attached to a snapshot
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sparkline {
    /// Price samples, oldest first
    #[serde(default)]
    pub price: Option<Vec<Option<f64>>>,
}

/// Market statistics for one entry, fresh from the upstream
///
/// Every numeric field is optional: the upstream reports `null` for unknown values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Catalog identifier
    pub id: CatalogId,
    /// Ticker symbol, empty when the upstream sent `null`
    #[serde(default, deserialize_with = "null_as_default")]
    pub symbol: String,
    /// Display name, empty when the upstream sent `null`
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Logo URL
    #[serde(default)]
    pub image: Option<String>,
    /// Current price
    #[serde(default)]
    pub current_price: Option<f64>,
    /// 7-day sparkline
    #[serde(default)]
    pub sparkline_in_7d: Option<Sparkline>,
    /// Price change over 24 hours, percent
    #[serde(default)]
    pub price_change_percentage_24h_in_currency: Option<f64>,
    /// Price change over 7 days, percent
    #[serde(default)]
    pub price_change_percentage_7d_in_currency: Option<f64>,
    /// Price change over 30 days, percent
    #[serde(default)]
    pub price_change_percentage_30d_in_currency: Option<f64>,
    /// Price change over 1 year, percent
    #[serde(default)]
    pub price_change_percentage_1y_in_currency: Option<f64>,
    /// Market capitalization
    #[serde(default)]
    pub market_cap: Option<f64>,
    /// Rank by market capitalization; anything that is not a whole number reads as `None`
    #[serde(default, deserialize_with = "lenient_rank")]
    pub market_cap_rank: Option<u32>,
    /// Circulating supply
    #[serde(default)]
    pub circulating_supply: Option<f64>,
    /// Fully diluted valuation
    #[serde(default)]
    pub fully_diluted_valuation: Option<f64>,
    /// Total supply
    #[serde(default)]
    pub total_supply: Option<f64>,
}

/// Read `null` as the type's default instead of rejecting the whole payload
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept any JSON value for the rank; only non-negative integers that fit are kept
fn lenient_rank<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_u64().and_then(|rank| u32::try_from(rank).ok()))
}

/// Store-shaped market data for one existing entry
///
/// Unknown numeric values hold [`SENTINEL`](crate::reconcile::SENTINEL), never zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Catalog identifier of the row to update
    pub id: CatalogId,
    /// Display name
    pub name: String,
    /// Ticker symbol
    pub symbol: String,
    /// Logo URL, empty when unknown
    pub image: String,
    /// Current price
    pub price: f64,
    /// 7-day price samples, stringified
    pub price_history: Vec<String>,
    /// Price change over 24 hours, percent
    pub pct_change_24h: f64,
    /// Price change over 7 days, percent
    pub pct_change_7d: f64,
    /// Price change over 30 days, percent
    pub pct_change_30d: f64,
    /// Price change over 1 year, percent
    pub pct_change_1y: f64,
    /// Market capitalization
    pub market_cap: f64,
    /// Circulating supply
    pub circulating_supply: f64,
    /// Fully diluted valuation
    pub fully_diluted_valuation: f64,
    /// Total supply
    pub total_supply: f64,
    /// Unix timestamp of reconciliation
    pub updated_at: i64,
}

/// Outcome of a market-data refresh run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Identifiers read from the store
    pub ids_found: usize,
    /// Snapshots returned by the catalog
    pub snapshots_fetched: usize,
    /// Records produced by reconciliation
    pub records_reconciled: usize,
    /// Records actually written
    pub records_updated: usize,
    /// Wall-clock duration of the run
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Outcome of a discovery run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    /// Entries listed by the catalog
    pub upstream_total: usize,
    /// Entries that were not yet stored and got inserted
    pub inserted: usize,
}
