//! Record store seam used by the sync pipeline.

use crate::Result;
use crate::db::NewCatalogEntry;
use crate::types::{CatalogId, NormalizedRecord};

/// Persistence operations the sync pipeline needs.
///
/// [`Database`](crate::Database) is the production implementation. Tests swap in
/// in-memory fakes with injected failures.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Every identifier currently stored, in one call
    async fn list_entry_ids(&self) -> Result<Vec<CatalogId>>;

    /// Overwrite the market-data fields of the entry named by `record.id`
    ///
    /// Never inserts. Returns the number of rows changed (0 when the entry is unknown).
    async fn update_market_data(&self, record: &NormalizedRecord) -> Result<u64>;

    /// Insert newly discovered entries, ignoring identifiers that already exist
    ///
    /// Returns the number of rows actually inserted.
    async fn insert_entries(&self, entries: &[NewCatalogEntry]) -> Result<u64>;
}
