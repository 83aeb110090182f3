//! Catalog entry operations: discovery inserts, identifier listing, market-data updates.

use crate::error::DatabaseError;
use crate::store::CatalogStore;
use crate::types::{CatalogId, NormalizedRecord};
use crate::{Error, Result};

use super::{CatalogEntry, Database, NewCatalogEntry};

impl Database {
    /// Insert catalog entries in chunks inside a single transaction
    ///
    /// Identifiers that already exist are skipped (`INSERT OR IGNORE`).
    /// Returns the number of rows inserted.
    pub async fn insert_entries_batch(&self, entries: &[NewCatalogEntry]) -> Result<u64> {
        if entries.is_empty() {
            return Ok(0);
        }

        // SQLite default SQLITE_MAX_VARIABLE_NUMBER is 999.
        // Each entry uses 6 bind variables, so max 166 entries per statement.
        const MAX_ENTRIES_PER_BATCH: usize = 166;

        let mut tx = self.pool.begin().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to begin transaction: {}",
                e
            )))
        })?;

        let mut inserted = 0;
        for chunk in entries.chunks(MAX_ENTRIES_PER_BATCH) {
            let mut query_builder = sqlx::QueryBuilder::new(
                "INSERT OR IGNORE INTO catalog_entries (id, name, symbol, networks, created_at, updated_at) ",
            );

            let encoded_networks = chunk
                .iter()
                .map(|entry| serde_json::to_string(&entry.networks))
                .collect::<serde_json::Result<Vec<_>>>()?;

            query_builder.push_values(
                chunk.iter().zip(encoded_networks),
                |mut b, (entry, networks)| {
                    b.push_bind(&entry.id)
                        .push_bind(&entry.name)
                        .push_bind(&entry.symbol)
                        .push_bind(networks)
                        .push_bind(entry.created_at)
                        .push_bind(entry.updated_at);
                },
            );

            let result = query_builder.build().execute(&mut *tx).await.map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to insert catalog entries batch: {}",
                    e
                )))
            })?;
            inserted += result.rows_affected();
        }

        tx.commit().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to commit catalog entries batch: {}",
                e
            )))
        })?;

        Ok(inserted)
    }

    /// List every stored identifier, oldest entries first
    pub async fn list_entry_ids(&self) -> Result<Vec<CatalogId>> {
        let ids = sqlx::query_scalar::<_, CatalogId>(
            "SELECT id FROM catalog_entries ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list catalog entry ids: {}",
                e
            )))
        })?;

        Ok(ids)
    }

    /// Get a catalog entry by identifier
    pub async fn get_entry(&self, id: &CatalogId) -> Result<Option<CatalogEntry>> {
        let row = sqlx::query_as::<_, CatalogEntry>(
            r#"
            SELECT
                id, name, symbol, networks, image_url, price, price_history,
                price_change_24h, price_change_7d, price_change_30d, price_change_1y,
                market_cap, circulating_supply, fully_diluted_valuation, total_supply,
                created_at, updated_at
            FROM catalog_entries
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get catalog entry: {}",
                e
            )))
        })?;

        Ok(row)
    }

    /// Count stored catalog entries
    pub async fn count_entries(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM catalog_entries")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to count catalog entries: {}",
                    e
                )))
            })?;

        Ok(count)
    }

    /// Overwrite market-data columns for an existing entry
    ///
    /// Returns the number of rows changed; 0 means the identifier is not stored.
    pub async fn update_market_data(&self, record: &NormalizedRecord) -> Result<u64> {
        let price_history = serde_json::to_string(&record.price_history)?;

        let result = sqlx::query(
            r#"
            UPDATE catalog_entries SET
                name = ?, symbol = ?, image_url = ?, price = ?, price_history = ?,
                price_change_24h = ?, price_change_7d = ?, price_change_30d = ?, price_change_1y = ?,
                market_cap = ?, circulating_supply = ?, fully_diluted_valuation = ?, total_supply = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&record.name)
        .bind(&record.symbol)
        .bind(&record.image)
        .bind(record.price)
        .bind(price_history)
        .bind(record.pct_change_24h)
        .bind(record.pct_change_7d)
        .bind(record.pct_change_30d)
        .bind(record.pct_change_1y)
        .bind(record.market_cap)
        .bind(record.circulating_supply)
        .bind(record.fully_diluted_valuation)
        .bind(record.total_supply)
        .bind(record.updated_at)
        .bind(&record.id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to update market data for {}: {}",
                record.id, e
            )))
        })?;

        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl CatalogStore for Database {
    async fn list_entry_ids(&self) -> Result<Vec<CatalogId>> {
        Database::list_entry_ids(self).await
    }

    async fn update_market_data(&self, record: &NormalizedRecord) -> Result<u64> {
        Database::update_market_data(self, record).await
    }

    async fn insert_entries(&self, entries: &[NewCatalogEntry]) -> Result<u64> {
        self.insert_entries_batch(entries).await
    }
}
