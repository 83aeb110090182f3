//! Bounded concurrent writes of reconciled records
//!
//! Records are written in fixed-size chunks. Every update of a chunk is in flight
//! at once on the calling task; the next chunk starts only after the whole
//! chunk settled and the pacing delay elapsed. A failed update is logged and
//! left out of the count without affecting its siblings.

use crate::config::StoreConfig;
use crate::store::CatalogStore;
use crate::types::NormalizedRecord;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Writes records in paced, concurrent chunks
pub struct BoundedUpserter {
    store: Arc<dyn CatalogStore>,
    chunk_size: usize,
    pacing_delay: Duration,
}

impl BoundedUpserter {
    /// Create an upserter over the given store
    pub fn new(store: Arc<dyn CatalogStore>, config: &StoreConfig) -> Self {
        Self {
            store,
            chunk_size: config.write_batch_size.max(1),
            pacing_delay: config.write_pacing_delay,
        }
    }

    /// Write every record, returning how many updates changed a row
    ///
    /// Never fails as a whole: per-record errors and updates that matched no
    /// row are logged and excluded from the count.
    pub async fn upsert(&self, records: &[NormalizedRecord]) -> usize {
        let chunks = records.len().div_ceil(self.chunk_size);
        let mut updated = 0;

        for (index, chunk) in records.chunks(self.chunk_size).enumerate() {
            let outcomes = join_all(
                chunk
                    .iter()
                    .map(|record| self.store.update_market_data(record)),
            )
            .await;

            let mut chunk_updated = 0;
            for (record, outcome) in chunk.iter().zip(outcomes) {
                match outcome {
                    Ok(0) => warn!(catalog_id = %record.id, "No stored entry to update"),
                    Ok(_) => chunk_updated += 1,
                    Err(e) => warn!(
                        catalog_id = %record.id,
                        error = %e,
                        "Failed to update market data"
                    ),
                }
            }
            updated += chunk_updated;

            debug!(
                chunk = index + 1,
                chunks,
                written = chunk_updated,
                attempted = chunk.len(),
                "Wrote chunk"
            );

            if index + 1 < chunks && !self.pacing_delay.is_zero() {
                tokio::time::sleep(self.pacing_delay).await;
            }
        }

        info!(updated, total = records.len(), "Market data written");
        updated
    }
}
