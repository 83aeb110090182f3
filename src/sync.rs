//! Sync orchestration
//!
//! [`CatalogSync`] wires the stages of a market-data refresh together:
//! identifiers from the store, the rate-adaptive fetcher, the reconciler and
//! the bounded upserter. Stages run one after the other.

use crate::catalog::CatalogClient;
use crate::config::Config;
use crate::fetcher::RateAdaptiveFetcher;
use crate::reconcile::reconcile_now;
use crate::store::CatalogStore;
use crate::types::{DiscoveryReport, SyncReport};
use crate::upsert::BoundedUpserter;
use crate::{Result, discovery};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Catalog synchronization jobs over one client and one store
pub struct CatalogSync {
    client: Arc<dyn CatalogClient>,
    store: Arc<dyn CatalogStore>,
    fetcher: RateAdaptiveFetcher,
    upserter: BoundedUpserter,
}

impl CatalogSync {
    /// Create a sync runner
    pub fn new(
        config: &Config,
        client: Arc<dyn CatalogClient>,
        store: Arc<dyn CatalogStore>,
    ) -> Self {
        Self {
            fetcher: RateAdaptiveFetcher::new(client.clone(), config.fetch.clone()),
            upserter: BoundedUpserter::new(store.clone(), &config.store),
            client,
            store,
        }
    }

    /// Refresh market data for every stored entry
    ///
    /// # Errors
    /// Fails when the identifiers cannot be read or the fetch aborts. Individual
    /// write failures only lower [`SyncReport::records_updated`].
    pub async fn refresh_market_data(&self) -> Result<SyncReport> {
        let started = Instant::now();

        let ids = self.store.list_entry_ids().await?;
        info!(ids_found = ids.len(), "Refreshing market data");

        let snapshots = self.fetcher.fetch(&ids).await?;
        let snapshots_fetched = snapshots.len();

        let records = reconcile_now(&ids, snapshots);
        let records_reconciled = records.len();

        let records_updated = self.upserter.upsert(&records).await;

        let report = SyncReport {
            ids_found: ids.len(),
            snapshots_fetched,
            records_reconciled,
            records_updated,
            elapsed: started.elapsed(),
        };

        info!(
            ids_found = report.ids_found,
            snapshots_fetched = report.snapshots_fetched,
            records_updated = report.records_updated,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Market data refresh complete"
        );

        Ok(report)
    }

    /// Insert catalog entries the store does not know yet
    ///
    /// # Errors
    /// See [`discovery::discover_new_entries`].
    pub async fn discover_new_entries(&self) -> Result<DiscoveryReport> {
        discovery::discover_new_entries(
            self.client.as_ref(),
            self.store.as_ref(),
            chrono::Utc::now().timestamp(),
        )
        .await
    }
}
