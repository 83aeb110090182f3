//! Discovery of catalog entries not yet in the store

use crate::Result;
use crate::catalog::CatalogClient;
use crate::db::NewCatalogEntry;
use crate::store::CatalogStore;
use crate::types::{BasicEntry, CatalogId, DiscoveryReport, NetworkAddress};
use std::collections::HashSet;
use tracing::info;

/// Insert every upstream entry whose identifier is not stored yet
///
/// Both timestamps of new entries are set to `now`. Market-data columns keep
/// their store defaults until the next refresh.
///
/// # Errors
/// Returns error if the entry list cannot be fetched, or if the store cannot be
/// read or written.
pub async fn discover_new_entries(
    client: &dyn CatalogClient,
    store: &dyn CatalogStore,
    now: i64,
) -> Result<DiscoveryReport> {
    let upstream = client.fetch_entry_list().await?;
    let mut known: HashSet<CatalogId> = store.list_entry_ids().await?.into_iter().collect();

    let upstream_total = upstream.len();
    let new_entries: Vec<NewCatalogEntry> = upstream
        .into_iter()
        // insert() is false for stored ids and repeats within the list
        .filter(|entry| known.insert(entry.id.clone()))
        .map(|entry| to_new_entry(entry, now))
        .collect();

    info!(
        upstream = upstream_total,
        new = new_entries.len(),
        "Compared catalog entry list with store"
    );

    let inserted = if new_entries.is_empty() {
        0
    } else {
        store.insert_entries(&new_entries).await?
    };

    info!(inserted, "New catalog entries inserted");

    Ok(DiscoveryReport {
        upstream_total,
        inserted: inserted as usize,
    })
}

/// Convert a listed entry into its stored shape, networks sorted by name
fn to_new_entry(entry: BasicEntry, now: i64) -> NewCatalogEntry {
    let mut networks: Vec<NetworkAddress> = entry
        .platforms
        .into_iter()
        .map(|(network_id, address)| NetworkAddress {
            network_id,
            address: address.unwrap_or_default(),
        })
        .collect();
    networks.sort_by(|a, b| a.network_id.cmp(&b.network_id));

    NewCatalogEntry {
        id: entry.id,
        name: entry.name,
        symbol: entry.symbol,
        networks,
        created_at: now,
        updated_at: now,
    }
}
