//! Record reconciliation
//!
//! Merges fetched snapshots back onto the identifier list and produces
//! store-shaped [`NormalizedRecord`]s. Identifiers without a snapshot are
//! dropped. Numeric values the upstream left out, reported as zero, or sent as
//! NaN become [`SENTINEL`] so the store's non-null columns are always filled.

use crate::types::{CatalogId, MarketSnapshot, NormalizedRecord};
use std::collections::HashMap;

/// Stored in place of any unknown numeric value
pub const SENTINEL: f64 = -1.0;

/// Reconcile snapshots against `ids`, stamping every record with `updated_at`
///
/// Output follows the order of `ids`; each identifier appears at most once.
/// If the upstream returned several snapshots for one identifier the first wins.
pub fn reconcile(
    ids: &[CatalogId],
    snapshots: Vec<MarketSnapshot>,
    updated_at: i64,
) -> Vec<NormalizedRecord> {
    let mut by_id: HashMap<CatalogId, MarketSnapshot> = HashMap::with_capacity(snapshots.len());
    for snapshot in snapshots {
        by_id.entry(snapshot.id.clone()).or_insert(snapshot);
    }

    let records: Vec<NormalizedRecord> = ids
        .iter()
        .filter_map(|id| by_id.remove(id))
        .map(|snapshot| normalize(snapshot, updated_at))
        .collect();

    if records.len() < ids.len() {
        tracing::debug!(
            ids = ids.len(),
            records = records.len(),
            "Dropped identifiers without market data"
        );
    }

    records
}

/// [`reconcile`] stamped with the current time
pub fn reconcile_now(ids: &[CatalogId], snapshots: Vec<MarketSnapshot>) -> Vec<NormalizedRecord> {
    reconcile(ids, snapshots, chrono::Utc::now().timestamp())
}

fn normalize(snapshot: MarketSnapshot, updated_at: i64) -> NormalizedRecord {
    let price_history = snapshot
        .sparkline_in_7d
        .and_then(|sparkline| sparkline.price)
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .map(|sample| sample.to_string())
        .collect();

    NormalizedRecord {
        id: snapshot.id,
        name: snapshot.name,
        symbol: snapshot.symbol,
        image: snapshot.image.unwrap_or_default(),
        price: or_sentinel(snapshot.current_price),
        price_history,
        pct_change_24h: or_sentinel(snapshot.price_change_percentage_24h_in_currency),
        pct_change_7d: or_sentinel(snapshot.price_change_percentage_7d_in_currency),
        pct_change_30d: or_sentinel(snapshot.price_change_percentage_30d_in_currency),
        pct_change_1y: or_sentinel(snapshot.price_change_percentage_1y_in_currency),
        market_cap: or_sentinel(snapshot.market_cap),
        circulating_supply: or_sentinel(snapshot.circulating_supply),
        fully_diluted_valuation: or_sentinel(snapshot.fully_diluted_valuation),
        total_supply: or_sentinel(snapshot.total_supply),
        updated_at,
    }
}

/// Absent, zero and NaN all mean "unknown"
fn or_sentinel(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v != 0.0 && !v.is_nan() => v,
        _ => SENTINEL,
    }
}
