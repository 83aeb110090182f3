//! Shared fakes and fixtures for unit tests.

use crate::catalog::CatalogClient;
use crate::db::NewCatalogEntry;
use crate::error::{DatabaseError, FetchError};
use crate::store::CatalogStore;
use crate::types::{BasicEntry, CatalogId, MarketSnapshot, NormalizedRecord, Sparkline};
use crate::{Error, Result};
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Snapshot with every field populated, keyed by `id`
pub(crate) fn snapshot(id: &str) -> MarketSnapshot {
    MarketSnapshot {
        id: CatalogId::new(id),
        symbol: id.chars().take(3).collect(),
        name: id.to_uppercase(),
        image: Some(format!("https://img.example/{id}.png")),
        current_price: Some(10.5),
        sparkline_in_7d: Some(Sparkline {
            price: Some(vec![Some(9.0), Some(10.25), Some(10.5)]),
        }),
        price_change_percentage_24h_in_currency: Some(1.5),
        price_change_percentage_7d_in_currency: Some(-2.25),
        price_change_percentage_30d_in_currency: Some(12.0),
        price_change_percentage_1y_in_currency: Some(150.0),
        market_cap: Some(1_000_000.0),
        market_cap_rank: Some(42),
        circulating_supply: Some(95_000.0),
        fully_diluted_valuation: Some(2_000_000.0),
        total_supply: Some(190_000.0),
    }
}

/// Reconciled record with plausible values, keyed by `id`
pub(crate) fn sample_record(id: &str) -> NormalizedRecord {
    NormalizedRecord {
        id: CatalogId::new(id),
        name: id.to_uppercase(),
        symbol: id.chars().take(3).collect(),
        image: format!("https://img.example/{id}.png"),
        price: 10.5,
        price_history: vec!["9".to_string(), "10.25".to_string(), "10.5".to_string()],
        pct_change_24h: 1.5,
        pct_change_7d: -2.25,
        pct_change_30d: 12.0,
        pct_change_1y: 150.0,
        market_cap: 1_000_000.0,
        circulating_supply: 95_000.0,
        fully_diluted_valuation: 2_000_000.0,
        total_supply: 190_000.0,
        updated_at: 1_650_000_000,
    }
}

/// Freshly discovered entry with no networks
pub(crate) fn new_entry(id: &str) -> NewCatalogEntry {
    let name = match id {
        "bitcoin" => "Bitcoin".to_string(),
        other => other.to_uppercase(),
    };
    NewCatalogEntry {
        id: CatalogId::new(id),
        name,
        symbol: id.chars().take(3).collect(),
        networks: Vec::new(),
        created_at: 1_600_000_000,
        updated_at: 1_600_000_000,
    }
}

/// Identifiers from string slices
pub(crate) fn ids(raw: &[&str]) -> Vec<CatalogId> {
    raw.iter().map(|id| CatalogId::new(*id)).collect()
}

// ===================================================================
// FakeCatalogClient
// ===================================================================

/// One scripted outcome for a market-snapshot request
#[derive(Debug, Clone, Copy)]
pub(crate) enum Reply {
    /// Return a snapshot for every requested identifier the fake knows
    Serve,
    /// Reject with a 414-style size-limit error
    TooLarge,
    /// Reject with a 429-style throttle error
    Throttled,
    /// Reject with an unrecognized upstream status
    Fail(u16),
}

/// Catalog client that follows a script and records every batch it saw
///
/// Once the script runs out it serves every request, unless a size limit is set,
/// in which case batches above the limit are rejected as too large.
pub(crate) struct FakeCatalogClient {
    script: Mutex<VecDeque<Reply>>,
    size_limit: Option<usize>,
    unknown: HashSet<CatalogId>,
    entries: Vec<BasicEntry>,
    batches: Mutex<Vec<Vec<CatalogId>>>,
}

impl FakeCatalogClient {
    pub(crate) fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            size_limit: None,
            unknown: HashSet::new(),
            entries: Vec::new(),
            batches: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_script(mut self, replies: Vec<Reply>) -> Self {
        self.script = Mutex::new(VecDeque::from(replies));
        self
    }

    /// Reject every batch larger than `limit` once the script is exhausted
    pub(crate) fn with_size_limit(mut self, limit: usize) -> Self {
        self.size_limit = Some(limit);
        self
    }

    /// Identifiers the upstream silently omits from successful responses
    pub(crate) fn with_unknown(mut self, raw: &[&str]) -> Self {
        self.unknown = raw.iter().map(|id| CatalogId::new(*id)).collect();
        self
    }

    pub(crate) fn with_entries(mut self, entries: Vec<BasicEntry>) -> Self {
        self.entries = entries;
        self
    }

    /// Every batch requested so far, in request order
    pub(crate) fn batches(&self) -> Vec<Vec<CatalogId>> {
        self.batches.lock().unwrap().clone()
    }

    /// Sizes of every batch requested so far
    pub(crate) fn batch_sizes(&self) -> Vec<usize> {
        self.batches().iter().map(Vec::len).collect()
    }
}

#[async_trait::async_trait]
impl CatalogClient for FakeCatalogClient {
    async fn fetch_market_snapshots(&self, ids: &[CatalogId]) -> Result<Vec<MarketSnapshot>> {
        self.batches.lock().unwrap().push(ids.to_vec());

        let reply = self.script.lock().unwrap().pop_front().unwrap_or_else(|| {
            match self.size_limit {
                Some(limit) if ids.len() > limit => Reply::TooLarge,
                _ => Reply::Serve,
            }
        });

        match reply {
            Reply::Serve => Ok(ids
                .iter()
                .filter(|id| !self.unknown.contains(*id))
                .map(|id| snapshot(id.as_str()))
                .collect()),
            Reply::TooLarge => Err(FetchError::SizeLimitExceeded {
                batch_size: ids.len(),
                message: "414 URI Too Long".to_string(),
            }
            .into()),
            Reply::Throttled => Err(FetchError::RateLimited {
                message: "429 Too Many Requests".to_string(),
            }
            .into()),
            Reply::Fail(status) => Err(FetchError::Upstream {
                status,
                message: format!("status {status}"),
            }
            .into()),
        }
    }

    async fn fetch_entry_list(&self) -> Result<Vec<BasicEntry>> {
        Ok(self.entries.clone())
    }
}

// ===================================================================
// FakeStore
// ===================================================================

/// In-memory store with per-identifier write failures
///
/// Tracks how many updates are in flight at once so tests can observe
/// intra-chunk concurrency.
pub(crate) struct FakeStore {
    known: Mutex<Vec<CatalogId>>,
    failing: HashSet<CatalogId>,
    updated: Mutex<Vec<NormalizedRecord>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeStore {
    pub(crate) fn with_ids(raw: &[&str]) -> Self {
        Self {
            known: Mutex::new(ids(raw)),
            failing: HashSet::new(),
            updated: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Make every update of these identifiers fail
    pub(crate) fn failing_on(mut self, raw: &[&str]) -> Self {
        self.failing = raw.iter().map(|id| CatalogId::new(*id)).collect();
        self
    }

    pub(crate) fn known_ids(&self) -> Vec<CatalogId> {
        self.known.lock().unwrap().clone()
    }

    pub(crate) fn updated_ids(&self) -> Vec<CatalogId> {
        self.updated
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.id.clone())
            .collect()
    }

    pub(crate) fn updated_records(&self) -> Vec<NormalizedRecord> {
        self.updated.lock().unwrap().clone()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CatalogStore for FakeStore {
    async fn list_entry_ids(&self) -> Result<Vec<CatalogId>> {
        Ok(self.known_ids())
    }

    async fn update_market_data(&self, record: &NormalizedRecord) -> Result<u64> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&record.id) {
            return Err(Error::Database(DatabaseError::QueryFailed(format!(
                "injected failure for {}",
                record.id
            ))));
        }
        if !self.known.lock().unwrap().contains(&record.id) {
            return Ok(0);
        }
        self.updated.lock().unwrap().push(record.clone());
        Ok(1)
    }

    async fn insert_entries(&self, entries: &[NewCatalogEntry]) -> Result<u64> {
        let mut known = self.known.lock().unwrap();
        let mut inserted = 0;
        for entry in entries {
            if !known.contains(&entry.id) {
                known.push(entry.id.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}
