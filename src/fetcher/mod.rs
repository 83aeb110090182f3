//! Rate-adaptive batch fetcher
//!
//! Fetches market snapshots for an arbitrarily large identifier set against an
//! upstream that enforces an unknown request-size limit and an unstated rate
//! limit. The fetcher learns both at runtime:
//!
//! - A "too large" response shrinks the next batch by
//!   [`FetchConfig::cap_reduction_step`]. The reduction resets after every
//!   successful batch.
//! - A "throttled" response pauses for [`FetchConfig::throttle_cooldown`] and
//!   retries the identical batch.
//! - Anything else aborts the whole fetch with no partial result.
//!
//! Identifiers leave the remaining set only when the batch carrying them
//! succeeds, so every identifier ends up in exactly one successful request.

mod classify;

pub use classify::{ClassifyFailure, FailureClass, classify_message};

use crate::catalog::CatalogClient;
use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::types::{CatalogId, MarketSnapshot};
use crate::{Error, Result};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Effective batch size tracking
///
/// `cap - reduction`, never below the configured floor and never above the cap.
#[derive(Debug, Clone)]
struct BatchSizer {
    cap: usize,
    step: usize,
    floor: usize,
    reduction: usize,
}

impl BatchSizer {
    fn new(config: &FetchConfig) -> Self {
        Self {
            cap: config.max_batch_size,
            step: config.cap_reduction_step,
            // an unvalidated config may put the floor above the cap
            floor: config.min_batch_size.clamp(1, config.max_batch_size.max(1)),
            reduction: 0,
        }
    }

    fn effective(&self) -> usize {
        self.cap.saturating_sub(self.reduction).max(self.floor)
    }

    fn shrink(&mut self) {
        self.reduction = self.reduction.saturating_add(self.step);
    }

    fn reset(&mut self) {
        self.reduction = 0;
    }
}

/// Fetches snapshots in self-tuning batches
pub struct RateAdaptiveFetcher {
    client: Arc<dyn CatalogClient>,
    config: FetchConfig,
}

impl RateAdaptiveFetcher {
    /// Create a fetcher over the given client
    pub fn new(client: Arc<dyn CatalogClient>, config: FetchConfig) -> Self {
        Self { client, config }
    }

    /// Batch sizing and pacing in effect
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch snapshots for every identifier in `ids`
    ///
    /// Duplicate identifiers are requested once. The result holds whatever the
    /// upstream returned; identifiers it has no data for are simply absent.
    ///
    /// # Errors
    /// Returns the first failure that is neither a size-limit nor a throttle
    /// signal, or [`FetchError::RetriesExhausted`] once more than
    /// [`FetchConfig::max_consecutive_failures`] requests in a row have failed.
    pub async fn fetch(&self, ids: &[CatalogId]) -> Result<Vec<MarketSnapshot>> {
        let mut remaining = dedup(ids);
        let mut sizer = BatchSizer::new(&self.config);
        let mut snapshots = Vec::with_capacity(remaining.len());
        let mut consecutive_failures: u32 = 0;

        info!(
            total = remaining.len(),
            max_batch_size = self.config.max_batch_size,
            "Fetching market snapshots"
        );

        while !remaining.is_empty() {
            let batch_size = sizer.effective().min(remaining.len());
            let batch: Vec<CatalogId> = remaining.iter().take(batch_size).cloned().collect();

            let err = match self.client.fetch_market_snapshots(&batch).await {
                Ok(fetched) => {
                    remaining.drain(..batch_size);
                    debug!(
                        ids = %batch_bounds(&batch),
                        expected = batch_size,
                        received = fetched.len(),
                        remaining = remaining.len(),
                        "Fetched batch"
                    );
                    if fetched.len() < batch_size {
                        debug!(
                            missing = batch_size - fetched.len(),
                            "Upstream returned fewer snapshots than requested"
                        );
                    }

                    snapshots.extend(fetched);
                    sizer.reset();
                    consecutive_failures = 0;

                    if !remaining.is_empty() && !self.config.pacing_delay.is_zero() {
                        tokio::time::sleep(self.config.pacing_delay).await;
                    }
                    continue;
                }
                Err(err) => err,
            };

            match err.classify() {
                FailureClass::Fatal => {
                    error!(
                        batch_size,
                        remaining = remaining.len(),
                        error = %err,
                        "Fetch aborted by unrecognized failure"
                    );
                    return Err(err);
                }
                FailureClass::TooLarge => {
                    self.record_failure(&mut consecutive_failures, remaining.len(), &err)?;
                    sizer.shrink();
                    warn!(
                        rejected = batch_size,
                        next_batch_size = sizer.effective(),
                        error = %err,
                        "Request too large, shrinking batch"
                    );
                }
                FailureClass::RateLimited => {
                    self.record_failure(&mut consecutive_failures, remaining.len(), &err)?;
                    warn!(
                        batch_size,
                        cooldown_ms = self.config.throttle_cooldown.as_millis() as u64,
                        error = %err,
                        "Throttled by upstream, cooling down"
                    );
                    tokio::time::sleep(self.config.throttle_cooldown).await;
                }
            }
        }

        info!(snapshots = snapshots.len(), "Finished fetching market snapshots");
        Ok(snapshots)
    }

    /// Count a recoverable failure, giving up once the ceiling is exceeded
    fn record_failure(
        &self,
        consecutive_failures: &mut u32,
        remaining: usize,
        err: &Error,
    ) -> Result<()> {
        *consecutive_failures = consecutive_failures.saturating_add(1);
        let attempts = *consecutive_failures;

        if self
            .config
            .max_consecutive_failures
            .is_some_and(|max| attempts > max)
        {
            error!(attempts, remaining, error = %err, "Giving up after repeated backoff");
            return Err(Error::Fetch(FetchError::RetriesExhausted {
                attempts,
                remaining,
            }));
        }
        Ok(())
    }
}

/// Remaining-set initialisation, first occurrence wins
fn dedup(ids: &[CatalogId]) -> VecDeque<CatalogId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

/// First and last two identifiers of a batch, for log lines
fn batch_bounds(batch: &[CatalogId]) -> String {
    if batch.len() <= 4 {
        return batch
            .iter()
            .map(CatalogId::as_str)
            .collect::<Vec<_>>()
            .join(", ");
    }
    format!(
        "{}, {} .. {}, {}",
        batch[0],
        batch[1],
        batch[batch.len() - 2],
        batch[batch.len() - 1]
    )
}
