//! Configuration types for catalog-sync

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Remote catalog endpoints and credentials
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Market-data endpoint; the `ids` query pair is appended per batch
    ///
    /// Any fixed query (currency, sparkline flag, change windows) belongs in this URL.
    #[serde(default = "default_markets_url")]
    pub markets_url: String,

    /// Full entry-list endpoint used for discovery
    #[serde(default = "default_list_url")]
    pub list_url: String,

    /// API key sent with every request
    #[serde(default)]
    pub api_key: String,

    /// Header carrying the API key (default: "x-cg-pro-api-key")
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_ms")]
    pub request_timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            markets_url: default_markets_url(),
            list_url: default_list_url(),
            api_key: String::new(),
            api_key_header: default_api_key_header(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Batch sizing and pacing for the adaptive fetcher
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Identifiers per request before any shrinking (default: 250)
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Amount the batch shrinks by after each "request too large" response (default: 10)
    #[serde(default = "default_cap_reduction_step")]
    pub cap_reduction_step: usize,

    /// Smallest batch the fetcher will ever send (default: 1)
    #[serde(default = "default_min_batch_size")]
    pub min_batch_size: usize,

    /// Delay between successful batches (default: 40ms)
    #[serde(default = "default_pacing_delay", with = "duration_ms")]
    pub pacing_delay: Duration,

    /// Pause after a throttled response (default: 5 seconds)
    #[serde(default = "default_throttle_cooldown", with = "duration_ms")]
    pub throttle_cooldown: Duration,

    /// Consecutive failed requests tolerated before giving up (default: 60, None = never give up)
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: Option<u32>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            cap_reduction_step: default_cap_reduction_step(),
            min_batch_size: default_min_batch_size(),
            pacing_delay: default_pacing_delay(),
            throttle_cooldown: default_throttle_cooldown(),
            max_consecutive_failures: default_max_consecutive_failures(),
        }
    }
}

/// Record store location and write batching
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database path (default: "./catalog.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Records written concurrently per chunk (default: 100)
    #[serde(default = "default_write_batch_size")]
    pub write_batch_size: usize,

    /// Delay between write chunks (default: 100ms)
    #[serde(default = "default_write_pacing_delay", with = "duration_ms")]
    pub write_pacing_delay: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            write_batch_size: default_write_batch_size(),
            write_pacing_delay: default_write_pacing_delay(),
        }
    }
}

/// Main configuration for a sync run
///
/// Built once at startup (from a file via serde, or with [`Config::from_env`])
/// and handed to [`CatalogSync`](crate::CatalogSync). Nothing inside the
/// pipeline reads the environment on its own.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote catalog endpoints and credentials
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Adaptive fetcher tuning
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Record store settings
    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    /// Build a configuration from process environment variables
    ///
    /// Required: `CATALOG_MARKETS_URL`, `CATALOG_LIST_URL`, `CATALOG_API_KEY`.
    /// Everything else falls back to its default. See [`Config::from_lookup`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    ///
    /// Recognized keys:
    /// - `CATALOG_MARKETS_URL`, `CATALOG_LIST_URL`, `CATALOG_API_KEY` (required)
    /// - `CATALOG_API_KEY_HEADER`, `CATALOG_REQUEST_TIMEOUT_MS`
    /// - `CATALOG_DATABASE_PATH`
    /// - `FETCH_MAX_BATCH_SIZE`, `FETCH_CAP_REDUCTION_STEP`, `FETCH_MIN_BATCH_SIZE`
    /// - `FETCH_PACING_DELAY_MS`, `FETCH_THROTTLE_COOLDOWN_MS`
    /// - `FETCH_MAX_CONSECUTIVE_FAILURES` (`0` disables the ceiling)
    /// - `STORE_WRITE_BATCH_SIZE`, `STORE_WRITE_PACING_DELAY_MS`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| Error::config(format!("{key} not set in environment"), key))
        };

        let mut config = Config::default();

        config.catalog.markets_url = required("CATALOG_MARKETS_URL")?;
        config.catalog.list_url = required("CATALOG_LIST_URL")?;
        config.catalog.api_key = required("CATALOG_API_KEY")?;
        if let Some(header) = lookup("CATALOG_API_KEY_HEADER") {
            config.catalog.api_key_header = header;
        }
        if let Some(ms) = parse_number::<u64>(&lookup, "CATALOG_REQUEST_TIMEOUT_MS")? {
            config.catalog.request_timeout = Duration::from_millis(ms);
        }

        if let Some(path) = lookup("CATALOG_DATABASE_PATH") {
            config.store.database_path = PathBuf::from(path);
        }

        if let Some(n) = parse_number(&lookup, "FETCH_MAX_BATCH_SIZE")? {
            config.fetch.max_batch_size = n;
        }
        if let Some(n) = parse_number(&lookup, "FETCH_CAP_REDUCTION_STEP")? {
            config.fetch.cap_reduction_step = n;
        }
        if let Some(n) = parse_number(&lookup, "FETCH_MIN_BATCH_SIZE")? {
            config.fetch.min_batch_size = n;
        }
        if let Some(ms) = parse_number::<u64>(&lookup, "FETCH_PACING_DELAY_MS")? {
            config.fetch.pacing_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_number::<u64>(&lookup, "FETCH_THROTTLE_COOLDOWN_MS")? {
            config.fetch.throttle_cooldown = Duration::from_millis(ms);
        }
        if let Some(n) = parse_number::<u32>(&lookup, "FETCH_MAX_CONSECUTIVE_FAILURES")? {
            config.fetch.max_consecutive_failures = (n > 0).then_some(n);
        }

        if let Some(n) = parse_number(&lookup, "STORE_WRITE_BATCH_SIZE")? {
            config.store.write_batch_size = n;
        }
        if let Some(ms) = parse_number::<u64>(&lookup, "STORE_WRITE_PACING_DELAY_MS")? {
            config.store.write_pacing_delay = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants the pipeline relies on
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("catalog.markets_url", &self.catalog.markets_url),
            ("catalog.list_url", &self.catalog.list_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| Error::config(format!("invalid URL '{value}': {e}"), key))?;
        }

        if self.catalog.api_key_header.trim().is_empty() {
            return Err(Error::config(
                "API key header name must not be empty",
                "catalog.api_key_header",
            ));
        }
        if self.fetch.min_batch_size == 0 {
            return Err(Error::config(
                "minimum batch size must be at least 1",
                "fetch.min_batch_size",
            ));
        }
        if self.fetch.max_batch_size < self.fetch.min_batch_size {
            return Err(Error::config(
                format!(
                    "max batch size {} is below the minimum {}",
                    self.fetch.max_batch_size, self.fetch.min_batch_size
                ),
                "fetch.max_batch_size",
            ));
        }
        if self.fetch.cap_reduction_step == 0 {
            return Err(Error::config(
                "cap reduction step must be at least 1",
                "fetch.cap_reduction_step",
            ));
        }
        if self.store.write_batch_size == 0 {
            return Err(Error::config(
                "write batch size must be at least 1",
                "store.write_batch_size",
            ));
        }
        Ok(())
    }
}

fn parse_number<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::config(format!("{key}='{raw}' is not a valid number: {e}"), key)),
    }
}

fn default_markets_url() -> String {
    "https://pro-api.coingecko.com/api/v3/coins/markets?vs_currency=usd&sparkline=true&price_change_percentage=24h,7d,30d,1y".to_string()
}

fn default_list_url() -> String {
    "https://pro-api.coingecko.com/api/v3/coins/list?include_platform=true".to_string()
}

fn default_api_key_header() -> String {
    "x-cg-pro-api-key".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_batch_size() -> usize {
    250
}

fn default_cap_reduction_step() -> usize {
    10
}

fn default_min_batch_size() -> usize {
    1
}

fn default_pacing_delay() -> Duration {
    Duration::from_millis(40)
}

fn default_throttle_cooldown() -> Duration {
    Duration::from_secs(5)
}

fn default_max_consecutive_failures() -> Option<u32> {
    Some(60)
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./catalog.db")
}

fn default_write_batch_size() -> usize {
    100
}

fn default_write_pacing_delay() -> Duration {
    Duration::from_millis(100)
}

// Duration serialization helper (milliseconds; pacing delays are sub-second)
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
