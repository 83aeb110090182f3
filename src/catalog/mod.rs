//! Remote catalog client
//!
//! [`CatalogClient`] is the seam the fetcher and discovery talk to.
//! [`HttpCatalogClient`] is the production implementation over reqwest. It maps
//! the two backoff signals of the upstream onto typed [`FetchError`] variants:
//! HTTP 414 becomes [`FetchError::SizeLimitExceeded`] and HTTP 429 becomes
//! [`FetchError::RateLimited`]. Every other non-success status is
//! [`FetchError::Upstream`].

use crate::config::CatalogConfig;
use crate::error::FetchError;
use crate::types::{BasicEntry, CatalogId, MarketSnapshot};
use crate::{Error, Result};
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;
use url::form_urlencoded::byte_serialize;

/// Abstraction over the remote catalog, enabling testability
#[async_trait::async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch market snapshots for one batch of identifiers in a single request
    ///
    /// The upstream may return fewer snapshots than identifiers requested.
    async fn fetch_market_snapshots(&self, ids: &[CatalogId]) -> Result<Vec<MarketSnapshot>>;

    /// Fetch the full list of catalog entries
    async fn fetch_entry_list(&self) -> Result<Vec<BasicEntry>>;
}

/// Production [`CatalogClient`] talking HTTP/JSON
pub struct HttpCatalogClient {
    http: reqwest::Client,
    config: CatalogConfig,
    markets_url: Url,
    list_url: Url,
}

impl HttpCatalogClient {
    /// Create a client with the configured per-request timeout
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("catalog-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            markets_url: parse_url(&config.markets_url, "catalog.markets_url")?,
            list_url: parse_url(&config.list_url, "catalog.list_url")?,
            config: config.clone(),
        })
    }

    /// Markets URL with `ids=` appended to its fixed query
    ///
    /// Identifiers are percent-encoded one by one and joined with a literal
    /// comma, so a batch costs one byte per separator in the URI.
    fn markets_request_url(&self, ids: &[CatalogId]) -> Url {
        let joined = ids
            .iter()
            .map(|id| byte_serialize(id.as_str().as_bytes()).collect::<String>())
            .collect::<Vec<_>>()
            .join(",");

        let mut url = self.markets_url.clone();
        let query = match url.query() {
            Some(fixed) if !fixed.is_empty() => format!("{fixed}&ids={joined}"),
            _ => format!("ids={joined}"),
        };
        url.set_query(Some(&query));
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, batch_size: usize) -> Result<T> {
        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .header(self.config.api_key_header.as_str(), self.config.api_key.as_str())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, &body, batch_size).into());
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait::async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn fetch_market_snapshots(&self, ids: &[CatalogId]) -> Result<Vec<MarketSnapshot>> {
        debug!(batch_size = ids.len(), "Requesting market snapshots");
        self.get_json(self.markets_request_url(ids), ids.len()).await
    }

    async fn fetch_entry_list(&self) -> Result<Vec<BasicEntry>> {
        debug!("Requesting catalog entry list");
        self.get_json(self.list_url.clone(), 0).await
    }
}

fn parse_url(raw: &str, key: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| Error::config(format!("invalid URL '{raw}': {e}"), key))
}

/// Map a non-success response onto a fetch error
fn status_error(status: StatusCode, body: &str, batch_size: usize) -> FetchError {
    let message = match (status.canonical_reason(), body.trim()) {
        (Some(reason), "") => reason.to_string(),
        (Some(reason), body) => format!("{reason}: {body}"),
        (None, body) => body.to_string(),
    };

    match status {
        StatusCode::URI_TOO_LONG => FetchError::SizeLimitExceeded {
            batch_size,
            message,
        },
        StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited { message },
        _ => FetchError::Upstream {
            status: status.as_u16(),
            message,
        },
    }
}
