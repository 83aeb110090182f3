//! Error types for catalog-sync
//!
//! This module provides the error taxonomy for the sync pipeline:
//! - Catalog fetch failures, split into the two recoverable backoff signals
//!   (request too large, throttled) and everything else
//! - Database errors with context about which operation failed
//! - Configuration errors naming the offending key

use thiserror::Error;

/// Result type alias for catalog-sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for catalog-sync
///
/// Each variant includes enough context to diagnose the failure from a log line.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "CATALOG_MARKETS_URL")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Catalog request failed with a classified upstream response
    #[error("catalog fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Transport-level network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// Catalog fetch errors
///
/// The first two variants are the recoverable backoff signals. The fetcher
/// handles them locally and they never reach the caller.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request carried more identifiers than the upstream accepts
    #[error("request too large ({batch_size} identifiers): {message}")]
    SizeLimitExceeded {
        /// Number of identifiers in the rejected request
        batch_size: usize,
        /// Upstream status line or body
        message: String,
    },

    /// The upstream is throttling requests
    #[error("rate limited by upstream: {message}")]
    RateLimited {
        /// Upstream status line or body
        message: String,
    },

    /// Any other non-success response
    #[error("upstream returned status {status}: {message}")]
    Upstream {
        /// HTTP status code
        status: u16,
        /// Upstream status line and body
        message: String,
    },

    /// Too many batch requests in a row failed with recoverable signals
    #[error(
        "gave up after {attempts} consecutive failed batch requests ({remaining} identifiers still unfetched)"
    )]
    RetriesExhausted {
        /// Number of consecutive failed attempts
        attempts: u32,
        /// Identifiers that were never fetched
        remaining: usize,
    },
}
