//! Failure classification for catalog requests
//!
//! Decides which backoff branch a failed batch request takes. Structured signals
//! (typed [`FetchError`] variants, HTTP status codes) are checked first; the
//! upstream's textual contract ("URI Too Long", "Throttled") is kept as a
//! fallback for errors that only carry a message.

use crate::error::{Error, FetchError};

/// How the fetcher should react to a failed batch request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureClass {
    /// The request carried too many identifiers; shrink the batch and retry
    TooLarge,
    /// The upstream is throttling; cool down and retry the same batch
    RateLimited,
    /// Anything else; abort the fetch
    Fatal,
}

/// Trait for errors that can be mapped onto a backoff decision
pub trait ClassifyFailure {
    /// Classify this failure
    fn classify(&self) -> FailureClass;
}

impl ClassifyFailure for FetchError {
    fn classify(&self) -> FailureClass {
        match self {
            FetchError::SizeLimitExceeded { .. } => FailureClass::TooLarge,
            FetchError::RateLimited { .. } => FailureClass::RateLimited,
            FetchError::Upstream { status, message } => {
                from_status(*status).unwrap_or_else(|| classify_message(message))
            }
            // Already the outcome of repeated backoff
            FetchError::RetriesExhausted { .. } => FailureClass::Fatal,
        }
    }
}

impl ClassifyFailure for Error {
    fn classify(&self) -> FailureClass {
        match self {
            Error::Fetch(e) => e.classify(),
            // Transport errors carry a status only when raised from a response
            Error::Network(e) => e
                .status()
                .and_then(|status| from_status(status.as_u16()))
                .unwrap_or_else(|| classify_message(&e.to_string())),
            Error::Other(msg) => classify_message(msg),
            Error::Config { .. }
            | Error::Database(_)
            | Error::Sqlx(_)
            | Error::Serialization(_)
            | Error::Io(_) => FailureClass::Fatal,
        }
    }
}

fn from_status(status: u16) -> Option<FailureClass> {
    match status {
        414 => Some(FailureClass::TooLarge),
        429 => Some(FailureClass::RateLimited),
        _ => None,
    }
}

/// Classify a bare error message by the phrases the upstream is known to use
pub fn classify_message(message: &str) -> FailureClass {
    if message.contains("URI Too Long") {
        FailureClass::TooLarge
    } else if message.contains("Throttled") {
        FailureClass::RateLimited
    } else {
        FailureClass::Fatal
    }
}
