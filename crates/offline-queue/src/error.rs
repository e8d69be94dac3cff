//! Error types for the offline write queue.

use thiserror::Error;

/// Failures surfaced by the persistent queue store.
///
/// Durability is best-effort: the enqueuer and the sync engine log these and
/// continue rather than propagating them to their callers.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures surfaced by a delivery transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No response was received (DNS failure, timeout, mid-flight drop).
    /// The engine treats the delivery attempt as retryable.
    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}
