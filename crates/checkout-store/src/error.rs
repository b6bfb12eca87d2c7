//! Store error types.

use crate::call::StoreCall;
use std::time::Duration;
use thiserror::Error;

/// Errors from the order store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The document does not exist.
    #[error("{collection} {id} not found")]
    NotFound { collection: &'static str, id: String },

    /// The call did not finish in time.
    #[error("{call} timed out after {after:?}")]
    Timeout { call: StoreCall, after: Duration },

    /// The store answered with an error status.
    #[error("HTTP error: {status} for {url}")]
    Http { status: u16, url: String },

    /// The store could not be reached.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A document could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl StoreError {
    pub(crate) fn not_found(collection: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            collection,
            id: id.to_string(),
        }
    }

    /// Whether the caller may try the same call again.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Timeout { .. } | StoreError::Connection(_) => true,
            StoreError::Http { status, .. } => *status >= 500,
            StoreError::NotFound { .. } | StoreError::Decode(_) => false,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(StoreError::Connection("refused".into()).is_retryable());
        assert!(StoreError::Timeout {
            call: StoreCall::CreateOrder,
            after: Duration::from_millis(10),
        }
        .is_retryable());
        assert!(StoreError::Http { status: 503, url: "/orders".into() }.is_retryable());
        assert!(!StoreError::Http { status: 404, url: "/orders/1".into() }.is_retryable());
        assert!(!StoreError::not_found("orders", "1").is_retryable());
    }
}
