//! Error types for the cell store.

use thiserror::Error;

/// Errors raised by the cell store and its transactions.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// A cell of the wrong kind was staged for a key
    #[error("Cell kind mismatch for '{key}': expected {expected}, found {actual}")]
    CellKindMismatch {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// The subscription id is unknown or was already removed
    #[error("Subscription {id} not found")]
    SubscriptionNotFound { id: u64 },
}

impl StoreError {
    /// Check if this error indicates a resource was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::SubscriptionNotFound { .. })
    }

    /// Check if this error is related to type mismatches
    pub fn is_type_error(&self) -> bool {
        matches!(self, StoreError::CellKindMismatch { .. })
    }
}

impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
