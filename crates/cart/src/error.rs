//! Unified cart error type.
//!
//! Validation problems (missing variant selections, zero quantities) are not
//! errors: the store reports them through the notifier and a `false` return.
//! Everything here is a collaborator failure the caller may retry.

use thiserror::Error;

use crate::reconcile::ReconcileError;
use crate::storage::StorageError;

/// Error returned by fallible cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Reconciliation with the pricing service failed; local state is unchanged.
    #[error("Reconciliation failed: {0}")]
    Reconcile(#[from] ReconcileError),

    /// Durable storage could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
