//! Reconciler errors.

use thiserror::Error;

use crate::{checkout::Phase, orders::ValidationError};

/// Errors raised when an operation is not possible in the session's current state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// Another operation of the same kind is still running.
    #[error("checkout is busy ({0})")]
    Busy(Phase),

    /// The order has already been placed.
    #[error("order has already been placed")]
    AlreadySubmitted,

    /// The customer's input was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
