//! Checkout session errors.

use rusty_money::MoneyError;
use thiserror::Error;

use tiffin::{checkout::ReconcileError, lines::LoadError};

use crate::api::ApiError;

/// Errors returned by [`super::CheckoutSession`] operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The checkout could not be built from the selected dishes.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The operation is not allowed in the session's current state, or the
    /// customer's input was invalid.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// The coupon service refused the code. The previous discount is kept.
    #[error("{message}")]
    CouponRejected {
        /// Message from the coupon service
        message: String,
    },

    /// The customer declined to place the order.
    #[error("order was not placed")]
    Cancelled,

    /// The backend refused to create the order.
    #[error("{message}")]
    OrderCreation {
        /// Message from the backend, verbatim
        message: String,
    },

    /// The backend could not be reached or refused the session.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The total could not be derived.
    #[error("failed to derive total: {0}")]
    Money(#[from] MoneyError),
}

impl CheckoutError {
    /// Whether the customer should be sent back to their cart.
    pub fn redirects_to_cart(&self) -> bool {
        matches!(self, Self::Load(_))
    }
}
