//! Checkout Phases

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Where a checkout session is in its lifecycle.
///
/// Loading and failure happen before a session exists: a session is only
/// built from a successful load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Idle and accepting changes.
    Ready,

    /// Waiting for the shipping fee of the selected address.
    CalculatingShipping,

    /// Waiting for the coupon service to apply or remove a coupon.
    ApplyingCoupon,

    /// Waiting for the backend to create the order.
    Submitting,

    /// The order was created. Terminal.
    Submitted,
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Ready => "ready",
            Self::CalculatingShipping => "calculating shipping",
            Self::ApplyingCoupon => "applying coupon",
            Self::Submitting => "submitting",
            Self::Submitted => "submitted",
        })
    }
}
