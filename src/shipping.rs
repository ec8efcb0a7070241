//! Shipping fee sequencing
//!
//! Shipping fees are resolved per address by a remote rate service. Several
//! requests may be in flight when the customer switches address quickly, and
//! their responses can arrive in any order. Every request is issued a
//! [`ShippingTicket`]; only the most recently issued ticket may commit a fee.

use thiserror::Error;

use crate::{
    ids::AddressId,
    pricing::{Vnd, vnd},
};

/// Fee charged when the rate service cannot price an address.
pub const DEFAULT_SHIPPING_FEE: i64 = 25_000;

/// [`DEFAULT_SHIPPING_FEE`] as money.
#[must_use]
pub fn default_shipping_fee() -> Vnd {
    vnd(DEFAULT_SHIPPING_FEE)
}

/// Proof that a shipping fee request was issued for an address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShippingTicket {
    sequence: u64,
    address: AddressId,
}

impl ShippingTicket {
    /// The address the fee is being resolved for
    pub fn address(&self) -> AddressId {
        self.address
    }
}

/// Issues shipping tickets and tracks which one is current.
#[derive(Debug, Default)]
pub struct ShippingSequencer {
    issued: u64,
    settled: u64,
}

impl ShippingSequencer {
    /// Issue a ticket for `address`, superseding every earlier ticket.
    pub fn issue(&mut self, address: AddressId) -> ShippingTicket {
        self.issued += 1;

        ShippingTicket {
            sequence: self.issued,
            address,
        }
    }

    /// Supersede every outstanding ticket without issuing a new one.
    pub fn invalidate(&mut self) {
        self.issued += 1;
        self.settled = self.issued;
    }

    /// Whether `ticket` is the latest issued ticket.
    pub fn is_current(&self, ticket: &ShippingTicket) -> bool {
        ticket.sequence == self.issued
    }

    /// Record that the latest ticket has settled.
    pub fn settle(&mut self, ticket: &ShippingTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }

        self.settled = ticket.sequence;

        true
    }

    /// Whether the latest ticket is still waiting for a fee.
    pub fn is_pending(&self) -> bool {
        self.settled < self.issued
    }
}

/// Why a shipping fee could not be resolved.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShippingFeeError {
    /// The rate service returned an error.
    #[error("shipping rate service unavailable: {0}")]
    Unavailable(String),

    /// The rate service did not answer in time.
    #[error("shipping rate service timed out")]
    Timeout,
}

/// What happened to a resolved shipping fee.
#[derive(Debug, Clone, PartialEq)]
pub enum ShippingOutcome {
    /// The resolved fee was committed.
    Resolved(Vnd),

    /// Resolution failed and the default fee was committed instead.
    Fallback {
        /// The committed fee, always [`DEFAULT_SHIPPING_FEE`]
        fee: Vnd,

        /// Why resolution failed
        reason: ShippingFeeError,
    },

    /// A newer address selection was made; the response was discarded.
    Superseded,
}
