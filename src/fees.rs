//! Fee Components

use rusty_money::MoneyError;

use crate::pricing::{Vnd, zero};

/// The amounts that make up a checkout total.
///
/// The total itself is never stored. It is derived from the components every
/// time it is read, so updating any one component can never leave it stale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeeComponents {
    /// Sum of the selected cart line subtotals
    pub items_total: Vnd,

    /// Discount granted by the applied coupon
    pub discount_amount: Vnd,

    /// Flat platform fee
    pub service_fee: Vnd,

    /// Delivery fee for the selected address
    pub shipping_fee: Vnd,
}

impl FeeComponents {
    /// Components with no discount and no shipping fee yet.
    #[must_use]
    pub fn new(items_total: Vnd, service_fee: Vnd) -> Self {
        Self {
            items_total,
            discount_amount: zero(),
            service_fee,
            shipping_fee: zero(),
        }
    }

    /// `items_total + service_fee + shipping_fee - discount_amount`
    ///
    /// # Errors
    ///
    /// Returns an error if the components are in different currencies.
    pub fn total(&self) -> Result<Vnd, MoneyError> {
        self.items_total
            .add(self.service_fee)?
            .add(self.shipping_fee)?
            .sub(self.discount_amount)
    }
}
