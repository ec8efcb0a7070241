//! Coupons
//!
//! Coupons are validated and priced by the backend. The local calculation here
//! is used to preview what each available coupon would be worth before the
//! customer applies it, and follows the same rules the backend enforces.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    discounts::{DiscountError, percent_of_minor, percentage_from_points},
    pricing::{Vnd, vnd},
};

/// How a coupon's `discount_value` is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    /// `discount_value` is a percentage in points (`10` is 10% off the items total).
    Percentage,

    /// `discount_value` is a fixed amount of dong.
    FixedAmount,
}

/// Errors raised when a coupon cannot be used for an order.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CouponError {
    /// The items total does not reach the coupon's minimum order value.
    #[error("order total {actual} is below the coupon minimum of {minimum}")]
    BelowMinimumOrder {
        /// Minimum items total required
        minimum: Vnd,

        /// Items total of the order
        actual: Vnd,
    },

    /// The coupon carries a negative or out of range discount value.
    #[error("coupon {0} has an invalid discount value")]
    InvalidValue(String),

    /// Wrapped percentage calculation error.
    #[error(transparent)]
    Discount(#[from] DiscountError),
}

/// A discount code offered to the customer.
#[derive(Clone, Debug, PartialEq)]
pub struct Coupon {
    code: String,
    discount_type: DiscountType,
    discount_value: i64,
    min_order_value: Vnd,
    max_discount: Option<Vnd>,
}

impl Coupon {
    /// Create a coupon with no minimum order value and no discount cap.
    #[must_use]
    pub fn new(code: impl Into<String>, discount_type: DiscountType, discount_value: i64) -> Self {
        Self {
            code: code.into(),
            discount_type,
            discount_value,
            min_order_value: vnd(0),
            max_discount: None,
        }
    }

    /// Require the items total to reach `min_order_value`.
    #[must_use]
    pub fn with_min_order_value(mut self, min_order_value: Vnd) -> Self {
        self.min_order_value = min_order_value;
        self
    }

    /// Cap the discount a percentage coupon can give.
    #[must_use]
    pub fn with_max_discount(mut self, max_discount: Option<Vnd>) -> Self {
        self.max_discount = max_discount;
        self
    }

    /// Returns the coupon code
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the discount type
    pub fn discount_type(&self) -> DiscountType {
        self.discount_type
    }

    /// Returns the raw discount value
    pub fn discount_value(&self) -> i64 {
        self.discount_value
    }

    /// Returns the minimum order value
    pub fn min_order_value(&self) -> Vnd {
        self.min_order_value
    }

    /// Returns the discount cap, if any
    pub fn max_discount(&self) -> Option<Vnd> {
        self.max_discount
    }

    /// The discount this coupon gives on the given items total.
    ///
    /// The result never exceeds `items_total`.
    ///
    /// # Errors
    ///
    /// - [`CouponError::BelowMinimumOrder`]: `items_total` is under the minimum order value.
    /// - [`CouponError::InvalidValue`]: the discount value is negative, or above 100 for a percentage.
    /// - [`CouponError::Discount`]: the percentage calculation overflowed.
    pub fn discount_for(&self, items_total: Vnd) -> Result<Vnd, CouponError> {
        let items = items_total.to_minor_units();

        if items < self.min_order_value.to_minor_units() {
            return Err(CouponError::BelowMinimumOrder {
                minimum: self.min_order_value,
                actual: items_total,
            });
        }

        let discount = match self.discount_type {
            DiscountType::Percentage => {
                if !(0..=100).contains(&self.discount_value) {
                    return Err(CouponError::InvalidValue(self.code.clone()));
                }

                let percent = percentage_from_points(self.discount_value)?;
                let amount = percent_of_minor(&percent, items)?;

                self.max_discount
                    .map_or(amount, |cap| amount.min(cap.to_minor_units()))
            }
            DiscountType::FixedAmount => {
                if self.discount_value < 0 {
                    return Err(CouponError::InvalidValue(self.code.clone()));
                }

                self.discount_value
            }
        };

        Ok(vnd(discount.clamp(0, items.max(0))))
    }
}

/// The coupon currently applied to a checkout session and the discount the
/// backend granted for it.
#[derive(Clone, Debug, PartialEq)]
pub struct AppliedCoupon {
    /// The applied code
    pub code: String,

    /// The discount granted by the backend
    pub discount: Vnd,
}
