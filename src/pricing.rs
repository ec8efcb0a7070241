//! Prices

use rusty_money::{Money, MoneyError, iso};
use thiserror::Error;

use crate::lines::CartLine;

/// An amount of Vietnamese dong. VND has no minor unit in practice, so one
/// minor unit is one dong.
pub type Vnd = Money<'static, iso::Currency>;

/// Build a [`Vnd`] amount from whole dong.
#[must_use]
pub fn vnd(amount: i64) -> Vnd {
    Money::from_minor(amount, iso::VND)
}

/// Zero dong.
#[must_use]
pub fn zero() -> Vnd {
    vnd(0)
}

/// Errors that can occur while calculating total price.
#[derive(Debug, Error, PartialEq)]
pub enum TotalPriceError {
    /// A line quantity multiplied by its price does not fit in an `i64`.
    #[error("line total overflowed")]
    Overflow,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Calculates the items total of a list of cart lines.
///
/// An empty list totals to zero dong.
///
/// # Errors
///
/// - [`TotalPriceError::Overflow`]: a line subtotal overflowed.
/// - [`TotalPriceError::Money`]: Wrapped money arithmetic or currency mismatch error.
pub fn items_total(lines: &[CartLine]) -> Result<Vnd, TotalPriceError> {
    lines
        .iter()
        .try_fold(zero(), |acc, line| -> Result<Vnd, TotalPriceError> {
            Ok(acc.add(line.subtotal()?)?)
        })
}
