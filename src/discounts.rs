//! Discount utilities

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use thiserror::Error;

/// Errors specific to discount calculations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,
}

/// Calculate the discount amount in whole units based on a percentage and an amount.
///
/// Rounds half away from zero, so 10% of 15 005 dong is 1 501 dong.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the calculation overflows.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    ((*percent) * Decimal::ONE) // decimal_percentage does not expose the underlying Decimal
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}

/// Convert a percentage expressed in points (e.g. `10` for 10%) into a [`Percentage`].
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the value cannot be represented.
pub fn percentage_from_points(points: i64) -> Result<Percentage, DiscountError> {
    let points = Decimal::from_i64(points).ok_or(DiscountError::PercentConversion)?;
    let fraction = points
        .checked_div(Decimal::ONE_HUNDRED)
        .ok_or(DiscountError::PercentConversion)?;

    Percentage::try_from(fraction.to_string().as_str())
        .map_err(|_error| DiscountError::PercentConversion)
}
