//! Tiffin
//!
//! Checkout pricing for the Tiffin food-delivery platform: cart lines, coupons,
//! shipping fees and the reconciler that keeps the checkout total consistent
//! while those are resolved independently.

pub mod addresses;
pub mod checkout;
pub mod coupons;
pub mod discounts;
pub mod fees;
pub mod ids;
pub mod lines;
pub mod orders;
pub mod prelude;
pub mod pricing;
pub mod shipping;
