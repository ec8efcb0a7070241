//! Checkout Info

use crate::{
    addresses::Address,
    coupons::Coupon,
    ids::{AddressId, MerchantId},
    lines::CartLine,
    pricing::{Vnd, zero},
};

/// The merchant whose dishes are being checked out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Merchant {
    /// Merchant id
    pub id: MerchantId,

    /// Display name
    pub name: String,
}

/// Base checkout data as returned by the backend, before the customer's
/// selection is applied.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckoutInfo {
    /// Merchant details, when the backend resolved a single merchant
    pub merchant: Option<Merchant>,

    /// Every line in the customer's cart
    pub lines: Vec<CartLine>,

    /// Saved delivery addresses
    pub addresses: Vec<Address>,

    /// The address the backend considers the default
    pub default_address: Option<AddressId>,

    /// Flat platform fee
    pub service_fee: Vnd,

    /// Discount from the coupon the backend has on record for this checkout
    pub discount_amount: Vnd,

    /// Code of the coupon the backend has on record, if any
    pub applied_coupon: Option<String>,

    /// Coupons the customer may apply
    pub available_coupons: Vec<Coupon>,
}

impl Default for CheckoutInfo {
    fn default() -> Self {
        Self {
            merchant: None,
            lines: Vec::new(),
            addresses: Vec::new(),
            default_address: None,
            service_fee: zero(),
            discount_amount: zero(),
            applied_coupon: None,
            available_coupons: Vec::new(),
        }
    }
}
