//! Orders

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    ids::{AddressId, DishId},
    pricing::Vnd,
};

/// Longest order note accepted, in characters.
pub const MAX_NOTES_CHARS: usize = 500;

/// How the customer pays for the order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Cash on delivery
    #[serde(rename = "COD")]
    Cod,

    /// Platform wallet balance
    #[serde(rename = "WALLET")]
    Wallet,

    /// `VNPay` online payment
    #[serde(rename = "VNPAY")]
    VnPay,
}

impl PaymentMethod {
    /// Backend name of the payment method.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cod => "COD",
            Self::Wallet => "WALLET",
            Self::VnPay => "VNPAY",
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// An unrecognised payment method name.
#[derive(Debug, Error, PartialEq)]
#[error("unknown payment method {0:?}")]
pub struct UnknownPaymentMethod(pub String);

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "COD" => Ok(Self::Cod),
            "WALLET" => Ok(Self::Wallet),
            "VNPAY" => Ok(Self::VnPay),
            _ => Err(UnknownPaymentMethod(value.to_string())),
        }
    }
}

/// Problems with the customer's input that block an order or coupon from
/// being submitted. No request is made when one of these is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No delivery address is selected.
    #[error("please select a delivery address")]
    MissingAddress,

    /// The address is not one of the customer's saved addresses.
    #[error("address {0} is not in your address book")]
    UnknownAddress(AddressId),

    /// No payment method was chosen.
    #[error("please choose a payment method")]
    MissingPaymentMethod,

    /// The order note is too long.
    #[error("notes are {length} characters long; the limit is {max}")]
    NotesTooLong {
        /// Length of the submitted note, in characters
        length: usize,

        /// Maximum accepted length
        max: usize,
    },

    /// The coupon code is empty.
    #[error("please enter a coupon code")]
    EmptyCouponCode,
}

/// What the customer filled in on the checkout form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrderDraft {
    /// Chosen payment method
    pub payment_method: Option<PaymentMethod>,

    /// Free-text note for the merchant or courier
    pub notes: String,
}

impl OrderDraft {
    /// Check the payment method and note length.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::MissingPaymentMethod`]: no payment method chosen.
    /// - [`ValidationError::NotesTooLong`]: the note exceeds [`MAX_NOTES_CHARS`].
    pub fn validate(&self) -> Result<PaymentMethod, ValidationError> {
        let payment_method = self
            .payment_method
            .ok_or(ValidationError::MissingPaymentMethod)?;

        let length = self.notes.chars().count();

        if length > MAX_NOTES_CHARS {
            return Err(ValidationError::NotesTooLong {
                length,
                max: MAX_NOTES_CHARS,
            });
        }

        Ok(payment_method)
    }
}

/// Everything the backend needs to create an order.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderRequest {
    /// Dishes being ordered
    pub dish_ids: Vec<DishId>,

    /// Delivery address
    pub address_id: AddressId,

    /// Payment method
    pub payment_method: PaymentMethod,

    /// Applied coupon, if any
    pub coupon_code: Option<String>,

    /// Order note, omitted when blank
    pub notes: Option<String>,

    /// Shipping fee shown to the customer
    pub shipping_fee: Vnd,
}
