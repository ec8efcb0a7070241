//! Tiffin prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    addresses::{Address, default_address},
    checkout::{
        CheckoutInfo, CheckoutSnapshot, CouponPreview, Merchant, Phase, ReconcileError, Reconciler,
    },
    coupons::{AppliedCoupon, Coupon, CouponError, DiscountType},
    fees::FeeComponents,
    ids::{AddressId, DishId, MerchantId, OrderId},
    lines::{CartLine, CheckoutCart, LoadError},
    orders::{MAX_NOTES_CHARS, OrderDraft, OrderRequest, PaymentMethod, ValidationError},
    pricing::{Vnd, vnd, zero},
    shipping::{
        DEFAULT_SHIPPING_FEE, ShippingFeeError, ShippingOutcome, ShippingTicket,
        default_shipping_fee,
    },
};
