//! Checkout Pricing Reconciler
//!
//! Keeps the checkout total consistent while the shipping fee and the coupon
//! discount are resolved by two independent services. Each service only ever
//! commits its own component; the total is rederived from all four
//! components whenever it is read:
//!
//! ```text
//! total = items_total + service_fee + shipping_fee - discount_amount
//! ```
//!
//! The reconciler does no I/O. Callers start an operation (which may hand
//! back a [`ShippingTicket`]), perform the request, and feed the result back.

use rusty_money::MoneyError;

use crate::{
    addresses::{Address, default_address},
    coupons::{AppliedCoupon, Coupon, CouponError},
    fees::FeeComponents,
    ids::{AddressId, DishId, OrderId},
    lines::{CheckoutCart, LoadError},
    orders::{OrderDraft, OrderRequest, ValidationError},
    pricing::{Vnd, zero},
    shipping::{
        ShippingFeeError, ShippingOutcome, ShippingSequencer, ShippingTicket, default_shipping_fee,
    },
};

mod errors;
mod info;
mod phase;

pub use errors::*;
pub use info::*;
pub use phase::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Submission {
    Idle,
    Submitting,
    Submitted(OrderId),
}

/// A point-in-time view of the checkout totals.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckoutSnapshot {
    /// Session phase
    pub phase: Phase,

    /// Fee components
    pub fees: FeeComponents,

    /// Derived total
    pub total: Vnd,

    /// Selected delivery address
    pub selected_address: Option<AddressId>,

    /// Applied coupon code
    pub applied_coupon: Option<String>,
}

/// What an available coupon would be worth on the current order.
#[derive(Debug)]
pub struct CouponPreview<'a> {
    /// The coupon
    pub coupon: &'a Coupon,

    /// Its discount, or why it cannot be used
    pub discount: Result<Vnd, CouponError>,
}

/// Fee state of one checkout session.
#[derive(Debug)]
pub struct Reconciler {
    merchant: Option<Merchant>,
    cart: CheckoutCart,
    addresses: Vec<Address>,
    selected_address: Option<AddressId>,
    fees: FeeComponents,
    applied_coupon: Option<AppliedCoupon>,
    available_coupons: Vec<Coupon>,
    shipping: ShippingSequencer,
    coupon_pending: bool,
    submission: Submission,
}

impl Reconciler {
    /// Build a session from the backend's checkout info and the dishes the
    /// customer chose to check out.
    ///
    /// Selects the default address and, when there is one, returns the ticket
    /// for resolving its shipping fee.
    ///
    /// # Errors
    ///
    /// - [`LoadError::EmptySelection`]: none of `selected` is in the cart.
    /// - [`LoadError::MultipleMerchants`]: the selection spans merchants.
    /// - [`LoadError::Pricing`]: the selected lines could not be totalled.
    pub fn load(
        info: CheckoutInfo,
        selected: &[DishId],
    ) -> Result<(Self, Option<ShippingTicket>), LoadError> {
        let cart = CheckoutCart::select(info.lines, selected)?;
        let items_total = cart.items_total()?;

        let (applied_coupon, discount_amount) =
            coupon_on_record(info.applied_coupon, info.discount_amount);

        let mut fees = FeeComponents::new(items_total, info.service_fee);
        fees.discount_amount = discount_amount;

        let mut reconciler = Self {
            merchant: info.merchant,
            cart,
            addresses: info.addresses,
            selected_address: None,
            fees,
            applied_coupon,
            available_coupons: info.available_coupons,
            shipping: ShippingSequencer::default(),
            coupon_pending: false,
            submission: Submission::Idle,
        };

        let default = default_address(&reconciler.addresses, info.default_address).map(|a| a.id);

        let ticket = default.map(|id| {
            reconciler.selected_address = Some(id);
            reconciler.shipping.issue(id)
        });

        Ok((reconciler, ticket))
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        match self.submission {
            Submission::Submitted(_) => Phase::Submitted,
            Submission::Submitting => Phase::Submitting,
            Submission::Idle if self.shipping.is_pending() => Phase::CalculatingShipping,
            Submission::Idle if self.coupon_pending => Phase::ApplyingCoupon,
            Submission::Idle => Phase::Ready,
        }
    }

    /// Returns the merchant, if known
    pub fn merchant(&self) -> Option<&Merchant> {
        self.merchant.as_ref()
    }

    /// Returns the lines being checked out
    pub fn cart(&self) -> &CheckoutCart {
        &self.cart
    }

    /// Returns the saved addresses
    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// Returns the selected address id
    pub fn selected_address(&self) -> Option<AddressId> {
        self.selected_address
    }

    /// Returns the fee components
    pub fn fees(&self) -> &FeeComponents {
        &self.fees
    }

    /// Returns the applied coupon
    pub fn applied_coupon(&self) -> Option<&AppliedCoupon> {
        self.applied_coupon.as_ref()
    }

    /// Returns the created order id once submitted
    pub fn order_id(&self) -> Option<OrderId> {
        match self.submission {
            Submission::Submitted(order) => Some(order),
            Submission::Idle | Submission::Submitting => None,
        }
    }

    /// The checkout total, rederived from the fee components.
    ///
    /// # Errors
    ///
    /// Returns an error if the components are in different currencies.
    pub fn total(&self) -> Result<Vnd, MoneyError> {
        self.fees.total()
    }

    /// Capture the current totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the total cannot be derived.
    pub fn snapshot(&self) -> Result<CheckoutSnapshot, MoneyError> {
        Ok(CheckoutSnapshot {
            phase: self.phase(),
            fees: self.fees,
            total: self.total()?,
            selected_address: self.selected_address,
            applied_coupon: self.applied_coupon.as_ref().map(|c| c.code.clone()),
        })
    }

    /// Preview each available coupon against the current items total.
    pub fn coupon_previews(&self) -> Vec<CouponPreview<'_>> {
        self.available_coupons
            .iter()
            .map(|coupon| CouponPreview {
                coupon,
                discount: coupon.discount_for(self.fees.items_total),
            })
            .collect()
    }

    /// Select a delivery address and start resolving its shipping fee.
    ///
    /// The shipping fee keeps its previous value until the returned ticket is
    /// settled with [`Reconciler::settle_shipping`].
    ///
    /// # Errors
    ///
    /// - [`ReconcileError::Validation`]: the address is not in the address book.
    /// - [`ReconcileError::Busy`] / [`ReconcileError::AlreadySubmitted`]: an
    ///   order is being or has been placed.
    pub fn select_address(&mut self, address: AddressId) -> Result<ShippingTicket, ReconcileError> {
        self.ensure_open()?;

        if !self.addresses.iter().any(|a| a.id == address) {
            return Err(ValidationError::UnknownAddress(address).into());
        }

        self.selected_address = Some(address);

        Ok(self.shipping.issue(address))
    }

    /// Commit the result of a shipping fee request.
    ///
    /// Results for superseded tickets are discarded. Failures commit
    /// [`crate::shipping::DEFAULT_SHIPPING_FEE`].
    pub fn settle_shipping(
        &mut self,
        ticket: &ShippingTicket,
        result: Result<Vnd, ShippingFeeError>,
    ) -> ShippingOutcome {
        if !self.shipping.settle(ticket) {
            return ShippingOutcome::Superseded;
        }

        match result {
            Ok(fee) => {
                self.fees.shipping_fee = fee;

                ShippingOutcome::Resolved(fee)
            }
            Err(reason) => {
                let fee = default_shipping_fee();
                self.fees.shipping_fee = fee;

                ShippingOutcome::Fallback { fee, reason }
            }
        }
    }

    /// Start applying a coupon code. Returns the trimmed code to send.
    ///
    /// # Errors
    ///
    /// - [`ReconcileError::Validation`]: the code is blank.
    /// - [`ReconcileError::Busy`]: a coupon operation or submission is running.
    /// - [`ReconcileError::AlreadySubmitted`]: the order was placed.
    pub fn begin_coupon(&mut self, code: &str) -> Result<String, ReconcileError> {
        self.ensure_open()?;

        let code = code.trim();

        if code.is_empty() {
            return Err(ValidationError::EmptyCouponCode.into());
        }

        self.ensure_coupon_idle()?;
        self.coupon_pending = true;

        Ok(code.to_string())
    }

    /// Commit a coupon the backend accepted. Only the discount and the
    /// coupon marker change; the held shipping fee is kept.
    ///
    /// The discount is clamped to the items total. Returns the coupon as
    /// committed.
    pub fn grant_coupon(&mut self, mut coupon: AppliedCoupon) -> AppliedCoupon {
        coupon.discount = clamp_discount(coupon.discount, self.fees.items_total);

        self.fees.discount_amount = coupon.discount;
        self.applied_coupon = Some(coupon.clone());
        self.coupon_pending = false;

        coupon
    }

    /// End a coupon operation that failed, leaving the previous discount in place.
    pub fn abandon_coupon(&mut self) {
        self.coupon_pending = false;
    }

    /// Start removing the applied coupon.
    ///
    /// Returns `false` when no coupon is applied, in which case nothing
    /// changes and no request should be made.
    ///
    /// # Errors
    ///
    /// - [`ReconcileError::Busy`]: a coupon operation or submission is running.
    /// - [`ReconcileError::AlreadySubmitted`]: the order was placed.
    pub fn begin_coupon_removal(&mut self) -> Result<bool, ReconcileError> {
        self.ensure_open()?;

        if self.applied_coupon.is_none() {
            return Ok(false);
        }

        self.ensure_coupon_idle()?;
        self.coupon_pending = true;

        Ok(true)
    }

    /// Commit the removal once the base checkout info has been re-fetched.
    ///
    /// The coupon and its discount are dropped whatever the base info still
    /// reports; only the available coupons are taken from it and the held
    /// shipping fee is kept.
    pub fn finish_coupon_removal(&mut self, base: &CheckoutInfo) {
        self.available_coupons.clone_from(&base.available_coupons);
        self.applied_coupon = None;
        self.fees.discount_amount = zero();
        self.coupon_pending = false;
    }

    /// Replace the address book after an address was added, removed or
    /// made default.
    ///
    /// If the selected address is gone, the default address is selected and
    /// a ticket for its shipping fee is returned. With no addresses left the
    /// selection is cleared and the shipping fee drops to zero.
    ///
    /// # Errors
    ///
    /// Returns an error once an order is being or has been placed.
    pub fn replace_addresses(
        &mut self,
        addresses: Vec<Address>,
        flagged_default: Option<AddressId>,
    ) -> Result<Option<ShippingTicket>, ReconcileError> {
        self.ensure_open()?;

        self.addresses = addresses;

        let still_selected = self
            .selected_address
            .is_some_and(|id| self.addresses.iter().any(|a| a.id == id));

        if still_selected {
            return Ok(None);
        }

        if let Some(id) = default_address(&self.addresses, flagged_default).map(|a| a.id) {
            self.selected_address = Some(id);

            return Ok(Some(self.shipping.issue(id)));
        }

        self.selected_address = None;
        self.shipping.invalidate();
        self.fees.shipping_fee = zero();

        Ok(None)
    }

    /// Build the order request for the current state without changing it.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Validation`] when no address is selected, no
    /// payment method was chosen or the note is too long.
    pub fn order_request(&self, draft: &OrderDraft) -> Result<OrderRequest, ReconcileError> {
        let address_id = self
            .selected_address
            .ok_or(ValidationError::MissingAddress)?;

        let payment_method = draft.validate()?;

        let notes = draft.notes.trim();

        Ok(OrderRequest {
            dish_ids: self.cart.dish_ids(),
            address_id,
            payment_method,
            coupon_code: self.applied_coupon.as_ref().map(|c| c.code.clone()),
            notes: (!notes.is_empty()).then(|| notes.to_string()),
            shipping_fee: self.fees.shipping_fee,
        })
    }

    /// Validate the draft and enter [`Phase::Submitting`].
    ///
    /// # Errors
    ///
    /// - [`ReconcileError::Busy`]: a shipping fee or coupon is still resolving,
    ///   or a submission is already running.
    /// - [`ReconcileError::AlreadySubmitted`]: the order was placed.
    /// - [`ReconcileError::Validation`]: see [`Reconciler::order_request`].
    pub fn begin_submit(&mut self, draft: &OrderDraft) -> Result<OrderRequest, ReconcileError> {
        self.ensure_ready()?;

        let request = self.order_request(draft)?;
        self.submission = Submission::Submitting;

        Ok(request)
    }

    /// Return to [`Phase::Ready`] after the customer declined or the backend
    /// rejected the order.
    pub fn submission_failed(&mut self) {
        if self.submission == Submission::Submitting {
            self.submission = Submission::Idle;
        }
    }

    /// Record the created order. Terminal.
    pub fn submitted(&mut self, order: OrderId) {
        self.submission = Submission::Submitted(order);
    }

    /// Check that nothing is resolving and no order was placed.
    ///
    /// # Errors
    ///
    /// - [`ReconcileError::Busy`]: an operation is still running.
    /// - [`ReconcileError::AlreadySubmitted`]: the order was placed.
    pub fn ensure_ready(&self) -> Result<(), ReconcileError> {
        self.ensure_open()?;

        match self.phase() {
            Phase::Ready => Ok(()),
            phase => Err(ReconcileError::Busy(phase)),
        }
    }

    /// Check that no order is being or has been placed.
    ///
    /// # Errors
    ///
    /// - [`ReconcileError::Busy`]: an order is being placed.
    /// - [`ReconcileError::AlreadySubmitted`]: the order was placed.
    pub fn ensure_open(&self) -> Result<(), ReconcileError> {
        match self.submission {
            Submission::Idle => Ok(()),
            Submission::Submitting => Err(ReconcileError::Busy(Phase::Submitting)),
            Submission::Submitted(_) => Err(ReconcileError::AlreadySubmitted),
        }
    }

    fn ensure_coupon_idle(&self) -> Result<(), ReconcileError> {
        if self.coupon_pending {
            Err(ReconcileError::Busy(Phase::ApplyingCoupon))
        } else {
            Ok(())
        }
    }
}

fn clamp_discount(discount: Vnd, items_total: Vnd) -> Vnd {
    if discount.to_minor_units() > items_total.to_minor_units() {
        items_total
    } else {
        discount
    }
}

/// A recorded discount only counts while a coupon is on record.
fn coupon_on_record(code: Option<String>, discount: Vnd) -> (Option<AppliedCoupon>, Vnd) {
    match code {
        Some(code) => (Some(AppliedCoupon { code, discount }), discount),
        None => (None, zero()),
    }
}
