//! Checkout session
//!
//! Drives a [`Reconciler`] against the backend. The reconciler lock is taken
//! to start an operation and again to commit its result, never across a
//! request, so a slow shipping fee does not hold up a coupon and overlapping
//! address selections race freely. Only the latest selection commits.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
    time::Duration,
};

use tokio::{sync::Mutex, task::spawn_blocking, time::timeout};
use tracing::{Span, debug, info, warn};

use tiffin::{
    checkout::{CheckoutSnapshot, Reconciler},
    coupons::{AppliedCoupon, Coupon, CouponError},
    ids::{AddressId, DishId},
    orders::{OrderDraft, OrderRequest},
    pricing::Vnd,
    shipping::{ShippingFeeError, ShippingOutcome, ShippingTicket},
};

use crate::api::{ApiError, CheckoutApi, NewAddress, Order};

mod confirm;
mod errors;

pub use confirm::*;
pub use errors::*;

/// Default client-side limit on a shipping fee request.
pub const DEFAULT_SHIPPING_TIMEOUT: Duration = Duration::from_secs(5);

/// Tunables for a checkout session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CheckoutSettings {
    /// How long to wait for a shipping fee before using the default fee.
    pub shipping_timeout: Duration,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            shipping_timeout: DEFAULT_SHIPPING_TIMEOUT,
        }
    }
}

/// An owned preview of an available coupon.
#[derive(Clone, Debug, PartialEq)]
pub struct CouponOffer {
    /// The coupon
    pub coupon: Coupon,

    /// Its discount on the current order, or why it cannot be used
    pub discount: Result<Vnd, CouponError>,
}

/// One customer's checkout, from load until the order is placed.
#[derive(Clone)]
pub struct CheckoutSession {
    api: Arc<dyn CheckoutApi>,
    state: Arc<Mutex<Reconciler>>,
    settings: CheckoutSettings,
}

impl CheckoutSession {
    /// Load checkout info and build a session for the `selected` dishes.
    ///
    /// The default address is selected and its shipping fee resolved before
    /// returning; the outcome is returned alongside the session.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::Load`]: nothing selected is in the cart, or the
    ///   selection spans merchants.
    /// - [`CheckoutError::Api`]: checkout info could not be fetched.
    #[tracing::instrument(
        name = "checkout.session.load",
        skip(api, selected, settings),
        fields(
            selected_count = selected.len(),
            line_count = tracing::field::Empty,
            address_count = tracing::field::Empty
        ),
        err
    )]
    pub async fn load(
        api: Arc<dyn CheckoutApi>,
        selected: &[DishId],
        settings: CheckoutSettings,
    ) -> Result<(Self, Option<ShippingOutcome>), CheckoutError> {
        let info = api.checkout_info().await?;

        let (reconciler, ticket) = Reconciler::load(info, selected)?;

        let span = Span::current();

        span.record("line_count", reconciler.cart().lines().len());
        span.record("address_count", reconciler.addresses().len());

        let session = Self {
            api,
            state: Arc::new(Mutex::new(reconciler)),
            settings,
        };

        let outcome = match ticket {
            Some(ticket) => Some(session.resolve_shipping(ticket).await),
            None => None,
        };

        info!("loaded checkout");

        Ok((session, outcome))
    }

    /// Select a delivery address and resolve its shipping fee.
    ///
    /// Returns [`ShippingOutcome::Superseded`] when another address was
    /// selected before this fee arrived.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Reconcile`] when the address is unknown or
    /// the order is being or has been placed.
    #[tracing::instrument(
        name = "checkout.session.select_address",
        skip(self),
        fields(address_id = %address),
        err
    )]
    pub async fn select_address(
        &self,
        address: AddressId,
    ) -> Result<ShippingOutcome, CheckoutError> {
        let ticket = self.state.lock().await.select_address(address)?;

        Ok(self.resolve_shipping(ticket).await)
    }

    /// Apply a coupon code.
    ///
    /// Only the discount changes; the shipping fee held by the session is
    /// kept whatever the coupon service reports.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::Reconcile`]: the code is blank, or another coupon
    ///   operation or the order submission is running.
    /// - [`CheckoutError::CouponRejected`]: the coupon service refused the
    ///   code. The previous discount is kept.
    /// - [`CheckoutError::Api`]: the session is no longer authorised.
    #[tracing::instrument(
        name = "checkout.session.apply_coupon",
        skip(self),
        fields(discount = tracing::field::Empty),
        err
    )]
    pub async fn apply_coupon(&self, code: &str) -> Result<AppliedCoupon, CheckoutError> {
        let code = self.state.lock().await.begin_coupon(code)?;

        let info = match self.api.apply_coupon(&code).await {
            Ok(info) => info,
            Err(error) => {
                self.state.lock().await.abandon_coupon();

                return Err(coupon_failure(error));
            }
        };

        let applied = self.state.lock().await.grant_coupon(AppliedCoupon {
            code: info.applied_coupon.unwrap_or(code),
            discount: info.discount_amount,
        });

        Span::current().record("discount", applied.discount.to_minor_units());

        info!(code = %applied.code, "applied coupon");

        Ok(applied)
    }

    /// Remove the applied coupon. Returns `false`, without contacting the
    /// backend, when no coupon is applied.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::Reconcile`]: another coupon operation or the order
    ///   submission is running.
    /// - [`CheckoutError::Api`]: the base checkout info could not be fetched.
    ///   The coupon stays applied.
    #[tracing::instrument(name = "checkout.session.remove_coupon", skip(self), err)]
    pub async fn remove_coupon(&self) -> Result<bool, CheckoutError> {
        if !self.state.lock().await.begin_coupon_removal()? {
            debug!("no coupon to remove");

            return Ok(false);
        }

        match self.api.checkout_info().await {
            Ok(base) => {
                self.state.lock().await.finish_coupon_removal(&base);

                info!("removed coupon");

                Ok(true)
            }
            Err(error) => {
                self.state.lock().await.abandon_coupon();

                Err(error.into())
            }
        }
    }

    /// Validate the draft, ask `confirm`, and create the order.
    ///
    /// The session enters [`Phase::Submitting`] before `confirm` is asked, so
    /// nothing can change the order while the customer decides.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::Reconcile`]: the draft is invalid, a fee is still
    ///   resolving, or the order is being or was already placed.
    /// - [`CheckoutError::Cancelled`]: the customer declined. The session is
    ///   ready again.
    /// - [`CheckoutError::OrderCreation`]: the backend refused the order. The
    ///   session is ready to submit again.
    /// - [`CheckoutError::Api`]: the session is no longer authorised.
    ///
    /// [`Phase::Submitting`]: tiffin::checkout::Phase::Submitting
    #[tracing::instrument(
        name = "checkout.session.place_order",
        skip(self, draft, confirm),
        fields(
            payment_method = tracing::field::Empty,
            order_id = tracing::field::Empty
        ),
        err
    )]
    pub async fn place_order(
        &self,
        draft: &OrderDraft,
        confirm: Arc<dyn Confirm>,
    ) -> Result<Order, CheckoutError> {
        let (request, snapshot) = {
            let mut state = self.state.lock().await;

            let request = state.begin_submit(draft)?;

            match state.snapshot() {
                Ok(snapshot) => (request, snapshot),
                Err(error) => {
                    state.submission_failed();

                    return Err(error.into());
                }
            }
        };

        let span = Span::current();

        span.record("payment_method", tracing::field::display(request.payment_method));

        if !ask(confirm, request.clone(), snapshot).await {
            self.state.lock().await.submission_failed();

            info!("customer cancelled order");

            return Err(CheckoutError::Cancelled);
        }

        match self.api.create_order(&request).await {
            Ok(order) => {
                self.state.lock().await.submitted(order.id);

                span.record("order_id", tracing::field::display(order.id));

                info!(status = %order.status, "placed order");

                Ok(order)
            }
            Err(error) => {
                self.state.lock().await.submission_failed();

                Err(match error {
                    ApiError::Unauthorized => CheckoutError::Api(error),
                    other => CheckoutError::OrderCreation {
                        message: other.user_message(),
                    },
                })
            }
        }
    }

    /// Save a new address and refresh the address book.
    ///
    /// # Errors
    ///
    /// Returns an error when the order is being or has been placed, or the
    /// backend request fails.
    #[tracing::instrument(name = "checkout.session.add_address", skip(self, address), err)]
    pub async fn add_address(
        &self,
        address: NewAddress,
    ) -> Result<Option<ShippingOutcome>, CheckoutError> {
        self.state.lock().await.ensure_open()?;

        let created = self.api.create_address(address).await?;

        info!(address_id = %created.id, "added address");

        self.refresh_addresses().await
    }

    /// Delete an address and refresh the address book.
    ///
    /// When the selected address is deleted the default address is selected
    /// instead and its fee resolved.
    ///
    /// # Errors
    ///
    /// Returns an error when the order is being or has been placed, or the
    /// backend request fails.
    #[tracing::instrument(
        name = "checkout.session.remove_address",
        skip(self),
        fields(address_id = %address),
        err
    )]
    pub async fn remove_address(
        &self,
        address: AddressId,
    ) -> Result<Option<ShippingOutcome>, CheckoutError> {
        self.state.lock().await.ensure_open()?;

        self.api.delete_address(address).await?;

        self.refresh_addresses().await
    }

    /// Make an address the default.
    ///
    /// # Errors
    ///
    /// Returns an error when the order is being or has been placed, or the
    /// backend request fails.
    #[tracing::instrument(
        name = "checkout.session.make_default_address",
        skip(self),
        fields(address_id = %address),
        err
    )]
    pub async fn make_default_address(
        &self,
        address: AddressId,
    ) -> Result<Option<ShippingOutcome>, CheckoutError> {
        self.state.lock().await.ensure_open()?;

        let addresses = self.api.set_default_address(address).await?;

        let ticket = self
            .state
            .lock()
            .await
            .replace_addresses(addresses, Some(address))?;

        Ok(self.settle(ticket).await)
    }

    /// Capture the current totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the total cannot be derived.
    pub async fn snapshot(&self) -> Result<CheckoutSnapshot, CheckoutError> {
        Ok(self.state.lock().await.snapshot()?)
    }

    /// What each available coupon would be worth on the current order.
    pub async fn coupon_previews(&self) -> Vec<CouponOffer> {
        self.state
            .lock()
            .await
            .coupon_previews()
            .into_iter()
            .map(|preview| CouponOffer {
                coupon: preview.coupon.clone(),
                discount: preview.discount,
            })
            .collect()
    }

    /// Read the reconciler state.
    pub async fn with_state<R>(&self, read: impl FnOnce(&Reconciler) -> R) -> R {
        read(&*self.state.lock().await)
    }

    async fn refresh_addresses(&self) -> Result<Option<ShippingOutcome>, CheckoutError> {
        let addresses = self.api.addresses().await?;

        let ticket = self
            .state
            .lock()
            .await
            .replace_addresses(addresses, None)?;

        Ok(self.settle(ticket).await)
    }

    async fn settle(&self, ticket: Option<ShippingTicket>) -> Option<ShippingOutcome> {
        match ticket {
            Some(ticket) => Some(self.resolve_shipping(ticket).await),
            None => None,
        }
    }

    async fn resolve_shipping(&self, ticket: ShippingTicket) -> ShippingOutcome {
        let address = ticket.address();

        let result = match timeout(
            self.settings.shipping_timeout,
            self.api.shipping_fee(address),
        )
        .await
        {
            Ok(Ok(fee)) => Ok(fee),
            Ok(Err(error)) => Err(ShippingFeeError::Unavailable(error.user_message())),
            Err(_elapsed) => Err(ShippingFeeError::Timeout),
        };

        let outcome = self.state.lock().await.settle_shipping(&ticket, result);

        match &outcome {
            ShippingOutcome::Resolved(fee) => {
                debug!(address_id = %address, fee = fee.to_minor_units(), "resolved shipping fee");
            }
            ShippingOutcome::Fallback { fee, reason } => {
                warn!(
                    address_id = %address,
                    fee = fee.to_minor_units(),
                    %reason,
                    "shipping fee unavailable, using default fee"
                );
            }
            ShippingOutcome::Superseded => {
                debug!(address_id = %address, "discarded superseded shipping fee");
            }
        }

        outcome
    }
}

impl Debug for CheckoutSession {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CheckoutSession")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Run the prompt off the async workers; a prompt that fails declines.
async fn ask(
    confirm: Arc<dyn Confirm>,
    request: OrderRequest,
    snapshot: CheckoutSnapshot,
) -> bool {
    spawn_blocking(move || confirm.confirm(&request, &snapshot))
        .await
        .unwrap_or_else(|error| {
            warn!(%error, "order confirmation failed, treating as declined");

            false
        })
}

fn coupon_failure(error: ApiError) -> CheckoutError {
    match error {
        ApiError::Unauthorized => CheckoutError::Api(error),
        other => CheckoutError::CouponRejected {
            message: other.user_message(),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use testresult::TestResult;

    use tiffin::{
        checkout::{CheckoutInfo, Phase, ReconcileError},
        ids::OrderId,
        lines::LoadError,
        orders::{PaymentMethod, ValidationError},
        pricing::vnd,
        shipping::DEFAULT_SHIPPING_FEE,
    };

    use crate::{
        api::MockCheckoutApi,
        test::{
            FakeApi,
            fixtures::{self, checkout_info, selected},
        },
    };

    use super::*;

    fn draft() -> OrderDraft {
        OrderDraft {
            payment_method: Some(PaymentMethod::Cod),
            notes: "Khong hanh".to_string(),
        }
    }

    fn order(id: u64) -> Order {
        Order {
            id: OrderId::new(id),
            status: "PENDING".to_string(),
            total: None,
            created_at: None,
        }
    }

    /// A mock backend serving `info_calls` checkout info requests and a
    /// 25 000 shipping fee for every address.
    fn mock_api(info_calls: usize) -> MockCheckoutApi {
        let mut api = MockCheckoutApi::new();

        api.expect_checkout_info()
            .times(info_calls)
            .returning(|| Ok(checkout_info()));

        api.expect_shipping_fee()
            .returning(|_address| Ok(vnd(25_000)));

        api
    }

    async fn load(api: impl CheckoutApi + 'static) -> Result<CheckoutSession, CheckoutError> {
        let (session, _outcome) =
            CheckoutSession::load(Arc::new(api), &selected(), CheckoutSettings::default()).await?;

        Ok(session)
    }

    #[tokio::test]
    async fn load_resolves_default_address_fee() -> TestResult {
        let api = FakeApi::new(checkout_info()).with_shipping(1, 0, 25_000);

        let (session, outcome) =
            CheckoutSession::load(Arc::new(api), &selected(), CheckoutSettings::default()).await?;

        let snapshot = session.snapshot().await?;

        assert_eq!(outcome, Some(ShippingOutcome::Resolved(vnd(25_000))));
        assert_eq!(snapshot.phase, Phase::Ready);
        assert_eq!(snapshot.selected_address, Some(AddressId::new(1)));
        assert_eq!(snapshot.total, vnd(180_000));

        Ok(())
    }

    #[tokio::test]
    async fn load_without_addresses_is_ready_with_no_shipping() -> TestResult {
        let info = CheckoutInfo {
            addresses: Vec::new(),
            default_address: None,
            ..checkout_info()
        };

        let (session, outcome) = CheckoutSession::load(
            Arc::new(FakeApi::new(info)),
            &selected(),
            CheckoutSettings::default(),
        )
        .await?;

        let snapshot = session.snapshot().await?;

        assert_eq!(outcome, None);
        assert_eq!(snapshot.phase, Phase::Ready);
        assert_eq!(snapshot.selected_address, None);
        assert_eq!(snapshot.total, vnd(155_000));

        Ok(())
    }

    #[tokio::test]
    async fn load_with_unknown_dishes_redirects_to_cart() {
        let result = CheckoutSession::load(
            Arc::new(FakeApi::new(checkout_info())),
            &[DishId::new(999)],
            CheckoutSettings::default(),
        )
        .await;

        assert!(matches!(
            &result,
            Err(CheckoutError::Load(LoadError::EmptySelection))
        ));
        assert!(result.is_err_and(|error| error.redirects_to_cart()));
    }

    #[tokio::test(start_paused = true)]
    async fn latest_selection_wins_when_its_fee_arrives_first() -> TestResult {
        let api = FakeApi::new(checkout_info())
            .with_shipping(1, 0, 25_000)
            .with_shipping(2, 300, 40_000)
            .with_shipping(3, 100, 18_000);

        let session = load(api).await?;

        let (second, third) = tokio::join!(
            session.select_address(AddressId::new(2)),
            session.select_address(AddressId::new(3)),
        );

        assert_eq!(third?, ShippingOutcome::Resolved(vnd(18_000)));
        assert_eq!(second?, ShippingOutcome::Superseded);

        let snapshot = session.snapshot().await?;

        assert_eq!(snapshot.selected_address, Some(AddressId::new(3)));
        assert_eq!(snapshot.fees.shipping_fee, vnd(18_000));
        assert_eq!(snapshot.total, vnd(173_000));

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn stale_fee_arriving_first_is_discarded() -> TestResult {
        let api = FakeApi::new(checkout_info())
            .with_shipping(1, 0, 25_000)
            .with_shipping(2, 100, 40_000)
            .with_shipping(3, 300, 18_000);

        let session = load(api).await?;

        let (second, third) = tokio::join!(
            session.select_address(AddressId::new(2)),
            session.select_address(AddressId::new(3)),
        );

        assert_eq!(second?, ShippingOutcome::Superseded);
        assert_eq!(third?, ShippingOutcome::Resolved(vnd(18_000)));
        assert_eq!(session.snapshot().await?.fees.shipping_fee, vnd(18_000));

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn slow_shipping_fee_times_out_to_default() -> TestResult {
        let api = FakeApi::new(checkout_info())
            .with_shipping(1, 0, 10_000)
            .with_shipping(2, 10_000, 40_000);

        let session = load(api).await?;

        let outcome = session.select_address(AddressId::new(2)).await?;

        assert_eq!(
            outcome,
            ShippingOutcome::Fallback {
                fee: vnd(DEFAULT_SHIPPING_FEE),
                reason: ShippingFeeError::Timeout,
            }
        );

        let snapshot = session.snapshot().await?;

        assert_eq!(snapshot.phase, Phase::Ready);
        assert_eq!(snapshot.fees.shipping_fee, vnd(DEFAULT_SHIPPING_FEE));

        Ok(())
    }

    #[tokio::test]
    async fn failing_rate_service_uses_default_fee() -> TestResult {
        let api = FakeApi::new(checkout_info())
            .with_shipping(1, 0, 10_000)
            .with_failing_shipping(2);

        let session = load(api).await?;

        let outcome = session.select_address(AddressId::new(2)).await?;

        assert!(matches!(
            outcome,
            ShippingOutcome::Fallback {
                reason: ShippingFeeError::Unavailable(_),
                ..
            }
        ));
        assert_eq!(session.snapshot().await?.total, vnd(180_000));

        Ok(())
    }

    #[tokio::test]
    async fn selecting_unknown_address_is_rejected() -> TestResult {
        let session = load(mock_api(1)).await?;

        let result = session.select_address(AddressId::new(42)).await;

        assert!(matches!(
            result,
            Err(CheckoutError::Reconcile(ReconcileError::Validation(
                ValidationError::UnknownAddress(_)
            )))
        ));

        Ok(())
    }

    #[tokio::test]
    async fn applied_coupon_keeps_held_shipping_fee() -> TestResult {
        let mut api = mock_api(1);

        api.expect_apply_coupon()
            .once()
            .withf(|code| code.to_string() == "SUMMER10")
            .return_once(|_code| {
                Ok(CheckoutInfo {
                    applied_coupon: Some("SUMMER10".to_string()),
                    discount_amount: vnd(15_000),
                    ..checkout_info()
                })
            });

        let session = load(api).await?;

        let applied = session.apply_coupon("  SUMMER10 ").await?;
        let snapshot = session.snapshot().await?;

        assert_eq!(applied.discount, vnd(15_000));
        assert_eq!(snapshot.fees.shipping_fee, vnd(25_000));
        assert_eq!(snapshot.total, vnd(165_000));
        assert_eq!(snapshot.applied_coupon.as_deref(), Some("SUMMER10"));

        Ok(())
    }

    #[tokio::test]
    async fn rejected_coupon_keeps_previous_state() -> TestResult {
        let mut api = mock_api(1);

        api.expect_apply_coupon().once().return_once(|_code| {
            Err(ApiError::Rejected {
                status: 400,
                message: "Don hang chua dat gia tri toi thieu".to_string(),
            })
        });

        let session = load(api).await?;
        let before = session.snapshot().await?;

        let result = session.apply_coupon("BIGSPENDER").await;

        assert!(
            matches!(&result, Err(CheckoutError::CouponRejected { message }) if message == "Don hang chua dat gia tri toi thieu"),
            "unexpected result: {result:?}"
        );
        assert_eq!(session.snapshot().await?, before);

        Ok(())
    }

    #[tokio::test]
    async fn blank_coupon_code_makes_no_request() -> TestResult {
        let session = load(mock_api(1)).await?;

        let result = session.apply_coupon("   ").await;

        assert!(matches!(
            result,
            Err(CheckoutError::Reconcile(ReconcileError::Validation(
                ValidationError::EmptyCouponCode
            )))
        ));

        Ok(())
    }

    #[tokio::test]
    async fn removing_without_coupon_makes_no_request() -> TestResult {
        let session = load(mock_api(1)).await?;
        let before = session.snapshot().await?;

        assert!(!session.remove_coupon().await?);
        assert_eq!(session.snapshot().await?, before);

        Ok(())
    }

    #[tokio::test]
    async fn removing_coupon_restores_total() -> TestResult {
        let mut api = mock_api(2);

        api.expect_apply_coupon().once().return_once(|_code| {
            Ok(CheckoutInfo {
                applied_coupon: Some("SUMMER10".to_string()),
                discount_amount: vnd(15_000),
                ..checkout_info()
            })
        });

        let session = load(api).await?;

        session.apply_coupon("SUMMER10").await?;

        assert!(session.remove_coupon().await?);

        let snapshot = session.snapshot().await?;

        assert_eq!(snapshot.applied_coupon, None);
        assert_eq!(snapshot.total, vnd(180_000));

        Ok(())
    }

    #[tokio::test]
    async fn removing_coupon_ignores_coupon_still_on_record() -> TestResult {
        let mut api = MockCheckoutApi::new();
        let fetches = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fetches);

        api.expect_checkout_info().times(2).returning(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(checkout_info())
            } else {
                Ok(CheckoutInfo {
                    applied_coupon: Some("SUMMER10".to_string()),
                    discount_amount: vnd(15_000),
                    ..checkout_info()
                })
            }
        });

        api.expect_shipping_fee()
            .returning(|_address| Ok(vnd(25_000)));

        api.expect_apply_coupon().once().return_once(|_code| {
            Ok(CheckoutInfo {
                applied_coupon: Some("SUMMER10".to_string()),
                discount_amount: vnd(15_000),
                ..checkout_info()
            })
        });

        api.expect_create_order()
            .once()
            .withf(|request| request.coupon_code.is_none())
            .return_once(|_request| Ok(order(9)));

        let session = load(api).await?;

        session.apply_coupon("SUMMER10").await?;

        assert!(session.remove_coupon().await?);

        let snapshot = session.snapshot().await?;

        assert_eq!(snapshot.applied_coupon, None);
        assert_eq!(snapshot.fees.discount_amount, vnd(0));
        assert_eq!(snapshot.total, vnd(180_000));

        session.place_order(&draft(), Arc::new(AlwaysConfirm)).await?;

        Ok(())
    }

    #[tokio::test]
    async fn coupon_previews_explain_ineligible_coupons() -> TestResult {
        let session = load(mock_api(1)).await?;

        let previews = session.coupon_previews().await;

        assert_eq!(previews.len(), 2);
        assert!(previews.iter().any(|offer| {
            offer.coupon.code() == "SUMMER10" && offer.discount == Ok(vnd(15_000))
        }));
        assert!(previews.iter().any(|offer| {
            offer.coupon.code() == "BIGSPENDER"
                && matches!(offer.discount, Err(CouponError::BelowMinimumOrder { .. }))
        }));

        Ok(())
    }

    #[tokio::test]
    async fn cancelled_confirmation_leaves_session_ready() -> TestResult {
        let session = load(mock_api(1)).await?;

        let mut confirm = MockConfirm::new();
        confirm.expect_confirm().once().return_const(false);

        let result = session.place_order(&draft(), Arc::new(confirm)).await;

        assert!(matches!(result, Err(CheckoutError::Cancelled)));
        assert_eq!(session.snapshot().await?.phase, Phase::Ready);

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn order_cannot_change_while_customer_confirms() -> TestResult {
        let mut api = mock_api(1);

        api.expect_create_order()
            .once()
            .withf(|request| {
                request.address_id == AddressId::new(1)
                    && request.shipping_fee == vnd(25_000)
                    && request.coupon_code.is_none()
            })
            .return_once(|_request| Ok(order(88)));

        let session = load(api).await?;
        let during_prompt = session.clone();
        let blocked = Arc::new(AtomicUsize::new(0));
        let blocked_count = Arc::clone(&blocked);

        let mut confirm = MockConfirm::new();
        confirm
            .expect_confirm()
            .once()
            .returning(move |request, snapshot| {
                let handle = tokio::runtime::Handle::current();

                let selected = handle
                    .block_on(during_prompt.select_address(AddressId::new(2)))
                    .map(|_outcome| ());
                let coupon = handle
                    .block_on(during_prompt.apply_coupon("SUMMER10"))
                    .map(|_applied| ());

                for result in [selected, coupon] {
                    if matches!(
                        result,
                        Err(CheckoutError::Reconcile(ReconcileError::Busy(
                            Phase::Submitting
                        )))
                    ) {
                        blocked_count.fetch_add(1, Ordering::SeqCst);
                    }
                }

                request.address_id == AddressId::new(1) && snapshot.total == vnd(180_000)
            });

        let placed = session.place_order(&draft(), Arc::new(confirm)).await?;

        assert_eq!(placed.id, OrderId::new(88));
        assert_eq!(blocked.load(Ordering::SeqCst), 2);

        let snapshot = session.snapshot().await?;

        assert_eq!(snapshot.phase, Phase::Submitted);
        assert_eq!(snapshot.selected_address, Some(AddressId::new(1)));

        Ok(())
    }

    #[tokio::test]
    async fn invalid_draft_is_rejected_before_confirmation() -> TestResult {
        let session = load(mock_api(1)).await?;

        let mut confirm = MockConfirm::new();
        confirm.expect_confirm().never();

        let draft = OrderDraft {
            payment_method: Some(PaymentMethod::Wallet),
            notes: "a".repeat(501),
        };

        let result = session.place_order(&draft, Arc::new(confirm)).await;

        assert!(matches!(
            result,
            Err(CheckoutError::Reconcile(ReconcileError::Validation(
                ValidationError::NotesTooLong { length: 501, .. }
            )))
        ));

        Ok(())
    }

    #[tokio::test]
    async fn rejected_order_can_be_resubmitted() -> TestResult {
        let mut api = mock_api(1);
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);

        api.expect_create_order()
            .times(2)
            .withf(|request| {
                request.shipping_fee == vnd(25_000) && request.address_id == AddressId::new(1)
            })
            .returning(move |_request| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ApiError::Rejected {
                        status: 409,
                        message: "Nha hang tam dong cua".to_string(),
                    })
                } else {
                    Ok(order(77))
                }
            });

        let session = load(api).await?;
        let confirm: Arc<dyn Confirm> = Arc::new(AlwaysConfirm);

        let first = session.place_order(&draft(), Arc::clone(&confirm)).await;

        assert!(
            matches!(&first, Err(CheckoutError::OrderCreation { message }) if message == "Nha hang tam dong cua"),
            "unexpected result: {first:?}"
        );
        assert_eq!(session.snapshot().await?.phase, Phase::Ready);

        let placed = session.place_order(&draft(), confirm).await?;

        assert_eq!(placed.id, OrderId::new(77));
        assert_eq!(session.snapshot().await?.phase, Phase::Submitted);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);

        Ok(())
    }

    #[tokio::test]
    async fn submitted_session_rejects_further_changes() -> TestResult {
        let mut api = mock_api(1);

        api.expect_create_order()
            .once()
            .return_once(|_request| Ok(order(5)));

        let session = load(api).await?;

        session.place_order(&draft(), Arc::new(AlwaysConfirm)).await?;

        let result = session.select_address(AddressId::new(2)).await;

        assert!(matches!(
            result,
            Err(CheckoutError::Reconcile(ReconcileError::AlreadySubmitted))
        ));
        assert_eq!(
            session.with_state(|state| state.order_id()).await,
            Some(OrderId::new(5))
        );

        Ok(())
    }

    #[tokio::test]
    async fn unauthorized_order_is_not_an_order_rejection() -> TestResult {
        let mut api = mock_api(1);

        api.expect_create_order()
            .once()
            .return_once(|_request| Err(ApiError::Unauthorized));

        let session = load(api).await?;

        let result = session.place_order(&draft(), Arc::new(AlwaysConfirm)).await;

        assert!(matches!(
            result,
            Err(CheckoutError::Api(ApiError::Unauthorized))
        ));
        assert_eq!(session.snapshot().await?.phase, Phase::Ready);

        Ok(())
    }

    #[tokio::test]
    async fn removing_selected_address_selects_the_default() -> TestResult {
        let mut api = MockCheckoutApi::new();

        api.expect_checkout_info()
            .once()
            .returning(|| Ok(checkout_info()));

        api.expect_shipping_fee()
            .withf(|address| *address == AddressId::new(1))
            .once()
            .returning(|_address| Ok(vnd(25_000)));

        api.expect_shipping_fee()
            .withf(|address| *address == AddressId::new(2))
            .once()
            .returning(|_address| Ok(vnd(32_000)));

        api.expect_delete_address()
            .withf(|address| *address == AddressId::new(1))
            .once()
            .returning(|_address| Ok(()));

        api.expect_addresses()
            .once()
            .returning(|| Ok(vec![fixtures::address(2, true), fixtures::address(3, false)]));

        let session = load(api).await?;

        let outcome = session.remove_address(AddressId::new(1)).await?;
        let snapshot = session.snapshot().await?;

        assert_eq!(outcome, Some(ShippingOutcome::Resolved(vnd(32_000))));
        assert_eq!(snapshot.selected_address, Some(AddressId::new(2)));
        assert_eq!(snapshot.total, vnd(187_000));

        Ok(())
    }

    #[tokio::test]
    async fn removing_last_address_clears_shipping() -> TestResult {
        let mut api = mock_api(1);

        api.expect_delete_address()
            .once()
            .returning(|_address| Ok(()));

        api.expect_addresses().once().returning(|| Ok(Vec::new()));

        let session = load(api).await?;

        let outcome = session.remove_address(AddressId::new(1)).await?;
        let snapshot = session.snapshot().await?;

        assert_eq!(outcome, None);
        assert_eq!(snapshot.selected_address, None);
        assert_eq!(snapshot.fees.shipping_fee, vnd(0));
        assert_eq!(snapshot.total, vnd(155_000));

        Ok(())
    }

    #[tokio::test]
    async fn adding_address_keeps_current_selection() -> TestResult {
        let mut api = mock_api(1);

        api.expect_create_address()
            .once()
            .withf(|address| address.recipient_name == "Lan")
            .returning(|_address| Ok(fixtures::address(4, false)));

        api.expect_addresses().once().returning(|| {
            let mut addresses = checkout_info().addresses;
            addresses.push(fixtures::address(4, false));

            Ok(addresses)
        });

        let session = load(api).await?;

        let outcome = session
            .add_address(NewAddress {
                recipient_name: "Lan".to_string(),
                phone: "0912345678".to_string(),
                address_line: "4 Trang Tien".to_string(),
                is_default: false,
            })
            .await?;

        assert_eq!(outcome, None);
        assert_eq!(
            session.with_state(|state| state.addresses().len()).await,
            4
        );
        assert_eq!(
            session.snapshot().await?.selected_address,
            Some(AddressId::new(1))
        );

        Ok(())
    }
}
