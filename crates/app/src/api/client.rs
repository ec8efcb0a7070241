//! HTTP gateway to the food-delivery backend.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{Span, info, warn};

use tiffin::{
    addresses::Address,
    checkout::CheckoutInfo,
    ids::AddressId,
    orders::OrderRequest,
    pricing::Vnd,
};

use crate::{
    api::{
        ApiError, CheckoutApi, NewAddress, Order,
        wire::{
            AddressDto, ApplyCouponDto, CheckoutInfoDto, LoginDto, LoginResponseDto, OrderDto,
            OrderRequestDto, ShippingFeeDto, decode,
        },
    },
    session::Session,
};

/// [`CheckoutApi`] over HTTP, authenticated with the shared [`Session`].
///
/// A 401 or 403 from any endpoint clears the session.
#[derive(Debug, Clone)]
pub struct HttpCheckoutApi {
    session: Arc<RwLock<Session>>,
    http: Client,
}

impl HttpCheckoutApi {
    /// Create a gateway with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(session: Arc<RwLock<Session>>, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self { session, http })
    }

    /// Exchange credentials for a token and store it in the session.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend rejects the credentials or the
    /// response cannot be understood.
    #[tracing::instrument(
        name = "api.client.login",
        skip(self, password),
        fields(role = tracing::field::Empty),
        err
    )]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let url = self.session.read().await.url("/api/auth/login");

        let response = self
            .http
            .post(url)
            .json(&LoginDto { email, password })
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        let login: LoginResponseDto = decode(status, &body)?.ok_or(ApiError::MissingData)?;

        Span::current().record("role", tracing::field::debug(login.role));

        let mut session = self.session.write().await;
        let base_url = session.base_url().to_string();

        *session = Session::authenticated(base_url, login.token, login.role);

        info!("signed in");

        Ok(session.clone())
    }

    /// Forget the session token.
    pub async fn logout(&self) {
        self.session.write().await.clear();
    }

    async fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let session = self.session.read().await;
        let token = session.token().ok_or(ApiError::Unauthorized)?;

        Ok(self.http.request(method, session.url(path)).bearer_auth(token))
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, ApiError> {
        let response = request.send().await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        match decode(status, &body) {
            Err(ApiError::Unauthorized) => {
                warn!(status, "backend refused the session token, signing out");

                self.session.write().await.clear();

                Err(ApiError::Unauthorized)
            }
            other => other,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        self.execute(request).await?.ok_or(ApiError::MissingData)
    }
}

#[async_trait]
impl CheckoutApi for HttpCheckoutApi {
    #[tracing::instrument(name = "api.client.checkout_info", skip(self), err)]
    async fn checkout_info(&self) -> Result<CheckoutInfo, ApiError> {
        let request = self.authorized(Method::GET, "/api/checkout/info").await?;
        let dto: CheckoutInfoDto = self.fetch(request).await?;

        CheckoutInfo::try_from(dto)
    }

    #[tracing::instrument(name = "api.client.apply_coupon", skip(self), err)]
    async fn apply_coupon(&self, code: &str) -> Result<CheckoutInfo, ApiError> {
        let request = self
            .authorized(Method::POST, "/api/checkout/apply-coupon")
            .await?
            .json(&ApplyCouponDto { coupon_code: code });

        let dto: CheckoutInfoDto = self.fetch(request).await?;

        CheckoutInfo::try_from(dto)
    }

    #[tracing::instrument(name = "api.client.shipping_fee", skip(self), fields(address_id = %address), err)]
    async fn shipping_fee(&self, address: AddressId) -> Result<Vnd, ApiError> {
        let request = self
            .authorized(Method::GET, "/api/shipping/fee")
            .await?
            .query(&[("addressId", address.get())]);

        let dto: ShippingFeeDto = self.fetch(request).await?;

        Vnd::try_from(dto)
    }

    #[tracing::instrument(name = "api.client.addresses", skip(self), err)]
    async fn addresses(&self) -> Result<Vec<Address>, ApiError> {
        let request = self.authorized(Method::GET, "/api/addresses").await?;
        let dtos: Vec<AddressDto> = self.execute(request).await?.unwrap_or_default();

        Ok(dtos.into_iter().map(Address::from).collect())
    }

    #[tracing::instrument(name = "api.client.create_address", skip(self, address), err)]
    async fn create_address(&self, address: NewAddress) -> Result<Address, ApiError> {
        let request = self
            .authorized(Method::POST, "/api/addresses")
            .await?
            .json(&address);

        let dto: AddressDto = self.fetch(request).await?;

        Ok(Address::from(dto))
    }

    #[tracing::instrument(name = "api.client.update_address", skip(self, address), fields(address_id = %id), err)]
    async fn update_address(
        &self,
        id: AddressId,
        address: NewAddress,
    ) -> Result<Address, ApiError> {
        let request = self
            .authorized(Method::PUT, &format!("/api/addresses/{id}"))
            .await?
            .json(&address);

        let dto: AddressDto = self.fetch(request).await?;

        Ok(Address::from(dto))
    }

    #[tracing::instrument(name = "api.client.delete_address", skip(self), fields(address_id = %id), err)]
    async fn delete_address(&self, id: AddressId) -> Result<(), ApiError> {
        let request = self
            .authorized(Method::DELETE, &format!("/api/addresses/{id}"))
            .await?;

        self.execute::<serde_json::Value>(request).await?;

        Ok(())
    }

    #[tracing::instrument(name = "api.client.set_default_address", skip(self), fields(address_id = %id), err)]
    async fn set_default_address(&self, id: AddressId) -> Result<Vec<Address>, ApiError> {
        let request = self
            .authorized(Method::PUT, &format!("/api/addresses/{id}/default"))
            .await?;

        let dtos: Vec<AddressDto> = self.execute(request).await?.unwrap_or_default();

        Ok(dtos.into_iter().map(Address::from).collect())
    }

    #[tracing::instrument(
        name = "api.client.create_order",
        skip(self, order),
        fields(order_id = tracing::field::Empty),
        err
    )]
    async fn create_order(&self, order: &OrderRequest) -> Result<Order, ApiError> {
        let request = self
            .authorized(Method::POST, "/api/orders")
            .await?
            .json(&OrderRequestDto::from(order));

        let dto: OrderDto = self.fetch(request).await?;
        let order = Order::from(dto);

        Span::current().record("order_id", tracing::field::display(order.id));

        Ok(order)
    }
}
