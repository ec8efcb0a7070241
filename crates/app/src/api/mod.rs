//! Backend gateway
//!
//! The checkout screen talks to five collaborators: checkout info, coupons,
//! shipping rates, the address book and orders. They are all reached through
//! [`CheckoutApi`] so the session can be driven by a mock in tests.

use async_trait::async_trait;
use mockall::automock;

use tiffin::{
    addresses::Address,
    checkout::CheckoutInfo,
    ids::AddressId,
    orders::OrderRequest,
    pricing::Vnd,
};

mod client;
mod errors;
mod models;
pub(crate) mod wire;

pub use client::HttpCheckoutApi;
pub use errors::ApiError;
pub use models::{NewAddress, Order};

#[automock]
#[async_trait]
pub trait CheckoutApi: Send + Sync {
    /// Fetch the customer's cart, addresses, fees and coupons.
    async fn checkout_info(&self) -> Result<CheckoutInfo, ApiError>;

    /// Ask the coupon service to apply `code`. Returns checkout info with the
    /// discount recomputed by the backend.
    async fn apply_coupon(&self, code: &str) -> Result<CheckoutInfo, ApiError>;

    /// Price delivery to an address.
    async fn shipping_fee(&self, address: AddressId) -> Result<Vnd, ApiError>;

    /// List saved addresses.
    async fn addresses(&self) -> Result<Vec<Address>, ApiError>;

    /// Save a new address.
    async fn create_address(&self, address: NewAddress) -> Result<Address, ApiError>;

    /// Overwrite a saved address.
    async fn update_address(
        &self,
        id: AddressId,
        address: NewAddress,
    ) -> Result<Address, ApiError>;

    /// Delete a saved address.
    async fn delete_address(&self, id: AddressId) -> Result<(), ApiError>;

    /// Mark an address as the default. Returns the updated address list.
    async fn set_default_address(&self, id: AddressId) -> Result<Vec<Address>, ApiError>;

    /// Create the order.
    async fn create_order(&self, order: &OrderRequest) -> Result<Order, ApiError>;
}
