//! Gateway models

use jiff::Timestamp;
use serde::Serialize;

use tiffin::{ids::OrderId, pricing::Vnd};

/// Fields for creating or updating an address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    /// Name of the person receiving orders
    pub recipient_name: String,

    /// Contact phone number
    pub phone: String,

    /// Street address, one line
    pub address_line: String,

    /// Make this the default address
    pub is_default: bool,
}

/// An order created by the backend.
#[derive(Clone, Debug, PartialEq)]
pub struct Order {
    /// Order id
    pub id: OrderId,

    /// Backend order status, e.g. `PENDING`
    pub status: String,

    /// Total the backend charged, when reported
    pub total: Option<Vnd>,

    /// Creation time, when reported
    pub created_at: Option<Timestamp>,
}
