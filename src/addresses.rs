//! Delivery Addresses

use crate::ids::AddressId;

/// A saved delivery address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Address {
    /// Address id
    pub id: AddressId,

    /// Name of the person receiving the order
    pub recipient: String,

    /// Contact phone number
    pub phone: String,

    /// Street address, one line
    pub line: String,

    /// Whether the customer marked this address as their default
    pub is_default: bool,
}

/// Pick the address a checkout should start with.
///
/// Preference order: the id the backend flagged as default, then the first
/// address marked `is_default`, then the first address.
pub fn default_address(addresses: &[Address], flagged: Option<AddressId>) -> Option<&Address> {
    flagged
        .and_then(|id| addresses.iter().find(|address| address.id == id))
        .or_else(|| addresses.iter().find(|address| address.is_default))
        .or_else(|| addresses.first())
}
