//! Identifiers
//!
//! Backend entities are keyed by integer ids. Each kind gets its own newtype so
//! a dish id can never be passed where an address id is expected.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw backend id.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Return the raw backend id.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
                Display::fmt(&self.0, f)
            }
        }
    };
}

id_type!(
    /// Dish (menu item) id
    DishId
);

id_type!(
    /// Merchant (restaurant) id
    MerchantId
);

id_type!(
    /// Delivery address id
    AddressId
);

id_type!(
    /// Order id
    OrderId
);
