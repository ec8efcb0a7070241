//! Cart Lines

use rustc_hash::FxHashSet;
use rusty_money::Money;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    ids::{DishId, MerchantId},
    pricing::{TotalPriceError, Vnd, items_total},
};

/// A single dish in the cart with its quantity.
#[derive(Clone, Debug, PartialEq)]
pub struct CartLine {
    dish_id: DishId,
    merchant_id: MerchantId,
    name: String,
    unit_price: Vnd,
    discount_price: Option<Vnd>,
    quantity: u32,
}

impl CartLine {
    /// Creates a new cart line at the dish's list price.
    #[must_use]
    pub fn new(dish_id: DishId, merchant_id: MerchantId, unit_price: Vnd, quantity: u32) -> Self {
        Self {
            dish_id,
            merchant_id,
            name: String::new(),
            unit_price,
            discount_price: None,
            quantity,
        }
    }

    /// Sets the display name of the dish.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the merchant's sale price for the dish.
    #[must_use]
    pub fn with_discount_price(mut self, discount_price: Option<Vnd>) -> Self {
        self.discount_price = discount_price;
        self
    }

    /// Returns the dish id
    pub fn dish_id(&self) -> DishId {
        self.dish_id
    }

    /// Returns the merchant id
    pub fn merchant_id(&self) -> MerchantId {
        self.merchant_id
    }

    /// Returns the dish name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the list price of one unit
    pub fn unit_price(&self) -> Vnd {
        self.unit_price
    }

    /// Returns the quantity
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// The price actually charged per unit.
    ///
    /// A sale price only counts when it undercuts the list price.
    pub fn effective_price(&self) -> Vnd {
        match self.discount_price {
            Some(price) if price.to_minor_units() < self.unit_price.to_minor_units() => price,
            _ => self.unit_price,
        }
    }

    /// Quantity multiplied by the effective unit price.
    ///
    /// # Errors
    ///
    /// Returns [`TotalPriceError::Overflow`] if the product does not fit in an `i64`.
    pub fn subtotal(&self) -> Result<Vnd, TotalPriceError> {
        let price = self.effective_price();

        let minor = price
            .to_minor_units()
            .checked_mul(i64::from(self.quantity))
            .ok_or(TotalPriceError::Overflow)?;

        Ok(Money::from_minor(minor, price.currency()))
    }
}

/// Reasons the checkout screen cannot be shown for a selection.
#[derive(Debug, Error, PartialEq)]
pub enum LoadError {
    /// None of the selected dishes are in the cart.
    #[error("none of the selected dishes are in the cart")]
    EmptySelection,

    /// The selected dishes come from more than one merchant.
    #[error("selected dishes span merchants {0} and {1}")]
    MultipleMerchants(MerchantId, MerchantId),

    /// The selected lines could not be totalled.
    #[error(transparent)]
    Pricing(#[from] TotalPriceError),
}

/// The subset of the cart being checked out, all from a single merchant.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckoutCart {
    merchant_id: MerchantId,
    lines: SmallVec<[CartLine; 8]>,
}

impl CheckoutCart {
    /// Keep only the lines whose dish was selected for checkout.
    ///
    /// # Errors
    ///
    /// - [`LoadError::EmptySelection`]: no line matched the selection.
    /// - [`LoadError::MultipleMerchants`]: matched lines belong to different merchants.
    pub fn select(
        lines: impl IntoIterator<Item = CartLine>,
        selected: &[DishId],
    ) -> Result<Self, LoadError> {
        let selected: FxHashSet<DishId> = selected.iter().copied().collect();

        let lines: SmallVec<[CartLine; 8]> = lines
            .into_iter()
            .filter(|line| selected.contains(&line.dish_id))
            .collect();

        let first = lines.first().ok_or(LoadError::EmptySelection)?;
        let merchant_id = first.merchant_id;

        if let Some(other) = lines.iter().find(|line| line.merchant_id != merchant_id) {
            return Err(LoadError::MultipleMerchants(merchant_id, other.merchant_id));
        }

        Ok(Self { merchant_id, lines })
    }

    /// Returns the merchant every line belongs to
    pub fn merchant_id(&self) -> MerchantId {
        self.merchant_id
    }

    /// Returns the selected lines
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Dish ids in cart order, as sent with the order request.
    pub fn dish_ids(&self) -> Vec<DishId> {
        self.lines.iter().map(CartLine::dish_id).collect()
    }

    /// Sum of line subtotals.
    ///
    /// # Errors
    ///
    /// Returns an error if a line subtotal overflows.
    pub fn items_total(&self) -> Result<Vnd, TotalPriceError> {
        items_total(&self.lines)
    }
}
