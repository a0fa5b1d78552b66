//! Shopping cart and its line items.
//!
//! A [`Cart`] keeps its `total_price` equal to the sum of its line subtotals:
//! every mutation builds the new item list, recomputes the total, and only
//! then commits both.

use serde::{Deserialize, Serialize};

use emarket_core::{CartId, Money, ProductId, UserId};

use crate::services::cart::CartError;

/// One product line in a cart or order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price times quantity at the time the line was last changed.
    pub subtotal: Money,
}

impl CartItem {
    fn priced(product_id: ProductId, unit_price: Money, quantity: u32) -> Result<Self, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        let subtotal = unit_price
            .checked_mul(quantity)
            .ok_or(CartError::Overflow)?;
        Ok(Self {
            product_id,
            quantity,
            subtotal,
        })
    }
}

/// A user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    id: CartId,
    user_id: UserId,
    cart_items: Vec<CartItem>,
    total_price: Money,
}

impl Cart {
    /// Build a cart from stored line items, recomputing the total.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Overflow` if the subtotals cannot be summed.
    pub fn new(id: CartId, user_id: UserId, items: Vec<CartItem>) -> Result<Self, CartError> {
        let total_price = total_of(&items)?;
        Ok(Self {
            id,
            user_id,
            cart_items: items,
            total_price,
        })
    }

    #[must_use]
    pub const fn id(&self) -> CartId {
        self.id
    }

    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.cart_items
    }

    #[must_use]
    pub const fn total_price(&self) -> Money {
        self.total_price
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart_items.is_empty()
    }

    /// Add `quantity` of a product, merging with an existing line.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity` for zero, `Overflow` if the amounts do not fit.
    pub fn add_item(
        &mut self,
        product_id: ProductId,
        unit_price: Money,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let mut items = self.cart_items.clone();
        match items.iter_mut().find(|item| item.product_id == product_id) {
            Some(item) => {
                let merged = item
                    .quantity
                    .checked_add(quantity)
                    .ok_or(CartError::Overflow)?;
                *item = CartItem::priced(product_id, unit_price, merged)?;
            }
            None => items.push(CartItem::priced(product_id, unit_price, quantity)?),
        }

        self.commit(items)
    }

    /// Set the quantity of an existing line, repricing it.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity` for zero, `ItemNotFound` if the product is not in
    /// the cart, `Overflow` if the amounts do not fit.
    pub fn update_quantity(
        &mut self,
        product_id: ProductId,
        unit_price: Money,
        quantity: u32,
    ) -> Result<(), CartError> {
        let repriced = CartItem::priced(product_id, unit_price, quantity)?;

        let mut items = self.cart_items.clone();
        let item = items
            .iter_mut()
            .find(|item| item.product_id == product_id)
            .ok_or(CartError::ItemNotFound)?;
        *item = repriced;

        self.commit(items)
    }

    /// Whether the cart has a line for `product_id`.
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.cart_items
            .iter()
            .any(|item| item.product_id == product_id)
    }

    /// Remove a product's line.
    ///
    /// # Errors
    ///
    /// `ItemNotFound` if the product is not in the cart.
    pub fn remove_item(&mut self, product_id: ProductId) -> Result<(), CartError> {
        if !self.contains(product_id) {
            return Err(CartError::ItemNotFound);
        }
        let items = self
            .cart_items
            .iter()
            .filter(|item| item.product_id != product_id)
            .cloned()
            .collect();
        self.commit(items)
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.cart_items.clear();
        self.total_price = Money::ZERO;
    }

    /// Empty the cart, returning the items and total it held.
    pub fn take_items(&mut self) -> (Vec<CartItem>, Money) {
        let total = self.total_price;
        self.total_price = Money::ZERO;
        (std::mem::take(&mut self.cart_items), total)
    }

    fn commit(&mut self, items: Vec<CartItem>) -> Result<(), CartError> {
        self.total_price = total_of(&items)?;
        self.cart_items = items;
        Ok(())
    }
}

fn total_of(items: &[CartItem]) -> Result<Money, CartError> {
    items.iter().try_fold(Money::ZERO, |total, item| {
        total.checked_add(item.subtotal).ok_or(CartError::Overflow)
    })
}
