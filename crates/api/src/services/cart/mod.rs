//! Cart service.
//!
//! Every mutation and checkout runs in one transaction holding the user's
//! cart row lock, so two requests for the same user never interleave.

mod error;

pub use error::CartError;

use sqlx::PgPool;
use tracing::instrument;

use emarket_core::{ProductId, UserId};

use crate::db::{CartRepository, OrderRepository, ProductRepository};
use crate::models::{Cart, Order, Product};

/// Cart and checkout operations for one request.
pub struct CartService<'a> {
    pool: &'a PgPool,
    carts: CartRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            carts: CartRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// Get the user's cart, creating an empty one on first access.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the database operation fails.
    pub async fn get_cart(&self, user_id: UserId) -> Result<Cart, CartError> {
        Ok(self.carts.get_or_create(user_id).await?)
    }

    /// Add an active product to the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for quantities below 1.
    /// Returns `CartError::ProductNotFound` if the product is missing or archived.
    #[instrument(skip(self))]
    pub async fn add_to_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Cart, CartError> {
        let quantity = parse_quantity(quantity)?;
        let product = self.active_product(product_id).await?;

        let mut tx = self.pool.begin().await?;
        let mut cart = CartRepository::lock_or_create(&mut tx, user_id).await?;
        cart.add_item(product.id, product.price, quantity)?;
        CartRepository::save(&mut tx, &cart).await?;
        tx.commit().await?;

        tracing::info!(cart_id = %cart.id(), product_id = %product_id, quantity, "Item added to cart");
        Ok(cart)
    }

    /// Change the quantity of a product already in the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for quantities below 1.
    /// Returns `CartError::ItemNotFound` if the product is not in the cart.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Cart, CartError> {
        let quantity = parse_quantity(quantity)?;

        let mut tx = self.pool.begin().await?;
        let mut cart = CartRepository::lock_or_create(&mut tx, user_id).await?;
        if !cart.contains(product_id) {
            return Err(CartError::ItemNotFound);
        }

        let product = self
            .products
            .get_by_id(product_id)
            .await?
            .ok_or(CartError::ProductNotFound)?;
        cart.update_quantity(product_id, product.price, quantity)?;
        CartRepository::save(&mut tx, &cart).await?;
        tx.commit().await?;

        Ok(cart)
    }

    /// Remove a product's line from the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the product is not in the cart.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Cart, CartError> {
        let mut tx = self.pool.begin().await?;
        let mut cart = CartRepository::lock_or_create(&mut tx, user_id).await?;
        cart.remove_item(product_id)?;
        CartRepository::save(&mut tx, &cart).await?;
        tx.commit().await?;

        Ok(cart)
    }

    /// Remove every item from the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the database operation fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self, user_id: UserId) -> Result<Cart, CartError> {
        let mut tx = self.pool.begin().await?;
        let mut cart = CartRepository::lock_or_create(&mut tx, user_id).await?;
        cart.clear();
        CartRepository::save(&mut tx, &cart).await?;
        tx.commit().await?;

        Ok(cart)
    }

    /// Turn the cart into a pending order and empty it, atomically.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` if the user has no cart.
    /// Returns `CartError::EmptyCart` if the cart has no items; no order is created.
    #[instrument(skip(self))]
    pub async fn checkout(&self, user_id: UserId) -> Result<Order, CartError> {
        let mut tx = self.pool.begin().await?;
        let mut cart = CartRepository::lock(&mut tx, user_id)
            .await?
            .ok_or(CartError::CartNotFound)?;
        if cart.is_empty() {
            return Err(CartError::EmptyCart);
        }

        let (items, total) = cart.take_items();
        let order = OrderRepository::create(&mut tx, user_id, &items, total).await?;
        CartRepository::save(&mut tx, &cart).await?;
        tx.commit().await?;

        tracing::info!(order_id = %order.id, user_id = %user_id, total = %total, "Order placed");
        Ok(order)
    }

    async fn active_product(&self, product_id: ProductId) -> Result<Product, CartError> {
        self.products
            .get_by_id(product_id)
            .await?
            .filter(|product| product.is_active)
            .ok_or(CartError::ProductNotFound)
    }
}

/// Validate a client-supplied quantity.
fn parse_quantity(quantity: i64) -> Result<u32, CartError> {
    u32::try_from(quantity)
        .ok()
        .filter(|q| *q >= 1)
        .ok_or(CartError::InvalidQuantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(1).ok(), Some(1));
        assert_eq!(parse_quantity(250).ok(), Some(250));
        assert!(matches!(parse_quantity(0), Err(CartError::InvalidQuantity)));
        assert!(matches!(parse_quantity(-3), Err(CartError::InvalidQuantity)));
        assert!(matches!(
            parse_quantity(i64::from(u32::MAX) + 1),
            Err(CartError::InvalidQuantity)
        ));
    }
}
