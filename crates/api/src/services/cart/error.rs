//! Cart and checkout error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during cart operations and checkout.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity missing, zero, negative, or out of range.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// Product does not exist or is archived.
    #[error("product not found")]
    ProductNotFound,

    /// Product is not in the cart.
    #[error("item not found in cart")]
    ItemNotFound,

    /// The user has never had a cart.
    #[error("no cart found")]
    CartNotFound,

    /// Checkout attempted with no items.
    #[error("no items to checkout")]
    EmptyCart,

    /// Amounts too large to represent.
    #[error("cart amounts out of range")]
    Overflow,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CartError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}
