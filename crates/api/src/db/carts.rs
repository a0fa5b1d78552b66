//! Cart repository for database operations.
//!
//! Mutations go through [`CartRepository::lock_or_create`] inside a
//! transaction: the cart row stays locked (`SELECT ... FOR UPDATE`) until the
//! transaction ends, which serializes concurrent changes to one user's cart.

use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use emarket_core::{CartId, Money, UserId};

use super::RepositoryError;
use crate::models::cart::{Cart, CartItem};

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    cart_items: Json<Vec<CartItem>>,
    total_price: Money,
}

impl TryFrom<CartRow> for Cart {
    type Error = RepositoryError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        let cart = Self::new(row.id, row.user_id, row.cart_items.0).map_err(|e| {
            RepositoryError::DataCorruption(format!("cart {} has invalid items: {e}", row.id))
        })?;

        if cart.total_price() != row.total_price {
            tracing::warn!(
                cart_id = %row.id,
                stored = %row.total_price,
                computed = %cart.total_price(),
                "Stored cart total disagrees with line items"
            );
        }

        Ok(cart)
    }
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's cart, creating an empty one on first access.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        insert_empty(&mut conn, user_id).await?;

        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, user_id, cart_items, total_price
            FROM carts
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

        row.try_into()
    }

    /// Lock the user's cart row, creating an empty cart if needed.
    ///
    /// Must be called inside a transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(conn))]
    pub async fn lock_or_create(
        conn: &mut PgConnection,
        user_id: UserId,
    ) -> Result<Cart, RepositoryError> {
        insert_empty(conn, user_id).await?;
        Self::lock(conn, user_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Lock the user's cart row if it exists.
    ///
    /// Must be called inside a transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(conn))]
    pub async fn lock(
        conn: &mut PgConnection,
        user_id: UserId,
    ) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, user_id, cart_items, total_price
            FROM carts
            WHERE user_id = $1
            FOR UPDATE
            ",
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        row.map(Cart::try_from).transpose()
    }

    /// Persist a cart's items and total.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart row is gone.
    #[instrument(skip(conn, cart), fields(cart_id = %cart.id()))]
    pub async fn save(conn: &mut PgConnection, cart: &Cart) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE carts
            SET cart_items = $2, total_price = $3, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(cart.id())
        .bind(Json(cart.items()))
        .bind(cart.total_price())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

async fn insert_empty(conn: &mut PgConnection, user_id: UserId) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO carts (user_id)
        VALUES ($1)
        ON CONFLICT (user_id) DO NOTHING
        ",
    )
    .bind(user_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
