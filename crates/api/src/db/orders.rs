//! Order repository for database operations.
//!
//! Orders are insert-only; nothing here updates or deletes them.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use emarket_core::{Money, OrderId, OrderStatus, UserId};

use super::RepositoryError;
use crate::models::cart::CartItem;
use crate::models::order::Order;

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    products_ordered: Json<Vec<CartItem>>,
    total_price: Money,
    status: OrderStatus,
    ordered_on: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            products_ordered: row.products_ordered.0,
            total_price: row.total_price,
            status: row.status,
            ordered_on: row.ordered_on,
        }
    }
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a pending order snapshot.
    ///
    /// Runs on the caller's connection so it can share the checkout transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(conn, items))]
    pub async fn create(
        conn: &mut PgConnection,
        user_id: UserId,
        items: &[CartItem],
        total_price: Money,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO orders (user_id, products_ordered, total_price, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, products_ordered, total_price, status, ordered_on
            ",
        )
        .bind(user_id)
        .bind(Json(items))
        .bind(total_price)
        .bind(OrderStatus::Pending)
        .fetch_one(&mut *conn)
        .await?;

        Ok(row.into())
    }

    /// Orders placed by one user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, products_ordered, total_price, status, ordered_on
            FROM orders
            WHERE user_id = $1
            ORDER BY ordered_on, id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Every order, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, products_ordered, total_price, status, ordered_on
            FROM orders
            ORDER BY ordered_on, id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
