//! Placed orders.

use chrono::{DateTime, Utc};
use serde::Serialize;

use emarket_core::{Money, OrderId, OrderStatus, UserId};

use super::cart::CartItem;

/// Snapshot of a cart at checkout. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub products_ordered: Vec<CartItem>,
    pub total_price: Money,
    pub status: OrderStatus,
    pub ordered_on: DateTime<Utc>,
}
