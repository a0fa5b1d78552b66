//! Catalogue product.

use chrono::{DateTime, Utc};
use serde::Serialize;

use emarket_core::{Money, ProductId};

/// A product that can be added to carts while active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    /// Archived products are hidden from the public catalogue and cannot be bought.
    pub is_active: bool,
    pub created_on: DateTime<Utc>,
}

/// Partial update of a product. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
}

impl ProductChanges {
    /// Whether the update would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.price.is_none()
    }
}
