//! Domain models.
//!
//! These types represent validated domain objects separate from database row
//! types. Each serializes to the camelCase JSON shape returned by the API.

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use cart::{Cart, CartItem};
pub use order::Order;
pub use product::Product;
pub use user::User;
