//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Accounts: registration, confirmation, login, password reset
//! - `cart` - Cart mutations and checkout
//! - `email` - Confirmation and password reset mail
//! - `tokens` - Signed access and reset tokens

pub mod auth;
pub mod cart;
pub mod email;
pub mod tokens;
