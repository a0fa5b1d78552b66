//! E-Market Core - Shared domain types.
//!
//! This crate provides the types used by every E-Market component:
//! - `api` - The JSON HTTP service (accounts, catalogue, carts, orders)
//! - `cli` - Command-line tools for migrations and administrator bootstrap
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. Database encoding is available behind the `postgres`
//! feature so the types can be bound directly in `sqlx` queries.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, money and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
