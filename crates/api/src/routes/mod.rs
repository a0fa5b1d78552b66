//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET   /health                               - Liveness
//! GET   /health/ready                         - Readiness (database)
//!
//! # Users
//! POST  /users/register                       - Create an unconfirmed account
//! GET   /users/confirm-email/{token}          - Confirm an email address
//! POST  /users/login                          - Exchange credentials for an access token
//! POST  /users/request-password-reset         - Mail a reset link
//! POST  /users/reset-password/{id}/{token}    - Set a new password with a reset token
//! GET   /users/details                        - Own profile (bearer)
//! PATCH /users/update-password                - Change own password (bearer)
//! PATCH /users/{id}/set-as-admin              - Promote a user (admin)
//!
//! # Products
//! POST  /products                             - Create (admin)
//! GET   /products                             - Active products
//! GET   /products/all                         - Every product (admin)
//! GET   /products/{productId}                 - One product
//! PATCH /products/{productId}/update          - Partial update (admin)
//! PATCH /products/{productId}/archive         - Hide from catalogue (admin)
//! PATCH /products/{productId}/activate        - Return to catalogue (admin)
//! POST  /products/search-by-name              - Case-insensitive name search
//! POST  /products/search-by-price             - Price range search
//!
//! # Carts (bearer)
//! GET   /carts/get-cart
//! POST  /carts/add-to-cart
//! PATCH /carts/update-cart-quantity
//! PATCH /carts/{productId}/remove-from-cart
//! PUT   /carts/clear-cart
//!
//! # Orders (bearer)
//! POST  /orders/checkout
//! GET   /orders/my-orders
//! GET   /orders/all-orders                    - Every order (admin)
//! ```

pub mod carts;
pub mod health;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts},
    routing::get,
};
use serde::Serialize;

use crate::error::AppError;
use crate::middleware::rate_limit::RateLimiterLayer;
use crate::state::AppState;

/// JSON body extractor whose rejections render as `{"message": ...}`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path extractor whose rejections render as `{"message": ...}`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Body of responses that only carry a message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    #[must_use]
    pub const fn new(message: &'static str) -> Self {
        Self { message }
    }
}

/// Create all routes for the API.
///
/// With a `limiter`, the credential endpoints under `/users` are wrapped in
/// it.
pub fn routes(limiter: Option<RateLimiterLayer>) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/users", users::routes(limiter))
        .nest("/products", products::routes())
        .nest("/carts", carts::routes())
        .nest("/orders", orders::routes())
}
