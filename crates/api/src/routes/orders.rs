//! Checkout and order history routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::Order;
use crate::services::cart::CartService;
use crate::state::AppState;

/// Create the order routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout))
        .route("/my-orders", get(my_orders))
        .route("/all-orders", get(all_orders))
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub message: &'static str,
    pub order: Order,
}

/// POST /orders/checkout
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<(StatusCode, Json<CheckoutResponse>)> {
    let order = CartService::new(state.pool()).checkout(user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            message: "Order successfully placed",
            order,
        }),
    ))
}

/// GET /orders/my-orders
///
/// An empty history is reported as 404 rather than an empty list.
pub async fn my_orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    if orders.is_empty() {
        return Err(AppError::NotFound(
            "No orders found for this user.".to_string(),
        ));
    }
    Ok(Json(orders))
}

/// GET /orders/all-orders
pub async fn all_orders(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool()).list_all().await?;

    if orders.is_empty() {
        return Err(AppError::NotFound("No orders found.".to_string()));
    }
    Ok(Json(orders))
}
