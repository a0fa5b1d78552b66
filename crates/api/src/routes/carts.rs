//! Cart routes. All require a bearer token; the cart is always the caller's.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, patch, post, put},
};
use serde::{Deserialize, Serialize};

use emarket_core::ProductId;

use super::{ApiJson, ApiPath};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Cart;
use crate::services::cart::CartService;
use crate::state::AppState;

/// Create the cart routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/get-cart", get(get_cart))
        .route("/add-to-cart", post(add_to_cart))
        .route("/update-cart-quantity", patch(update_cart_quantity))
        .route("/{product_id}/remove-from-cart", patch(remove_from_cart))
        .route("/clear-cart", put(clear_cart))
}

/// Every cart endpoint answers with a message and the resulting cart.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub message: &'static str,
    pub cart: Cart,
}

impl CartResponse {
    fn new(message: &'static str, cart: Cart) -> Json<Self> {
        Json(Self { message, cart })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: Option<ProductId>,
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityRequest {
    pub product_id: Option<ProductId>,
    pub new_quantity: Option<i64>,
}

/// GET /carts/get-cart
pub async fn get_cart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartResponse>> {
    let cart = CartService::new(state.pool()).get_cart(user.id).await?;
    Ok(CartResponse::new("Cart retrieved successfully", cart))
}

/// POST /carts/add-to-cart
pub async fn add_to_cart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(req): ApiJson<AddToCartRequest>,
) -> Result<Json<CartResponse>> {
    let (product_id, quantity) = required(req.product_id, req.quantity)?;
    let cart = CartService::new(state.pool())
        .add_to_cart(user.id, product_id, quantity)
        .await?;

    Ok(CartResponse::new("Item added to cart successfully", cart))
}

/// PATCH /carts/update-cart-quantity
pub async fn update_cart_quantity(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(req): ApiJson<UpdateQuantityRequest>,
) -> Result<Json<CartResponse>> {
    let (product_id, quantity) = required(req.product_id, req.new_quantity)?;
    let cart = CartService::new(state.pool())
        .update_quantity(user.id, product_id, quantity)
        .await?;

    Ok(CartResponse::new("Cart quantity updated successfully", cart))
}

/// PATCH /carts/{product_id}/remove-from-cart
pub async fn remove_from_cart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<Json<CartResponse>> {
    let cart = CartService::new(state.pool())
        .remove_from_cart(user.id, product_id)
        .await?;

    Ok(CartResponse::new("Item removed from cart successfully", cart))
}

/// PUT /carts/clear-cart
pub async fn clear_cart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartResponse>> {
    let cart = CartService::new(state.pool()).clear_cart(user.id).await?;
    Ok(CartResponse::new("Cart cleared successfully", cart))
}

fn required(product_id: Option<ProductId>, quantity: Option<i64>) -> Result<(ProductId, i64)> {
    match (product_id, quantity) {
        (Some(product_id), Some(quantity)) => Ok((product_id, quantity)),
        _ => Err(AppError::BadRequest(
            "Product ID and quantity are required".to_string(),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_add_request_accepts_missing_fields() {
        let req: AddToCartRequest = serde_json::from_str("{}").unwrap();
        assert!(required(req.product_id, req.quantity).is_err());
    }

    #[test]
    fn test_update_request_field_names() {
        let req: UpdateQuantityRequest =
            serde_json::from_str(r#"{"productId": 4, "newQuantity": 3}"#).unwrap();
        let (product_id, quantity) = required(req.product_id, req.new_quantity).unwrap();
        assert_eq!(product_id, ProductId::new(4));
        assert_eq!(quantity, 3);
    }
}
