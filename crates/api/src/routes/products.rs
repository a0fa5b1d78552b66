//! Catalogue routes.
//!
//! Reads of active products are public. Creating, editing and archiving
//! products requires an admin token.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use emarket_core::{Money, MoneyError, ProductId};

use super::{ApiJson, ApiPath};
use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::Product;
use crate::models::product::ProductChanges;
use crate::state::AppState;

const PRODUCT_NOT_FOUND: &str = "Product not found";

/// Create the product routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_active).post(create))
        .route("/all", get(list_all))
        .route("/search-by-name", post(search_by_name))
        .route("/search-by-price", post(search_by_price))
        .route("/{product_id}", get(show))
        .route("/{product_id}/update", patch(update))
        .route("/{product_id}/archive", patch(archive))
        .route("/{product_id}/activate", patch(activate))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub price: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NameSearchRequest {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PriceSearchRequest {
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

/// POST /products
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(req): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let name = non_blank(&req.name, "Name is required")?;
    let description = non_blank(&req.description, "Description is required")?;
    let price = parse_price(req.price.ok_or_else(|| bad_request("Price is required"))?)?;

    let product = ProductRepository::new(state.pool())
        .create(name, description, price)
        .await?;

    tracing::info!(admin_id = %admin.id, product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /products
pub async fn list_active(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(ProductRepository::new(state.pool()).list_active().await?))
}

/// GET /products/all
pub async fn list_all(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(ProductRepository::new(state.pool()).list_all().await?))
}

/// GET /products/{product_id}
pub async fn show(
    State(state): State<AppState>,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get_by_id(product_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_string()))
}

/// PATCH /products/{product_id}/update
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiJson(req): ApiJson<UpdateProductRequest>,
) -> Result<Json<Product>> {
    let changes = ProductChanges {
        name: req
            .name
            .as_deref()
            .map(|name| non_blank(name, "Name cannot be blank").map(str::to_string))
            .transpose()?,
        description: req
            .description
            .as_deref()
            .map(|d| non_blank(d, "Description cannot be blank").map(str::to_string))
            .transpose()?,
        price: req.price.map(parse_price).transpose()?,
    };

    if changes.is_empty() {
        return Err(bad_request("Nothing to update"));
    }

    ProductRepository::new(state.pool())
        .update(product_id, &changes)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_string()))
}

/// PATCH /products/{product_id}/archive
pub async fn archive(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    set_active(&state, product_id, false).await
}

/// PATCH /products/{product_id}/activate
pub async fn activate(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    set_active(&state, product_id, true).await
}

async fn set_active(state: &AppState, product_id: ProductId, active: bool) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .set_active(product_id, active)
        .await?
        .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;

    tracing::info!(product_id = %product.id, is_active = active, "Product visibility changed");
    Ok(Json(product))
}

/// POST /products/search-by-name
pub async fn search_by_name(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<NameSearchRequest>,
) -> Result<Json<Vec<Product>>> {
    let name = non_blank(&req.name, "Name is required")?;
    Ok(Json(
        ProductRepository::new(state.pool())
            .search_by_name(name)
            .await?,
    ))
}

/// POST /products/search-by-price
pub async fn search_by_price(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PriceSearchRequest>,
) -> Result<Json<Vec<Product>>> {
    let (Some(min), Some(max)) = (req.min_price, req.max_price) else {
        return Err(bad_request("Both minPrice and maxPrice are required"));
    };
    let (min, max) = (parse_price(min)?, parse_price(max)?);
    if min > max {
        return Err(bad_request("minPrice must not exceed maxPrice"));
    }

    Ok(Json(
        ProductRepository::new(state.pool())
            .search_by_price(min, max)
            .await?,
    ))
}

fn bad_request(message: &str) -> AppError {
    AppError::BadRequest(message.to_string())
}

fn non_blank<'a>(value: &'a str, message: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(bad_request(message));
    }
    Ok(trimmed)
}

fn parse_price(amount: Decimal) -> Result<Money> {
    Money::new(amount).map_err(|err| match err {
        MoneyError::Negative => bad_request("Price must not be negative"),
        MoneyError::TooLarge => bad_request("Price is too large"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank_trims() {
        assert_eq!(non_blank("  Lamp ", "x").unwrap(), "Lamp");
        assert!(non_blank("   ", "x").is_err());
    }

    #[test]
    fn test_parse_price_rejects_negative() {
        assert!(parse_price(Decimal::new(-1, 2)).is_err());
        assert_eq!(
            parse_price(Decimal::new(1999, 2)).unwrap(),
            Money::from_cents(1999)
        );
    }

    #[test]
    fn test_parse_price_rejects_amounts_beyond_storage() {
        let err = parse_price(Decimal::new(10_000_000_000, 0)).unwrap_err();
        assert_eq!(err.message(), "Price is too large");
    }

    #[test]
    fn test_price_search_request_uses_camel_case() {
        let req: PriceSearchRequest =
            serde_json::from_str(r#"{"minPrice": 1.5, "maxPrice": 10}"#).unwrap();
        assert_eq!(req.min_price, Some(Decimal::new(15, 1)));
        assert_eq!(req.max_price, Some(Decimal::new(10, 0)));
    }
}
