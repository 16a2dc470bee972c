//! `/api/products`
//!
//! A `sku` or `barcode` collision is rejected with the product already
//! holding the value in `details`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use bodega_core::validation::{
    require, require_name, update_text, validate_margin, validate_optional_amount,
};
use bodega_core::{Money, NewProduct, Product, MAX_TEXT_LEN};
use serde::Deserialize;
use tracing::info;

use super::{ensure_reference, Deleted};
use crate::error::{ApiError, ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list).post(create))
        .route("/products/:id", get(get_one).put(update).delete(delete))
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductInput {
    pub sku: Option<String>,
    pub description: Option<String>,
    pub barcode: Option<String>,
    pub delivery_unit: Option<String>,
    pub unit_sale_price: Option<Money>,
    pub contribution_margin: Option<f64>,
    pub category_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub category_id: Option<i64>,
}

async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ProductFilter>,
) -> ApiResult<Json<Vec<Product>>> {
    let repo = state.db.products();
    let products = match filter.category_id {
        Some(category_id) => repo.list_by_category(category_id).await?,
        None => repo.list().await?,
    };
    Ok(Json(products))
}

async fn get_one(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Product>> {
    state
        .db
        .products()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product", id))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ProductInput>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let new = NewProduct {
        sku: require_name("sku", input.sku.as_deref())?,
        description: require_name("description", input.description.as_deref())?,
        barcode: require_name("barcode", input.barcode.as_deref())?,
        delivery_unit: require_name("delivery_unit", input.delivery_unit.as_deref())?,
        unit_sale_price: input.unit_sale_price,
        contribution_margin: input.contribution_margin,
        category_id: require("category_id", input.category_id)?,
    };
    validate_optional_amount("unit_sale_price", new.unit_sale_price)?;
    validate_margin(new.contribution_margin)?;

    ensure_reference(
        state.db.categories().exists(new.category_id).await?,
        "category_id",
        new.category_id,
    )?;
    check_unique(&state, &new.sku, &new.barcode, None).await?;

    let product = state.db.products().insert(&new).await?;
    info!(id = product.id, sku = %product.sku, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ProductInput>,
) -> ApiResult<Json<Product>> {
    let repo = state.db.products();
    let mut product = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    if let Some(sku) = update_text("sku", input.sku.as_deref(), MAX_TEXT_LEN)? {
        product.sku = sku;
    }
    if let Some(description) = update_text("description", input.description.as_deref(), MAX_TEXT_LEN)? {
        product.description = description;
    }
    if let Some(barcode) = update_text("barcode", input.barcode.as_deref(), MAX_TEXT_LEN)? {
        product.barcode = barcode;
    }
    if let Some(unit) = update_text("delivery_unit", input.delivery_unit.as_deref(), MAX_TEXT_LEN)? {
        product.delivery_unit = unit;
    }
    if input.unit_sale_price.is_some() {
        validate_optional_amount("unit_sale_price", input.unit_sale_price)?;
        product.unit_sale_price = input.unit_sale_price;
    }
    if input.contribution_margin.is_some() {
        validate_margin(input.contribution_margin)?;
        product.contribution_margin = input.contribution_margin;
    }
    if let Some(category_id) = input.category_id {
        ensure_reference(
            state.db.categories().exists(category_id).await?,
            "category_id",
            category_id,
        )?;
        product.category_id = category_id;
    }

    check_unique(&state, &product.sku, &product.barcode, Some(id)).await?;

    Ok(Json(repo.update(&product).await?))
}

async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Deleted>> {
    state.db.products().delete(id).await?;
    info!(id, "Product deleted");
    Ok(Deleted::new("Product", id))
}

async fn check_unique(
    state: &AppState,
    sku: &str,
    barcode: &str,
    exclude: Option<i64>,
) -> ApiResult<()> {
    let repo = state.db.products();
    ensure_free(repo.get_by_sku(sku).await?, "sku", sku, exclude)?;
    ensure_free(repo.get_by_barcode(barcode).await?, "barcode", barcode, exclude)
}

/// Rejects `value` when a product other than `exclude` already holds it.
fn ensure_free(
    holder: Option<Product>,
    field: &str,
    value: &str,
    exclude: Option<i64>,
) -> ApiResult<()> {
    match holder {
        Some(existing) if Some(existing.id) != exclude => Err(ApiError::Duplicate {
            field: field.to_string(),
            value: Some(value.to_string()),
            existing: serde_json::to_value(&existing).ok(),
        }),
        _ => Ok(()),
    }
}
