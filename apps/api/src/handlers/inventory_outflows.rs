//! `/api/inventory-outflows`
//!
//! Every outflow write re-derives the owning document's net, VAT and total
//! in the same transaction, using the configured VAT rate.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use bodega_core::validation::{
    require, validate_amount, validate_quantity, validate_unit_cost,
};
use bodega_core::{InventoryOutflow, Money, OutflowLine, ValidationError};
use serde::Deserialize;
use tracing::info;

use super::{ensure_reference, Deleted};
use crate::auth::ActingUser;
use crate::error::{ApiError, ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/inventory-outflows", get(list).post(create))
        .route(
            "/inventory-outflows/:id",
            get(get_one).put(update).delete(delete),
        )
}

/// One outflow row as submitted, standalone or nested in a document.
#[derive(Debug, Default, Deserialize)]
pub struct OutflowLineInput {
    pub user_id: Option<i64>,
    pub product_id: Option<i64>,
    pub quantity: Option<f64>,
    pub unit_cost: Option<Money>,
    pub unit_sale_price: Option<Money>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutflowInput {
    pub sales_document_id: Option<i64>,
    #[serde(flatten)]
    pub line: OutflowLineInput,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutflowFilter {
    pub sales_document_id: Option<i64>,
    pub product_id: Option<i64>,
}

/// Validates a submitted line.
///
/// `user_id` falls back to the acting user and `unit_sale_price` to the
/// product's configured price. A line with neither price is rejected.
pub(crate) async fn resolve_line(
    state: &AppState,
    acting: ActingUser,
    input: &OutflowLineInput,
) -> ApiResult<OutflowLine> {
    let user_id = input
        .user_id
        .or(acting.0)
        .ok_or_else(|| ValidationError::required("user_id"))?;
    let product_id = require("product_id", input.product_id)?;
    let quantity = require("quantity", input.quantity)?;
    let unit_cost = require("unit_cost", input.unit_cost)?;
    validate_quantity(quantity)?;
    validate_unit_cost(unit_cost)?;
    if let Some(price) = input.unit_sale_price {
        validate_amount("unit_sale_price", price)?;
    }

    ensure_reference(state.db.users().exists(user_id).await?, "user_id", user_id)?;
    ensure_reference(
        state.db.products().exists(product_id).await?,
        "product_id",
        product_id,
    )?;

    let unit_sale_price = match input.unit_sale_price {
        Some(price) => price,
        None => state
            .db
            .products()
            .unit_sale_price(product_id)
            .await?
            .ok_or_else(|| ValidationError::required("unit_sale_price"))?,
    };

    let line = OutflowLine {
        user_id,
        product_id,
        quantity,
        unit_cost,
        unit_sale_price: Some(unit_sale_price),
    };
    line.total_cost()?;
    line.total_sale_value()?;
    Ok(line)
}

async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<OutflowFilter>,
) -> ApiResult<Json<Vec<InventoryOutflow>>> {
    let repo = state.db.outflows();
    let outflows = match (filter.sales_document_id, filter.product_id) {
        (Some(document_id), None) => repo.list_by_document(document_id).await?,
        (None, Some(product_id)) => repo.list_by_product(product_id).await?,
        (Some(document_id), Some(product_id)) => repo
            .list_by_document(document_id)
            .await?
            .into_iter()
            .filter(|outflow| outflow.product_id == product_id)
            .collect(),
        (None, None) => repo.list().await?,
    };
    Ok(Json(outflows))
}

async fn get_one(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<InventoryOutflow>> {
    state
        .db
        .outflows()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("InventoryOutflow", id))
}

async fn create(
    State(state): State<AppState>,
    acting: ActingUser,
    ApiJson(input): ApiJson<OutflowInput>,
) -> ApiResult<(StatusCode, Json<InventoryOutflow>)> {
    let document_id = require("sales_document_id", input.sales_document_id)?;
    let line = resolve_line(&state, acting, &input.line).await?;
    ensure_reference(
        state.db.sales_documents().exists(document_id).await?,
        "sales_document_id",
        document_id,
    )?;

    let outflow = state
        .db
        .outflows()
        .insert(document_id, &line, state.vat_rate())
        .await?;
    info!(
        id = outflow.id,
        sales_document_id = document_id,
        total_cost = %outflow.total_cost,
        "Outflow recorded"
    );
    Ok((StatusCode::CREATED, Json(outflow)))
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<OutflowInput>,
) -> ApiResult<Json<InventoryOutflow>> {
    let repo = state.db.outflows();
    let mut outflow = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("InventoryOutflow", id))?;

    if let Some(quantity) = input.line.quantity {
        validate_quantity(quantity)?;
        outflow.quantity = quantity;
    }
    if let Some(unit_cost) = input.line.unit_cost {
        validate_unit_cost(unit_cost)?;
        outflow.unit_cost = unit_cost;
    }
    if let Some(price) = input.line.unit_sale_price {
        validate_amount("unit_sale_price", price)?;
        outflow.unit_sale_price = Some(price);
    }
    if let Some(user_id) = input.line.user_id {
        ensure_reference(state.db.users().exists(user_id).await?, "user_id", user_id)?;
        outflow.user_id = user_id;
    }
    if let Some(product_id) = input.line.product_id {
        ensure_reference(
            state.db.products().exists(product_id).await?,
            "product_id",
            product_id,
        )?;
        outflow.product_id = product_id;
    }
    if let Some(document_id) = input.sales_document_id {
        ensure_reference(
            state.db.sales_documents().exists(document_id).await?,
            "sales_document_id",
            document_id,
        )?;
        outflow.sales_document_id = document_id;
    }

    Ok(Json(repo.update(&outflow, state.vat_rate()).await?))
}

async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Deleted>> {
    state.db.outflows().delete(id, state.vat_rate()).await?;
    info!(id, "Outflow deleted");
    Ok(Deleted::new("InventoryOutflow", id))
}
