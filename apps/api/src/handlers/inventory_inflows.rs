//! `/api/inventory-inflows`
//!
//! Standalone inflows against an existing purchase invoice. The invoice's
//! amounts are stated by the supplier, so inflow writes never touch them.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use bodega_core::validation::{require, validate_quantity, validate_unit_cost};
use bodega_core::{InflowLine, InventoryInflow, Money, ValidationError};
use serde::Deserialize;
use tracing::info;

use super::{ensure_reference, Deleted};
use crate::auth::ActingUser;
use crate::error::{ApiError, ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/inventory-inflows", get(list).post(create))
        .route(
            "/inventory-inflows/:id",
            get(get_one).put(update).delete(delete),
        )
}

/// One inflow row as submitted, standalone or nested in an invoice.
#[derive(Debug, Default, Deserialize)]
pub struct InflowLineInput {
    pub user_id: Option<i64>,
    pub product_id: Option<i64>,
    pub quantity: Option<f64>,
    pub unit_cost: Option<Money>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InflowInput {
    pub purchase_invoice_id: Option<i64>,
    #[serde(flatten)]
    pub line: InflowLineInput,
}

#[derive(Debug, Default, Deserialize)]
pub struct InflowFilter {
    pub purchase_invoice_id: Option<i64>,
    pub product_id: Option<i64>,
}

/// Validates a submitted line. `user_id` falls back to the acting user.
pub(crate) async fn resolve_line(
    state: &AppState,
    acting: ActingUser,
    input: &InflowLineInput,
) -> ApiResult<InflowLine> {
    let user_id = input
        .user_id
        .or(acting.0)
        .ok_or_else(|| ValidationError::required("user_id"))?;
    let product_id = require("product_id", input.product_id)?;
    let quantity = require("quantity", input.quantity)?;
    let unit_cost = require("unit_cost", input.unit_cost)?;
    validate_quantity(quantity)?;
    validate_unit_cost(unit_cost)?;

    ensure_reference(state.db.users().exists(user_id).await?, "user_id", user_id)?;
    ensure_reference(
        state.db.products().exists(product_id).await?,
        "product_id",
        product_id,
    )?;

    let line = InflowLine {
        user_id,
        product_id,
        quantity,
        unit_cost,
    };
    line.total_cost()?;
    Ok(line)
}

async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<InflowFilter>,
) -> ApiResult<Json<Vec<InventoryInflow>>> {
    let repo = state.db.inflows();
    let inflows = match (filter.purchase_invoice_id, filter.product_id) {
        (Some(invoice_id), None) => repo.list_by_invoice(invoice_id).await?,
        (None, Some(product_id)) => repo.list_by_product(product_id).await?,
        (Some(invoice_id), Some(product_id)) => repo
            .list_by_invoice(invoice_id)
            .await?
            .into_iter()
            .filter(|inflow| inflow.product_id == product_id)
            .collect(),
        (None, None) => repo.list().await?,
    };
    Ok(Json(inflows))
}

async fn get_one(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<InventoryInflow>> {
    state
        .db
        .inflows()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("InventoryInflow", id))
}

async fn create(
    State(state): State<AppState>,
    acting: ActingUser,
    ApiJson(input): ApiJson<InflowInput>,
) -> ApiResult<(StatusCode, Json<InventoryInflow>)> {
    let invoice_id = require("purchase_invoice_id", input.purchase_invoice_id)?;
    let line = resolve_line(&state, acting, &input.line).await?;
    ensure_reference(
        state.db.purchase_invoices().exists(invoice_id).await?,
        "purchase_invoice_id",
        invoice_id,
    )?;

    let inflow = state.db.inflows().insert(invoice_id, &line).await?;
    info!(
        id = inflow.id,
        purchase_invoice_id = invoice_id,
        total_cost = %inflow.total_cost,
        "Inflow recorded"
    );
    Ok((StatusCode::CREATED, Json(inflow)))
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<InflowInput>,
) -> ApiResult<Json<InventoryInflow>> {
    let repo = state.db.inflows();
    let mut inflow = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("InventoryInflow", id))?;

    if let Some(quantity) = input.line.quantity {
        validate_quantity(quantity)?;
        inflow.quantity = quantity;
    }
    if let Some(unit_cost) = input.line.unit_cost {
        validate_unit_cost(unit_cost)?;
        inflow.unit_cost = unit_cost;
    }
    if let Some(user_id) = input.line.user_id {
        ensure_reference(state.db.users().exists(user_id).await?, "user_id", user_id)?;
        inflow.user_id = user_id;
    }
    if let Some(product_id) = input.line.product_id {
        ensure_reference(
            state.db.products().exists(product_id).await?,
            "product_id",
            product_id,
        )?;
        inflow.product_id = product_id;
    }
    if let Some(invoice_id) = input.purchase_invoice_id {
        ensure_reference(
            state.db.purchase_invoices().exists(invoice_id).await?,
            "purchase_invoice_id",
            invoice_id,
        )?;
        inflow.purchase_invoice_id = invoice_id;
    }

    Ok(Json(repo.update(&inflow).await?))
}

async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Deleted>> {
    state.db.inflows().delete(id).await?;
    info!(id, "Inflow deleted");
    Ok(Deleted::new("InventoryInflow", id))
}
