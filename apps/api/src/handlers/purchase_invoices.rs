//! `/api/purchase-invoices`
//!
//! An invoice is created together with its inflows in one transaction.
//! On update, an `inflows` array replaces the whole set; leaving it out
//! keeps the stored inflows.
//!
//! ```text
//! POST { folio, ..., inflows: [ {product_id, quantity, unit_cost}, ... ] }
//!   │
//!   ├─ header rules ─────────────── 400 field
//!   ├─ inflows[i] rules / refs ──── 400 / 422 inflows[i].field
//!   └─ purchase_invoices.insert ─── invoice + inflows, one transaction
//! ```

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use bodega_core::validation::{require, require_datetime, validate_amount, validate_id};
use bodega_core::{InflowLine, InventoryInflow, Money, NewPurchaseInvoice, PurchaseInvoice};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::inventory_inflows::{resolve_line, InflowLineInput};
use super::{ensure_reference, Deleted};
use crate::auth::ActingUser;
use crate::error::{ApiError, ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/purchase-invoices", get(list).post(create))
        .route(
            "/purchase-invoices/:id",
            get(get_one).put(update).delete(delete),
        )
        .route("/purchase-invoices/:id/inflows", get(list_inflows))
}

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceInput {
    pub folio: Option<i64>,
    pub issued_at: Option<String>,
    pub received_at: Option<String>,
    pub net_amount: Option<Money>,
    pub vat_amount: Option<Money>,
    pub other_taxes_amount: Option<Money>,
    pub supplier_id: Option<i64>,
    pub inflows: Option<Vec<InflowLineInput>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceFilter {
    pub supplier_id: Option<i64>,
}

/// An invoice with its inflows embedded.
#[derive(Debug, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: PurchaseInvoice,
    pub inflows: Vec<InventoryInflow>,
}

async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<InvoiceFilter>,
) -> ApiResult<Json<Vec<PurchaseInvoice>>> {
    let repo = state.db.purchase_invoices();
    let invoices = match filter.supplier_id {
        Some(supplier_id) => repo.list_by_supplier(supplier_id).await?,
        None => repo.list().await?,
    };
    Ok(Json(invoices))
}

async fn get_one(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<InvoiceDetail>> {
    let (invoice, inflows) = state
        .db
        .purchase_invoices()
        .get_with_inflows(id)
        .await?
        .ok_or_else(|| ApiError::not_found("PurchaseInvoice", id))?;
    Ok(Json(InvoiceDetail { invoice, inflows }))
}

async fn list_inflows(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Vec<InventoryInflow>>> {
    if !state.db.purchase_invoices().exists(id).await? {
        return Err(ApiError::not_found("PurchaseInvoice", id));
    }
    Ok(Json(state.db.inflows().list_by_invoice(id).await?))
}

async fn create(
    State(state): State<AppState>,
    acting: ActingUser,
    ApiJson(input): ApiJson<InvoiceInput>,
) -> ApiResult<(StatusCode, Json<InvoiceDetail>)> {
    let new = NewPurchaseInvoice {
        folio: require("folio", input.folio)?,
        issued_at: require_datetime("issued_at", input.issued_at.as_deref())?,
        received_at: require_datetime("received_at", input.received_at.as_deref())?,
        net_amount: require("net_amount", input.net_amount)?,
        vat_amount: require("vat_amount", input.vat_amount)?,
        other_taxes_amount: input.other_taxes_amount.unwrap_or_default(),
        supplier_id: require("supplier_id", input.supplier_id)?,
    };
    validate_id("folio", new.folio)?;
    validate_amount("net_amount", new.net_amount)?;
    validate_amount("vat_amount", new.vat_amount)?;
    validate_amount("other_taxes_amount", new.other_taxes_amount)?;

    ensure_reference(
        state.db.suppliers().exists(new.supplier_id).await?,
        "supplier_id",
        new.supplier_id,
    )?;
    let lines = resolve_lines(&state, acting, input.inflows.as_deref().unwrap_or_default()).await?;

    let (invoice, inflows) = state.db.purchase_invoices().insert(&new, &lines).await?;
    info!(
        id = invoice.id,
        folio = invoice.folio,
        inflows = inflows.len(),
        total_amount = %invoice.total_amount,
        "Purchase invoice created"
    );
    Ok((StatusCode::CREATED, Json(InvoiceDetail { invoice, inflows })))
}

async fn update(
    State(state): State<AppState>,
    acting: ActingUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<InvoiceInput>,
) -> ApiResult<Json<InvoiceDetail>> {
    let repo = state.db.purchase_invoices();
    let mut invoice = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("PurchaseInvoice", id))?;

    if let Some(folio) = input.folio {
        validate_id("folio", folio)?;
        invoice.folio = folio;
    }
    if input.issued_at.is_some() {
        invoice.issued_at = require_datetime("issued_at", input.issued_at.as_deref())?;
    }
    if input.received_at.is_some() {
        invoice.received_at = require_datetime("received_at", input.received_at.as_deref())?;
    }
    if let Some(net) = input.net_amount {
        validate_amount("net_amount", net)?;
        invoice.net_amount = net;
    }
    if let Some(vat) = input.vat_amount {
        validate_amount("vat_amount", vat)?;
        invoice.vat_amount = vat;
    }
    if let Some(other) = input.other_taxes_amount {
        validate_amount("other_taxes_amount", other)?;
        invoice.other_taxes_amount = other;
    }
    if let Some(supplier_id) = input.supplier_id {
        ensure_reference(
            state.db.suppliers().exists(supplier_id).await?,
            "supplier_id",
            supplier_id,
        )?;
        invoice.supplier_id = supplier_id;
    }

    let lines = match input.inflows.as_deref() {
        Some(inputs) => Some(resolve_lines(&state, acting, inputs).await?),
        None => None,
    };

    let (invoice, inflows) = repo.update(&invoice, lines.as_deref()).await?;
    info!(id, inflows = inflows.len(), "Purchase invoice updated");
    Ok(Json(InvoiceDetail { invoice, inflows }))
}

async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Deleted>> {
    state.db.purchase_invoices().delete(id).await?;
    info!(id, "Purchase invoice deleted");
    Ok(Deleted::new("PurchaseInvoice", id))
}

async fn resolve_lines(
    state: &AppState,
    acting: ActingUser,
    inputs: &[InflowLineInput],
) -> ApiResult<Vec<InflowLine>> {
    let mut lines = Vec::with_capacity(inputs.len());
    for (i, input) in inputs.iter().enumerate() {
        let line = resolve_line(state, acting, input)
            .await
            .map_err(|err| err.at(&format!("inflows[{i}]")))?;
        lines.push(line);
    }
    Ok(lines)
}
