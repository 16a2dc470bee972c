//! `/api/sales-documents`
//!
//! Net, VAT and total are never taken from input: they are derived from the
//! document's outflows and `other_taxes_amount` at write time.
//!
//! ```text
//! Σ outflow.total_sale_value ──► gross (VAT included)
//!   net   = round(gross / (1 + vat_rate))
//!   vat   = gross − net
//!   total = gross + other_taxes_amount
//! ```

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use bodega_core::validation::{
    require, require_datetime, require_name, update_text, validate_amount, validate_id,
};
use bodega_core::{
    InventoryOutflow, Money, NewSalesDocument, OutflowLine, PaymentMethod, SalesDocument,
    ValidationError, MAX_TEXT_LEN,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::inventory_outflows::{resolve_line, OutflowLineInput};
use super::Deleted;
use crate::auth::ActingUser;
use crate::error::{ApiError, ApiJson, ApiPath, ApiResult};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sales-documents", get(list).post(create))
        .route(
            "/sales-documents/:id",
            get(get_one).put(update).delete(delete),
        )
        .route("/sales-documents/:id/outflows", get(list_outflows))
}

#[derive(Debug, Default, Deserialize)]
pub struct DocumentInput {
    pub document_type: Option<String>,
    pub document_number: Option<i64>,
    pub issued_at: Option<String>,
    pub other_taxes_amount: Option<Money>,
    pub payment_method: Option<String>,
    pub outflows: Option<Vec<OutflowLineInput>>,
}

/// A document with its outflows embedded.
#[derive(Debug, Serialize)]
pub struct DocumentDetail {
    #[serde(flatten)]
    pub document: SalesDocument,
    pub outflows: Vec<InventoryOutflow>,
}

fn parse_payment_method(value: Option<&str>) -> Result<PaymentMethod, ValidationError> {
    let value = match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => return Err(ValidationError::required("payment_method")),
    };
    PaymentMethod::parse(value).ok_or_else(|| ValidationError::InvalidFormat {
        field: "payment_method".to_string(),
        reason: "expected one of cash, card, transfer".to_string(),
    })
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<SalesDocument>>> {
    Ok(Json(state.db.sales_documents().list().await?))
}

async fn get_one(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<DocumentDetail>> {
    let (document, outflows) = state
        .db
        .sales_documents()
        .get_with_outflows(id)
        .await?
        .ok_or_else(|| ApiError::not_found("SalesDocument", id))?;
    Ok(Json(DocumentDetail { document, outflows }))
}

async fn list_outflows(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Vec<InventoryOutflow>>> {
    if !state.db.sales_documents().exists(id).await? {
        return Err(ApiError::not_found("SalesDocument", id));
    }
    Ok(Json(state.db.outflows().list_by_document(id).await?))
}

async fn create(
    State(state): State<AppState>,
    acting: ActingUser,
    ApiJson(input): ApiJson<DocumentInput>,
) -> ApiResult<(StatusCode, Json<DocumentDetail>)> {
    let new = NewSalesDocument {
        document_type: require_name("document_type", input.document_type.as_deref())?,
        document_number: require("document_number", input.document_number)?,
        issued_at: require_datetime("issued_at", input.issued_at.as_deref())?,
        other_taxes_amount: input.other_taxes_amount.unwrap_or_default(),
        payment_method: parse_payment_method(input.payment_method.as_deref())?,
    };
    validate_id("document_number", new.document_number)?;
    validate_amount("other_taxes_amount", new.other_taxes_amount)?;

    let lines = resolve_lines(&state, acting, input.outflows.as_deref().unwrap_or_default()).await?;

    let (document, outflows) = state
        .db
        .sales_documents()
        .insert(&new, &lines, state.vat_rate())
        .await?;
    info!(
        id = document.id,
        document_number = document.document_number,
        outflows = outflows.len(),
        total_amount = %document.total_amount,
        "Sales document created"
    );
    Ok((StatusCode::CREATED, Json(DocumentDetail { document, outflows })))
}

async fn update(
    State(state): State<AppState>,
    acting: ActingUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<DocumentInput>,
) -> ApiResult<Json<DocumentDetail>> {
    let repo = state.db.sales_documents();
    let mut document = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("SalesDocument", id))?;

    if let Some(document_type) =
        update_text("document_type", input.document_type.as_deref(), MAX_TEXT_LEN)?
    {
        document.document_type = document_type;
    }
    if let Some(number) = input.document_number {
        validate_id("document_number", number)?;
        document.document_number = number;
    }
    if input.issued_at.is_some() {
        document.issued_at = require_datetime("issued_at", input.issued_at.as_deref())?;
    }
    if let Some(other) = input.other_taxes_amount {
        validate_amount("other_taxes_amount", other)?;
        document.other_taxes_amount = other;
    }
    if input.payment_method.is_some() {
        document.payment_method = parse_payment_method(input.payment_method.as_deref())?;
    }

    let lines = match input.outflows.as_deref() {
        Some(inputs) => Some(resolve_lines(&state, acting, inputs).await?),
        None => None,
    };

    let (document, outflows) = repo
        .update(&document, lines.as_deref(), state.vat_rate())
        .await?;
    info!(id, outflows = outflows.len(), "Sales document updated");
    Ok(Json(DocumentDetail { document, outflows }))
}

async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Deleted>> {
    state.db.sales_documents().delete(id).await?;
    info!(id, "Sales document deleted");
    Ok(Deleted::new("SalesDocument", id))
}

async fn resolve_lines(
    state: &AppState,
    acting: ActingUser,
    inputs: &[OutflowLineInput],
) -> ApiResult<Vec<OutflowLine>> {
    let mut lines = Vec::with_capacity(inputs.len());
    for (i, input) in inputs.iter().enumerate() {
        let line = resolve_line(state, acting, input)
            .await
            .map_err(|err| err.at(&format!("outflows[{i}]")))?;
        lines.push(line);
    }
    Ok(lines)
}
