//! `/api/cash-reconciliations`
//!
//! `cash_difference` is computed from the counts on every write:
//! `closing − (opening + cash)`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use bodega_core::validation::{require, require_timestamp, validate_amount};
use bodega_core::{CashReconciliation, Money, NewCashReconciliation};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use super::{ensure_reference, Deleted};
use crate::error::{ApiError, ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cash-reconciliations", get(list).post(create))
        .route(
            "/cash-reconciliations/:id",
            get(get_one).put(update).delete(delete),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct ReconciliationInput {
    pub operator_id: Option<i64>,
    pub administrator_id: Option<i64>,
    pub opened_at: Option<String>,
    pub closed_at: Option<String>,
    pub opening_amount: Option<Money>,
    pub transfer_amount: Option<Money>,
    pub cash_amount: Option<Money>,
    pub card_amount: Option<Money>,
    pub closing_amount: Option<Money>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReconciliationFilter {
    pub operator_id: Option<i64>,
    pub administrator_id: Option<i64>,
}

/// Parses a supplied timestamp, or `None` when the field was left out.
fn optional_timestamp(field: &str, value: Option<&str>) -> ApiResult<Option<DateTime<Utc>>> {
    match value {
        Some(_) => Ok(Some(require_timestamp(field, value)?)),
        None => Ok(None),
    }
}

fn amount(field: &str, value: Money) -> ApiResult<Money> {
    validate_amount(field, value)?;
    Ok(value)
}

async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ReconciliationFilter>,
) -> ApiResult<Json<Vec<CashReconciliation>>> {
    let repo = state.db.cash_reconciliations();
    let reconciliations = match (filter.operator_id, filter.administrator_id) {
        (Some(operator_id), None) => repo.list_by_operator(operator_id).await?,
        (None, Some(administrator_id)) => repo.list_by_administrator(administrator_id).await?,
        (Some(operator_id), Some(administrator_id)) => repo
            .list_by_operator(operator_id)
            .await?
            .into_iter()
            .filter(|r| r.administrator_id == administrator_id)
            .collect(),
        (None, None) => repo.list().await?,
    };
    Ok(Json(reconciliations))
}

async fn get_one(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<CashReconciliation>> {
    state
        .db
        .cash_reconciliations()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("CashReconciliation", id))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ReconciliationInput>,
) -> ApiResult<(StatusCode, Json<CashReconciliation>)> {
    let operator_id = require("operator_id", input.operator_id)?;
    let administrator_id = require("administrator_id", input.administrator_id)?;
    let now = Utc::now();

    let new = NewCashReconciliation {
        operator_id,
        administrator_id,
        opened_at: optional_timestamp("opened_at", input.opened_at.as_deref())?.unwrap_or(now),
        closed_at: optional_timestamp("closed_at", input.closed_at.as_deref())?.unwrap_or(now),
        opening_amount: amount("opening_amount", require("opening_amount", input.opening_amount)?)?,
        transfer_amount: amount("transfer_amount", input.transfer_amount.unwrap_or_default())?,
        cash_amount: amount("cash_amount", input.cash_amount.unwrap_or_default())?,
        card_amount: amount("card_amount", input.card_amount.unwrap_or_default())?,
        closing_amount: amount("closing_amount", require("closing_amount", input.closing_amount)?)?,
    };

    let users = state.db.users();
    ensure_reference(users.exists(operator_id).await?, "operator_id", operator_id)?;
    ensure_reference(
        users.exists(administrator_id).await?,
        "administrator_id",
        administrator_id,
    )?;

    let reconciliation = state.db.cash_reconciliations().insert(&new).await?;
    info!(
        id = reconciliation.id,
        operator_id,
        cash_difference = %reconciliation.cash_difference,
        "Cash reconciliation recorded"
    );
    Ok((StatusCode::CREATED, Json(reconciliation)))
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ReconciliationInput>,
) -> ApiResult<Json<CashReconciliation>> {
    let repo = state.db.cash_reconciliations();
    let mut reconciliation = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("CashReconciliation", id))?;

    if let Some(operator_id) = input.operator_id {
        ensure_reference(
            state.db.users().exists(operator_id).await?,
            "operator_id",
            operator_id,
        )?;
        reconciliation.operator_id = operator_id;
    }
    if let Some(administrator_id) = input.administrator_id {
        ensure_reference(
            state.db.users().exists(administrator_id).await?,
            "administrator_id",
            administrator_id,
        )?;
        reconciliation.administrator_id = administrator_id;
    }
    if let Some(opened_at) = optional_timestamp("opened_at", input.opened_at.as_deref())? {
        reconciliation.opened_at = opened_at;
    }
    if let Some(closed_at) = optional_timestamp("closed_at", input.closed_at.as_deref())? {
        reconciliation.closed_at = closed_at;
    }
    if let Some(value) = input.opening_amount {
        reconciliation.opening_amount = amount("opening_amount", value)?;
    }
    if let Some(value) = input.transfer_amount {
        reconciliation.transfer_amount = amount("transfer_amount", value)?;
    }
    if let Some(value) = input.cash_amount {
        reconciliation.cash_amount = amount("cash_amount", value)?;
    }
    if let Some(value) = input.card_amount {
        reconciliation.card_amount = amount("card_amount", value)?;
    }
    if let Some(value) = input.closing_amount {
        reconciliation.closing_amount = amount("closing_amount", value)?;
    }

    Ok(Json(repo.update(&reconciliation).await?))
}

async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Deleted>> {
    state.db.cash_reconciliations().delete(id).await?;
    info!(id, "Cash reconciliation deleted");
    Ok(Deleted::new("CashReconciliation", id))
}
