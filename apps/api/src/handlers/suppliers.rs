//! `/api/suppliers`

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use bodega_core::validation::{optional_text, require_name, update_text, validate_tax_id};
use bodega_core::{NewSupplier, Supplier, MAX_TAX_ID_LEN, MAX_TEXT_LEN};
use serde::Deserialize;
use tracing::info;

use super::{ensure_unique, Deleted};
use crate::error::{ApiError, ApiJson, ApiPath, ApiResult};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/suppliers", get(list).post(create))
        .route("/suppliers/:id", get(get_one).put(update).delete(delete))
}

#[derive(Debug, Default, Deserialize)]
pub struct SupplierInput {
    pub name: Option<String>,
    pub tax_id: Option<String>,
    pub legal_name: Option<String>,
    pub industry: Option<String>,
    pub address: Option<String>,
    pub bank_account: Option<String>,
    pub bank_name: Option<String>,
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Supplier>>> {
    Ok(Json(state.db.suppliers().list().await?))
}

async fn get_one(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Supplier>> {
    state
        .db
        .suppliers()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Supplier", id))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<SupplierInput>,
) -> ApiResult<(StatusCode, Json<Supplier>)> {
    let new = NewSupplier {
        name: require_name("name", input.name.as_deref())?,
        tax_id: validate_tax_id("tax_id", input.tax_id.as_deref())?,
        legal_name: require_name("legal_name", input.legal_name.as_deref())?,
        industry: require_name("industry", input.industry.as_deref())?,
        address: require_name("address", input.address.as_deref())?,
        bank_account: optional_text("bank_account", input.bank_account.as_deref(), MAX_TEXT_LEN)?,
        bank_name: optional_text("bank_name", input.bank_name.as_deref(), MAX_TEXT_LEN)?,
    };

    check_unique(&state, &new.tax_id, &new.legal_name, None).await?;

    let supplier = state.db.suppliers().insert(&new).await?;
    info!(id = supplier.id, tax_id = %supplier.tax_id, "Supplier created");
    Ok((StatusCode::CREATED, Json(supplier)))
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<SupplierInput>,
) -> ApiResult<Json<Supplier>> {
    let repo = state.db.suppliers();
    let mut supplier = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Supplier", id))?;

    if let Some(name) = update_text("name", input.name.as_deref(), MAX_TEXT_LEN)? {
        supplier.name = name;
    }
    if let Some(tax_id) = update_text("tax_id", input.tax_id.as_deref(), MAX_TAX_ID_LEN)? {
        supplier.tax_id = tax_id;
    }
    if let Some(legal_name) = update_text("legal_name", input.legal_name.as_deref(), MAX_TEXT_LEN)? {
        supplier.legal_name = legal_name;
    }
    if let Some(industry) = update_text("industry", input.industry.as_deref(), MAX_TEXT_LEN)? {
        supplier.industry = industry;
    }
    if let Some(address) = update_text("address", input.address.as_deref(), MAX_TEXT_LEN)? {
        supplier.address = address;
    }
    // Optional columns: a blank value clears them
    if input.bank_account.is_some() {
        supplier.bank_account =
            optional_text("bank_account", input.bank_account.as_deref(), MAX_TEXT_LEN)?;
    }
    if input.bank_name.is_some() {
        supplier.bank_name = optional_text("bank_name", input.bank_name.as_deref(), MAX_TEXT_LEN)?;
    }

    check_unique(&state, &supplier.tax_id, &supplier.legal_name, Some(id)).await?;

    Ok(Json(repo.update(&supplier).await?))
}

async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Deleted>> {
    state.db.suppliers().delete(id).await?;
    info!(id, "Supplier deleted");
    Ok(Deleted::new("Supplier", id))
}

async fn check_unique(
    state: &AppState,
    tax_id: &str,
    legal_name: &str,
    exclude: Option<i64>,
) -> ApiResult<()> {
    let repo = state.db.suppliers();
    ensure_unique(
        repo.find_duplicate("tax_id", tax_id, exclude).await?,
        "tax_id",
        tax_id,
    )?;
    ensure_unique(
        repo.find_duplicate("legal_name", legal_name, exclude).await?,
        "legal_name",
        legal_name,
    )
}
