//! `/api/companies`

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use bodega_core::validation::{require_name, update_text, validate_tax_id};
use bodega_core::{Company, NewCompany, MAX_TAX_ID_LEN, MAX_TEXT_LEN};
use serde::Deserialize;
use tracing::info;

use super::{ensure_unique, Deleted};
use crate::error::{ApiError, ApiJson, ApiPath, ApiResult};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/companies", get(list).post(create))
        .route("/companies/:id", get(get_one).put(update).delete(delete))
}

#[derive(Debug, Default, Deserialize)]
pub struct CompanyInput {
    pub name: Option<String>,
    pub tax_id: Option<String>,
    pub legal_name: Option<String>,
    pub industry: Option<String>,
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Company>>> {
    Ok(Json(state.db.companies().list().await?))
}

async fn get_one(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Company>> {
    state
        .db
        .companies()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Company", id))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CompanyInput>,
) -> ApiResult<(StatusCode, Json<Company>)> {
    let new = NewCompany {
        name: require_name("name", input.name.as_deref())?,
        tax_id: validate_tax_id("tax_id", input.tax_id.as_deref())?,
        legal_name: require_name("legal_name", input.legal_name.as_deref())?,
        industry: require_name("industry", input.industry.as_deref())?,
    };

    check_unique(&state, &new.tax_id, &new.legal_name, None).await?;

    let company = state.db.companies().insert(&new).await?;
    info!(id = company.id, tax_id = %company.tax_id, "Company created");
    Ok((StatusCode::CREATED, Json(company)))
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<CompanyInput>,
) -> ApiResult<Json<Company>> {
    let repo = state.db.companies();
    let mut company = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Company", id))?;

    if let Some(name) = update_text("name", input.name.as_deref(), MAX_TEXT_LEN)? {
        company.name = name;
    }
    if let Some(tax_id) = update_text("tax_id", input.tax_id.as_deref(), MAX_TAX_ID_LEN)? {
        company.tax_id = tax_id;
    }
    if let Some(legal_name) = update_text("legal_name", input.legal_name.as_deref(), MAX_TEXT_LEN)? {
        company.legal_name = legal_name;
    }
    if let Some(industry) = update_text("industry", input.industry.as_deref(), MAX_TEXT_LEN)? {
        company.industry = industry;
    }

    check_unique(&state, &company.tax_id, &company.legal_name, Some(id)).await?;

    Ok(Json(repo.update(&company).await?))
}

async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Deleted>> {
    state.db.companies().delete(id).await?;
    info!(id, "Company deleted");
    Ok(Deleted::new("Company", id))
}

async fn check_unique(
    state: &AppState,
    tax_id: &str,
    legal_name: &str,
    exclude: Option<i64>,
) -> ApiResult<()> {
    let repo = state.db.companies();
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
