//! `/api/categories`

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use bodega_core::validation::require_name;
use bodega_core::Category;
use serde::Deserialize;
use tracing::info;

use super::{ensure_unique, Deleted};
use crate::error::{ApiError, ApiJson, ApiPath, ApiResult};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list).post(create))
        .route("/categories/:id", get(get_one).put(update).delete(delete))
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryInput {
    pub name: Option<String>,
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.db.categories().list().await?))
}

async fn get_one(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Category>> {
    state
        .db
        .categories()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Category", id))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let name = require_name("name", input.name.as_deref())?;
    let repo = state.db.categories();

    ensure_unique(repo.find_duplicate(&name, None).await?, "name", &name)?;

    let category = repo.insert(&name).await?;
    info!(id = category.id, name = %category.name, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// The only field is `name`, so an update must carry it.
async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> ApiResult<Json<Category>> {
    let repo = state.db.categories();
    let mut category = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category", id))?;

    category.name = require_name("name", input.name.as_deref())?;
    ensure_unique(
        repo.find_duplicate(&category.name, Some(id)).await?,
        "name",
        &category.name,
    )?;

    Ok(Json(repo.update(&category).await?))
}

async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Deleted>> {
    state.db.categories().delete(id).await?;
    info!(id, "Category deleted");
    Ok(Deleted::new("Category", id))
}
