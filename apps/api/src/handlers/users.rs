//! `/api/users`
//!
//! Passwords arrive in clear text and are stored as argon2 hashes; the hash
//! is never serialized back. `code` is assigned by storage (1000 + id) and
//! can't be set from input.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use bodega_core::validation::{
    optional_text, require, require_name, require_text, update_text, validate_email,
    validate_tax_id,
};
use bodega_core::{NewUser, User, MAX_TAX_ID_LEN, MAX_TEXT_LEN};
use serde::Deserialize;
use tracing::info;

use super::{ensure_reference, ensure_unique, Deleted};
use crate::auth::hash_password;
use crate::error::{ApiError, ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::AppState;

const MAX_PASSWORD_LEN: usize = 128;
const MAX_PHOTO_LEN: usize = 255;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list).post(create))
        .route("/users/:id", get(get_one).put(update).delete(delete))
}

#[derive(Debug, Default, Deserialize)]
pub struct UserInput {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub tax_id: Option<String>,
    pub role: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub active: Option<bool>,
    pub photo: Option<String>,
    pub company_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserFilter {
    pub company_id: Option<i64>,
}

async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<UserFilter>,
) -> ApiResult<Json<Vec<User>>> {
    let repo = state.db.users();
    let users = match filter.company_id {
        Some(company_id) => repo.list_by_company(company_id).await?,
        None => repo.list().await?,
    };
    Ok(Json(users))
}

async fn get_one(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<User>> {
    state
        .db
        .users()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User", id))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<UserInput>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let name = require_name("name", input.name.as_deref())?;
    let surname = require_name("surname", input.surname.as_deref())?;
    let tax_id = validate_tax_id("tax_id", input.tax_id.as_deref())?;
    let role = require_name("role", input.role.as_deref())?;
    let email = validate_email(input.email.as_deref())?;
    let password = require_text("password", input.password.as_deref(), MAX_PASSWORD_LEN)?;
    let company_id = require("company_id", input.company_id)?;
    let photo = optional_text("photo", input.photo.as_deref(), MAX_PHOTO_LEN)?;

    ensure_reference(
        state.db.companies().exists(company_id).await?,
        "company_id",
        company_id,
    )?;
    check_unique(&state, &tax_id, &email, None).await?;

    let new = NewUser {
        name,
        surname,
        tax_id,
        role,
        email,
        password_hash: hash_password(password).await?,
        active: input.active.unwrap_or(true),
        photo,
        company_id,
    };

    let user = state.db.users().insert(&new).await?;
    info!(id = user.id, code = ?user.code, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UserInput>,
) -> ApiResult<Json<User>> {
    let repo = state.db.users();
    let mut user = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    if let Some(name) = update_text("name", input.name.as_deref(), MAX_TEXT_LEN)? {
        user.name = name;
    }
    if let Some(surname) = update_text("surname", input.surname.as_deref(), MAX_TEXT_LEN)? {
        user.surname = surname;
    }
    if let Some(tax_id) = update_text("tax_id", input.tax_id.as_deref(), MAX_TAX_ID_LEN)? {
        user.tax_id = tax_id;
    }
    if let Some(role) = update_text("role", input.role.as_deref(), MAX_TEXT_LEN)? {
        user.role = role;
    }
    if input.email.is_some() {
        user.email = validate_email(input.email.as_deref())?;
    }
    if let Some(password) = update_text("password", input.password.as_deref(), MAX_PASSWORD_LEN)? {
        user.password_hash = hash_password(password).await?;
    }
    if let Some(active) = input.active {
        user.active = active;
    }
    if input.photo.is_some() {
        // A blank photo clears it
        user.photo = optional_text("photo", input.photo.as_deref(), MAX_PHOTO_LEN)?;
    }
    if let Some(company_id) = input.company_id {
        ensure_reference(
            state.db.companies().exists(company_id).await?,
            "company_id",
            company_id,
        )?;
        user.company_id = company_id;
    }

    check_unique(&state, &user.tax_id, &user.email, Some(id)).await?;

    Ok(Json(repo.update(&user).await?))
}

async fn delete(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<Deleted>> {
    state.db.users().delete(id).await?;
    info!(id, "User deleted");
    Ok(Deleted::new("User", id))
}

async fn check_unique(
    state: &AppState,
    tax_id: &str,
    email: &str,
    exclude: Option<i64>,
) -> ApiResult<()> {
    let repo = state.db.users();
    ensure_unique(
        repo.find_duplicate("tax_id", tax_id, exclude).await?,
        "tax_id",
        tax_id,
    )?;
    ensure_unique(
        repo.find_duplicate("email", email, exclude).await?,
        "email",
        email,
    )
}
