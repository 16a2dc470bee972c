//! `GET /health`

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use bodega_db::migrations;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrations_applied: Option<usize>,
}

/// 200 when the database answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database_up = state.db.health_check().await;
    let migrations_applied = if database_up {
        migrations::migration_status(state.db.pool())
            .await
            .ok()
            .map(|(_, applied)| applied)
    } else {
        None
    };

    let (status, code) = if database_up {
        ("up", StatusCode::OK)
    } else {
        ("down", StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            database: status,
            migrations_applied,
        }),
    )
}
