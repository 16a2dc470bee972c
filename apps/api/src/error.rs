//! Error types for the HTTP API.
//!
//! Every rejection leaves the server as the same JSON shape:
//!
//! ```text
//! { "code": "duplicate", "message": "sku 'BEV-001' already exists",
//!   "field": "sku", "details": { ...existing product... } }
//! ```
//!
//! | variant            | status | code                  |
//! |--------------------|--------|-----------------------|
//! | Validation         | 400    | `validation_error`    |
//! | BadRequest         | 400    | `invalid_request`     |
//! | Unauthorized       | 401    | `unauthorized`        |
//! | NotFound           | 404    | `not_found`           |
//! | Duplicate          | 409    | `duplicate`           |
//! | HasDependents      | 409    | `has_dependents`      |
//! | ReferenceNotFound  | 422    | `reference_not_found` |
//! | Internal           | 500    | `internal_error`      |

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bodega_core::{CoreError, ValidationError};
use bodega_db::DbError;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(ValidationError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: i64 },

    /// `existing` carries the row already holding the value, when known.
    #[error("{}", duplicate_message(field, value.as_deref()))]
    Duplicate {
        field: String,
        value: Option<String>,
        existing: Option<Value>,
    },

    #[error("{entity} {id} still has {dependent}")]
    HasDependents {
        entity: String,
        id: i64,
        dependent: String,
    },

    /// `field` is `None` when the storage layer caught the violation.
    #[error("{}", reference_message(field.as_deref(), *id))]
    ReferenceNotFound {
        field: Option<String>,
        id: Option<i64>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

fn duplicate_message(field: &str, value: Option<&str>) -> String {
    match value {
        Some(value) => format!("{field} '{value}' already exists"),
        None => format!("{field} already exists"),
    }
}

fn reference_message(field: Option<&str>, id: Option<i64>) -> String {
    match (field, id) {
        (Some(field), Some(id)) => format!("{field} references a missing record: {id}"),
        (Some(field), None) => format!("{field} references a missing record"),
        _ => "A referenced record does not exist".to_string(),
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn not_found(entity: impl Into<String>, id: i64) -> Self {
        ApiError::NotFound {
            entity: entity.into(),
            id,
        }
    }

    pub fn reference(field: impl Into<String>, id: i64) -> Self {
        ApiError::ReferenceNotFound {
            field: Some(field.into()),
            id: Some(id),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        ApiError::Duplicate {
            field: field.into(),
            value: Some(value.into()),
            existing: None,
        }
    }

    /// Qualifies the offending field with its position in a nested list,
    /// e.g. `quantity` becomes `inflows[1].quantity`.
    pub fn at(self, prefix: &str) -> Self {
        let qualify = |field: &str| format!("{prefix}.{field}");
        match self {
            ApiError::Validation(err) => ApiError::Validation(qualify_validation(err, &qualify)),
            ApiError::ReferenceNotFound {
                field: Some(field),
                id,
            } => ApiError::ReferenceNotFound {
                field: Some(qualify(&field)),
                id,
            },
            other => other,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Duplicate { .. } | ApiError::HasDependents { .. } => StatusCode::CONFLICT,
            ApiError::ReferenceNotFound { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::BadRequest(_) => "invalid_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Duplicate { .. } => "duplicate",
            ApiError::HasDependents { .. } => "has_dependents",
            ApiError::ReferenceNotFound { .. } => "reference_not_found",
            ApiError::Internal(_) => "internal_error",
        }
    }

    /// The request field the rejection is about.
    pub fn field(&self) -> Option<&str> {
        match self {
            ApiError::Validation(err) => Some(err.field()),
            ApiError::Duplicate { field, .. } => Some(field),
            ApiError::ReferenceNotFound { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}

fn qualify_validation(err: ValidationError, qualify: &dyn Fn(&str) -> String) -> ValidationError {
    match err {
        ValidationError::Required { field } => ValidationError::Required {
            field: qualify(&field),
        },
        ValidationError::TooLong { field, max } => ValidationError::TooLong {
            field: qualify(&field),
            max,
        },
        ValidationError::MustBePositive { field } => ValidationError::MustBePositive {
            field: qualify(&field),
        },
        ValidationError::MustBeNonNegative { field } => ValidationError::MustBeNonNegative {
            field: qualify(&field),
        },
        ValidationError::OutOfRange { field, min, max } => ValidationError::OutOfRange {
            field: qualify(&field),
            min,
            max,
        },
        ValidationError::InvalidFormat { field, reason } => ValidationError::InvalidFormat {
            field: qualify(&field),
            reason,
        },
        ValidationError::Duplicate { field, value } => ValidationError::Duplicate {
            field: qualify(&field),
            value,
        },
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Duplicate { field, value } => ApiError::Duplicate {
                field,
                value: Some(value),
                existing: None,
            },
            other => ApiError::Validation(other),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { entity, id } => ApiError::NotFound { entity, id },
            CoreError::ReferenceNotFound { field, id } => ApiError::ReferenceNotFound {
                field: Some(field),
                id: Some(id),
            },
            CoreError::Validation(err) => err.into(),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::NotFound { entity, id },
            DbError::UniqueViolation { field, .. } => ApiError::Duplicate {
                field,
                value: None,
                existing: None,
            },
            DbError::ForeignKeyViolation { message } => {
                warn!(%message, "Foreign key violation reached the storage layer");
                ApiError::ReferenceNotFound {
                    field: None,
                    id: None,
                }
            }
            DbError::Validation(err) => err.into(),
            DbError::HasDependents {
                entity,
                id,
                dependent,
            } => ApiError::HasDependents {
                entity,
                id,
                dependent,
            },
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

// =============================================================================
// Response
// =============================================================================

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            ApiError::Internal(detail) => {
                error!(%detail, "Internal error while handling request");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            code: self.code(),
            field: self.field().map(str::to_string),
            message,
            details: match self {
                ApiError::Duplicate { existing, .. } => existing,
                _ => None,
            },
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Extractors
// =============================================================================

/// `axum::Json` whose rejection is an [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` whose rejection is an [`ApiError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// `axum::extract::Query` whose rejection is an [`ApiError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
