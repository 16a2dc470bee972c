//! Request handlers, one module per resource.
//!
//! Every write handler runs the same steps:
//!
//! ```text
//! ApiJson<Input> ──► required / length / numeric rules (bodega_core::validation)
//!                ──► referenced rows exist           (422 reference_not_found)
//!                ──► unique fields free, self excluded (409 duplicate)
//!                ──► repository write                (unique index / FK backstop)
//!                ──► Json<Entity>
//! ```
//!
//! Updates are partial: the stored row is loaded, supplied fields are
//! validated and merged onto it, and the merged row is written back.

use axum::Json;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};

pub mod cash_reconciliations;
pub mod categories;
pub mod companies;
pub mod health;
pub mod inventory_inflows;
pub mod inventory_outflows;
pub mod products;
pub mod purchase_invoices;
pub mod sales_documents;
pub mod suppliers;
pub mod users;

/// Body returned by every DELETE.
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub message: String,
}

impl Deleted {
    pub fn new(entity: &str, id: i64) -> Json<Self> {
        Json(Deleted {
            message: format!("{entity} {id} deleted"),
        })
    }
}

/// Rejects a request whose `field` points at a row that doesn't exist.
pub(crate) fn ensure_reference(exists: bool, field: &str, id: i64) -> ApiResult<()> {
    if exists {
        Ok(())
    } else {
        Err(ApiError::reference(field, id))
    }
}

/// Rejects a request when another row already holds `value` in `field`.
pub(crate) fn ensure_unique(existing: Option<i64>, field: &str, value: &str) -> ApiResult<()> {
    match existing {
        Some(_) => Err(ApiError::duplicate(field, value)),
        None => Ok(()),
    }
}
