//! # Repository Module
//!
//! One repository per entity, plus the small query helpers they share.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.suppliers().find_duplicate("tax_id", "11111111-1", None)   │
//! │       │  db.suppliers().insert(&new_supplier)                          │
//! │       ▼                                                                 │
//! │  SupplierRepository                                                    │
//! │  ├── list(&self)                                                       │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── insert(&self, new)                                                │
//! │  ├── update(&self, supplier)                                           │
//! │  └── delete(&self, id)        ← refuses while invoices reference it    │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CompanyRepository`](company::CompanyRepository)
//! - [`UserRepository`](user::UserRepository) - two-phase insert for `code`
//! - [`SupplierRepository`](supplier::SupplierRepository)
//! - [`CategoryRepository`](category::CategoryRepository)
//! - [`ProductRepository`](product::ProductRepository)
//! - [`PurchaseInvoiceRepository`](purchase_invoice::PurchaseInvoiceRepository) - owns inflows
//! - [`InflowRepository`](inflow::InflowRepository)
//! - [`SalesDocumentRepository`](sales_document::SalesDocumentRepository) - owns outflows
//! - [`OutflowRepository`](outflow::OutflowRepository)
//! - [`CashReconciliationRepository`](cash_reconciliation::CashReconciliationRepository)
//!
//! Table and column names passed to the helpers below are always
//! compile-time constants, never request data.

pub mod cash_reconciliation;
pub mod category;
pub mod company;
pub mod inflow;
pub mod outflow;
pub mod product;
pub mod purchase_invoice;
pub mod sales_document;
pub mod supplier;
pub mod user;

use sqlx::{Executor, Sqlite, SqliteConnection};

use crate::error::{DbError, DbResult};

/// A foreign key pointing at the row being deleted: `(table, column)`.
pub(crate) type Dependent = (&'static str, &'static str);

/// Unique columns shared by companies and suppliers.
pub(crate) const UNIQUE_TAX_AND_LEGAL: &[&str] = &["tax_id", "legal_name"];

/// Whether a row with `id` exists in `table`.
pub(crate) async fn exists<'e, E>(executor: E, table: &'static str, id: i64) -> DbResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE id = ?1");
    let count: i64 = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_one(executor)
        .await?;
    Ok(count > 0)
}

/// Id of another row in `table` whose `column` equals `value`.
///
/// `exclude_id` skips the record being updated so it never collides with
/// itself. Only columns listed in `allowed` can be queried.
pub(crate) async fn find_duplicate<'e, E>(
    executor: E,
    table: &'static str,
    allowed: &[&'static str],
    column: &'static str,
    value: &str,
    exclude_id: Option<i64>,
) -> DbResult<Option<i64>>
where
    E: Executor<'e, Database = Sqlite>,
{
    if !allowed.contains(&column) {
        return Err(DbError::Internal(format!(
            "{table}.{column} is not a unique column"
        )));
    }

    let sql = format!(
        "SELECT id FROM {table} WHERE {column} = ?1 AND (?2 IS NULL OR id <> ?2) LIMIT 1"
    );
    let id: Option<i64> = sqlx::query_scalar(&sql)
        .bind(value)
        .bind(exclude_id)
        .fetch_optional(executor)
        .await?;
    Ok(id)
}

/// First dependent table that still references `id`, if any.
pub(crate) async fn first_dependent(
    conn: &mut SqliteConnection,
    id: i64,
    dependents: &[Dependent],
) -> DbResult<Option<&'static str>> {
    for &(table, column) in dependents {
        let sql = format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?1");
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        if count > 0 {
            return Ok(Some(table));
        }
    }
    Ok(None)
}

/// Deletes a row that nothing else may reference, in one transaction:
/// existence check, dependent check, delete.
pub(crate) async fn delete_guarded(
    conn: &mut SqliteConnection,
    entity: &'static str,
    table: &'static str,
    id: i64,
    dependents: &[Dependent],
) -> DbResult<()> {
    if !exists(&mut *conn, table, id).await? {
        return Err(DbError::not_found(entity, id));
    }

    if let Some(dependent) = first_dependent(&mut *conn, id, dependents).await? {
        return Err(DbError::has_dependents(entity, id, dependent));
    }

    let sql = format!("DELETE FROM {table} WHERE id = ?1");
    sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
    Ok(())
}

// =============================================================================
// Test fixtures
// =============================================================================
