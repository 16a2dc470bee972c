//! # Inventory Inflow Repository
//!
//! Stock received against a purchase invoice. Rows are created either with
//! their invoice (see [`PurchaseInvoiceRepository`]) or one at a time
//! through this repository.
//!
//! `total_cost` is recomputed from `quantity × unit_cost` on every write.
//! Inflows never change their invoice's amounts, which are supplier-stated.
//!
//! [`PurchaseInvoiceRepository`]: super::purchase_invoice::PurchaseInvoiceRepository

use bodega_core::{InflowLine, InventoryInflow};
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

const TABLE: &str = "inventory_inflows";

const SELECT: &str = r#"
    SELECT id, quantity, unit_cost, total_cost, registered_at,
           user_id, purchase_invoice_id, product_id
    FROM inventory_inflows
"#;

/// Inserts `lines` for one invoice on an open connection or transaction.
pub(crate) async fn insert_lines(
    conn: &mut SqliteConnection,
    purchase_invoice_id: i64,
    lines: &[InflowLine],
    registered_at: DateTime<Utc>,
) -> DbResult<Vec<InventoryInflow>> {
    let mut inflows = Vec::with_capacity(lines.len());

    for line in lines {
        let total_cost = line.total_cost()?;
        let id = sqlx::query(
            r#"
            INSERT INTO inventory_inflows (
                quantity, unit_cost, total_cost, registered_at,
                user_id, purchase_invoice_id, product_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(line.quantity)
        .bind(line.unit_cost)
        .bind(total_cost)
        .bind(registered_at)
        .bind(line.user_id)
        .bind(purchase_invoice_id)
        .bind(line.product_id)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

        inflows.push(InventoryInflow {
            id,
            quantity: line.quantity,
            unit_cost: line.unit_cost,
            total_cost,
            registered_at,
            user_id: line.user_id,
            purchase_invoice_id,
            product_id: line.product_id,
        });
    }

    Ok(inflows)
}

pub(crate) async fn list_for_invoice(
    conn: &mut SqliteConnection,
    purchase_invoice_id: i64,
) -> DbResult<Vec<InventoryInflow>> {
    let inflows = sqlx::query_as::<_, InventoryInflow>(&format!(
        "{SELECT} WHERE purchase_invoice_id = ?1 ORDER BY id"
    ))
    .bind(purchase_invoice_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(inflows)
}

/// Repository for inventory inflow database operations.
#[derive(Debug, Clone)]
pub struct InflowRepository {
    pool: SqlitePool,
}

impl InflowRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InflowRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<InventoryInflow>> {
        let inflows = sqlx::query_as::<_, InventoryInflow>(&format!("{SELECT} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(inflows)
    }

    pub async fn list_by_invoice(&self, purchase_invoice_id: i64) -> DbResult<Vec<InventoryInflow>> {
        let mut conn = self.pool.acquire().await?;
        list_for_invoice(&mut *conn, purchase_invoice_id).await
    }

    pub async fn list_by_product(&self, product_id: i64) -> DbResult<Vec<InventoryInflow>> {
        let inflows =
            sqlx::query_as::<_, InventoryInflow>(&format!("{SELECT} WHERE product_id = ?1 ORDER BY id"))
                .bind(product_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(inflows)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<InventoryInflow>> {
        let inflow = sqlx::query_as::<_, InventoryInflow>(&format!("{SELECT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(inflow)
    }

    /// Records one inflow against an existing invoice.
    pub async fn insert(&self, purchase_invoice_id: i64, line: &InflowLine) -> DbResult<InventoryInflow> {
        debug!(purchase_invoice_id, product_id = line.product_id, "Inserting inflow");

        let mut tx = self.pool.begin().await?;
        if !super::exists(&mut *tx, "purchase_invoices", purchase_invoice_id).await? {
            return Err(DbError::not_found("PurchaseInvoice", purchase_invoice_id));
        }

        let mut inserted =
            insert_lines(&mut *tx, purchase_invoice_id, std::slice::from_ref(line), Utc::now())
                .await?;
        tx.commit().await?;

        inserted
            .pop()
            .ok_or_else(|| DbError::Internal("inflow insert returned no row".to_string()))
    }

    /// Writes `inflow`, recomputing its total cost. The invoice it belongs to
    /// may change but must exist.
    pub async fn update(&self, inflow: &InventoryInflow) -> DbResult<InventoryInflow> {
        debug!(id = inflow.id, "Updating inflow");

        let mut inflow = inflow.clone();
        inflow.recompute_total_cost()?;

        let mut tx = self.pool.begin().await?;
        if !super::exists(&mut *tx, "purchase_invoices", inflow.purchase_invoice_id).await? {
            return Err(DbError::not_found(
                "PurchaseInvoice",
                inflow.purchase_invoice_id,
            ));
        }

        let result = sqlx::query(
            r#"
            UPDATE inventory_inflows SET
                quantity = ?2, unit_cost = ?3, total_cost = ?4,
                user_id = ?5, purchase_invoice_id = ?6, product_id = ?7
            WHERE id = ?1
            "#,
        )
        .bind(inflow.id)
        .bind(inflow.quantity)
        .bind(inflow.unit_cost)
        .bind(inflow.total_cost)
        .bind(inflow.user_id)
        .bind(inflow.purchase_invoice_id)
        .bind(inflow.product_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("InventoryInflow", inflow.id));
        }
        tx.commit().await?;
        Ok(inflow)
    }

    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting inflow");

        let mut tx = self.pool.begin().await?;
        super::delete_guarded(&mut *tx, "InventoryInflow", TABLE, id, &[]).await?;
        tx.commit().await?;
        Ok(())
    }
}
