//! # Purchase Invoice Repository
//!
//! An invoice owns its inflows. Multi-row writes run in one transaction.
//!
//! ## Invoice Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. CREATE                                                              │
//! │     └── insert(invoice, lines) → invoice row + one inflow per line     │
//! │                                                                         │
//! │  2. UPDATE                                                              │
//! │     └── update(invoice, None)        → invoice columns only            │
//! │     └── update(invoice, Some(lines)) → invoice columns,                │
//! │                                        DELETE every inflow,            │
//! │                                        INSERT the replacement set      │
//! │                                                                         │
//! │  3. DELETE                                                              │
//! │     └── delete(id) → inflows first, then the invoice                   │
//! │                                                                         │
//! │  total_amount = net + VAT + other taxes on every write                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bodega_core::{InflowLine, InventoryInflow, NewPurchaseInvoice, PurchaseInvoice};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::inflow;
use crate::error::{DbError, DbResult};

const TABLE: &str = "purchase_invoices";

const SELECT: &str = r#"
    SELECT id, folio, issued_at, received_at, net_amount, vat_amount,
           other_taxes_amount, total_amount, supplier_id
    FROM purchase_invoices
"#;

/// Repository for purchase invoice database operations.
#[derive(Debug, Clone)]
pub struct PurchaseInvoiceRepository {
    pool: SqlitePool,
}

impl PurchaseInvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseInvoiceRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<PurchaseInvoice>> {
        let invoices = sqlx::query_as::<_, PurchaseInvoice>(&format!("{SELECT} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(invoices)
    }

    pub async fn list_by_supplier(&self, supplier_id: i64) -> DbResult<Vec<PurchaseInvoice>> {
        let invoices = sqlx::query_as::<_, PurchaseInvoice>(&format!(
            "{SELECT} WHERE supplier_id = ?1 ORDER BY id"
        ))
        .bind(supplier_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(invoices)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<PurchaseInvoice>> {
        let invoice = sqlx::query_as::<_, PurchaseInvoice>(&format!("{SELECT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(invoice)
    }

    /// An invoice together with its inflows.
    pub async fn get_with_inflows(
        &self,
        id: i64,
    ) -> DbResult<Option<(PurchaseInvoice, Vec<InventoryInflow>)>> {
        let mut conn = self.pool.acquire().await?;

        let invoice = sqlx::query_as::<_, PurchaseInvoice>(&format!("{SELECT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        match invoice {
            Some(invoice) => {
                let inflows = inflow::list_for_invoice(&mut *conn, id).await?;
                Ok(Some((invoice, inflows)))
            }
            None => Ok(None),
        }
    }

    pub async fn exists(&self, id: i64) -> DbResult<bool> {
        super::exists(&self.pool, TABLE, id).await
    }

    /// Inserts an invoice and its inflows atomically.
    pub async fn insert(
        &self,
        new: &NewPurchaseInvoice,
        lines: &[InflowLine],
    ) -> DbResult<(PurchaseInvoice, Vec<InventoryInflow>)> {
        debug!(
            folio = new.folio,
            supplier_id = new.supplier_id,
            inflows = lines.len(),
            "Inserting purchase invoice"
        );

        let total_amount = new.total_amount()?;
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO purchase_invoices (
                folio, issued_at, received_at, net_amount, vat_amount,
                other_taxes_amount, total_amount, supplier_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(new.folio)
        .bind(new.issued_at)
        .bind(new.received_at)
        .bind(new.net_amount)
        .bind(new.vat_amount)
        .bind(new.other_taxes_amount)
        .bind(total_amount)
        .bind(new.supplier_id)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let inflows = inflow::insert_lines(&mut *tx, id, lines, Utc::now()).await?;
        tx.commit().await?;

        let invoice = PurchaseInvoice {
            id,
            folio: new.folio,
            issued_at: new.issued_at,
            received_at: new.received_at,
            net_amount: new.net_amount,
            vat_amount: new.vat_amount,
            other_taxes_amount: new.other_taxes_amount,
            total_amount,
            supplier_id: new.supplier_id,
        };
        Ok((invoice, inflows))
    }

    /// Writes the invoice columns and, when `lines` is given, replaces every
    /// inflow of the invoice with the new set.
    ///
    /// Returns the stored invoice and its inflows after the write.
    pub async fn update(
        &self,
        invoice: &PurchaseInvoice,
        lines: Option<&[InflowLine]>,
    ) -> DbResult<(PurchaseInvoice, Vec<InventoryInflow>)> {
        debug!(
            id = invoice.id,
            replace_inflows = lines.map(<[InflowLine]>::len),
            "Updating purchase invoice"
        );

        let mut invoice = invoice.clone();
        invoice.recompute_total()?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE purchase_invoices SET
                folio = ?2, issued_at = ?3, received_at = ?4, net_amount = ?5,
                vat_amount = ?6, other_taxes_amount = ?7, total_amount = ?8,
                supplier_id = ?9
            WHERE id = ?1
            "#,
        )
        .bind(invoice.id)
        .bind(invoice.folio)
        .bind(invoice.issued_at)
        .bind(invoice.received_at)
        .bind(invoice.net_amount)
        .bind(invoice.vat_amount)
        .bind(invoice.other_taxes_amount)
        .bind(invoice.total_amount)
        .bind(invoice.supplier_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PurchaseInvoice", invoice.id));
        }

        if let Some(lines) = lines {
            sqlx::query("DELETE FROM inventory_inflows WHERE purchase_invoice_id = ?1")
                .bind(invoice.id)
                .execute(&mut *tx)
                .await?;
            inflow::insert_lines(&mut *tx, invoice.id, lines, Utc::now()).await?;
        }

        let inflows = inflow::list_for_invoice(&mut *tx, invoice.id).await?;
        tx.commit().await?;

        Ok((invoice, inflows))
    }

    /// Deletes an invoice together with its inflows.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting purchase invoice");

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM inventory_inflows WHERE purchase_invoice_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM purchase_invoices WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PurchaseInvoice", id));
        }

        tx.commit().await?;
        Ok(())
    }
}
