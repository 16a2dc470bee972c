//! # Sales Document Repository
//!
//! A sales document owns its outflows, and its amounts are always derived
//! from them:
//!
//! ```text
//! gross = Σ outflow.total_sale_value         (VAT included)
//! net   = round(gross / (1 + VAT))
//! vat   = gross − net
//! total = gross + other_taxes_amount
//! ```
//!
//! Only the header columns (type, number, issue date, other taxes, payment
//! method) are written from input.

use bodega_core::totals::SaleTotals;
use bodega_core::{
    InventoryOutflow, Money, NewSalesDocument, OutflowLine, SalesDocument, TaxRate,
    ValidationError,
};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::outflow;
use crate::error::{DbError, DbResult};

const TABLE: &str = "sales_documents";

const SELECT: &str = r#"
    SELECT id, document_type, document_number, issued_at, net_amount, vat_amount,
           other_taxes_amount, total_amount, payment_method
    FROM sales_documents
"#;

async fn fetch(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<SalesDocument>> {
    let document = sqlx::query_as::<_, SalesDocument>(&format!("{SELECT} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(document)
}

/// Recomputes a document's amounts from the outflows currently stored for
/// it, writes them, and returns the refreshed document.
pub(crate) async fn refresh_totals(
    conn: &mut SqliteConnection,
    sales_document_id: i64,
    vat_rate: TaxRate,
) -> DbResult<SalesDocument> {
    let mut document = fetch(&mut *conn, sales_document_id)
        .await?
        .ok_or_else(|| DbError::not_found("SalesDocument", sales_document_id))?;

    // Summed here rather than with SUM(), which fails on overflow
    let values: Vec<Option<Money>> = sqlx::query_scalar(
        "SELECT total_sale_value FROM inventory_outflows WHERE sales_document_id = ?1",
    )
    .bind(sales_document_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut gross = Money::zero();
    for value in values.into_iter().flatten() {
        gross = gross
            .checked_add(value)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "total_amount".to_string(),
                min: 0,
                max: i64::MAX,
            })?;
    }

    let totals = SaleTotals::from_gross(gross, document.other_taxes_amount, vat_rate)?;
    write_totals(&mut *conn, sales_document_id, &totals).await?;
    document.apply_totals(&totals);

    debug!(
        id = sales_document_id,
        net = totals.net.minor(),
        vat = totals.vat.minor(),
        total = totals.total.minor(),
        "Sales document totals refreshed"
    );
    Ok(document)
}

async fn write_totals(
    conn: &mut SqliteConnection,
    sales_document_id: i64,
    totals: &SaleTotals,
) -> DbResult<()> {
    sqlx::query(
        "UPDATE sales_documents SET net_amount = ?2, vat_amount = ?3, total_amount = ?4 WHERE id = ?1",
    )
    .bind(sales_document_id)
    .bind(totals.net)
    .bind(totals.vat)
    .bind(totals.total)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Repository for sales document database operations.
#[derive(Debug, Clone)]
pub struct SalesDocumentRepository {
    pool: SqlitePool,
}

impl SalesDocumentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SalesDocumentRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<SalesDocument>> {
        let documents = sqlx::query_as::<_, SalesDocument>(&format!("{SELECT} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(documents)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<SalesDocument>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut *conn, id).await
    }

    /// A document together with its outflows.
    pub async fn get_with_outflows(
        &self,
        id: i64,
    ) -> DbResult<Option<(SalesDocument, Vec<InventoryOutflow>)>> {
        let mut conn = self.pool.acquire().await?;
        match fetch(&mut *conn, id).await? {
            Some(document) => {
                let outflows = outflow::list_for_document(&mut *conn, id).await?;
                Ok(Some((document, outflows)))
            }
            None => Ok(None),
        }
    }

    pub async fn exists(&self, id: i64) -> DbResult<bool> {
        super::exists(&self.pool, TABLE, id).await
    }

    /// Inserts a document and its outflows atomically. Amounts are derived
    /// from `lines`.
    pub async fn insert(
        &self,
        new: &NewSalesDocument,
        lines: &[OutflowLine],
        vat_rate: TaxRate,
    ) -> DbResult<(SalesDocument, Vec<InventoryOutflow>)> {
        debug!(
            document_type = %new.document_type,
            document_number = new.document_number,
            outflows = lines.len(),
            "Inserting sales document"
        );

        let totals = SaleTotals::from_lines(lines, new.other_taxes_amount, vat_rate)?;
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO sales_documents (
                document_type, document_number, issued_at, net_amount, vat_amount,
                other_taxes_amount, total_amount, payment_method
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&new.document_type)
        .bind(new.document_number)
        .bind(new.issued_at)
        .bind(totals.net)
        .bind(totals.vat)
        .bind(totals.other_taxes)
        .bind(totals.total)
        .bind(new.payment_method)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let outflows = outflow::insert_lines(&mut *tx, id, lines, Utc::now()).await?;
        tx.commit().await?;

        let document = SalesDocument {
            id,
            document_type: new.document_type.clone(),
            document_number: new.document_number,
            issued_at: new.issued_at,
            net_amount: totals.net,
            vat_amount: totals.vat,
            other_taxes_amount: totals.other_taxes,
            total_amount: totals.total,
            payment_method: new.payment_method,
        };
        Ok((document, outflows))
    }

    /// Writes the header columns of `document`, replaces its outflows when
    /// `lines` is given, and re-derives the amounts.
    pub async fn update(
        &self,
        document: &SalesDocument,
        lines: Option<&[OutflowLine]>,
        vat_rate: TaxRate,
    ) -> DbResult<(SalesDocument, Vec<InventoryOutflow>)> {
        debug!(
            id = document.id,
            replace_outflows = lines.map(<[OutflowLine]>::len),
            "Updating sales document"
        );

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE sales_documents SET
                document_type = ?2, document_number = ?3, issued_at = ?4,
                other_taxes_amount = ?5, payment_method = ?6
            WHERE id = ?1
            "#,
        )
        .bind(document.id)
        .bind(&document.document_type)
        .bind(document.document_number)
        .bind(document.issued_at)
        .bind(document.other_taxes_amount)
        .bind(document.payment_method)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("SalesDocument", document.id));
        }

        if let Some(lines) = lines {
            sqlx::query("DELETE FROM inventory_outflows WHERE sales_document_id = ?1")
                .bind(document.id)
                .execute(&mut *tx)
                .await?;
            outflow::insert_lines(&mut *tx, document.id, lines, Utc::now()).await?;
        }

        let refreshed = refresh_totals(&mut *tx, document.id, vat_rate).await?;
        let outflows = outflow::list_for_document(&mut *tx, document.id).await?;
        tx.commit().await?;

        Ok((refreshed, outflows))
    }

    /// Deletes a document together with its outflows.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting sales document");

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM inventory_outflows WHERE sales_document_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM sales_documents WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("SalesDocument", id));
        }

        tx.commit().await?;
        Ok(())
    }
}
