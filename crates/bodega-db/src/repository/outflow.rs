//! # Inventory Outflow Repository
//!
//! Stock leaving through a sales document. Every write here re-derives the
//! owning document's amounts in the same transaction, so a document always
//! matches its outflows.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    INSERT / UPDATE / DELETE inventory_outflows ...                     │
//! │    gross = SUM(total_sale_value) of the document's outflows            │
//! │    UPDATE sales_documents SET net, vat, total = f(gross)               │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bodega_core::{InventoryOutflow, OutflowLine, TaxRate};
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::sales_document::refresh_totals;
use crate::error::{DbError, DbResult};

const TABLE: &str = "inventory_outflows";

const SELECT: &str = r#"
    SELECT id, quantity, unit_cost, total_cost, unit_sale_price, total_sale_value,
           registered_at, user_id, product_id, sales_document_id
    FROM inventory_outflows
"#;

/// Inserts `lines` for one document on an open connection or transaction.
/// Document totals are left to the caller.
pub(crate) async fn insert_lines(
    conn: &mut SqliteConnection,
    sales_document_id: i64,
    lines: &[OutflowLine],
    registered_at: DateTime<Utc>,
) -> DbResult<Vec<InventoryOutflow>> {
    let mut outflows = Vec::with_capacity(lines.len());

    for line in lines {
        let total_cost = line.total_cost()?;
        let total_sale_value = line.total_sale_value()?;

        let id = sqlx::query(
            r#"
            INSERT INTO inventory_outflows (
                quantity, unit_cost, total_cost, unit_sale_price, total_sale_value,
                registered_at, user_id, product_id, sales_document_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(line.quantity)
        .bind(line.unit_cost)
        .bind(total_cost)
        .bind(line.unit_sale_price)
        .bind(total_sale_value)
        .bind(registered_at)
        .bind(line.user_id)
        .bind(line.product_id)
        .bind(sales_document_id)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

        outflows.push(InventoryOutflow {
            id,
            quantity: line.quantity,
            unit_cost: line.unit_cost,
            total_cost,
            unit_sale_price: line.unit_sale_price,
            total_sale_value,
            registered_at,
            user_id: line.user_id,
            product_id: line.product_id,
            sales_document_id,
        });
    }

    Ok(outflows)
}

pub(crate) async fn list_for_document(
    conn: &mut SqliteConnection,
    sales_document_id: i64,
) -> DbResult<Vec<InventoryOutflow>> {
    let outflows = sqlx::query_as::<_, InventoryOutflow>(&format!(
        "{SELECT} WHERE sales_document_id = ?1 ORDER BY id"
    ))
    .bind(sales_document_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(outflows)
}

/// Repository for inventory outflow database operations.
#[derive(Debug, Clone)]
pub struct OutflowRepository {
    pool: SqlitePool,
}

impl OutflowRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OutflowRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<InventoryOutflow>> {
        let outflows = sqlx::query_as::<_, InventoryOutflow>(&format!("{SELECT} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(outflows)
    }

    pub async fn list_by_document(&self, sales_document_id: i64) -> DbResult<Vec<InventoryOutflow>> {
        let mut conn = self.pool.acquire().await?;
        list_for_document(&mut *conn, sales_document_id).await
    }

    pub async fn list_by_product(&self, product_id: i64) -> DbResult<Vec<InventoryOutflow>> {
        let outflows = sqlx::query_as::<_, InventoryOutflow>(&format!(
            "{SELECT} WHERE product_id = ?1 ORDER BY id"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(outflows)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<InventoryOutflow>> {
        let outflow = sqlx::query_as::<_, InventoryOutflow>(&format!("{SELECT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(outflow)
    }

    /// Records one outflow against an existing document and re-derives the
    /// document's amounts.
    pub async fn insert(
        &self,
        sales_document_id: i64,
        line: &OutflowLine,
        vat_rate: TaxRate,
    ) -> DbResult<InventoryOutflow> {
        debug!(sales_document_id, product_id = line.product_id, "Inserting outflow");

        let mut tx = self.pool.begin().await?;
        if !super::exists(&mut *tx, "sales_documents", sales_document_id).await? {
            return Err(DbError::not_found("SalesDocument", sales_document_id));
        }

        let mut inserted = insert_lines(
            &mut *tx,
            sales_document_id,
            std::slice::from_ref(line),
            Utc::now(),
        )
        .await?;
        refresh_totals(&mut *tx, sales_document_id, vat_rate).await?;
        tx.commit().await?;

        inserted
            .pop()
            .ok_or_else(|| DbError::Internal("outflow insert returned no row".to_string()))
    }

    /// Writes `outflow` with recomputed line totals. When the outflow moves
    /// to another document, both documents are re-derived.
    pub async fn update(
        &self,
        outflow: &InventoryOutflow,
        vat_rate: TaxRate,
    ) -> DbResult<InventoryOutflow> {
        debug!(id = outflow.id, "Updating outflow");

        let mut outflow = outflow.clone();
        outflow.recompute_totals()?;

        let mut tx = self.pool.begin().await?;

        let previous_document: Option<i64> =
            sqlx::query_scalar("SELECT sales_document_id FROM inventory_outflows WHERE id = ?1")
                .bind(outflow.id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(previous_document) = previous_document else {
            return Err(DbError::not_found("InventoryOutflow", outflow.id));
        };

        if !super::exists(&mut *tx, "sales_documents", outflow.sales_document_id).await? {
            return Err(DbError::not_found(
                "SalesDocument",
                outflow.sales_document_id,
            ));
        }

        sqlx::query(
            r#"
            UPDATE inventory_outflows SET
                quantity = ?2, unit_cost = ?3, total_cost = ?4,
                unit_sale_price = ?5, total_sale_value = ?6,
                user_id = ?7, product_id = ?8, sales_document_id = ?9
            WHERE id = ?1
            "#,
        )
        .bind(outflow.id)
        .bind(outflow.quantity)
        .bind(outflow.unit_cost)
        .bind(outflow.total_cost)
        .bind(outflow.unit_sale_price)
        .bind(outflow.total_sale_value)
        .bind(outflow.user_id)
        .bind(outflow.product_id)
        .bind(outflow.sales_document_id)
        .execute(&mut *tx)
        .await?;

        refresh_totals(&mut *tx, outflow.sales_document_id, vat_rate).await?;
        if previous_document != outflow.sales_document_id {
            refresh_totals(&mut *tx, previous_document, vat_rate).await?;
        }

        tx.commit().await?;
        Ok(outflow)
    }

    /// Deletes an outflow and re-derives its document's amounts.
    pub async fn delete(&self, id: i64, vat_rate: TaxRate) -> DbResult<()> {
        debug!(id, "Deleting outflow");

        let mut tx = self.pool.begin().await?;

        let document: Option<i64> =
            sqlx::query_scalar("SELECT sales_document_id FROM inventory_outflows WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(document) = document else {
            return Err(DbError::not_found("InventoryOutflow", id));
        };

        super::delete_guarded(&mut *tx, "InventoryOutflow", TABLE, id, &[]).await?;
        refresh_totals(&mut *tx, document, vat_rate).await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use crate::error::DbError;
    use bodega_core::{Money, OutflowLine, TaxRate};

    const VAT: TaxRate = TaxRate::from_bps(1900);

    fn line(ids: &Graph, quantity: f64, price: Option<i64>) -> OutflowLine {
        OutflowLine {
            user_id: ids.user_id,
            product_id: ids.product_id,
            quantity,
            unit_cost: Money::from_minor(500),
            unit_sale_price: price.map(Money::from_minor),
        }
    }

    #[tokio::test]
    async fn test_insert_rederives_document_totals() {
        let db = db().await;
        let ids = graph(&db).await;
        let (doc, _) = db
            .sales_documents()
            .insert(&new_document(1), &[], VAT)
            .await
            .unwrap();
        assert!(doc.total_amount.is_zero());

        let outflow = db
            .outflows()
            .insert(doc.id, &line(&ids, 2.0, Some(1190)), VAT)
            .await
            .unwrap();
        assert_eq!(outflow.total_cost.minor(), 1000);
        assert_eq!(outflow.total_sale_value, Some(Money::from_minor(2380)));

        let doc = db.sales_documents().get_by_id(doc.id).await.unwrap().unwrap();
        assert_eq!(doc.net_amount.minor(), 2000);
        assert_eq!(doc.vat_amount.minor(), 380);
        assert_eq!(doc.total_amount.minor(), 2380);
    }

    #[tokio::test]
    async fn test_update_moves_between_documents() {
        let db = db().await;
        let ids = graph(&db).await;
        let (first, outflows) = db
            .sales_documents()
            .insert(&new_document(1), &[line(&ids, 1.0, Some(1190))], VAT)
            .await
            .unwrap();
        let (second, _) = db
            .sales_documents()
            .insert(&new_document(2), &[], VAT)
            .await
            .unwrap();

        let mut outflow = outflows[0].clone();
        outflow.sales_document_id = second.id;
        outflow.quantity = 3.0;
        let updated = db.outflows().update(&outflow, VAT).await.unwrap();
        assert_eq!(updated.total_cost.minor(), 1500);
        assert_eq!(updated.total_sale_value, Some(Money::from_minor(3570)));

        let first = db.sales_documents().get_by_id(first.id).await.unwrap().unwrap();
        let second = db.sales_documents().get_by_id(second.id).await.unwrap().unwrap();
        assert!(first.total_amount.is_zero());
        assert_eq!(second.total_amount.minor(), 3570);
    }

    #[tokio::test]
    async fn test_delete_rederives_document_totals() {
        let db = db().await;
        let ids = graph(&db).await;
        let (doc, outflows) = db
            .sales_documents()
            .insert(
                &new_document(1),
                &[line(&ids, 1.0, Some(1190)), line(&ids, 1.0, Some(2380))],
                VAT,
            )
            .await
            .unwrap();
        assert_eq!(doc.total_amount.minor(), 3570);

        db.outflows().delete(outflows[1].id, VAT).await.unwrap();
        let doc = db.sales_documents().get_by_id(doc.id).await.unwrap().unwrap();
        assert_eq!(doc.total_amount.minor(), 1190);
        assert_eq!(db.outflows().list_by_document(doc.id).await.unwrap().len(), 1);

        assert!(matches!(
            db.outflows().delete(outflows[1].id, VAT).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_insert_against_missing_document() {
        let db = db().await;
        let ids = graph(&db).await;
        let err = db
            .outflows()
            .insert(42, &line(&ids, 1.0, None), VAT)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "SalesDocument"));
        assert!(db.outflows().list_by_product(ids.product_id).await.unwrap().is_empty());
    }
}
