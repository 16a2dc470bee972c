//! # Cash Reconciliation Repository
//!
//! End-of-shift register counts. `cash_difference` is stored but never taken
//! from input:
//!
//! ```text
//! expected drawer = opening_amount + cash_amount
//! cash_difference = closing_amount − expected drawer
//! ```
//!
//! Card and transfer collections are recorded for the report only; they
//! never reach the drawer.

use bodega_core::{CashReconciliation, NewCashReconciliation};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

const TABLE: &str = "cash_reconciliations";

const SELECT: &str = r#"
    SELECT id, operator_id, administrator_id, opened_at, closed_at,
           opening_amount, transfer_amount, cash_amount, card_amount,
           closing_amount, cash_difference
    FROM cash_reconciliations
"#;

/// Repository for cash reconciliation database operations.
#[derive(Debug, Clone)]
pub struct CashReconciliationRepository {
    pool: SqlitePool,
}

impl CashReconciliationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CashReconciliationRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<CashReconciliation>> {
        let rows = sqlx::query_as::<_, CashReconciliation>(&format!("{SELECT} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Shifts run by one operator, most recent first.
    pub async fn list_by_operator(&self, operator_id: i64) -> DbResult<Vec<CashReconciliation>> {
        let rows = sqlx::query_as::<_, CashReconciliation>(&format!(
            "{SELECT} WHERE operator_id = ?1 ORDER BY opened_at DESC, id DESC"
        ))
        .bind(operator_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Shifts signed off by one administrator, most recent first.
    pub async fn list_by_administrator(
        &self,
        administrator_id: i64,
    ) -> DbResult<Vec<CashReconciliation>> {
        let rows = sqlx::query_as::<_, CashReconciliation>(&format!(
            "{SELECT} WHERE administrator_id = ?1 ORDER BY opened_at DESC, id DESC"
        ))
        .bind(administrator_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<CashReconciliation>> {
        let row = sqlx::query_as::<_, CashReconciliation>(&format!("{SELECT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn exists(&self, id: i64) -> DbResult<bool> {
        super::exists(&self.pool, TABLE, id).await
    }

    pub async fn insert(&self, new: &NewCashReconciliation) -> DbResult<CashReconciliation> {
        let cash_difference = new.cash_difference()?;
        debug!(
            operator_id = new.operator_id,
            administrator_id = new.administrator_id,
            "Inserting cash reconciliation"
        );

        let id = sqlx::query(
            r#"
            INSERT INTO cash_reconciliations (
                operator_id, administrator_id, opened_at, closed_at,
                opening_amount, transfer_amount, cash_amount, card_amount,
                closing_amount, cash_difference
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(new.operator_id)
        .bind(new.administrator_id)
        .bind(new.opened_at)
        .bind(new.closed_at)
        .bind(new.opening_amount)
        .bind(new.transfer_amount)
        .bind(new.cash_amount)
        .bind(new.card_amount)
        .bind(new.closing_amount)
        .bind(cash_difference)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        if !cash_difference.is_zero() {
            info!(
                id,
                operator_id = new.operator_id,
                difference = cash_difference.minor(),
                "Register count does not match expected drawer"
            );
        }

        Ok(CashReconciliation {
            id,
            operator_id: new.operator_id,
            administrator_id: new.administrator_id,
            opened_at: new.opened_at,
            closed_at: new.closed_at,
            opening_amount: new.opening_amount,
            transfer_amount: new.transfer_amount,
            cash_amount: new.cash_amount,
            card_amount: new.card_amount,
            closing_amount: new.closing_amount,
            cash_difference,
        })
    }

    /// Writes `reconciliation` with its difference recomputed.
    pub async fn update(&self, reconciliation: &CashReconciliation) -> DbResult<CashReconciliation> {
        debug!(id = reconciliation.id, "Updating cash reconciliation");

        let mut reconciliation = reconciliation.clone();
        reconciliation.recompute_difference()?;

        let result = sqlx::query(
            r#"
            UPDATE cash_reconciliations SET
                operator_id = ?2, administrator_id = ?3, opened_at = ?4, closed_at = ?5,
                opening_amount = ?6, transfer_amount = ?7, cash_amount = ?8,
                card_amount = ?9, closing_amount = ?10, cash_difference = ?11
            WHERE id = ?1
            "#,
        )
        .bind(reconciliation.id)
        .bind(reconciliation.operator_id)
        .bind(reconciliation.administrator_id)
        .bind(reconciliation.opened_at)
        .bind(reconciliation.closed_at)
        .bind(reconciliation.opening_amount)
        .bind(reconciliation.transfer_amount)
        .bind(reconciliation.cash_amount)
        .bind(reconciliation.card_amount)
        .bind(reconciliation.closing_amount)
        .bind(reconciliation.cash_difference)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("CashReconciliation", reconciliation.id));
        }
        Ok(reconciliation)
    }

    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting cash reconciliation");

        let mut tx = self.pool.begin().await?;
        super::delete_guarded(&mut *tx, "CashReconciliation", TABLE, id, &[]).await?;
        tx.commit().await?;
        Ok(())
    }
}
