//! # Supplier Repository

use bodega_core::{NewSupplier, Supplier};
use sqlx::SqlitePool;
use tracing::debug;

use super::{Dependent, UNIQUE_TAX_AND_LEGAL};
use crate::error::{DbError, DbResult};

const TABLE: &str = "suppliers";
const DEPENDENTS: &[Dependent] = &[("purchase_invoices", "supplier_id")];

const SELECT: &str = r#"
    SELECT id, name, tax_id, legal_name, industry, address, bank_account, bank_name
    FROM suppliers
"#;

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(&format!("{SELECT} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(suppliers)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>(&format!("{SELECT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(supplier)
    }

    pub async fn exists(&self, id: i64) -> DbResult<bool> {
        super::exists(&self.pool, TABLE, id).await
    }

    pub async fn find_duplicate(
        &self,
        column: &'static str,
        value: &str,
        exclude_id: Option<i64>,
    ) -> DbResult<Option<i64>> {
        super::find_duplicate(&self.pool, TABLE, UNIQUE_TAX_AND_LEGAL, column, value, exclude_id)
            .await
    }

    pub async fn insert(&self, new: &NewSupplier) -> DbResult<Supplier> {
        debug!(tax_id = %new.tax_id, "Inserting supplier");

        let id = sqlx::query(
            r#"
            INSERT INTO suppliers (
                name, tax_id, legal_name, industry, address, bank_account, bank_name
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&new.name)
        .bind(&new.tax_id)
        .bind(&new.legal_name)
        .bind(&new.industry)
        .bind(&new.address)
        .bind(&new.bank_account)
        .bind(&new.bank_name)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Supplier {
            id,
            name: new.name.clone(),
            tax_id: new.tax_id.clone(),
            legal_name: new.legal_name.clone(),
            industry: new.industry.clone(),
            address: new.address.clone(),
            bank_account: new.bank_account.clone(),
            bank_name: new.bank_name.clone(),
        })
    }

    pub async fn update(&self, supplier: &Supplier) -> DbResult<Supplier> {
        debug!(id = supplier.id, "Updating supplier");

        let result = sqlx::query(
            r#"
            UPDATE suppliers SET
                name = ?2, tax_id = ?3, legal_name = ?4, industry = ?5,
                address = ?6, bank_account = ?7, bank_name = ?8
            WHERE id = ?1
            "#,
        )
        .bind(supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.tax_id)
        .bind(&supplier.legal_name)
        .bind(&supplier.industry)
        .bind(&supplier.address)
        .bind(&supplier.bank_account)
        .bind(&supplier.bank_name)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", supplier.id));
        }
        Ok(supplier.clone())
    }

    /// Deletes a supplier. Refused while purchase invoices reference it.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting supplier");

        let mut tx = self.pool.begin().await?;
        super::delete_guarded(&mut *tx, "Supplier", TABLE, id, DEPENDENTS).await?;
        tx.commit().await?;
        Ok(())
    }
}
