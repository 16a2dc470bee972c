//! # Company Repository
//!
//! Companies own users; a company with users can't be deleted.

use bodega_core::{Company, NewCompany};
use sqlx::SqlitePool;
use tracing::debug;

use super::{Dependent, UNIQUE_TAX_AND_LEGAL};
use crate::error::{DbError, DbResult};

const TABLE: &str = "companies";
const DEPENDENTS: &[Dependent] = &[("users", "company_id")];

const SELECT: &str = "SELECT id, name, tax_id, legal_name, industry FROM companies";

/// Repository for company database operations.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    pool: SqlitePool,
}

impl CompanyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CompanyRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<Company>> {
        let companies = sqlx::query_as::<_, Company>(&format!("{SELECT} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(companies)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Company>> {
        let company = sqlx::query_as::<_, Company>(&format!("{SELECT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }

    pub async fn exists(&self, id: i64) -> DbResult<bool> {
        super::exists(&self.pool, TABLE, id).await
    }

    /// Another company holding `value` in `column` (`tax_id` or `legal_name`).
    pub async fn find_duplicate(
        &self,
        column: &'static str,
        value: &str,
        exclude_id: Option<i64>,
    ) -> DbResult<Option<i64>> {
        super::find_duplicate(&self.pool, TABLE, UNIQUE_TAX_AND_LEGAL, column, value, exclude_id)
            .await
    }

    pub async fn insert(&self, new: &NewCompany) -> DbResult<Company> {
        debug!(tax_id = %new.tax_id, "Inserting company");

        let id = sqlx::query(
            "INSERT INTO companies (name, tax_id, legal_name, industry) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&new.name)
        .bind(&new.tax_id)
        .bind(&new.legal_name)
        .bind(&new.industry)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Company {
            id,
            name: new.name.clone(),
            tax_id: new.tax_id.clone(),
            legal_name: new.legal_name.clone(),
            industry: new.industry.clone(),
        })
    }

    /// Writes every column of `company`.
    pub async fn update(&self, company: &Company) -> DbResult<Company> {
        debug!(id = company.id, "Updating company");

        let result = sqlx::query(
            "UPDATE companies SET name = ?2, tax_id = ?3, legal_name = ?4, industry = ?5 WHERE id = ?1",
        )
        .bind(company.id)
        .bind(&company.name)
        .bind(&company.tax_id)
        .bind(&company.legal_name)
        .bind(&company.industry)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Company", company.id));
        }
        Ok(company.clone())
    }

    /// Deletes a company. Refused while users belong to it.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting company");

        let mut tx = self.pool.begin().await?;
        super::delete_guarded(&mut *tx, "Company", TABLE, id, DEPENDENTS).await?;
        tx.commit().await?;
        Ok(())
    }
}
