//! # Category Repository

use bodega_core::Category;
use sqlx::SqlitePool;
use tracing::debug;

use super::Dependent;
use crate::error::{DbError, DbResult};

const TABLE: &str = "categories";
const UNIQUE: &[&str] = &["name"];
const DEPENDENTS: &[Dependent] = &[("products", "category_id")];

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Category>> {
        let category =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(category)
    }

    pub async fn exists(&self, id: i64) -> DbResult<bool> {
        super::exists(&self.pool, TABLE, id).await
    }

    pub async fn find_duplicate(&self, name: &str, exclude_id: Option<i64>) -> DbResult<Option<i64>> {
        super::find_duplicate(&self.pool, TABLE, UNIQUE, "name", name, exclude_id).await
    }

    pub async fn insert(&self, name: &str) -> DbResult<Category> {
        debug!(name, "Inserting category");

        let id = sqlx::query("INSERT INTO categories (name) VALUES (?1)")
            .bind(name)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        Ok(Category {
            id,
            name: name.to_string(),
        })
    }

    pub async fn update(&self, category: &Category) -> DbResult<Category> {
        debug!(id = category.id, "Updating category");

        let result = sqlx::query("UPDATE categories SET name = ?2 WHERE id = ?1")
            .bind(category.id)
            .bind(&category.name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", category.id));
        }
        Ok(category.clone())
    }

    /// Deletes a category. Refused while products belong to it.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting category");

        let mut tx = self.pool.begin().await?;
        super::delete_guarded(&mut *tx, "Category", TABLE, id, DEPENDENTS).await?;
        tx.commit().await?;
        Ok(())
    }
}
