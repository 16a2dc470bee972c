//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD operations
//! - Lookup by SKU or barcode (both unique)
//! - Sale price lookup for outflow lines that don't carry their own
//!
//! ## Identity Columns
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products                                                               │
//! │                                                                         │
//! │  id │ sku      │ barcode        │ description            │ category    │
//! │  ───┼──────────┼────────────────┼────────────────────────┼──────────── │
//! │   1 │ BEV-001  │ 7801234567890  │ Sparkling water 500ml  │ 1           │
//! │   2 │ BEV-002  │ 7801234567906  │ Cola 1.5L              │ 1           │
//! │                                                                         │
//! │  sku and barcode each have a UNIQUE index. A colliding create or       │
//! │  update is rejected together with the product already holding it.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bodega_core::{Money, NewProduct, Product};
use sqlx::SqlitePool;
use tracing::debug;

use super::Dependent;
use crate::error::{DbError, DbResult};

const TABLE: &str = "products";
const DEPENDENTS: &[Dependent] = &[
    ("inventory_inflows", "product_id"),
    ("inventory_outflows", "product_id"),
];

const SELECT: &str = r#"
    SELECT id, sku, description, barcode, delivery_unit,
           unit_sale_price, contribution_margin, category_id
    FROM products
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// if let Some(existing) = repo.get_by_sku("BEV-001").await? {
///     // reject, reporting `existing`
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!("{SELECT} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    pub async fn list_by_category(&self, category_id: i64) -> DbResult<Vec<Product>> {
        let products =
            sqlx::query_as::<_, Product>(&format!("{SELECT} WHERE category_id = ?1 ORDER BY id"))
                .bind(category_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(products)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!("{SELECT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Gets a product by SKU (exact match).
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!("{SELECT} WHERE sku = ?1"))
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Gets a product by barcode (exact match).
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!("{SELECT} WHERE barcode = ?1"))
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    pub async fn exists(&self, id: i64) -> DbResult<bool> {
        super::exists(&self.pool, TABLE, id).await
    }

    /// The product's configured sale price.
    ///
    /// `Ok(None)` both when the product has no price and when it doesn't
    /// exist; callers check existence separately.
    pub async fn unit_sale_price(&self, id: i64) -> DbResult<Option<Money>> {
        let price: Option<Option<Money>> =
            sqlx::query_scalar("SELECT unit_sale_price FROM products WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(price.flatten())
    }

    /// Inserts a new product.
    pub async fn insert(&self, new: &NewProduct) -> DbResult<Product> {
        debug!(sku = %new.sku, "Inserting product");

        let id = sqlx::query(
            r#"
            INSERT INTO products (
                sku, description, barcode, delivery_unit,
                unit_sale_price, contribution_margin, category_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&new.sku)
        .bind(&new.description)
        .bind(&new.barcode)
        .bind(&new.delivery_unit)
        .bind(new.unit_sale_price)
        .bind(new.contribution_margin)
        .bind(new.category_id)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Product {
            id,
            sku: new.sku.clone(),
            description: new.description.clone(),
            barcode: new.barcode.clone(),
            delivery_unit: new.delivery_unit.clone(),
            unit_sale_price: new.unit_sale_price,
            contribution_margin: new.contribution_margin,
            category_id: new.category_id,
        })
    }

    /// Updates an existing product.
    pub async fn update(&self, product: &Product) -> DbResult<Product> {
        debug!(id = product.id, sku = %product.sku, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                sku = ?2, description = ?3, barcode = ?4, delivery_unit = ?5,
                unit_sale_price = ?6, contribution_margin = ?7, category_id = ?8
            WHERE id = ?1
            "#,
        )
        .bind(product.id)
        .bind(&product.sku)
        .bind(&product.description)
        .bind(&product.barcode)
        .bind(&product.delivery_unit)
        .bind(product.unit_sale_price)
        .bind(product.contribution_margin)
        .bind(product.category_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product.id));
        }
        Ok(product.clone())
    }

    /// Deletes a product. Refused while any inventory movement names it.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting product");

        let mut tx = self.pool.begin().await?;
        super::delete_guarded(&mut *tx, "Product", TABLE, id, DEPENDENTS).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Gets total product count.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
