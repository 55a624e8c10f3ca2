//! # Product Repository
//!
//! Catalog CRUD. Stock is never written here: a new product gets a zero
//! counter row, and every later change goes through the ledger.
//!
//! ## Read Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products p                                                             │
//! │    LEFT JOIN brands           → brand_name                              │
//! │    LEFT JOIN categories       → category_name                           │
//! │    LEFT JOIN units_of_measure → unit_name                               │
//! │    LEFT JOIN stock_levels     → current_stock (0 when missing)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use ruedas_core::entities::{non_blank, NewProduct, Product, ProductUpdate};
use ruedas_core::GeneralStatus;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::uow::UnitOfWork;

pub(crate) const PRODUCT_SELECT: &str = r#"
    SELECT
        p.id,
        p.name,
        p.barcode,
        p.description,
        p.purchase_price_cents,
        p.sale_price_cents,
        p.stock_min,
        p.stock_max,
        p.brand_id,
        b.name AS brand_name,
        p.category_id,
        c.name AS category_name,
        p.unit_id,
        u.name AS unit_name,
        COALESCE(s.quantity, 0) AS current_stock,
        p.status_id AS status,
        p.created_at
    FROM products p
    LEFT JOIN brands b ON b.id = p.brand_id
    LEFT JOIN categories c ON c.id = p.category_id
    LEFT JOIN units_of_measure u ON u.id = p.unit_id
    LEFT JOIN stock_levels s ON s.product_id = p.id
"#;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Active products ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let sql = format!("{PRODUCT_SELECT} WHERE p.status_id = ?1 ORDER BY p.name");
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(GeneralStatus::Active.id())
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets a product by id, whatever its status.
    pub async fn get(&self, id: i64) -> DbResult<Product> {
        let sql = format!("{PRODUCT_SELECT} WHERE p.id = ?1");
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Inserts a product together with its zero stock counter.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - barcode already exists
    /// * `Err(DbError::ForeignKeyViolation)` - unknown brand, category or unit
    pub async fn create(&self, product: &NewProduct) -> DbResult<Product> {
        product.validate()?;
        debug!(name = %product.name, "Creating product");

        let mut uow = UnitOfWork::begin(&self.pool, "create_product").await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO products (
                name, barcode, description,
                purchase_price_cents, sale_price_cents,
                stock_min, stock_max,
                brand_id, category_id, unit_id,
                status_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            RETURNING id
            "#,
        )
        .bind(product.name.trim())
        .bind(non_blank(&product.barcode))
        .bind(non_blank(&product.description))
        .bind(product.purchase_price_cents)
        .bind(product.sale_price_cents)
        .bind(product.stock_min)
        .bind(product.stock_max)
        .bind(product.brand_id)
        .bind(product.category_id)
        .bind(product.unit_id)
        .bind(GeneralStatus::Active.id())
        .bind(Utc::now())
        .fetch_one(uow.conn()?)
        .await?;

        sqlx::query("INSERT INTO stock_levels (product_id, quantity) VALUES (?1, 0)")
            .bind(id)
            .execute(uow.conn()?)
            .await?;

        uow.commit().await?;

        debug!(id, "Product created");
        self.get(id).await
    }

    /// Applies a partial update; absent fields keep their value.
    pub async fn update(&self, id: i64, update: &ProductUpdate) -> DbResult<Product> {
        update.validate()?;
        debug!(id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = COALESCE(?2, name),
                barcode = COALESCE(?3, barcode),
                description = COALESCE(?4, description),
                purchase_price_cents = COALESCE(?5, purchase_price_cents),
                sale_price_cents = COALESCE(?6, sale_price_cents),
                stock_min = COALESCE(?7, stock_min),
                stock_max = COALESCE(?8, stock_max),
                brand_id = COALESCE(?9, brand_id),
                category_id = COALESCE(?10, category_id),
                unit_id = COALESCE(?11, unit_id)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(non_blank(&update.barcode))
        .bind(non_blank(&update.description))
        .bind(update.purchase_price_cents)
        .bind(update.sale_price_cents)
        .bind(update.stock_min)
        .bind(update.stock_max)
        .bind(update.brand_id)
        .bind(update.category_id)
        .bind(update.unit_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get(id).await
    }

    /// Soft-deletes a product (status = inactive). Sales keep referencing it.
    pub async fn deactivate(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deactivating product");

        let result = sqlx::query("UPDATE products SET status_id = ?2 WHERE id = ?1")
            .bind(id)
            .bind(GeneralStatus::Inactive.id())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Active products at or below their minimum, lowest stock first.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "{PRODUCT_SELECT} WHERE p.status_id = ?1 AND COALESCE(s.quantity, 0) <= p.stock_min ORDER BY current_stock, p.name"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(GeneralStatus::Active.id())
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
