//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Stock Cache
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products.stock_on_hand is a CACHE                                     │
//! │                                                                         │
//! │  stock_entries (append-only ledger)  ← source of truth                 │
//! │       │                                                                 │
//! │       │  SUM(qty_in) - SUM(qty_out)                                    │
//! │       ▼                                                                 │
//! │  products.stock_on_hand              ← fast reads for listings         │
//! │                                                                         │
//! │  Writers keep the cache in step; rebuild_stock_cache() recomputes      │
//! │  it from the ledger when the two ever disagree.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use mushak_core::{Product, ProductCategory};

const PRODUCT_COLUMNS: &str = "id, name, category, unit, cost_ex_vat_poisha, \
     sell_ex_vat_poisha, tests_per_kit, stock_on_hand, is_active, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Creates a new product with a generated UUID.
    ///
    /// Stock starts at zero; opening stock arrives through the stock
    /// ledger (`StockRepository::record_entry`) so cache and ledger
    /// agree from day one.
    pub async fn create(
        &self,
        name: &str,
        category: ProductCategory,
        unit: &str,
        cost_ex_vat_poisha: i64,
        sell_ex_vat_poisha: i64,
        tests_per_kit: Option<i64>,
    ) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            category,
            unit: unit.to_string(),
            cost_ex_vat_poisha,
            sell_ex_vat_poisha,
            tests_per_kit,
            stock_on_hand: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.insert(&product).await?;
        Ok(product)
    }

    /// Inserts a complete product row.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, unit,
                cost_ex_vat_poisha, sell_ex_vat_poisha, tests_per_kit,
                stock_on_hand, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.category)
        .bind(&product.unit)
        .bind(product.cost_ex_vat_poisha)
        .bind(product.sell_ex_vat_poisha)
        .bind(product.tests_per_kit)
        .bind(product.stock_on_hand)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists all active products, ordered by name.
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Updates a product's catalog fields (name, unit, prices).
    ///
    /// Stock and category are deliberately excluded: stock changes go
    /// through the ledger, and changing a category would silently switch
    /// the depletion strategy under existing lots.
    pub async fn update(&self, product: &Product) -> DbResult<u64> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = ?1,
                unit = ?2,
                cost_ex_vat_poisha = ?3,
                sell_ex_vat_poisha = ?4,
                tests_per_kit = ?5,
                updated_at = ?6
            WHERE id = ?7
            "#,
        )
        .bind(&product.name)
        .bind(&product.unit)
        .bind(product.cost_ex_vat_poisha)
        .bind(product.sell_ex_vat_poisha)
        .bind(product.tests_per_kit)
        .bind(Utc::now())
        .bind(&product.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Soft-deletes a product (sets is_active = 0).
    ///
    /// Rows stay in place so historical sales keep a valid product_id.
    pub async fn soft_delete(&self, id: &str) -> DbResult<u64> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?1 WHERE id = ?2",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Recomputes `stock_on_hand` from the stock ledger.
    ///
    /// ## Returns
    /// The recomputed quantity.
    pub async fn rebuild_stock_cache(&self, product_id: &str) -> DbResult<i64> {
        let computed: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(qty_in) - SUM(qty_out) FROM stock_entries WHERE product_id = ?1",
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;
        let computed = computed.unwrap_or(0);

        sqlx::query("UPDATE products SET stock_on_hand = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(computed)
            .bind(Utc::now())
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        info!(product_id = %product_id, stock = computed, "Stock cache rebuilt");
        Ok(computed)
    }
}

// =============================================================================
// Transaction-scoped helpers
// =============================================================================

/// Fetches an active product on an open connection.
pub(crate) async fn fetch_active_tx(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND is_active = 1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}
