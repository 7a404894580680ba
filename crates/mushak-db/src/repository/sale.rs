//! # Sale Repository
//!
//! Database operations for sales, with stock reservation.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. VALIDATE (pure, before any write)                                  │
//! │     └── validate_sale(draft) collects every problem at once            │
//! │                                                                         │
//! │  2. CREATE (single transaction)                                        │
//! │     └── insert sale header + lines                                     │
//! │     └── reserve stock per line (FIFO lots or ledger check)             │
//! │     └── any failure rolls the whole sale back                          │
//! │                                                                         │
//! │  3. (OPTIONAL) DELETE (single transaction)                             │
//! │     └── restore lots via recorded allocations                          │
//! │     └── remove the sale's stock entries                                │
//! │     └── delete lines + header                                          │
//! │                                                                         │
//! │  There is no partial state: a sale either fully exists with its        │
//! │  stock effects applied, or not at all.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::{product, stock};
use mushak_core::validation::validate_sale;
use mushak_core::{CoreError, NewSale, Period, Sale, SaleLine};

const SALE_COLUMNS: &str = "id, sale_date, invoice_no, customer_id, customer_name, \
     amount_type, total_value_poisha, notes, created_at, updated_at";

const LINE_COLUMNS: &str =
    "id, sale_id, product_id, unit, qty, unit_price_poisha, line_total_poisha";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Creates a sale and reserves stock for every line, atomically.
    ///
    /// ## Validation
    /// The draft is validated in full before the transaction opens;
    /// the error carries every problem found, not just the first.
    ///
    /// ## Stock Reservation
    /// Each line is depleted per its product's strategy: FIFO across
    /// BoE lots for lot-tracked products, a plain availability check
    /// against the stock ledger for the rest. Either way a qty_out
    /// ledger entry tagged with the sale id is appended.
    ///
    /// ## Errors
    /// * `Domain(InvalidSale)` - validation failures (nothing written)
    /// * `Domain(ProductNotFound)` - a line references a missing/inactive product
    /// * `Domain(InsufficientStock)` - any line short; whole sale rolls back
    /// * `UniqueViolation` - duplicate invoice number
    pub async fn create_sale(&self, draft: &NewSale) -> DbResult<Sale> {
        validate_sale(draft).map_err(DbError::Domain)?;

        let now = Utc::now();
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            sale_date: draft.sale_date,
            invoice_no: draft.invoice_no.trim().to_string(),
            customer_id: draft.customer_id.clone(),
            customer_name: draft.customer_name.clone(),
            amount_type: draft.amount_type,
            total_value_poisha: draft.effective_total_poisha(),
            notes: draft.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %sale.id, invoice_no = %sale.invoice_no, "Creating sale");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, sale_date, invoice_no, customer_id, customer_name,
                amount_type, total_value_poisha, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&sale.id)
        .bind(sale.sale_date)
        .bind(&sale.invoice_no)
        .bind(&sale.customer_id)
        .bind(&sale.customer_name)
        .bind(sale.amount_type)
        .bind(sale.total_value_poisha)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *tx)
        .await?;

        for line in &draft.lines {
            let product = product::fetch_active_tx(&mut tx, &line.product_id)
                .await?
                .ok_or_else(|| {
                    DbError::Domain(CoreError::ProductNotFound(line.product_id.clone()))
                })?;

            let line_id = Uuid::new_v4().to_string();

            sqlx::query(
                r#"
                INSERT INTO sale_lines (
                    id, sale_id, product_id, unit, qty, unit_price_poisha, line_total_poisha
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&line_id)
            .bind(&sale.id)
            .bind(&line.product_id)
            .bind(&line.unit)
            .bind(line.qty)
            .bind(line.unit_price_poisha)
            .bind(line.line_total_poisha())
            .execute(&mut *tx)
            .await?;

            stock::reserve_for_line_tx(
                &mut tx,
                &sale.id,
                &line_id,
                &product,
                line.qty,
                sale.sale_date,
                Some(&sale.invoice_no),
            )
            .await?;
        }

        tx.commit().await?;

        info!(
            id = %sale.id,
            invoice_no = %sale.invoice_no,
            lines = draft.lines.len(),
            "Sale created"
        );
        Ok(sale)
    }

    /// Deletes a sale and reverses all of its stock effects, atomically.
    ///
    /// FIFO draws are returned to their exact source lots via the
    /// recorded allocations, the sale's ledger entries are removed and
    /// the product stock caches adjusted back.
    pub async fn delete_sale(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM sales WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(DbError::Domain(CoreError::SaleNotFound(id.to_string())));
        }

        stock::restore_sale_stock_tx(&mut tx, id).await?;

        sqlx::query("DELETE FROM sale_lines WHERE sale_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, "Sale deleted, stock restored");
        Ok(())
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets a sale by invoice number.
    pub async fn get_by_invoice_no(&self, invoice_no: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE invoice_no = ?1"
        ))
        .bind(invoice_no)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets a sale's lines.
    pub async fn get_lines(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let lines = sqlx::query_as::<_, SaleLine>(&format!(
            "SELECT {LINE_COLUMNS} FROM sale_lines WHERE sale_id = ?1 ORDER BY id"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Lists all sales dated inside a period, oldest first.
    ///
    /// Date-range comparison works on the TEXT ISO dates: the period's
    /// first day is inclusive, the next period's first day exclusive.
    pub async fn list_for_period(&self, period: Period) -> DbResult<Vec<Sale>> {
        let from = format!("{:04}-{:02}-01", period.year(), period.month());
        let next = period.next();
        let to = format!("{:04}-{:02}-01", next.year(), next.month());

        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE sale_date >= ?1 AND sale_date < ?2 \
             ORDER BY sale_date, invoice_no"
        ))
        .bind(&from)
        .bind(&to)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }
}
