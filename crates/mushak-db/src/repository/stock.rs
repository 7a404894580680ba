//! # Stock Repository
//!
//! Database operations for the stock ledger and customs BoE lots.
//!
//! ## Two Depletion Strategies
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sale line for product P, quantity q                                   │
//! │       │                                                                 │
//! │       ├── P tracks BoE lots (footwear)                                 │
//! │       │     1. Load lot balances, FIFO order (boe_date, lot_id)        │
//! │       │     2. plan_fifo() → draws per lot                             │
//! │       │     3. Guarded UPDATE per lot (closing_pairs >= draw)          │
//! │       │     4. Record sale_lot_allocations for exact reversal          │
//! │       │     5. Append one qty_out stock entry                          │
//! │       │                                                                 │
//! │       └── P tracks quantity only (everything else)                     │
//! │             1. available = SUM(qty_in) - SUM(qty_out)                  │
//! │             2. check_ledger() → InsufficientStock on shortfall         │
//! │             3. Append one qty_out stock entry                          │
//! │                                                                         │
//! │  Both paths run inside the surrounding sale transaction.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guarded UPDATE in step 3 is the concurrency backstop: two sales
//! racing over the same lot both plan against the same snapshot, but
//! only one decrement can satisfy `closing_pairs >= draw`. The loser's
//! transaction rolls back with InsufficientStock.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::product;
use mushak_core::stock::{check_ledger, plan_fifo, LotBalance};
use mushak_core::validation::validate_quantity;
use mushak_core::{
    BoeLot, CoreError, DepletionStrategy, Product, SaleLotAllocation, StockEntry, StockEntryKind,
};

const LOT_COLUMNS: &str = "lot_id, product_id, boe_no, item_no, boe_date, opening_pairs, \
     closing_pairs, unit_purchase_cost_poisha, declared_unit_value_poisha, created_at";

const ENTRY_COLUMNS: &str =
    "id, product_id, entry_date, kind, qty_in, qty_out, sale_id, note, created_at";

/// Repository for stock ledger and BoE lot operations.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Stock ledger
    // -------------------------------------------------------------------------

    /// Appends a stock ledger entry and updates the product's cached
    /// stock, in one transaction.
    ///
    /// For opening stock, imports and manual adjustments. Sale
    /// movements are written by `SaleRepository::create_sale` instead.
    pub async fn record_entry(
        &self,
        product_id: &str,
        entry_date: NaiveDate,
        kind: StockEntryKind,
        qty_in: i64,
        qty_out: i64,
        note: Option<&str>,
    ) -> DbResult<StockEntry> {
        let mut tx = self.pool.begin().await?;

        let entry = insert_entry_tx(
            &mut tx,
            product_id,
            entry_date,
            kind,
            qty_in,
            qty_out,
            None,
            note,
        )
        .await?;
        adjust_cache_tx(&mut tx, product_id, qty_in - qty_out).await?;

        tx.commit().await?;
        Ok(entry)
    }

    /// Returns a product's available quantity per the stock ledger.
    pub async fn ledger_available(&self, product_id: &str) -> DbResult<i64> {
        let available: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(qty_in) - SUM(qty_out) FROM stock_entries WHERE product_id = ?1",
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(available.unwrap_or(0))
    }

    /// Lists a product's stock ledger entries, oldest first.
    pub async fn entries_for_product(&self, product_id: &str) -> DbResult<Vec<StockEntry>> {
        let entries = sqlx::query_as::<_, StockEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM stock_entries \
             WHERE product_id = ?1 ORDER BY entry_date, created_at"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    // -------------------------------------------------------------------------
    // BoE lots
    // -------------------------------------------------------------------------

    /// Registers a customs BoE lot and its opening stock entry.
    ///
    /// The lot id is derived as `{boe_no}-{item_no}`, so re-registering
    /// the same BoE line fails with a duplicate error instead of
    /// double-counting stock.
    pub async fn create_lot(
        &self,
        product_id: &str,
        boe_no: &str,
        item_no: i64,
        boe_date: NaiveDate,
        opening_pairs: i64,
        unit_purchase_cost_poisha: i64,
        declared_unit_value_poisha: i64,
    ) -> DbResult<BoeLot> {
        if opening_pairs < 0 {
            return Err(DbError::Domain(CoreError::Validation(
                mushak_core::ValidationError::MustBePositive {
                    field: "opening_pairs".to_string(),
                },
            )));
        }

        let lot = BoeLot {
            lot_id: BoeLot::derive_lot_id(boe_no, item_no),
            product_id: product_id.to_string(),
            boe_no: boe_no.to_string(),
            item_no,
            boe_date,
            opening_pairs,
            closing_pairs: opening_pairs,
            unit_purchase_cost_poisha,
            declared_unit_value_poisha,
            created_at: Utc::now(),
        };

        debug!(lot_id = %lot.lot_id, pairs = opening_pairs, "Creating BoE lot");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO boe_lots (
                lot_id, product_id, boe_no, item_no, boe_date,
                opening_pairs, closing_pairs,
                unit_purchase_cost_poisha, declared_unit_value_poisha, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&lot.lot_id)
        .bind(&lot.product_id)
        .bind(&lot.boe_no)
        .bind(lot.item_no)
        .bind(lot.boe_date)
        .bind(lot.opening_pairs)
        .bind(lot.closing_pairs)
        .bind(lot.unit_purchase_cost_poisha)
        .bind(lot.declared_unit_value_poisha)
        .bind(lot.created_at)
        .execute(&mut *tx)
        .await?;

        insert_entry_tx(
            &mut tx,
            product_id,
            boe_date,
            StockEntryKind::Import,
            opening_pairs,
            0,
            None,
            Some(&lot.lot_id),
        )
        .await?;
        adjust_cache_tx(&mut tx, product_id, opening_pairs).await?;

        tx.commit().await?;
        Ok(lot)
    }

    /// Gets a lot by its derived id.
    pub async fn get_lot(&self, lot_id: &str) -> DbResult<Option<BoeLot>> {
        let lot = sqlx::query_as::<_, BoeLot>(&format!(
            "SELECT {LOT_COLUMNS} FROM boe_lots WHERE lot_id = ?1"
        ))
        .bind(lot_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lot)
    }

    /// Lists a product's lots in FIFO order (boe_date, then lot_id).
    pub async fn lots_for_product(&self, product_id: &str) -> DbResult<Vec<BoeLot>> {
        let lots = sqlx::query_as::<_, BoeLot>(&format!(
            "SELECT {LOT_COLUMNS} FROM boe_lots \
             WHERE product_id = ?1 ORDER BY boe_date, lot_id"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lots)
    }

    /// Total remaining pairs across a product's lots.
    pub async fn lot_available(&self, product_id: &str) -> DbResult<i64> {
        let available: Option<i64> =
            sqlx::query_scalar("SELECT SUM(closing_pairs) FROM boe_lots WHERE product_id = ?1")
                .bind(product_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(available.unwrap_or(0))
    }

    // -------------------------------------------------------------------------
    // Reservation boundary
    // -------------------------------------------------------------------------

    /// Reserves stock for a sale outside of sale creation, in its own
    /// transaction.
    ///
    /// Dispatches on the product's depletion strategy (FIFO lots or
    /// ledger check), appends the qty_out entry tagged with `sale_id`
    /// and keeps the stock cache in step. `SaleRepository::create_sale`
    /// runs the same code path per line inside its own transaction.
    ///
    /// ## Errors
    /// * `Domain(ProductNotFound)` - unknown or inactive product
    /// * `Domain(InsufficientStock)` - nothing reserved on shortfall
    pub async fn reserve_stock(
        &self,
        sale_id: &str,
        product_id: &str,
        qty: i64,
        entry_date: NaiveDate,
    ) -> DbResult<()> {
        validate_quantity(qty)
            .map_err(|e| DbError::Domain(CoreError::Validation(e)))?;

        let mut tx = self.pool.begin().await?;

        let product = product::fetch_active_tx(&mut tx, product_id)
            .await?
            .ok_or_else(|| DbError::Domain(CoreError::ProductNotFound(product_id.to_string())))?;

        // Direct reservations have no sale line; allocations reference
        // the reservation itself so the reversal stays exact.
        reserve_for_line_tx(&mut tx, sale_id, sale_id, &product, qty, entry_date, None).await?;

        tx.commit().await?;

        debug!(sale_id = %sale_id, product_id = %product_id, qty, "Stock reserved");
        Ok(())
    }

    /// Reverses every stock effect recorded under a sale id, in its
    /// own transaction: lots refilled via the recorded allocations,
    /// qty_out entries removed, cache adjusted back.
    pub async fn restore_stock(&self, sale_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        restore_sale_stock_tx(&mut tx, sale_id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Lists the lot allocations recorded for a sale.
    pub async fn allocations_for_sale(&self, sale_id: &str) -> DbResult<Vec<SaleLotAllocation>> {
        let allocations = sqlx::query_as::<_, SaleLotAllocation>(
            "SELECT id, sale_id, sale_line_id, lot_id, pairs \
             FROM sale_lot_allocations WHERE sale_id = ?1 ORDER BY id",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(allocations)
    }
}

// =============================================================================
// Transaction-scoped helpers (shared with SaleRepository)
// =============================================================================

/// Appends a stock entry on an open transaction. Does not touch the
/// product stock cache; callers pair it with `adjust_cache_tx`.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn insert_entry_tx(
    conn: &mut SqliteConnection,
    product_id: &str,
    entry_date: NaiveDate,
    kind: StockEntryKind,
    qty_in: i64,
    qty_out: i64,
    sale_id: Option<&str>,
    note: Option<&str>,
) -> DbResult<StockEntry> {
    let entry = StockEntry {
        id: Uuid::new_v4().to_string(),
        product_id: product_id.to_string(),
        entry_date,
        kind,
        qty_in,
        qty_out,
        sale_id: sale_id.map(str::to_string),
        note: note.map(str::to_string),
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO stock_entries (
            id, product_id, entry_date, kind, qty_in, qty_out, sale_id, note, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.product_id)
    .bind(entry.entry_date)
    .bind(entry.kind)
    .bind(entry.qty_in)
    .bind(entry.qty_out)
    .bind(&entry.sale_id)
    .bind(&entry.note)
    .bind(entry.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(entry)
}

/// Applies a signed delta to a product's cached stock.
pub(crate) async fn adjust_cache_tx(
    conn: &mut SqliteConnection,
    product_id: &str,
    delta: i64,
) -> DbResult<()> {
    sqlx::query(
        "UPDATE products SET stock_on_hand = stock_on_hand + ?1, updated_at = ?2 WHERE id = ?3",
    )
    .bind(delta)
    .bind(Utc::now())
    .bind(product_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Sum of the stock ledger for a product, on an open transaction.
pub(crate) async fn ledger_available_tx(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> DbResult<i64> {
    let available: Option<i64> = sqlx::query_scalar(
        "SELECT SUM(qty_in) - SUM(qty_out) FROM stock_entries WHERE product_id = ?1",
    )
    .bind(product_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(available.unwrap_or(0))
}

/// Reserves stock for one sale line on an open transaction.
///
/// Dispatches on the product's depletion strategy, then appends the
/// qty_out ledger entry and adjusts the stock cache. The shared path
/// under both `StockRepository::reserve_stock` and
/// `SaleRepository::create_sale`.
pub(crate) async fn reserve_for_line_tx(
    conn: &mut SqliteConnection,
    sale_id: &str,
    sale_line_id: &str,
    product: &Product,
    qty: i64,
    entry_date: NaiveDate,
    note: Option<&str>,
) -> DbResult<()> {
    match product.depletion_strategy() {
        DepletionStrategy::FifoLots => {
            deplete_lots_fifo_tx(conn, sale_id, sale_line_id, &product.id, qty).await?;
        }
        DepletionStrategy::Ledger => {
            let available = ledger_available_tx(conn, &product.id).await?;
            check_ledger(&product.id, available, qty).map_err(DbError::Domain)?;
        }
    }

    insert_entry_tx(
        conn,
        &product.id,
        entry_date,
        StockEntryKind::Sale,
        0,
        qty,
        Some(sale_id),
        note,
    )
    .await?;
    adjust_cache_tx(conn, &product.id, -qty).await?;

    Ok(())
}

/// Depletes a product's lots FIFO for one sale line.
///
/// Plans against the current balances, then applies each draw with a
/// guarded decrement. A concurrent transaction that emptied a lot
/// between plan and apply makes the guard miss, and the whole sale
/// rolls back as InsufficientStock.
pub(crate) async fn deplete_lots_fifo_tx(
    conn: &mut SqliteConnection,
    sale_id: &str,
    sale_line_id: &str,
    product_id: &str,
    requested: i64,
) -> DbResult<Vec<SaleLotAllocation>> {
    let balances = sqlx::query_as::<_, LotBalance>(
        "SELECT lot_id, closing_pairs FROM boe_lots \
         WHERE product_id = ?1 ORDER BY boe_date, lot_id",
    )
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;

    let draws = plan_fifo(&balances, product_id, requested).map_err(DbError::Domain)?;

    let mut allocations = Vec::with_capacity(draws.len());
    for draw in draws {
        let result = sqlx::query(
            "UPDATE boe_lots SET closing_pairs = closing_pairs - ?1 \
             WHERE lot_id = ?2 AND closing_pairs >= ?1",
        )
        .bind(draw.pairs)
        .bind(&draw.lot_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            // Lost a race against another depletion since planning.
            let available: Option<i64> =
                sqlx::query_scalar("SELECT SUM(closing_pairs) FROM boe_lots WHERE product_id = ?1")
                    .bind(product_id)
                    .fetch_one(&mut *conn)
                    .await?;
            return Err(DbError::Domain(CoreError::InsufficientStock {
                product_id: product_id.to_string(),
                available: available.unwrap_or(0),
                requested,
            }));
        }

        let allocation = SaleLotAllocation {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.to_string(),
            sale_line_id: sale_line_id.to_string(),
            lot_id: draw.lot_id,
            pairs: draw.pairs,
        };

        sqlx::query(
            "INSERT INTO sale_lot_allocations (id, sale_id, sale_line_id, lot_id, pairs) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&allocation.id)
        .bind(&allocation.sale_id)
        .bind(&allocation.sale_line_id)
        .bind(&allocation.lot_id)
        .bind(allocation.pairs)
        .execute(&mut *conn)
        .await?;

        allocations.push(allocation);
    }

    Ok(allocations)
}

/// Reverses a sale's stock effects on an open transaction.
///
/// Returns lot pairs to their source lots via the recorded
/// allocations, deletes the allocations, removes the sale's stock
/// entries and gives the quantities back to the product cache.
pub(crate) async fn restore_sale_stock_tx(
    conn: &mut SqliteConnection,
    sale_id: &str,
) -> DbResult<()> {
    let allocations = sqlx::query_as::<_, SaleLotAllocation>(
        "SELECT id, sale_id, sale_line_id, lot_id, pairs \
         FROM sale_lot_allocations WHERE sale_id = ?1",
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    for allocation in &allocations {
        sqlx::query("UPDATE boe_lots SET closing_pairs = closing_pairs + ?1 WHERE lot_id = ?2")
            .bind(allocation.pairs)
            .bind(&allocation.lot_id)
            .execute(&mut *conn)
            .await?;
    }

    sqlx::query("DELETE FROM sale_lot_allocations WHERE sale_id = ?1")
        .bind(sale_id)
        .execute(&mut *conn)
        .await?;

    let entries = sqlx::query_as::<_, StockEntry>(&format!(
        "SELECT {ENTRY_COLUMNS} FROM stock_entries WHERE sale_id = ?1"
    ))
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    for entry in &entries {
        adjust_cache_tx(conn, &entry.product_id, entry.qty_out - entry.qty_in).await?;
    }

    sqlx::query("DELETE FROM stock_entries WHERE sale_id = ?1")
        .bind(sale_id)
        .execute(&mut *conn)
        .await?;

    debug!(
        sale_id = %sale_id,
        allocations = allocations.len(),
        entries = entries.len(),
        "Sale stock restored"
    );

    Ok(())
}
