//! # VAT Ledger Repository
//!
//! Monthly VAT computation and the finalized ledger entries.
//!
//! ## Save Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  save(figures)                   (single transaction)                  │
//! │                                                                         │
//! │  Figures come from the caller (via compute_period); save reconciles   │
//! │  and persists, it does not re-derive the aggregates.                   │
//! │                                                                         │
//! │  1. Existing entry for period?                                         │
//! │     └── yes: give its used credit back to the balance chain first      │
//! │                                                                         │
//! │  2. Find the credit source row:                                        │
//! │     period's own closing_balances row, else the previous period's      │
//! │                                                                         │
//! │  3. used = min(vat_payable, source.closing)   (never negative)         │
//! │     treasury_needed = vat_payable - used                                │
//! │     (recomputed here so a stale preview cannot overdraw the chain)     │
//! │                                                                         │
//! │  4. Upsert vat_ledger row, locked = 1                                  │
//! │                                                                         │
//! │  5. source.used_amount += used → closing recomputed → one-hop          │
//! │     propagation to the next month's opening                            │
//! │                                                                         │
//! │  Invariant: after save, closing = opening + addition - used holds      │
//! │  on the source row, and saving twice is the same as saving once.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `locked` is stored but not enforced here: whether a locked period
//! may be recomputed is a policy question for the calling layer.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::closing_balance;
use mushak_core::vat::{aggregate, treasury_needed, usable_credit, PeriodTotals};
use mushak_core::{CoreError, Money, Period, Sale, Settings, VatLedgerEntry, VatRate};

const ENTRY_COLUMNS: &str = "id, period_year, period_month, gross_sales_poisha, \
     net_sales_ex_vat_poisha, vat_rate_bps, vat_payable_poisha, \
     used_from_closing_balance_poisha, treasury_needed_poisha, locked, created_at, updated_at";

const SALE_COLUMNS: &str = "id, sale_date, invoice_no, customer_id, customer_name, \
     amount_type, total_value_poisha, notes, created_at, updated_at";

/// A period's VAT position, computed but not persisted.
///
/// `compute_period` returns this for preview screens; `save` takes it
/// back and persists it as a `VatLedgerEntry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VatComputation {
    pub period_year: i32,
    pub period_month: u32,
    pub totals: PeriodTotals,
    pub vat_rate_bps: u32,
    pub vat_payable_poisha: i64,
    pub available_credit_poisha: i64,
    pub used_from_closing_balance_poisha: i64,
    pub treasury_needed_poisha: i64,
}

/// Repository for VAT ledger operations.
#[derive(Debug, Clone)]
pub struct VatLedgerRepository {
    pool: SqlitePool,
}

impl VatLedgerRepository {
    /// Creates a new VatLedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        VatLedgerRepository { pool }
    }

    /// Computes a period's VAT position without persisting anything.
    ///
    /// The VAT rate comes from the supplied settings snapshot, never
    /// from ambient state.
    pub async fn compute_period(
        &self,
        period: Period,
        settings: &Settings,
    ) -> DbResult<VatComputation> {
        let mut conn = self.pool.acquire().await?;
        compute_tx(&mut conn, period, settings.vat_rate()).await
    }

    /// Persists a period's VAT entry from already-computed figures,
    /// consuming closing balance credit. Idempotent: re-saving first
    /// reverses the previous entry's credit usage.
    ///
    /// The aggregates (gross, net, VAT payable) are taken as supplied;
    /// only the credit split is reconciled against the balance chain as
    /// it stands inside the transaction, so a stale preview can never
    /// overdraw it.
    pub async fn save(&self, figures: &VatComputation) -> DbResult<VatLedgerEntry> {
        let period = Period::new(figures.period_year, figures.period_month)
            .map_err(|e| DbError::Domain(CoreError::Validation(e)))?;

        let mut tx = self.pool.begin().await?;

        // Re-saving: return the old entry's credit before reconciling,
        // otherwise the second save would double-spend the balance.
        if let Some(existing) = fetch_tx(&mut tx, period).await? {
            reverse_credit_tx(&mut tx, period, existing.used_from_closing_balance_poisha).await?;
        }

        let available = closing_balance::credit_source_tx(&mut tx, period)
            .await?
            .map(|row| row.closing_balance_poisha)
            .unwrap_or(0);
        let vat_payable = Money::from_poisha(figures.vat_payable_poisha);
        let used = usable_credit(vat_payable, Money::from_poisha(available));
        let treasury = treasury_needed(vat_payable, used);

        let now = Utc::now();
        let entry = VatLedgerEntry {
            id: Uuid::new_v4().to_string(),
            period_year: period.year() as i64,
            period_month: period.month() as i64,
            gross_sales_poisha: figures.totals.total_gross.poisha(),
            net_sales_ex_vat_poisha: figures.totals.total_net.poisha(),
            vat_rate_bps: figures.vat_rate_bps,
            vat_payable_poisha: vat_payable.poisha(),
            used_from_closing_balance_poisha: used.poisha(),
            treasury_needed_poisha: treasury.poisha(),
            locked: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO vat_ledger (
                id, period_year, period_month,
                gross_sales_poisha, net_sales_ex_vat_poisha, vat_rate_bps,
                vat_payable_poisha, used_from_closing_balance_poisha,
                treasury_needed_poisha, locked, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT (period_year, period_month) DO UPDATE SET
                gross_sales_poisha = excluded.gross_sales_poisha,
                net_sales_ex_vat_poisha = excluded.net_sales_ex_vat_poisha,
                vat_rate_bps = excluded.vat_rate_bps,
                vat_payable_poisha = excluded.vat_payable_poisha,
                used_from_closing_balance_poisha = excluded.used_from_closing_balance_poisha,
                treasury_needed_poisha = excluded.treasury_needed_poisha,
                locked = excluded.locked,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&entry.id)
        .bind(entry.period_year)
        .bind(entry.period_month)
        .bind(entry.gross_sales_poisha)
        .bind(entry.net_sales_ex_vat_poisha)
        .bind(entry.vat_rate_bps)
        .bind(entry.vat_payable_poisha)
        .bind(entry.used_from_closing_balance_poisha)
        .bind(entry.treasury_needed_poisha)
        .bind(entry.locked)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(&mut *tx)
        .await?;

        apply_credit_tx(&mut tx, period, entry.used_from_closing_balance_poisha).await?;

        tx.commit().await?;

        info!(
            period = %period,
            vat_payable = entry.vat_payable_poisha,
            used = entry.used_from_closing_balance_poisha,
            treasury = entry.treasury_needed_poisha,
            "VAT ledger entry saved"
        );

        // Re-read so updates surface the stored id.
        match self.get(period).await? {
            Some(stored) => Ok(stored),
            None => Ok(entry),
        }
    }

    /// Deletes a period's VAT entry and returns its consumed credit to
    /// the closing balance chain.
    ///
    /// ## Errors
    /// * `Domain(PeriodNotFound)` - no entry for the period
    pub async fn delete(&self, period: Period) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let entry = fetch_tx(&mut tx, period).await?.ok_or_else(|| {
            DbError::Domain(CoreError::PeriodNotFound {
                year: period.year(),
                month: period.month(),
            })
        })?;

        reverse_credit_tx(&mut tx, period, entry.used_from_closing_balance_poisha).await?;

        sqlx::query("DELETE FROM vat_ledger WHERE period_year = ?1 AND period_month = ?2")
            .bind(period.year())
            .bind(period.month())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(period = %period, restored = entry.used_from_closing_balance_poisha, "VAT ledger entry deleted");
        Ok(())
    }

    /// Gets a period's VAT entry.
    pub async fn get(&self, period: Period) -> DbResult<Option<VatLedgerEntry>> {
        let entry = sqlx::query_as::<_, VatLedgerEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM vat_ledger \
             WHERE period_year = ?1 AND period_month = ?2"
        ))
        .bind(period.year())
        .bind(period.month())
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Lists all VAT entries in chronological order.
    pub async fn list(&self) -> DbResult<Vec<VatLedgerEntry>> {
        let entries = sqlx::query_as::<_, VatLedgerEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM vat_ledger ORDER BY period_year, period_month"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

// =============================================================================
// Transaction-scoped helpers
// =============================================================================

async fn fetch_tx(
    conn: &mut SqliteConnection,
    period: Period,
) -> DbResult<Option<VatLedgerEntry>> {
    let entry = sqlx::query_as::<_, VatLedgerEntry>(&format!(
        "SELECT {ENTRY_COLUMNS} FROM vat_ledger \
         WHERE period_year = ?1 AND period_month = ?2"
    ))
    .bind(period.year())
    .bind(period.month())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(entry)
}

/// Computes the period's VAT position on an open connection.
async fn compute_tx(
    conn: &mut SqliteConnection,
    period: Period,
    rate: VatRate,
) -> DbResult<VatComputation> {
    let from = format!("{:04}-{:02}-01", period.year(), period.month());
    let next = period.next();
    let to = format!("{:04}-{:02}-01", next.year(), next.month());

    let sales = sqlx::query_as::<_, Sale>(&format!(
        "SELECT {SALE_COLUMNS} FROM sales WHERE sale_date >= ?1 AND sale_date < ?2"
    ))
    .bind(&from)
    .bind(&to)
    .fetch_all(&mut *conn)
    .await?;

    let totals = aggregate(&sales, rate);
    let vat_payable = totals.total_vat;

    let available = closing_balance::credit_source_tx(conn, period)
        .await?
        .map(|row| row.closing_balance_poisha)
        .unwrap_or(0);

    let used = usable_credit(vat_payable, Money::from_poisha(available));
    let treasury = treasury_needed(vat_payable, used);

    debug!(
        period = %period,
        sales = totals.count,
        vat_payable = vat_payable.poisha(),
        available_credit = available,
        "Period VAT computed"
    );

    Ok(VatComputation {
        period_year: period.year(),
        period_month: period.month(),
        totals,
        vat_rate_bps: rate.bps(),
        vat_payable_poisha: vat_payable.poisha(),
        available_credit_poisha: available,
        used_from_closing_balance_poisha: used.poisha(),
        treasury_needed_poisha: treasury.poisha(),
    })
}

/// Debits consumed credit against the period's credit source row.
async fn apply_credit_tx(
    conn: &mut SqliteConnection,
    period: Period,
    used_poisha: i64,
) -> DbResult<()> {
    if used_poisha == 0 {
        return Ok(());
    }
    let source = source_period_tx(conn, period).await?;
    closing_balance::apply_used_delta_tx(conn, source, used_poisha).await
}

/// Returns previously consumed credit to the credit source row.
async fn reverse_credit_tx(
    conn: &mut SqliteConnection,
    period: Period,
    used_poisha: i64,
) -> DbResult<()> {
    if used_poisha == 0 {
        return Ok(());
    }
    let source = source_period_tx(conn, period).await?;
    closing_balance::apply_used_delta_tx(conn, source, -used_poisha).await
}

/// The period whose balance row credit is drawn from: the period
/// itself when it has a row, otherwise the previous period.
async fn source_period_tx(conn: &mut SqliteConnection, period: Period) -> DbResult<Period> {
    if closing_balance::fetch_tx(conn, period).await?.is_some() {
        Ok(period)
    } else {
        Ok(period.prev())
    }
}
