//! # Closing Balance Repository
//!
//! The month-to-month VAT credit chain.
//!
//! ## The Chain
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   September                 October                  November           │
//! │  ┌────────────┐           ┌────────────┐           ┌────────────┐      │
//! │  │ opening    │           │ opening ◄──┼───────────│            │      │
//! │  │ + addition │  closing  │ + addition │  closing  │   ...      │      │
//! │  │ - used     │──────────►│ - used     │──────────►│            │      │
//! │  │ = closing  │           │ = closing  │           │            │      │
//! │  └────────────┘           └────────────┘           └────────────┘      │
//! │                                                                         │
//! │  closing = opening + addition - used, always, on every write.          │
//! │  Writes propagate ONE hop forward: saving September refreshes          │
//! │  October's opening (and its closing), but not November's. Editing      │
//! │  far-past months is surfaced to the operator as a recompute task,      │
//! │  not silently cascaded.                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mushak_core::vat::closing_balance as compute_closing;
use mushak_core::{ClosingBalance, CoreError, Money, Period};

const BALANCE_COLUMNS: &str = "id, period_year, period_month, opening_balance_poisha, \
     current_month_addition_poisha, used_amount_poisha, closing_balance_poisha, notes, updated_at";

/// Repository for closing balance operations.
#[derive(Debug, Clone)]
pub struct ClosingBalanceRepository {
    pool: SqlitePool,
}

impl ClosingBalanceRepository {
    /// Creates a new ClosingBalanceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClosingBalanceRepository { pool }
    }

    /// Gets the balance row for a period.
    pub async fn get(&self, period: Period) -> DbResult<Option<ClosingBalance>> {
        let mut conn = self.pool.acquire().await?;
        fetch_tx(&mut conn, period).await
    }

    /// Lists all balance rows in chronological order.
    pub async fn list(&self) -> DbResult<Vec<ClosingBalance>> {
        let balances = sqlx::query_as::<_, ClosingBalance>(&format!(
            "SELECT {BALANCE_COLUMNS} FROM closing_balances ORDER BY period_year, period_month"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(balances)
    }

    /// Saves a period's balance row, deriving opening from the
    /// previous period and propagating one hop forward.
    ///
    /// ## What This Does (one transaction)
    /// 1. opening = previous period's closing (0 if no previous row)
    /// 2. closing = opening + addition - used
    /// 3. Upsert this period's row
    /// 4. If the next period has a row, refresh its opening + closing
    ///
    /// ## Errors
    /// * `Domain(Validation)` - the figures would overdraw the balance
    ///   (closing < 0). Internal credit adjustments bypass this check;
    ///   operator entry does not.
    pub async fn save(
        &self,
        period: Period,
        addition_poisha: i64,
        used_poisha: i64,
        notes: Option<&str>,
    ) -> DbResult<ClosingBalance> {
        let mut tx = self.pool.begin().await?;

        let opening = fetch_tx(&mut tx, period.prev())
            .await?
            .map(|prev| prev.closing_balance_poisha)
            .unwrap_or(0);

        if opening + addition_poisha - used_poisha < 0 {
            return Err(DbError::Domain(CoreError::Validation(
                mushak_core::ValidationError::OutOfRange {
                    field: "used_amount".to_string(),
                    min: 0,
                    max: opening + addition_poisha,
                },
            )));
        }

        let saved = upsert_tx(
            &mut tx,
            period,
            opening,
            addition_poisha,
            used_poisha,
            notes,
        )
        .await?;
        propagate_next_tx(&mut tx, period).await?;

        tx.commit().await?;

        info!(
            period = %period,
            closing = saved.closing_balance_poisha,
            "Closing balance saved"
        );
        Ok(saved)
    }

    /// Carries a period's closing balance into a later period's
    /// opening. The periods need not be adjacent: an operator resuming
    /// after dormant months carries March's closing straight into July.
    ///
    /// Creates the target row if missing (no addition or usage yet),
    /// otherwise refreshes its opening and keeps its own figures.
    ///
    /// ## Errors
    /// * `Domain(PeriodNotFound)` - `from` has no balance row
    /// * `Domain(Validation)` - `to` is not after `from`
    pub async fn carry_forward(&self, from: Period, to: Period) -> DbResult<ClosingBalance> {
        if to <= from {
            return Err(DbError::Domain(CoreError::Validation(
                mushak_core::ValidationError::InvalidFormat {
                    field: "to".to_string(),
                    reason: format!("target period {to} must come after {from}"),
                },
            )));
        }

        let mut tx = self.pool.begin().await?;

        let source = fetch_tx(&mut tx, from).await?.ok_or_else(|| {
            DbError::Domain(CoreError::PeriodNotFound {
                year: from.year(),
                month: from.month(),
            })
        })?;

        let existing = fetch_tx(&mut tx, to).await?;
        let (addition, used, notes) = match &existing {
            Some(row) => (
                row.current_month_addition_poisha,
                row.used_amount_poisha,
                row.notes.clone(),
            ),
            None => (0, 0, None),
        };

        let carried = upsert_tx(
            &mut tx,
            to,
            source.closing_balance_poisha,
            addition,
            used,
            notes.as_deref(),
        )
        .await?;
        propagate_next_tx(&mut tx, to).await?;

        tx.commit().await?;

        info!(from = %from, to = %to, opening = carried.opening_balance_poisha, "Balance carried forward");
        Ok(carried)
    }
}

// =============================================================================
// Transaction-scoped helpers (shared with VatLedgerRepository)
// =============================================================================

/// Fetches a period's balance row on an open connection.
pub(crate) async fn fetch_tx(
    conn: &mut SqliteConnection,
    period: Period,
) -> DbResult<Option<ClosingBalance>> {
    let balance = sqlx::query_as::<_, ClosingBalance>(&format!(
        "SELECT {BALANCE_COLUMNS} FROM closing_balances \
         WHERE period_year = ?1 AND period_month = ?2"
    ))
    .bind(period.year())
    .bind(period.month())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(balance)
}

/// The balance row a period's VAT liability draws credit from:
/// the period's own row if present, otherwise the previous period's.
pub(crate) async fn credit_source_tx(
    conn: &mut SqliteConnection,
    period: Period,
) -> DbResult<Option<ClosingBalance>> {
    if let Some(own) = fetch_tx(conn, period).await? {
        return Ok(Some(own));
    }
    fetch_tx(conn, period.prev()).await
}

/// Upserts a balance row with closing recomputed from its parts.
pub(crate) async fn upsert_tx(
    conn: &mut SqliteConnection,
    period: Period,
    opening_poisha: i64,
    addition_poisha: i64,
    used_poisha: i64,
    notes: Option<&str>,
) -> DbResult<ClosingBalance> {
    let closing = compute_closing(
        Money::from_poisha(opening_poisha),
        Money::from_poisha(addition_poisha),
        Money::from_poisha(used_poisha),
    );

    let balance = ClosingBalance {
        id: Uuid::new_v4().to_string(),
        period_year: period.year() as i64,
        period_month: period.month() as i64,
        opening_balance_poisha: opening_poisha,
        current_month_addition_poisha: addition_poisha,
        used_amount_poisha: used_poisha,
        closing_balance_poisha: closing.poisha(),
        notes: notes.map(str::to_string),
        updated_at: Utc::now(),
    };

    // Existing rows keep their id; ON CONFLICT leaves it untouched.
    sqlx::query(
        r#"
        INSERT INTO closing_balances (
            id, period_year, period_month,
            opening_balance_poisha, current_month_addition_poisha,
            used_amount_poisha, closing_balance_poisha, notes, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT (period_year, period_month) DO UPDATE SET
            opening_balance_poisha = excluded.opening_balance_poisha,
            current_month_addition_poisha = excluded.current_month_addition_poisha,
            used_amount_poisha = excluded.used_amount_poisha,
            closing_balance_poisha = excluded.closing_balance_poisha,
            notes = excluded.notes,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&balance.id)
    .bind(balance.period_year)
    .bind(balance.period_month)
    .bind(balance.opening_balance_poisha)
    .bind(balance.current_month_addition_poisha)
    .bind(balance.used_amount_poisha)
    .bind(balance.closing_balance_poisha)
    .bind(&balance.notes)
    .bind(balance.updated_at)
    .execute(&mut *conn)
    .await?;

    // Re-read so the caller sees the stored id on updates.
    match fetch_tx(conn, period).await? {
        Some(stored) => Ok(stored),
        None => Ok(balance),
    }
}

/// Adds a delta to a period's used amount and recomputes its closing.
/// No-op when the period has no balance row.
pub(crate) async fn apply_used_delta_tx(
    conn: &mut SqliteConnection,
    period: Period,
    delta_poisha: i64,
) -> DbResult<()> {
    if delta_poisha == 0 {
        return Ok(());
    }

    let Some(row) = fetch_tx(conn, period).await? else {
        debug!(period = %period, "No balance row to apply credit delta to");
        return Ok(());
    };

    upsert_tx(
        conn,
        period,
        row.opening_balance_poisha,
        row.current_month_addition_poisha,
        row.used_amount_poisha + delta_poisha,
        row.notes.as_deref(),
    )
    .await?;
    propagate_next_tx(conn, period).await?;

    Ok(())
}

/// Refreshes the next period's opening from this period's closing.
/// Single hop only; no-op when either row is missing.
pub(crate) async fn propagate_next_tx(
    conn: &mut SqliteConnection,
    period: Period,
) -> DbResult<()> {
    let Some(current) = fetch_tx(conn, period).await? else {
        return Ok(());
    };
    let next = period.next();
    let Some(next_row) = fetch_tx(conn, next).await? else {
        return Ok(());
    };

    if next_row.opening_balance_poisha == current.closing_balance_poisha {
        return Ok(());
    }

    upsert_tx(
        conn,
        next,
        current.closing_balance_poisha,
        next_row.current_month_addition_poisha,
        next_row.used_amount_poisha,
        next_row.notes.as_deref(),
    )
    .await?;

    debug!(period = %next, opening = current.closing_balance_poisha, "Next period opening refreshed");
    Ok(())
}
