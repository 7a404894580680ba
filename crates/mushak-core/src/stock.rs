//! # Stock Depletion Planning
//!
//! Pure planning for the two stock-depletion strategies. The database
//! layer reads balances, asks this module what to debit, then applies
//! the debits inside the sale's transaction.
//!
//! ## Two Strategies
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  LEDGER (default categories)                                            │
//! │    available = Σ qty_in − Σ qty_out over dated entries                 │
//! │    debit     = one qty_out entry for the sold quantity                 │
//! │                                                                         │
//! │  FIFO LOTS (Footwear)                                                   │
//! │    available = Σ closing_pairs across the product's BoE lots           │
//! │    debit     = drain lots oldest-BoE-date-first:                       │
//! │                                                                         │
//! │       L1 (2025-01-01, 10 pairs)   L2 (2025-02-01, 10 pairs)            │
//! │       sell 15 ──► L1 → 0, L2 → 5   (never the reverse)                 │
//! │                                                                         │
//! │  Either way: insufficient total stock fails the WHOLE sale with        │
//! │  InsufficientStock { available, requested } - no partial decrement.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Lot Views
// =============================================================================

/// A lot's remaining balance, as seen by the planner.
///
/// The database layer supplies these already sorted in FIFO order:
/// `boe_date ASC`, ties broken by `lot_id ASC`.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotBalance {
    pub lot_id: String,
    pub closing_pairs: i64,
}

/// One planned draw against one lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotDraw {
    pub lot_id: String,
    pub pairs: i64,
}

// =============================================================================
// Planning
// =============================================================================

/// Plans a FIFO depletion of `requested` pairs across `lots`.
///
/// `lots` must already be in FIFO order (oldest BoE date first, ties by
/// lot id). Returns the per-lot draws, or `InsufficientStock` when the
/// total across all lots is short - in which case nothing may be
/// debited.
///
/// ## Example
/// ```rust
/// use mushak_core::stock::{plan_fifo, LotBalance};
///
/// let lots = vec![
///     LotBalance { lot_id: "C-1-1".into(), closing_pairs: 10 },
///     LotBalance { lot_id: "C-2-1".into(), closing_pairs: 10 },
/// ];
/// let draws = plan_fifo(&lots, "shoe", 15).unwrap();
/// assert_eq!(draws[0].pairs, 10); // oldest lot drained first
/// assert_eq!(draws[1].pairs, 5);
/// ```
pub fn plan_fifo(lots: &[LotBalance], product_id: &str, requested: i64) -> CoreResult<Vec<LotDraw>> {
    let available: i64 = lots.iter().map(|l| l.closing_pairs).sum();
    if available < requested {
        return Err(CoreError::InsufficientStock {
            product_id: product_id.to_string(),
            available,
            requested,
        });
    }

    let mut draws = Vec::new();
    let mut remaining = requested;
    for lot in lots {
        if remaining == 0 {
            break;
        }
        if lot.closing_pairs == 0 {
            continue;
        }
        let pairs = remaining.min(lot.closing_pairs);
        draws.push(LotDraw {
            lot_id: lot.lot_id.clone(),
            pairs,
        });
        remaining -= pairs;
    }
    Ok(draws)
}

/// Checks a ledger-strategy balance against a requested quantity.
///
/// The ledger debit itself is a single qty_out entry, so planning is
/// just the availability check.
pub fn check_ledger(product_id: &str, available: i64, requested: i64) -> CoreResult<()> {
    if available < requested {
        return Err(CoreError::InsufficientStock {
            product_id: product_id.to_string(),
            available,
            requested,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn lot(id: &str, pairs: i64) -> LotBalance {
        LotBalance {
            lot_id: id.to_string(),
            closing_pairs: pairs,
        }
    }

    #[test]
    fn test_fifo_drains_oldest_first() {
        let lots = vec![lot("L1", 10), lot("L2", 10)];
        let draws = plan_fifo(&lots, "shoe", 15).unwrap();
        assert_eq!(
            draws,
            vec![
                LotDraw { lot_id: "L1".into(), pairs: 10 },
                LotDraw { lot_id: "L2".into(), pairs: 5 },
            ]
        );
    }

    #[test]
    fn test_fifo_single_lot_partial() {
        let lots = vec![lot("L1", 100)];
        let draws = plan_fifo(&lots, "shoe", 30).unwrap();
        assert_eq!(draws, vec![LotDraw { lot_id: "L1".into(), pairs: 30 }]);
    }

    #[test]
    fn test_fifo_skips_exhausted_lots() {
        let lots = vec![lot("L1", 0), lot("L2", 8)];
        let draws = plan_fifo(&lots, "shoe", 5).unwrap();
        assert_eq!(draws, vec![LotDraw { lot_id: "L2".into(), pairs: 5 }]);
    }

    #[test]
    fn test_fifo_insufficient_fails_whole_request() {
        let lots = vec![lot("L1", 40), lot("L2", 30)];
        let err = plan_fifo(&lots, "shoe", 80).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 70);
                assert_eq!(requested, 80);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fifo_exact_fit() {
        let lots = vec![lot("L1", 10), lot("L2", 5)];
        let draws = plan_fifo(&lots, "shoe", 15).unwrap();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws.iter().map(|d| d.pairs).sum::<i64>(), 15);
    }

    #[test]
    fn test_fifo_no_lots() {
        let err = plan_fifo(&[], "shoe", 1).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 0, requested: 1, .. }
        ));
    }

    #[test]
    fn test_check_ledger() {
        assert!(check_ledger("fan", 10, 10).is_ok());
        assert!(check_ledger("fan", 10, 5).is_ok());
        let err = check_ledger("fan", 4, 5).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 4, requested: 5, .. }
        ));
    }
}
