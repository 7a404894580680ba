//! # VAT Computation
//!
//! Pure period VAT arithmetic: decomposing invoice totals into
//! gross/net/VAT, aggregating a month of sales, and the closing-balance
//! offset math.
//!
//! ## Monthly Close Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Monthly VAT Close                                   │
//! │                                                                         │
//! │  Sales for (year, month)                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  decompose() per sale ──► PeriodTotals { gross, net, vat }             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  vat_payable = Σ vat                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  used = min(vat_payable, closing-balance credit)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  treasury_needed = max(0, vat_payable − used)  ──► challan payment     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is a pure function: persistence and transaction
//! boundaries live in mushak-db.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{AmountType, Sale, VatRate};

// =============================================================================
// Decomposition
// =============================================================================

/// One invoice total split into its VAT components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatBreakdown {
    /// The invoice grand total, VAT included.
    pub gross: Money,
    /// The net-of-VAT figure.
    pub net: Money,
    /// The VAT component. `net + vat == gross` always.
    pub vat: Money,
}

/// Decomposes a stored invoice total into gross/net/VAT.
///
/// ## Canonical Rule
/// `amount_type` determines only how `total_value` is decomposed, never
/// a different grand total:
///
/// - `Incl`: the stored total is gross; `vat = total × r/(1+r)`,
///   `net = total − vat`
/// - `Excl`: the stored total is net pre-VAT; `vat = total × r`,
///   `gross = total + vat`
///
/// ## Example
/// ```rust
/// use mushak_core::money::Money;
/// use mushak_core::types::{AmountType, VatRate};
/// use mushak_core::vat::decompose;
///
/// let b = decompose(Money::from_taka(230_000), AmountType::Incl, VatRate::STANDARD);
/// assert_eq!(b.net, Money::from_taka(200_000));
/// assert_eq!(b.vat, Money::from_taka(30_000));
/// ```
pub fn decompose(total: Money, amount_type: AmountType, rate: VatRate) -> VatBreakdown {
    match amount_type {
        AmountType::Incl => {
            let vat = total.vat_portion(rate);
            VatBreakdown {
                gross: total,
                net: total - vat,
                vat,
            }
        }
        AmountType::Excl => {
            let vat = total.add_vat(rate);
            VatBreakdown {
                gross: total + vat,
                net: total,
                vat,
            }
        }
    }
}

// =============================================================================
// Period Aggregation
// =============================================================================

/// Aggregate figures for one period's sales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub total_gross: Money,
    pub total_net: Money,
    pub total_vat: Money,
    pub count: usize,
}

/// Aggregates a period's sales into gross / net-of-VAT / VAT totals.
///
/// Pure read aggregation, no side effects. The caller is responsible
/// for handing in exactly the sales whose date falls in the period.
pub fn aggregate(sales: &[Sale], rate: VatRate) -> PeriodTotals {
    let mut totals = PeriodTotals::default();
    for sale in sales {
        let b = decompose(sale.total_value(), sale.amount_type, rate);
        totals.total_gross += b.gross;
        totals.total_net += b.net;
        totals.total_vat += b.vat;
        totals.count += 1;
    }
    totals
}

// =============================================================================
// Closing Balance & Treasury Math
// =============================================================================

/// How much of an available closing-balance credit a liability consumes.
///
/// Never more than the liability, never more than the credit, never
/// negative.
pub fn usable_credit(vat_payable: Money, available: Money) -> Money {
    if available.is_negative() {
        return Money::zero();
    }
    std::cmp::min(vat_payable.max_zero(), available)
}

/// The treasury challan amount still owed after the credit offset.
///
/// `treasury_needed = max(0, vat_payable − used_from_closing_balance)`
pub fn treasury_needed(vat_payable: Money, used_from_closing_balance: Money) -> Money {
    (vat_payable - used_from_closing_balance).max_zero()
}

/// The closing-balance equation for one period.
///
/// `closing = opening + current_month_addition − used_amount`, exactly.
pub fn closing_balance(opening: Money, addition: Money, used: Money) -> Money {
    opening + addition - used
}

// =============================================================================
// Unit Tests
// =============================================================================
