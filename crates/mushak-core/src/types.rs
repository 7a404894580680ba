//! # Domain Types
//!
//! Core domain types used throughout Mushak.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │     BoeLot      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  lot_id (BoE+n) │       │
//! │  │  category       │   │  invoice_no     │   │  boe_date       │       │
//! │  │  stock_on_hand  │   │  amount_type    │   │  opening_pairs  │       │
//! │  └─────────────────┘   │  total_value    │   │  closing_pairs  │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    VatRate      │   │ ClosingBalance  │   │ VatLedgerEntry  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  (year, month)  │   │  (year, month)  │       │
//! │  │  1500 = 15%     │   │  rolling credit │   │  locked period  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (invoice_no, lot_id, period year+month) - human-readable,
//!   carries the domain's uniqueness rules

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::period::Period;

// =============================================================================
// VAT Rate
// =============================================================================

/// VAT rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1500 bps = 15% (the Bangladesh standard VAT rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatRate(u32);

impl VatRate {
    /// The standard VAT rate: 15%, overridable per deployment via settings.
    pub const STANDARD: VatRate = VatRate(1500);

    /// Creates a VAT rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        VatRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero VAT rate (exempt goods).
    #[inline]
    pub const fn zero() -> Self {
        VatRate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for VatRate {
    fn default() -> Self {
        VatRate::STANDARD
    }
}

// =============================================================================
// Product Category & Depletion Strategy
// =============================================================================

/// Product category.
///
/// The category is not just a label: it selects the stock-depletion
/// strategy. Footwear is imported in Bill-of-Entry lots and consumed
/// FIFO per lot; everything else runs on the flat stock ledger.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    /// Imported footwear, tracked per BoE lot (FIFO consumption).
    Footwear,
    /// Electric fans.
    Fan,
    /// BioShield hygiene products.
    BioShield,
    /// Laboratory instruments (may be kit-priced).
    Instrument,
    /// Anything else.
    Other,
}

/// How stock for a product is represented and debited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepletionStrategy {
    /// Additive ledger of dated in/out entries; available = Σin − Σout.
    Ledger,
    /// Bill-of-Entry lots consumed oldest-first; available = Σ closing_pairs.
    FifoLots,
}

impl ProductCategory {
    /// Returns the stock-depletion strategy for this category.
    #[inline]
    pub const fn depletion_strategy(&self) -> DepletionStrategy {
        match self {
            ProductCategory::Footwear => DepletionStrategy::FifoLots,
            _ => DepletionStrategy::Ledger,
        }
    }
}

impl Default for ProductCategory {
    fn default() -> Self {
        ProductCategory::Other
    }
}

// =============================================================================
// Amount Type
// =============================================================================

/// Whether a sale's stored `total_value` already contains VAT.
///
/// ## Canonical Decomposition Rule
/// `amount_type` determines only how `total_value` is *decomposed*,
/// never a different grand total:
///
/// - `Incl`: total is the gross figure; `vat = total × r/(1+r)`,
///   `net = total − vat`
/// - `Excl`: total is the net pre-VAT figure; `vat = total × r`,
///   `gross = total + vat`
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountType {
    /// Stored total already includes VAT.
    Incl,
    /// Stored total is net of VAT.
    Excl,
}

impl Default for AmountType {
    fn default() -> Self {
        AmountType::Incl
    }
}

// =============================================================================
// Stock Entry Kind
// =============================================================================

/// Type of a flat stock-ledger entry.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockEntryKind {
    /// Opening balance entry.
    Opening,
    /// Goods received from an import.
    Import,
    /// Quantity sold (qty_out).
    Sale,
    /// Manual admin adjustment (either direction).
    Adjust,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Category - selects the stock-depletion strategy.
    pub category: ProductCategory,

    /// Sales unit ("pair", "pc", "kit", ...).
    pub unit: String,

    /// Purchase cost excluding VAT, in poisha.
    pub cost_ex_vat_poisha: i64,

    /// Selling price excluding VAT, in poisha.
    pub sell_ex_vat_poisha: i64,

    /// For kit-priced instruments: tests per kit.
    pub tests_per_kit: Option<i64>,

    /// Materialized stock quantity for ledger-strategy products.
    ///
    /// The stock ledger is authoritative; this column is a cached
    /// projection rebuilt via `ProductRepository::rebuild_stock_cache`.
    pub stock_on_hand: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the purchase cost as Money.
    #[inline]
    pub fn cost_ex_vat(&self) -> Money {
        Money::from_poisha(self.cost_ex_vat_poisha)
    }

    /// Returns the selling price as Money.
    #[inline]
    pub fn sell_ex_vat(&self) -> Money {
        Money::from_poisha(self.sell_ex_vat_poisha)
    }

    /// Returns the depletion strategy for this product.
    #[inline]
    pub fn depletion_strategy(&self) -> DepletionStrategy {
        self.category.depletion_strategy()
    }
}

// =============================================================================
// Sale & Sale Line
// =============================================================================

/// A recorded sales invoice.
///
/// Created atomically with its lines and the matching stock debit;
/// deleted symmetrically with a stock restoration.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    /// Invoice date - determines the VAT period the sale falls in.
    pub sale_date: NaiveDate,
    /// Business invoice number, unique.
    pub invoice_no: String,
    /// Customer reference by id, if registered.
    pub customer_id: Option<String>,
    /// Free-text customer name for walk-in buyers.
    pub customer_name: Option<String>,
    /// Whether `total_value` includes VAT.
    pub amount_type: AmountType,
    /// Invoice total in poisha; semantics depend on `amount_type`.
    pub total_value_poisha: i64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the stored total as Money.
    #[inline]
    pub fn total_value(&self) -> Money {
        Money::from_poisha(self.total_value_poisha)
    }

    /// Returns the VAT period this sale belongs to.
    #[inline]
    pub fn period(&self) -> Period {
        Period::from_date(self.sale_date)
    }
}

/// A line item in a sale.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Unit at time of sale.
    pub unit: String,
    /// Quantity sold.
    pub qty: i64,
    /// Unit price in poisha, same VAT convention as the parent sale.
    pub unit_price_poisha: i64,
    /// qty × unit_price, in poisha.
    pub line_total_poisha: i64,
}

impl SaleLine {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_poisha(self.unit_price_poisha)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_poisha(self.line_total_poisha)
    }
}

// =============================================================================
// Sale Drafts
// =============================================================================

/// Input for creating a sale. Validated as a batch before anything is
/// written - all problems are reported together in one round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSale {
    pub sale_date: NaiveDate,
    pub invoice_no: String,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub amount_type: AmountType,
    /// Stated invoice grand total in poisha. When present it must
    /// reconcile with the sum of line totals; when absent the sum is
    /// used (bulk/monthly aggregate sales).
    pub total_value_poisha: Option<i64>,
    pub notes: Option<String>,
    pub lines: Vec<NewSaleLine>,
}

/// One line of a sale draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSaleLine {
    pub product_id: String,
    pub unit: String,
    pub qty: i64,
    pub unit_price_poisha: i64,
}

impl NewSaleLine {
    /// qty × unit_price, in poisha.
    #[inline]
    pub const fn line_total_poisha(&self) -> i64 {
        self.qty * self.unit_price_poisha
    }
}

impl NewSale {
    /// Sum of line totals in poisha.
    pub fn lines_total_poisha(&self) -> i64 {
        self.lines.iter().map(|l| l.line_total_poisha()).sum()
    }

    /// The effective invoice total: the stated total when present,
    /// otherwise the sum of line totals.
    pub fn effective_total_poisha(&self) -> i64 {
        self.total_value_poisha
            .unwrap_or_else(|| self.lines_total_poisha())
    }
}

// =============================================================================
// BoE Lot
// =============================================================================

/// A Bill-of-Entry import lot for FIFO-tracked categories.
///
/// ## Lifecycle
/// ```text
/// Import ──► opening_pairs = closing_pairs = N
///                  │
///                  ▼  sale allocated oldest-BoE-date-first
/// closing_pairs decremented until 0, then the next lot is consumed
/// ```
///
/// Invariant: `0 ≤ closing_pairs ≤ opening_pairs`.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoeLot {
    /// Business lot id derived from BoE number + item number, unique.
    pub lot_id: String,
    pub product_id: String,
    /// Customs Bill-of-Entry number.
    pub boe_no: String,
    /// Item number within the BoE.
    pub item_no: i64,
    /// Import date - FIFO consumption order key.
    pub boe_date: NaiveDate,
    /// Quantity received.
    pub opening_pairs: i64,
    /// Quantity remaining.
    pub closing_pairs: i64,
    /// Landed unit cost in poisha.
    pub unit_purchase_cost_poisha: i64,
    /// Customs declared unit value in poisha.
    pub declared_unit_value_poisha: i64,
    pub created_at: DateTime<Utc>,
}

impl BoeLot {
    /// Derives the business lot id from BoE number and item number.
    ///
    /// ## Example
    /// ```rust
    /// use mushak_core::types::BoeLot;
    ///
    /// assert_eq!(BoeLot::derive_lot_id("C-12345", 3), "C-12345-3");
    /// ```
    pub fn derive_lot_id(boe_no: &str, item_no: i64) -> String {
        format!("{}-{}", boe_no, item_no)
    }

    /// Pairs consumed so far.
    #[inline]
    pub const fn consumed_pairs(&self) -> i64 {
        self.opening_pairs - self.closing_pairs
    }
}

// =============================================================================
// Stock Entry
// =============================================================================

/// A flat stock-ledger entry for ledger-strategy products.
///
/// Available stock is `SUM(qty_in) - SUM(qty_out)` over a product's
/// entries; the ledger is the authoritative representation.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockEntry {
    pub id: String,
    pub product_id: String,
    pub entry_date: NaiveDate,
    pub kind: StockEntryKind,
    pub qty_in: i64,
    pub qty_out: i64,
    /// Set when the entry was emitted by a sale (enables exact reversal).
    pub sale_id: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale Lot Allocation
// =============================================================================

/// Records which lot a sale line drew from, and how much.
///
/// Written during FIFO reservation so that deleting the sale can put
/// exactly the drawn pairs back into exactly the drawn lots.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLotAllocation {
    pub id: String,
    pub sale_id: String,
    pub sale_line_id: String,
    pub lot_id: String,
    pub pairs: i64,
}

// =============================================================================
// Closing Balance
// =============================================================================

/// The VAT treasury credit ledger for one period.
///
/// Invariant: `closing = opening + current_month_addition − used_amount`,
/// exactly. Each period's opening balance is the prior period's closing
/// balance (strict month chain).
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosingBalance {
    pub id: String,
    pub period_year: i64,
    pub period_month: i64,
    pub opening_balance_poisha: i64,
    pub current_month_addition_poisha: i64,
    pub used_amount_poisha: i64,
    pub closing_balance_poisha: i64,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ClosingBalance {
    /// Returns the period this row covers.
    #[inline]
    pub fn period(&self) -> Period {
        Period::new_unchecked(self.period_year as i32, self.period_month as u32)
    }

    /// Returns the closing balance as Money.
    #[inline]
    pub fn closing_balance(&self) -> Money {
        Money::from_poisha(self.closing_balance_poisha)
    }

    /// Returns the opening balance as Money.
    #[inline]
    pub fn opening_balance(&self) -> Money {
        Money::from_poisha(self.opening_balance_poisha)
    }
}

// =============================================================================
// VAT Ledger Entry
// =============================================================================

/// A finalized monthly VAT computation.
///
/// Invariants:
/// - `vat_payable = net_sales_ex_vat × vat_rate` (poisha-rounded)
/// - `treasury_needed = max(0, vat_payable − used_from_closing_balance)`
///
/// `locked` marks the period as closed for recomputation. It is
/// persistence-level metadata: enforcement belongs to the calling layer.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VatLedgerEntry {
    pub id: String,
    pub period_year: i64,
    pub period_month: i64,
    pub gross_sales_poisha: i64,
    pub net_sales_ex_vat_poisha: i64,
    pub vat_rate_bps: u32,
    pub vat_payable_poisha: i64,
    pub used_from_closing_balance_poisha: i64,
    pub treasury_needed_poisha: i64,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VatLedgerEntry {
    /// Returns the period this entry covers.
    #[inline]
    pub fn period(&self) -> Period {
        Period::new_unchecked(self.period_year as i32, self.period_month as u32)
    }

    /// Returns the VAT payable as Money.
    #[inline]
    pub fn vat_payable(&self) -> Money {
        Money::from_poisha(self.vat_payable_poisha)
    }

    /// Returns the treasury amount still owed as Money.
    #[inline]
    pub fn treasury_needed(&self) -> Money {
        Money::from_poisha(self.treasury_needed_poisha)
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Deployment settings snapshot.
///
/// Threaded explicitly into VAT and pricing computations - callers
/// supply the applicable snapshot per operation instead of reading
/// ambient global state.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Standard VAT rate in basis points (default 1500 = 15%).
    pub vat_rate_bps: u32,
    /// Default sales unit for new products.
    pub default_unit: String,
    pub updated_at: DateTime<Utc>,
}

impl Settings {
    /// Returns the configured VAT rate.
    #[inline]
    pub fn vat_rate(&self) -> VatRate {
        VatRate::from_bps(self.vat_rate_bps)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            vat_rate_bps: VatRate::STANDARD.bps(),
            default_unit: "pc".to_string(),
            updated_at: Utc::now(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vat_rate_standard() {
        assert_eq!(VatRate::STANDARD.bps(), 1500);
        assert!((VatRate::STANDARD.percentage() - 15.0).abs() < 0.001);
    }

    #[test]
    fn test_category_strategy() {
        assert_eq!(
            ProductCategory::Footwear.depletion_strategy(),
            DepletionStrategy::FifoLots
        );
        assert_eq!(
            ProductCategory::Fan.depletion_strategy(),
            DepletionStrategy::Ledger
        );
        assert_eq!(
            ProductCategory::Other.depletion_strategy(),
            DepletionStrategy::Ledger
        );
    }

    #[test]
    fn test_lot_id_derivation() {
        assert_eq!(BoeLot::derive_lot_id("C-98765", 12), "C-98765-12");
    }

    #[test]
    fn test_amount_type_default() {
        assert_eq!(AmountType::default(), AmountType::Incl);
    }

    #[test]
    fn test_settings_default_rate() {
        let settings = Settings::default();
        assert_eq!(settings.vat_rate(), VatRate::STANDARD);
    }
}
