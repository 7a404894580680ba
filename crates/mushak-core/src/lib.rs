//! # mushak-core: Pure Business Logic for Mushak
//!
//! This crate is the **heart** of Mushak, a VAT bookkeeping and
//! inventory core for a trading business. It contains all business
//! logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mushak Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │           HTTP / dashboard layer (excluded, external)           │   │
//! │  │    sales entry ──► period close ──► closing-balance upkeep     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ mushak-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │    vat    │  │   stock   │  │   │
//! │  │   │  Product  │  │  poisha   │  │ decompose │  │ plan_fifo │  │   │
//! │  │   │   Sale    │  │  i64 only │  │ aggregate │  │  ledger   │  │   │
//! │  │   │  BoeLot   │  │  no float │  │ treasury  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    mushak-db (Database Layer)                   │   │
//! │  │          SQLite queries, migrations, repositories,              │   │
//! │  │          transaction boundaries for every operation             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, BoeLot, ClosingBalance, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`period`] - The (year, month) tax period with rollover arithmetic
//! - [`vat`] - VAT decomposition, period aggregation, treasury math
//! - [`stock`] - FIFO lot depletion planning and ledger checks
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation (batch sale validation)
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in poisha (i64) to avoid float errors
//! 4. **Explicit Settings**: The VAT rate is passed in per operation, never
//!    read from ambient global state
//!
//! ## Example Usage
//!
//! ```rust
//! use mushak_core::money::Money;
//! use mushak_core::types::{AmountType, VatRate};
//! use mushak_core::vat::decompose;
//!
//! // A ৳230,000 VAT-inclusive invoice at the standard 15% rate
//! let b = decompose(Money::from_taka(230_000), AmountType::Incl, VatRate::STANDARD);
//!
//! assert_eq!(b.net, Money::from_taka(200_000));
//! assert_eq!(b.vat, Money::from_taka(30_000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod period;
pub mod stock;
pub mod types;
pub mod validation;
pub mod vat;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use mushak_core::Money` instead of
// `use mushak_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError, ValidationErrors};
pub use money::Money;
pub use period::Period;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed on a single sale.
///
/// ## Business Reason
/// Prevents runaway invoices and keeps the batch validator's output
/// readable. Can be made configurable in future versions.
pub const MAX_SALE_LINES: usize = 100;

/// Maximum quantity of a single sale line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 100000 instead of 100).
pub const MAX_LINE_QUANTITY: i64 = 100_000;

/// Maximum length of an invoice number.
pub const MAX_INVOICE_NO_LEN: usize = 50;
