//! # Repository Implementations
//!
//! Each repository wraps the shared `SqlitePool` and exposes the
//! database operations for one aggregate:
//!
//! - [`product`] - Product catalog + stock cache rebuild
//! - [`sale`] - Sale creation/deletion with stock reservation
//! - [`stock`] - Stock ledger entries and BoE lots
//! - [`vat_ledger`] - Monthly VAT computation and finalized entries
//! - [`closing_balance`] - Closing balance chain and carry-forward
//! - [`settings`] - Singleton deployment settings
//!
//! Multi-table operations (sale creation, VAT save, carry-forward) run
//! inside a single transaction. Helpers shared between repositories
//! take `&mut SqliteConnection` so they compose into a caller's
//! transaction.

pub mod closing_balance;
pub mod product;
pub mod sale;
pub mod settings;
pub mod stock;
pub mod vat_ledger;
