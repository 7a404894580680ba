//! # mushak-db: Database Layer for Mushak
//!
//! This crate provides database access for the Mushak VAT bookkeeping
//! system. It uses SQLite for local storage with sqlx for async
//! operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mushak Data Flow                                 │
//! │                                                                         │
//! │  Calling layer (HTTP handlers, CLI, tests)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     mushak-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐ │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │ │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │ │   │
//! │  │   │               │    │ SaleRepo       │    │              │ │   │
//! │  │   │ SqlitePool    │◄───│ VatLedgerRepo  │    │ 001_init.sql │ │   │
//! │  │   │ Connection    │    │ StockRepo      │    │ ...          │ │   │
//! │  │   │ Management    │    │ ...            │    │              │ │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘ │   │
//! │  │                               │                                │   │
//! │  │                               ▼                                │   │
//! │  │               mushak-core (pure domain logic)                  │   │
//! │  │               VAT math · FIFO planning · validation            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL mode, foreign keys on)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mushak_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/mushak.db")).await?;
//!
//! let settings = db.settings().get().await?;
//! let period = mushak_core::Period::new(2025, 10)?;
//! let figures = db.vat_ledger().compute_period(period, &settings).await?;
//! let entry = db.vat_ledger().save(&figures).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::closing_balance::ClosingBalanceRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::settings::SettingsRepository;
pub use repository::stock::StockRepository;
pub use repository::vat_ledger::{VatComputation, VatLedgerRepository};
