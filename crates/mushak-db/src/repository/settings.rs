//! # Settings Repository
//!
//! The singleton settings row (id fixed at 1). The migration seeds it,
//! so `get()` always finds a row on a migrated database.
//!
//! Callers read a snapshot and pass it into VAT operations explicitly;
//! nothing in the computation path reaches for settings on its own.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use mushak_core::validation::validate_rate_bps;
use mushak_core::Settings;

/// Repository for deployment settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Reads the current settings snapshot.
    pub async fn get(&self) -> DbResult<Settings> {
        let settings = sqlx::query_as::<_, Settings>(
            "SELECT vat_rate_bps, default_unit, updated_at FROM settings WHERE id = 1",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(settings)
    }

    /// Updates the settings row.
    ///
    /// The new rate applies to future computations only; saved ledger
    /// entries keep the rate they were computed with.
    pub async fn update(&self, vat_rate_bps: u32, default_unit: &str) -> DbResult<Settings> {
        validate_rate_bps(vat_rate_bps)
            .map_err(|e| DbError::Domain(mushak_core::CoreError::Validation(e)))?;

        sqlx::query(
            "UPDATE settings SET vat_rate_bps = ?1, default_unit = ?2, updated_at = ?3 WHERE id = 1",
        )
        .bind(vat_rate_bps)
        .bind(default_unit)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(vat_rate_bps, default_unit, "Settings updated");
        self.get().await
    }
}
