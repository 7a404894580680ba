//! Shared fixtures for integration tests.
//!
//! Every test gets its own in-memory SQLite database with migrations
//! applied, so tests are fully isolated and need no external services.

// Each test binary compiles its own copy; not all of them use every fixture.
#![allow(dead_code)]

use chrono::NaiveDate;
use mushak_core::{AmountType, NewSale, NewSaleLine, Product, ProductCategory, StockEntryKind};
use mushak_db::{Database, DbConfig};

/// Creates a fresh migrated in-memory database.
pub async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// A lot-tracked product (footwear depletes FIFO across BoE lots).
pub async fn footwear_product(db: &Database) -> Product {
    db.products()
        .create(
            "Ladies Sandal",
            ProductCategory::Footwear,
            "pair",
            45_000,
            80_000,
            None,
        )
        .await
        .expect("create footwear product")
}

/// A ledger-tracked product (plain quantity bookkeeping).
pub async fn fan_product(db: &Database) -> Product {
    db.products()
        .create(
            "Ceiling Fan 56\"",
            ProductCategory::Fan,
            "pc",
            250_000,
            380_000,
            None,
        )
        .await
        .expect("create fan product")
}

/// Seeds opening stock for a ledger-tracked product.
pub async fn seed_opening_stock(db: &Database, product_id: &str, qty: i64) {
    db.stock()
        .record_entry(
            product_id,
            date(2025, 1, 1),
            StockEntryKind::Opening,
            qty,
            0,
            Some("opening balance"),
        )
        .await
        .expect("seed opening stock");
}

/// A minimal single-line sale draft.
pub fn draft_sale(
    invoice_no: &str,
    sale_date: NaiveDate,
    amount_type: AmountType,
    product_id: &str,
    qty: i64,
    unit_price_poisha: i64,
) -> NewSale {
    NewSale {
        sale_date,
        invoice_no: invoice_no.to_string(),
        customer_id: None,
        customer_name: None,
        amount_type,
        total_value_poisha: None,
        notes: None,
        lines: vec![NewSaleLine {
            product_id: product_id.to_string(),
            unit: "pc".to_string(),
            qty,
            unit_price_poisha,
        }],
    }
}

/// A sale draft with an explicit stated total (overrides the line sum).
pub fn draft_sale_with_total(
    invoice_no: &str,
    sale_date: NaiveDate,
    amount_type: AmountType,
    product_id: &str,
    qty: i64,
    unit_price_poisha: i64,
    total_value_poisha: i64,
) -> NewSale {
    let mut draft = draft_sale(
        invoice_no,
        sale_date,
        amount_type,
        product_id,
        qty,
        unit_price_poisha,
    );
    draft.total_value_poisha = Some(total_value_poisha);
    draft
}
