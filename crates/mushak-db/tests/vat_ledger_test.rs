//! Monthly VAT computation, ledger save/delete and closing-balance
//! credit consumption, end to end.

mod common;

use common::*;
use mushak_core::{AmountType, CoreError, Period, Settings};
use mushak_db::DbError;

/// A settings snapshot at the standard 15% rate.
fn standard_settings() -> Settings {
    Settings::default()
}

// =============================================================================
// Computation (read-only)
// =============================================================================

#[tokio::test]
async fn test_compute_decomposes_inclusive_totals_exactly() {
    let db = test_db().await;
    let fan = fan_product(&db).await;
    seed_opening_stock(&db, &fan.id, 100).await;

    // 230,000 taka VAT-inclusive = 23,000,000 poisha.
    // At 15%: net 20,000,000 + VAT 3,000,000, reassembling exactly.
    db.sales()
        .create_sale(&draft_sale_with_total(
            "INV-OCT-1",
            date(2025, 10, 12),
            AmountType::Incl,
            &fan.id,
            1,
            23_000_000,
            23_000_000,
        ))
        .await
        .unwrap();

    let period = Period::new(2025, 10).unwrap();
    let result = db
        .vat_ledger()
        .compute_period(period, &standard_settings())
        .await
        .unwrap();

    assert_eq!(result.totals.count, 1);
    assert_eq!(result.totals.total_gross.poisha(), 23_000_000);
    assert_eq!(result.totals.total_net.poisha(), 20_000_000);
    assert_eq!(result.vat_payable_poisha, 3_000_000);
    assert_eq!(
        result.totals.total_net.poisha() + result.vat_payable_poisha,
        result.totals.total_gross.poisha()
    );
}

#[tokio::test]
async fn test_compute_adds_vat_on_exclusive_totals() {
    let db = test_db().await;
    let fan = fan_product(&db).await;
    seed_opening_stock(&db, &fan.id, 100).await;

    // 100,000 poisha pre-VAT: VAT 15,000 on top, gross 115,000.
    db.sales()
        .create_sale(&draft_sale_with_total(
            "INV-OCT-2",
            date(2025, 10, 13),
            AmountType::Excl,
            &fan.id,
            1,
            100_000,
            100_000,
        ))
        .await
        .unwrap();

    let result = db
        .vat_ledger()
        .compute_period(Period::new(2025, 10).unwrap(), &standard_settings())
        .await
        .unwrap();

    assert_eq!(result.totals.total_net.poisha(), 100_000);
    assert_eq!(result.vat_payable_poisha, 15_000);
    assert_eq!(result.totals.total_gross.poisha(), 115_000);
}

#[tokio::test]
async fn test_compute_only_sees_the_periods_sales() {
    let db = test_db().await;
    let fan = fan_product(&db).await;
    seed_opening_stock(&db, &fan.id, 100).await;

    for (invoice, day_date) in [
        ("INV-SEP", date(2025, 9, 30)),
        ("INV-OCT", date(2025, 10, 1)),
        ("INV-NOV", date(2025, 11, 1)),
    ] {
        db.sales()
            .create_sale(&draft_sale(
                invoice,
                day_date,
                AmountType::Incl,
                &fan.id,
                1,
                380_000,
            ))
            .await
            .unwrap();
    }

    let result = db
        .vat_ledger()
        .compute_period(Period::new(2025, 10).unwrap(), &standard_settings())
        .await
        .unwrap();
    assert_eq!(result.totals.count, 1);
}

#[tokio::test]
async fn test_compute_respects_settings_rate() {
    let db = test_db().await;
    let fan = fan_product(&db).await;
    seed_opening_stock(&db, &fan.id, 100).await;

    db.sales()
        .create_sale(&draft_sale_with_total(
            "INV-OCT-3",
            date(2025, 10, 14),
            AmountType::Excl,
            &fan.id,
            1,
            100_000,
            100_000,
        ))
        .await
        .unwrap();

    let settings = db.settings().update(1000, "pc").await.unwrap();
    let result = db
        .vat_ledger()
        .compute_period(Period::new(2025, 10).unwrap(), &settings)
        .await
        .unwrap();

    assert_eq!(result.vat_rate_bps, 1000);
    assert_eq!(result.vat_payable_poisha, 10_000);
}

// =============================================================================
// Save: credit consumption
// =============================================================================

#[tokio::test]
async fn test_save_consumes_closing_balance_credit() {
    let db = test_db().await;
    let fan = fan_product(&db).await;
    seed_opening_stock(&db, &fan.id, 100).await;

    // September carries a 5,000,000 poisha credit forward.
    let september = Period::new(2025, 9).unwrap();
    db.closing_balances()
        .save(september, 5_000_000, 0, None)
        .await
        .unwrap();

    // October owes 3,000,000 poisha of VAT.
    db.sales()
        .create_sale(&draft_sale_with_total(
            "INV-OCT-4",
            date(2025, 10, 15),
            AmountType::Incl,
            &fan.id,
            1,
            23_000_000,
            23_000_000,
        ))
        .await
        .unwrap();

    let october = Period::new(2025, 10).unwrap();
    let figures = db
        .vat_ledger()
        .compute_period(october, &standard_settings())
        .await
        .unwrap();
    let entry = db.vat_ledger().save(&figures).await.unwrap();

    assert_eq!(entry.vat_payable_poisha, 3_000_000);
    assert_eq!(entry.used_from_closing_balance_poisha, 3_000_000);
    assert_eq!(entry.treasury_needed_poisha, 0);
    assert!(entry.locked);

    // The September row absorbed the usage and the equation holds.
    let balance = db.closing_balances().get(september).await.unwrap().unwrap();
    assert_eq!(balance.used_amount_poisha, 3_000_000);
    assert_eq!(balance.closing_balance_poisha, 2_000_000);
    assert_eq!(
        balance.closing_balance_poisha,
        balance.opening_balance_poisha + balance.current_month_addition_poisha
            - balance.used_amount_poisha
    );
}

#[tokio::test]
async fn test_save_with_partial_credit_needs_treasury() {
    let db = test_db().await;
    let fan = fan_product(&db).await;
    seed_opening_stock(&db, &fan.id, 100).await;

    let september = Period::new(2025, 9).unwrap();
    db.closing_balances()
        .save(september, 1_000_000, 0, None)
        .await
        .unwrap();

    db.sales()
        .create_sale(&draft_sale_with_total(
            "INV-OCT-5",
            date(2025, 10, 16),
            AmountType::Incl,
            &fan.id,
            1,
            23_000_000,
            23_000_000,
        ))
        .await
        .unwrap();

    let figures = db
        .vat_ledger()
        .compute_period(Period::new(2025, 10).unwrap(), &standard_settings())
        .await
        .unwrap();
    let entry = db.vat_ledger().save(&figures).await.unwrap();

    assert_eq!(entry.used_from_closing_balance_poisha, 1_000_000);
    assert_eq!(entry.treasury_needed_poisha, 2_000_000);

    // Credit fully spent, never negative.
    let balance = db.closing_balances().get(september).await.unwrap().unwrap();
    assert_eq!(balance.closing_balance_poisha, 0);
}

#[tokio::test]
async fn test_save_without_credit_owes_full_vat_to_treasury() {
    let db = test_db().await;
    let fan = fan_product(&db).await;
    seed_opening_stock(&db, &fan.id, 100).await;

    db.sales()
        .create_sale(&draft_sale_with_total(
            "INV-OCT-6",
            date(2025, 10, 17),
            AmountType::Incl,
            &fan.id,
            1,
            23_000_000,
            23_000_000,
        ))
        .await
        .unwrap();

    let figures = db
        .vat_ledger()
        .compute_period(Period::new(2025, 10).unwrap(), &standard_settings())
        .await
        .unwrap();
    let entry = db.vat_ledger().save(&figures).await.unwrap();

    assert_eq!(entry.used_from_closing_balance_poisha, 0);
    assert_eq!(entry.treasury_needed_poisha, 3_000_000);
}

#[tokio::test]
async fn test_resave_does_not_double_spend_credit() {
    let db = test_db().await;
    let fan = fan_product(&db).await;
    seed_opening_stock(&db, &fan.id, 100).await;

    let september = Period::new(2025, 9).unwrap();
    db.closing_balances()
        .save(september, 5_000_000, 0, None)
        .await
        .unwrap();

    db.sales()
        .create_sale(&draft_sale_with_total(
            "INV-OCT-7",
            date(2025, 10, 18),
            AmountType::Incl,
            &fan.id,
            1,
            23_000_000,
            23_000_000,
        ))
        .await
        .unwrap();

    let october = Period::new(2025, 10).unwrap();
    let figures = db
        .vat_ledger()
        .compute_period(october, &standard_settings())
        .await
        .unwrap();

    // The same figures saved twice: the second save reconciles against
    // the chain after the first has already drawn from it.
    let first = db.vat_ledger().save(&figures).await.unwrap();
    let second = db.vat_ledger().save(&figures).await.unwrap();

    assert_eq!(
        first.used_from_closing_balance_poisha,
        second.used_from_closing_balance_poisha
    );

    // Saving twice equals saving once.
    let balance = db.closing_balances().get(september).await.unwrap().unwrap();
    assert_eq!(balance.used_amount_poisha, 3_000_000);
    assert_eq!(balance.closing_balance_poisha, 2_000_000);

    assert_eq!(db.vat_ledger().list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_save_reconciles_stale_figures_against_current_balance() {
    let db = test_db().await;
    let fan = fan_product(&db).await;
    seed_opening_stock(&db, &fan.id, 100).await;

    let september = Period::new(2025, 9).unwrap();
    db.closing_balances()
        .save(september, 5_000_000, 0, None)
        .await
        .unwrap();

    db.sales()
        .create_sale(&draft_sale_with_total(
            "INV-OCT-9",
            date(2025, 10, 20),
            AmountType::Incl,
            &fan.id,
            1,
            23_000_000,
            23_000_000,
        ))
        .await
        .unwrap();

    // Preview while 5,000,000 of credit is available...
    let figures = db
        .vat_ledger()
        .compute_period(Period::new(2025, 10).unwrap(), &standard_settings())
        .await
        .unwrap();
    assert_eq!(figures.used_from_closing_balance_poisha, 3_000_000);

    // ...then the September balance is corrected down before saving.
    db.closing_balances()
        .save(september, 1_000_000, 0, None)
        .await
        .unwrap();

    // The aggregates are kept as supplied, the credit split is not.
    let entry = db.vat_ledger().save(&figures).await.unwrap();
    assert_eq!(entry.vat_payable_poisha, 3_000_000);
    assert_eq!(entry.used_from_closing_balance_poisha, 1_000_000);
    assert_eq!(entry.treasury_needed_poisha, 2_000_000);

    let balance = db.closing_balances().get(september).await.unwrap().unwrap();
    assert_eq!(balance.closing_balance_poisha, 0);
}

// =============================================================================
// Delete: compensating restore
// =============================================================================

#[tokio::test]
async fn test_delete_returns_consumed_credit() {
    let db = test_db().await;
    let fan = fan_product(&db).await;
    seed_opening_stock(&db, &fan.id, 100).await;

    let september = Period::new(2025, 9).unwrap();
    db.closing_balances()
        .save(september, 5_000_000, 0, None)
        .await
        .unwrap();

    db.sales()
        .create_sale(&draft_sale_with_total(
            "INV-OCT-8",
            date(2025, 10, 19),
            AmountType::Incl,
            &fan.id,
            1,
            23_000_000,
            23_000_000,
        ))
        .await
        .unwrap();

    let october = Period::new(2025, 10).unwrap();
    let figures = db
        .vat_ledger()
        .compute_period(october, &standard_settings())
        .await
        .unwrap();
    db.vat_ledger().save(&figures).await.unwrap();
    db.vat_ledger().delete(october).await.unwrap();

    // The credit is back in full and the entry is gone.
    let balance = db.closing_balances().get(september).await.unwrap().unwrap();
    assert_eq!(balance.used_amount_poisha, 0);
    assert_eq!(balance.closing_balance_poisha, 5_000_000);
    assert!(db.vat_ledger().get(october).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_missing_entry_fails() {
    let db = test_db().await;
    let err = db
        .vat_ledger()
        .delete(Period::new(2025, 10).unwrap())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DbError::Domain(CoreError::PeriodNotFound {
            year: 2025,
            month: 10
        })
    ));
}
