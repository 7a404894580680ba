//! # Validation Module
//!
//! Input validation utilities for Mushak.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Calling layer (HTTP/forms, excluded from this workspace)     │
//! │  ├── Basic format checks, immediate user feedback                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │  ├── Field validators fail fast                                        │
//! │  └── Sale drafts are validated as a BATCH: every problem is            │
//! │      collected and reported together so the caller can fix all        │
//! │      of them in one round trip                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE / FK / CHECK constraints                        │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, ValidationError, ValidationErrors};
use crate::types::NewSale;
use crate::{MAX_INVOICE_NO_LEN, MAX_LINE_QUANTITY, MAX_SALE_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates an invoice number.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 50 characters
///
/// ## Example
/// ```rust
/// use mushak_core::validation::validate_invoice_no;
///
/// assert!(validate_invoice_no("INV-2025-001").is_ok());
/// assert!(validate_invoice_no("").is_err());
/// ```
pub fn validate_invoice_no(invoice_no: &str) -> ValidationResult<()> {
    let invoice_no = invoice_no.trim();

    if invoice_no.is_empty() {
        return Err(ValidationError::Required {
            field: "invoice_no".to_string(),
        });
    }

    if invoice_no.len() > MAX_INVOICE_NO_LEN {
        return Err(ValidationError::TooLong {
            field: "invoice_no".to_string(),
            max: MAX_INVOICE_NO_LEN,
        });
    }

    Ok(())
}

/// Validates a sale/adjustment quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "qty".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "qty".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price in poisha.
///
/// ## Rules
/// - Must be positive (> 0); zero-priced lines are data-entry errors
pub fn validate_unit_price(poisha: i64) -> ValidationResult<()> {
    if poisha <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "unit_price".to_string(),
        });
    }

    Ok(())
}

/// Validates a VAT rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "vat_rate".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use mushak_core::validation::validate_uuid;
///
/// assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Batch Sale Validation
// =============================================================================

/// Validates a sale draft, collecting ALL problems instead of failing
/// on the first.
///
/// ## Checked Rules
/// - invoice_no present, length-bounded
/// - at least one line, at most MAX_SALE_LINES
/// - per line: product_id present, qty > 0, unit_price > 0
/// - stated grand total, when present: non-negative and reconciling
///   with the sum of line totals
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use mushak_core::types::{AmountType, NewSale, NewSaleLine};
/// use mushak_core::validation::validate_sale;
///
/// let draft = NewSale {
///     sale_date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
///     invoice_no: "".to_string(),            // problem 1
///     customer_id: None,
///     customer_name: None,
///     amount_type: AmountType::Incl,
///     total_value_poisha: None,
///     notes: None,
///     lines: vec![NewSaleLine {
///         product_id: "p-1".to_string(),
///         unit: "pair".to_string(),
///         qty: 0,                             // problem 2
///         unit_price_poisha: 50_000,
///     }],
/// };
/// let err = validate_sale(&draft).unwrap_err();
/// assert!(err.to_string().contains("2 validation error(s)"));
/// ```
pub fn validate_sale(draft: &NewSale) -> Result<(), CoreError> {
    let mut errors = ValidationErrors::default();

    if let Err(e) = validate_invoice_no(&draft.invoice_no) {
        errors.push(e);
    }

    if draft.lines.is_empty() {
        errors.push(ValidationError::Required {
            field: "lines".to_string(),
        });
    } else if draft.lines.len() > MAX_SALE_LINES {
        errors.push(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 1,
            max: MAX_SALE_LINES as i64,
        });
    }

    for (idx, line) in draft.lines.iter().enumerate() {
        if line.product_id.trim().is_empty() {
            errors.push(ValidationError::Required {
                field: format!("lines[{idx}].product_id"),
            });
        }
        if let Err(e) = validate_quantity(line.qty) {
            errors.push(rename_field(e, &format!("lines[{idx}].qty")));
        }
        if let Err(e) = validate_unit_price(line.unit_price_poisha) {
            errors.push(rename_field(e, &format!("lines[{idx}].unit_price")));
        }
    }

    if let Some(stated) = draft.total_value_poisha {
        if stated < 0 {
            errors.push(ValidationError::MustBePositive {
                field: "total_value".to_string(),
            });
        } else {
            // Only reconcile when every line passed its own checks,
            // otherwise the sum is meaningless.
            let lines_ok = draft.lines.iter().all(|l| {
                validate_quantity(l.qty).is_ok() && validate_unit_price(l.unit_price_poisha).is_ok()
            });
            let computed = draft.lines_total_poisha();
            if lines_ok && !draft.lines.is_empty() && stated != computed {
                errors.push(ValidationError::Mismatch {
                    field: "total_value".to_string(),
                    stated,
                    computed,
                });
            }
        }
    }

    errors.into_result()
}

/// Re-labels a field validator error with its position in the batch.
fn rename_field(err: ValidationError, field: &str) -> ValidationError {
    match err {
        ValidationError::Required { .. } => ValidationError::Required {
            field: field.to_string(),
        },
        ValidationError::TooLong { max, .. } => ValidationError::TooLong {
            field: field.to_string(),
            max,
        },
        ValidationError::OutOfRange { min, max, .. } => ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
        },
        ValidationError::MustBePositive { .. } => ValidationError::MustBePositive {
            field: field.to_string(),
        },
        ValidationError::InvalidFormat { reason, .. } => ValidationError::InvalidFormat {
            field: field.to_string(),
            reason,
        },
        ValidationError::Mismatch {
            stated, computed, ..
        } => ValidationError::Mismatch {
            field: field.to_string(),
            stated,
            computed,
        },
        ValidationError::Duplicate { value, .. } => ValidationError::Duplicate {
            field: field.to_string(),
            value,
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AmountType, NewSaleLine};
    use chrono::NaiveDate;

    fn line(product_id: &str, qty: i64, unit_price: i64) -> NewSaleLine {
        NewSaleLine {
            product_id: product_id.to_string(),
            unit: "pc".to_string(),
            qty,
            unit_price_poisha: unit_price,
        }
    }

    fn draft(lines: Vec<NewSaleLine>) -> NewSale {
        NewSale {
            sale_date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            invoice_no: "INV-001".to_string(),
            customer_id: None,
            customer_name: Some("Walk-in".to_string()),
            amount_type: AmountType::Incl,
            total_value_poisha: None,
            notes: None,
            lines,
        }
    }

    #[test]
    fn test_validate_invoice_no() {
        assert!(validate_invoice_no("INV-2025-001").is_ok());
        assert!(validate_invoice_no("").is_err());
        assert!(validate_invoice_no("   ").is_err());
        assert!(validate_invoice_no(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_unit_price() {
        assert!(validate_unit_price(100).is_ok());
        assert!(validate_unit_price(0).is_err());
        assert!(validate_unit_price(-100).is_err());
    }

    #[test]
    fn test_validate_rate_bps() {
        assert!(validate_rate_bps(0).is_ok());
        assert!(validate_rate_bps(1500).is_ok());
        assert!(validate_rate_bps(10_000).is_ok());
        assert!(validate_rate_bps(10_001).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "").is_err());
        assert!(validate_uuid("id", "not-a-uuid").is_err());
    }

    #[test]
    fn test_valid_sale_passes() {
        let d = draft(vec![line("p-1", 2, 50_000)]);
        assert!(validate_sale(&d).is_ok());
    }

    #[test]
    fn test_batch_collects_all_problems() {
        let mut d = draft(vec![line("", 0, 0)]);
        d.invoice_no = "".to_string();
        let err = validate_sale(&d).unwrap_err();
        match err {
            CoreError::InvalidSale(batch) => {
                // empty invoice_no, empty product_id, bad qty, bad price
                assert_eq!(batch.0.len(), 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_no_lines_rejected() {
        let d = draft(vec![]);
        assert!(validate_sale(&d).is_err());
    }

    #[test]
    fn test_total_reconciliation() {
        let mut d = draft(vec![line("p-1", 2, 50_000)]);
        d.total_value_poisha = Some(100_000);
        assert!(validate_sale(&d).is_ok());

        d.total_value_poisha = Some(99_999);
        let err = validate_sale(&d).unwrap_err();
        match err {
            CoreError::InvalidSale(batch) => {
                assert!(matches!(
                    batch.0[0],
                    ValidationError::Mismatch {
                        stated: 99_999,
                        computed: 100_000,
                        ..
                    }
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_negative_total_rejected() {
        let mut d = draft(vec![line("p-1", 1, 100)]);
        d.total_value_poisha = Some(-1);
        assert!(validate_sale(&d).is_err());
    }
}
