//! # Error Types
//!
//! Domain-specific error types for mushak-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  mushak-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  mushak-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product id, quantities, period)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic
/// failures. They abort the whole operation - no partial writes.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Insufficient stock to complete a sale.
    ///
    /// ## When This Occurs
    /// - Ledger strategy: requested > Σqty_in − Σqty_out
    /// - FIFO strategy: requested > Σclosing_pairs across all lots
    ///
    /// The whole sale is aborted; the caller sees `{available, requested}`
    /// so it can explain the shortfall.
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Referenced ledger period doesn't exist.
    #[error("No ledger entry for period {year:04}-{month:02}")]
    PeriodNotFound { year: i32, month: u32 },

    /// Single validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Batch validation collected one or more problems (§ price/quantity
    /// validation reports everything in one round trip).
    #[error("Invalid sale: {0} validation error(s)")]
    InvalidSale(ValidationErrors),
}

/// A batch of validation failures, reported together.
#[derive(Debug, Default)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    /// Collects an error.
    pub fn push(&mut self, err: ValidationError) {
        self.0.push(err);
    }

    /// True when no errors were collected.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts the collection into a result: Ok when empty.
    pub fn into_result(self) -> Result<(), CoreError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CoreError::InvalidSale(self))
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.len())?;
        if !self.0.is_empty() {
            let msgs: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
            write!(f, " [{}]", msgs.join("; "))?;
        }
        Ok(())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date, unknown enum).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two figures that must reconcile don't.
    #[error("{field} mismatch: stated {stated}, computed {computed}")]
    Mismatch {
        field: String,
        stated: i64,
        computed: i64,
    },

    /// Duplicate value (e.g., duplicate invoice_no, lot_id).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            available: 70,
            requested: 80,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for p-1: available 70, requested 80"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "invoice_no".to_string(),
        };
        assert_eq!(err.to_string(), "invoice_no is required");

        let err = ValidationError::MustBePositive {
            field: "qty".to_string(),
        };
        assert_eq!(err.to_string(), "qty must be positive");
    }

    #[test]
    fn test_validation_errors_batch() {
        let mut errs = ValidationErrors::default();
        assert!(errs.is_empty());
        assert!(errs.into_result().is_ok());

        let mut errs = ValidationErrors::default();
        errs.push(ValidationError::Required {
            field: "invoice_no".to_string(),
        });
        errs.push(ValidationError::MustBePositive {
            field: "qty".to_string(),
        });
        let result = ValidationErrors::into_result(errs);
        let err = result.unwrap_err();
        assert!(matches!(&err, CoreError::InvalidSale(batch) if batch.0.len() == 2));
        assert!(err.to_string().contains("2 validation error(s)"));
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "qty".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
