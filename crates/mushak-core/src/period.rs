//! # Tax Period
//!
//! A `(year, month)` value type for VAT reporting periods.
//!
//! ## Why a Dedicated Type?
//! The closing-balance chain walks backwards and forwards across month
//! boundaries (December → January rollovers included). Doing that with
//! bare integers is exactly the kind of off-by-one that corrupts a tax
//! ledger, so the rollover arithmetic lives here, once, under test.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// A VAT reporting period: one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    year: i32,
    /// 1-12.
    month: u32,
}

impl Period {
    /// Creates a period, validating the month range.
    ///
    /// ## Example
    /// ```rust
    /// use mushak_core::period::Period;
    ///
    /// assert!(Period::new(2025, 10).is_ok());
    /// assert!(Period::new(2025, 13).is_err());
    /// assert!(Period::new(2025, 0).is_err());
    /// ```
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::OutOfRange {
                field: "month".to_string(),
                min: 1,
                max: 12,
            });
        }
        Ok(Period { year, month })
    }

    /// Creates a period without validation.
    ///
    /// For converting values already constrained by the database schema.
    #[inline]
    pub const fn new_unchecked(year: i32, month: u32) -> Self {
        Period { year, month }
    }

    /// Returns the period a date falls in.
    pub fn from_date(date: NaiveDate) -> Self {
        Period {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Returns the year.
    #[inline]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Returns the month (1-12).
    #[inline]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Returns the previous period, rolling over year boundaries.
    ///
    /// ## Example
    /// ```rust
    /// use mushak_core::period::Period;
    ///
    /// let jan = Period::new(2026, 1).unwrap();
    /// assert_eq!(jan.prev(), Period::new(2025, 12).unwrap());
    /// ```
    pub const fn prev(&self) -> Period {
        if self.month == 1 {
            Period {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Period {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Returns the next period, rolling over year boundaries.
    pub const fn next(&self) -> Period {
        if self.month == 12 {
            Period {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Period {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Checks whether a date falls inside this period.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_validation() {
        assert!(Period::new(2025, 1).is_ok());
        assert!(Period::new(2025, 12).is_ok());
        assert!(Period::new(2025, 0).is_err());
        assert!(Period::new(2025, 13).is_err());
    }

    #[test]
    fn test_prev_rollover() {
        let jan = Period::new(2026, 1).unwrap();
        assert_eq!(jan.prev(), Period::new(2025, 12).unwrap());

        let jun = Period::new(2025, 6).unwrap();
        assert_eq!(jun.prev(), Period::new(2025, 5).unwrap());
    }

    #[test]
    fn test_next_rollover() {
        let dec = Period::new(2025, 12).unwrap();
        assert_eq!(dec.next(), Period::new(2026, 1).unwrap());

        let oct = Period::new(2025, 10).unwrap();
        assert_eq!(oct.next(), Period::new(2025, 11).unwrap());
    }

    #[test]
    fn test_prev_next_roundtrip() {
        let p = Period::new(2026, 1).unwrap();
        assert_eq!(p.prev().next(), p);
        assert_eq!(p.next().prev(), p);
    }

    #[test]
    fn test_from_date_and_contains() {
        let date = NaiveDate::from_ymd_opt(2025, 10, 17).unwrap();
        let period = Period::from_date(date);
        assert_eq!(period, Period::new(2025, 10).unwrap());
        assert!(period.contains(date));
        assert!(!period.contains(NaiveDate::from_ymd_opt(2025, 11, 1).unwrap()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Period::new(2025, 3).unwrap().to_string(), "2025-03");
    }

    #[test]
    fn test_ordering() {
        let a = Period::new(2025, 12).unwrap();
        let b = Period::new(2026, 1).unwrap();
        assert!(a < b);
    }
}
