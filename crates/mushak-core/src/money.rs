//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  In a VAT ledger that is a compliance problem, not a rounding quirk:   │
//! │    ৳230,000.00 × 0.15 / 1.15 must be ৳30,000.00, to the poisha         │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Poisha                                           │
//! │    All amounts are i64 poisha (1 taka = 100 poisha)                    │
//! │    VAT splits use i128 intermediates with explicit rounding            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use mushak_core::money::Money;
//! use mushak_core::types::VatRate;
//!
//! // Create from poisha (preferred)
//! let total = Money::from_taka(230_000); // ৳230,000.00 gross, VAT inclusive
//!
//! // Extract the VAT contained in a VAT-inclusive amount
//! let vat = total.vat_portion(VatRate::STANDARD);
//! assert_eq!(vat, Money::from_taka(30_000));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::VatRate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in poisha (the smallest BDT unit).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for reversals and adjustments
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  SaleLine.unit_price ──► SaleLine.line_total ──► Sale.total_value       │
/// │                                                         │               │
/// │                    Period aggregation ◄─────────────────┘               │
/// │                          │                                              │
/// │                          ▼                                              │
/// │  gross / net / vat_payable ──► closing balance ──► treasury_needed     │
/// │                                                                         │
/// │  EVERY monetary value in the system flows through this type            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from poisha (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use mushak_core::money::Money;
    ///
    /// let price = Money::from_poisha(109_950); // ৳1,099.50
    /// assert_eq!(price.poisha(), 109_950);
    /// ```
    #[inline]
    pub const fn from_poisha(poisha: i64) -> Self {
        Money(poisha)
    }

    /// Creates a Money value from whole taka.
    ///
    /// ## Example
    /// ```rust
    /// use mushak_core::money::Money;
    ///
    /// let price = Money::from_taka(1_500);
    /// assert_eq!(price.poisha(), 150_000);
    /// ```
    #[inline]
    pub const fn from_taka(taka: i64) -> Self {
        Money(taka * 100)
    }

    /// Returns the value in poisha (smallest currency unit).
    #[inline]
    pub const fn poisha(&self) -> i64 {
        self.0
    }

    /// Returns the whole-taka portion.
    ///
    /// ## Example
    /// ```rust
    /// use mushak_core::money::Money;
    ///
    /// let price = Money::from_poisha(109_950);
    /// assert_eq!(price.taka(), 1_099);
    /// ```
    #[inline]
    pub const fn taka(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the poisha portion (always 0-99).
    #[inline]
    pub const fn poisha_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns the larger of `self` and zero.
    ///
    /// Used for treasury math where a credit can cover the whole
    /// liability but never produce a refund.
    #[inline]
    pub const fn max_zero(&self) -> Self {
        if self.0 > 0 {
            *self
        } else {
            Money(0)
        }
    }

    /// Extracts the VAT contained in a VAT-INCLUSIVE amount.
    ///
    /// ## The Inclusive Split
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  A VAT-inclusive invoice total T at rate r already contains VAT:   │
    /// │                                                                     │
    /// │      vat = T × r / (1 + r)        net = T − vat                    │
    /// │                                                                     │
    /// │  At the standard 15% rate: vat = T × 15 / 115                      │
    /// │                                                                     │
    /// │  ৳230,000 × 1500 / 11500 = ৳30,000 (exact, no float involved)      │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ## Implementation
    /// Integer math with i128 intermediates to prevent overflow.
    /// Rounds half away from zero at the poisha:
    /// `(amount × bps + divisor/2) / divisor` where `divisor = 10000 + bps`.
    ///
    /// ## Example
    /// ```rust
    /// use mushak_core::money::Money;
    /// use mushak_core::types::VatRate;
    ///
    /// let gross = Money::from_taka(230_000);
    /// let vat = gross.vat_portion(VatRate::STANDARD);
    /// assert_eq!(vat, Money::from_taka(30_000));
    /// assert_eq!(gross - vat, Money::from_taka(200_000));
    /// ```
    pub fn vat_portion(&self, rate: VatRate) -> Money {
        let bps = rate.bps() as i128;
        let divisor = 10_000 + bps;
        let raw = self.0 as i128 * bps;
        let vat = if raw >= 0 {
            (raw + divisor / 2) / divisor
        } else {
            (raw - divisor / 2) / divisor
        };
        Money::from_poisha(vat as i64)
    }

    /// Calculates the VAT due ON TOP of a VAT-EXCLUSIVE amount.
    ///
    /// ## Formula
    /// `vat = amount × rate`, rounded at the poisha:
    /// `(amount × bps + 5000) / 10000`
    ///
    /// ## Example
    /// ```rust
    /// use mushak_core::money::Money;
    /// use mushak_core::types::VatRate;
    ///
    /// let net = Money::from_taka(200_000);
    /// let vat = net.add_vat(VatRate::STANDARD);
    /// assert_eq!(vat, Money::from_taka(30_000));
    /// ```
    pub fn add_vat(&self, rate: VatRate) -> Money {
        let raw = self.0 as i128 * rate.bps() as i128;
        let vat = if raw >= 0 {
            (raw + 5_000) / 10_000
        } else {
            (raw - 5_000) / 10_000
        };
        Money::from_poisha(vat as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use mushak_core::money::Money;
    ///
    /// let unit_price = Money::from_taka(299);
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total, Money::from_taka(897));
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging and logs. Report rendering lives in the
/// excluded presentation layer and handles localization properly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}৳{}.{:02}", sign, self.taka().abs(), self.poisha_part())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_poisha() {
        let money = Money::from_poisha(109_950);
        assert_eq!(money.poisha(), 109_950);
        assert_eq!(money.taka(), 1_099);
        assert_eq!(money.poisha_part(), 50);
    }

    #[test]
    fn test_from_taka() {
        assert_eq!(Money::from_taka(1_500).poisha(), 150_000);
        assert_eq!(Money::from_taka(-5).poisha(), -500);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_poisha(109_950)), "৳1099.50");
        assert_eq!(format!("{}", Money::from_poisha(500)), "৳5.00");
        assert_eq!(format!("{}", Money::from_poisha(-550)), "-৳5.50");
        assert_eq!(format!("{}", Money::from_poisha(0)), "৳0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_poisha(1000);
        let b = Money::from_poisha(500);

        assert_eq!((a + b).poisha(), 1500);
        assert_eq!((a - b).poisha(), 500);
        assert_eq!((a * 3).poisha(), 3000);
    }

    #[test]
    fn test_vat_portion_standard_rate() {
        // ৳230,000 VAT-inclusive at 15%: vat = 230000 * 15 / 115 = 30000
        let gross = Money::from_taka(230_000);
        let vat = gross.vat_portion(VatRate::STANDARD);
        assert_eq!(vat, Money::from_taka(30_000));
        assert_eq!(gross - vat, Money::from_taka(200_000));
    }

    #[test]
    fn test_vat_portion_rounds_at_poisha() {
        // ৳100.00 inclusive at 15%: 10000 * 1500 / 11500 = 1304.34..
        // rounds to 1304 poisha = ৳13.04
        let gross = Money::from_taka(100);
        assert_eq!(gross.vat_portion(VatRate::STANDARD).poisha(), 1_304);
    }

    #[test]
    fn test_add_vat() {
        let net = Money::from_taka(200_000);
        assert_eq!(net.add_vat(VatRate::STANDARD), Money::from_taka(30_000));

        // ৳10.00 at 15% = ৳1.50
        assert_eq!(Money::from_taka(10).add_vat(VatRate::STANDARD).poisha(), 150);
    }

    #[test]
    fn test_decomposition_reassembles_exactly() {
        // net + vat must equal the original inclusive total
        for taka in [1, 7, 99, 1_000, 230_000, 999_999] {
            let gross = Money::from_taka(taka);
            let vat = gross.vat_portion(VatRate::STANDARD);
            let net = gross - vat;
            assert_eq!(net + vat, gross);
        }
    }

    #[test]
    fn test_max_zero() {
        assert_eq!(Money::from_poisha(-100).max_zero(), Money::zero());
        assert_eq!(Money::from_poisha(100).max_zero(), Money::from_poisha(100));
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let positive = Money::from_poisha(100);
        assert!(positive.is_positive());

        let negative = Money::from_poisha(-100);
        assert!(negative.is_negative());
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 200, 300].iter().map(|p| Money::from_poisha(*p)).sum();
        assert_eq!(total.poisha(), 600);
    }
}
