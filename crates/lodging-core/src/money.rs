//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    1000 × 1.3 × 1.1 = 1430.0000000000002  ❌ WRONG!                     │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units + basis-point rates                  │
//! │    100000 cents × 13000 bp × 11000 bp / 10000² = 143000 cents           │
//! │    Exact until the single, explicit half-up rounding step              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use lodging_core::money::Money;
//!
//! let nightly = Money::from_major(1000);        // 1000.00
//! let stay = nightly * 2;                       // 2000.00
//! let refund = -stay;                           // -2000.00
//! assert_eq!(refund.cents(), -200_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

/// Scale of one basis point rate (10000 bp = 1.0).
pub const BPS_SCALE: i128 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents / paise).
///
/// ## Design Decisions
/// - **i64 (signed)**: refunds are recorded as negative amounts
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **No currency tag**: the platform runs in exactly one configured currency
///
/// ## Where Money is Used
/// ```text
/// Room.base_price ──► PricingEngine ──► PriceQuote.total_cost
///                                             │
///                                             ▼
///                     Reservation.total_amount (locked at booking time)
///                                             │
///                          ┌──────────────────┴──────────────────┐
///                          ▼                                     ▼
///                 Payment.amount (+charge)            Payment.amount (−refund)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use lodging_core::money::Money;
    ///
    /// let fee = Money::from_cents(2500); // 25.00
    /// assert_eq!(fee.cents(), 2500);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole major units.
    ///
    /// ## Example
    /// ```rust
    /// use lodging_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(1000).cents(), 100_000);
    /// ```
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit should be negative:
    /// `from_major_minor(-5, 50)` is -5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Rounds an exact fraction of cents half-up (away from zero on ties).
    ///
    /// This is the only rounding step used by pricing: nightly amounts are
    /// accumulated as `numerator / denominator` and rounded once. Returns
    /// `None` when the rounded value does not fit in an `i64`.
    ///
    /// ## Example
    /// ```rust
    /// use lodging_core::money::Money;
    ///
    /// assert_eq!(Money::round_half_up(5, 2).unwrap().cents(), 3);   // 2.5 → 3
    /// assert_eq!(Money::round_half_up(-5, 2).unwrap().cents(), -3); // -2.5 → -3
    /// assert_eq!(Money::round_half_up(7, 3).unwrap().cents(), 2);   // 2.33 → 2
    /// assert!(Money::round_half_up(i128::from(i64::MAX) * 4, 2).is_none());
    /// ```
    pub fn round_half_up(numerator: i128, denominator: i128) -> Option<Self> {
        debug_assert!(denominator > 0, "denominator must be positive");
        let magnitude = numerator
            .checked_abs()?
            .checked_mul(2)?
            .checked_add(denominator)?
            / (denominator * 2);
        let cents = if numerator < 0 { -magnitude } else { magnitude };
        i64::try_from(cents).ok().map(Money)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
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

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Calculates tax on this amount, rounded half-up to the cent.
    ///
    /// ## Example
    /// ```rust
    /// use lodging_core::money::Money;
    /// use lodging_core::types::TaxRate;
    ///
    /// let room_price = Money::from_major(2600);
    /// let tax = room_price.calculate_tax(TaxRate::from_bps(1200)); // 12%
    /// assert_eq!(tax, Some(Money::from_major(312)));
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Option<Money> {
        Money::round_half_up(self.0 as i128 * rate.bps() as i128, BPS_SCALE)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering, e.g. `2937.00` or `-2937.00`.
///
/// Currency symbols are a presentation concern of the caller.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Negation turns a charge into its refund.
impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents_and_major() {
        let money = Money::from_cents(100_050);
        assert_eq!(money.major(), 1000);
        assert_eq!(money.cents_part(), 50);
        assert_eq!(Money::from_major(25).cents(), 2500);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(293_700).to_string(), "2937.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-293_700).to_string(), "-2937.00");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!((-a).cents(), -1000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(Money::round_half_up(25, 10), Some(Money::from_cents(3)));
        assert_eq!(Money::round_half_up(24, 10), Some(Money::from_cents(2)));
        assert_eq!(Money::round_half_up(-25, 10), Some(Money::from_cents(-3)));
        assert_eq!(Money::round_half_up(0, 10), Some(Money::zero()));
    }

    #[test]
    fn test_overflow_is_reported_not_wrapped() {
        assert_eq!(Money::round_half_up(i128::from(i64::MAX) * 10, 1), None);
        assert_eq!(Money::round_half_up(i128::MAX, 1), None);
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
        assert_eq!(
            Money::from_cents(1).checked_add(Money::from_cents(2)),
            Some(Money::from_cents(3))
        );
    }

    #[test]
    fn test_tax_rounds_half_up() {
        // 0.05 at 12% = 0.006 → 0.01
        let tax = Money::from_cents(5).calculate_tax(TaxRate::from_bps(1200));
        assert_eq!(tax, Some(Money::from_cents(1)));

        // 0.04 at 12% = 0.0048 → 0.00
        let tax = Money::from_cents(4).calculate_tax(TaxRate::from_bps(1200));
        assert_eq!(tax, Some(Money::zero()));
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_cents(1).is_positive());
        assert!(Money::from_cents(-1).is_negative());
        assert_eq!(Money::from_cents(-550).abs().cents(), 550);
    }
}
