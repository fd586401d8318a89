//! # Money Module
//!
//! Dual-currency monetary types for Bodegon POS.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    All USD amounts are i64 cents, all Bs amounts are i64 céntimos.      │
//! │    The one place a float exists is the exchange rate multiplier,        │
//! │    and the rounding there is explicit.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bodegon_core::money::{ExchangeRate, Money};
//!
//! let price = Money::from_cents(3000); // $30.00 (a case at local rate)
//! let rate = ExchangeRate::new(36.5);  // Bs per USD
//!
//! assert_eq!(price.to_bs(rate).cents(), 109_500); // Bs 1.095,00
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money (USD)
// =============================================================================

/// A USD amount in cents (smallest currency unit).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for corrections/refunds
/// - **Single field tuple struct**: Zero-cost abstraction over i64
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is strictly positive.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Converts to bolívares at the given exchange rate.
    ///
    /// The single float multiplication in the money path. Rounds half
    /// away from zero to whole Bs céntimos.
    #[inline]
    pub fn to_bs(&self, rate: ExchangeRate) -> Bolivars {
        Bolivars(((self.0 as f64) * rate.bs_per_usd()).round() as i64)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Mul<i64> for Money {
    type Output = Money;

    fn mul(self, rhs: i64) -> Money {
        Money(self.0 * rhs)
    }
}

impl fmt::Display for Money {
    /// Formats as `$12.34` (or `-$5.50` for negative values).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
    }
}

// =============================================================================
// Bolivars (Bs)
// =============================================================================

/// A bolívar amount in céntimos.
///
/// Mirrors [`Money`]'s integer-cents API. Displayed in `es-VE`
/// convention: thousands separated by `.`, decimals by `,`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Bolivars(i64);

impl Bolivars {
    /// Creates a Bolivars value from céntimos.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Bolivars(cents)
    }

    /// Returns the value in céntimos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero bolívar value.
    #[inline]
    pub const fn zero() -> Self {
        Bolivars(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Add for Bolivars {
    type Output = Bolivars;

    fn add(self, rhs: Bolivars) -> Bolivars {
        Bolivars(self.0 + rhs.0)
    }
}

impl AddAssign for Bolivars {
    fn add_assign(&mut self, rhs: Bolivars) {
        self.0 += rhs.0;
    }
}

impl Sub for Bolivars {
    type Output = Bolivars;

    fn sub(self, rhs: Bolivars) -> Bolivars {
        Bolivars(self.0 - rhs.0)
    }
}

impl Mul<i64> for Bolivars {
    type Output = Bolivars;

    fn mul(self, rhs: i64) -> Bolivars {
        Bolivars(self.0 * rhs)
    }
}

impl fmt::Display for Bolivars {
    /// Formats as `1.234,56` (es-VE grouping, no currency symbol).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        let whole = (abs / 100).to_string();
        let frac = abs % 100;

        // Insert a '.' every three digits from the right.
        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        let digits = whole.as_bytes();
        for (i, d) in digits.iter().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(*d as char);
        }

        write!(f, "{}{},{:02}", sign, grouped, frac)
    }
}

// =============================================================================
// Exchange Rate
// =============================================================================

/// Bolívares per US dollar.
///
/// Rate *fetching* is an external concern; the engine only stores the
/// last value it was handed. A zero (unset) rate yields zero Bs prices,
/// never an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExchangeRate(f64);

impl ExchangeRate {
    /// Creates an exchange rate. Negative inputs are clamped to zero.
    #[inline]
    pub fn new(bs_per_usd: f64) -> Self {
        ExchangeRate(bs_per_usd.max(0.0))
    }

    /// Returns the Bs-per-USD multiplier.
    #[inline]
    pub const fn bs_per_usd(&self) -> f64 {
        self.0
    }

    /// Checks whether a rate has been set.
    #[inline]
    pub fn is_set(&self) -> bool {
        self.0 > 0.0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_cents(3000);
        let b = Money::from_cents(1600);

        assert_eq!((a + b).cents(), 4600);
        assert_eq!((a - b).cents(), 1400);
        assert_eq!((b * 5).cents(), 8000);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "$10.99");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
        assert_eq!(Money::zero().to_string(), "$0.00");
    }

    #[test]
    fn test_to_bs_rounds_half_away_from_zero() {
        let rate = ExchangeRate::new(36.555);
        // $1.00 * 36.555 = Bs 36,555 -> 3655.5 céntimos -> 3656
        assert_eq!(Money::from_cents(100).to_bs(rate).cents(), 3656);
    }

    #[test]
    fn test_unset_rate_yields_zero_bs() {
        let rate = ExchangeRate::default();
        assert!(!rate.is_set());
        assert_eq!(Money::from_cents(5000).to_bs(rate), Bolivars::zero());
    }

    #[test]
    fn test_bolivars_display_es_ve_grouping() {
        assert_eq!(Bolivars::from_cents(123_456).to_string(), "1.234,56");
        assert_eq!(Bolivars::from_cents(5_00).to_string(), "5,00");
        assert_eq!(Bolivars::from_cents(987_654_321).to_string(), "9.876.543,21");
        assert_eq!(Bolivars::from_cents(-123_456).to_string(), "-1.234,56");
    }

    #[test]
    fn test_negative_rate_clamped() {
        assert!(!ExchangeRate::new(-5.0).is_set());
    }
}
