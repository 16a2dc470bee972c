//! # Money Module
//!
//! Provides the `Money` type for monetary values and `TaxRate` for VAT.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  Invoice amounts are summed, split into net + VAT and compared         │
//! │  against cash counts. Any drift shows up as a phantom difference.      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    Every amount is an i64 count of the currency's smallest unit.       │
//! │    Rounding happens exactly once, where a quantity or a rate           │
//! │    multiplies an amount.                                                │
//! │    Derived amounts use checked arithmetic: a result outside the i64    │
//! │    range is refused, never wrapped or clamped.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bodega_core::money::{Money, TaxRate};
//!
//! let unit_cost = Money::from_minor(1000);
//! assert_eq!(unit_cost.checked_times_quantity(3.0), Some(Money::from_minor(3000)));
//!
//! let (net, vat) = Money::from_minor(11900).split_included_tax(TaxRate::from_bps(1900));
//! assert_eq!((net.minor(), vat.minor()), (10000, 1900));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// Serializes as a bare integer, and under the `sqlx` feature is stored as
/// an `INTEGER` column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies a unit amount by a (possibly fractional) quantity.
    ///
    /// The product is rounded to the nearest minor unit, halves away from
    /// zero. Returns `None` when the product is not finite or does not fit
    /// in an `i64`.
    ///
    /// ```rust
    /// use bodega_core::money::Money;
    ///
    /// let times = |unit: i64, quantity: f64| {
    ///     Money::from_minor(unit).checked_times_quantity(quantity).map(|m| m.minor())
    /// };
    /// assert_eq!(times(1000, 3.0), Some(3000));
    /// assert_eq!(times(990, 1.5), Some(1485));
    /// assert_eq!(times(333, 0.5), Some(167));
    /// assert_eq!(times(1000, 1e300), None);
    /// ```
    pub fn checked_times_quantity(&self, quantity: f64) -> Option<Money> {
        // 2^63; `i64::MAX as f64` rounds up to this value
        const LIMIT: f64 = 9_223_372_036_854_775_808.0;

        let product = (self.0 as f64 * quantity).round();
        if product.is_finite() && (-LIMIT..LIMIT).contains(&product) {
            Some(Money(product as i64))
        } else {
            None
        }
    }

    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Money(sum)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_sub(self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(difference) => Some(Money(difference)),
            None => None,
        }
    }

    /// Calculates tax on top of this amount.
    ///
    /// Integer math: `(amount * bps + 5000) / 10000`.
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        Money(div_round(self.0 as i128 * rate.bps() as i128, 10_000) as i64)
    }

    /// Splits a tax-inclusive amount into `(net, tax)`.
    ///
    /// `net = round(gross / (1 + rate))` and `tax = gross - net`, so the two
    /// parts always add back up to the gross amount.
    pub fn split_included_tax(&self, rate: TaxRate) -> (Money, Money) {
        let denominator = 10_000 + rate.bps() as i128;
        let net = div_round(self.0 as i128 * 10_000, denominator) as i64;
        (Money(net), Money(self.0 - net))
    }
}

/// Integer division rounding halves away from zero.
fn div_round(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}", sign, self.0.abs())
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

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1900 bps = 19%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}
