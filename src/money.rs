//! Fixed-point monetary amounts.
//!
//! Uses `rust_decimal` so that the waterfall identities
//! (`second_plus = mdr - ic - first_plus` and friends) hold exactly.
//!
//! Two parsing policies exist and are deliberately separate:
//!
//! - [`Money::parse_strict`] fails on anything that is not a number. The
//!   validity filter uses it, because an unparseable amount is itself a
//!   rejection reason.
//! - [`Money::parse_lenient`] never fails and returns zero for empty or
//!   garbage input. The fee loader uses it for every amount column.

use rust_decimal::prelude::*;
use serde::{Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// A decimal amount in a single (implicit) currency.
///
/// Arithmetic keeps full precision; rounding happens only when rendering.
/// Addition and subtraction saturate at the bounds of `Decimal` rather
/// than overflowing.
///
/// # Examples
///
/// ```
/// use icpp_breakdown::Money;
///
/// let mdr = Money::parse_strict("3.00").unwrap();
/// let ic = Money::parse_strict("1.5").unwrap();
/// assert_eq!((mdr - ic).to_string(), "1.50");
/// assert_eq!(Money::parse_lenient("n/a"), Money::ZERO);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Money(Decimal);

impl Money {
    /// Number of decimal places used when rendering.
    pub const DISPLAY_SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Money(Decimal::ZERO);

    /// Wraps a raw decimal.
    pub fn new(value: Decimal) -> Self {
        Money(value)
    }

    /// Parses a number, failing on empty or non-numeric input.
    ///
    /// Surrounding whitespace is ignored. Plain decimal notation and
    /// scientific notation (`1.5E-2`, as spreadsheets sometimes store
    /// numeric cells) are both accepted. Values outside the `Decimal` range
    /// (magnitude above about 7.9e28, or more than 28 decimal places) are
    /// errors.
    pub fn parse_strict(s: &str) -> Result<Self, rust_decimal::Error> {
        let trimmed = s.trim();
        Decimal::from_str(trimmed)
            .or_else(|err| {
                if trimmed.contains(['e', 'E']) {
                    Decimal::from_scientific(trimmed)
                } else {
                    Err(err)
                }
            })
            .map(Money)
    }

    /// Parses a number, returning zero on empty or non-numeric input.
    ///
    /// Never fails.
    pub fn parse_lenient(s: &str) -> Self {
        Self::parse_strict(s).unwrap_or(Self::ZERO)
    }

    /// Returns `true` if this value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns `true` if this value is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Absolute value.
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns the underlying decimal.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// `abs(self / volume * 100)`, or zero when `volume` is not positive.
    pub fn percent_of(&self, volume: Money) -> Self {
        if !volume.is_positive() {
            return Self::ZERO;
        }
        self.0
            .checked_div(volume.0)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map(|pct| Money(pct.abs()))
            .unwrap_or(Self::ZERO)
    }

    /// Renders with `dp` decimal places, rounding half away from zero.
    pub fn format_dp(&self, dp: u32) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
        format!("{:.*}", dp as usize, rounded)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_dp(Self::DISPLAY_SCALE))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_sub(rhs.0);
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
