//! # Money Module
//!
//! Provides the `Money` type and the rounding rules used by every charge.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  90 minutes at $99.99/h with 15% off, in floating point:               │
//! │    a chain of float multiplies can land either side of a .5 tie ❌     │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents + one explicit rounding step              │
//! │    rate  = round(9999 × 85 / 100)      = 8499 cents                     │
//! │    fare  = round(90 × 8499 / 60)       = 12749 cents  ($127.49)        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rcreyes_core::money::{Money, RoundingMode};
//!
//! let rate = Money::from_cents(10000); // $100.00 per hour
//! let ninety_minutes = rate.mul_ratio(90, 60, RoundingMode::HalfUp);
//! assert_eq!(ninety_minutes.cents(), 15000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Mul, Sub};
use ts_rs::TS;

// =============================================================================
// Rounding Mode
// =============================================================================

/// How a fractional cent is resolved.
///
/// ## Mode Comparison
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────┐
/// │  value (cents)   HALF_UP (default)   HALF_EVEN (bankers)           │
/// │  ─────────────   ─────────────────   ───────────────────           │
/// │  12.4            12                  12                            │
/// │  12.5            13                  12                            │
/// │  13.5            14                  14                            │
/// │  12.6            13                  13                            │
/// └─────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Ties round away from zero.
    #[default]
    HalfUp,
    /// Ties round to the nearest even cent.
    HalfEven,
}

impl RoundingMode {
    /// Divides `numerator` by a positive `denominator`, resolving the
    /// remainder with this mode.
    pub(crate) fn divide(self, numerator: i128, denominator: i128) -> i128 {
        debug_assert!(denominator > 0);
        let magnitude = numerator.abs();
        let quotient = magnitude / denominator;
        let twice_remainder = (magnitude % denominator) * 2;

        let rounded = match self {
            RoundingMode::HalfUp if twice_remainder >= denominator => quotient + 1,
            RoundingMode::HalfEven if twice_remainder > denominator => quotient + 1,
            RoundingMode::HalfEven if twice_remainder == denominator && quotient % 2 == 1 => {
                quotient + 1
            }
            _ => quotient,
        };

        if numerator < 0 {
            -rounded
        } else {
            rounded
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundingMode::HalfUp => write!(f, "half_up"),
            RoundingMode::HalfEven => write!(f, "half_even"),
        }
    }
}

impl std::str::FromStr for RoundingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "half_up" | "half-up" => Ok(RoundingMode::HalfUp),
            "half_even" | "half-even" | "bankers" => Ok(RoundingMode::HalfEven),
            other => Err(format!(
                "Unknown rounding mode: '{}'. Valid options: half_up, half_even",
                other
            )),
        }
    }
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents.
///
/// ## Where Money is Used
/// ```text
/// Tariff.base_rate_cents ──► resolve_rate() ──► effective hourly rate
///                                                     │
///                        net active minutes ──────────┤
///                                                     ▼
///                                            Charge.amount_cents
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies by `numerator / denominator` and rounds once to cents.
    ///
    /// Widens to i128 so minute counts times rates never overflow.
    ///
    /// ```rust
    /// use rcreyes_core::money::{Money, RoundingMode};
    ///
    /// // 45 minutes at $50.00/h = $37.50
    /// let fare = Money::from_cents(5000).mul_ratio(45, 60, RoundingMode::HalfUp);
    /// assert_eq!(fare.cents(), 3750);
    /// ```
    pub fn mul_ratio(&self, numerator: i64, denominator: i64, mode: RoundingMode) -> Money {
        let product = self.0 as i128 * numerator as i128;
        Money::from_cents(mode.divide(product, denominator as i128) as i64)
    }

    /// Applies a whole-percent discount, rounding the result to cents.
    ///
    /// ```rust
    /// use rcreyes_core::money::{Money, RoundingMode};
    ///
    /// let rate = Money::from_cents(9999);
    /// assert_eq!(rate.apply_percent_discount(15, RoundingMode::HalfUp).cents(), 8499);
    /// ```
    pub fn apply_percent_discount(&self, percent: u8, mode: RoundingMode) -> Money {
        self.mul_ratio(100 - i64::from(percent.min(100)), 100, mode)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders as `$135.00`, the format printed on receipts.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.major().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Multiplication by a unit count (persons billed).
impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, units: u32) -> Self {
        Money(self.0 * i64::from(units))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(13500).to_string(), "$135.00");
        assert_eq!(Money::from_cents(905).to_string(), "$9.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
        assert_eq!(Money::zero().to_string(), "$0.00");
    }

    #[test]
    fn test_half_up_rounding() {
        let mode = RoundingMode::HalfUp;
        assert_eq!(mode.divide(124, 10), 12);
        assert_eq!(mode.divide(125, 10), 13);
        assert_eq!(mode.divide(135, 10), 14);
        assert_eq!(mode.divide(-125, 10), -13);
    }

    #[test]
    fn test_half_even_rounding() {
        let mode = RoundingMode::HalfEven;
        assert_eq!(mode.divide(125, 10), 12);
        assert_eq!(mode.divide(135, 10), 14);
        assert_eq!(mode.divide(126, 10), 13);
    }

    #[test]
    fn test_mul_ratio_fractional_cent() {
        // 1 minute at $1.00/h = 1.666... cents
        let rate = Money::from_cents(100);
        assert_eq!(rate.mul_ratio(1, 60, RoundingMode::HalfUp).cents(), 2);
        // 30 seconds worth = 0.8333 cents
        assert_eq!(rate.mul_ratio(1, 120, RoundingMode::HalfUp).cents(), 1);
    }

    #[test]
    fn test_percent_discount() {
        let rate = Money::from_cents(10000);
        assert_eq!(rate.apply_percent_discount(0, RoundingMode::HalfUp).cents(), 10000);
        assert_eq!(rate.apply_percent_discount(10, RoundingMode::HalfUp).cents(), 9000);

        // $0.99 at 5% off = 94.05 cents
        let odd = Money::from_cents(99);
        assert_eq!(odd.apply_percent_discount(5, RoundingMode::HalfUp).cents(), 94);
        // $0.10 at 5% off = 9.5 cents, 9 is odd so both modes go up
        let tie = Money::from_cents(10);
        assert_eq!(tie.apply_percent_discount(5, RoundingMode::HalfUp).cents(), 10);
        assert_eq!(tie.apply_percent_discount(5, RoundingMode::HalfEven).cents(), 10);
        // $0.30 at 5% off = 28.5 cents, the modes disagree
        let tie = Money::from_cents(30);
        assert_eq!(tie.apply_percent_discount(5, RoundingMode::HalfUp).cents(), 29);
        assert_eq!(tie.apply_percent_discount(5, RoundingMode::HalfEven).cents(), 28);
    }

    #[test]
    fn test_multiply_units() {
        let fare = Money::from_cents(4500);
        assert_eq!((fare * 3u32).cents(), 13500);
    }

    #[test]
    fn test_rounding_mode_parsing() {
        assert_eq!("half_up".parse::<RoundingMode>().unwrap(), RoundingMode::HalfUp);
        assert_eq!("bankers".parse::<RoundingMode>().unwrap(), RoundingMode::HalfEven);
        assert!("truncate".parse::<RoundingMode>().is_err());
    }
}
