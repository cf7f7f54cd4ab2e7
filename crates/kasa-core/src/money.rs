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
//! │  OUR SOLUTION: Integer minor units (kuruş for TRY, cents for USD)       │
//! │    Every price, total and VAT amount in the system is an i64 count      │
//! │    of the currency's smallest unit. Conversion to display units         │
//! │    happens only at the formatting boundary.                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## VAT Decomposition
//! Prices are stored and transmitted tax-INCLUSIVE (gross). The net portion
//! is derived by inverse decomposition:
//!
//! ```text
//!   net = gross / (1 + rate/100)          (rounded half-up to minor units)
//!   vat = gross - net                      (exact by construction)
//! ```
//!
//! Half-up rounding is the documented rule and is applied consistently for
//! every unit price; because `vat` is defined as the remainder, `net + vat`
//! always reconstructs the gross amount exactly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (kuruş, cents, ...).
///
/// ## Design Decisions
/// - **i64 (signed)**: allows negative values for debt adjustments
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use kasa_core::money::Money;
    ///
    /// let price = Money::from_minor(1099); // 10.99 in display units
    /// assert_eq!(price.minor(), 1099);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (lira, dollars, ...).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
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

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Splits a gross (tax-inclusive) amount into its net portion for the
    /// given VAT rate, rounded half-up to the nearest minor unit.
    ///
    /// ## Formula
    /// `net = gross * 100 / (100 + rate)`, computed in i128 so that large
    /// amounts cannot overflow, with `+ denominator/2` before the division
    /// for half-up rounding.
    ///
    /// ## Example
    /// ```rust
    /// use kasa_core::money::Money;
    ///
    /// let gross = Money::from_minor(10000); // 100.00 gross @ 20% VAT
    /// let net = gross.net_of_vat(20);
    /// assert_eq!(net.minor(), 8333);        // 83.33 net
    /// assert_eq!((gross - net).minor(), 1667); // 16.67 VAT
    /// ```
    ///
    /// A rate of 0 returns the gross amount unchanged: the full amount is
    /// net, the VAT contribution is zero.
    pub fn net_of_vat(&self, rate_percent: u8) -> Money {
        if rate_percent == 0 {
            return *self;
        }
        let denom = 100 + rate_percent as i128;
        let numer = self.0 as i128 * 100;
        // Round half up: works for the non-negative prices validation admits.
        let net = (numer + denom / 2) / denom;
        Money(net as i64)
    }

    /// The VAT portion of a gross amount: the exact remainder after the
    /// net split, so `net + vat == gross` always holds per unit.
    pub fn vat_portion(&self, rate_percent: u8) -> Money {
        *self - self.net_of_vat(rate_percent)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and receipts in tests. The frontend formats amounts
/// itself to handle localization (TR number formatting) properly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

/// Default money is zero.
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

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
