//! # Money Module
//!
//! The `Money` type: every price, total, balance and credit limit in the
//! system is an integer number of centavos.
//!
//! ## Where Money Flows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Product.sale_price_cents ──► line gross (× quantity)                   │
//! │                                    │                                    │
//! │                                    ▼                                    │
//! │                        line net (− line discount %)                     │
//! │                                    │                                    │
//! │                                    ▼                                    │
//! │     subtotal (Σ line net) ──► tax (IVA) ──► total (− general discount)  │
//! │                                                   │                     │
//! │                                                   ▼                     │
//! │                         credit sale: pending balance = total − down pmt │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use ruedas_core::money::Money;
//! use ruedas_core::types::DiscountRate;
//!
//! let chain = Money::from_cents(45_000);           // $450.00
//! let pair = chain.checked_multiply_quantity(2);   // Some($900.00)
//! let net = pair.unwrap().apply_discount(DiscountRate::from_bps(1000));
//! assert_eq!(net.cents(), 81_000);                 // $810.00
//! ```
//!
//! Sale math goes through the `checked_*` operations: an amount that
//! leaves the i64 range comes back as `None` instead of wrapping.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

use crate::types::{DiscountRate, TaxRate};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in centavos (1/100 of a peso).
///
/// Signed so that refunds and over-discounted totals stay representable
/// instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    ///
    /// ## Example
    /// ```rust
    /// use ruedas_core::money::Money;
    ///
    /// let tube = Money::from_cents(8_950); // $89.50
    /// assert_eq!(tube.cents(), 8_950);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whole pesos, truncated toward zero.
    #[inline]
    pub const fn pesos(&self) -> i64 {
        self.0 / 100
    }

    /// Centavos portion (always 0-99).
    #[inline]
    pub const fn centavos_part(&self) -> i64 {
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

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax on this amount.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`, in i128 so large
    /// tickets never overflow. The +5000 rounds half up.
    ///
    /// ## Example
    /// ```rust
    /// use ruedas_core::money::Money;
    /// use ruedas_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(18_000); // $180.00
    /// let iva = subtotal.calculate_tax(TaxRate::from_bps(1600));
    /// assert_eq!(iva.cents(), 2_880);           // $28.80
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        Money::from_cents(scale_bps(self.0, rate.bps()))
    }

    /// Portion of this amount removed by a percentage discount.
    pub fn discount_amount(&self, rate: DiscountRate) -> Money {
        Money::from_cents(scale_bps(self.0, rate.bps()))
    }

    /// Amount left after a percentage discount.
    ///
    /// ## Example
    /// ```rust
    /// use ruedas_core::money::Money;
    /// use ruedas_core::types::DiscountRate;
    ///
    /// let gross = Money::from_cents(20_000);
    /// let net = gross.apply_discount(DiscountRate::from_percentage(10.0));
    /// assert_eq!(net.cents(), 18_000);
    /// ```
    pub fn apply_discount(&self, rate: DiscountRate) -> Money {
        *self - self.discount_amount(rate)
    }

    /// Multiplies a unit price by a quantity. `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use ruedas_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(8_950).checked_multiply_quantity(3), Some(Money::from_cents(26_850)));
    /// assert_eq!(Money::from_cents(i64::MAX / 2 + 1).checked_multiply_quantity(2), None);
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_sub(self, other: Money) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

fn scale_bps(cents: i64, bps: u32) -> i64 {
    ((cents as i128 * bps as i128 + 5000) / 10000) as i64
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented display (`$1234.50`). Localized formatting belongs to
/// the front-end.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.pesos().abs(), self.centavos_part())
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

// =============================================================================
// Unit Tests
// =============================================================================
