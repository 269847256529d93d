//! Fixed-point money, price, and quantity types
//!
//! All monetary values are integer cents; contract prices are integer cents
//! in the closed range [1, 99]; share quantities are whole contracts.
//! No floating-point arithmetic anywhere in the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// A complete set (1 YES + 1 NO) is always worth exactly $1.00.
pub const COMPLETE_SET_CENTS: i64 = 100;

/// Signed fixed-point money amount in integer cents.
///
/// Two implied decimal places. Balances and cost bases are non-negative;
/// ledger entry amounts use the full signed range (positive for credit,
/// negative for debit).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Cents(i64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    /// One dollar, the settlement value of a winning share.
    pub const DOLLAR: Cents = Cents(100);

    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Cost of `quantity` complete sets at $1.00 each.
    pub fn for_sets(quantity: Quantity) -> Self {
        Self(COMPLETE_SET_CENTS * quantity.get() as i64)
    }

    pub const fn get(&self) -> i64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl Add for Cents {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Cents {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Cents {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl AddAssign for Cents {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Cents {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Cents>>(iter: I) -> Self {
        iter.fold(Cents::ZERO, |acc, c| acc + c)
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
    }
}

/// Contract price in integer cents.
///
/// Invariant: 1 <= price <= 99. A price of 0 or 100 is rejected because
/// either side being free is equivalent to settlement and must not trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(u32);

impl Price {
    pub const MIN: Price = Price(1);
    pub const MAX: Price = Price(99);

    /// Create a new Price.
    ///
    /// # Panics
    /// Panics if the price is outside [1, 99].
    pub fn new(cents: u32) -> Self {
        assert!(
            (1..=99).contains(&cents),
            "Price must be in 1..=99 cents, got {}",
            cents
        );
        Self(cents)
    }

    /// Try to create a Price, returning None if outside [1, 99].
    pub fn try_new(cents: u32) -> Option<Self> {
        (1..=99).contains(&cents).then_some(Self(cents))
    }

    pub const fn get(&self) -> u32 {
        self.0
    }

    /// The implied price of the opposite contract: `100 - price`.
    ///
    /// Always in range, since the complement of [1, 99] is [1, 99].
    pub fn complement(&self) -> Price {
        Price(100 - self.0)
    }

    /// Total cost of `quantity` contracts at this price.
    pub fn cost(&self, quantity: Quantity) -> Cents {
        Cents::new(self.0 as i64 * quantity.get() as i64)
    }
}

impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u32(self.0)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let cents = u32::deserialize(deserializer)?;
        Price::try_new(cents)
            .ok_or_else(|| serde::de::Error::custom("price must be in 1..=99 cents"))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}c", self.0)
    }
}

/// Whole-contract share quantity.
///
/// Order quantities must be positive; `zero()` exists for fill accumulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(u64);

impl Quantity {
    /// Create a new Quantity.
    ///
    /// # Panics
    /// Panics if the quantity is zero.
    pub fn new(contracts: u64) -> Self {
        assert!(contracts > 0, "Quantity must be positive");
        Self(contracts)
    }

    /// Try to create a Quantity, returning None if zero.
    pub fn try_new(contracts: u64) -> Option<Self> {
        (contracts > 0).then_some(Self(contracts))
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn get(&self) -> u64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        assert!(
            self.0 >= rhs.0,
            "Quantity subtraction would result in negative"
        );
        Self(self.0 - rhs.0)
    }
}

impl Serialize for Quantity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Zero is allowed on the wire (filled_quantity of a fresh order).
        Ok(Self(u64::deserialize(deserializer)?))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
