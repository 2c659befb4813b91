//! Amount type for handling monetary values as exact decimals.
//!
//! This module provides the `Amount` type which wraps `Decimal`. Every `Amount` carries exactly
//! two fraction digits and at most ten integer digits, which is what the `transactions` table
//! stores.

use rust_decimal::Decimal;
use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// The number of fraction digits every amount is stored with.
pub const FRACTION_DIGITS: u32 = 2;

/// The maximum number of digits, integer and fraction combined.
pub const MAX_DIGITS: u32 = 12;

/// Represents a monetary amount with exactly two fraction digits.
///
/// # Examples
///
/// ```
/// # use ledger_report::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("42.5").unwrap();
/// assert_eq!(amount.to_string(), "42.50");
/// ```
///
/// More than two fraction digits is rejected rather than rounded:
/// ```
/// # use ledger_report::model::Amount;
/// # use std::str::FromStr;
/// assert!(Amount::from_str("1.005").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    value: Decimal,
}

impl Amount {
    /// Creates an `Amount` from `value`, checking its precision. The scale of `value` counts as
    /// written, so `12.3400` has four fraction digits and is rejected.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.scale() > FRACTION_DIGITS {
            return Err(AmountError::TooManyFractionDigits(value));
        }
        let mut value = value;
        value.rescale(FRACTION_DIGITS);
        if value.abs() >= Decimal::from(10_i64.pow(MAX_DIGITS - FRACTION_DIGITS)) {
            return Err(AmountError::TooManyDigits(value));
        }
        Ok(Self { value })
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }
}

/// An error that can occur when parsing or constructing an `Amount`.
pub enum AmountError {
    /// The text is not a decimal number.
    Parse(rust_decimal::Error),
    /// The value has more than two fraction digits.
    TooManyFractionDigits(Decimal),
    /// The value has more than ten integer digits.
    TooManyDigits(Decimal),
}

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Parse(e) => write!(f, "A valid number is required: {e}"),
            AmountError::TooManyFractionDigits(v) => write!(
                f,
                "Ensure that there are no more than {FRACTION_DIGITS} decimal places in {v}"
            ),
            AmountError::TooManyDigits(v) => write!(
                f,
                "Ensure that there are no more than {} digits before the decimal point in {v}",
                MAX_DIGITS - FRACTION_DIGITS
            ),
        }
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AmountError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(AmountError::Parse)?;
        Amount::new(value)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.value, f)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

/// Accepts amounts written either as JSON strings (`"10.00"`) or as JSON numbers (`10.5`).
struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str("a decimal amount as a string or number")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Amount::from_str(v).map_err(E::custom)
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Amount::new(Decimal::from(v)).map_err(E::custom)
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Amount::new(Decimal::from(v)).map_err(E::custom)
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        // The shortest round-trip text of the float is what the JSON document said.
        Amount::from_str(&v.to_string()).map_err(E::custom)
    }
}
