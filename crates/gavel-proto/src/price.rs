//! Fixed-point monetary amounts.
//!
//! The auction server stores every price as a decimal with two fractional
//! digits, so amounts are kept as integer minor units (cents) rather than
//! binary floats. This keeps comparisons exact and lets the wire format carry
//! prices as decimal strings without any locale or rounding ambiguity.
//!
//! # Wire Representation
//!
//! - Serialized as a decimal string with exactly two fractional digits
//!   (`"15.00"`).
//! - Deserialized from a decimal string (`"10.00"`, `"15"`) or a JSON number
//!   (`10`, `10.5`). Floating numbers are rounded half away from zero to the
//!   nearest minor unit.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::errors::PriceError;

/// Number of fractional digits carried by a [`Price`].
pub const SCALE_DIGITS: usize = 2;

/// Minor units per whole currency unit.
pub const MINOR_UNITS: i64 = 100;

/// Largest whole amount accepted from a JSON float before conversion.
const MAX_FLOAT_UNITS: f64 = 9.0e16;

/// A monetary amount with two fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(i64);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Create a price from integer minor units (cents).
    pub const fn from_minor_units(minor: i64) -> Self {
        Self(minor)
    }

    /// Create a price from whole currency units.
    ///
    /// Returns `None` on overflow.
    pub fn from_units(units: i64) -> Option<Self> {
        units.checked_mul(MINOR_UNITS).map(Self)
    }

    /// The amount in integer minor units.
    pub const fn minor_units(self) -> i64 {
        self.0
    }

    /// True for amounts strictly greater than zero.
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Render as a dollar amount with grouped thousands, e.g. `$1,234.50`.
    pub fn to_currency_string(self) -> String {
        let magnitude = self.0.unsigned_abs();
        let whole = (magnitude / MINOR_UNITS.unsigned_abs()).to_string();
        let fraction = magnitude % MINOR_UNITS.unsigned_abs();

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (index, digit) in whole.chars().enumerate() {
            if index > 0 && (whole.len() - index) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }

        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{sign}${grouped}.{fraction:02}")
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_f64(value: f64) -> Result<Self, PriceError> {
        if !value.is_finite() || value.abs() >= MAX_FLOAT_UNITS {
            return Err(PriceError::Overflow);
        }
        Ok(Self((value * 100.0).round() as i64))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{sign}{}.{:02}",
            magnitude / MINOR_UNITS.unsigned_abs(),
            magnitude % MINOR_UNITS.unsigned_abs()
        )
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let (negative, digits) = if let Some(rest) = trimmed.strip_prefix('-') {
            (true, rest)
        } else if let Some(rest) = trimmed.strip_prefix('+') {
            (false, rest)
        } else {
            (false, trimmed)
        };

        if digits.is_empty() {
            return Err(PriceError::Empty);
        }

        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction)
        {
            return Err(PriceError::Malformed { input: input.to_string() });
        }
        if fraction.len() > SCALE_DIGITS {
            return Err(PriceError::TooPrecise { digits: fraction.len() });
        }

        let whole_units: i64 =
            if whole.is_empty() { 0 } else { whole.parse().map_err(|_| PriceError::Overflow)? };

        let mut fraction_units: i64 = 0;
        for position in 0..SCALE_DIGITS {
            let digit = fraction.as_bytes().get(position).map_or(0, |b| i64::from(b - b'0'));
            fraction_units = fraction_units * 10 + digit;
        }

        let minor = whole_units
            .checked_mul(MINOR_UNITS)
            .and_then(|units| units.checked_add(fraction_units))
            .ok_or(PriceError::Overflow)?;

        Ok(Self(if negative { -minor } else { minor }))
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }
}

struct PriceVisitor;

impl de::Visitor<'_> for PriceVisitor {
    type Value = Price;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal string or number")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Price, E> {
        value.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Price, E> {
        i64::try_from(value)
            .ok()
            .and_then(Price::from_units)
            .ok_or_else(|| E::custom(PriceError::Overflow))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Price, E> {
        Price::from_units(value).ok_or_else(|| E::custom(PriceError::Overflow))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Price, E> {
        Price::from_f64(value).map_err(E::custom)
    }
}
