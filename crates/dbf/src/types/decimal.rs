//! Exact decimal values for Numeric and Float fields.

use std::fmt;
use std::str::FromStr;

use bigdecimal::num_bigint::BigInt;
use bigdecimal::{BigDecimal, ToPrimitive};
use thiserror::Error;

/// Error returned when text is not a plain decimal literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid decimal literal {0:?}")]
pub struct ParseDecimalError(pub String);

/// An arbitrary-precision base-10 number.
///
/// Parsing keeps every digit it is given, so `"1.50"` displays with two
/// decimals; equality compares numeric value. Field text up to 255 digits
/// wide parses without loss.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal(BigDecimal);

impl Decimal {
    /// Build a decimal from unscaled digits and a scale: `digits * 10^-scale`.
    #[must_use]
    pub fn new(digits: i128, scale: u32) -> Self {
        Self(BigDecimal::new(BigInt::from(digits), i64::from(scale)))
    }

    /// Number of digits after the decimal point.
    #[must_use]
    pub fn scale(&self) -> i64 {
        self.0.fractional_digit_count()
    }

    /// The underlying `BigDecimal`.
    #[must_use]
    pub fn as_big_decimal(&self) -> &BigDecimal {
        &self.0
    }

    /// Integer value, if the fractional part is zero and it fits an `i64`.
    #[must_use]
    pub fn to_i64_exact(&self) -> Option<i64> {
        if !self.0.is_integer() {
            return None;
        }
        self.0.to_i64()
    }

    /// Nearest `f64`.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }

    /// Re-express with exactly `scale` fractional digits, without rounding.
    ///
    /// Returns `None` when digits would be lost.
    #[must_use]
    pub fn rescale(&self, scale: u32) -> Option<Self> {
        let rescaled = self.0.with_scale(i64::from(scale));
        (rescaled == self.0).then_some(Self(rescaled))
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self(BigDecimal::from(value))
    }
}

impl From<BigDecimal> for Decimal {
    fn from(value: BigDecimal) -> Self {
        Self(value)
    }
}

impl From<Decimal> for BigDecimal {
    fn from(value: Decimal) -> Self {
        value.0
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    /// Accepts an optional sign, digits, and at most one decimal point.
    /// Exponents and digit separators are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDecimalError(s.to_string());
        let text = s.trim();
        let (negative, unsigned) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err());
        }
        if !int_part
            .bytes()
            .chain(frac_part.bytes())
            .all(|b| b.is_ascii_digit())
        {
            return Err(err());
        }
        let scale = i64::try_from(frac_part.len()).map_err(|_| err())?;
        let mut digits: BigInt = format!("{int_part}{frac_part}")
            .parse()
            .map_err(|_| err())?;
        if negative {
            digits = -digits;
        }
        Ok(Self(BigDecimal::new(digits, scale)))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_plain_string())
    }
}
