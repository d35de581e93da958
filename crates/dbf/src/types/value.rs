//! Decoded field values.

use std::fmt;

use chrono::{DateTime, Local, NaiveDate};

use super::decimal::Decimal;
use crate::datetime::{format_date, format_date_time};

/// A typed field value, as produced by dispatching on the field type.
#[derive(Debug, Clone, PartialEq)]
pub enum DbfValue {
    /// Blank or undecodable value.
    Null,
    /// Character text.
    String(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Date-time in the local zone.
    DateTime(DateTime<Local>),
    /// Exact decimal (Numeric, Float).
    Decimal(Decimal),
    /// Logical value.
    Boolean(bool),
    /// Binary integer.
    Integer(i32),
    /// Binary double.
    Double(f64),
    /// Memo text.
    Memo(String),
    /// Bytes of a type with no text form.
    Bytes(Vec<u8>),
}

impl DbfValue {
    /// Whether the value is [`DbfValue::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the variant.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::Decimal(_) => "decimal",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Double(_) => "double",
            Self::Memo(_) => "memo",
            Self::Bytes(_) => "bytes",
        }
    }
}

impl<T: Into<DbfValue>> From<Option<T>> for DbfValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<String> for DbfValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<NaiveDate> for DbfValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<DateTime<Local>> for DbfValue {
    fn from(value: DateTime<Local>) -> Self {
        Self::DateTime(value)
    }
}

impl From<Decimal> for DbfValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<bool> for DbfValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for DbfValue {
    fn from(value: i32) -> Self {
        Self::Integer(value)
    }
}

/// Text form: dates as `YYYYMMDD`, date-times as `YYYYMMDDHHmmss`, bytes as hex.
impl fmt::Display for DbfValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::String(s) | Self::Memo(s) => f.write_str(s),
            Self::Date(d) => f.write_str(&format_date(*d)),
            Self::DateTime(dt) => f.write_str(&format_date_time(dt)),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Double(x) => write!(f, "{x}"),
            Self::Bytes(bytes) => bytes.iter().try_for_each(|b| write!(f, "{b:02x}")),
        }
    }
}
