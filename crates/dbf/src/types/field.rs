//! Field definitions.

use std::fmt;
use std::str::FromStr;

use crate::error::{DbfError, Result};

/// Maximum field name length in a descriptor.
pub const FIELD_NAME_LEN: usize = 11;

/// Field type tag (descriptor byte 11).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbfFieldType {
    /// `C` - space-padded text.
    Character,
    /// `Y` - 8-byte scaled currency.
    Currency,
    /// `N` - right-aligned decimal text.
    Numeric,
    /// `F` - decimal text, dBASE IV float.
    Float,
    /// `D` - `YYYYMMDD`.
    Date,
    /// `T` - binary Julian date-time (8 bytes) or `YYYYMMDDHHmmss` text.
    DateTime,
    /// `B` - 8-byte IEEE double.
    Double,
    /// `I` - little-endian i32.
    Integer,
    /// `L` - `T`/`F`/`Y`/`N`/`?`.
    Logical,
    /// `M` - memo block pointer.
    Memo,
    /// `G` - OLE object in the memo store.
    General,
    /// `P` - picture in the memo store.
    Picture,
    /// `@` - dBASE 7 timestamp.
    Timestamp,
    /// `+` - dBASE 7 autoincrement.
    AutoIncrement,
    /// `0` - Visual FoxPro null flags (system field).
    NullFlags,
    /// `V` - Visual FoxPro varchar.
    Varchar,
    /// `Q` - Visual FoxPro varbinary.
    Varbinary,
    /// `W` - Visual FoxPro blob.
    Blob,
}

impl DbfFieldType {
    /// Every known type tag.
    pub const ALL: [Self; 18] = [
        Self::Character,
        Self::Currency,
        Self::Numeric,
        Self::Float,
        Self::Date,
        Self::DateTime,
        Self::Double,
        Self::Integer,
        Self::Logical,
        Self::Memo,
        Self::General,
        Self::Picture,
        Self::Timestamp,
        Self::AutoIncrement,
        Self::NullFlags,
        Self::Varchar,
        Self::Varbinary,
        Self::Blob,
    ];

    /// Parse a descriptor type byte.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.to_byte() == byte)
    }

    /// Parse a type character (as used in field definition strings).
    #[must_use]
    pub fn from_char(ch: char) -> Option<Self> {
        u8::try_from(ch).ok().and_then(Self::from_byte)
    }

    /// Descriptor type byte.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::Character => b'C',
            Self::Currency => b'Y',
            Self::Numeric => b'N',
            Self::Float => b'F',
            Self::Date => b'D',
            Self::DateTime => b'T',
            Self::Double => b'B',
            Self::Integer => b'I',
            Self::Logical => b'L',
            Self::Memo => b'M',
            Self::General => b'G',
            Self::Picture => b'P',
            Self::Timestamp => b'@',
            Self::AutoIncrement => b'+',
            Self::NullFlags => b'0',
            Self::Varchar => b'V',
            Self::Varbinary => b'Q',
            Self::Blob => b'W',
        }
    }

    /// Type character.
    #[must_use]
    pub const fn to_char(self) -> char {
        self.to_byte() as char
    }

    /// Type name used in messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Character => "Character",
            Self::Currency => "Currency",
            Self::Numeric => "Numeric",
            Self::Float => "Float",
            Self::Date => "Date",
            Self::DateTime => "DateTime",
            Self::Double => "Double",
            Self::Integer => "Integer",
            Self::Logical => "Logical",
            Self::Memo => "Memo",
            Self::General => "General",
            Self::Picture => "Picture",
            Self::Timestamp => "Timestamp",
            Self::AutoIncrement => "AutoIncrement",
            Self::NullFlags => "NullFlags",
            Self::Varchar => "Varchar",
            Self::Varbinary => "Varbinary",
            Self::Blob => "Blob",
        }
    }

    /// Whether the type stores decimal text.
    #[must_use]
    pub const fn is_decimal_text(self) -> bool {
        matches!(self, Self::Numeric | Self::Float)
    }
}

impl fmt::Display for DbfFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One column of a table.
///
/// `offset` is the byte position inside a record buffer. It is assigned when
/// the field becomes part of a [`DbfMetadata`](crate::DbfMetadata); position 0
/// is the deletion marker, so the first field sits at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbfField {
    /// Field name (at most 11 ASCII bytes).
    pub name: String,
    /// Type tag.
    pub field_type: DbfFieldType,
    /// Width in the record buffer.
    pub length: u8,
    /// Digits after the decimal point (Numeric/Float).
    pub decimal_count: u8,
    pub(crate) offset: usize,
}

impl DbfField {
    /// Create a field definition.
    pub fn new(
        name: impl Into<String>,
        field_type: DbfFieldType,
        length: u8,
        decimal_count: u8,
    ) -> Self {
        Self {
            name: name.into(),
            field_type,
            length,
            decimal_count,
            offset: 0,
        }
    }

    /// Character field.
    pub fn character(name: impl Into<String>, length: u8) -> Self {
        Self::new(name, DbfFieldType::Character, length, 0)
    }

    /// Numeric field.
    pub fn numeric(name: impl Into<String>, length: u8, decimal_count: u8) -> Self {
        Self::new(name, DbfFieldType::Numeric, length, decimal_count)
    }

    /// Date field (8 bytes).
    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, DbfFieldType::Date, 8, 0)
    }

    /// Binary date-time field (8 bytes).
    pub fn date_time(name: impl Into<String>) -> Self {
        Self::new(name, DbfFieldType::DateTime, 8, 0)
    }

    /// Logical field (1 byte).
    pub fn logical(name: impl Into<String>) -> Self {
        Self::new(name, DbfFieldType::Logical, 1, 0)
    }

    /// Integer field (4 bytes).
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, DbfFieldType::Integer, 4, 0)
    }

    /// Memo field with a 10-character decimal block pointer.
    pub fn memo(name: impl Into<String>) -> Self {
        Self::new(name, DbfFieldType::Memo, 10, 0)
    }

    /// Width as `usize`.
    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.length)
    }

    /// Whether the field occupies no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Byte position inside the record buffer.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Byte range inside the record buffer.
    #[must_use]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len()
    }

    /// `name,type,length,decimals` form.
    #[must_use]
    pub fn definition_string(&self) -> String {
        format!(
            "{},{},{},{}",
            self.name,
            self.field_type.to_char(),
            self.length,
            self.decimal_count
        )
    }
}

impl FromStr for DbfField {
    type Err = DbfError;

    /// Parse `name,type,length,decimals`.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [name, type_str, length, decimals] = parts.as_slice() else {
            return Err(DbfError::invalid_definition(
                s,
                format!("expected 4 comma-separated parts, got {}", parts.len()),
            ));
        };
        if name.is_empty() {
            return Err(DbfError::invalid_definition(s, "empty field name"));
        }
        let type_char = type_str
            .chars()
            .next()
            .ok_or_else(|| DbfError::invalid_definition(s, "empty type"))?;
        let field_type = DbfFieldType::from_char(type_char)
            .ok_or_else(|| DbfError::invalid_definition(s, format!("unknown type '{type_char}'")))?;
        let length: u8 = length
            .parse()
            .map_err(|_| DbfError::invalid_definition(s, format!("invalid length {length:?}")))?;
        let decimal_count: u8 = decimals.parse().map_err(|_| {
            DbfError::invalid_definition(s, format!("invalid decimal count {decimals:?}"))
        })?;
        Ok(Self::new(*name, field_type, length, decimal_count))
    }
}

impl fmt::Display for DbfField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.definition_string())
    }
}

/// Parse a `|`-separated list of field definitions; blank entries are skipped.
pub fn parse_field_definitions(s: &str) -> Result<Vec<DbfField>> {
    s.split('|')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse)
        .collect()
}
