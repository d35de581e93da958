//! Record decoding and encoding.
//!
//! A record is a private copy of one fixed-width buffer. Byte 0 is the
//! deletion marker; each field occupies `[offset, offset + length)`.
//! Read accessors never modify the buffer. Setters overwrite one field's
//! window and require the encoded value to fill it exactly.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, TimeZone};

use crate::charset::TextEncoding;
use crate::datetime::{
    self, DATE_TIME_LEN, JULIAN_LEN, decode_julian, encode_julian, format_date, format_date_time,
};
use crate::error::{DbfError, Result};
use crate::memo::{MemoRecord, MemoSource};
use crate::types::{DbfField, DbfFieldType, DbfMetadata, DbfValue, Decimal};

/// Deletion marker of an active record.
pub const ACTIVE_MARKER: u8 = 0x20;

/// Deletion marker of a deleted record.
pub const DELETED_MARKER: u8 = 0x2A;

/// Padding byte of text fields.
pub const EMPTY: u8 = 0x20;

/// Character that fills a numeric field whose value overflowed its width.
pub const NUMERIC_OVERFLOW: char = '*';

/// Width of a memo pointer stored as decimal text.
const MEMO_TEXT_POINTER_LEN: usize = 10;

/// Scale of the binary Currency type.
const CURRENCY_SCALE: u32 = 4;

/// One table row.
#[derive(Clone)]
pub struct DbfRecord {
    bytes: Vec<u8>,
    metadata: Arc<DbfMetadata>,
    memo: Option<Arc<dyn MemoSource>>,
    string_encoding: Option<TextEncoding>,
    record_number: u32,
}

impl DbfRecord {
    /// Wrap a copy of `source`.
    ///
    /// # Arguments
    /// * `source` - Record bytes, including the deletion marker
    /// * `metadata` - Table metadata shared by all records
    /// * `memo` - Memo store, if the table has one
    /// * `record_number` - 1-based position in the table
    #[must_use]
    pub fn new(
        source: &[u8],
        metadata: Arc<DbfMetadata>,
        memo: Option<Arc<dyn MemoSource>>,
        record_number: u32,
    ) -> Self {
        Self {
            bytes: source.to_vec(),
            metadata,
            memo,
            string_encoding: None,
            record_number,
        }
    }

    /// An active record with every field blank, sized to the declared record length.
    #[must_use]
    pub fn blank(metadata: Arc<DbfMetadata>) -> Self {
        let len = usize::from(metadata.record_length);
        Self {
            bytes: vec![EMPTY; len],
            metadata,
            memo: None,
            string_encoding: None,
            record_number: 0,
        }
    }

    /// Attach a memo store.
    #[must_use]
    pub fn with_memo(mut self, memo: Arc<dyn MemoSource>) -> Self {
        self.memo = Some(memo);
        self
    }

    /// Whether byte 0 is the deletion marker (0x2A).
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.bytes.first() == Some(&DELETED_MARKER)
    }

    /// Set or clear the deletion marker.
    pub fn set_deleted(&mut self, deleted: bool) {
        if let Some(marker) = self.bytes.first_mut() {
            *marker = if deleted { DELETED_MARKER } else { ACTIVE_MARKER };
        }
    }

    /// 1-based position in the table (0 for records built in memory).
    #[must_use]
    pub fn record_number(&self) -> u32 {
        self.record_number
    }

    /// The whole record buffer.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Table metadata.
    #[must_use]
    pub fn metadata(&self) -> &Arc<DbfMetadata> {
        &self.metadata
    }

    /// Fields in table order.
    #[must_use]
    pub fn fields(&self) -> &[DbfField] {
        self.metadata.fields()
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Result<&DbfField> {
        self.metadata.require_field(name)
    }

    /// Encoding override for text accessors.
    #[must_use]
    pub fn string_encoding(&self) -> Option<TextEncoding> {
        self.string_encoding
    }

    /// Override the encoding used by text accessors (`None` restores the table's).
    pub fn set_string_encoding(&mut self, encoding: Option<TextEncoding>) {
        self.string_encoding = encoding;
    }

    /// Encoding text accessors use: the override, else the table's.
    #[must_use]
    pub fn encoding(&self) -> TextEncoding {
        self.string_encoding.unwrap_or(self.metadata.encoding)
    }

    // --- read accessors ---

    /// Field text with 0x20 padding trimmed from both ends, decoded with [`Self::encoding`].
    ///
    /// Returns `None` when nothing is left after trimming.
    pub fn get_string(&self, name: &str) -> Result<Option<String>> {
        self.get_string_with(name, self.encoding())
    }

    /// Field text decoded with an explicit encoding.
    pub fn get_string_with(
        &self,
        name: &str,
        encoding: impl Into<TextEncoding>,
    ) -> Result<Option<String>> {
        let window = trim_spaces(self.window(self.field(name)?)?);
        if window.is_empty() {
            return Ok(None);
        }
        Ok(Some(encoding.into().decode(window)))
    }

    /// `YYYYMMDD` date; blank or unparseable text is `None`.
    pub fn get_date(&self, name: &str) -> Result<Option<NaiveDate>> {
        let Some(text) = self.get_string(name)? else {
            return Ok(None);
        };
        Ok(datetime::parse_date(&text).unwrap_or_else(|e| {
            tracing::debug!(field = name, error = %e, "unparseable date");
            None
        }))
    }

    /// Date-time in the local zone.
    pub fn get_date_time(&self, name: &str) -> Result<Option<DateTime<Local>>> {
        self.get_date_time_in(name, &Local)
    }

    /// Date-time in `zone`.
    ///
    /// DateTime and Timestamp fields 8 bytes wide hold the binary Julian form;
    /// fields at least 14 bytes wide hold `YYYYMMDDHHmmss` text.
    ///
    /// # Errors
    /// Returns [`DbfError::FieldLengthMismatch`] for a field too narrow for
    /// either form.
    pub fn get_date_time_in<Tz: TimeZone>(
        &self,
        name: &str,
        zone: &Tz,
    ) -> Result<Option<DateTime<Tz>>> {
        let field = self.field(name)?;
        let parsed = if is_binary_date_time(field) {
            decode_julian(self.window(field)?, zone)
        } else if field.len() >= DATE_TIME_LEN {
            match self.get_string(name)? {
                Some(text) => datetime::parse_date_time(&text, zone),
                None => Ok(None),
            }
        } else {
            return Err(DbfError::FieldLengthMismatch {
                name: name.to_string(),
                expected: DATE_TIME_LEN,
                actual: field.len(),
            });
        };
        Ok(parsed.unwrap_or_else(|e| {
            tracing::debug!(field = name, error = %e, "unparseable date-time");
            None
        }))
    }

    /// Exact decimal; blank text or the overflow marker `*` is `None`.
    ///
    /// # Errors
    /// Returns [`DbfError::NumericParse`] if the text is not a decimal literal.
    pub fn get_decimal(&self, name: &str) -> Result<Option<Decimal>> {
        let Some(text) = self.get_string(name)? else {
            return Ok(None);
        };
        let text = text.trim();
        if text.is_empty() || text.contains(NUMERIC_OVERFLOW) {
            return Ok(None);
        }
        text.parse().map(Some).map_err(|_| DbfError::NumericParse {
            name: name.to_string(),
            value: text.to_string(),
        })
    }

    /// `t`/`T` is true, `f`/`F` is false, anything else is `None`.
    pub fn get_boolean(&self, name: &str) -> Result<Option<bool>> {
        Ok(match self.get_string(name)?.as_deref() {
            Some(s) if s.eq_ignore_ascii_case("t") => Some(true),
            Some(s) if s.eq_ignore_ascii_case("f") => Some(false),
            _ => None,
        })
    }

    /// The first four bytes of the field as a little-endian i32.
    pub fn get_integer(&self, name: &str) -> Result<i32> {
        let field = self.field(name)?;
        Ok(i32::from_le_bytes(self.prefix::<4>(field)?))
    }

    /// Copy of the field's bytes.
    pub fn get_bytes(&self, name: &str) -> Result<Vec<u8>> {
        Ok(self.window(self.field(name)?)?.to_vec())
    }

    /// Block number a memo field points at (0 means no memo).
    ///
    /// Ten-byte fields hold the number as decimal text; other widths hold a
    /// little-endian u32.
    ///
    /// # Errors
    /// - [`DbfError::FieldTypeMismatch`] if the field is not a Memo field
    /// - [`DbfError::InvalidMemoPointer`] if the text is not a block number
    pub fn memo_block(&self, name: &str) -> Result<u32> {
        let field = self.field(name)?;
        if field.field_type != DbfFieldType::Memo {
            return Err(DbfError::FieldTypeMismatch {
                name: name.to_string(),
                expected: DbfFieldType::Memo.name(),
                actual: field.field_type.name(),
            });
        }
        if field.len() == MEMO_TEXT_POINTER_LEN {
            let Some(value) = self.get_decimal(name)? else {
                return Ok(0);
            };
            value
                .to_i64_exact()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| DbfError::InvalidMemoPointer {
                    name: name.to_string(),
                    value: value.to_string(),
                })
        } else {
            Ok(u32::from_le_bytes(self.prefix::<4>(field)?))
        }
    }

    /// Memo payload; empty when the pointer is 0.
    pub fn get_memo_bytes(&self, name: &str) -> Result<Vec<u8>> {
        Ok(self
            .read_memo(name)?
            .map(MemoRecord::into_bytes)
            .unwrap_or_default())
    }

    /// Memo text decoded with [`Self::encoding`]; empty when the pointer is 0.
    pub fn get_memo_string(&self, name: &str) -> Result<String> {
        self.get_memo_string_with(name, self.encoding())
    }

    /// Memo text decoded with an explicit encoding.
    pub fn get_memo_string_with(
        &self,
        name: &str,
        encoding: impl Into<TextEncoding>,
    ) -> Result<String> {
        let encoding = encoding.into();
        Ok(self
            .read_memo(name)?
            .map(|memo| memo.text(&encoding))
            .unwrap_or_default())
    }

    fn read_memo(&self, name: &str) -> Result<Option<MemoRecord>> {
        let block = self.memo_block(name)?;
        if block == 0 {
            return Ok(None);
        }
        let memo = self.memo.as_ref().ok_or_else(|| DbfError::MemoUnavailable {
            name: name.to_string(),
            block,
        })?;
        memo.read(block).map(Some)
    }

    /// Typed value chosen by the field's type.
    pub fn value(&self, name: &str) -> Result<DbfValue> {
        let field = self.field(name)?;
        Ok(match field.field_type {
            DbfFieldType::Character | DbfFieldType::Varchar => self.get_string(name)?.into(),
            DbfFieldType::Numeric | DbfFieldType::Float => self.get_decimal(name)?.into(),
            DbfFieldType::Date => self.get_date(name)?.into(),
            DbfFieldType::DateTime | DbfFieldType::Timestamp => self.get_date_time(name)?.into(),
            DbfFieldType::Logical => self.get_boolean(name)?.into(),
            DbfFieldType::Integer | DbfFieldType::AutoIncrement => self.get_integer(name)?.into(),
            DbfFieldType::Double => DbfValue::Double(f64::from_le_bytes(self.prefix::<8>(field)?)),
            DbfFieldType::Currency => DbfValue::Decimal(Decimal::new(
                i128::from(i64::from_le_bytes(self.prefix::<8>(field)?)),
                CURRENCY_SCALE,
            )),
            DbfFieldType::Memo => DbfValue::Memo(self.get_memo_string(name)?),
            DbfFieldType::General
            | DbfFieldType::Picture
            | DbfFieldType::NullFlags
            | DbfFieldType::Varbinary
            | DbfFieldType::Blob => DbfValue::Bytes(self.get_bytes(name)?),
        })
    }

    /// Every field's value, in table order.
    pub fn to_values(&self) -> Result<Vec<DbfValue>> {
        self.fields().iter().map(|f| self.value(&f.name)).collect()
    }

    /// Every field's value paired with its name, in table order.
    pub fn to_map(&self) -> Result<Vec<(String, DbfValue)>> {
        self.fields()
            .iter()
            .map(|f| Ok((f.name.clone(), self.value(&f.name)?)))
            .collect()
    }

    /// `NAME=value, ` for every field in table order; absent values print as `null`.
    pub fn to_ordered_text(&self) -> Result<String> {
        let mut out = String::with_capacity(self.bytes.len() * 2);
        for field in self.fields() {
            let value = self.value(&field.name)?;
            out.push_str(&field.name);
            out.push('=');
            if value.is_null() {
                out.push_str("null");
            } else {
                out.push_str(&value.to_string());
            }
            out.push_str(", ");
        }
        Ok(out)
    }

    // --- write accessors ---

    /// Overwrite a field's bytes.
    ///
    /// # Errors
    /// Returns [`DbfError::FieldLengthMismatch`] unless `value` is exactly the
    /// field's width.
    pub fn set_bytes(&mut self, name: &str, value: &[u8]) -> Result<()> {
        let field = self.metadata.require_field(name)?;
        if value.len() != field.len() {
            return Err(DbfError::FieldLengthMismatch {
                name: name.to_string(),
                expected: field.len(),
                actual: value.len(),
            });
        }
        let range = field.range();
        let record_len = self.bytes.len();
        let window = self
            .bytes
            .get_mut(range.clone())
            .ok_or_else(|| window_error(name, range.end, record_len))?;
        window.copy_from_slice(value);
        Ok(())
    }

    /// Write text left-aligned and space-padded (`None` blanks the field).
    pub fn set_string(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        let width = self.field(name)?.len();
        let Some(text) = value else {
            return self.set_bytes(name, &vec![EMPTY; width]);
        };
        let encoding = self.encoding();
        let mut buf = encoding.encode(text).ok_or_else(|| {
            DbfError::out_of_range(name, format!("text is not representable in {encoding}"))
        })?;
        if buf.len() > width {
            return Err(DbfError::out_of_range(
                name,
                format!("{} bytes do not fit width {width}", buf.len()),
            ));
        }
        buf.resize(width, EMPTY);
        self.set_bytes(name, &buf)
    }

    /// Write a `YYYYMMDD` date (`None` blanks the field).
    pub fn set_date(&mut self, name: &str, value: Option<NaiveDate>) -> Result<()> {
        match value {
            Some(date) => self.set_bytes(name, format_date(date).as_bytes()),
            None => self.set_string(name, None),
        }
    }

    /// Write a date-time in the form the field's width calls for.
    pub fn set_date_time<Tz: TimeZone>(
        &mut self,
        name: &str,
        value: Option<&DateTime<Tz>>,
    ) -> Result<()> {
        let field = self.field(name)?;
        if is_binary_date_time(field) {
            let bytes = value.map_or([0u8; JULIAN_LEN], encode_julian);
            return self.set_bytes(name, &bytes);
        }
        if field.len() < DATE_TIME_LEN {
            return Err(DbfError::FieldLengthMismatch {
                name: name.to_string(),
                expected: DATE_TIME_LEN,
                actual: field.len(),
            });
        }
        let text = value.map(format_date_time);
        self.set_string(name, text.as_deref())
    }

    /// Write a decimal right-aligned with the field's decimal count.
    ///
    /// # Errors
    /// - [`DbfError::FieldTypeMismatch`] unless the field is Numeric or Float
    /// - [`DbfError::ValueOutOfRange`] if digits would be lost or the text is
    ///   wider than the field
    pub fn set_decimal(&mut self, name: &str, value: Option<Decimal>) -> Result<()> {
        let field = self.field(name)?;
        if !field.field_type.is_decimal_text() {
            return Err(DbfError::FieldTypeMismatch {
                name: name.to_string(),
                expected: DbfFieldType::Numeric.name(),
                actual: field.field_type.name(),
            });
        }
        let width = field.len();
        let Some(value) = value else {
            return self.set_string(name, None);
        };
        let scaled = value
            .rescale(u32::from(field.decimal_count))
            .ok_or_else(|| {
                DbfError::out_of_range(
                    name,
                    format!("{value} has more than {} decimals", field.decimal_count),
                )
            })?;
        let text = scaled.to_string();
        if text.len() > width {
            return Err(DbfError::out_of_range(
                name,
                format!("{text} is wider than {width}"),
            ));
        }
        self.set_bytes(name, format!("{text:>width$}").as_bytes())
    }

    /// Write `T`, `F`, or `?` for `None`.
    pub fn set_boolean(&mut self, name: &str, value: Option<bool>) -> Result<()> {
        let flag = match value {
            Some(true) => b'T',
            Some(false) => b'F',
            None => b'?',
        };
        self.set_bytes(name, &[flag])
    }

    /// Write a little-endian i32.
    pub fn set_integer(&mut self, name: &str, value: i32) -> Result<()> {
        self.set_bytes(name, &value.to_le_bytes())
    }

    // --- helpers ---

    fn window(&self, field: &DbfField) -> Result<&[u8]> {
        let range = field.range();
        self.bytes
            .get(range.clone())
            .ok_or_else(|| window_error(&field.name, range.end, self.bytes.len()))
    }

    /// First `N` bytes of the field.
    fn prefix<const N: usize>(&self, field: &DbfField) -> Result<[u8; N]> {
        let window = self.window(field)?;
        window
            .get(..N)
            .and_then(|b| <[u8; N]>::try_from(b).ok())
            .ok_or_else(|| DbfError::FieldLengthMismatch {
                name: field.name.clone(),
                expected: N,
                actual: window.len(),
            })
    }
}

impl fmt::Debug for DbfRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbfRecord")
            .field("record_number", &self.record_number)
            .field("deleted", &self.is_deleted())
            .field("bytes", &String::from_utf8_lossy(&self.bytes))
            .field("has_memo", &self.memo.is_some())
            .finish_non_exhaustive()
    }
}

fn is_binary_date_time(field: &DbfField) -> bool {
    matches!(
        field.field_type,
        DbfFieldType::DateTime | DbfFieldType::Timestamp
    ) && field.len() == JULIAN_LEN
}

fn trim_spaces(mut window: &[u8]) -> &[u8] {
    while let [EMPTY, rest @ ..] = window {
        window = rest;
    }
    while let [rest @ .., EMPTY] = window {
        window = rest;
    }
    window
}

fn window_error(name: &str, end: usize, record_len: usize) -> DbfError {
    DbfError::corrupted(format!(
        "field '{name}' ends at byte {end}, record is {record_len} bytes"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use encoding_rs::WINDOWS_1251;
    use std::sync::Mutex;

    fn metadata(fields: &str) -> Arc<DbfMetadata> {
        Arc::new(DbfMetadata::from_fields_string(fields).unwrap())
    }

    fn record(fields: &str, body: &[u8]) -> DbfRecord {
        let mut bytes = vec![ACTIVE_MARKER];
        bytes.extend_from_slice(body);
        DbfRecord::new(&bytes, metadata(fields), None, 1)
    }

    #[derive(Default)]
    struct MockMemo {
        reads: Mutex<Vec<u32>>,
    }

    impl MemoSource for MockMemo {
        fn read(&self, block: u32) -> Result<MemoRecord> {
            self.reads.lock().unwrap().push(block);
            Ok(MemoRecord::new(
                block,
                crate::memo::MemoKind::Text,
                format!("memo #{block}").into_bytes(),
            ))
        }
    }

    #[test]
    fn test_deletion_marker() {
        let meta = metadata("NAME,C,1,0");
        assert!(DbfRecord::new(b"*A", meta.clone(), None, 1).is_deleted());
        assert!(!DbfRecord::new(b" A", meta.clone(), None, 1).is_deleted());
        assert!(!DbfRecord::new(b"#A", meta, None, 1).is_deleted());
    }

    #[test]
    fn test_string_trimming() {
        let rec = record("NAME,C,9,0", b"  JO HN  ");
        assert_eq!(rec.get_string("NAME").unwrap().as_deref(), Some("JO HN"));
        let rec = record("NAME,C,9,0", b"         ");
        assert_eq!(rec.get_string("NAME").unwrap(), None);
    }

    #[test]
    fn test_string_encoding_priority() {
        let mut rec = record("NAME,C,3,0", &[0xc4, 0xe0, b' ']);
        assert_eq!(
            rec.get_string_with("NAME", WINDOWS_1251).unwrap().as_deref(),
            Some("Да")
        );
        rec.set_string_encoding(Some(WINDOWS_1251.into()));
        assert_eq!(rec.get_string("NAME").unwrap().as_deref(), Some("Да"));
    }

    #[test]
    fn test_unknown_field() {
        let rec = record("NAME,C,4,0", b"JOHN");
        assert!(matches!(
            rec.get_string("AGE"),
            Err(DbfError::FieldNotFound { .. })
        ));
    }

    #[test]
    fn test_booleans() {
        for (byte, expected) in [(b'T', Some(true)), (b'f', Some(false)), (b'X', None), (b' ', None)] {
            let rec = record("OK,L,1,0", &[byte]);
            assert_eq!(rec.get_boolean("OK").unwrap(), expected, "byte {byte}");
        }
    }

    #[test]
    fn test_dates() {
        let rec = record("D,D,8,0", b"20240315");
        assert_eq!(
            rec.get_date("D").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(record("D,D,8,0", b"        ").get_date("D").unwrap(), None);
        assert_eq!(record("D,D,8,0", b"2024XX15").get_date("D").unwrap(), None);
    }

    #[test]
    fn test_text_date_time() {
        let rec = record("TS,C,14,0", b"20240315143045");
        let value = rec.get_date_time_in("TS", &Utc).unwrap().unwrap();
        assert_eq!(format_date_time(&value), "20240315143045");

        let rec = record("TS,C,6,0", b"123456");
        assert!(matches!(
            rec.get_date_time_in("TS", &Utc),
            Err(DbfError::FieldLengthMismatch { .. })
        ));
    }

    #[test]
    fn test_binary_date_time() {
        let mut body = 2_451_545i32.to_le_bytes().to_vec();
        body.extend_from_slice(&3_600_000i32.to_le_bytes());
        let rec = record("TS,T,8,0", &body);
        let value = rec.get_date_time_in("TS", &Utc).unwrap().unwrap();
        assert_eq!(value.to_rfc3339(), "2000-01-01T01:00:00+00:00");
        let rec = record("TS,T,8,0", &[0u8; 8]);
        assert_eq!(rec.get_date_time_in("TS", &Utc).unwrap(), None);
    }

    #[test]
    fn test_decimals() {
        let rec = record("N,N,8,2", b"  -12.50");
        assert_eq!(rec.get_decimal("N").unwrap(), Some(Decimal::new(-1250, 2)));
        assert_eq!(record("N,N,8,2", b"********").get_decimal("N").unwrap(), None);
        assert_eq!(record("N,N,8,2", b"        ").get_decimal("N").unwrap(), None);
        assert!(matches!(
            record("N,N,8,2", b"  12,50 ").get_decimal("N"),
            Err(DbfError::NumericParse { .. })
        ));
    }

    #[test]
    fn test_integer() {
        let rec = record("I,I,4,0", &(-2i32).to_le_bytes());
        assert_eq!(rec.get_integer("I").unwrap(), -2);
        assert_eq!(record("I,I,4,0", &[0; 4]).get_integer("I").unwrap(), 0);
    }

    #[test]
    fn test_memo_pointer_zero_skips_reader() {
        let memo = Arc::new(MockMemo::default());
        let rec = record("M,M,4,0", &[0, 0, 0, 0]).with_memo(memo.clone());
        assert_eq!(rec.memo_block("M").unwrap(), 0);
        assert!(rec.get_memo_bytes("M").unwrap().is_empty());
        assert_eq!(rec.get_memo_string("M").unwrap(), "");
        assert!(memo.reads.lock().unwrap().is_empty());
    }

    #[test]
    fn test_memo_text_pointer() {
        let memo = Arc::new(MockMemo::default());
        let rec = record("M,M,10,0", b"0000000005").with_memo(memo.clone());
        assert_eq!(rec.memo_block("M").unwrap(), 5);
        assert_eq!(rec.get_memo_string("M").unwrap(), "memo #5");
        assert_eq!(*memo.reads.lock().unwrap(), vec![5]);
    }

    #[test]
    fn test_memo_errors() {
        let rec = record("NAME,C,4,0", b"JOHN");
        assert!(matches!(
            rec.get_memo_string("NAME"),
            Err(DbfError::FieldTypeMismatch { .. })
        ));
        let rec = record("M,M,4,0", &7u32.to_le_bytes());
        assert!(matches!(
            rec.get_memo_bytes("M"),
            Err(DbfError::MemoUnavailable { block: 7, .. })
        ));
    }

    #[test]
    fn test_set_bytes_is_checked() {
        let mut rec = record("NAME,C,4,0", b"JOHN");
        assert!(matches!(
            rec.set_bytes("NAME", b"JO"),
            Err(DbfError::FieldLengthMismatch {
                expected: 4,
                actual: 2,
                ..
            })
        ));
        rec.set_bytes("NAME", b"MARY").unwrap();
        assert_eq!(rec.bytes(), b" MARY");
    }

    #[test]
    fn test_typed_setters() {
        let meta = metadata("NAME,C,6,0|AGE,N,6,2|BORN,D,8,0|OK,L,1,0|N,I,4,0|TS,T,8,0");
        let mut rec = DbfRecord::blank(meta);
        let stamp = Utc.with_ymd_and_hms(2020, 2, 29, 12, 0, 0).unwrap();

        rec.set_string("NAME", Some("ANN")).unwrap();
        rec.set_decimal("AGE", Some("4.5".parse().unwrap())).unwrap();
        rec.set_date("BORN", NaiveDate::from_ymd_opt(1999, 1, 2)).unwrap();
        rec.set_boolean("OK", Some(true)).unwrap();
        rec.set_integer("N", 42).unwrap();
        rec.set_date_time("TS", Some(&stamp)).unwrap();

        assert_eq!(&rec.bytes()[..22], b" ANN     4.5019990102T");
        assert_eq!(rec.get_string("NAME").unwrap().as_deref(), Some("ANN"));
        assert_eq!(rec.get_decimal("AGE").unwrap(), Some(Decimal::new(450, 2)));
        assert_eq!(rec.get_integer("N").unwrap(), 42);
        assert_eq!(rec.get_date_time_in("TS", &Utc).unwrap(), Some(stamp));
    }

    #[test]
    fn test_set_decimal_needs_decimal_field() {
        let mut rec = DbfRecord::blank(metadata("NAME,C,6,0|RATE,F,6,3"));
        assert!(matches!(
            rec.set_decimal("NAME", Some(Decimal::new(1, 0))),
            Err(DbfError::FieldTypeMismatch { .. })
        ));
        rec.set_decimal("RATE", Some(Decimal::new(125, 2))).unwrap();
        assert_eq!(&rec.bytes()[7..], b" 1.250");
        assert_eq!(rec.value("RATE").unwrap(), DbfValue::Decimal(Decimal::new(1250, 3)));
    }

    #[test]
    fn test_wide_numeric_field() {
        let digits = "1234567890123456789012345678901234567890";
        let rec = record("N,N,40,0", digits.as_bytes());
        let value = rec.get_decimal("N").unwrap().unwrap();
        assert_eq!(value.to_string(), digits);

        let mut rec = DbfRecord::blank(metadata("N,N,60,5"));
        rec.set_decimal("N", Some(value)).unwrap();
        assert_eq!(
            rec.get_string("N").unwrap().as_deref(),
            Some("1234567890123456789012345678901234567890.00000")
        );
    }

    #[test]
    fn test_dos_code_page_text() {
        let meta = Arc::new(
            DbfMetadata::from_fields_string("NAME,C,5,0")
                .unwrap()
                .with_language_driver(0x01),
        );
        let rec = DbfRecord::new(&[b' ', 0x8E, 0x99, 0x9A, b' ', b' '], Arc::clone(&meta), None, 1);
        assert_eq!(rec.get_string("NAME").unwrap().as_deref(), Some("ÄÖÜ"));

        let mut blank = DbfRecord::blank(meta);
        blank.set_string("NAME", Some("Öl")).unwrap();
        assert_eq!(blank.bytes(), &[b' ', 0x99, b'l', b' ', b' ', b' ']);
        assert!(matches!(
            blank.set_string("NAME", Some("日本")),
            Err(DbfError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn test_setter_overflow() {
        let mut rec = DbfRecord::blank(metadata("NAME,C,3,0|AGE,N,4,1"));
        assert!(rec.set_string("NAME", Some("TOO LONG")).is_err());
        assert!(rec.set_decimal("AGE", Some("1.25".parse().unwrap())).is_err());
        assert!(rec.set_decimal("AGE", Some("1234".parse().unwrap())).is_err());
    }

    #[test]
    fn test_ordered_text() {
        let rec = record("NAME,C,4,0|OK,L,1,0|AGE,N,3,0", b"JOHN?  7");
        assert_eq!(rec.to_ordered_text().unwrap(), "NAME=JOHN, OK=null, AGE=7, ");
        let map = rec.to_map().unwrap();
        let names: Vec<&str> = map.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["NAME", "OK", "AGE"]);
        assert_eq!(map[2].1, DbfValue::Decimal(Decimal::new(7, 0)));
        assert_eq!(rec.to_values().unwrap().len(), 3);
    }
}
