//! Table metadata: header attributes plus the ordered field list.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use super::field::{DbfField, parse_field_definitions};
use super::file_type::DbfFileType;
use crate::charset::{self, TextEncoding};
use crate::error::{DbfError, Result};
use crate::header::{FIELD_DESCRIPTOR_LEN, FILE_HEADER_LEN, FileHeader};

/// Ordered fields with a name lookup, built once.
///
/// Offsets are assigned by a single left-to-right scan: the first field sits
/// at 1 (after the deletion marker) and each next field follows the previous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldIndex {
    fields: Vec<DbfField>,
    by_name: HashMap<String, usize>,
}

impl FieldIndex {
    /// Assign offsets and index names.
    ///
    /// # Errors
    /// Returns [`DbfError::DuplicateField`] if two fields share a name.
    pub fn new(mut fields: Vec<DbfField>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(fields.len());
        let mut offset = 1usize;
        for (idx, field) in fields.iter_mut().enumerate() {
            field.offset = offset;
            offset += field.len();
            if by_name.insert(field.name.clone(), idx).is_some() {
                return Err(DbfError::DuplicateField {
                    name: field.name.clone(),
                });
            }
        }
        Ok(Self { fields, by_name })
    }

    /// Look up a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DbfField> {
        self.by_name.get(name).map(|&idx| &self.fields[idx])
    }

    /// Fields in table order.
    #[must_use]
    pub fn as_slice(&self) -> &[DbfField] {
        &self.fields
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in table order.
    pub fn iter(&self) -> std::slice::Iter<'_, DbfField> {
        self.fields.iter()
    }
}

impl<'a> IntoIterator for &'a FieldIndex {
    type Item = &'a DbfField;
    type IntoIter = std::slice::Iter<'a, DbfField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Which declared length disagreed with the field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthKind {
    /// Header bytes 8-9.
    Header,
    /// Header bytes 10-11.
    Record,
}

/// A declared header length that differs from the value computed from the fields.
///
/// Recorded, not fatal: the declared values still size record buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthMismatch {
    pub kind: LengthKind,
    pub declared: u16,
    pub computed: usize,
}

/// Everything the header and field table say about a table.
#[derive(Debug, Clone)]
pub struct DbfMetadata {
    /// Dialect tag.
    pub file_type: DbfFileType,
    /// Date of last update (`None` if the header bytes are not a valid date).
    pub update_date: Option<NaiveDate>,
    /// Number of records the header declares.
    pub record_count: u32,
    /// Declared header length: file header, descriptors and terminator.
    pub header_length: u16,
    /// Declared record length, including the deletion marker.
    pub record_length: u16,
    /// Incomplete-transaction flag (byte 14), stored as-is.
    pub incomplete_transaction: u8,
    /// Encryption flag (byte 15), stored as-is.
    pub encryption_flag: u8,
    /// Language driver (byte 29).
    pub language_driver: u8,
    /// Encoding resolved from the language driver.
    pub encoding: TextEncoding,
    fields: FieldIndex,
    mismatches: Vec<LengthMismatch>,
}

impl DbfMetadata {
    /// Build metadata for a new table, deriving header and record lengths.
    ///
    /// The update date is today; the record count is zero.
    pub fn from_fields(fields: Vec<DbfField>, file_type: DbfFileType) -> Result<Self> {
        let header_length = u16::try_from(computed_header_length(fields.len()))
            .map_err(|_| DbfError::out_of_range("<header>", "too many fields"))?;
        let record_length = u16::try_from(computed_record_length(&fields))
            .map_err(|_| DbfError::out_of_range("<record>", "record longer than 65535 bytes"))?;
        Ok(Self {
            file_type,
            update_date: Some(chrono::Local::now().date_naive()),
            record_count: 0,
            header_length,
            record_length,
            incomplete_transaction: 0,
            encryption_flag: 0,
            language_driver: 0,
            encoding: charset::DEFAULT_ENCODING,
            fields: FieldIndex::new(fields)?,
            mismatches: Vec::new(),
        })
    }

    /// Build metadata from a `name,type,length,decimals|...` string.
    ///
    /// The dialect defaults to [`DbfFileType::FoxBasePlus`].
    pub fn from_fields_string(s: &str) -> Result<Self> {
        Self::from_fields(parse_field_definitions(s)?, DbfFileType::default())
    }

    /// Build metadata from a parsed file header and field table.
    ///
    /// # Errors
    /// Returns [`DbfError::Corrupted`] if the field table repeats a name.
    pub(crate) fn from_parts(header: FileHeader, fields: Vec<DbfField>) -> Result<Self> {
        let fields = FieldIndex::new(fields).map_err(|e| match e {
            DbfError::DuplicateField { name } => {
                DbfError::corrupted(format!("field table repeats the name {name:?}"))
            }
            other => other,
        })?;
        let mut mismatches = Vec::new();
        let computed_header = computed_header_length(fields.len());
        if computed_header != usize::from(header.header_length) {
            mismatches.push(LengthMismatch {
                kind: LengthKind::Header,
                declared: header.header_length,
                computed: computed_header,
            });
        }
        let computed_record = computed_record_length(fields.as_slice());
        if computed_record != usize::from(header.record_length) {
            mismatches.push(LengthMismatch {
                kind: LengthKind::Record,
                declared: header.record_length,
                computed: computed_record,
            });
        }
        for mismatch in &mismatches {
            tracing::warn!(
                kind = ?mismatch.kind,
                declared = mismatch.declared,
                computed = mismatch.computed,
                "declared length disagrees with field table"
            );
        }
        Ok(Self {
            file_type: header.file_type,
            update_date: header.update_date,
            record_count: header.record_count,
            header_length: header.header_length,
            record_length: header.record_length,
            incomplete_transaction: header.incomplete_transaction,
            encryption_flag: header.encryption_flag,
            language_driver: header.language_driver,
            encoding: header.encoding,
            fields,
            mismatches,
        })
    }

    /// Replace the language driver and re-resolve the encoding.
    #[must_use]
    pub fn with_language_driver(mut self, driver: u8) -> Self {
        self.language_driver = driver;
        self.encoding = charset::resolve(driver);
        self
    }

    /// Set the record count.
    #[must_use]
    pub fn with_record_count(mut self, count: u32) -> Self {
        self.record_count = count;
        self
    }

    /// Declare a header length, e.g. to reserve a backlink area after the
    /// field table.
    #[must_use]
    pub fn with_header_length(mut self, length: u16) -> Self {
        self.header_length = length;
        self
    }

    /// Set the update date.
    #[must_use]
    pub fn with_update_date(mut self, date: NaiveDate) -> Self {
        self.update_date = Some(date);
        self
    }

    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&DbfField> {
        self.fields.get(name)
    }

    /// Look up a field by name, failing if absent.
    pub fn require_field(&self, name: &str) -> Result<&DbfField> {
        self.fields
            .get(name)
            .ok_or_else(|| DbfError::field_not_found(name))
    }

    /// Fields in table order.
    #[must_use]
    pub fn fields(&self) -> &[DbfField] {
        self.fields.as_slice()
    }

    /// Name-keyed view of the fields.
    #[must_use]
    pub fn field_index(&self) -> &FieldIndex {
        &self.fields
    }

    /// Declared lengths that disagreed with the field table when read.
    #[must_use]
    pub fn length_mismatches(&self) -> &[LengthMismatch] {
        &self.mismatches
    }

    /// `name,type,length,decimals` definitions joined by `|`.
    #[must_use]
    pub fn fields_string(&self) -> String {
        self.fields
            .iter()
            .map(DbfField::definition_string)
            .collect::<Vec<_>>()
            .join("|")
    }
}

impl FromStr for DbfMetadata {
    type Err = DbfError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_fields_string(s)
    }
}

impl fmt::Display for DbfMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let update_date = self
            .update_date
            .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string());
        writeln!(f, "DbfMetadata [")?;
        writeln!(f, "  type={},", self.file_type)?;
        writeln!(f, "  updateDate={update_date},")?;
        writeln!(f, "  recordsQty={},", self.record_count)?;
        writeln!(f, "  fullHeaderLength={},", self.header_length)?;
        writeln!(f, "  oneRecordLength={},", self.record_length)?;
        writeln!(f, "  uncompletedTxFlag={},", self.incomplete_transaction)?;
        writeln!(f, "  encryptionFlag={},", self.encryption_flag)?;
        writeln!(f, "  encoding={},", self.encoding.name())?;
        writeln!(f, "  fields={}", self.fields_string())?;
        write!(f, "]")
    }
}

/// Header length implied by a field count: header, descriptors, terminator.
#[must_use]
pub fn computed_header_length(field_count: usize) -> usize {
    FILE_HEADER_LEN + FIELD_DESCRIPTOR_LEN * field_count + 1
}

/// Record length implied by the fields: widths plus the deletion marker.
#[must_use]
pub fn computed_record_length(fields: &[DbfField]) -> usize {
    fields.iter().map(DbfField::len).sum::<usize>() + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DbfFieldType;

    #[test]
    fn test_offsets_assigned_left_to_right() {
        let index = FieldIndex::new(vec![
            DbfField::character("NAME", 9),
            DbfField::numeric("AGE", 3, 0),
            DbfField::date("BORN"),
        ])
        .unwrap();
        let offsets: Vec<usize> = index.iter().map(DbfField::offset).collect();
        assert_eq!(offsets, vec![1, 10, 13]);
        assert_eq!(index.get("AGE").unwrap().range(), 10..13);
        assert!(index.get("age").is_none());
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let result = FieldIndex::new(vec![DbfField::logical("A"), DbfField::logical("A")]);
        assert!(matches!(result, Err(DbfError::DuplicateField { .. })));
        let result = DbfMetadata::from_fields(
            vec![DbfField::logical("A"), DbfField::logical("A")],
            DbfFileType::FoxBasePlus,
        );
        assert!(!result.unwrap_err().is_corruption());
    }

    #[test]
    fn test_duplicate_field_in_file_is_corruption() {
        let mut data = [0u8; FILE_HEADER_LEN];
        data[0] = 0x03;
        data[1..4].copy_from_slice(&[124, 1, 1]);
        data[8..10].copy_from_slice(&97u16.to_le_bytes());
        data[10..12].copy_from_slice(&3u16.to_le_bytes());
        let header = crate::header::parse_file_header(&data, charset::DEFAULT_ENCODING).unwrap();
        let err = DbfMetadata::from_parts(header, vec![DbfField::logical("A"), DbfField::logical("A")])
            .unwrap_err();
        assert!(matches!(err, DbfError::Corrupted { .. }), "{err:?}");
        assert!(err.is_corruption());
    }

    #[test]
    fn test_field_index_view() {
        let metadata = DbfMetadata::from_fields_string("ID,N,5,0|NAME,C,20,0").unwrap();
        let index = metadata.field_index();
        assert_eq!(index.len(), 2);
        assert!(!index.is_empty());
        assert_eq!(index.get("NAME").unwrap().offset(), 6);
        let names: Vec<&str> = index.into_iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["ID", "NAME"]);
    }

    #[test]
    fn test_from_fields_string() {
        let metadata = DbfMetadata::from_fields_string("ID,N,5,0|NAME,C,20,0").unwrap();
        assert_eq!(metadata.file_type, DbfFileType::FoxBasePlus);
        assert_eq!(metadata.header_length, 32 + 64 + 1);
        assert_eq!(metadata.record_length, 26);
        assert_eq!(metadata.fields().len(), 2);
        assert_eq!(
            metadata.field("NAME").unwrap().field_type,
            DbfFieldType::Character
        );
        assert_eq!(metadata.fields_string(), "ID,N,5,0|NAME,C,20,0");
        assert!(metadata.length_mismatches().is_empty());
    }

    #[test]
    fn test_require_field() {
        let metadata = DbfMetadata::from_fields_string("ID,N,5,0").unwrap();
        assert!(metadata.require_field("ID").is_ok());
        assert!(matches!(
            metadata.require_field("NOPE"),
            Err(DbfError::FieldNotFound { .. })
        ));
    }

    #[test]
    fn test_display_lists_fields() {
        let metadata = DbfMetadata::from_fields_string("ID,N,5,0")
            .unwrap()
            .with_update_date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        let text = metadata.to_string();
        assert!(text.contains("updateDate=2024-03-15"));
        assert!(text.contains("fields=ID,N,5,0"));
    }
}
