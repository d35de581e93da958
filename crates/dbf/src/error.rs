//! Error types for DBF table operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when reading or writing DBF tables.
#[derive(Debug, Error)]
pub enum DbfError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The byte image is not a DBF table or is damaged.
    #[error("the file is corrupted or is not a dbf file: {message}")]
    Corrupted { message: String },

    /// Header byte 0 does not name a known dialect.
    #[error("unknown dbf file type tag 0x{tag:02X}")]
    UnknownFileType { tag: u8 },

    /// Field descriptor carries a type tag outside the known table.
    #[error("unknown field type '{tag}' (0x{byte:02X}) for field {name:?}")]
    UnknownFieldType { name: String, tag: char, byte: u8 },

    /// A field descriptor could not be read completely.
    #[error("short field descriptor #{index} at byte {offset}: got {actual} of 32 bytes")]
    ShortFieldDescriptor {
        index: usize,
        offset: u64,
        actual: usize,
    },

    /// The descriptor table ended before its 0x0D terminator.
    #[error("field table has no terminator after {fields} descriptor(s)")]
    MissingTerminator { fields: usize },

    /// Field name is not part of the table.
    #[error("field not found: {name}")]
    FieldNotFound { name: String },

    /// Two descriptors share a name.
    #[error("duplicate field name: {name}")]
    DuplicateField { name: String },

    /// Field name exceeds the 11-byte descriptor slot.
    #[error("field name '{name}' is {len} bytes, limit is 11")]
    FieldNameTooLong { name: String, len: usize },

    /// Accessor called on a field whose declared type does not support it.
    #[error("field '{name}' is {actual}, expected {expected}")]
    FieldTypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Bytes handed to a setter do not match the declared width.
    #[error("field '{name}' holds {expected} bytes, got {actual}")]
    FieldLengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// A value does not fit the field it is written to.
    #[error("value for field '{name}' does not fit: {message}")]
    ValueOutOfRange { name: String, message: String },

    /// Malformed `name,type,length,decimals` field definition.
    #[error("invalid field definition {definition:?}: {message}")]
    InvalidFieldDefinition { definition: String, message: String },

    /// Numeric field text is not a decimal literal.
    #[error("failed to parse numeric field '{name}': {value:?}")]
    NumericParse { name: String, value: String },

    /// Memo pointer could not be turned into a block number.
    #[error("invalid memo pointer in field '{name}': {value}")]
    InvalidMemoPointer { name: String, value: String },

    /// Memo accessor used on a table opened without a memo store.
    #[error("field '{name}' references memo block {block} but no memo store is attached")]
    MemoUnavailable { name: String, block: u32 },

    /// The memo store itself is damaged.
    #[error("invalid memo block {block}: {message}")]
    InvalidMemoBlock { block: u32, message: String },

    /// A thread panicked while holding the memo store lock.
    #[error("memo store lock poisoned")]
    LockPoisoned,

    /// Operation on a reader after `close`.
    #[error("reader is closed")]
    ReaderClosed,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for DBF operations.
pub type Result<T> = std::result::Result<T, DbfError>;

impl DbfError {
    /// Create a Corrupted error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted {
            message: message.into(),
        }
    }

    /// Create a FieldNotFound error.
    pub fn field_not_found(name: impl Into<String>) -> Self {
        Self::FieldNotFound { name: name.into() }
    }

    /// Create an InvalidFieldDefinition error.
    pub fn invalid_definition(definition: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFieldDefinition {
            definition: definition.into(),
            message: message.into(),
        }
    }

    /// Create a ValueOutOfRange error.
    pub fn out_of_range(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValueOutOfRange {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Whether the error means the byte image is damaged (as opposed to misuse).
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::Corrupted { .. }
                | Self::UnknownFileType { .. }
                | Self::UnknownFieldType { .. }
                | Self::ShortFieldDescriptor { .. }
                | Self::MissingTerminator { .. }
                | Self::InvalidMemoBlock { .. }
        )
    }
}
