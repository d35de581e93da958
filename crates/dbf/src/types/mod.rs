//! Core types for DBF table handling.
//!
//! Dialect and field type tags, field definitions, table metadata, decoded
//! values, and reader options.

mod decimal;
mod field;
mod file_type;
mod metadata;
mod options;
mod value;

pub use decimal::{Decimal, ParseDecimalError};
pub use field::{DbfField, DbfFieldType, FIELD_NAME_LEN, parse_field_definitions};
pub use file_type::{DbfFileType, HeaderYearEpoch};
pub use metadata::{
    DbfMetadata, FieldIndex, LengthKind, LengthMismatch, computed_header_length,
    computed_record_length,
};
pub use options::DbfReaderOptions;
pub use value::DbfValue;
