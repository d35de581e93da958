//! DBF (dBASE / FoxPro) table reader and writer.
//!
//! This crate decodes and encodes the fixed-layout table format used by
//! dBASE, FoxBASE, FoxPro and their descendants, together with FoxPro memo
//! files.
//!
//! # Features
//!
//! - File header and field descriptor codec for the common dialect tags
//! - Typed record accessors: text, date, date-time, arbitrary-precision decimal, logical, integer, memo
//! - Code page resolution from the header's language driver byte, including DOS OEM pages
//! - Binary Julian date-time encoding with millisecond precision
//! - Whole-table writing for new files
//!
//! # Example
//!
//! ```no_run
//! use dbf::DbfReader;
//!
//! let mut reader = DbfReader::open_with_memo("people.dbf", "people.fpt").unwrap();
//! println!("{}", reader.metadata().unwrap());
//! for record in reader.records() {
//!     let record = record.unwrap();
//!     if record.is_deleted() {
//!         continue;
//!     }
//!     let name = record.get_string("NAME").unwrap();
//!     let born = record.get_date("BORN").unwrap();
//!     println!("#{} {name:?} {born:?}", record.record_number());
//! }
//! ```
//!
//! # Building a table
//!
//! ```
//! use std::sync::Arc;
//! use dbf::{DbfMetadata, DbfRecord, DbfWriter};
//!
//! let metadata = Arc::new(DbfMetadata::from_fields_string("NAME,C,10,0|OK,L,1,0").unwrap());
//! let mut record = DbfRecord::blank(Arc::clone(&metadata));
//! record.set_string("NAME", Some("JOHN")).unwrap();
//! record.set_boolean("OK", Some(true)).unwrap();
//! assert_eq!(record.get_boolean("OK").unwrap(), Some(true));
//!
//! let mut out = Vec::new();
//! DbfWriter::new(&mut out).write_table(&metadata, &[record]).unwrap();
//! assert_eq!(out.last(), Some(&0x1A));
//! ```

pub mod charset;
pub mod datetime;
mod error;
pub mod header;
mod memo;
mod reader;
mod record;
mod types;
mod writer;

// Re-export text encodings
pub use charset::TextEncoding;

// Re-export error types
pub use error::{DbfError, Result};

// Re-export core types
pub use types::{
    DbfField, DbfFieldType, DbfFileType, DbfMetadata, DbfReaderOptions, DbfValue, Decimal,
    FIELD_NAME_LEN, FieldIndex, HeaderYearEpoch, LengthKind, LengthMismatch, ParseDecimalError,
    computed_header_length, computed_record_length, parse_field_definitions,
};

// Re-export memo store
pub use memo::{MemoKind, MemoReader, MemoRecord, MemoSource};

// Re-export record codec
pub use record::{ACTIVE_MARKER, DELETED_MARKER, DbfRecord, NUMERIC_OVERFLOW};

// Re-export reader functionality
pub use reader::{DbfReader, Records, read_dbf};

// Re-export writer functionality
pub use writer::{DbfWriter, END_OF_FILE, write_dbf};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
