//! DBF table writer.
//!
//! Writes a whole table in one pass: header, field descriptors, terminator,
//! zero fill up to the declared header length, records, and the 0x1A
//! end-of-file marker.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{DbfError, Result};
use crate::header::{HEADER_TERMINATOR, build_field_descriptor, build_file_header};
use crate::record::DbfRecord;
use crate::types::{DbfMetadata, computed_header_length};

/// End-of-file marker after the last record.
pub const END_OF_FILE: u8 = 0x1A;

/// DBF table writer.
pub struct DbfWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> DbfWriter<W> {
    /// Create a new DBF writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// Write a table.
    ///
    /// The header's record count is taken from `records`; every other header
    /// attribute comes from `metadata`. A declared header length beyond the
    /// field table (the Visual FoxPro backlink area) is filled with zeros so
    /// records start where the header says they do.
    ///
    /// # Errors
    /// - [`DbfError::FieldLengthMismatch`] if a record is not the declared width
    /// - [`DbfError::FieldNameTooLong`] for a name over 11 bytes
    /// - [`DbfError::ValueOutOfRange`] for more than `u32::MAX` records, or a
    ///   declared header length shorter than the field table
    pub fn write_table(mut self, metadata: &DbfMetadata, records: &[DbfRecord]) -> Result<()> {
        let record_count = u32::try_from(records.len())
            .map_err(|_| DbfError::out_of_range("<table>", "more than u32::MAX records"))?;
        let header = metadata.clone().with_record_count(record_count);
        let computed = computed_header_length(header.fields().len());
        let declared = usize::from(header.header_length);
        if declared < computed {
            return Err(DbfError::out_of_range(
                "<header>",
                format!("declared length {declared} is shorter than the {computed}-byte field table"),
            ));
        }

        self.writer.write_all(&build_file_header(&header)?)?;
        for field in header.fields() {
            self.writer.write_all(&build_field_descriptor(field)?)?;
        }
        self.writer.write_all(&[HEADER_TERMINATOR])?;
        if declared > computed {
            self.writer.write_all(&vec![0u8; declared - computed])?;
        }

        let record_length = usize::from(header.record_length);
        for record in records {
            if record.bytes().len() != record_length {
                return Err(DbfError::FieldLengthMismatch {
                    name: format!("<record {}>", record.record_number()),
                    expected: record_length,
                    actual: record.bytes().len(),
                });
            }
            self.writer.write_all(record.bytes())?;
        }
        self.writer.write_all(&[END_OF_FILE])?;
        self.writer.flush()?;

        tracing::debug!(
            records = record_count,
            fields = header.fields().len(),
            "wrote table"
        );
        Ok(())
    }
}

impl DbfWriter<File> {
    /// Create a DBF file for writing.
    ///
    /// # Arguments
    /// * `path` - Path to the output file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(file))
    }
}

/// Write a table to a path.
///
/// This is a convenience function that creates the file and writes the table.
pub fn write_dbf(path: impl AsRef<Path>, metadata: &DbfMetadata, records: &[DbfRecord]) -> Result<()> {
    DbfWriter::create(path)?.write_table(metadata, records)
}
