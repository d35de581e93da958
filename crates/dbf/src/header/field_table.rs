//! Field table and metadata reading.
//!
//! The descriptor table has no count: it runs until a single 0x0D byte. Each
//! iteration reads a single byte; if it is not the terminator it is the first
//! byte of the next descriptor, so only 31 more bytes are read for it.

use std::io::Read;

use super::field::{FIELD_DESCRIPTOR_LEN, HEADER_TERMINATOR, parse_field_descriptor};
use super::file::{FILE_HEADER_LEN, parse_file_header};
use super::read_fully;
use crate::charset::TextEncoding;
use crate::error::{DbfError, Result};
use crate::types::{DbfField, DbfMetadata};

/// Read field descriptors up to and including the terminator.
///
/// The reader must be positioned just after the 32-byte file header.
///
/// # Errors
/// - [`DbfError::MissingTerminator`] if the stream ends before 0x0D
/// - [`DbfError::ShortFieldDescriptor`] if a descriptor is cut off
/// - [`DbfError::UnknownFieldType`] for an unrecognized type byte
pub fn read_field_table<R: Read>(reader: &mut R) -> Result<Vec<DbfField>> {
    let mut fields = Vec::new();
    let mut offset = FILE_HEADER_LEN as u64;

    loop {
        let mut lead = [0u8; 1];
        if read_fully(reader, &mut lead)? == 0 {
            return Err(DbfError::MissingTerminator {
                fields: fields.len(),
            });
        }
        if lead[0] == HEADER_TERMINATOR {
            break;
        }

        let mut buf = [0u8; FIELD_DESCRIPTOR_LEN];
        buf[0] = lead[0];
        let read = 1 + read_fully(reader, &mut buf[1..])?;
        if read < FIELD_DESCRIPTOR_LEN {
            return Err(DbfError::ShortFieldDescriptor {
                index: fields.len(),
                offset,
                actual: read,
            });
        }

        fields.push(parse_field_descriptor(&buf, fields.len())?);
        offset += FIELD_DESCRIPTOR_LEN as u64;
    }

    tracing::debug!(fields = fields.len(), "read field table");
    Ok(fields)
}

/// Read the file header and field table into metadata.
///
/// Leaves the reader just after the terminator byte.
///
/// # Errors
/// Returns [`DbfError::Corrupted`] if fewer than 32 header bytes are available,
/// plus any error from [`read_field_table`].
pub fn read_metadata<R: Read>(
    reader: &mut R,
    default_encoding: TextEncoding,
) -> Result<DbfMetadata> {
    let mut data = [0u8; FILE_HEADER_LEN];
    let read = read_fully(reader, &mut data)?;
    if read < FILE_HEADER_LEN {
        return Err(DbfError::corrupted(format!(
            "file header is {read} bytes, expected {FILE_HEADER_LEN}"
        )));
    }

    let header = parse_file_header(&data, default_encoding)?;
    tracing::debug!(
        file_type = %header.file_type,
        records = header.record_count,
        header_length = header.header_length,
        record_length = header.record_length,
        encoding = header.encoding.name(),
        "read file header"
    );

    let fields = read_field_table(reader)?;
    DbfMetadata::from_parts(header, fields)
}
