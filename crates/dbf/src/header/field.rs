//! Field descriptor parsing and building.
//!
//! # Field Descriptor Structure (32 bytes)
//!
//! | Offset | Field     | Type     | Description                            |
//! |--------|-----------|----------|----------------------------------------|
//! | 0-10   | name      | char[11] | NUL-padded ASCII                       |
//! | 11     | type      | u8       | Type tag character                     |
//! | 12-15  | offset    | LE u32   | Position in record (advisory)          |
//! | 16     | length    | u8       | Field width                            |
//! | 17     | decimals  | u8       | Digits after the decimal point         |
//! | 18-31  | reserved  | -        | Zero                                   |

use crate::error::{DbfError, Result};
use crate::types::{DbfField, DbfFieldType, FIELD_NAME_LEN};

/// Field descriptor length.
pub const FIELD_DESCRIPTOR_LEN: usize = 32;

/// Byte that ends the descriptor table.
pub const HEADER_TERMINATOR: u8 = 0x0D;

/// Parse one field descriptor.
///
/// # Arguments
/// * `data` - The 32 descriptor bytes
/// * `index` - Descriptor index (for error messages)
///
/// # Errors
/// Returns [`DbfError::UnknownFieldType`] for an unrecognized type byte.
pub fn parse_field_descriptor(data: &[u8; FIELD_DESCRIPTOR_LEN], index: usize) -> Result<DbfField> {
    // name: up to the first NUL within 11 bytes
    let name_len = data[..FIELD_NAME_LEN]
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(FIELD_NAME_LEN);
    let name = String::from_utf8_lossy(&data[..name_len]).into_owned();

    let type_byte = data[11];
    let field_type =
        DbfFieldType::from_byte(type_byte).ok_or_else(|| DbfError::UnknownFieldType {
            name: name.clone(),
            tag: char::from(type_byte),
            byte: type_byte,
        })?;

    let field = DbfField::new(name, field_type, data[16], data[17]);
    tracing::trace!(index, field = %field, "parsed field descriptor");
    Ok(field)
}

/// Build one field descriptor.
///
/// The field's record offset is written to bytes 12-15.
///
/// # Errors
/// Returns [`DbfError::FieldNameTooLong`] if the name exceeds 11 bytes.
pub fn build_field_descriptor(field: &DbfField) -> Result<[u8; FIELD_DESCRIPTOR_LEN]> {
    let mut buf = [0u8; FIELD_DESCRIPTOR_LEN];

    let name = field.name.as_bytes();
    if name.len() > FIELD_NAME_LEN {
        return Err(DbfError::FieldNameTooLong {
            name: field.name.clone(),
            len: name.len(),
        });
    }
    buf[..name.len()].copy_from_slice(name);

    buf[11] = field.field_type.to_byte();

    let offset = u32::try_from(field.offset())
        .map_err(|_| DbfError::out_of_range(&field.name, "record offset exceeds 32 bits"))?;
    buf[12..16].copy_from_slice(&offset.to_le_bytes());

    buf[16] = field.length;
    buf[17] = field.decimal_count;

    Ok(buf)
}
