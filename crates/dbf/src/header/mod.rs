//! Header record parsing and building.
//!
//! This module handles the parts of a table that precede the records:
//! - The 32-byte file header (dialect, update date, counts, lengths, code page)
//! - 32-byte field descriptors
//! - The 0x0D-terminated descriptor table

pub mod field;
pub mod field_table;
pub mod file;

use std::io::{self, Read};

pub use field::{
    FIELD_DESCRIPTOR_LEN, HEADER_TERMINATOR, build_field_descriptor, parse_field_descriptor,
};
pub use field_table::{read_field_table, read_metadata};
pub use file::{
    FILE_HEADER_LEN, FileHeader, build_file_header, build_update_date, parse_file_header,
    parse_update_date,
};

/// Fill `buf` from `reader`, returning fewer bytes only at end of stream.
pub(crate) fn read_fully<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
