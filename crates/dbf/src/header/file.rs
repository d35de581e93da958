//! File header parsing and building.
//!
//! # File Header Structure (32 bytes)
//!
//! | Offset | Field             | Type    | Description                          |
//! |--------|-------------------|---------|--------------------------------------|
//! | 0      | type              | u8      | Dialect tag                          |
//! | 1-3    | update date       | u8 x 3  | Year, month, day of last update      |
//! | 4-7    | record count      | LE u32  | Number of records                    |
//! | 8-9    | header length     | LE u16  | Header, descriptors and terminator   |
//! | 10-11  | record length     | LE u16  | Deletion marker plus field widths    |
//! | 12-13  | reserved          | -       | Zero                                 |
//! | 14     | incomplete tx     | u8      | Incomplete-transaction flag          |
//! | 15     | encryption        | u8      | Encryption flag                      |
//! | 16-28  | reserved          | -       | Zero                                 |
//! | 29     | language driver   | u8      | Code page byte                       |
//! | 30-31  | reserved          | -       | Zero                                 |

use chrono::{Datelike, NaiveDate};
use crate::charset::{self, TextEncoding};
use crate::error::{DbfError, Result};
use crate::types::{DbfFileType, DbfMetadata, HeaderYearEpoch};

/// File header length.
pub const FILE_HEADER_LEN: usize = 32;

/// Byte position of the language driver.
const LANGUAGE_DRIVER_POS: usize = 29;

/// Base year for the years-since-1900 header date.
const HEADER_YEAR_BASE: i32 = 1900;

/// Header attributes decoded from the 32-byte file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub file_type: DbfFileType,
    pub update_date: Option<NaiveDate>,
    pub record_count: u32,
    pub header_length: u16,
    pub record_length: u16,
    pub incomplete_transaction: u8,
    pub encryption_flag: u8,
    pub language_driver: u8,
    pub encoding: TextEncoding,
}

/// Parse the 32-byte file header.
///
/// `default_encoding` is used when the language driver does not resolve.
///
/// # Errors
/// Returns [`DbfError::UnknownFileType`] for an unrecognized byte 0.
pub fn parse_file_header(
    data: &[u8; FILE_HEADER_LEN],
    default_encoding: TextEncoding,
) -> Result<FileHeader> {
    let file_type =
        DbfFileType::from_byte(data[0]).ok_or(DbfError::UnknownFileType { tag: data[0] })?;
    let update_date = parse_update_date(data[1], data[2], data[3], file_type);
    if update_date.is_none() {
        tracing::warn!(
            year = data[1],
            month = data[2],
            day = data[3],
            "header update date is not a valid date"
        );
    }
    let language_driver = data[LANGUAGE_DRIVER_POS];

    Ok(FileHeader {
        file_type,
        update_date,
        record_count: read_u32(data, 4),
        header_length: read_u16(data, 8),
        record_length: read_u16(data, 10),
        incomplete_transaction: data[14],
        encryption_flag: data[15],
        language_driver,
        encoding: charset::resolve_or(language_driver, default_encoding),
    })
}

/// Decode header bytes 1-3 according to the dialect's year rule.
///
/// The year is `1900 + byte`, so 124 is 2024 and 99 is 1999. This is not the
/// `byte + 2000 - 1900` reading some format notes give, which would put those
/// bytes at 224 and 199. FoxBASE+ without memo (0x03) stores the year byte
/// itself and is returned unchanged.
#[must_use]
pub fn parse_update_date(year: u8, month: u8, day: u8, file_type: DbfFileType) -> Option<NaiveDate> {
    let year = match file_type.year_epoch() {
        HeaderYearEpoch::Since1900 => HEADER_YEAR_BASE + i32::from(year),
        HeaderYearEpoch::Verbatim => i32::from(year),
    };
    NaiveDate::from_ymd_opt(year, u32::from(month), u32::from(day))
}

/// Encode a date as header bytes 1-3, counting years since 1900.
///
/// # Errors
/// Returns [`DbfError::ValueOutOfRange`] for years outside 1900..=2155.
pub fn build_update_date(date: NaiveDate) -> Result<[u8; 3]> {
    let year = u8::try_from(date.year() - HEADER_YEAR_BASE).map_err(|_| {
        DbfError::out_of_range("<header>", format!("update year {} not in 1900..=2155", date.year()))
    })?;
    // month and day always fit a byte
    Ok([year, date.month() as u8, date.day() as u8])
}

/// Build the 32-byte file header from metadata.
///
/// A missing update date is written as today.
pub fn build_file_header(metadata: &DbfMetadata) -> Result<[u8; FILE_HEADER_LEN]> {
    let mut buf = [0u8; FILE_HEADER_LEN];

    buf[0] = metadata.file_type.to_byte();

    let update_date = metadata
        .update_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    buf[1..4].copy_from_slice(&build_update_date(update_date)?);

    buf[4..8].copy_from_slice(&metadata.record_count.to_le_bytes());
    buf[8..10].copy_from_slice(&metadata.header_length.to_le_bytes());
    buf[10..12].copy_from_slice(&metadata.record_length.to_le_bytes());

    // 12-13 reserved
    buf[14] = metadata.incomplete_transaction;
    buf[15] = metadata.encryption_flag;
    buf[LANGUAGE_DRIVER_POS] = metadata.language_driver;

    Ok(buf)
}

/// Read a little-endian u16.
fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Read a little-endian u32.
fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}
