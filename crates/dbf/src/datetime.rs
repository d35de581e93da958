//! Calendar codec for date and date-time fields.
//!
//! Three encodings are in use:
//!
//! | Encoding          | Width | Layout                                          |
//! |-------------------|-------|-------------------------------------------------|
//! | Date              | 8     | ASCII `YYYYMMDD`                                |
//! | Date-time (text)  | 14    | ASCII `YYYYMMDDHHmmss`                          |
//! | Date-time (binary)| 8     | LE i32 Julian day number, LE i32 ms of the day  |
//!
//! Blank values (all spaces, all `'0'`, all zero bytes) decode to `Ok(None)`;
//! anything else that fails the fixed pattern is a [`DateParseError`].

use std::ops::Range;

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike,
};
use thiserror::Error;

/// Width of a textual date.
pub const DATE_LEN: usize = 8;

/// Width of a textual date-time.
pub const DATE_TIME_LEN: usize = 14;

/// Width of a binary (Julian) date-time.
pub const JULIAN_LEN: usize = 8;

/// Days from 0001-01-01 to 1970-01-01, as modified Julian day values.
const JULIAN_0001_TO_UNIX_1970: i64 = 678_577 + 40_587;

/// Days from 0001-01-01 (day 1 of the common era) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

/// Epoch day of 1 January 4713 BCE, the Julian period start.
const fn julian_period_start() -> i64 {
    let year: i64 = 1 - 4713;
    (year - 1) * 365 + (year - 1).div_euclid(4)
}

/// Epoch day (days since 1970-01-01) of Julian day number zero.
const JULIAN_DAY_ZERO_EPOCH_DAY: i64 = julian_period_start() - JULIAN_0001_TO_UNIX_1970;

/// Failure to decode a non-blank date or date-time value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    /// Text does not match the fixed digit pattern.
    #[error("{value:?} does not match the {expected}-digit pattern")]
    Malformed { value: String, expected: usize },

    /// Digits are well-formed but do not name a calendar date or time.
    #[error("{value:?} is not a valid calendar value")]
    InvalidDate { value: String },

    /// Julian day number outside the supported calendar range.
    #[error("julian day {julian_day} is out of range")]
    OutOfRange { julian_day: i32 },

    /// Local time does not exist in the requested zone.
    #[error("{value} does not exist in the requested time zone")]
    NonexistentLocalTime { value: NaiveDateTime },

    /// Binary value has the wrong width.
    #[error("binary date-time needs {JULIAN_LEN} bytes, got {actual}")]
    WrongWidth { actual: usize },
}

/// Parse an 8-character `YYYYMMDD` date.
pub fn parse_date(text: &str) -> Result<Option<NaiveDate>, DateParseError> {
    let trimmed = text.trim();
    if is_blank_text(trimmed) {
        return Ok(None);
    }
    let digits = fixed_digits(trimmed, DATE_LEN)?;
    let date = ymd(digits, trimmed)?;
    Ok(Some(date))
}

/// Format a date as `YYYYMMDD`.
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    format!("{:04}{:02}{:02}", date.year(), date.month(), date.day())
}

/// Parse a 14-character `YYYYMMDDHHmmss` date-time as local time in `zone`.
pub fn parse_date_time<Tz: TimeZone>(
    text: &str,
    zone: &Tz,
) -> Result<Option<DateTime<Tz>>, DateParseError> {
    let trimmed = text.trim();
    if is_blank_text(trimmed) {
        return Ok(None);
    }
    let digits = fixed_digits(trimmed, DATE_TIME_LEN)?;
    let date = ymd(digits, trimmed)?;
    let time = NaiveTime::from_hms_opt(
        number(digits, 8..10),
        number(digits, 10..12),
        number(digits, 12..14),
    )
    .ok_or_else(|| DateParseError::InvalidDate {
        value: trimmed.to_string(),
    })?;
    localize(zone, date.and_time(time)).map(Some)
}

/// Format a date-time as `YYYYMMDDHHmmss` in its own zone.
#[must_use]
pub fn format_date_time<Tz: TimeZone>(value: &DateTime<Tz>) -> String {
    let local = value.naive_local();
    format!(
        "{}{:02}{:02}{:02}",
        format_date(local.date()),
        local.hour(),
        local.minute(),
        local.second()
    )
}

/// Convert a Julian day number to a proleptic Gregorian date.
#[must_use]
pub fn julian_day_to_date(julian_day: i32) -> Option<NaiveDate> {
    let epoch_day = JULIAN_DAY_ZERO_EPOCH_DAY + i64::from(julian_day);
    let days_from_ce = i32::try_from(epoch_day + UNIX_EPOCH_DAYS_FROM_CE).ok()?;
    NaiveDate::from_num_days_from_ce_opt(days_from_ce)
}

/// Convert a date to its Julian day number (Fliegel & Van Flandern).
///
/// The result is folded into 31 bits: a value above `i32::MAX` is stored as
/// the complement of its low 31 bits.
#[must_use]
pub fn date_to_julian_day(date: NaiveDate) -> i32 {
    let y = i64::from(date.year());
    let m = i64::from(date.month());
    let d = i64::from(date.day());
    // integer division truncates toward zero here, as the formula requires
    let a = (m - 14) / 12;
    let jd = (1461 * (y + 4800 + a)) / 4 + (367 * (m - 2 - 12 * a)) / 12
        - (3 * ((y + 4900 + a) / 100)) / 4
        + d
        - 32075;
    fold_to_i32(jd)
}

fn fold_to_i32(value: i64) -> i32 {
    let low = (value as i32) & i32::MAX;
    if value > i64::from(i32::MAX) { !low } else { low }
}

/// Decode the 8-byte binary date-time as local time in `zone`.
pub fn decode_julian<Tz: TimeZone>(
    bytes: &[u8],
    zone: &Tz,
) -> Result<Option<DateTime<Tz>>, DateParseError> {
    let raw: [u8; JULIAN_LEN] = bytes
        .try_into()
        .map_err(|_| DateParseError::WrongWidth {
            actual: bytes.len(),
        })?;
    if raw.iter().all(|&b| b == 0) || raw.iter().all(|&b| b == b' ') {
        return Ok(None);
    }
    let julian_day = i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
    let millis = i32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);
    let date = julian_day_to_date(julian_day).ok_or(DateParseError::OutOfRange { julian_day })?;
    let start = localize(zone, date.and_time(NaiveTime::MIN))?;
    start
        .checked_add_signed(Duration::milliseconds(i64::from(millis)))
        .map(Some)
        .ok_or(DateParseError::OutOfRange { julian_day })
}

/// Encode a date-time as the 8-byte binary form, using its local wall time.
#[must_use]
pub fn encode_julian<Tz: TimeZone>(value: &DateTime<Tz>) -> [u8; JULIAN_LEN] {
    let local = value.naive_local();
    let day = date_to_julian_day(local.date());
    let millis = millis_since_midnight(local.time());
    let mut out = [0u8; JULIAN_LEN];
    out[..4].copy_from_slice(&day.to_le_bytes());
    out[4..].copy_from_slice(&millis.to_le_bytes());
    out
}

fn millis_since_midnight(time: NaiveTime) -> i32 {
    // leap-second nanos (>= 1e9) wrap into the same second
    let sub_millis = (time.nanosecond() % 1_000_000_000) / 1_000_000;
    (time.num_seconds_from_midnight() * 1000 + sub_millis) as i32
}

/// Attach `zone` to a wall-clock time, taking the earlier instant when ambiguous.
fn localize<Tz: TimeZone>(zone: &Tz, value: NaiveDateTime) -> Result<DateTime<Tz>, DateParseError> {
    zone.from_local_datetime(&value)
        .earliest()
        .or_else(|| {
            // inside a DST gap: move forward past it
            zone.from_local_datetime(&(value + Duration::hours(1)))
                .earliest()
        })
        .ok_or(DateParseError::NonexistentLocalTime { value })
}

fn is_blank_text(text: &str) -> bool {
    text.is_empty() || text.bytes().all(|b| b == b'0')
}

/// Check that `text` is exactly `expected` ASCII digits.
fn fixed_digits(text: &str, expected: usize) -> Result<&[u8], DateParseError> {
    if text.len() != expected || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DateParseError::Malformed {
            value: text.to_string(),
            expected,
        });
    }
    Ok(text.as_bytes())
}

fn number(digits: &[u8], range: Range<usize>) -> u32 {
    digits[range]
        .iter()
        .fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
}

fn ymd(digits: &[u8], text: &str) -> Result<NaiveDate, DateParseError> {
    NaiveDate::from_ymd_opt(
        number(digits, 0..4) as i32,
        number(digits, 4..6),
        number(digits, 6..8),
    )
    .ok_or_else(|| DateParseError::InvalidDate {
        value: text.to_string(),
    })
}
