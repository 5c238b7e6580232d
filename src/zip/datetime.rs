//! MS-DOS date/time packing.
//!
//! The DOS format stores local time in two 16-bit words:
//! date = `year-1980 (7) | month (4) | day (5)`,
//! time = `hour (5) | minute (6) | second/2 (5)`.
//! The combined 32-bit value has the date in the high word.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Earliest representable year.
pub const MIN_YEAR: i32 = 1980;
/// Latest representable year.
pub const MAX_YEAR: i32 = 2107;

/// Stand-in for values that cannot be represented: 1980-01-01 00:00:00.
pub fn dos_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(MIN_YEAR, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

pub fn in_dos_range(value: &NaiveDateTime) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&value.year())
}

/// Decode a packed DOS timestamp. Impossible dates map to [`dos_epoch`].
pub fn from_dos(packed: u32) -> NaiveDateTime {
    let date = (packed >> 16) as u16;
    let time = packed as u16;

    let day = (date & 0x1F) as u32;
    let month = ((date >> 5) & 0x0F) as u32;
    let year = ((date >> 9) & 0x7F) as i32 + MIN_YEAR;

    let second = ((time & 0x1F) * 2) as u32;
    let minute = ((time >> 5) & 0x3F) as u32;
    let hour = ((time >> 11) & 0x1F) as u32;

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .unwrap_or_else(dos_epoch)
}

/// Encode a timestamp, truncating to even seconds. Years outside
/// 1980..=2107 encode as [`dos_epoch`].
pub fn to_dos(value: &NaiveDateTime) -> u32 {
    let value = if in_dos_range(value) { *value } else { dos_epoch() };

    let date = (((value.year() - MIN_YEAR) as u32) << 9) | (value.month() << 5) | value.day();
    let time = (value.hour() << 11) | (value.minute() << 5) | (value.second() / 2);
    (date << 16) | time
}
