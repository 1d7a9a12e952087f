//! Acquisition time slots.

use std::collections::HashMap;
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use super::fields::{parse_field, FieldError};

/// The acquisition time of one satellite pass or repeat-cycle slot.
///
/// Notification payloads carry the time as separate string fields;
/// [`TimeSlot::from_fields`] assembles and calendar-validates them. Seconds
/// are not part of the wire format and are always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot(NaiveDateTime);

impl TimeSlot {
    /// Wraps an already-validated timestamp.
    pub fn new(inner: NaiveDateTime) -> Self {
        Self(inner)
    }

    /// Builds a time slot from calendar components.
    ///
    /// Returns `None` for combinations that do not exist on the calendar.
    pub fn from_ymd_hm(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)?
            .and_hms_opt(hour, minute, 0)
            .map(Self)
    }

    /// Assembles a time slot from the `year`/`month`/`day`/`hour`/`minute`
    /// fields of a file-arrival payload.
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, FieldError> {
        let year: i32 = parse_field(fields, "year")?;
        let month: u32 = parse_field(fields, "month")?;
        let day: u32 = parse_field(fields, "day")?;
        let hour: u32 = parse_field(fields, "hour")?;
        let minute: u32 = parse_field(fields, "minute")?;

        Self::from_ymd_hm(year, month, day, hour, minute).ok_or_else(|| {
            FieldError::InvalidTimestamp(format!(
                "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}"
            ))
        })
    }

    /// Calendar year.
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Calendar month, 1 to 12.
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Day of month, 1-based.
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Hour of day, 0 to 23.
    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    /// Minute of hour, 0 to 59.
    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    /// The wrapped timestamp.
    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M"))
    }
}
