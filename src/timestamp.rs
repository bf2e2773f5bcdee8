//! The local wall-clock timestamp stored in `created_at`/`updated_at` columns.
//!
//! Timestamps are kept as text in the form "2024-05-01 13:45:00" in the
//! server's configured timezone. SQLite's `DATE()` then yields the local
//! calendar date, and comparing the text sorts chronologically.

use std::fmt::Display;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Serialize, Serializer};
#[cfg(test)]
use time::Date;
use time::{
    OffsetDateTime, PrimitiveDateTime, UtcOffset, format_description::BorrowedFormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};

/// Date time format for stored timestamps, e.g. "2024-05-01 13:45:00".
const DATE_TIME_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// A local date and time with second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(PrimitiveDateTime);

impl Timestamp {
    /// Wrap a local date and time, dropping anything below a second.
    pub fn new(date_time: PrimitiveDateTime) -> Self {
        Self(date_time.replace_nanosecond(0).unwrap_or(date_time))
    }

    /// The local calendar date of the timestamp.
    #[cfg(test)]
    pub fn date(&self) -> Date {
        self.0.date()
    }

    /// Parse either local "YYYY-MM-DD HH:MM:SS" or an RFC 3339 string.
    ///
    /// RFC 3339 input names its own offset and is converted to `local_offset`
    /// before the offset is dropped.
    pub fn parse(text: &str, local_offset: UtcOffset) -> Result<Self, time::error::Parse> {
        match PrimitiveDateTime::parse(text, DATE_TIME_FORMAT) {
            Ok(date_time) => Ok(Self::new(date_time)),
            Err(_) => OffsetDateTime::parse(text, &Rfc3339)
                .map(|date_time| Self::from(date_time.to_offset(local_offset))),
        }
    }
}

impl From<OffsetDateTime> for Timestamp {
    fn from(date_time: OffsetDateTime) -> Self {
        Self::new(PrimitiveDateTime::new(date_time.date(), date_time.time()))
    }
}

impl From<PrimitiveDateTime> for Timestamp {
    fn from(date_time: PrimitiveDateTime) -> Self {
        Self::new(date_time)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = self.0.format(DATE_TIME_FORMAT).map_err(|_| std::fmt::Error)?;
        f.write_str(&text)
    }
}

impl ToSql for Timestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0
            .format(DATE_TIME_FORMAT)
            .map(ToSqlOutput::from)
            .map_err(|error| rusqlite::Error::ToSqlConversionFailure(Box::new(error)))
    }
}

impl FromSql for Timestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        PrimitiveDateTime::parse(text, DATE_TIME_FORMAT)
            .map(Self)
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = self
            .0
            .format(DATE_TIME_FORMAT)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }
}
