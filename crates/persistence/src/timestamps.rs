// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Stored timestamp encoding.
//!
//! Instants are stored as fixed-width UTC text with microsecond precision,
//! so lexical order of the column equals temporal order on every backend.

use crate::error::PersistenceError;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

const STORED_INSTANT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z");

const STORED_DATE: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// Encodes an instant for storage, normalizing it to UTC.
///
/// # Errors
///
/// Returns an error if the instant cannot be formatted (years outside 0..=9999).
pub fn format_timestamp(instant: OffsetDateTime) -> Result<String, PersistenceError> {
    instant
        .to_offset(UtcOffset::UTC)
        .format(STORED_INSTANT)
        .map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

/// Decodes a stored instant.
///
/// # Errors
///
/// Returns an error if the text is not in the stored format.
pub fn parse_timestamp(text: &str) -> Result<OffsetDateTime, PersistenceError> {
    PrimitiveDateTime::parse(text, STORED_INSTANT)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|e| PersistenceError::CorruptRow(format!("invalid timestamp '{text}': {e}")))
}

/// Encodes a calendar date as `YYYY-MM-DD`.
///
/// # Errors
///
/// Returns an error if the date cannot be formatted.
pub fn format_date(date: Date) -> Result<String, PersistenceError> {
    date.format(STORED_DATE)
        .map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

/// Decodes a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns an error if the text is not a valid date.
pub fn parse_date(text: &str) -> Result<Date, PersistenceError> {
    Date::parse(text.trim(), STORED_DATE)
        .map_err(|e| PersistenceError::CorruptRow(format!("invalid date '{text}': {e}")))
}
