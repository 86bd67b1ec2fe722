//! SQLite row conversion functions.
//!
//! Pure functions for converting between SQLite rows and domain types.
//! These are testable in isolation without database access.

use chrono::{DateTime, SecondsFormat, Utc};
use devicehub_core::device::Device;
use rusqlite::Row;

/// Convert a SQLite row to a Device.
///
/// Expected columns: id, name, manufacturer, created_at, updated_at
pub fn row_to_device(row: &Row) -> rusqlite::Result<Device> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let manufacturer: String = row.get(2)?;
    let created_at: String = row.get(3)?;
    let updated_at: String = row.get(4)?;

    Ok(Device {
        id,
        name,
        manufacturer,
        created_at: parse_datetime(3, &created_at)?,
        updated_at: parse_datetime(4, &updated_at)?,
    })
}

/// Parse a datetime from RFC 3339 string.
fn parse_datetime(column: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

/// Format a DateTime<Utc> for SQLite storage.
///
/// Fixed nanosecond precision with a `Z` suffix, so text order matches
/// chronological order.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}
