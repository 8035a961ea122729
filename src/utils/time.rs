//! Serde helpers for timestamps.
//!
//! Timestamps are written the way browsers print `Date.prototype.toISOString`:
//! UTC, millisecond precision, and a literal `Z` suffix. Any RFC 3339 string is
//! accepted when reading.

use serde::{Deserialize, Deserializer, Serializer};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Formats a timestamp as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn format_iso8601(datetime: &OffsetDateTime) -> Result<String, time::error::Format> {
    let format =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");
    datetime.to_offset(UtcOffset::UTC).format(format)
}

/// Deserialize an RFC 3339 formatted string into an OffsetDateTime
pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    OffsetDateTime::parse(&s, &Rfc3339).map_err(serde::de::Error::custom)
}

/// Serialize an OffsetDateTime as a millisecond-precision UTC string
pub fn serialize<S>(datetime: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let s = format_iso8601(datetime).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&s)
}
