//! Canonical timestamp encoding shared by the SQLite adapters.
//!
//! Timestamps are stored as RFC 3339 text with millisecond precision and a
//! trailing `Z`. The width is fixed, so lexicographic comparison of stored
//! values matches chronological order and range predicates can be pushed down
//! to the database as plain string comparisons.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{CoreError, CoreResult};

/// Encodes a timestamp into its canonical storage form.
#[must_use]
pub fn encode(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Decodes a stored timestamp back into UTC.
///
/// # Errors
///
/// Returns `CoreError::Internal` when the stored text is not valid RFC 3339.
pub fn decode(raw: &str) -> CoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| CoreError::internal(format!("invalid stored timestamp `{raw}`: {err}")))
}
