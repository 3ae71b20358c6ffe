//! Lenient date parsing shared by all extractors.
//!
//! Catalog documents mix plain dates, local datetimes and zoned datetimes.
//! Unparseable values are logged and dropped rather than failing a document.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::warn;

use crate::model::TemporalExtent;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Parses `YYYY-MM-DD`, ignoring any time part after `T`.
#[must_use]
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let date_part = value.split('T').next().unwrap_or(value);
    match NaiveDate::parse_from_str(date_part, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(e) => {
            warn!(value, error = %e, "unparseable date");
            None
        }
    }
}

/// Parses an ISO-8601 datetime. Zone offsets are discarded so the wall-clock
/// time is kept; a bare date becomes midnight.
#[must_use]
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(zoned) = DateTime::parse_from_rfc3339(value) {
        return Some(zoned.naive_local());
    }
    let local = value.trim_end_matches('Z');
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(local, format) {
            return Some(parsed);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(local, DATE_FORMAT) {
        return date.and_hms_opt(0, 0, 0);
    }
    warn!(value, "unparseable datetime");
    None
}

/// Builds a temporal extent from optional raw start/end strings.
#[must_use]
pub fn parse_temporal_extent(start: Option<&str>, end: Option<&str>) -> Option<TemporalExtent> {
    TemporalExtent::new(start.and_then(parse_date), end.and_then(parse_date))
}
