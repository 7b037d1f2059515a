//! ISO-8601 instant parsing and formatting for stored subscription fields.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use crate::error::{Result, SubsTrackError};

/// Parse a stored instant.
///
/// Accepts RFC 3339 (`2024-01-10T08:00:00.000Z`, `2024-01-10T16:00:00+08:00`),
/// a naive date-time (read as UTC) and a bare date (UTC midnight).
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(SubsTrackError::invalid_date(value, "not an ISO-8601 date or date-time"))
}

/// Format an instant the way the store writes them: UTC, millisecond precision.
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_rfc3339_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();
        assert_eq!(parse_instant("2024-01-10T08:00:00.000Z").unwrap(), expected);
        assert_eq!(parse_instant("2024-01-10T08:00:00Z").unwrap(), expected);
        assert_eq!(parse_instant("2024-01-10T16:00:00+08:00").unwrap(), expected);
    }

    #[test]
    fn test_parse_naive_forms_as_utc() {
        assert_eq!(
            parse_instant("2024-01-10T08:00:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap()
        );
        assert_eq!(
            parse_instant("2023-01-01").unwrap(),
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_instant("next tuesday").unwrap_err();
        assert!(matches!(err, SubsTrackError::InvalidDate { .. }));
    }

    #[test]
    fn test_format_matches_stored_shape() {
        let instant = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        assert_eq!(format_instant(instant), "2024-06-15T00:00:00.000Z");
        assert_eq!(parse_instant(&format_instant(instant)).unwrap(), instant);
    }
}
