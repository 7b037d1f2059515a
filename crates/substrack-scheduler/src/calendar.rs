//! Calendar-day helpers in a fixed-offset zone.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use substrack_core::error::{Result, SubsTrackError};

/// Zone used to decide which calendar day an instant falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarZone {
    offset: FixedOffset,
}

impl Default for CalendarZone {
    fn default() -> Self {
        Self::utc()
    }
}

impl CalendarZone {
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    pub fn from_offset(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Parse `UTC`, `Z`, `+08:00`, `-0530`, `UTC+8` or `GMT-05:30`.
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let upper = trimmed.to_ascii_uppercase();
        let rest = upper
            .strip_prefix("UTC")
            .or_else(|| upper.strip_prefix("GMT"))
            .unwrap_or(&upper);
        if rest.is_empty() || rest == "Z" {
            return Ok(Self::utc());
        }

        let invalid = || SubsTrackError::config(format!("Unsupported timezone {trimmed:?}, expected a UTC offset"));
        let (sign, digits) = match rest.as_bytes().first() {
            Some(b'+') => (1, &rest[1..]),
            Some(b'-') => (-1, &rest[1..]),
            _ => return Err(invalid()),
        };
        let (hours, minutes) = match digits.split_once(':') {
            Some((h, m)) => (h, m),
            None if digits.len() == 4 => digits.split_at(2),
            None => (digits, "0"),
        };
        let hours: i32 = hours.parse().map_err(|_| invalid())?;
        let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
        if hours > 14 || minutes > 59 {
            return Err(invalid());
        }
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(Self::from_offset)
            .ok_or_else(invalid)
    }

    /// Calendar date of `instant` in this zone.
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Whole calendar days from `from`'s midnight to `to`'s midnight.
    /// Negative when `to` falls on an earlier day.
    pub fn days_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
        (self.date_of(to) - self.date_of(from)).num_days()
    }

    pub fn same_day(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.date_of(a) == self.date_of(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_days_between_ignores_time_of_day() {
        let zone = CalendarZone::utc();
        assert_eq!(zone.days_between(at(2024, 1, 1, 23, 59), at(2024, 1, 8, 0, 1)), 7);
        assert_eq!(zone.days_between(at(2024, 1, 8, 0, 1), at(2024, 1, 8, 23, 0)), 0);
        assert_eq!(zone.days_between(at(2024, 1, 9, 0, 0), at(2024, 1, 8, 23, 0)), -1);
    }

    #[test]
    fn test_offset_zone_shifts_day_boundary() {
        let taipei = CalendarZone::parse("+08:00").unwrap();
        // 2024-01-10T20:00Z is already Jan 11 in UTC+8.
        let instant = at(2024, 1, 10, 20, 0);
        assert_eq!(taipei.date_of(instant), NaiveDate::from_ymd_opt(2024, 1, 11).unwrap());
        assert!(!taipei.same_day(instant, at(2024, 1, 10, 8, 0)));
        assert!(CalendarZone::utc().same_day(instant, at(2024, 1, 10, 8, 0)));
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(CalendarZone::parse("UTC").unwrap(), CalendarZone::utc());
        assert_eq!(CalendarZone::parse("Z").unwrap(), CalendarZone::utc());
        let minus = CalendarZone::parse("-0530").unwrap();
        assert_eq!(minus.date_of(at(2024, 1, 1, 5, 0)), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert_eq!(CalendarZone::parse("UTC+8").unwrap(), CalendarZone::parse("+08:00").unwrap());
        assert_eq!(CalendarZone::parse("gmt-05:30").unwrap(), minus);
    }

    #[test]
    fn test_parse_rejects_names() {
        assert!(CalendarZone::parse("Asia/Taipei").is_err());
        assert!(CalendarZone::parse("+25:00").is_err());
    }
}
