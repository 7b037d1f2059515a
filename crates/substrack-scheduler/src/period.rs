//! Calendar period arithmetic for auto-renewal.
//!
//! Month and year steps use roll-forward overflow: the day of month is kept
//! and any excess spills into the following month, so Jan 31 + 1 month is
//! Mar 2 (Mar 3 outside leap years) and Feb 29 + 1 year is Mar 1. The time of
//! day is preserved. All arithmetic is in UTC.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use substrack_core::types::PeriodUnit;

/// Add `value` units to `instant`. `None` when the result leaves chrono's range.
pub fn add_period(instant: DateTime<Utc>, value: u32, unit: PeriodUnit) -> Option<DateTime<Utc>> {
    match unit {
        PeriodUnit::Day => instant.checked_add_days(Days::new(u64::from(value))),
        PeriodUnit::Month => add_months(instant, i64::from(value)),
        PeriodUnit::Year => add_months(instant, i64::from(value).checked_mul(12)?),
    }
}

fn add_months(instant: DateTime<Utc>, months: i64) -> Option<DateTime<Utc>> {
    let naive = instant.naive_utc();
    let total = i64::from(naive.year())
        .checked_mul(12)?
        .checked_add(i64::from(naive.month0()))?
        .checked_add(months)?;
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = u32::try_from(total.rem_euclid(12)).ok()? + 1;

    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let date = first.checked_add_days(Days::new(u64::from(naive.day() - 1)))?;
    Some(date.and_time(naive.time()).and_utc())
}
