//! Service-day time handling.
//!
//! Schedules count time in seconds since the start of the service day,
//! which is defined as noon minus twelve hours in the schedule time zone.
//! On days with a daylight-saving change this differs from local midnight,
//! and trips running after midnight have times past 24:00.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeDelta, TimeZone};
use chrono_tz::Tz;

/// Seconds in a nominal service day.
pub const SECONDS_PER_DAY: i32 = 86_400;

/// The instant the service day `date` starts in `tz`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use transit_realtime::domain::service_day_start;
///
/// let date = NaiveDate::from_ymd_opt(2023, 2, 17).unwrap();
/// let start = service_day_start(date, chrono_tz::Europe::Oslo);
/// assert_eq!(start.to_rfc3339(), "2023-02-17T00:00:00+01:00");
/// ```
pub fn service_day_start(date: NaiveDate, tz: Tz) -> DateTime<Tz> {
    let noon = date.and_time(NaiveTime::MIN) + TimeDelta::hours(12);
    let local_noon = tz
        .from_local_datetime(&noon)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&noon));
    local_noon - TimeDelta::hours(12)
}

/// Seconds from the start of service day `date` to `time`.
///
/// Negative when `time` lies before the service day begins.
pub fn seconds_since_start_of_service(
    time: &DateTime<FixedOffset>,
    date: NaiveDate,
    tz: Tz,
) -> i32 {
    let seconds = time
        .signed_duration_since(service_day_start(date, tz))
        .num_seconds();
    seconds.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// The calendar date of `time` in `tz`.
pub fn local_date(time: &DateTime<FixedOffset>, tz: Tz) -> NaiveDate {
    time.with_timezone(&tz).date_naive()
}

/// Formats seconds since start of service as `HH:MM:SS`, with hours past 24
/// for trips running after midnight.
pub fn format_seconds(seconds: i32) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let s = seconds.unsigned_abs();
    format!("{sign}{:02}:{:02}:{:02}", s / 3600, (s / 60) % 60, s % 60)
}
