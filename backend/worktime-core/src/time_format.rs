// src/time_format.rs
use chrono::{NaiveDate, NaiveTime, Timelike};

use crate::policy::{SECONDS_PER_HOUR, SECONDS_PER_MINUTE};

/// Date key format used by the portal, e.g. `05-Jan-2025`.
pub const PORTAL_DATE_FORMAT: &str = "%d-%b-%Y";

/// Formats a duration as `"Xh Ym"`, flooring both parts. Zero and negative
/// durations render as `"0h 0m"`.
pub fn format_seconds_hm(seconds: i64) -> String {
    if seconds <= 0 {
        return "0h 0m".to_string();
    }
    let hours = seconds / SECONDS_PER_HOUR;
    let minutes = (seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    format!("{}h {}m", hours, minutes)
}

/// `H:MM`, no leading zero on the hour.
pub fn format_clock(time: NaiveTime) -> String {
    format!("{}:{:02}", time.hour(), time.minute())
}

/// Parses the portal's `HH:MM` check-in/out strings. A trailing `:SS` is
/// accepted and dropped; anything else is `None`.
pub fn parse_clock(value: &str) -> Option<NaiveTime> {
    let mut parts = value.trim().split(':');
    let hours: u32 = parts.next()?.trim().parse().ok()?;
    let minutes: u32 = parts.next()?.trim().parse().ok()?;
    if let Some(seconds) = parts.next() {
        let seconds: u32 = seconds.trim().parse().ok()?;
        if seconds > 59 {
            return None;
        }
    }
    if parts.next().is_some() {
        return None;
    }
    NaiveTime::from_hms_opt(hours, minutes, 0)
}

pub fn format_portal_date(date: NaiveDate) -> String {
    date.format(PORTAL_DATE_FORMAT).to_string()
}

pub fn parse_portal_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), PORTAL_DATE_FORMAT).ok()
}

pub fn seconds_of_day(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight())
}

pub fn minutes_of_day(time: NaiveTime) -> u32 {
    time.num_seconds_from_midnight() / 60
}

/// Clock time for a known-good hour/minute pair.
pub(crate) fn clock(hours: u32, minutes: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hours, minutes, 0).unwrap_or(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_durations_in_hours_and_minutes() {
        assert_eq!(format_seconds_hm(0), "0h 0m");
        assert_eq!(format_seconds_hm(23_400), "6h 30m");
        assert_eq!(format_seconds_hm(27_899), "7h 44m");
        assert_eq!(format_seconds_hm(-60), "0h 0m");
    }

    #[test]
    fn clock_strings_have_no_leading_hour_zero() {
        assert_eq!(format_clock(clock(9, 5)), "9:05");
        assert_eq!(format_clock(clock(18, 15)), "18:15");
    }

    #[test]
    fn parses_portal_clock_values() {
        assert_eq!(parse_clock("09:00"), Some(clock(9, 0)));
        assert_eq!(parse_clock(" 7:30 "), Some(clock(7, 30)));
        assert_eq!(parse_clock(""), None);
        assert_eq!(parse_clock("09:00 AM"), None);
        assert_eq!(parse_clock("25:00"), None);
    }

    #[test]
    fn clock_with_seconds_keeps_hours_and_minutes() {
        assert_eq!(parse_clock("18:15:00"), Some(clock(18, 15)));
        assert_eq!(parse_clock("09:05:42"), Some(clock(9, 5)));
        assert_eq!(parse_clock("09:05:60"), None);
        assert_eq!(parse_clock("09:05:xx"), None);
        assert_eq!(parse_clock("09:05:00:00"), None);
        assert_eq!(parse_clock("9"), None);
    }

    #[test]
    fn portal_dates_use_short_month_names() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert_eq!(format_portal_date(date), "05-Jan-2025");
        assert_eq!(parse_portal_date("05-Jan-2025"), Some(date));
        assert_eq!(parse_portal_date("dayList"), None);
    }

    #[test]
    fn minutes_of_day_matches_correction_window() {
        assert_eq!(minutes_of_day(clock(9, 0)), 540);
        assert_eq!(minutes_of_day(clock(18, 15)), 1095);
    }
}
