// src/work_hours.rs
use crate::attendance::DayRecord;
use crate::policy::WorkSchedulePolicy;
use crate::time_format::seconds_of_day;

/// Length of the intersection of `[start_a, end_a]` and `[start_b, end_b]`.
pub fn overlap_seconds(start_a: i64, end_a: i64, start_b: i64, end_b: i64) -> i64 {
    (end_a.min(end_b) - start_a.max(start_b)).max(0)
}

/// Seconds a day counts as worked: the check-in/out interval clamped to the
/// shift, minus whatever part of it falls inside lunch.
///
/// Without a reported total the day is worth nothing. Without both
/// boundaries the reported total is taken as is.
pub fn valid_work_seconds(record: &DayRecord, policy: &WorkSchedulePolicy) -> i64 {
    let Some(total_seconds) = record.total_seconds else {
        return 0;
    };
    let (Some(check_in), Some(check_out)) = (record.check_in, record.check_out) else {
        return total_seconds;
    };

    let start = seconds_of_day(check_in).max(policy.shift_start_secs());
    let end = seconds_of_day(check_out).min(policy.shift_end_secs());
    if end <= start {
        return 0;
    }

    let lunch = overlap_seconds(
        start,
        end,
        policy.lunch_start_secs(),
        policy.lunch_end_secs(),
    );
    (end - start - lunch).max(0)
}
