// src/live_projection.rs
//
// Remaining-time projection for today's check-in.

use chrono::NaiveTime;
use serde::Serialize;

use crate::policy::{WorkSchedulePolicy, SECONDS_PER_HOUR};
use crate::time_format::{format_clock, format_seconds_hm, seconds_of_day};

const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;

pub const NOT_STARTED_LABEL: &str = "Not started yet";
pub const DAY_ENDED_LABEL: &str = "Work day ended";
pub const LEAVE_NOW_ADVICE: &str = "You can leave the office now.";

/// Late-start caps, smallest first.
const SHORT_CAP_SECONDS: i64 = 2 * SECONDS_PER_HOUR;
const HALF_CAP_SECONDS: i64 = 4 * SECONDS_PER_HOUR;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProjectionPhase {
    NotStarted,
    Ended,
    Standard,
    /// Late start with a capped target, in seconds.
    Capped { cap_seconds: i64 },
    Insufficient,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum EndOrAdvice {
    At(NaiveTime),
    Advice(String),
}

impl EndOrAdvice {
    pub fn display(&self) -> String {
        match self {
            EndOrAdvice::At(time) => format_clock(*time),
            EndOrAdvice::Advice(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveProjection {
    pub status_label: String,
    pub effective_start: NaiveTime,
    pub end_or_advice: EndOrAdvice,
    pub worked_seconds: i64,
    pub phase: ProjectionPhase,
}

impl LiveProjection {
    /// `(status, start, end or advice)` as shown to the user.
    pub fn display_triple(&self) -> (String, String, String) {
        (
            self.status_label.clone(),
            format_clock(self.effective_start),
            self.end_or_advice.display(),
        )
    }
}

fn time_from_seconds(seconds: i64) -> NaiveTime {
    let wrapped = seconds.rem_euclid(SECONDS_PER_DAY) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(wrapped, 0).unwrap_or(NaiveTime::MIN)
}

/// Seconds worked so far today. Time spent inside lunch never counts; the
/// lunch block is only deducted once `now` is past its end.
fn worked_seconds(effective_start: i64, now: i64, policy: &WorkSchedulePolicy) -> i64 {
    let lunch_start = policy.lunch_start_secs();
    let lunch_end = policy.lunch_end_secs();

    let started_before_lunch = effective_start < lunch_start;
    let measured_until = if now > lunch_end {
        now
    } else if now > lunch_start {
        lunch_start
    } else {
        now
    };
    let counted_from = if effective_start >= lunch_start && effective_start <= lunch_end {
        lunch_end
    } else {
        effective_start
    };
    let lunch_deduction = if started_before_lunch && now > lunch_end {
        policy.lunch_duration_secs()
    } else {
        0
    };

    (measured_until - counted_from - lunch_deduction).max(0)
}

pub fn project_remaining_time(
    check_in: NaiveTime,
    now: NaiveTime,
    policy: &WorkSchedulePolicy,
) -> LiveProjection {
    if now < policy.shift_start {
        return LiveProjection {
            status_label: NOT_STARTED_LABEL.to_string(),
            effective_start: policy.shift_start,
            end_or_advice: EndOrAdvice::At(policy.shift_end),
            worked_seconds: 0,
            phase: ProjectionPhase::NotStarted,
        };
    }
    if now > policy.shift_end {
        return LiveProjection {
            status_label: DAY_ENDED_LABEL.to_string(),
            effective_start: check_in,
            end_or_advice: EndOrAdvice::At(policy.shift_end),
            worked_seconds: 0,
            phase: ProjectionPhase::Ended,
        };
    }

    let effective_start = check_in.max(policy.shift_start);
    let start_secs = seconds_of_day(effective_start);
    let worked = worked_seconds(start_secs, seconds_of_day(now), policy);
    let worked_text = format_seconds_hm(worked);

    if effective_start <= policy.late_start_threshold {
        let end = start_secs + policy.standard_work_seconds + policy.lunch_duration_secs();
        return LiveProjection {
            status_label: worked_text,
            effective_start,
            end_or_advice: EndOrAdvice::At(time_from_seconds(end)),
            worked_seconds: worked,
            phase: ProjectionPhase::Standard,
        };
    }

    // Late start: work can only begin after lunch if check-in fell inside it.
    let actual_work_start =
        if effective_start >= policy.lunch_start && effective_start <= policy.lunch_end {
            policy.lunch_end_secs()
        } else {
            start_secs
        };
    let lunch_deduction = if actual_work_start < policy.lunch_start_secs() {
        policy.lunch_duration_secs()
    } else {
        0
    };
    let max_possible = policy.shift_end_secs() - actual_work_start - lunch_deduction;
    let max_text = format_seconds_hm(max_possible);

    if max_possible < SHORT_CAP_SECONDS {
        return LiveProjection {
            status_label: format!(
                "{} (insufficient time, max {} available)",
                worked_text, max_text
            ),
            effective_start,
            end_or_advice: EndOrAdvice::Advice(LEAVE_NOW_ADVICE.to_string()),
            worked_seconds: worked,
            phase: ProjectionPhase::Insufficient,
        };
    }

    let (cap_seconds, suffix) = if max_possible < HALF_CAP_SECONDS {
        (SHORT_CAP_SECONDS, "available")
    } else if max_possible < policy.limited_work_seconds {
        (HALF_CAP_SECONDS, "available")
    } else {
        (policy.limited_work_seconds, "today")
    };
    let end = start_secs + cap_seconds + lunch_deduction;

    LiveProjection {
        status_label: format!(
            "{} (capped at {}h, max {} {})",
            worked_text,
            cap_seconds / SECONDS_PER_HOUR,
            max_text,
            suffix
        ),
        effective_start,
        end_or_advice: EndOrAdvice::At(time_from_seconds(end)),
        worked_seconds: worked,
        phase: ProjectionPhase::Capped { cap_seconds },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_format::clock;

    fn triple(check_in: (u32, u32), now: (u32, u32)) -> (String, String, String) {
        project_remaining_time(
            clock(check_in.0, check_in.1),
            clock(now.0, now.1),
            &WorkSchedulePolicy::default(),
        )
        .display_triple()
    }

    fn owned(status: &str, start: &str, end: &str) -> (String, String, String) {
        (status.to_string(), start.to_string(), end.to_string())
    }

    #[test]
    fn before_shift_start_shows_full_shift() {
        assert_eq!(
            triple((9, 0), (7, 0)),
            owned("Not started yet", "7:30", "19:30")
        );
    }

    #[test]
    fn after_shift_end_shows_check_in() {
        assert_eq!(
            triple((9, 0), (20, 0)),
            owned("Work day ended", "9:00", "19:30")
        );
    }

    #[test]
    fn standard_day_deducts_lunch_once_past() {
        let projection =
            project_remaining_time(clock(9, 0), clock(18, 0), &WorkSchedulePolicy::default());
        assert_eq!(projection.worked_seconds, 7 * 3600 + 45 * 60);
        assert_eq!(projection.phase, ProjectionPhase::Standard);
        assert_eq!(projection.display_triple(), owned("7h 45m", "9:00", "18:15"));
    }

    #[test]
    fn early_check_in_counts_from_shift_start() {
        assert_eq!(triple((7, 0), (9, 30)), owned("2h 0m", "7:30", "16:45"));
    }

    #[test]
    fn time_inside_lunch_is_not_counted() {
        assert_eq!(triple((9, 0), (12, 30)).0, "3h 0m");
        assert_eq!(triple((9, 0), (13, 15)).0, "3h 0m");
        assert_eq!(triple((9, 0), (13, 30)).0, "3h 15m");
    }

    #[test]
    fn late_start_inside_lunch_snaps_to_lunch_end() {
        let projection =
            project_remaining_time(clock(12, 30), clock(15, 0), &WorkSchedulePolicy::default());
        assert_eq!(
            projection.display_triple(),
            owned("1h 45m (capped at 6h, max 6h 15m today)", "12:30", "18:30")
        );
        assert_eq!(
            projection.phase,
            ProjectionPhase::Capped {
                cap_seconds: 6 * 3600
            }
        );
    }

    #[test]
    fn late_start_before_lunch_adds_lunch_to_end() {
        assert_eq!(
            triple((11, 0), (14, 0)),
            owned("1h 45m (capped at 6h, max 7h 15m today)", "11:00", "18:15")
        );
    }

    #[test]
    fn late_start_tiers_follow_remaining_shift() {
        assert_eq!(
            triple((14, 0), (15, 0)),
            owned("1h 0m (capped at 4h, max 5h 30m available)", "14:00", "18:00")
        );
        assert_eq!(
            triple((16, 0), (16, 30)),
            owned("0h 30m (capped at 2h, max 3h 30m available)", "16:00", "18:00")
        );
    }

    #[test]
    fn tier_boundaries_take_the_higher_cap() {
        let policy = WorkSchedulePolicy::default();
        let at_boundary = |hour| project_remaining_time(clock(hour, 30), clock(19, 29), &policy);

        let two = at_boundary(17);
        assert_eq!(two.phase, ProjectionPhase::Capped { cap_seconds: 2 * 3600 });
        assert_eq!(
            two.display_triple(),
            owned("1h 59m (capped at 2h, max 2h 0m available)", "17:30", "19:30")
        );

        let four = at_boundary(15);
        assert_eq!(four.phase, ProjectionPhase::Capped { cap_seconds: 4 * 3600 });
        assert_eq!(
            four.display_triple(),
            owned("3h 59m (capped at 4h, max 4h 0m available)", "15:30", "19:30")
        );

        let six = at_boundary(13);
        assert_eq!(six.phase, ProjectionPhase::Capped { cap_seconds: 6 * 3600 });
        assert_eq!(
            six.display_triple(),
            owned("5h 59m (capped at 6h, max 6h 0m today)", "13:30", "19:30")
        );
    }

    #[test]
    fn one_minute_short_of_a_tier_drops_to_the_lower_one() {
        assert_eq!(
            triple((17, 31), (19, 29)),
            owned(
                "1h 58m (insufficient time, max 1h 59m available)",
                "17:31",
                "You can leave the office now."
            )
        );
        assert_eq!(
            triple((15, 31), (19, 29)),
            owned("3h 58m (capped at 2h, max 3h 59m available)", "15:31", "17:31")
        );
        assert_eq!(
            triple((13, 31), (19, 29)),
            owned("5h 58m (capped at 4h, max 5h 59m available)", "13:31", "17:31")
        );
    }

    #[test]
    fn too_late_to_work_gives_advice() {
        let projection =
            project_remaining_time(clock(18, 0), clock(18, 30), &WorkSchedulePolicy::default());
        assert_eq!(projection.phase, ProjectionPhase::Insufficient);
        assert_eq!(
            projection.display_triple(),
            owned(
                "0h 30m (insufficient time, max 1h 30m available)",
                "18:00",
                "You can leave the office now."
            )
        );
    }

    #[test]
    fn check_in_after_now_reports_zero_worked() {
        assert_eq!(triple((10, 0), (9, 0)).0, "0h 0m");
    }
}
