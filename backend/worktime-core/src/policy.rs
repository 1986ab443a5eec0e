// src/policy.rs
use chrono::NaiveTime;
use thiserror::Error;

use crate::time_format::{clock, format_clock, minutes_of_day, seconds_of_day};

// --- Constants ---

pub const SECONDS_PER_HOUR: i64 = 3600;
pub const SECONDS_PER_MINUTE: i64 = 60;

pub const FULL_DAY_THRESHOLD_SECONDS: i64 = 28_800; // 8h
pub const PARTIAL_DAY_THRESHOLD_SECONDS: i64 = 21_600; // 6h

pub const STANDARD_WORK_SECONDS: i64 = 8 * SECONDS_PER_HOUR;
pub const LIMITED_WORK_SECONDS: i64 = 6 * SECONDS_PER_HOUR;

pub const AUTO_REMEDIATION_COUNT: usize = 3;
pub const MONTHLY_REQUEST_LIMIT: usize = 3;

// --- Error Types ---

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Invalid time of day '{value}' for {field} (expected HH:MM)")]
    InvalidClock { field: &'static str, value: String },

    #[error("Schedule out of order: {earlier} ({earlier_at}) must be before {later} ({later_at})")]
    OutOfOrder {
        earlier: &'static str,
        earlier_at: String,
        later: &'static str,
        later_at: String,
    },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: i64 },
}

/// Fixed working-day schedule every analysis and projection runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkSchedulePolicy {
    pub shift_start: NaiveTime,
    pub shift_end: NaiveTime,
    pub lunch_start: NaiveTime,
    pub lunch_end: NaiveTime,
    pub late_start_threshold: NaiveTime,
    pub standard_work_seconds: i64,
    pub limited_work_seconds: i64,
    pub full_day_threshold_seconds: i64,
    pub partial_day_threshold_seconds: i64,
    pub auto_remediation_count: usize,
    pub monthly_request_limit: usize,
    /// Check-in written by a correction record (09:00, i.e. minute 540).
    pub correction_check_in: NaiveTime,
    /// Check-out written by a correction record (18:15, i.e. minute 1095).
    pub correction_check_out: NaiveTime,
}

impl Default for WorkSchedulePolicy {
    fn default() -> Self {
        Self {
            shift_start: clock(7, 30),
            shift_end: clock(19, 30),
            lunch_start: clock(12, 0),
            lunch_end: clock(13, 15),
            late_start_threshold: clock(10, 15),
            standard_work_seconds: STANDARD_WORK_SECONDS,
            limited_work_seconds: LIMITED_WORK_SECONDS,
            full_day_threshold_seconds: FULL_DAY_THRESHOLD_SECONDS,
            partial_day_threshold_seconds: PARTIAL_DAY_THRESHOLD_SECONDS,
            auto_remediation_count: AUTO_REMEDIATION_COUNT,
            monthly_request_limit: MONTHLY_REQUEST_LIMIT,
            correction_check_in: clock(9, 0),
            correction_check_out: clock(18, 15),
        }
    }
}

/// Minutes-of-day pair sent with a corrective attendance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrectionWindow {
    pub from_minutes: u32,
    pub to_minutes: u32,
}

impl WorkSchedulePolicy {
    pub fn shift_start_secs(&self) -> i64 {
        seconds_of_day(self.shift_start)
    }

    pub fn shift_end_secs(&self) -> i64 {
        seconds_of_day(self.shift_end)
    }

    pub fn lunch_start_secs(&self) -> i64 {
        seconds_of_day(self.lunch_start)
    }

    pub fn lunch_end_secs(&self) -> i64 {
        seconds_of_day(self.lunch_end)
    }

    pub fn late_start_threshold_secs(&self) -> i64 {
        seconds_of_day(self.late_start_threshold)
    }

    pub fn lunch_duration_secs(&self) -> i64 {
        self.lunch_end_secs() - self.lunch_start_secs()
    }

    pub fn shift_duration_secs(&self) -> i64 {
        self.shift_end_secs() - self.shift_start_secs()
    }

    pub fn correction_window(&self) -> CorrectionWindow {
        CorrectionWindow {
            from_minutes: minutes_of_day(self.correction_check_in),
            to_minutes: minutes_of_day(self.correction_check_out),
        }
    }

    /// Checks `shift_start < lunch_start < lunch_end < shift_end` and
    /// `shift_start < late_start_threshold < shift_end`.
    pub fn validate(&self) -> Result<(), PolicyError> {
        let ordered = [
            ("shift_start", self.shift_start, "lunch_start", self.lunch_start),
            ("lunch_start", self.lunch_start, "lunch_end", self.lunch_end),
            ("lunch_end", self.lunch_end, "shift_end", self.shift_end),
            (
                "shift_start",
                self.shift_start,
                "late_start_threshold",
                self.late_start_threshold,
            ),
            (
                "late_start_threshold",
                self.late_start_threshold,
                "shift_end",
                self.shift_end,
            ),
            (
                "correction_check_in",
                self.correction_check_in,
                "correction_check_out",
                self.correction_check_out,
            ),
        ];
        for (earlier, earlier_at, later, later_at) in ordered {
            if earlier_at >= later_at {
                return Err(PolicyError::OutOfOrder {
                    earlier,
                    earlier_at: format_clock(earlier_at),
                    later,
                    later_at: format_clock(later_at),
                });
            }
        }

        let positive = [
            ("standard_work_seconds", self.standard_work_seconds),
            ("limited_work_seconds", self.limited_work_seconds),
            ("full_day_threshold_seconds", self.full_day_threshold_seconds),
            (
                "partial_day_threshold_seconds",
                self.partial_day_threshold_seconds,
            ),
        ];
        for (field, value) in positive {
            if value <= 0 {
                return Err(PolicyError::NonPositive { field, value });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_valid() {
        let policy = WorkSchedulePolicy::default();
        assert_eq!(policy.validate(), Ok(()));
        assert_eq!(policy.lunch_duration_secs(), 75 * 60);
        assert_eq!(policy.shift_duration_secs(), 12 * 3600);
    }

    #[test]
    fn default_correction_window_is_540_to_1095() {
        let window = WorkSchedulePolicy::default().correction_window();
        assert_eq!(
            window,
            CorrectionWindow {
                from_minutes: 540,
                to_minutes: 1095
            }
        );
    }

    #[test]
    fn late_threshold_before_shift_start_is_rejected() {
        let policy = WorkSchedulePolicy {
            late_start_threshold: clock(7, 0),
            ..Default::default()
        };
        match policy.validate() {
            Err(PolicyError::OutOfOrder { earlier, later, .. }) => {
                assert_eq!(earlier, "shift_start");
                assert_eq!(later, "late_start_threshold");
            }
            other => panic!("Expected OutOfOrder error but got: {:?}", other),
        }
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let policy = WorkSchedulePolicy {
            full_day_threshold_seconds: 0,
            ..Default::default()
        };
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::NonPositive {
                field: "full_day_threshold_seconds",
                ..
            })
        ));
    }
}
