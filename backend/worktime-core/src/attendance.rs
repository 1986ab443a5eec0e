// src/attendance.rs
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::time_format::parse_portal_date;

// --- Core Data Structures ---

/// One calendar day of attendance as reported by the portal.
///
/// Built fresh from every range fetch and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    /// Worked duration the portal reports, in seconds.
    pub total_seconds: Option<i64>,
    pub is_holiday: bool,
    pub is_weekend: bool,
    pub is_paid_leave: bool,
}

impl DayRecord {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            check_in: None,
            check_out: None,
            total_seconds: None,
            is_holiday: false,
            is_weekend: false,
            is_paid_leave: false,
        }
    }

    pub fn check_in(mut self, time: NaiveTime) -> Self {
        self.check_in = Some(time);
        self
    }

    pub fn check_out(mut self, time: NaiveTime) -> Self {
        self.check_out = Some(time);
        self
    }

    pub fn total_seconds(mut self, seconds: i64) -> Self {
        self.total_seconds = Some(seconds);
        self
    }

    pub fn holiday(mut self) -> Self {
        self.is_holiday = true;
        self
    }

    pub fn weekend(mut self) -> Self {
        self.is_weekend = true;
        self
    }

    pub fn paid_leave(mut self) -> Self {
        self.is_paid_leave = true;
        self
    }

    /// No check-out means the employee was absent.
    pub fn is_absent(&self) -> bool {
        self.check_out.is_none()
    }

    pub fn is_working_day(&self) -> bool {
        !self.is_holiday && !self.is_weekend
    }
}

/// An entry of the portal's `regDetails` map. Besides one entry per date the
/// map carries aggregate entries (such as `dayList`) that are not days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegEntry {
    Day(DayRecord),
    Aggregate { key: String },
}

impl RegEntry {
    pub fn as_day(&self) -> Option<&DayRecord> {
        match self {
            RegEntry::Day(day) => Some(day),
            RegEntry::Aggregate { .. } => None,
        }
    }
}

/// Status codes that do not hold a slot of the monthly quota.
const NON_COUNTING_STATUSES: [i64; 2] = [0, 2];

/// An attendance request the user already filed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequestRecord {
    #[serde(rename = "startDate", default)]
    pub start_date: String,
    #[serde(default, deserialize_with = "crate::portal_types::lenient_int")]
    pub status: i64,
}

impl PendingRequestRecord {
    pub fn new(start_date: &str, status: i64) -> Self {
        Self {
            start_date: start_date.to_string(),
            status,
        }
    }

    /// Outstanding or approved: the day is covered and the request counts
    /// against the monthly cap.
    pub fn is_outstanding(&self) -> bool {
        !NON_COUNTING_STATUSES.contains(&self.status)
    }

    pub fn start_day(&self) -> Option<NaiveDate> {
        parse_portal_date(&self.start_date)
    }
}
