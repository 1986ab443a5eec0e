// src/attendance_analysis.rs
//
// Day classification and remediation-candidate selection. Only days before
// `today` are analysed; aggregate entries are never days.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::attendance::{DayRecord, PendingRequestRecord, RegEntry};
use crate::policy::WorkSchedulePolicy;
use crate::time_format::{format_portal_date, format_seconds_hm};
use crate::work_hours::valid_work_seconds;

// --- Classification ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DayDeficiency {
    /// Below the partial-day threshold, or an unexplained absence.
    Severe,
    /// Between the partial-day and full-day thresholds.
    Moderate,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DeficiencySummary {
    pub working_days: usize,
    pub severe_days: usize,
    pub moderate_days: usize,
    pub below_full_day_days: usize,
}

/// Entry of the "days below a full day" report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeficientDay {
    pub date: NaiveDate,
    pub valid_work_seconds: i64,
    pub is_absent: bool,
    pub deficiency: DayDeficiency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemediationCandidate {
    pub date: NaiveDate,
    /// Zero for absences.
    pub valid_work_seconds: i64,
    pub is_absent: bool,
    pub formatted_hours: String,
}

impl RemediationCandidate {
    pub fn portal_date(&self) -> String {
        format_portal_date(self.date)
    }
}

pub struct AttendanceAnalyzer<'a> {
    policy: &'a WorkSchedulePolicy,
    today: NaiveDate,
}

impl<'a> AttendanceAnalyzer<'a> {
    pub fn new(policy: &'a WorkSchedulePolicy, today: NaiveDate) -> Self {
        Self { policy, today }
    }

    pub fn policy(&self) -> &WorkSchedulePolicy {
        self.policy
    }

    /// Real days, minus today, in source order.
    pub fn analysable_days<'e>(
        &self,
        entries: &'e [RegEntry],
    ) -> impl Iterator<Item = &'e DayRecord> + 'e {
        let today = self.today;
        entries
            .iter()
            .filter_map(RegEntry::as_day)
            .filter(move |day| day.date != today)
    }

    pub fn valid_work_seconds(&self, day: &DayRecord) -> i64 {
        valid_work_seconds(day, self.policy)
    }

    pub fn is_deficient_severe(&self, day: &DayRecord) -> bool {
        if !day.is_working_day() || day.is_paid_leave {
            return false;
        }
        self.valid_work_seconds(day) < self.policy.partial_day_threshold_seconds
            || day.is_absent()
    }

    /// Severe days are never moderate, so the two counts stay disjoint.
    pub fn is_deficient_moderate(&self, day: &DayRecord) -> bool {
        if !day.is_working_day() || day.total_seconds.is_none() || self.is_deficient_severe(day)
        {
            return false;
        }
        let valid = self.valid_work_seconds(day);
        valid >= self.policy.partial_day_threshold_seconds
            && valid < self.policy.full_day_threshold_seconds
    }

    /// Working day below a full day. An absence counts whatever the
    /// paid-leave flag says.
    pub fn is_deficient_below_full_day(&self, day: &DayRecord) -> bool {
        day.is_working_day()
            && (day.is_absent()
                || self.valid_work_seconds(day) < self.policy.full_day_threshold_seconds)
    }

    pub fn classify(&self, day: &DayRecord) -> DayDeficiency {
        if self.is_deficient_severe(day) {
            DayDeficiency::Severe
        } else if self.is_deficient_moderate(day) {
            DayDeficiency::Moderate
        } else {
            DayDeficiency::None
        }
    }

    pub fn summarize(&self, entries: &[RegEntry]) -> DeficiencySummary {
        let mut summary = DeficiencySummary::default();
        for day in self.analysable_days(entries) {
            if day.is_working_day() {
                summary.working_days += 1;
            }
            match self.classify(day) {
                DayDeficiency::Severe => summary.severe_days += 1,
                DayDeficiency::Moderate => summary.moderate_days += 1,
                DayDeficiency::None => {}
            }
            if self.is_deficient_below_full_day(day) {
                summary.below_full_day_days += 1;
            }
        }
        debug!(
            "Deficiency summary: {} working days, {} severe, {} moderate, {} below full day",
            summary.working_days,
            summary.severe_days,
            summary.moderate_days,
            summary.below_full_day_days
        );
        summary
    }

    pub fn deficient_days(&self, entries: &[RegEntry]) -> Vec<DeficientDay> {
        self.analysable_days(entries)
            .filter(|day| self.is_deficient_below_full_day(day))
            .map(|day| DeficientDay {
                date: day.date,
                valid_work_seconds: self.valid_work_seconds(day),
                is_absent: day.is_absent(),
                deficiency: self.classify(day),
            })
            .collect()
    }

    // --- Remediation ---

    /// Dates already held by an outstanding or approved request.
    pub fn covered_dates(pending: &[PendingRequestRecord]) -> HashSet<NaiveDate> {
        pending
            .iter()
            .filter(|request| request.is_outstanding())
            .filter_map(|request| {
                let day = request.start_day();
                if day.is_none() {
                    debug!("Ignoring request with unreadable date '{}'", request.start_date);
                }
                day
            })
            .collect()
    }

    /// Every day eligible for a correction, shortest first. Equal durations
    /// keep their source order.
    pub fn remediation_candidates(
        &self,
        entries: &[RegEntry],
        pending: &[PendingRequestRecord],
    ) -> Vec<RemediationCandidate> {
        let covered = Self::covered_dates(pending);

        let mut candidates: Vec<RemediationCandidate> = self
            .analysable_days(entries)
            .filter(|day| day.is_working_day() && !covered.contains(&day.date))
            .filter_map(|day| {
                let valid = if day.is_absent() {
                    0
                } else {
                    self.valid_work_seconds(day)
                };
                if !day.is_absent() && valid >= self.policy.full_day_threshold_seconds {
                    return None;
                }
                Some(RemediationCandidate {
                    date: day.date,
                    valid_work_seconds: valid,
                    is_absent: day.is_absent(),
                    formatted_hours: format_seconds_hm(valid),
                })
            })
            .collect();

        // sort_by_key is stable
        candidates.sort_by_key(|candidate| candidate.valid_work_seconds);
        candidates
    }

    pub fn top_remediation_dates(
        &self,
        entries: &[RegEntry],
        pending: &[PendingRequestRecord],
        n: usize,
    ) -> Vec<NaiveDate> {
        self.remediation_candidates(entries, pending)
            .into_iter()
            .take(n)
            .map(|candidate| candidate.date)
            .collect()
    }
}
