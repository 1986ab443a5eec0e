// src/pay_cycle.rs
//
// The portal's pay cycle runs from the 21st of one month to the 20th of the
// next. The boundary days are business rules, not user settings.

use chrono::{Datelike, Months, NaiveDate};

use crate::time_format::format_portal_date;

const CYCLE_START_DAY: u32 = 21;
const CYCLE_END_DAY: u32 = 20;
const NEXT_CYCLE_SWITCH_DAY: u32 = 23;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn portal_from(&self) -> String {
        format_portal_date(self.from)
    }

    pub fn portal_to(&self) -> String {
        format_portal_date(self.to)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

// Day `day` of the month `months_back` months before `reference`.
fn day_in_month(reference: NaiveDate, months_back: u32, day: u32) -> NaiveDate {
    reference
        .with_day(1)
        .and_then(|first| first.checked_sub_months(Months::new(months_back)))
        .and_then(|first| first.with_day(day))
        .unwrap_or(reference)
}

/// Range fetched for analysis. Before the 23rd the previous cycle is still
/// open: it starts on the 21st of last month and ends today (up to the 20th)
/// or on the 20th. From the 23rd on, the current cycle starts on the 21st.
pub fn analysis_range(today: NaiveDate) -> DateRange {
    let day = today.day();
    if day < NEXT_CYCLE_SWITCH_DAY {
        let from = day_in_month(today, 1, CYCLE_START_DAY);
        let to = if day <= CYCLE_END_DAY {
            today
        } else {
            day_in_month(today, 0, CYCLE_END_DAY)
        };
        DateRange { from, to }
    } else {
        DateRange {
            from: day_in_month(today, 0, CYCLE_START_DAY),
            to: today,
        }
    }
}

/// Last day the summary covers: yesterday, except on the 23rd where it is
/// the 21st.
pub fn report_date(today: NaiveDate) -> NaiveDate {
    if today.day() == NEXT_CYCLE_SWITCH_DAY {
        day_in_month(today, 0, CYCLE_START_DAY)
    } else {
        today.pred_opt().unwrap_or(today)
    }
}

/// The 21st and 22nd fall between cycles; the summary still shows the old one.
pub fn shows_month_transition_note(today: NaiveDate) -> bool {
    matches!(today.day(), 21 | 22)
}
