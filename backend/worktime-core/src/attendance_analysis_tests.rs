// src/attendance_analysis_tests.rs

#[cfg(test)]
mod tests {
    use crate::attendance::{DayRecord, PendingRequestRecord, RegEntry};
    use crate::attendance_analysis::*;
    use crate::policy::WorkSchedulePolicy;
    use crate::time_format::clock;
    use chrono::NaiveDate;

    fn d(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .unwrap_or_else(|_| panic!("Invalid date string format: {}", date_str))
    }

    // Helper to build a worked day; total is what the portal would report
    fn worked(date: &str, from: (u32, u32), to: (u32, u32)) -> RegEntry {
        RegEntry::Day(
            DayRecord::new(d(date))
                .check_in(clock(from.0, from.1))
                .check_out(clock(to.0, to.1))
                .total_seconds(1),
        )
    }

    fn absent(date: &str) -> RegEntry {
        RegEntry::Day(DayRecord::new(d(date)))
    }

    fn aggregate() -> RegEntry {
        RegEntry::Aggregate {
            key: "dayList".to_string(),
        }
    }

    const TODAY: &str = "2025-03-14";

    // Mon 3rd .. Thu 13th plus today (Fri 14th)
    fn sample_month() -> Vec<RegEntry> {
        vec![
            worked("2025-03-03", (9, 0), (18, 15)), // 8h
            worked("2025-03-04", (9, 0), (17, 0)),  // 6h45m
            absent("2025-03-05"),
            worked("2025-03-06", (10, 0), (15, 0)), // 3h45m
            RegEntry::Day(
                DayRecord::new(d("2025-03-08"))
                    .weekend()
                    .check_in(clock(10, 0))
                    .check_out(clock(11, 0))
                    .total_seconds(3600),
            ),
            RegEntry::Day(DayRecord::new(d("2025-03-10")).paid_leave()),
            worked("2025-03-11", (9, 0), (16, 0)), // 5h45m
            RegEntry::Day(DayRecord::new(d("2025-03-12")).holiday()),
            worked("2025-03-13", (8, 0), (17, 0)), // 7h45m
            worked(TODAY, (9, 0), (10, 0)),
            aggregate(),
        ]
    }

    #[test]
    fn summary_counts_severe_and_moderate_days() {
        let policy = WorkSchedulePolicy::default();
        let analyzer = AttendanceAnalyzer::new(&policy, d(TODAY));

        let summary = analyzer.summarize(&sample_month());

        // severe: absent 5th, 3h45m on 6th, 5h45m on 11th
        assert_eq!(summary.severe_days, 3);
        // moderate: 6h45m on 4th, 7h45m on 13th
        assert_eq!(summary.moderate_days, 2);
        // below 8h adds the paid-leave absence on the 10th
        assert_eq!(summary.below_full_day_days, 6);
        assert_eq!(summary.working_days, 7);
        assert!(summary.severe_days + summary.moderate_days <= summary.working_days);
    }

    #[test]
    fn today_and_aggregates_are_never_analysed() {
        let policy = WorkSchedulePolicy::default();
        let analyzer = AttendanceAnalyzer::new(&policy, d(TODAY));
        let entries = vec![worked(TODAY, (9, 0), (10, 0)), aggregate()];

        assert_eq!(analyzer.summarize(&entries), DeficiencySummary::default());
        assert!(analyzer.remediation_candidates(&entries, &[]).is_empty());
    }

    #[test]
    fn paid_leave_absence_is_not_severe_but_is_below_full_day() {
        let policy = WorkSchedulePolicy::default();
        let analyzer = AttendanceAnalyzer::new(&policy, d(TODAY));
        let day = DayRecord::new(d("2025-03-10")).paid_leave();

        assert!(!analyzer.is_deficient_severe(&day));
        assert!(!analyzer.is_deficient_moderate(&day));
        assert!(analyzer.is_deficient_below_full_day(&day));
    }

    #[test]
    fn absence_with_high_reported_total_is_only_severe() {
        let policy = WorkSchedulePolicy::default();
        let analyzer = AttendanceAnalyzer::new(&policy, d(TODAY));
        // check-in only, the portal still reports 7h
        let day = DayRecord::new(d("2025-03-04"))
            .check_in(clock(9, 0))
            .total_seconds(7 * 3600);

        assert_eq!(analyzer.classify(&day), DayDeficiency::Severe);
        assert!(!analyzer.is_deficient_moderate(&day));
    }

    #[test]
    fn moderate_requires_a_reported_total() {
        let policy = WorkSchedulePolicy::default();
        let analyzer = AttendanceAnalyzer::new(&policy, d(TODAY));
        let day = DayRecord::new(d("2025-03-04"))
            .check_in(clock(9, 0))
            .check_out(clock(17, 0));

        // no total means 0 valid seconds, which is severe
        assert_eq!(analyzer.classify(&day), DayDeficiency::Severe);
    }

    #[test]
    fn candidates_are_sorted_shortest_first_with_absences_as_zero() {
        let policy = WorkSchedulePolicy::default();
        let analyzer = AttendanceAnalyzer::new(&policy, d(TODAY));

        let candidates = analyzer.remediation_candidates(&sample_month(), &[]);
        let dates: Vec<NaiveDate> = candidates.iter().map(|c| c.date).collect();

        assert_eq!(
            dates,
            vec![
                d("2025-03-05"), // absent
                d("2025-03-10"), // paid leave, absent
                d("2025-03-06"), // 3h45m
                d("2025-03-11"), // 5h45m
                d("2025-03-04"), // 6h45m
                d("2025-03-13"), // 7h45m
            ]
        );
        assert_eq!(candidates[0].valid_work_seconds, 0);
        assert_eq!(candidates[0].formatted_hours, "0h 0m");
        assert_eq!(candidates[2].formatted_hours, "3h 45m");
        assert_eq!(candidates[2].portal_date(), "06-Mar-2025");
    }

    #[test]
    fn equal_durations_keep_source_order() {
        let policy = WorkSchedulePolicy::default();
        let analyzer = AttendanceAnalyzer::new(&policy, d(TODAY));
        let entries = vec![
            absent("2025-03-07"),
            worked("2025-03-04", (9, 0), (12, 0)),
            absent("2025-03-03"),
            worked("2025-03-05", (9, 0), (12, 0)),
        ];

        let dates = analyzer.top_remediation_dates(&entries, &[], 4);
        assert_eq!(
            dates,
            vec![
                d("2025-03-07"),
                d("2025-03-03"),
                d("2025-03-04"),
                d("2025-03-05")
            ]
        );
    }

    #[test]
    fn covered_dates_are_excluded_from_candidates() {
        let policy = WorkSchedulePolicy::default();
        let analyzer = AttendanceAnalyzer::new(&policy, d(TODAY));
        let pending = vec![
            PendingRequestRecord::new("05-Mar-2025", 1),
            PendingRequestRecord::new("06-Mar-2025", 2), // rejected, not covered
            PendingRequestRecord::new("11-Mar-2025", 0), // withdrawn, not covered
        ];

        let top = analyzer.top_remediation_dates(&sample_month(), &pending, 3);

        assert_eq!(
            top,
            vec![d("2025-03-10"), d("2025-03-06"), d("2025-03-11")]
        );
    }

    #[test]
    fn top_n_is_a_prefix_of_all_candidates() {
        let policy = WorkSchedulePolicy::default();
        let analyzer = AttendanceAnalyzer::new(&policy, d(TODAY));
        let pending = vec![PendingRequestRecord::new("06-Mar-2025", 1)];
        let covered = AttendanceAnalyzer::covered_dates(&pending);

        let all: Vec<NaiveDate> = analyzer
            .remediation_candidates(&sample_month(), &pending)
            .into_iter()
            .map(|c| c.date)
            .collect();
        let top = analyzer.top_remediation_dates(
            &sample_month(),
            &pending,
            policy.auto_remediation_count,
        );

        assert!(top.len() <= 3);
        assert_eq!(&all[..top.len()], &top[..]);
        assert!(top.iter().all(|date| !covered.contains(date)));
    }

    #[test]
    fn full_days_and_non_working_days_are_not_candidates() {
        let policy = WorkSchedulePolicy::default();
        let analyzer = AttendanceAnalyzer::new(&policy, d(TODAY));
        let entries = vec![
            worked("2025-03-03", (7, 0), (20, 0)),
            RegEntry::Day(DayRecord::new(d("2025-03-08")).weekend()),
            RegEntry::Day(DayRecord::new(d("2025-03-12")).holiday()),
        ];

        assert!(analyzer.remediation_candidates(&entries, &[]).is_empty());
    }

    #[test]
    fn deficient_days_report_carries_absence_flag() {
        let policy = WorkSchedulePolicy::default();
        let analyzer = AttendanceAnalyzer::new(&policy, d(TODAY));

        let report = analyzer.deficient_days(&sample_month());

        assert_eq!(report.len(), 6);
        let fifth = report.iter().find(|day| day.date == d("2025-03-05")).unwrap();
        assert!(fifth.is_absent);
        assert_eq!(fifth.deficiency, DayDeficiency::Severe);
        let fourth = report.iter().find(|day| day.date == d("2025-03-04")).unwrap();
        assert_eq!(fourth.valid_work_seconds, 6 * 3600 + 45 * 60);
        assert_eq!(fourth.deficiency, DayDeficiency::Moderate);
    }

    #[test]
    fn thresholds_are_inclusive_lower_bounds() {
        let policy = WorkSchedulePolicy::default();
        let analyzer = AttendanceAnalyzer::new(&policy, d(TODAY));
        let classify = |to: (u32, u32)| {
            let entry = worked("2025-03-04", (9, 0), to);
            let day = entry.as_day().unwrap();
            (
                analyzer.valid_work_seconds(day),
                analyzer.classify(day),
                analyzer.is_deficient_below_full_day(day),
            )
        };

        // exactly 6h is moderate, one minute less is severe
        assert_eq!(classify((16, 15)), (21_600, DayDeficiency::Moderate, true));
        assert_eq!(classify((16, 14)), (21_540, DayDeficiency::Severe, true));
        // exactly 8h is a full day
        assert_eq!(classify((18, 15)), (28_800, DayDeficiency::None, false));
        assert_eq!(classify((18, 14)), (28_740, DayDeficiency::Moderate, true));
    }

    #[test]
    fn exactly_full_day_is_not_a_candidate() {
        let policy = WorkSchedulePolicy::default();
        let analyzer = AttendanceAnalyzer::new(&policy, d(TODAY));
        let entries = vec![
            worked("2025-03-03", (9, 0), (18, 15)),
            worked("2025-03-04", (9, 0), (18, 14)),
        ];

        let candidates = analyzer.remediation_candidates(&entries, &[]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].date, d("2025-03-04"));
        assert_eq!(candidates[0].formatted_hours, "7h 59m");
    }

    #[test]
    fn unreadable_request_dates_cover_nothing() {
        let pending = vec![PendingRequestRecord::new("2025-03-05", 1)];
        assert!(AttendanceAnalyzer::covered_dates(&pending).is_empty());
    }
}
