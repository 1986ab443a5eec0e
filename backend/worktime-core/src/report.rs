// src/report.rs
use csv::Writer;
use std::io::Write;

use crate::attendance_analysis::RemediationCandidate;

pub const CANDIDATE_CSV_HEADER: [&str; 4] =
    ["date", "valid_work_seconds", "formatted_hours", "is_absent"];

/// Manual remediation list as CSV, in candidate order. Dates use the
/// portal's `dd-MMM-yyyy` form.
pub fn write_candidates_csv<W: Write>(
    writer: W,
    candidates: &[RemediationCandidate],
) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(CANDIDATE_CSV_HEADER)?;
    for candidate in candidates {
        wtr.write_record(&[
            candidate.portal_date(),
            candidate.valid_work_seconds.to_string(),
            candidate.formatted_hours.clone(),
            candidate.is_absent.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn writes_header_and_rows_in_order() {
        let candidates = vec![
            RemediationCandidate {
                date: NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
                valid_work_seconds: 0,
                is_absent: true,
                formatted_hours: "0h 0m".to_string(),
            },
            RemediationCandidate {
                date: NaiveDate::from_ymd_opt(2025, 3, 6).unwrap(),
                valid_work_seconds: 13_500,
                is_absent: false,
                formatted_hours: "3h 45m".to_string(),
            },
        ];

        let mut out = Vec::new();
        write_candidates_csv(&mut out, &candidates).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "date,valid_work_seconds,formatted_hours,is_absent\n\
             05-Mar-2025,0,0h 0m,true\n\
             06-Mar-2025,13500,3h 45m,false\n"
        );
    }

    #[test]
    fn empty_list_is_header_only() {
        let mut out = Vec::new();
        write_candidates_csv(&mut out, &[]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "date,valid_work_seconds,formatted_hours,is_absent\n"
        );
    }
}
