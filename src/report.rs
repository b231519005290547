use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::NaiveDate;

use crate::aggregate;
use crate::models::{AttendancePrediction, AttendanceRecord, AttendanceStatus, RiskLevel};
use crate::risk;
use crate::trend;

/// Flag every student in the record set whose classified risk is above low.
/// Highest risk first, then lowest predicted attendance.
pub fn students_at_risk(records: &[AttendanceRecord]) -> Vec<(String, AttendancePrediction)> {
    let mut by_student: BTreeMap<&str, Vec<AttendanceRecord>> = BTreeMap::new();
    for record in records {
        by_student
            .entry(record.student_id.as_str())
            .or_default()
            .push(record.clone());
    }

    let mut flagged = Vec::new();
    for (student_id, student_records) in &by_student {
        let history = trend::daily_trend(student_records);
        let prediction = risk::predict_risk(student_id, &history);
        if prediction.risk_level != RiskLevel::Low {
            flagged.push((student_records[0].student_name.clone(), prediction));
        }
    }

    flagged.sort_by(|a, b| {
        b.1.risk_level
            .cmp(&a.1.risk_level)
            .then(a.1.predicted_attendance.cmp(&b.1.predicted_attendance))
    });
    flagged
}

pub fn build_report(records: &[AttendanceRecord], days: i64, cutoff: NaiveDate) -> String {
    let mut summaries = aggregate::class_summaries(records);
    summaries.sort_by(|a, b| (&a.class_name, &a.section).cmp(&(&b.class_name, &b.section)));
    let flagged = students_at_risk(records);

    let mut output = String::new();

    let _ = writeln!(output, "# Attendance Report");
    let _ = writeln!(
        output,
        "Covering the last {days} days (records since {cutoff}). Risk is \
         classified within this window."
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Class Attendance");

    if summaries.is_empty() {
        let _ = writeln!(output, "No attendance records in this window.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- Class {} {}: {}/{} attended ({}%)",
                summary.class_name, summary.section, summary.present, summary.total,
                summary.percentage
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Students At Risk");

    if flagged.is_empty() {
        let _ = writeln!(output, "No students flagged in this window.");
    } else {
        for (name, prediction) in flagged.iter() {
            let _ = writeln!(
                output,
                "- {} ({}): {} risk, predicted attendance {}% ({})",
                name,
                prediction.student_id,
                prediction.risk_level,
                prediction.predicted_attendance,
                prediction.explanation
            );
        }
    }

    let mut absences: Vec<&AttendanceRecord> = records
        .iter()
        .filter(|record| record.status == AttendanceStatus::Absent)
        .collect();
    absences.sort_by(|a, b| b.date.cmp(&a.date));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Absences");

    if absences.is_empty() {
        let _ = writeln!(output, "No absences recorded in this window.");
    } else {
        for record in absences.iter().take(5) {
            let remark = record.remarks.as_deref().unwrap_or("no remarks");
            let _ = writeln!(
                output,
                "- {}: {} (class {} {}), {}",
                record.date, record.student_name, record.class_name, record.section, remark
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(
        student_id: &str,
        name: &str,
        days_after_start: i64,
        status: AttendanceStatus,
    ) -> AttendanceRecord {
        let start = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        AttendanceRecord {
            id: format!("rec-{student_id}-{days_after_start}"),
            student_id: student_id.to_string(),
            student_name: name.to_string(),
            class_name: "8".to_string(),
            section: "B".to_string(),
            date: start + Duration::days(days_after_start),
            status,
            remarks: None,
        }
    }

    #[test]
    fn report_flags_the_absentee_and_lists_sections() {
        let mut records = Vec::new();
        for day in 0..6 {
            records.push(record("stu-1", "Avery Lee", day, AttendanceStatus::Present));
            records.push(record("stu-2", "Jules Moreno", day, AttendanceStatus::Absent));
        }

        let cutoff = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let report = build_report(&records, 30, cutoff);

        assert!(report.contains("# Attendance Report"));
        assert!(report.contains("- Class 8 B: 6/12 attended (50%)"));
        assert!(report.contains("Jules Moreno (stu-2): high risk"));
        assert!(!report.contains("Avery Lee (stu-1)"));
    }
}
