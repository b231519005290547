use chrono::{Duration, NaiveDate, Utc};

use crate::aggregate;
use crate::models::{AttendanceRecord, AttendanceTrend};

pub fn cutoff_date(days: i64) -> NaiveDate {
    Utc::now().date_naive() - Duration::days(days.max(1))
}

pub fn student_trend(
    records: &[AttendanceRecord],
    student_id: &str,
    days: i64,
) -> Vec<AttendanceTrend> {
    let cutoff = cutoff_date(days);
    let scoped: Vec<AttendanceRecord> = records
        .iter()
        .filter(|record| record.student_id == student_id && record.date >= cutoff)
        .cloned()
        .collect();
    daily_trend(&scoped)
}

pub fn class_trend(
    records: &[AttendanceRecord],
    class_name: &str,
    section: &str,
    days: i64,
) -> Vec<AttendanceTrend> {
    let cutoff = cutoff_date(days);
    let scoped: Vec<AttendanceRecord> = records
        .iter()
        .filter(|record| {
            record.class_name == class_name && record.section == section && record.date >= cutoff
        })
        .cloned()
        .collect();
    daily_trend(&scoped)
}

/// One point per calendar date with records, ascending by date.
pub fn daily_trend(records: &[AttendanceRecord]) -> Vec<AttendanceTrend> {
    let mut points: Vec<AttendanceTrend> = aggregate::count_by(records, |record| record.date)
        .into_iter()
        .filter_map(|(date, counts)| {
            counts
                .percentage()
                .map(|percentage| AttendanceTrend { date, percentage })
        })
        .collect();
    points.sort_by_key(|point| point.date);
    points
}
