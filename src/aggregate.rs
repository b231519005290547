use std::collections::HashMap;
use std::hash::Hash;

use crate::models::{AttendanceRecord, ClassAttendanceSummary};

#[derive(Debug, Clone, Copy, Default)]
pub struct GroupCounts {
    pub present: usize,
    pub total: usize,
}

impl GroupCounts {
    /// None for an empty group, so no caller ever sees a NaN percentage.
    pub fn percentage(&self) -> Option<u8> {
        if self.total == 0 {
            return None;
        }
        Some((self.present as f64 / self.total as f64 * 100.0).round() as u8)
    }
}

pub fn count_by<K, F>(records: &[AttendanceRecord], key_fn: F) -> HashMap<K, GroupCounts>
where
    K: Eq + Hash,
    F: Fn(&AttendanceRecord) -> K,
{
    let mut counts: HashMap<K, GroupCounts> = HashMap::new();

    for record in records {
        let entry = counts.entry(key_fn(record)).or_default();
        entry.total += 1;
        if record.status.counts_as_attended() {
            entry.present += 1;
        }
    }

    counts
}

pub fn class_summaries(records: &[AttendanceRecord]) -> Vec<ClassAttendanceSummary> {
    count_by(records, |record| {
        (record.class_name.clone(), record.section.clone())
    })
    .into_iter()
    .filter_map(|((class_name, section), counts)| {
        counts.percentage().map(|percentage| ClassAttendanceSummary {
            class_name,
            section,
            present: counts.present,
            total: counts.total,
            percentage,
        })
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttendanceStatus;
    use chrono::NaiveDate;

    fn record(
        class_name: &str,
        section: &str,
        day: u32,
        status: AttendanceStatus,
    ) -> AttendanceRecord {
        AttendanceRecord {
            id: format!("rec-{class_name}-{section}-{day}-{status}"),
            student_id: "stu-1".to_string(),
            student_name: "Avery Lee".to_string(),
            class_name: class_name.to_string(),
            section: section.to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            status,
            remarks: None,
        }
    }

    #[test]
    fn late_counts_toward_attendance() {
        let records = vec![
            record("8", "B", 2, AttendanceStatus::Present),
            record("8", "B", 3, AttendanceStatus::Late),
            record("8", "B", 4, AttendanceStatus::Absent),
            record("8", "B", 5, AttendanceStatus::Excused),
        ];

        let counts = count_by(&records, |r| r.date);
        assert_eq!(counts.len(), 4);

        let summaries = class_summaries(&records);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].present, 2);
        assert_eq!(summaries[0].total, 4);
        assert_eq!(summaries[0].percentage, 50);
    }

    #[test]
    fn mixed_day_splits_percentage() {
        let records = vec![
            record("8", "B", 2, AttendanceStatus::Present),
            record("8", "B", 2, AttendanceStatus::Absent),
        ];

        let counts = count_by(&records, |r| r.date);
        let day = counts
            .get(&NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())
            .unwrap();
        assert_eq!(day.present, 1);
        assert_eq!(day.total, 2);
        assert_eq!(day.percentage(), Some(50));
    }

    #[test]
    fn empty_group_has_no_percentage() {
        assert_eq!(GroupCounts::default().percentage(), None);
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(count_by(&[], |r| r.date).is_empty());
        assert!(class_summaries(&[]).is_empty());
    }

    #[test]
    fn summaries_cover_each_class_section_pair() {
        let records = vec![
            record("8", "B", 2, AttendanceStatus::Present),
            record("8", "B", 3, AttendanceStatus::Absent),
            record("9", "A", 2, AttendanceStatus::Present),
        ];

        let mut summaries = class_summaries(&records);
        summaries.sort_by(|a, b| (&a.class_name, &a.section).cmp(&(&b.class_name, &b.section)));

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].class_name, "8");
        assert_eq!(summaries[0].present, 1);
        assert_eq!(summaries[0].total, 2);
        assert_eq!(summaries[0].percentage, 50);
        assert_eq!(summaries[1].class_name, "9");
        assert_eq!(summaries[1].total, 1);
        assert_eq!(summaries[1].percentage, 100);
    }
}
