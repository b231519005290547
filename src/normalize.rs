use chrono::{DateTime, NaiveDate};

use crate::models::AttendanceRecord;

/// Attendance entry as the record store returns it. The store is free to
/// hand back `date` either as a plain calendar date or as a full timestamp.
#[derive(Debug, Clone)]
pub struct RawAttendanceRecord {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub class_name: String,
    pub section: String,
    pub date: String,
    pub status: String,
    pub remarks: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("record {id}: unparseable date {date:?}")]
    BadDate { id: String, date: String },

    #[error("record {id}: unknown status {status:?}")]
    BadStatus { id: String, status: String },
}

pub fn normalize_record(raw: &RawAttendanceRecord) -> Result<AttendanceRecord, NormalizeError> {
    let date = parse_date(&raw.date).ok_or_else(|| NormalizeError::BadDate {
        id: raw.id.clone(),
        date: raw.date.clone(),
    })?;
    let status = raw.status.parse().map_err(|_| NormalizeError::BadStatus {
        id: raw.id.clone(),
        status: raw.status.clone(),
    })?;

    Ok(AttendanceRecord {
        id: raw.id.clone(),
        student_id: raw.student_id.clone(),
        student_name: raw.student_name.clone(),
        class_name: raw.class_name.clone(),
        section: raw.section.clone(),
        date,
        status,
        remarks: raw.remarks.clone(),
    })
}

/// Malformed rows are excluded rather than guessed at; the caller gets the
/// surviving records plus a count of what was dropped.
pub fn normalize_records(raw: &[RawAttendanceRecord]) -> (Vec<AttendanceRecord>, usize) {
    let mut records = Vec::with_capacity(raw.len());
    let mut skipped = 0usize;

    for row in raw {
        match normalize_record(row) {
            Ok(record) => records.push(record),
            Err(err) => {
                skipped += 1;
                tracing::warn!("dropping malformed attendance record: {err}");
            }
        }
    }

    (records, skipped)
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|stamp| stamp.date_naive())
}
