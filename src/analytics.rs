use crate::aggregate;
use crate::models::{
    AttendancePrediction, AttendanceRecord, AttendanceTrend, ClassAttendanceSummary,
};
use crate::normalize;
use crate::risk;
use crate::store::{AttendanceFilter, AttendanceStore};
use crate::trend;

/// Fail-soft analytics over an attendance store. Dashboards call these
/// unconditionally, so a broken store degrades to empty output or the
/// insufficient-data prediction instead of an error.
pub struct AttendanceAnalytics<S> {
    store: S,
}

impl<S: AttendanceStore> AttendanceAnalytics<S> {
    pub fn new(store: S) -> Self {
        AttendanceAnalytics { store }
    }

    pub async fn student_attendance_trends(
        &self,
        student_id: &str,
        days: i64,
    ) -> Vec<AttendanceTrend> {
        let filter = AttendanceFilter::for_student(student_id).since(trend::cutoff_date(days));
        let records = self.fetch(&filter, "student trend").await;
        trend::student_trend(&records, student_id, days)
    }

    pub async fn class_attendance_trends(
        &self,
        class_name: &str,
        section: &str,
        days: i64,
    ) -> Vec<AttendanceTrend> {
        let filter =
            AttendanceFilter::for_class(class_name, section).since(trend::cutoff_date(days));
        let records = self.fetch(&filter, "class trend").await;
        trend::class_trend(&records, class_name, section, days)
    }

    /// Reads the student's full history; the classifier's consistency term
    /// is defined over the entire series, not a window.
    pub async fn predict_attendance_risk(&self, student_id: &str) -> AttendancePrediction {
        let filter = AttendanceFilter::for_student(student_id);
        let records = self.fetch(&filter, "risk prediction").await;
        let history = trend::daily_trend(&records);
        risk::predict_risk(student_id, &history)
    }

    pub async fn class_attendance_summaries(&self) -> Vec<ClassAttendanceSummary> {
        let records = self
            .fetch(&AttendanceFilter::default(), "class summary")
            .await;
        aggregate::class_summaries(&records)
    }

    async fn fetch(&self, filter: &AttendanceFilter, context: &str) -> Vec<AttendanceRecord> {
        match self.store.query_attendance(filter).await {
            Ok(raw) => {
                let (records, skipped) = normalize::normalize_records(&raw);
                if skipped > 0 {
                    tracing::warn!("{context}: dropped {skipped} malformed attendance records");
                }
                records
            }
            Err(err) => {
                tracing::warn!("{context}: attendance fetch failed, degrading to empty: {err}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskLevel;
    use crate::normalize::RawAttendanceRecord;
    use crate::store::StoreError;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    struct FixedStore {
        rows: Vec<RawAttendanceRecord>,
    }

    #[async_trait]
    impl AttendanceStore for FixedStore {
        async fn query_attendance(
            &self,
            _filter: &AttendanceFilter,
        ) -> Result<Vec<RawAttendanceRecord>, StoreError> {
            Ok(self.rows.clone())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl AttendanceStore for BrokenStore {
        async fn query_attendance(
            &self,
            _filter: &AttendanceFilter,
        ) -> Result<Vec<RawAttendanceRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    fn raw_row(student_id: &str, days_ago: i64, status: &str) -> RawAttendanceRecord {
        let date = Utc::now().date_naive() - Duration::days(days_ago);
        RawAttendanceRecord {
            id: format!("rec-{student_id}-{days_ago}"),
            student_id: student_id.to_string(),
            student_name: "Avery Lee".to_string(),
            class_name: "8".to_string(),
            section: "B".to_string(),
            date: date.to_string(),
            status: status.to_string(),
            remarks: None,
        }
    }

    #[tokio::test]
    async fn broken_store_degrades_to_empty_and_default() {
        let analytics = AttendanceAnalytics::new(BrokenStore);

        assert!(analytics.student_attendance_trends("stu-1", 30).await.is_empty());
        assert!(analytics.class_attendance_trends("8", "B", 30).await.is_empty());
        assert!(analytics.class_attendance_summaries().await.is_empty());

        let prediction = analytics.predict_attendance_risk("stu-1").await;
        assert_eq!(prediction.risk_level, RiskLevel::Low);
        assert_eq!(prediction.predicted_attendance, 90);
        assert_eq!(
            prediction.explanation,
            "Insufficient data for accurate prediction"
        );
    }

    #[tokio::test]
    async fn malformed_rows_are_dropped_not_fatal() {
        let mut rows = vec![raw_row("stu-1", 1, "present"), raw_row("stu-1", 2, "absent")];
        rows.push(RawAttendanceRecord {
            date: "last tuesday".to_string(),
            ..raw_row("stu-1", 3, "present")
        });

        let analytics = AttendanceAnalytics::new(FixedStore { rows });
        let points = analytics.student_attendance_trends("stu-1", 30).await;
        assert_eq!(points.len(), 2);
    }

    #[tokio::test]
    async fn prediction_runs_over_daily_history() {
        let rows: Vec<RawAttendanceRecord> = (1..=6)
            .map(|days_ago| raw_row("stu-1", days_ago, "absent"))
            .collect();

        let analytics = AttendanceAnalytics::new(FixedStore { rows });
        let prediction = analytics.predict_attendance_risk("stu-1").await;
        assert_eq!(prediction.risk_level, RiskLevel::High);
        assert_eq!(prediction.explanation, "Attendance below 70%");
        assert_eq!(prediction.predicted_attendance, 0);
    }

    #[tokio::test]
    async fn summaries_come_from_the_full_record_set() {
        let rows = vec![
            raw_row("stu-1", 1, "present"),
            raw_row("stu-1", 2, "late"),
            raw_row("stu-1", 3, "absent"),
        ];

        let analytics = AttendanceAnalytics::new(FixedStore { rows });
        let summaries = analytics.class_attendance_summaries().await;
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].present, 2);
        assert_eq!(summaries[0].total, 3);
        assert_eq!(summaries[0].percentage, 67);
    }
}
