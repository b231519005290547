use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::normalize::RawAttendanceRecord;

#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub student_id: Option<String>,
    pub class_name: Option<String>,
    pub section: Option<String>,
    pub date_from: Option<NaiveDate>,
}

impl AttendanceFilter {
    pub fn for_student(student_id: &str) -> Self {
        AttendanceFilter {
            student_id: Some(student_id.to_string()),
            ..Default::default()
        }
    }

    pub fn for_class(class_name: &str, section: &str) -> Self {
        AttendanceFilter {
            class_name: Some(class_name.to_string()),
            section: Some(section.to_string()),
            ..Default::default()
        }
    }

    pub fn since(mut self, date_from: NaiveDate) -> Self {
        self.date_from = Some(date_from);
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("attendance query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("attendance store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn query_attendance(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<Vec<RawAttendanceRecord>, StoreError>;
}

pub struct PgAttendanceStore {
    pool: PgPool,
}

impl PgAttendanceStore {
    pub fn new(pool: PgPool) -> Self {
        PgAttendanceStore { pool }
    }
}

#[async_trait]
impl AttendanceStore for PgAttendanceStore {
    async fn query_attendance(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<Vec<RawAttendanceRecord>, StoreError> {
        let mut query = String::from(
            "SELECT r.id::text AS id, r.student_id::text AS student_id, \
             st.full_name, st.class_name, st.section, \
             r.status, r.remarks, r.marked_on \
             FROM attendance_insights.records r \
             JOIN attendance_insights.students st ON st.id = r.student_id",
        );

        let mut predicates = Vec::new();
        let mut arg = 0usize;
        if filter.student_id.is_some() {
            arg += 1;
            predicates.push(format!("r.student_id::text = ${arg}"));
        }
        if filter.class_name.is_some() {
            arg += 1;
            predicates.push(format!("st.class_name = ${arg}"));
        }
        if filter.section.is_some() {
            arg += 1;
            predicates.push(format!("st.section = ${arg}"));
        }
        if filter.date_from.is_some() {
            arg += 1;
            predicates.push(format!("r.marked_on >= ${arg}"));
        }
        if !predicates.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&predicates.join(" AND "));
        }

        let mut rows = sqlx::query(&query);
        if let Some(value) = &filter.student_id {
            rows = rows.bind(value);
        }
        if let Some(value) = &filter.class_name {
            rows = rows.bind(value);
        }
        if let Some(value) = &filter.section {
            rows = rows.bind(value);
        }
        if let Some(value) = filter.date_from {
            rows = rows.bind(value);
        }

        let fetched = rows.fetch_all(&self.pool).await?;
        let mut records = Vec::with_capacity(fetched.len());

        for row in fetched {
            let marked_on: NaiveDate = row.get("marked_on");
            records.push(RawAttendanceRecord {
                id: row.get("id"),
                student_id: row.get("student_id"),
                student_name: row.get("full_name"),
                class_name: row.get("class_name"),
                section: row.get("section"),
                date: marked_on.to_string(),
                status: row.get("status"),
                remarks: row.get("remarks"),
            });
        }

        Ok(records)
    }
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let students = vec![
        (
            Uuid::parse_str("6f1f2a9c-8d34-4f4e-9b7a-2c1e55d0a4b1")?,
            "STU-2026-001",
            "Avery Lee",
            "8",
            "B",
        ),
        (
            Uuid::parse_str("b20c8a41-53f6-4d0a-8f4e-7e9a1c6d2b37")?,
            "STU-2026-002",
            "Jules Moreno",
            "8",
            "B",
        ),
        (
            Uuid::parse_str("e8d3b7f2-1a45-4c8b-b2d9-90f6c4a3e512")?,
            "STU-2026-003",
            "Kiara Patel",
            "9",
            "A",
        ),
    ];

    for (id, student_no, name, class_name, section) in students {
        sqlx::query(
            r#"
            INSERT INTO attendance_insights.students (id, student_no, full_name, class_name, section)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (student_no) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                class_name = EXCLUDED.class_name,
                section = EXCLUDED.section
            "#,
        )
        .bind(id)
        .bind(student_no)
        .bind(name)
        .bind(class_name)
        .bind(section)
        .execute(pool)
        .await?;
    }

    let marks = vec![
        ("seed-001", "STU-2026-001", "present", None, 2),
        ("seed-002", "STU-2026-001", "present", None, 3),
        ("seed-003", "STU-2026-001", "late", Some("Bus delay"), 4),
        ("seed-004", "STU-2026-001", "absent", None, 5),
        ("seed-005", "STU-2026-002", "present", None, 2),
        ("seed-006", "STU-2026-002", "absent", Some("No notice"), 3),
        ("seed-007", "STU-2026-002", "absent", None, 4),
        ("seed-008", "STU-2026-002", "excused", Some("Medical leave"), 5),
        ("seed-009", "STU-2026-003", "present", None, 2),
        ("seed-010", "STU-2026-003", "present", None, 3),
        ("seed-011", "STU-2026-003", "present", None, 4),
        ("seed-012", "STU-2026-003", "late", None, 5),
    ];

    for (source_key, student_no, status, remarks, day) in marks {
        let marked_on = NaiveDate::from_ymd_opt(2026, 3, day).context("invalid date")?;
        let student_id: Uuid = sqlx::query(
            "SELECT id FROM attendance_insights.students WHERE student_no = $1",
        )
        .bind(student_no)
        .fetch_one(pool)
        .await?
        .get("id");

        sqlx::query(
            r#"
            INSERT INTO attendance_insights.records
            (id, student_id, status, remarks, marked_on, source_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(status)
        .bind(remarks)
        .bind(marked_on)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        student_no: String,
        full_name: String,
        class_name: String,
        section: String,
        status: String,
        marked_on: NaiveDate,
        remarks: Option<String>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let status: crate::models::AttendanceStatus = row
            .status
            .parse()
            .with_context(|| format!("row for {}: bad status", row.student_no))?;

        let student_id: Uuid = sqlx::query(
            r#"
            INSERT INTO attendance_insights.students
            (id, student_no, full_name, class_name, section)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (student_no) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                class_name = EXCLUDED.class_name,
                section = EXCLUDED.section
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.student_no)
        .bind(&row.full_name)
        .bind(&row.class_name)
        .bind(&row.section)
        .fetch_one(pool)
        .await?
        .get("id");

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO attendance_insights.records
            (id, student_id, status, remarks, marked_on, source_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(status.as_str())
        .bind(&row.remarks)
        .bind(row.marked_on)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
