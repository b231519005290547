use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use attendance_insights::analytics::AttendanceAnalytics;
use attendance_insights::normalize;
use attendance_insights::report;
use attendance_insights::store::{self, AttendanceFilter, AttendanceStore, PgAttendanceStore};
use attendance_insights::trend;

#[derive(Parser)]
#[command(name = "attendance-insights")]
#[command(about = "Attendance analytics and risk early warning for the school portal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import attendance records from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Show the attendance trend for a student or a class section
    #[command(group(
        ArgGroup::new("scope")
            .args(["student", "class"])
            .required(true)
            .multiple(false)
    ))]
    Trend {
        #[arg(long)]
        student: Option<String>,
        #[arg(long, requires = "section")]
        class: Option<String>,
        #[arg(long, requires = "class")]
        section: Option<String>,
        #[arg(long, default_value_t = 30)]
        days: i64,
        #[arg(long)]
        json: bool,
    },
    /// Predict attendance risk for a student
    Predict {
        #[arg(long)]
        student: String,
        #[arg(long)]
        json: bool,
    },
    /// Show per-class attendance summaries
    Summary {
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, default_value_t = 30)]
        days: i64,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "attendance_insights=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to the attendance Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            store::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            store::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = store::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} records from {}.", csv.display());
        }
        Commands::Trend {
            student,
            class,
            section,
            days,
            json,
        } => {
            let analytics = AttendanceAnalytics::new(PgAttendanceStore::new(pool));
            let points = match (&student, &class, &section) {
                (Some(student), _, _) => analytics.student_attendance_trends(student, days).await,
                (None, Some(class), Some(section)) => {
                    analytics.class_attendance_trends(class, section, days).await
                }
                _ => anyhow::bail!("--class requires --section"),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&points)?);
            } else if points.is_empty() {
                println!("No attendance recorded in this window.");
            } else {
                for point in points.iter() {
                    println!("- {}: {}%", point.date, point.percentage);
                }
            }
        }
        Commands::Predict { student, json } => {
            let analytics = AttendanceAnalytics::new(PgAttendanceStore::new(pool));
            let prediction = analytics.predict_attendance_risk(&student).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&prediction)?);
            } else {
                println!(
                    "{}: {} risk, predicted attendance {}% ({})",
                    prediction.student_id,
                    prediction.risk_level,
                    prediction.predicted_attendance,
                    prediction.explanation
                );
            }
        }
        Commands::Summary { json } => {
            let analytics = AttendanceAnalytics::new(PgAttendanceStore::new(pool));
            let mut summaries = analytics.class_attendance_summaries().await;
            summaries.sort_by(|a, b| (&a.class_name, &a.section).cmp(&(&b.class_name, &b.section)));

            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else if summaries.is_empty() {
                println!("No attendance recorded yet.");
            } else {
                for summary in summaries.iter() {
                    println!(
                        "- Class {} {}: {}/{} attended ({}%)",
                        summary.class_name,
                        summary.section,
                        summary.present,
                        summary.total,
                        summary.percentage
                    );
                }
            }
        }
        Commands::Report { days, out } => {
            let cutoff = trend::cutoff_date(days);
            let pg_store = PgAttendanceStore::new(pool);
            let raw = pg_store
                .query_attendance(&AttendanceFilter::default().since(cutoff))
                .await?;
            let (records, skipped) = normalize::normalize_records(&raw);
            if skipped > 0 {
                tracing::warn!("report: dropped {skipped} malformed attendance records");
            }

            let report = report::build_report(&records, days, cutoff);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
