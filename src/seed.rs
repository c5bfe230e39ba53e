//! Builds the sample attendance database used by the database document
//! source.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use rand::Rng;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

pub const DAYS: i64 = 30;
pub const PRESENCE_RATE: f64 = 0.85;

const DEPARTMENTS: &[(&str, &str, &str)] = &[
    ("Information Technology", "Ahmed Al-Rashid", "Building A - Floor 3"),
    ("Human Resources", "Fatima Al-Zahra", "Building B - Floor 1"),
    ("Finance", "Mohammed Al-Mansouri", "Building A - Floor 2"),
    ("Marketing", "Sarah Al-Khalil", "Building C - Floor 1"),
    ("Operations", "Omar Al-Thani", "Building A - Floor 1"),
];

const EMPLOYEES: &[(&str, &str, &str, &str, &str)] = &[
    ("Ahmed Ali Hassan", "Information Technology", "Software Developer", "2023-01-15", "ahmed.hassan@korev.com"),
    ("Fatima Mohammed Al-Zahra", "Human Resources", "HR Manager", "2022-03-10", "fatima.zahra@korev.com"),
    ("Mohammed Omar Al-Rashid", "Finance", "Financial Analyst", "2023-02-20", "mohammed.rashid@korev.com"),
    ("Sarah Abdullah Al-Khalil", "Marketing", "Marketing Specialist", "2022-11-05", "sarah.khalil@korev.com"),
    ("Omar Hassan Al-Thani", "Operations", "Operations Manager", "2022-01-12", "omar.thani@korev.com"),
    ("Aisha Ahmed Al-Mansouri", "Information Technology", "System Administrator", "2023-03-08", "aisha.mansouri@korev.com"),
    ("Khalid Mohammed Al-Sabah", "Finance", "Accountant", "2022-09-15", "khalid.sabah@korev.com"),
    ("Nour Ali Al-Hashimi", "Marketing", "Content Creator", "2023-04-12", "nour.hashimi@korev.com"),
    ("Hassan Omar Al-Maktoum", "Operations", "Logistics Coordinator", "2022-07-20", "hassan.maktoum@korev.com"),
    ("Layla Ahmed Al-Qasimi", "Human Resources", "HR Assistant", "2023-05-01", "layla.qasimi@korev.com"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceRecord {
    pub employee_id: i64,
    pub date: NaiveDate,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub hours_worked: f64,
    pub status: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub departments: usize,
    pub employees: usize,
    pub attendance: usize,
}

/// Friday and Saturday are the weekend.
pub fn is_workday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Fri | Weekday::Sat)
}

/// One record per employee per workday in the `DAYS` days from `start`.
pub fn generate_attendance<R: Rng>(rng: &mut R, start: NaiveDate) -> Vec<AttendanceRecord> {
    let mut records = Vec::new();

    for offset in 0..DAYS {
        let date = start + Duration::days(offset);
        if !is_workday(date) {
            continue;
        }

        for employee_id in 1..=EMPLOYEES.len() as i64 {
            if rng.gen_bool(PRESENCE_RATE) {
                let hour = rng.gen_range(7..=9);
                let minute = rng.gen_range(0..=59);
                let hours_worked: f64 = rng.gen_range(7.0..=9.0);
                let check_in = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default();
                let check_out =
                    check_in + Duration::seconds((hours_worked * 3600.0).round() as i64);

                records.push(AttendanceRecord {
                    employee_id,
                    date,
                    check_in: Some(check_in.format("%H:%M").to_string()),
                    check_out: Some(check_out.format("%H:%M").to_string()),
                    hours_worked: (hours_worked * 100.0).round() / 100.0,
                    status: "Present",
                });
            } else {
                records.push(AttendanceRecord {
                    employee_id,
                    date,
                    check_in: None,
                    check_out: None,
                    hours_worked: 0.0,
                    status: "Absent",
                });
            }
        }
    }

    records
}

/// Replaces any file at `path` with a freshly seeded database.
pub async fn create_sample_database<R: Rng>(
    path: &Path,
    rng: &mut R,
    start: NaiveDate,
) -> Result<SeedSummary> {
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        tokio::fs::remove_file(path)
            .await
            .with_context(|| format!("failed to remove existing database {}", path.display()))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("failed to create database {}", path.display()))?;

    let attendance = generate_attendance(rng, start);
    let result = write_all(&pool, &attendance).await;
    pool.close().await;
    result?;

    let summary = SeedSummary {
        departments: DEPARTMENTS.len(),
        employees: EMPLOYEES.len(),
        attendance: attendance.len(),
    };
    info!(path = %path.display(), ?summary, "sample database created");
    Ok(summary)
}

async fn write_all(pool: &SqlitePool, attendance: &[AttendanceRecord]) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE employees (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            department TEXT NOT NULL,
            position TEXT NOT NULL,
            hire_date DATE NOT NULL,
            email TEXT UNIQUE NOT NULL
        );

        CREATE TABLE attendance (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            employee_id INTEGER NOT NULL,
            date DATE NOT NULL,
            check_in TIME,
            check_out TIME,
            hours_worked REAL DEFAULT 0,
            status TEXT NOT NULL,
            FOREIGN KEY (employee_id) REFERENCES employees (id)
        );

        CREATE TABLE departments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            manager TEXT,
            location TEXT
        );
        "#,
    )
    .execute(pool)
    .await
    .context("failed to create schema")?;

    let mut tx = pool.begin().await?;

    for (name, manager, location) in DEPARTMENTS {
        sqlx::query("INSERT INTO departments (name, manager, location) VALUES (?, ?, ?)")
            .bind(*name)
            .bind(*manager)
            .bind(*location)
            .execute(&mut *tx)
            .await?;
    }

    for (name, department, position, hire_date, email) in EMPLOYEES {
        sqlx::query(
            "INSERT INTO employees (name, department, position, hire_date, email) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(*name)
        .bind(*department)
        .bind(*position)
        .bind(*hire_date)
        .bind(*email)
        .execute(&mut *tx)
        .await?;
    }

    for record in attendance {
        sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, date, check_in, check_out, hours_worked, status)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.employee_id)
        .bind(record.date.format("%Y-%m-%d").to_string())
        .bind(record.check_in.as_deref())
        .bind(record.check_out.as_deref())
        .bind(record.hours_worked)
        .bind(record.status)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::ingest::database::summarize_database;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).expect("date")
    }

    #[test]
    fn weekends_are_skipped_and_fields_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let records = generate_attendance(&mut rng, start());

        let workdays = (0..DAYS)
            .filter(|offset| is_workday(start() + Duration::days(*offset)))
            .count();
        assert_eq!(records.len(), workdays * EMPLOYEES.len());
        assert!(records.iter().all(|r| is_workday(r.date)));

        for record in records.iter().filter(|r| r.status == "Present") {
            assert!((7.0..=9.0).contains(&record.hours_worked));
            let check_in = record.check_in.as_deref().expect("check in");
            let hour: u32 = check_in[..2].parse().expect("hour");
            assert!((7..=9).contains(&hour));
        }
        for record in records.iter().filter(|r| r.status == "Absent") {
            assert_eq!(record.hours_worked, 0.0);
            assert!(record.check_in.is_none());
        }
    }

    #[test]
    fn same_seed_same_data() {
        let a = generate_attendance(&mut StdRng::seed_from_u64(42), start());
        let b = generate_attendance(&mut StdRng::seed_from_u64(42), start());
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn seeded_database_can_be_summarized() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("attendance.db");
        let mut rng = StdRng::seed_from_u64(1);

        let summary = create_sample_database(&path, &mut rng, start())
            .await
            .expect("seed");
        assert_eq!(summary.employees, 10);
        assert_eq!(summary.departments, 5);

        // Seeding twice replaces the file instead of failing on existing tables.
        create_sample_database(&path, &mut rng, start())
            .await
            .expect("reseed");

        let (text, extraction) = summarize_database(&path, 500).await.expect("summarize");
        assert_eq!(extraction.tables.len(), 3);
        assert!(text.contains("=== TABLE employees (10 rows) ==="));
        assert!(text.contains("Layla Ahmed Al-Qasimi"));
        assert!(text.contains("Building A - Floor 3"));
    }
}
