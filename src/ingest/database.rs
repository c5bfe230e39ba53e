use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::info;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TableReport {
    pub name: String,
    pub columns: Vec<String>,
    pub total_rows: i64,
    pub included_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseExtraction {
    pub file_path: String,
    pub tables: Vec<TableReport>,
    pub total_characters: usize,
}

/// Renders every user table of a SQLite file as a text section:
///
/// ```text
/// === TABLE employees (10 rows) ===
/// id | name | department
/// 1 | Ahmed Ali Hassan | Information Technology
/// ```
///
/// At most `row_limit` rows are included per table. The file is opened
/// read-only.
pub async fn summarize_database(path: &Path, row_limit: i64) -> Result<(String, DatabaseExtraction)> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        anyhow::bail!("database file not found: {}", path.display());
    }

    let options = SqliteConnectOptions::new().filename(path).read_only(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open database {}", path.display()))?;

    let result = summarize_pool(&pool, row_limit).await;
    pool.close().await;

    let (text, tables) = result?;
    let extraction = DatabaseExtraction {
        file_path: path.display().to_string(),
        total_characters: text.chars().count(),
        tables,
    };

    info!(
        path = %path.display(),
        tables = extraction.tables.len(),
        characters = extraction.total_characters,
        "summarized database"
    );

    Ok((text, extraction))
}

async fn summarize_pool(pool: &SqlitePool, row_limit: i64) -> Result<(String, Vec<TableReport>)> {
    let table_names: Vec<String> = sqlx::query(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(pool)
    .await
    .context("failed to list database tables")?
    .into_iter()
    .map(|row| row.get::<String, _>("name"))
    .collect();

    let mut text = String::new();
    let mut reports = Vec::with_capacity(table_names.len());

    for name in table_names {
        let table = quote_ident(&name);

        let columns: Vec<String> = sqlx::query(&format!("PRAGMA table_info({table})"))
            .fetch_all(pool)
            .await
            .with_context(|| format!("failed to read columns of {name}"))?
            .into_iter()
            .map(|row| row.get::<String, _>("name"))
            .collect();
        if columns.is_empty() {
            continue;
        }

        let total_rows: i64 = sqlx::query(&format!("SELECT COUNT(*) AS n FROM {table}"))
            .fetch_one(pool)
            .await
            .with_context(|| format!("failed to count rows of {name}"))?
            .get("n");

        let select_list = columns
            .iter()
            .map(|column| format!("CAST({} AS TEXT)", quote_ident(column)))
            .collect::<Vec<_>>()
            .join(", ");
        let rows = sqlx::query(&format!("SELECT {select_list} FROM {table} LIMIT ?"))
            .bind(row_limit.max(0))
            .fetch_all(pool)
            .await
            .with_context(|| format!("failed to read rows of {name}"))?;

        text.push_str(&format!("\n=== TABLE {name} ({total_rows} rows) ===\n"));
        text.push_str(&columns.join(" | "));
        text.push('\n');
        for row in &rows {
            let cells: Vec<String> = (0..columns.len())
                .map(|index| {
                    row.try_get::<Option<String>, _>(index)
                        .ok()
                        .flatten()
                        .unwrap_or_default()
                })
                .collect();
            text.push_str(&cells.join(" | "));
            text.push('\n');
        }

        reports.push(TableReport {
            name,
            columns,
            total_rows,
            included_rows: rows.len(),
        });
    }

    Ok((text, reports))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn fixture(path: &Path) {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("create fixture db");

        sqlx::query(
            r#"
            CREATE TABLE employees (id INTEGER PRIMARY KEY, name TEXT NOT NULL, hours REAL);
            INSERT INTO employees (name, hours) VALUES ('Ali', 8.5), ('Sara', NULL), ('Omar', 7);
            CREATE TABLE "odd ""name""" (value TEXT);
            "#,
        )
        .execute(&pool)
        .await
        .expect("seed fixture");

        pool.close().await;
    }

    #[tokio::test]
    async fn renders_tables_as_pipe_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("attendance.db");
        fixture(&path).await;

        let (text, extraction) = summarize_database(&path, 2).await.expect("summarize");

        assert!(text.contains("=== TABLE employees (3 rows) ===\nid | name | hours\n"));
        assert!(text.contains("1 | Ali | 8.5\n2 | Sara | \n"));
        assert!(!text.contains("Omar"));
        assert!(text.contains("=== TABLE odd \"name\" (0 rows) ==="));

        let employees = extraction
            .tables
            .iter()
            .find(|table| table.name == "employees")
            .expect("employees report");
        assert_eq!(employees.total_rows, 3);
        assert_eq!(employees.included_rows, 2);
        assert_eq!(extraction.total_characters, text.chars().count());
    }

    #[tokio::test]
    async fn missing_database_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = summarize_database(&dir.path().join("nope.db"), 10)
            .await
            .expect_err("missing file");
        assert!(err.to_string().contains("database file not found"));
    }
}
