pub mod database;
pub mod pdf;

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::config::AppConfig;
use crate::context::DocumentContext;
use crate::models::DocumentSource;

use self::database::{summarize_database, DatabaseExtraction};
use self::pdf::{extract_pdf_text, PdfExtraction};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ExtractionReport {
    Pdf(PdfExtraction),
    Database(DatabaseExtraction),
}

impl ExtractionReport {
    pub fn total_characters(&self) -> usize {
        match self {
            ExtractionReport::Pdf(report) => report.total_characters,
            ExtractionReport::Database(report) => report.total_characters,
        }
    }
}

/// Loads the configured document source into a fresh snapshot.
pub async fn load_document(config: &AppConfig) -> Result<(DocumentContext, ExtractionReport)> {
    match config.document.source {
        DocumentSource::Pdf => load_pdf(&config.document.pdf_path).await,
        DocumentSource::Database => {
            load_database(&config.document.database_path, config.document.database_row_limit).await
        }
    }
}

pub async fn load_pdf(path: &Path) -> Result<(DocumentContext, ExtractionReport)> {
    let (text, report) = extract_pdf_text(path).await?;
    let context = DocumentContext::new(DocumentSource::Pdf, path.display().to_string(), text);
    Ok((context, ExtractionReport::Pdf(report)))
}

pub async fn load_database(path: &Path, row_limit: i64) -> Result<(DocumentContext, ExtractionReport)> {
    let (text, report) = summarize_database(path, row_limit).await?;
    let context = DocumentContext::new(DocumentSource::Database, path.display().to_string(), text);
    Ok((context, ExtractionReport::Database(report)))
}
