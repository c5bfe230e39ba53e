use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, info};

use crate::models::PdfInfo;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PageReport {
    pub page: usize,
    pub length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PdfExtraction {
    pub file_path: String,
    pub total_pages: usize,
    pub pages: Vec<PageReport>,
    pub total_characters: usize,
    pub method: &'static str,
}

/// Extracts the document text page by page. Each page with text is written
/// as `\n=== PAGE n ===\n{text}\n`; pages without text only show up in the
/// report.
pub async fn extract_pdf_text(pdf_path: &Path) -> Result<(String, PdfExtraction)> {
    if !tokio::fs::try_exists(pdf_path).await.unwrap_or(false) {
        anyhow::bail!("PDF file not found: {}", pdf_path.display());
    }

    let mut method = "pdftotext";
    let mut pages = Vec::new();

    if has_command("pdftotext").await {
        let page_count = get_pdf_page_count(pdf_path).await.unwrap_or(0);
        for page in 1..=page_count {
            let output = Command::new("pdftotext")
                .arg("-f")
                .arg(page.to_string())
                .arg("-l")
                .arg(page.to_string())
                .arg("-layout")
                .arg("-nopgbrk")
                .arg(pdf_path)
                .arg("-")
                .output()
                .await
                .with_context(|| format!("failed to run pdftotext for page {page}"))?;

            if !output.status.success() {
                debug!(page, "pdftotext failed for page");
                pages.push(String::new());
                continue;
            }

            pages.push(normalize_text(&String::from_utf8_lossy(&output.stdout)));
        }
    }

    if pages.iter().all(|page| page.trim().is_empty()) {
        method = "pdf_extract";
        let owned_path = pdf_path.to_path_buf();
        let extracted = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&owned_path))
            .await
            .context("PDF extraction task panicked")?
            .context("failed to extract text from PDF")?;

        // pdf_extract separates pages with form feeds.
        pages = extracted.split('\u{000C}').map(normalize_text).collect();
        while pages.len() > 1 && pages.last().is_some_and(|page| page.trim().is_empty()) {
            pages.pop();
        }
    }

    let (full_text, reports) = assemble_pages(&pages);
    let extraction = PdfExtraction {
        file_path: pdf_path.display().to_string(),
        total_pages: pages.len(),
        total_characters: full_text.chars().count(),
        pages: reports,
        method,
    };

    info!(
        path = %pdf_path.display(),
        pages = extraction.total_pages,
        characters = extraction.total_characters,
        method,
        "extracted PDF text"
    );

    Ok((full_text, extraction))
}

pub async fn pdf_info(pdf_path: &Path) -> PdfInfo {
    match tokio::fs::metadata(pdf_path).await {
        Ok(metadata) if metadata.is_file() => {
            let megabytes = metadata.len() as f64 / (1024.0 * 1024.0);
            PdfInfo {
                file_exists: true,
                file_size_mb: Some((megabytes * 100.0).round() / 100.0),
                error: None,
            }
        }
        _ => PdfInfo {
            file_exists: false,
            file_size_mb: None,
            error: Some("PDF file not found".to_string()),
        },
    }
}

fn assemble_pages(pages: &[String]) -> (String, Vec<PageReport>) {
    let mut full_text = String::new();
    let mut reports = Vec::with_capacity(pages.len());

    for (index, text) in pages.iter().enumerate() {
        let page = index + 1;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            reports.push(PageReport {
                page,
                length: 0,
                status: Some("No text found".to_string()),
            });
            continue;
        }

        full_text.push_str(&format!("\n=== PAGE {page} ===\n{text}\n"));
        reports.push(PageReport {
            page,
            length: trimmed.chars().count(),
            status: None,
        });
    }

    (full_text, reports)
}

async fn get_pdf_page_count(pdf_path: &Path) -> Result<usize> {
    let output = Command::new("pdfinfo")
        .arg(pdf_path)
        .output()
        .await
        .context("failed to run pdfinfo")?;

    if !output.status.success() {
        return Err(anyhow::anyhow!("pdfinfo exited with non-zero status"));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let regex = Regex::new(r"(?m)^Pages:\s+(\d+)\s*$")?;
    let pages = regex
        .captures(&stdout)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<usize>().ok())
        .ok_or_else(|| anyhow::anyhow!("unable to parse page count from pdfinfo"))?;

    Ok(pages)
}

async fn has_command(binary: &str) -> bool {
    Command::new("which")
        .arg(binary)
        .output()
        .await
        .map(|out| out.status.success() && !out.stdout.is_empty())
        .unwrap_or(false)
}

/// Line breaks are kept since report tables are laid out by line.
fn normalize_text(input: &str) -> String {
    input
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace('\u{00A0}', " ")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_are_framed_and_reported() {
        let pages = vec![
            "Monthly Attendance Report".to_string(),
            "   ".to_string(),
            "Ali  IT  19".to_string(),
        ];

        let (text, reports) = assemble_pages(&pages);

        assert_eq!(
            text,
            "\n=== PAGE 1 ===\nMonthly Attendance Report\n\n=== PAGE 3 ===\nAli  IT  19\n"
        );
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[1].status.as_deref(), Some("No text found"));
        assert_eq!(reports[2].length, 11);
    }

    #[test]
    fn normalize_keeps_layout_lines() {
        assert_eq!(
            normalize_text("\n\u{201C}Name\u{201D}   Hours  \nAli\u{00A0}8\n\n"),
            "\"Name\"   Hours\nAli 8"
        );
    }

    #[tokio::test]
    async fn info_for_missing_file() {
        let info = pdf_info(Path::new("/definitely/not/here.pdf")).await;
        assert!(!info.file_exists);
        assert_eq!(info.error.as_deref(), Some("PDF file not found"));
    }

    #[tokio::test]
    async fn info_rounds_size_to_two_decimals() {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        std::fs::write(file.path(), vec![0u8; 1024 * 1024 + 10_000]).expect("write");

        let info = pdf_info(file.path()).await;
        assert!(info.file_exists);
        assert_eq!(info.file_size_mb, Some(1.01));
    }

    #[tokio::test]
    async fn missing_pdf_is_an_error() {
        let err = extract_pdf_text(Path::new("/definitely/not/here.pdf"))
            .await
            .expect_err("missing file");
        assert!(err.to_string().contains("PDF file not found"));
    }
}
