//! Pattern-based recovery for `headers:` / `rows:` blocks that the line scan
//! could not parse, e.g. arrays split across lines in unusual ways.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::literal::parse_literal;
use super::tokens::{split_rows, trim_quotes};
use crate::models::Scalar;

pub fn headers_from_pattern(section: &str) -> Option<Vec<String>> {
    let captures = headers_pattern()?.captures(section)?;
    let inner = captures.get(1)?.as_str();
    if inner.trim().is_empty() {
        return None;
    }

    Some(
        inner
            .split(',')
            .map(|header| trim_quotes(header.trim()).to_string())
            .collect(),
    )
}

/// Re-wraps the `rows:` capture in brackets and parses it as a literal,
/// falling back to the comma splitter row by row.
pub fn rows_from_pattern(section: &str) -> Option<Vec<Vec<Scalar>>> {
    let captures = rows_pattern()?.captures(section)?;
    let content = format!("[{}]", captures.get(1)?.as_str());

    if let Some(rows) = parse_literal(&content).and_then(|literal| literal.into_rows()) {
        return Some(rows);
    }

    debug!("rows capture is not a literal, splitting tokens manually");
    let rows = split_rows(&content);
    (!rows.is_empty()).then_some(rows)
}

fn headers_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?s)headers:\s*\[(.*?)\]").ok())
        .as_ref()
}

fn rows_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?sm)rows:\s*\[(.*?)\](?:\s*$|\s*\n|$)").ok())
        .as_ref()
}
