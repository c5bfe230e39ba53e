use tracing::debug;

use super::fallback::{headers_from_pattern, rows_from_pattern};
use super::literal::parse_literal;
use super::tokens::{split_rows, trim_quotes};
use crate::models::{Scalar, TableComponent};

/// Parses the text after `TABLE_DATA:`.
///
/// Tries a line scan first, parsing the balanced `rows:` buffer as a literal
/// or else with the manual token splitter, then the regex capture of the
/// whole section. Rows
/// whose width differs from the headers are dropped; a table with no headers
/// or no surviving rows is rejected.
pub fn extract_table(section: &str) -> Option<TableComponent> {
    let section = section.trim();
    let (mut headers, mut rows) = scan_lines(section);

    if is_empty(&headers) || is_empty(&rows) {
        debug!("table line scan incomplete, trying pattern fallback");
        if let Some(found) = headers_from_pattern(section) {
            headers = Some(found);
        }
        if let Some(found) = rows_from_pattern(section) {
            rows = Some(found);
        }
    }

    build_table(headers?, rows?)
}

fn scan_lines(section: &str) -> (Option<Vec<String>>, Option<Vec<Vec<Scalar>>>) {
    let mut headers: Option<Vec<String>> = None;
    let mut row_buffer: Option<String> = None;

    for line in section.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if is_empty(&headers) {
            if let Some(rest) = line.strip_prefix("headers:") {
                headers = parse_headers(rest.trim());
                continue;
            }
        }

        if let Some(rest) = line.strip_prefix("rows:") {
            row_buffer = Some(rest.trim().to_string());
        } else if let Some(buffer) = row_buffer.as_mut() {
            buffer.push(' ');
            buffer.push_str(line);
        }

        let Some(buffer) = row_buffer.as_deref() else {
            continue;
        };
        if !brackets_balanced(buffer) {
            continue;
        }

        if let Some(rows) = parse_literal(buffer).and_then(|literal| literal.into_rows()) {
            return (headers, Some(rows));
        }

        let rows = split_rows(buffer);
        if !rows.is_empty() {
            debug!("rows buffer is not a literal, split tokens manually");
            return (headers, Some(rows));
        }
        debug!("balanced rows buffer yielded no rows, still collecting");
    }

    (headers, None)
}

fn parse_headers(value: &str) -> Option<Vec<String>> {
    if let Some(headers) = parse_literal(value).and_then(|literal| literal.into_scalars()) {
        return Some(headers.iter().map(Scalar::to_string).collect());
    }

    if value.contains('[') && value.contains(']') {
        let inner = value.trim_matches(|c| c == '[' || c == ']');
        return Some(
            inner
                .split(',')
                .map(|header| trim_quotes(header.trim()).to_string())
                .collect(),
        );
    }

    None
}

fn brackets_balanced(buffer: &str) -> bool {
    let open = buffer.matches('[').count();
    open > 0 && open == buffer.matches(']').count()
}

fn build_table(headers: Vec<String>, rows: Vec<Vec<Scalar>>) -> Option<TableComponent> {
    if headers.is_empty() || headers.iter().all(|header| header.is_empty()) {
        return None;
    }

    let width = headers.len();
    let total = rows.len();
    let rows: Vec<Vec<Scalar>> = rows.into_iter().filter(|row| row.len() == width).collect();
    if rows.len() < total {
        debug!(
            dropped = total - rows.len(),
            width, "dropped table rows whose width differs from the headers"
        );
    }

    if rows.is_empty() {
        return None;
    }

    Some(TableComponent { headers, rows })
}

fn is_empty<T>(value: &Option<Vec<T>>) -> bool {
    value.as_ref().map_or(true, Vec::is_empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Scalar {
        Scalar::Text(value.to_string())
    }

    #[test]
    fn bare_headers_and_literal_rows() {
        let table =
            extract_table("\nheaders: [Name, Hours]\nrows: [[\"Ali\", 8], [\"Sara\", 7.5]]")
                .expect("table");

        assert_eq!(table.headers, vec!["Name", "Hours"]);
        assert_eq!(
            table.rows,
            vec![
                vec![text("Ali"), Scalar::Int(8)],
                vec![text("Sara"), Scalar::Float(7.5)]
            ]
        );
    }

    #[test]
    fn rows_spanning_several_lines() {
        let section = r#"
headers: ["Employee", "Department", "Days Present"]
rows: [
  ["Ahmed Ali Hassan", "Information Technology", 19],
  ["Layla Ahmed Al-Qasimi", "Human Resources", 17]
]
"#;
        let table = extract_table(section).expect("table");
        assert_eq!(table.headers.len(), 3);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1][2], Scalar::Int(17));
    }

    #[test]
    fn bare_word_rows_fall_back_to_manual_split() {
        let table = extract_table("headers: [Name, Status]\nrows: [[Ali, Present], [Sara, Absent]]")
            .expect("table");
        assert_eq!(
            table.rows,
            vec![
                vec![text("Ali"), text("Present")],
                vec![text("Sara"), text("Absent")]
            ]
        );
    }

    #[test]
    fn bare_word_rows_spanning_lines_keep_the_last_row() {
        let table = extract_table("headers: [Name, Hours]\nrows: [\n  [Ali, 8],\n  [Sara, 7.5]\n]")
            .expect("table");
        assert_eq!(
            table.rows,
            vec![
                vec![text("Ali"), Scalar::Int(8)],
                vec![text("Sara"), Scalar::Float(7.5)]
            ]
        );

        let section = "headers: [Name, Department, Days]\nrows: [\n  [\"Ahmed Ali\", IT, 19],\n  [Layla, \"Human Resources\", 17],\n  [Omar, Operations, 20]\n]";
        let table = extract_table(section).expect("table");
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[1][1], text("Human Resources"));
        assert_eq!(table.rows[2], vec![text("Omar"), text("Operations"), Scalar::Int(20)]);
    }

    #[test]
    fn quoted_commas_survive_manual_split() {
        let table = extract_table(
            "headers: [Department, Location]\nrows: [[IT, \"Building A, Floor 3\"], [HR, Remote]]",
        )
        .expect("table");
        assert_eq!(table.rows[0][1], text("Building A, Floor 3"));
    }

    #[test]
    fn every_row_matches_header_width() {
        let table = extract_table(
            "headers: [\"A\", \"B\"]\nrows: [[1, 2], [3], [4, 5, 6], [7, 8]]",
        )
        .expect("table");
        assert!(table.rows.iter().all(|row| row.len() == table.headers.len()));
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn rejects_when_no_row_fits() {
        assert_eq!(
            extract_table("headers: [A, B, C]\nrows: [[1, 2], [3, 4]]"),
            None
        );
    }

    #[test]
    fn rejects_missing_headers_or_rows() {
        assert_eq!(extract_table("rows: [[1, 2]]"), None);
        assert_eq!(extract_table("headers: [A, B]"), None);
        assert_eq!(extract_table("no table here"), None);
    }

    #[test]
    fn numeric_headers_become_strings() {
        let table = extract_table("headers: [\"Month\", 2023, 2024]\nrows: [[\"Jan\", 1, 2]]")
            .expect("table");
        assert_eq!(table.headers, vec!["Month", "2023", "2024"]);
    }
}
