use std::collections::BTreeMap;

use tracing::debug;

use super::literal::{parse_literal, Literal};
use super::tokens::{split_tokens, trim_quotes};
use crate::models::{ChartComponent, ChartKind, Scalar};

/// Parses the flat `key: value` lines after `CHART_DATA:`.
///
/// `labels` and `values` must both be present with equal lengths, and every
/// value must be numeric; otherwise no chart is produced at all.
pub fn extract_chart(section: &str) -> Option<ChartComponent> {
    let mut kind: Option<String> = None;
    let mut title: Option<String> = None;
    let mut labels: Option<Vec<Scalar>> = None;
    let mut values: Option<Vec<Scalar>> = None;
    let mut extra = BTreeMap::new();

    for line in section.lines() {
        let Some((key, value)) = line.trim().split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        match key {
            "labels" => {
                if let Some(items) = parse_array(key, value) {
                    labels = Some(items);
                }
            }
            "values" => {
                if let Some(items) = parse_array(key, value) {
                    values = Some(items);
                }
            }
            "type" => kind = Some(plain_value(value)),
            "title" => title = Some(plain_value(value)),
            _ => {
                extra.insert(key.to_string(), value.to_string());
            }
        }
    }

    let (Some(labels), Some(values)) = (labels, values) else {
        debug!("chart block is missing labels or values");
        return None;
    };

    if labels.len() != values.len() {
        debug!(
            labels = labels.len(),
            values = values.len(),
            "chart labels and values differ in length"
        );
        return None;
    }

    if labels.is_empty() {
        return None;
    }

    let Some(values) = values
        .iter()
        .map(Scalar::as_number)
        .collect::<Option<Vec<f64>>>()
    else {
        debug!("chart values contain a non-numeric entry");
        return None;
    };

    let kind = match kind.as_deref() {
        Some(label) => ChartKind::from_label(label).unwrap_or_else(|| {
            debug!(label, "unknown chart type, using bar");
            ChartKind::Bar
        }),
        None => ChartKind::Bar,
    };

    Some(ChartComponent {
        kind,
        title: title.unwrap_or_default(),
        labels: labels.iter().map(Scalar::to_string).collect(),
        values,
        extra,
    })
}

/// A quoted string literal is decoded with its escapes; anything else keeps
/// its text minus stray quotes.
fn plain_value(value: &str) -> String {
    match parse_literal(value) {
        Some(Literal::Str(text)) => text,
        _ => trim_quotes(value).to_string(),
    }
}

fn parse_array(key: &str, value: &str) -> Option<Vec<Scalar>> {
    if let Some(items) = parse_literal(value).and_then(|literal| literal.into_scalars()) {
        return Some(items);
    }

    if value.starts_with('[') && value.ends_with(']') {
        debug!(key, "chart array is not a literal, splitting tokens manually");
        return Some(split_tokens(value));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_documented_block() {
        let chart = extract_chart(
            "\ntype: pie\ntitle: \"Attendance by Status\"\nlabels: [Present, Absent]\nvalues: [85, 15]\n",
        )
        .expect("chart");

        assert_eq!(chart.kind, ChartKind::Pie);
        assert_eq!(chart.title, "Attendance by Status");
        assert_eq!(chart.labels, vec!["Present", "Absent"]);
        assert_eq!(chart.values, vec![85.0, 15.0]);
        assert!(chart.extra.is_empty());
    }

    #[test]
    fn length_mismatch_yields_nothing() {
        let section = "type: bar\ntitle: Hours\nlabels: [\"Ali\", \"Sara\", \"Omar\"]\nvalues: [8, 7.5]";
        assert_eq!(extract_chart(section), None);
    }

    #[test]
    fn missing_values_yields_nothing() {
        assert_eq!(extract_chart("type: line\nlabels: [Jan, Feb]"), None);
    }

    #[test]
    fn non_numeric_values_yield_nothing() {
        assert_eq!(
            extract_chart("labels: [A, B]\nvalues: [10, lots]"),
            None
        );
    }

    #[test]
    fn quoted_numbers_are_coerced() {
        let chart =
            extract_chart("labels: ['Q1', 'Q2']\nvalues: [\"12\", \"7.5\"]").expect("chart");
        assert_eq!(chart.values, vec![12.0, 7.5]);
        assert_eq!(chart.kind, ChartKind::Bar);
        assert_eq!(chart.title, "");
    }

    #[test]
    fn unknown_keys_and_types_are_tolerated() {
        let chart = extract_chart(
            "type: doughnut\ntitle: Hours: weekly\nunit: hours\nlabels: [Sun, Mon]\nvalues: [8, 9]",
        )
        .expect("chart");
        assert_eq!(chart.kind, ChartKind::Bar);
        assert_eq!(chart.title, "Hours: weekly");
        assert_eq!(chart.extra.get("unit").map(String::as_str), Some("hours"));
    }

    #[test]
    fn quoted_titles_keep_inner_quotes() {
        let chart = extract_chart(
            "type: 'line'\ntitle: \"\\\"Q1\\\" vs \\\"Q2\\\"\"\nlabels: [Q1, Q2]\nvalues: [3, 4]",
        )
        .expect("chart");
        assert_eq!(chart.kind, ChartKind::Line);
        assert_eq!(chart.title, "\"Q1\" vs \"Q2\"");

        let chart = extract_chart("title: 'Late arrivals'\nlabels: [A]\nvalues: [1]").expect("chart");
        assert_eq!(chart.title, "Late arrivals");
    }

    #[test]
    fn numeric_labels_render_as_text() {
        let chart = extract_chart("labels: [2023, 2024]\nvalues: [1.5, 2]").expect("chart");
        assert_eq!(chart.labels, vec!["2023", "2024"]);
        assert_eq!(chart.values, vec![1.5, 2.0]);
    }
}
