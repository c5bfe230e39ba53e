//! Fixed demo components for exercising the front end without a model call,
//! and a renderer that writes components back out in the reply wire format.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::models::{
    Card, ChartComponent, ChartKind, Component, Scalar, SampleDataResponse, SampleKind,
    TableComponent,
};

pub const SAMPLE_TEXT: &str = "Sample components generated for testing:";

pub fn sample_components(kind: SampleKind) -> Vec<Component> {
    let wants = |wanted: SampleKind| kind == SampleKind::All || kind == wanted;
    let mut components = Vec::new();

    if wants(SampleKind::Table) {
        let text = |s: &str| Scalar::Text(s.to_string());
        components.push(Component::Table(TableComponent {
            headers: vec!["Name".into(), "Value".into(), "Status".into()],
            rows: vec![
                vec![text("Total Users"), text("1,234"), text("Active")],
                vec![text("New Signups"), text("56"), text("Growing")],
                vec![text("Revenue"), text("$12,345"), text("Up 15%")],
                vec![text("Support Tickets"), text("23"), text("Resolved")],
            ],
        }));
    }

    if wants(SampleKind::Chart) {
        components.push(Component::Chart(ChartComponent {
            kind: ChartKind::Pie,
            title: "Sample Chart".to_string(),
            labels: ["Chrome", "Firefox", "Safari", "Edge"]
                .into_iter()
                .map(String::from)
                .collect(),
            values: vec![65.0, 20.0, 10.0, 5.0],
            extra: BTreeMap::new(),
        }));
    }

    if wants(SampleKind::Cards) {
        let card = |title: &str, value: &str, description: &str| Card {
            title: title.to_string(),
            value: value.to_string(),
            description: description.to_string(),
        };
        components.push(Component::Cards(vec![
            card("Total", "1,234", "Total count"),
            card("Average", "87.5", "Average score"),
            card("Growth", "+15%", "This month"),
        ]));
    }

    components
}

pub fn sample_response(kind: SampleKind) -> SampleDataResponse {
    SampleDataResponse {
        text: SAMPLE_TEXT.to_string(),
        components: sample_components(kind),
    }
}

/// Renders prose followed by each component's marker block.
pub fn render_response(prose: &str, components: &[Component]) -> String {
    let mut out = prose.trim_end().to_string();
    for component in components {
        out.push_str("\n\n");
        out.push_str(&render_wire(component));
    }
    out
}

pub fn render_wire(component: &Component) -> String {
    let mut out = String::new();
    match component {
        Component::Table(table) => {
            let headers: Vec<String> = table.headers.iter().map(|h| quote(h)).collect();
            let rows: Vec<String> = table
                .rows
                .iter()
                .map(|row| format!("[{}]", row.iter().map(scalar).collect::<Vec<_>>().join(", ")))
                .collect();
            let _ = writeln!(out, "TABLE_DATA:");
            let _ = writeln!(out, "headers: [{}]", headers.join(", "));
            let _ = write!(out, "rows: [{}]", rows.join(", "));
        }
        Component::Chart(chart) => {
            let labels: Vec<String> = chart.labels.iter().map(|l| quote(l)).collect();
            let values: Vec<String> = chart.values.iter().map(|v| number(*v)).collect();
            let _ = writeln!(out, "CHART_DATA:");
            let _ = writeln!(out, "type: {}", chart.kind.as_str());
            let _ = writeln!(out, "title: {}", quote(&chart.title));
            for (key, value) in &chart.extra {
                let _ = writeln!(out, "{key}: {value}");
            }
            let _ = writeln!(out, "labels: [{}]", labels.join(", "));
            let _ = write!(out, "values: [{}]", values.join(", "));
        }
        Component::Cards(cards) => {
            let json = serde_json::to_string(cards).unwrap_or_else(|_| "[]".to_string());
            let _ = writeln!(out, "CARDS_DATA:");
            let _ = write!(out, "{json}");
        }
    }
    out
}

fn scalar(value: &Scalar) -> String {
    match value {
        Scalar::Int(n) => n.to_string(),
        Scalar::Float(f) => format!("{f:?}"),
        Scalar::Text(text) => quote(text),
    }
}

fn number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value:?}")
    }
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
