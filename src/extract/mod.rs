//! Turns a raw model reply into prose plus structured UI components.
//!
//! A reply may carry up to three typed blocks, each introduced by a marker:
//!
//! ```text
//! Some prose.
//! TABLE_DATA:
//! headers: [Name, Hours]
//! rows: [["Ali", 8]]
//! CHART_DATA:
//! type: pie
//! labels: [Present, Absent]
//! values: [85, 15]
//! CARDS_DATA:
//! [{"title": "Total", "value": "24", "description": "Employees"}]
//! ```
//!
//! Nothing in here returns an error. A block that cannot be parsed simply
//! contributes no component.

pub mod cards;
pub mod chart;
pub mod fallback;
pub mod literal;
pub mod table;
pub mod tokens;

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::models::{Component, Language};

pub use cards::extract_cards;
pub use chart::extract_chart;
pub use table::extract_table;
pub use tokens::split_tokens;

/// Prose shorter than this is replaced by a placeholder when components exist.
pub const MIN_PROSE_CHARS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Prose,
    Table,
    Chart,
    Cards,
}

impl SegmentKind {
    pub fn marker(self) -> Option<&'static str> {
        match self {
            SegmentKind::Prose => None,
            SegmentKind::Table => Some("TABLE_DATA:"),
            SegmentKind::Chart => Some("CHART_DATA:"),
            SegmentKind::Cards => Some("CARDS_DATA:"),
        }
    }

    fn from_marker_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "TABLE" => Some(SegmentKind::Table),
            "CHART" => Some(SegmentKind::Chart),
            "CARDS" => Some(SegmentKind::Cards),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub kind: SegmentKind,
    pub raw_text: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub prose: String,
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, Copy)]
struct Marker {
    kind: SegmentKind,
    start: usize,
    end: usize,
}

fn marker_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(TABLE|CHART|CARDS)_DATA:").ok())
        .as_ref()
}

fn find_markers(response: &str) -> Vec<Marker> {
    let Some(pattern) = marker_pattern() else {
        return Vec::new();
    };

    pattern
        .captures_iter(response)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            let kind = SegmentKind::from_marker_prefix(captures.get(1)?.as_str())?;
            Some(Marker {
                kind,
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Splits a reply at marker boundaries. The first segment is always prose
/// (possibly empty); each data segment runs from the end of its marker to the
/// start of the next one. Markers themselves belong to no segment.
pub fn segment(response: &str) -> Vec<Segment<'_>> {
    let markers = find_markers(response);
    let prose_end = markers.first().map_or(response.len(), |marker| marker.start);

    let mut segments = Vec::with_capacity(markers.len() + 1);
    segments.push(Segment {
        kind: SegmentKind::Prose,
        raw_text: &response[..prose_end],
    });

    for (index, marker) in markers.iter().enumerate() {
        let end = markers
            .get(index + 1)
            .map_or(response.len(), |next| next.start);
        segments.push(Segment {
            kind: marker.kind,
            raw_text: &response[marker.end..end],
        });
    }

    segments
}

/// Parses a reply into prose and components, in table, chart, cards order.
///
/// Prose is the reply verbatim when no marker is present. Otherwise it is the
/// trimmed text before the first table marker, or the first chart marker if
/// there is no table, or the first cards marker if there is neither.
pub fn parse_response(response: &str) -> ParsedResponse {
    let markers = find_markers(response);
    if markers.is_empty() {
        return ParsedResponse {
            prose: response.to_string(),
            components: Vec::new(),
        };
    }

    let prose_cut = [SegmentKind::Table, SegmentKind::Chart, SegmentKind::Cards]
        .into_iter()
        .find_map(|kind| {
            markers
                .iter()
                .find(|marker| marker.kind == kind)
                .map(|marker| marker.start)
        })
        .unwrap_or(response.len());
    let prose = response[..prose_cut].trim().to_string();

    let mut table_text = None;
    let mut chart_text = None;
    let mut cards_text = None;

    for segment in segment(response).into_iter().skip(1) {
        let slot = match segment.kind {
            SegmentKind::Table => &mut table_text,
            SegmentKind::Chart => &mut chart_text,
            SegmentKind::Cards => &mut cards_text,
            SegmentKind::Prose => continue,
        };
        if slot.is_some() {
            debug!(kind = ?segment.kind, "ignoring repeated data block");
            continue;
        }
        *slot = Some(segment.raw_text);
    }

    let mut components = Vec::new();
    if let Some(table) = table_text.and_then(extract_table) {
        components.push(Component::Table(table));
    }
    if let Some(chart) = chart_text.and_then(extract_chart) {
        components.push(Component::Chart(chart));
    }
    if let Some(cards) = cards_text.and_then(extract_cards) {
        components.push(Component::Cards(cards));
    }

    debug!(
        markers = markers.len(),
        components = components.len(),
        "parsed structured reply"
    );

    ParsedResponse { prose, components }
}

/// Final answer text for a structured reply. Very short prose next to a
/// component is swapped for a sentence introducing the data.
pub fn finalize_answer(
    prose: &str,
    components: &[Component],
    question: &str,
    language: Language,
) -> String {
    if components.is_empty() || prose.chars().count() >= MIN_PROSE_CHARS {
        return prose.to_string();
    }

    placeholder(question, language).to_string()
}

fn placeholder(question: &str, language: Language) -> &'static str {
    let question = question.to_lowercase();
    let about_attendance = ["attendance", "employee", "موظف", "حضور"]
        .iter()
        .any(|keyword| question.contains(keyword));

    match (language, about_attendance) {
        (Language::En, true) => "Here is the employee attendance data from the monthly report:",
        (Language::En, false) => "Here is the requested data from the document:",
        (Language::Ar, true) => "إليك بيانات حضور الموظفين من التقرير الشهري:",
        (Language::Ar, false) => "إليك البيانات المطلوبة من المستند:",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChartKind, Scalar};

    const TABLE_REPLY: &str =
        "Here is the data:\nTABLE_DATA:\nheaders: [Name, Hours]\nrows: [[\"Ali\", 8], [\"Sara\", 7.5]]";

    #[test]
    fn end_to_end_table_reply() {
        let parsed = parse_response(TABLE_REPLY);

        assert_eq!(parsed.prose, "Here is the data:");
        assert_eq!(parsed.components.len(), 1);
        let Component::Table(table) = &parsed.components[0] else {
            panic!("expected a table, got {:?}", parsed.components[0]);
        };
        assert_eq!(table.headers, vec!["Name", "Hours"]);
        assert_eq!(
            table.rows,
            vec![
                vec![Scalar::Text("Ali".into()), Scalar::Int(8)],
                vec![Scalar::Text("Sara".into()), Scalar::Float(7.5)],
            ]
        );
    }

    #[test]
    fn parsing_is_idempotent() {
        assert_eq!(parse_response(TABLE_REPLY), parse_response(TABLE_REPLY));
    }

    #[test]
    fn plain_reply_is_returned_verbatim() {
        let reply = "  Ali worked 160 hours in March.\n";
        let parsed = parse_response(reply);
        assert_eq!(parsed.prose, reply);
        assert!(parsed.components.is_empty());
    }

    #[test]
    fn invalid_cards_leave_prose_untouched() {
        let parsed = parse_response(
            "Key figures for March are below.\nCARDS_DATA:\n[{title: 'Total', value: 24}]",
        );
        assert!(parsed.components.is_empty());
        assert_eq!(parsed.prose, "Key figures for March are below.");
    }

    #[test]
    fn mismatched_chart_adds_no_component() {
        let parsed = parse_response(
            "Hours per employee this month.\nCHART_DATA:\ntype: bar\nlabels: [A, B, C]\nvalues: [1, 2]",
        );
        assert!(parsed.components.is_empty());
        assert_eq!(parsed.prose, "Hours per employee this month.");
    }

    #[test]
    fn all_three_blocks_in_fixed_order() {
        let reply = r#"Summary of attendance for March.

CARDS_DATA:
[{"title": "Total", "value": "24", "description": "Employees"}]

CHART_DATA:
type: pie
title: Attendance
labels: [Present, Absent]
values: [85, 15]

TABLE_DATA:
headers: [Name, Days]
rows: [["Ali", 20]]
"#;
        let parsed = parse_response(reply);
        let kinds: Vec<&str> = parsed.components.iter().map(Component::kind).collect();
        assert_eq!(kinds, vec!["table", "chart", "cards"]);

        let Component::Chart(chart) = &parsed.components[1] else {
            panic!("expected a chart");
        };
        assert_eq!(chart.kind, ChartKind::Pie);
    }

    #[test]
    fn prose_ends_at_highest_priority_marker() {
        let reply = "Intro text here.\nCHART_DATA:\nlabels: [A]\nvalues: [1]\nMore words.\nTABLE_DATA:\nheaders: [X]\nrows: [[1]]";
        let parsed = parse_response(reply);
        assert!(parsed.prose.starts_with("Intro text here."));
        assert!(parsed.prose.contains("CHART_DATA:"));
        assert!(parsed.prose.ends_with("More words."));
        assert_eq!(parsed.components.len(), 2);
    }

    #[test]
    fn repeated_blocks_use_the_first() {
        let reply = "Two tables were produced.\nTABLE_DATA:\nheaders: [A]\nrows: [[1]]\nTABLE_DATA:\nheaders: [B]\nrows: [[2]]";
        let parsed = parse_response(reply);
        assert_eq!(parsed.components.len(), 1);
        let Component::Table(table) = &parsed.components[0] else {
            panic!("expected a table");
        };
        assert_eq!(table.headers, vec!["A"]);
    }

    #[test]
    fn segments_partition_the_reply() {
        let segments = segment(TABLE_REPLY);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].kind, SegmentKind::Prose);
        assert_eq!(segments[0].raw_text, "Here is the data:\n");
        assert_eq!(segments[1].kind, SegmentKind::Table);

        let marker_len = SegmentKind::Table.marker().map_or(0, str::len);
        let total: usize = segments.iter().map(|s| s.raw_text.len()).sum();
        assert_eq!(total + marker_len, TABLE_REPLY.len());
    }

    #[test]
    fn short_prose_gets_a_placeholder_only_with_components() {
        let parsed = parse_response(TABLE_REPLY);
        let answer = finalize_answer(
            &parsed.prose,
            &parsed.components,
            "Show employee hours in a table",
            Language::En,
        );
        assert_eq!(
            answer,
            "Here is the employee attendance data from the monthly report:"
        );

        assert_eq!(
            finalize_answer("Hi", &parsed.components, "sales figures", Language::Ar),
            "إليك البيانات المطلوبة من المستند:"
        );
        assert_eq!(finalize_answer("Hi", &[], "anything", Language::En), "Hi");
        assert_eq!(
            finalize_answer(
                "This prose is long enough to keep.",
                &parsed.components,
                "attendance",
                Language::En
            ),
            "This prose is long enough to keep."
        );
    }
}
