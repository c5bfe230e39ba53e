use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSource {
    Pdf,
    Database,
}

impl DocumentSource {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentSource::Pdf => "pdf",
            DocumentSource::Database => "database",
        }
    }

    pub fn from_env_value(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "database" | "db" | "sqlite" => DocumentSource::Database,
            _ => DocumentSource::Pdf,
        }
    }
}

/// A single table cell or list token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Numeric view of the scalar. Quoted numerals such as `"12"` count.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Int(n) => Some(*n as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Text(text) => text.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableComponent {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Scalar>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Bar,
    Pie,
    Line,
}

impl ChartKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Pie => "pie",
            ChartKind::Line => "line",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "bar" => Some(ChartKind::Bar),
            "pie" => Some(ChartKind::Pie),
            "line" => Some(ChartKind::Line),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartComponent {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    /// Unrecognised `key: value` lines, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub title: String,
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    #[serde(default)]
    pub description: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Component {
    Table(TableComponent),
    Chart(ChartComponent),
    Cards(Vec<Card>),
}

impl Component {
    pub fn kind(&self) -> &'static str {
        match self {
            Component::Table(_) => "table",
            Component::Chart(_) => "chart",
            Component::Cards(_) => "cards",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaAnswer {
    pub answer: String,
    pub components: Vec<Component>,
    pub model: String,
    pub structured: bool,
    pub latency_ms: u128,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub language: Language,
}

impl ChatRequest {
    /// `message` wins over `question` when both are sent.
    pub fn question_text(&self) -> &str {
        self.message
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .or(self.question.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub components: Vec<Component>,
    pub source: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleKind {
    #[default]
    All,
    Table,
    Chart,
    Cards,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleDataRequest {
    #[serde(default, rename = "type")]
    pub kind: SampleKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleDataResponse {
    pub text: String,
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub analysis: String,
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfInfo {
    pub file_exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size_mb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextOverview {
    pub text_length: usize,
    pub total_chunks: usize,
    pub first_500_chars: String,
    pub source: DocumentSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResponse {
    pub success: bool,
    pub response: String,
    pub model_used: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_serializes_with_type_and_data() {
        let component = Component::Cards(vec![Card {
            title: "Total".to_string(),
            value: "12".to_string(),
            description: "Employees".to_string(),
        }]);

        let json = serde_json::to_value(&component).expect("serialize");
        assert_eq!(json["type"], "cards");
        assert_eq!(json["data"][0]["title"], "Total");
    }

    #[test]
    fn chart_kind_serializes_under_type_key() {
        let chart = ChartComponent {
            kind: ChartKind::Pie,
            title: "Share".to_string(),
            labels: vec!["A".to_string()],
            values: vec![1.0],
            extra: BTreeMap::from([("unit".to_string(), "hours".to_string())]),
        };

        let json = serde_json::to_value(Component::Chart(chart)).expect("serialize");
        assert_eq!(json["data"]["type"], "pie");
        assert_eq!(json["data"]["unit"], "hours");
    }

    #[test]
    fn card_value_accepts_numbers() {
        let card: Card =
            serde_json::from_str(r#"{"title": "Rate", "value": 87.5}"#).expect("deserialize");
        assert_eq!(card.value, "87.5");
        assert_eq!(card.description, "");
    }

    #[test]
    fn chat_request_prefers_message_over_question() {
        let request: ChatRequest =
            serde_json::from_str(r#"{"message": "  ", "question": "Who was absent?"}"#)
                .expect("deserialize");
        assert_eq!(request.question_text(), "Who was absent?");
        assert_eq!(request.language, Language::En);

        let request: ChatRequest =
            serde_json::from_str(r#"{"message": "Hi", "language": "ar"}"#).expect("deserialize");
        assert_eq!(request.question_text(), "Hi");
        assert_eq!(request.language, Language::Ar);
    }

    #[test]
    fn scalar_numeric_view_coerces_quoted_numerals() {
        assert_eq!(Scalar::Text(" 12 ".to_string()).as_number(), Some(12.0));
        assert_eq!(Scalar::Text("n/a".to_string()).as_number(), None);
        assert_eq!(Scalar::Int(3).as_number(), Some(3.0));
    }
}
