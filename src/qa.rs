use std::sync::{Arc, OnceLock};
use std::time::Instant;

use regex::Regex;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::context::DocumentContext;
use crate::error::QaError;
use crate::extract::{finalize_answer, parse_response};
use crate::llm::{ChatCompletion, ChatMessage, CompletionRequest, OpenAiClient};
use crate::models::{Language, ProbeResponse, QaAnswer};

const SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions based on document content. Only provide structured data when explicitly requested.";

const PROBE_PROMPT: &str = "Say hello and confirm you're working!";

pub const ANALYSIS_QUESTION: &str = "Provide a comprehensive analysis of this attendance report including key statistics, attendance rates, and important insights.";

const TABLE_KEYWORDS: &[&str] = &["table", "list employees", "show data", "in a table", "جدول"];
const CHART_KEYWORDS: &[&str] = &[
    "chart",
    "graph",
    "visualize",
    "pie chart",
    "bar chart",
    "رسم بياني",
    "مخطط",
];
const CARDS_KEYWORDS: &[&str] = &["key metrics", "summary cards", "dashboard", "مؤشرات", "بطاقات"];

#[derive(Clone, Debug)]
pub struct QaSettings {
    pub chat_model: String,
    pub probe_model: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub max_question_chars: usize,
}

impl From<&AppConfig> for QaSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            chat_model: config.openai.chat_model.clone(),
            probe_model: config.openai.probe_model.clone(),
            max_output_tokens: config.openai.max_output_tokens,
            temperature: config.openai.temperature,
            max_question_chars: config.limits.max_question_chars,
        }
    }
}

/// Which component kinds the question asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructuredIntent {
    pub table: bool,
    pub chart: bool,
    pub cards: bool,
}

impl StructuredIntent {
    pub fn detect(question: &str) -> Self {
        let question = question.to_lowercase();
        let any = |keywords: &[&str]| keywords.iter().any(|keyword| question.contains(keyword));

        Self {
            table: any(TABLE_KEYWORDS),
            chart: any(CHART_KEYWORDS),
            cards: any(CARDS_KEYWORDS),
        }
    }

    pub fn any(self) -> bool {
        self.table || self.chart || self.cards
    }
}

#[derive(Clone)]
pub struct QaService {
    settings: QaSettings,
    client: Arc<dyn ChatCompletion>,
    generation_limit: Arc<Semaphore>,
}

impl QaService {
    pub fn new(
        settings: QaSettings,
        client: Arc<dyn ChatCompletion>,
        generation_limit: Arc<Semaphore>,
    ) -> Self {
        Self {
            settings,
            client,
            generation_limit,
        }
    }

    /// Wires the OpenAI-compatible client and the generation limiter from
    /// configuration.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let client = OpenAiClient::new(&config.openai)?;
        Ok(Self::new(
            QaSettings::from(config),
            Arc::new(client),
            Arc::new(Semaphore::new(config.limits.max_concurrent_generations)),
        ))
    }

    pub fn settings(&self) -> &QaSettings {
        &self.settings
    }

    /// Answers one question against the loaded document. Exactly one
    /// completion call is made once the input checks pass.
    pub async fn answer(
        &self,
        document: Option<&DocumentContext>,
        question: &str,
        language: Language,
    ) -> Result<QaAnswer, QaError> {
        let started = Instant::now();
        let question = question.trim();

        if question.is_empty() {
            return Err(QaError::Input("No question provided".to_string()));
        }
        let question_chars = question.chars().count();
        if question_chars > self.settings.max_question_chars {
            return Err(QaError::Input(format!(
                "Question is too long ({question_chars} characters, limit {})",
                self.settings.max_question_chars
            )));
        }

        let document = match document {
            Some(document) if !document.is_empty() => document,
            _ => {
                return Err(QaError::ResourceUnavailable(
                    "extract the document before asking questions".to_string(),
                ))
            }
        };

        let intent = StructuredIntent::detect(question);
        let prompt = if intent.any() {
            build_structured_prompt(&document.content, question, language)
        } else {
            build_text_prompt(&document.content, question, language)
        };
        let messages = [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)];

        let reply = {
            let _permit = self
                .generation_limit
                .acquire()
                .await
                .map_err(|err| QaError::UpstreamUnknown(format!("generation limiter closed: {err}")))?;

            self.client
                .complete(CompletionRequest {
                    model: &self.settings.chat_model,
                    messages: &messages,
                    max_tokens: self.settings.max_output_tokens,
                    temperature: self.settings.temperature,
                })
                .await?
        };
        let reply = sanitize_model_output(reply);

        let (answer, components) = if intent.any() {
            let parsed = parse_response(&reply);
            let answer = finalize_answer(&parsed.prose, &parsed.components, question, language);
            (answer, parsed.components)
        } else {
            (reply, Vec::new())
        };

        info!(
            table = intent.table,
            chart = intent.chart,
            cards = intent.cards,
            components = components.len(),
            language = language.as_str(),
            "answered question"
        );

        Ok(QaAnswer {
            answer,
            components,
            model: self.settings.chat_model.clone(),
            structured: intent.any(),
            latency_ms: started.elapsed().as_millis(),
        })
    }

    /// One short completion against the probe model to check credentials
    /// and connectivity.
    pub async fn probe(&self) -> Result<ProbeResponse, QaError> {
        let messages = [ChatMessage::user(PROBE_PROMPT)];
        let response = self
            .client
            .complete(CompletionRequest {
                model: &self.settings.probe_model,
                messages: &messages,
                max_tokens: 50,
                temperature: self.settings.temperature,
            })
            .await?;

        Ok(ProbeResponse {
            success: true,
            response,
            model_used: self.settings.probe_model.clone(),
        })
    }
}

fn language_rule(language: Language) -> &'static str {
    match language {
        Language::En => "",
        Language::Ar => "\nRespond in Arabic. Keep the markers TABLE_DATA:, CHART_DATA:, CARDS_DATA: and the keys headers, rows, type, title, labels, values in English.\n",
    }
}

fn build_structured_prompt(content: &str, question: &str, language: Language) -> String {
    let language_rule = language_rule(language);
    format!(
        r#"You are an AI assistant analyzing a document. Based on the following document content, answer the user's question and provide structured data as requested.

Document Content:
{content}

User Question: {question}

Instructions:
1. Answer the user's question based on the document content
2. Since the user asked for structured data, provide it in the appropriate format
3. Be concise and avoid duplicating information
4. Start with a short sentence of prose before any structured block
{language_rule}
IMPORTANT: Only provide structured data if explicitly requested. Format as follows:

For tables:
TABLE_DATA:
headers: [Column1, Column2, Column3]
rows: [[data1, data2, data3], [data4, data5, data6]]

For charts:
CHART_DATA:
type: bar|pie|line
title: Chart Title
labels: [Label1, Label2, Label3]
values: [10, 20, 30]

For metrics:
CARDS_DATA:
[{{"title": "Metric Name", "value": "123", "description": "Description"}}]

Answer:"#
    )
}

fn build_text_prompt(content: &str, question: &str, language: Language) -> String {
    let language_rule = language_rule(language);
    format!(
        "You are an AI assistant analyzing a document. Based on the following document content, answer the user's question accurately and comprehensively with a text response only.\n\n\
         Document Content:\n{content}\n\n\
         User Question: {question}\n\n\
         Instructions:\n\
         - Answer based only on the information provided in the document\n\
         - Provide a clear, well-structured text response\n\
         - Include relevant details and reference page numbers when possible\n\
         - Do NOT provide any structured data formats (tables, charts, etc.) unless explicitly requested\n\
         - Keep the response conversational and informative\n\
         {language_rule}\n\
         Answer:"
    )
}

fn fence_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?s)^```[a-zA-Z]*\n(.*)\n```$").ok())
        .as_ref()
}

fn sanitize_model_output(answer: String) -> String {
    let text = answer.trim();
    if !text.starts_with("```") {
        return text.to_string();
    }

    if let Some(body) = fence_pattern()
        .and_then(|pattern| pattern.captures(text))
        .and_then(|caps| caps.get(1))
    {
        return body.as_str().trim().to_string();
    }

    debug!("reply opened a code fence without a clean close");
    text.replace("```", "").trim().to_string()
}
