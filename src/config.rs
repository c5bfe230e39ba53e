use std::env;
use std::path::PathBuf;

use crate::models::DocumentSource;

#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub probe_model: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LimitConfig {
    pub max_concurrent_generations: usize,
    pub max_question_chars: usize,
}

#[derive(Clone, Debug)]
pub struct DocumentConfig {
    pub source: DocumentSource,
    pub pdf_path: PathBuf,
    pub database_path: PathBuf,
    pub database_row_limit: i64,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub static_dir: PathBuf,
    pub openai: OpenAiConfig,
    pub limits: LimitConfig,
    pub document: DocumentConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr = env::var("DOCQA_BIND").unwrap_or_else(|_| {
            let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
            let port = env::var("PORT").unwrap_or_else(|_| "5000".to_string());
            format!("{host}:{port}")
        });

        Self {
            bind_addr,
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("static")),
            openai: OpenAiConfig {
                api_key: env::var("OPENAI_API_KEY")
                    .ok()
                    .filter(|key| !key.trim().is_empty()),
                base_url: env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                chat_model: env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
                probe_model: env::var("PROBE_MODEL")
                    .unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
                max_output_tokens: env::var("MAX_OUTPUT_TOKENS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1_200),
                temperature: env::var("TEMPERATURE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0.1),
                request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60),
            },
            limits: LimitConfig {
                max_concurrent_generations: env::var("MAX_CONCURRENT_GENERATIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|n: &usize| *n > 0)
                    .unwrap_or(4),
                max_question_chars: env::var("MAX_QUESTION_CHARS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(4_000),
            },
            document: DocumentConfig {
                source: env::var("DOCUMENT_SOURCE")
                    .map(|v| DocumentSource::from_env_value(&v))
                    .unwrap_or(DocumentSource::Pdf),
                pdf_path: env::var("PDF_FILE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("MonthlyAttendanceReport.pdf")),
                database_path: env::var("DATABASE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("attendance.db")),
                database_row_limit: env::var("DATABASE_ROW_LIMIT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(500),
            },
        }
    }
}
