use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::OpenAiConfig;
use crate::error::QaError;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub max_tokens: u32,
    pub temperature: f32,
}

/// A chat-completion backend. The QA service only talks to this trait, so
/// tests can swap in a canned implementation.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, QaError>;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        Self::with_timeout(
            config.base_url.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build chat completion http client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            timeout,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn map_transport_error(&self, err: reqwest::Error) -> QaError {
        if err.is_timeout() {
            QaError::UpstreamTimeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            QaError::UpstreamUnknown(format!("request failed: {err}"))
        }
    }
}

#[async_trait]
impl ChatCompletion for OpenAiClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, QaError> {
        #[derive(Deserialize)]
        struct CompletionResp {
            #[serde(default)]
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMessage,
        }

        #[derive(Deserialize)]
        struct ChoiceMessage {
            #[serde(default)]
            content: Option<String>,
        }

        let Some(api_key) = self.api_key.as_deref() else {
            return Err(QaError::Config("OPENAI_API_KEY is not set".to_string()));
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = request.model, messages = request.messages.len(), "calling chat completion");

        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| self.map_transport_error(err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = normalize_err_body(&body);
            warn!(%status, error = %message, "chat completion returned an error status");
            return Err(classify_status(status, message, self.timeout));
        }

        let response = response
            .json::<CompletionResp>()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    self.map_transport_error(err)
                } else {
                    QaError::UpstreamUnknown(format!("failed to decode completion response: {err}"))
                }
            })?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| QaError::UpstreamUnknown("completion returned no choices".to_string()))?;

        Ok(content.trim().to_string())
    }
}

pub fn classify_status(status: StatusCode, message: String, timeout: Duration) -> QaError {
    match status.as_u16() {
        429 => QaError::UpstreamRateLimited(message),
        400 | 404 | 413 | 422 => QaError::UpstreamInvalidRequest(message),
        408 | 504 => QaError::UpstreamTimeout {
            seconds: timeout.as_secs(),
        },
        401 | 403 => QaError::Config(format!("chat completion credentials rejected: {message}")),
        _ => QaError::UpstreamUnknown(format!("status {status}: {message}")),
    }
}

fn normalize_err_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let error = json.get("error");
        if let Some(message) = error
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
        {
            return message.to_string();
        }
        if let Some(message) = error.and_then(|v| v.as_str()) {
            return message.to_string();
        }
    }

    trimmed.to_string()
}
