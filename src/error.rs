use thiserror::Error;

/// Failure kinds surfaced by the question-answering core.
///
/// Malformed structured blocks in a model reply are not errors: the extractors
/// degrade to "no component" instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QaError {
    #[error("{0}")]
    Input(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("no document content available: {0}")]
    ResourceUnavailable(String),

    #[error("chat completion timed out after {seconds}s")]
    UpstreamTimeout { seconds: u64 },

    #[error("chat completion rate limited: {0}")]
    UpstreamRateLimited(String),

    #[error("chat completion rejected the request: {0}")]
    UpstreamInvalidRequest(String),

    #[error("chat completion failed: {0}")]
    UpstreamUnknown(String),
}

impl QaError {
    pub fn kind(&self) -> &'static str {
        match self {
            QaError::Input(_) => "input",
            QaError::Config(_) => "config",
            QaError::ResourceUnavailable(_) => "resource_unavailable",
            QaError::UpstreamTimeout { .. } => "upstream_timeout",
            QaError::UpstreamRateLimited(_) => "upstream_rate_limited",
            QaError::UpstreamInvalidRequest(_) => "upstream_invalid_request",
            QaError::UpstreamUnknown(_) => "upstream_unknown",
        }
    }

    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            QaError::UpstreamTimeout { .. }
                | QaError::UpstreamRateLimited(_)
                | QaError::UpstreamInvalidRequest(_)
                | QaError::UpstreamUnknown(_)
        )
    }
}
