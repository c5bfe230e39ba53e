use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use askama::Template;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::context::{DocumentContext, SharedDocument};
use crate::error::QaError;
use crate::ingest::pdf::pdf_info;
use crate::ingest::{load_document, ExtractionReport};
use crate::models::{
    AnalysisResponse, ChatRequest, ChatResponse, Language, PdfInfo, ProbeResponse,
    SampleDataRequest, SampleDataResponse, TextOverview,
};
use crate::qa::{QaService, ANALYSIS_QUESTION};
use crate::sample::sample_response;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub qa: QaService,
    pub document: SharedDocument,
}

impl AppState {
    /// Clones the current snapshot out so the lock is not held while a
    /// completion is in flight.
    async fn current_document(&self) -> Option<Arc<DocumentContext>> {
        self.document.read().await.clone()
    }
}

pub async fn run_server(config: AppConfig, qa: QaService, document: SharedDocument) -> Result<()> {
    let addr: SocketAddr = config.bind_addr.parse()?;
    let state = AppState {
        config: Arc::new(config),
        qa,
        document,
    };

    let app = router(state);
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    let static_dir = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/", get(index_page))
        .route("/chat", post(chat_handler))
        .route("/extract", get(extract_handler))
        .route("/pdf-info", get(pdf_info_handler))
        .route("/extract-text", get(extract_text_handler))
        .route("/analyze-document", post(analyze_document))
        .route("/generate-sample-data", post(generate_sample_data))
        .route("/test-openai", post(test_openai))
        .nest_service("/static", static_dir)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let loaded = state.current_document().await;
    let template = IndexTemplate {
        source: state.config.document.source.as_str(),
        chat_model: state.config.openai.chat_model.clone(),
        document_loaded: loaded.is_some_and(|doc| !doc.is_empty()),
    };
    let body = template.render().map_err(ApiError::from)?;

    Ok(Html(body))
}

async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let span = tracing::info_span!(
        "chat",
        request_id = %Uuid::new_v4(),
        language = request.language.as_str()
    );

    async move {
        let document = state.current_document().await;
        let answer = state
            .qa
            .answer(document.as_deref(), request.question_text(), request.language)
            .await
            .map_err(|err| {
                if err.is_upstream() {
                    tracing::warn!(kind = err.kind(), error = %err, "chat request failed");
                } else {
                    tracing::debug!(kind = err.kind(), error = %err, "chat request rejected");
                }
                err
            })?;

        Ok::<_, ApiError>(Json(ChatResponse {
            response: answer.answer,
            components: answer.components,
            source: "ai_analysis".to_string(),
        }))
    }
    .instrument(span)
    .await
}

#[derive(Debug, Serialize)]
struct ExtractResponse {
    success: bool,
    content_hash: String,
    loaded_at: DateTime<Utc>,
    #[serde(flatten)]
    report: ExtractionReport,
}

async fn extract_handler(State(state): State<AppState>) -> Result<Json<ExtractResponse>, ApiError> {
    let (document, report) = load_document(&state.config).await?;
    let response = ExtractResponse {
        success: true,
        content_hash: document.content_hash.clone(),
        loaded_at: document.loaded_at,
        report,
    };

    *state.document.write().await = Some(Arc::new(document));
    tracing::info!(hash = %response.content_hash, "document re-extracted");

    Ok(Json(response))
}

async fn pdf_info_handler(State(state): State<AppState>) -> Json<PdfInfo> {
    Json(pdf_info(&state.config.document.pdf_path).await)
}

async fn extract_text_handler(State(state): State<AppState>) -> Result<Json<TextOverview>, ApiError> {
    match state.current_document().await {
        Some(document) if !document.is_empty() => Ok(Json(document.overview())),
        _ => Err(QaError::ResourceUnavailable("No document data available".to_string()).into()),
    }
}

async fn analyze_document(State(state): State<AppState>) -> Result<Json<AnalysisResponse>, ApiError> {
    let document = state.current_document().await;
    let answer = state
        .qa
        .answer(document.as_deref(), ANALYSIS_QUESTION, Language::En)
        .await?;

    Ok(Json(AnalysisResponse {
        analysis: answer.answer,
        components: answer.components,
    }))
}

async fn generate_sample_data(Json(request): Json<SampleDataRequest>) -> Json<SampleDataResponse> {
    Json(sample_response(request.kind))
}

async fn test_openai(State(state): State<AppState>) -> Result<Json<ProbeResponse>, ApiError> {
    Ok(Json(state.qa.probe().await?))
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    source: &'static str,
    chat_model: String,
    document_loaded: bool,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

pub fn status_for(err: &QaError) -> StatusCode {
    match err {
        QaError::Input(_) | QaError::ResourceUnavailable(_) => StatusCode::BAD_REQUEST,
        QaError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        QaError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        QaError::UpstreamRateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        QaError::UpstreamInvalidRequest(_) | QaError::UpstreamUnknown(_) => StatusCode::BAD_GATEWAY,
    }
}

impl From<QaError> for ApiError {
    fn from(value: QaError) -> Self {
        Self {
            status: status_for(&value),
            kind: value.kind(),
            message: value.to_string(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal",
            message: format!("{value:#}"),
        }
    }
}

impl From<askama::Error> for ApiError {
    fn from(value: askama::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal",
            message: value.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({
            "error": self.message,
            "kind": self.kind,
            "components": [],
        });
        (self.status, Json(body)).into_response()
    }
}
