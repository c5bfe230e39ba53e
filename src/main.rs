use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Semaphore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use docqa::context::new_shared_document;
use docqa::ingest::load_document;
use docqa::llm::OpenAiClient;
use docqa::qa::QaSettings;
use docqa::{run_server, AppConfig, QaService};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env();
    let client = OpenAiClient::new(&config.openai)?;
    if !client.has_api_key() {
        warn!("OPENAI_API_KEY is not set; chat requests will fail until it is configured");
    }

    let generation_limit = Arc::new(Semaphore::new(config.limits.max_concurrent_generations));
    let qa = QaService::new(QaSettings::from(&config), Arc::new(client), generation_limit);
    let document = new_shared_document();

    match load_document(&config).await {
        Ok((context, report)) => {
            info!(
                origin = %context.origin,
                characters = report.total_characters(),
                "document loaded at startup"
            );
            *document.write().await = Some(Arc::new(context));
        }
        Err(err) => warn!(error = %err, "document not loaded at startup; call /extract"),
    }

    run_server(config, qa, document).await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
