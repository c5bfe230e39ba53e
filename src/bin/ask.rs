use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use docqa::ingest::{load_database, load_document, load_pdf};
use docqa::models::Language;
use docqa::{AppConfig, QaService};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LanguageArg {
    En,
    Ar,
}

impl From<LanguageArg> for Language {
    fn from(value: LanguageArg) -> Self {
        match value {
            LanguageArg::En => Language::En,
            LanguageArg::Ar => Language::Ar,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "ask")]
#[command(about = "Ask one question against the configured PDF report or attendance database")]
struct Cli {
    #[arg(long)]
    question: String,
    #[arg(long, value_enum, default_value_t = LanguageArg::En)]
    language: LanguageArg,
    /// Read this PDF instead of the configured source.
    #[arg(long, conflicts_with = "database")]
    pdf: Option<PathBuf>,
    /// Summarize this SQLite file instead of the configured source.
    #[arg(long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    let config = AppConfig::from_env();
    let qa = QaService::from_config(&config)?;

    let (document, report) = match (&cli.pdf, &cli.database) {
        (Some(path), _) => load_pdf(path).await?,
        (None, Some(path)) => load_database(path, config.document.database_row_limit).await?,
        (None, None) => load_document(&config).await?,
    };
    eprintln!(
        "loaded {} ({} characters)",
        document.origin,
        report.total_characters()
    );

    let answer = qa
        .answer(Some(&document), &cli.question, cli.language.into())
        .await?;

    println!("{}", answer.answer);
    if !answer.components.is_empty() {
        println!("{}", serde_json::to_string_pretty(&answer.components)?);
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
