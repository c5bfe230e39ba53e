pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod qa;
pub mod sample;
pub mod seed;
pub mod server;

pub use config::AppConfig;
pub use context::DocumentContext;
pub use error::QaError;
pub use qa::QaService;
pub use server::run_server;
