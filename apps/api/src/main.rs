mod config;
mod errors;
mod jobs;
mod llm_client;
mod matching;
mod models;
mod pipeline;
mod resume;
mod routes;
mod state;
mod storage;
mod ui;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, Environment};
use crate::jobs::JSearchClient;
use crate::llm_client::LlmClient;
use crate::pipeline::JobSearchPipeline;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::CsvStorage;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobScout API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(&config.ollama)?;
    info!(
        "LLM client initialized (model: {}, endpoint: {})",
        config.ollama.model, config.ollama.base_url
    );

    // Initialize job source
    let jobs = JSearchClient::new(&config.job_search)?;
    info!("Job search client initialized (host: {})", config.job_search.host);

    // Initialize CSV storage
    let storage = CsvStorage::open(&config.data_dir)?;

    let pipeline = JobSearchPipeline::new(
        Arc::new(llm),
        Arc::new(jobs),
        config.job_search.num_jobs,
        config.job_search.date_posted.clone(),
    );

    let cors = match config.environment {
        Environment::Production => CorsLayer::new(),
        Environment::Development | Environment::Test => CorsLayer::permissive(),
    };
    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;

    // Build router
    let app = build_router(AppState::new(config, pipeline, storage))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
