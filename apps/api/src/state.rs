use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::JobSearchPipeline;
use crate::storage::CsvStorage;
use crate::ui::FormSessions;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Stateless; one instance serves every request.
    pub pipeline: Arc<JobSearchPipeline>,
    pub storage: Arc<CsvStorage>,
    /// In-memory form sessions. Lost on restart.
    pub sessions: FormSessions,
}

impl AppState {
    pub fn new(config: Config, pipeline: JobSearchPipeline, storage: CsvStorage) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            storage: Arc::new(storage),
            sessions: FormSessions::default(),
        }
    }
}
