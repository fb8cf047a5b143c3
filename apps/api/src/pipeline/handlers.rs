//! Axum route handlers for the JSON API.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::jobs::discovery::build_query_for;
use crate::models::{
    CandidateInputs, CandidateProfile, JobPosting, LocationPreference, SelfReportedLevel,
    WorkPreference,
};
use crate::pipeline::report::PipelineReport;
use crate::resume::{analyze_resume, extract_resume_text};
use crate::state::AppState;
use crate::storage::{CandidateRow, CsvStorage, ResultRow, StorageError};

/// Multipart field carrying the resume file.
pub const RESUME_FIELD: &str = "resume";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ParseResumeResponse {
    pub filename: String,
    pub characters: usize,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeResumeRequest {
    pub resume_text: String,
}

#[derive(Debug, Deserialize)]
pub struct JobSearchRequest {
    pub target_role: String,
    pub work_preference: WorkPreference,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub location_preference: Option<LocationPreference>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub candidates: Vec<CandidateRow>,
    pub results: Vec<ResultRow>,
}

/// A resume upload plus any text fields sent alongside it.
#[derive(Debug)]
pub struct ResumeUpload {
    pub filename: String,
    pub bytes: Bytes,
    pub fields: HashMap<String, String>,
}

impl ResumeUpload {
    /// Builds validated inputs from the text fields of a pipeline upload.
    pub fn candidate_inputs(&self) -> Result<CandidateInputs, AppError> {
        let field = |name: &str| self.fields.get(name).map(String::as_str).unwrap_or("");

        let experience_level = SelfReportedLevel::from_value(field("experience_level"))
            .ok_or_else(|| {
                AppError::Validation("Please select your experience level".to_string())
            })?;
        let work_preference = WorkPreference::from_value(field("work_preference"))
            .ok_or_else(|| AppError::Validation("Please select a work preference".to_string()))?;

        let inputs = CandidateInputs {
            full_name: field("full_name").to_string(),
            experience_level,
            work_preference,
            location_preference: LocationPreference::from_value(field("location_preference")),
            country: Some(field("country").to_string()),
            target_role: field("target_role").to_string(),
        };
        Ok(inputs.validated()?)
    }
}

/// Drains a multipart body. The `resume` field is required; every other field is kept as text.
pub async fn read_resume_upload(multipart: &mut Multipart) -> Result<ResumeUpload, AppError> {
    let mut resume: Option<(String, Bytes)> = None;
    let mut fields = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid upload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == RESUME_FIELD {
            let filename = field.file_name().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Invalid resume file: {e}")))?;
            resume = Some((filename, data));
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("Invalid field '{name}': {e}")))?;
            fields.insert(name, value);
        }
    }

    match resume {
        Some((filename, bytes)) if !bytes.is_empty() && !filename.is_empty() => Ok(ResumeUpload {
            filename,
            bytes,
            fields,
        }),
        _ => Err(AppError::Validation(
            "Please upload your resume (PDF or DOCX)".to_string(),
        )),
    }
}

/// Appends the candidate row and one row per ranked job. File I/O runs on the
/// blocking pool.
pub async fn persist_run(
    storage: Arc<CsvStorage>,
    inputs: &CandidateInputs,
    report: &PipelineReport,
) -> Result<(), AppError> {
    let inputs = inputs.clone();
    let candidate = report.candidate.clone();
    let ranking = report.ranking.clone();
    let name = inputs.full_name.clone();
    let rows = tokio::task::spawn_blocking(move || -> Result<usize, StorageError> {
        storage.save_candidate(&inputs, &candidate)?;
        storage.save_job_results(&inputs.full_name, &ranking)
    })
    .await
    .context("CSV write task failed")??;
    info!(candidate = %name, rows, "Run persisted");
    Ok(())
}

/// Reads both CSV files on the blocking pool.
pub async fn load_history(storage: Arc<CsvStorage>) -> Result<HistoryResponse, AppError> {
    let history = tokio::task::spawn_blocking(move || -> Result<HistoryResponse, StorageError> {
        Ok(HistoryResponse {
            candidates: storage.read_candidates()?,
            results: storage.read_results()?,
        })
    })
    .await
    .context("CSV read task failed")??;
    Ok(history)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resume/parse
///
/// Extracts plain text from an uploaded PDF or DOCX without calling the LLM.
pub async fn handle_parse_resume(
    mut multipart: Multipart,
) -> Result<Json<ParseResumeResponse>, AppError> {
    let upload = read_resume_upload(&mut multipart).await?;
    let text = extract_resume_text(upload.bytes, &upload.filename).await?;

    Ok(Json(ParseResumeResponse {
        filename: upload.filename,
        characters: text.chars().count(),
        text,
    }))
}

/// POST /api/v1/resume/analyze
///
/// Runs the resume analyst over already-extracted text.
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeResumeRequest>,
) -> Result<Json<CandidateProfile>, AppError> {
    if request.resume_text.trim().is_empty() {
        return Err(AppError::Validation(
            "resume_text cannot be empty".to_string(),
        ));
    }

    let profile = analyze_resume(state.pipeline.llm(), &request.resume_text).await?;

    Ok(Json(profile))
}

/// POST /api/v1/jobs/search
///
/// Queries the job source directly with the same query rules the pipeline uses.
/// No LLM selection is applied.
pub async fn handle_search_jobs(
    State(state): State<AppState>,
    Json(request): Json<JobSearchRequest>,
) -> Result<Json<Vec<JobPosting>>, AppError> {
    if request.target_role.trim().is_empty() {
        return Err(AppError::Validation(
            "target_role cannot be empty".to_string(),
        ));
    }
    let country = request
        .country
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    if request.work_preference == WorkPreference::OnSite && country.is_none() {
        return Err(AppError::Validation(
            "country is required for on-site searches".to_string(),
        ));
    }

    let query = build_query_for(
        &request.target_role,
        request.work_preference,
        request.location_preference,
        country,
        state.pipeline.date_posted(),
    );
    let jobs = state.pipeline.job_source().search(&query).await?;

    Ok(Json(jobs))
}

/// POST /api/v1/pipeline/run
///
/// Multipart: `resume` file plus full_name, experience_level, work_preference,
/// location_preference, country and target_role. Runs every stage and persists the rows.
pub async fn handle_run_pipeline(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PipelineReport>, AppError> {
    let upload = read_resume_upload(&mut multipart).await?;
    let inputs = upload.candidate_inputs()?;
    let resume_text = extract_resume_text(upload.bytes, &upload.filename).await?;

    let report = state.pipeline.run(&inputs, &resume_text).await?;
    if let Err(e) = persist_run(Arc::clone(&state.storage), &inputs, &report).await {
        warn!("Report produced but not saved: {e}");
        return Err(e);
    }

    Ok(Json(report))
}

/// GET /api/v1/history
///
/// Returns every stored candidate and result row, oldest first.
pub async fn handle_history(
    State(state): State<AppState>,
) -> Result<Json<HistoryResponse>, AppError> {
    Ok(Json(load_history(Arc::clone(&state.storage)).await?))
}
