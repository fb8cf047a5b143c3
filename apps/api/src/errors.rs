use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::jobs::JobSearchError;
use crate::models::inputs::InputError;
use crate::resume::ResumeParseError;
use crate::storage::StorageError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Resume could not be read: {0}")]
    ResumeParse(#[from] ResumeParseError),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Job search error: {0}")]
    JobSearch(#[from] JobSearchError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<InputError> for AppError {
    fn from(err: InputError) -> Self {
        AppError::Validation(err.0)
    }
}

impl AppError {
    /// Message safe to show an end user. Internal details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::UnprocessableEntity(msg) => msg.clone(),
            AppError::ResumeParse(e) => e.to_string(),
            AppError::Llm(_) => "An AI processing error occurred".to_string(),
            AppError::JobSearch(_) => "The job search service could not be reached".to_string(),
            AppError::Storage(_) => "A storage error occurred".to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::UnprocessableEntity(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE_ENTITY")
            }
            AppError::ResumeParse(_) => (StatusCode::UNPROCESSABLE_ENTITY, "RESUME_PARSE_ERROR"),
            AppError::Llm(_) => (StatusCode::BAD_GATEWAY, "LLM_ERROR"),
            AppError::JobSearch(_) => (StatusCode::BAD_GATEWAY, "JOB_SEARCH_ERROR"),
            AppError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status_and_code().0
    }

    /// Logs server-side failures once, at the boundary where they leave the app.
    pub fn log(&self) {
        match self {
            AppError::Llm(msg) => tracing::error!("LLM error: {msg}"),
            AppError::JobSearch(e) => tracing::error!("Job search error: {e}"),
            AppError::Storage(e) => tracing::error!("Storage error: {e}"),
            AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
            _ => {}
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let (status, code) = self.status_and_code();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.user_message()
            }
        }));

        (status, body).into_response()
    }
}
