//! Axum route handlers for the browser form.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::WorkPreference;
use crate::pipeline::handlers::{persist_run, read_resume_upload};
use crate::resume::extract_resume_text;
use crate::state::AppState;
use crate::ui::session::{FormData, FIRST_STEP, RESUME_STEP};
use crate::ui::templates::{results_page, step_page, upload_page};

fn step_url(id: Uuid, step: u8) -> String {
    format!("/wizard/{id}/step/{step}")
}

fn results_url(id: Uuid) -> String {
    format!("/wizard/{id}/results")
}

/// Unknown or expired sessions start over.
fn restart() -> Response {
    Redirect::to("/").into_response()
}

/// GET /
///
/// Starts a new form session and sends the browser to step 1.
pub async fn handle_start(State(state): State<AppState>) -> Redirect {
    let id = state.sessions.create().await;
    info!(session = %id, "Form session started");
    Redirect::to(&step_url(id, FIRST_STEP))
}

/// GET /wizard/:id/step/:step
///
/// Renders a step. Requests for a step past the first incomplete one are redirected back to it.
pub async fn handle_show_step(
    State(state): State<AppState>,
    Path((id, step)): Path<(Uuid, u8)>,
) -> Response {
    let Some(data) = state.sessions.get(id).await else {
        return restart();
    };
    let allowed = data.first_incomplete_step();
    if step < FIRST_STEP || step > allowed {
        return Redirect::to(&step_url(id, allowed)).into_response();
    }
    step_page(id, step, &data, None).into_response()
}

/// POST /wizard/:id/step/:step
///
/// `action=back` returns to the previous step without validating.
/// `action=next` validates the step, stores it and moves on.
pub async fn handle_submit_step(
    State(state): State<AppState>,
    Path((id, step)): Path<(Uuid, u8)>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    if fields.get("action").map(String::as_str) == Some("back") {
        let previous = step.saturating_sub(1).max(FIRST_STEP);
        return Redirect::to(&step_url(id, previous)).into_response();
    }
    if step >= RESUME_STEP {
        return Redirect::to(&step_url(id, RESUME_STEP)).into_response();
    }

    let outcome = state
        .sessions
        .update(id, |data| {
            let allowed = data.first_incomplete_step();
            if step < FIRST_STEP || step > allowed {
                return Err(Redirect::to(&step_url(id, allowed)).into_response());
            }
            match data.apply(step, &fields) {
                Ok(()) => Ok(()),
                Err(err) => {
                    // Echo what the user typed so the field is not wiped.
                    let mut echo = data.clone();
                    echo_fields(&mut echo, step, &fields);
                    Err(step_page(id, step, &echo, Some(&err.to_string())).into_response())
                }
            }
        })
        .await;

    match outcome {
        None => restart(),
        Some(Err(response)) => response,
        Some(Ok(())) => Redirect::to(&step_url(id, step + 1)).into_response(),
    }
}

fn echo_fields(data: &mut FormData, step: u8, fields: &HashMap<String, String>) {
    let text = |name: &str| fields.get(name).cloned();
    match step {
        1 => data.full_name = text("full_name"),
        3 => {
            data.work_preference = fields
                .get("work_preference")
                .and_then(|v| WorkPreference::from_value(v));
            data.country = text("country");
        }
        4 => data.target_role = text("target_role"),
        _ => {}
    }
}

/// POST /wizard/:id/submit
///
/// Multipart upload from step 5. Parses the resume, runs the pipeline, persists the rows and
/// redirects to the results page. Any failure re-renders the upload step with the message.
pub async fn handle_submit_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Response {
    let Some(data) = state.sessions.get(id).await else {
        return restart();
    };
    let inputs = match data.complete() {
        Ok(inputs) => inputs,
        Err(err) => return Redirect::to(&step_url(id, err.step())).into_response(),
    };

    let run = async {
        let upload = read_resume_upload(&mut multipart).await?;
        let resume_text = extract_resume_text(upload.bytes, &upload.filename).await?;
        let report = state.pipeline.run(&inputs, &resume_text).await?;
        persist_run(Arc::clone(&state.storage), &inputs, &report).await?;
        Ok::<_, AppError>(report)
    };

    match run.await {
        Ok(report) => {
            state
                .sessions
                .update(id, |data| data.report = Some(report))
                .await;
            Redirect::to(&results_url(id)).into_response()
        }
        Err(err) => {
            warn!(session = %id, "Form submission failed: {err}");
            (err.status(), upload_page(id, Some(&err.user_message()))).into_response()
        }
    }
}

/// GET /wizard/:id/results
pub async fn handle_results(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    let Some(data) = state.sessions.get(id).await else {
        return restart();
    };
    match &data.report {
        Some(report) => results_page(id, report).into_response(),
        None => Redirect::to(&step_url(id, data.first_incomplete_step())).into_response(),
    }
}

/// POST /wizard/:id/reset
///
/// "Start new search": drops the session and starts a fresh one.
pub async fn handle_reset(State(state): State<AppState>, Path(id): Path<Uuid>) -> Redirect {
    state.sessions.remove(id).await;
    Redirect::to("/")
}

/// Fallback for unknown paths.
pub async fn handle_not_found() -> (axum::http::StatusCode, Html<&'static str>) {
    (
        axum::http::StatusCode::NOT_FOUND,
        Html(r#"<p>Page not found. <a href="/">Start a new search</a></p>"#),
    )
}
