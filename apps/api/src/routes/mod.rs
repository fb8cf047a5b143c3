pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::pipeline::handlers;
use crate::state::AppState;
use crate::ui::handlers as ui;

/// Upper bound for request bodies, sized for resume uploads.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // JSON API
        .route("/api/v1/resume/parse", post(handlers::handle_parse_resume))
        .route(
            "/api/v1/resume/analyze",
            post(handlers::handle_analyze_resume),
        )
        .route("/api/v1/jobs/search", post(handlers::handle_search_jobs))
        .route("/api/v1/pipeline/run", post(handlers::handle_run_pipeline))
        .route("/api/v1/history", get(handlers::handle_history))
        // Browser form
        .route("/", get(ui::handle_start))
        .route(
            "/wizard/:id/step/:step",
            get(ui::handle_show_step).post(ui::handle_submit_step),
        )
        .route("/wizard/:id/submit", post(ui::handle_submit_resume))
        .route("/wizard/:id/results", get(ui::handle_results))
        .route("/wizard/:id/reset", post(ui::handle_reset))
        .fallback(ui::handle_not_found)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::jobs::client::testing::StaticJobSource;
    use crate::llm_client::testing::ScriptedModel;
    use crate::pipeline::orchestrator::fixtures::{full_run_model, job_source, PROFILE_JSON};
    use crate::pipeline::JobSearchPipeline;
    use crate::resume::file_parser::fixtures::docx_with_paragraphs;
    use crate::storage::CsvStorage;

    const BOUNDARY: &str = "jobscout-test-boundary";

    fn app_with(llm: Arc<ScriptedModel>, jobs: Arc<StaticJobSource>) -> (TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::for_tests(dir.path().to_path_buf());
        let storage = CsvStorage::open(&config.data_dir).unwrap();
        let pipeline = JobSearchPipeline::new(llm, jobs, 5, "all");
        (dir, build_router(AppState::new(config, pipeline, storage)))
    }

    fn app() -> (TempDir, Router) {
        app_with(full_run_model(), job_source())
    }

    fn multipart(fields: &[(&str, &str)], file: Option<(&str, Vec<u8>)>) -> Request<Body> {
        multipart_to("/api/v1/pipeline/run", fields, file)
    }

    fn multipart_to(uri: &str, fields: &[(&str, &str)], file: Option<(&str, Vec<u8>)>) -> Request<Body> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((filename, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"resume\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(&bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn form_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_str(&body_string(response).await).unwrap()
    }

    fn location(response: &Response) -> String {
        response.headers()[header::LOCATION]
            .to_str()
            .unwrap()
            .to_string()
    }

    fn resume_fields() -> Vec<(&'static str, &'static str)> {
        vec![
            ("full_name", "Ada Lovelace"),
            ("experience_level", "mid_level"),
            ("work_preference", "remote"),
            ("target_role", "Rust Engineer"),
        ]
    }

    fn resume_docx() -> Vec<u8> {
        docx_with_paragraphs(&["Ada Lovelace", "Rust engineer, 4 years", "Docker"])
    }

    #[tokio::test]
    async fn test_health() {
        let (_dir, app) = app();
        let response = app.oneshot(get_req("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "jobscout-api");
    }

    #[tokio::test]
    async fn test_parse_resume_returns_text() {
        let (_dir, app) = app();
        let request = multipart_to("/api/v1/resume/parse", &[], Some(("cv.docx", resume_docx())));
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["filename"], "cv.docx");
        assert!(body["text"].as_str().unwrap().contains("Rust engineer"));
    }

    #[tokio::test]
    async fn test_parse_resume_rejects_unknown_format() {
        let (_dir, app) = app();
        let request = multipart_to("/api/v1/resume/parse", &[], Some(("cv.txt", b"plain".to_vec())));
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "RESUME_PARSE_ERROR");
    }

    #[tokio::test]
    async fn test_analyze_resume() {
        let (_dir, app) = app_with(
            Arc::new(ScriptedModel::new([PROFILE_JSON])),
            job_source(),
        );
        let request = json_post(
            "/api/v1/resume/analyze",
            json!({"resume_text": "Ada Lovelace, Rust engineer"}),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["name"], "Ada Lovelace");
        assert_eq!(body["skills"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_analyze_blank_text_is_bad_request() {
        let llm = Arc::new(ScriptedModel::default());
        let (_dir, app) = app_with(Arc::clone(&llm), job_source());
        let request = json_post("/api/v1/resume/analyze", json!({"resume_text": "  "}));
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_job_search_on_site_requires_country() {
        let (_dir, app) = app();
        let request = json_post(
            "/api/v1/jobs/search",
            json!({"target_role": "Rust Engineer", "work_preference": "on_site"}),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_job_search_returns_postings() {
        let jobs = job_source();
        let (_dir, app) = app_with(full_run_model(), Arc::clone(&jobs));
        let request = json_post(
            "/api/v1/jobs/search",
            json!({"target_role": "Rust Engineer", "work_preference": "on_site", "country": "India"}),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 3);
        assert_eq!(jobs.last_query().unwrap().query, "Rust Engineer in India");
    }

    #[tokio::test]
    async fn test_pipeline_run_persists_rows() {
        let (_dir, app) = app();
        let request = multipart(&resume_fields(), Some(("cv.docx", resume_docx())));
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let report = body_json(response).await;
        assert_eq!(report["ranking"]["ranked_jobs"].as_array().unwrap().len(), 3);
        assert_eq!(report["job_search"]["jobs_matched"], 3);

        let response = app.oneshot(get_req("/api/v1/history")).await.unwrap();
        let history = body_json(response).await;
        assert_eq!(history["candidates"].as_array().unwrap().len(), 1);
        assert_eq!(history["results"].as_array().unwrap().len(), 3);
        assert_eq!(history["candidates"][0]["full_name"], "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_pipeline_run_requires_resume() {
        let llm = Arc::new(ScriptedModel::default());
        let (_dir, app) = app_with(Arc::clone(&llm), job_source());
        let response = app.oneshot(multipart(&resume_fields(), None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_pipeline_run_llm_failure_is_bad_gateway() {
        let (_dir, app) = app_with(Arc::new(ScriptedModel::failing("boom")), job_source());
        let request = multipart(&resume_fields(), Some(("cv.docx", resume_docx())));
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let history = body_json(app.oneshot(get_req("/api/v1/history")).await.unwrap()).await;
        assert!(history["candidates"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_start_redirects_to_first_step() {
        let (_dir, app) = app();
        let response = app.oneshot(get_req("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let target = location(&response);
        assert!(target.starts_with("/wizard/"));
        assert!(target.ends_with("/step/1"));
    }

    async fn start(app: &Router) -> String {
        let response = app.clone().oneshot(get_req("/")).await.unwrap();
        location(&response).trim_end_matches("/step/1").to_string()
    }

    #[tokio::test]
    async fn test_skipping_ahead_redirects_to_first_incomplete_step() {
        let (_dir, app) = app();
        let base = start(&app).await;
        let response = app
            .oneshot(get_req(&format!("{base}/step/4")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), format!("{base}/step/1"));
    }

    #[tokio::test]
    async fn test_step_validation_renders_inline_error() {
        let (_dir, app) = app();
        let base = start(&app).await;
        let response = app
            .clone()
            .oneshot(form_post(&format!("{base}/step/1"), "full_name=+&action=next"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("Please enter your full name"));

        let response = app
            .oneshot(form_post(
                &format!("{base}/step/1"),
                "full_name=Ada+Lovelace&action=next",
            ))
            .await
            .unwrap();
        assert_eq!(location(&response), format!("{base}/step/2"));
    }

    #[tokio::test]
    async fn test_back_skips_validation() {
        let (_dir, app) = app();
        let base = start(&app).await;
        let response = app
            .oneshot(form_post(&format!("{base}/step/3"), "action=back"))
            .await
            .unwrap();
        assert_eq!(location(&response), format!("{base}/step/2"));
    }

    #[tokio::test]
    async fn test_unknown_session_restarts() {
        let (_dir, app) = app();
        let response = app
            .oneshot(get_req(
                "/wizard/00000000-0000-0000-0000-000000000000/step/1",
            ))
            .await
            .unwrap();
        assert_eq!(location(&response), "/");
    }

    async fn fill_steps(app: &Router, base: &str) {
        for (step, body) in [
            (1, "full_name=Ada+Lovelace&action=next"),
            (2, "experience_level=mid_level&action=next"),
            (3, "work_preference=remote&action=next"),
            (4, "target_role=Rust+Engineer&action=next"),
        ] {
            let response = app
                .clone()
                .oneshot(form_post(&format!("{base}/step/{step}"), body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "step {step}");
        }
    }

    #[tokio::test]
    async fn test_form_submission_shows_results() {
        let (_dir, app) = app();
        let base = start(&app).await;
        fill_steps(&app, &base).await;

        let request = multipart_to(
            &format!("{base}/submit"),
            &[],
            Some(("cv.docx", resume_docx())),
        );
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), format!("{base}/results"));

        let response = app
            .clone()
            .oneshot(get_req(&format!("{base}/results")))
            .await
            .unwrap();
        let html = body_string(response).await;
        assert!(html.contains("Ranked Job Opportunities"));
        assert!(html.contains("Oxide"));
        assert!(html.contains("TIER 1"));

        let response = app
            .oneshot(form_post(&format!("{base}/reset"), ""))
            .await
            .unwrap();
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn test_form_submission_failure_offers_retry() {
        let (_dir, app) = app();
        let base = start(&app).await;
        fill_steps(&app, &base).await;

        let request = multipart_to(&format!("{base}/submit"), &[], Some(("cv.txt", b"text".to_vec())));
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = body_string(response).await;
        assert!(html.contains("Unsupported"));
        assert!(html.contains("Try again"));
    }
}
