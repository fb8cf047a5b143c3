//! JSearch (RapidAPI) job-search client and the `JobSource` seam the pipeline depends on.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Request};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::JobSearchConfig;
use crate::jobs::skills::extract_skills;
use crate::models::JobPosting;

const SEARCH_PATH: &str = "/search";
const SOURCE_NAME: &str = "jsearch";
/// Descriptions are cut to this many characters before they reach prompts.
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

#[derive(Debug, Error)]
pub enum JobSearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Could not parse job search response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One search request against a job source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobQuery {
    pub query: String,
    pub page: u32,
    pub num_pages: u32,
    /// One of all/today/3days/week/month.
    pub date_posted: String,
    pub remote_only: bool,
}

impl JobQuery {
    pub fn new(query: impl Into<String>, date_posted: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page: 1,
            num_pages: 1,
            date_posted: date_posted.into(),
            remote_only: false,
        }
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("query", self.query.clone()),
            ("page", self.page.to_string()),
            ("num_pages", self.num_pages.to_string()),
            ("date_posted", self.date_posted.clone()),
        ];
        if self.remote_only {
            params.push(("remote_jobs_only", "true".to_string()));
        }
        params
    }
}

/// A provider of job listings.
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn search(&self, query: &JobQuery) -> Result<Vec<JobPosting>, JobSearchError>;

    /// Source identifier stamped on every posting.
    fn name(&self) -> &str;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Option<Vec<Listing>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Listing {
    job_id: Option<String>,
    employer_name: Option<String>,
    job_title: Option<String>,
    job_description: Option<String>,
    job_city: Option<String>,
    job_state: Option<String>,
    job_country: Option<String>,
    job_employment_type: Option<String>,
    job_apply_link: Option<String>,
    job_posted_at_datetime_utc: Option<String>,
    job_is_remote: Option<bool>,
    job_min_salary: Option<f64>,
    job_max_salary: Option<f64>,
    job_salary_currency: Option<String>,
    job_salary_period: Option<String>,
    job_required_skills: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct JSearchClient {
    client: Client,
    endpoint: String,
    api_key: String,
    host: String,
}

impl JSearchClient {
    pub fn new(config: &JobSearchConfig) -> Result<Self, JobSearchError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()?,
            endpoint: format!("https://{}{SEARCH_PATH}", config.host),
            api_key: config.api_key.clone(),
            host: config.host.clone(),
        })
    }

    fn build_request(&self, query: &JobQuery) -> Result<Request, JobSearchError> {
        Ok(self
            .client
            .get(&self.endpoint)
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.host)
            .query(&query.query_params())
            .build()?)
    }
}

#[async_trait]
impl JobSource for JSearchClient {
    async fn search(&self, query: &JobQuery) -> Result<Vec<JobPosting>, JobSearchError> {
        let request = self.build_request(query)?;
        debug!(url = %request.url(), "Searching JSearch");

        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("JSearch returned {}: {}", status, body);
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(JobSearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let postings = parse_search_response(&body)?;
        info!(query = %query.query, results = postings.len(), "Job search complete");
        Ok(postings)
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

/// Parses a JSearch `/search` body into normalized postings. A missing `data` array
/// means no results.
fn parse_search_response(body: &str) -> Result<Vec<JobPosting>, JobSearchError> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response
        .data
        .unwrap_or_default()
        .into_iter()
        .map(normalize_listing)
        .collect())
}

fn normalize_listing(listing: Listing) -> JobPosting {
    let title = non_blank(listing.job_title).unwrap_or_else(|| "Untitled role".to_string());
    let description = non_blank(listing.job_description).unwrap_or_default();

    let mut required_skills: Vec<String> = listing
        .job_required_skills
        .unwrap_or_default()
        .into_iter()
        .filter_map(|s| non_blank(Some(s)))
        .collect();
    for skill in extract_skills(&description) {
        if !required_skills
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(&skill))
        {
            required_skills.push(skill);
        }
    }

    let location = [listing.job_city, listing.job_state, listing.job_country]
        .into_iter()
        .filter_map(non_blank)
        .collect::<Vec<_>>();

    JobPosting {
        job_id: non_blank(listing.job_id).unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        experience_level: JobPosting::infer_level_from_title(&title),
        title,
        company: non_blank(listing.employer_name).unwrap_or_else(|| "Unknown company".to_string()),
        location: (!location.is_empty()).then(|| location.join(", ")),
        description: truncate_chars(&description, MAX_DESCRIPTION_CHARS),
        required_skills,
        preferred_skills: vec![],
        salary_range: salary_range(
            listing.job_min_salary,
            listing.job_max_salary,
            listing.job_salary_currency.as_deref(),
            listing.job_salary_period.as_deref(),
        ),
        remote_policy: listing
            .job_is_remote
            .map(|remote| if remote { "remote" } else { "on_site" }.to_string()),
        employment_type: non_blank(listing.job_employment_type),
        posted_date: listing
            .job_posted_at_datetime_utc
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc)),
        url: non_blank(listing.job_apply_link),
        source: SOURCE_NAME.to_string(),
    }
}

fn salary_range(
    min: Option<f64>,
    max: Option<f64>,
    currency: Option<&str>,
    period: Option<&str>,
) -> Option<String> {
    let amount = match (min, max) {
        (Some(min), Some(max)) if (min - max).abs() > f64::EPSILON => {
            format!("{:.0}-{:.0}", min, max)
        }
        (Some(value), _) | (None, Some(value)) => format!("{:.0}", value),
        (None, None) => return None,
    };
    let mut range = match currency {
        Some(currency) if !currency.trim().is_empty() => format!("{} {amount}", currency.trim()),
        _ => amount,
    };
    if let Some(period) = period.filter(|p| !p.trim().is_empty()) {
        range.push_str(&format!(" per {}", period.trim().to_lowercase()));
    }
    Some(range)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Truncates to at most `max` characters without splitting a UTF-8 sequence.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}
