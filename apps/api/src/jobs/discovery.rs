//! Job discovery: search the job source, then let the researcher pick the listings
//! worth evaluating.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::jobs::client::{truncate_chars, JobQuery, JobSource};
use crate::jobs::prompts::{JOB_MARKET_RESEARCHER, JOB_SELECTION_PROMPT_TEMPLATE};
use crate::llm_client::prompts::NO_INVENTION_INSTRUCTION;
use crate::llm_client::{call_json, lenient_string, null_as_default, ChatModel};
use crate::models::{
    CandidateInputs, CandidateProfile, JobPosting, LocationPreference, WorkPreference,
};

/// Below this many recognized recommendations the raw search order is used instead.
const MIN_RECOMMENDED_MATCHES: usize = 3;
/// Description excerpt length shown to the researcher per listing.
const LISTING_EXCERPT_CHARS: usize = 300;

#[derive(Debug, Default, Deserialize)]
struct SelectionResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    recommended_jobs: Vec<Value>,
    #[serde(default)]
    search_summary: Option<String>,
}

/// Reads one recommendation. Entries may be objects with a `job_id` or bare ids;
/// anything without a usable id is skipped.
fn recommended_id(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => {
            let id = lenient_string(map.get("job_id"))?;
            debug!(job_id = %id, reason = lenient_string(map.get("reason")).as_deref().unwrap_or(""), "Recommended");
            Some(id)
        }
        other => lenient_string(Some(other)),
    }
}

/// Outcome of the discovery stage.
#[derive(Debug, Clone, Serialize)]
pub struct Discovery {
    pub jobs: Vec<JobPosting>,
    /// Listings returned by the job source before selection.
    pub total_found: usize,
    pub search_summary: String,
    /// True when the researcher's picks were unusable and search order was kept.
    pub used_search_order: bool,
}

/// Builds the search request from the candidate's target role and work preference.
pub fn build_job_query(inputs: &CandidateInputs, date_posted: &str) -> JobQuery {
    build_query_for(
        &inputs.target_role,
        inputs.work_preference,
        inputs.location_preference,
        inputs.country.as_deref(),
        date_posted,
    )
}

/// Remote searches ask for remote-only listings. On-site searches name the candidate's
/// country unless they are open to relocation. Everything else searches the role alone.
pub fn build_query_for(
    role: &str,
    work_preference: WorkPreference,
    location_preference: Option<LocationPreference>,
    country: Option<&str>,
    date_posted: &str,
) -> JobQuery {
    let role = role.trim();
    let mut query = JobQuery::new(role, date_posted);
    match (work_preference, location_preference, country) {
        (WorkPreference::Remote, _, _) => {
            query.query = format!("{role} remote");
            query.remote_only = true;
        }
        (
            WorkPreference::OnSite,
            None | Some(LocationPreference::OnlyMyCountry),
            Some(country),
        ) if !country.trim().is_empty() => {
            query.query = format!("{role} in {}", country.trim());
        }
        _ => {}
    }
    query
}

/// Keeps recommended listings in recommendation order. Falls back to the first
/// `num_jobs` listings when fewer than three recommendations are recognized.
pub fn select_jobs(
    listings: &[JobPosting],
    recommended_ids: &[String],
    num_jobs: usize,
) -> (Vec<JobPosting>, bool) {
    let mut selected: Vec<JobPosting> = Vec::new();
    for id in recommended_ids {
        let id = id.trim();
        if selected.iter().any(|job| job.job_id == id) {
            continue;
        }
        if let Some(job) = listings.iter().find(|job| job.job_id == id) {
            selected.push(job.clone());
        }
    }

    if selected.len() < MIN_RECOMMENDED_MATCHES {
        return (listings.iter().take(num_jobs).cloned().collect(), true);
    }
    selected.truncate(num_jobs);
    (selected, false)
}

fn format_listings(listings: &[JobPosting]) -> String {
    listings
        .iter()
        .enumerate()
        .map(|(i, job)| {
            format!(
                "{n}. job_id: {id}\n   Title: {title}\n   Company: {company}\n   Location: {location}\n   Skills: {skills}\n   Description: {excerpt}",
                n = i + 1,
                id = job.job_id,
                title = job.title,
                company = job.company,
                location = job.location.as_deref().unwrap_or("Not specified"),
                skills = if job.required_skills.is_empty() {
                    "Not listed".to_string()
                } else {
                    job.required_skills.join(", ")
                },
                excerpt = truncate_chars(&job.description, LISTING_EXCERPT_CHARS),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_selection_prompt(
    candidate: &CandidateProfile,
    inputs: &CandidateInputs,
    listings: &[JobPosting],
    num_jobs: usize,
) -> String {
    let skills = candidate.top_skills(10).join(", ");
    let previous_roles = candidate
        .previous_roles
        .iter()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");

    JOB_SELECTION_PROMPT_TEMPLATE
        .replace("{num_jobs}", &num_jobs.to_string())
        .replace("{target_role}", &inputs.target_role)
        .replace("{self_reported_level}", inputs.experience_level.label())
        .replace("{work_preference}", inputs.work_preference.label())
        .replace(
            "{experience}",
            &format!(
                "{} ({} years)",
                candidate.experience_level, candidate.total_years_experience
            ),
        )
        .replace("{skills}", &skills)
        .replace(
            "{previous_roles}",
            if previous_roles.is_empty() {
                "None listed"
            } else {
                previous_roles.as_str()
            },
        )
        .replace("{listings}", &format_listings(listings))
        .replace("{no_invention}", NO_INVENTION_INSTRUCTION)
}

/// Searches for the target role and returns up to `num_jobs` postings chosen by the
/// researcher.
pub async fn discover_jobs(
    llm: &dyn ChatModel,
    source: &dyn JobSource,
    candidate: &CandidateProfile,
    inputs: &CandidateInputs,
    date_posted: &str,
    num_jobs: usize,
) -> Result<Discovery, AppError> {
    let query = build_job_query(inputs, date_posted);
    info!(query = %query.query, remote_only = query.remote_only, source = source.name(), "Searching jobs");

    let listings = source.search(&query).await?;
    if listings.is_empty() {
        return Err(AppError::UnprocessableEntity(format!(
            "No job postings found for '{}'",
            inputs.target_role
        )));
    }

    let prompt = build_selection_prompt(candidate, inputs, &listings, num_jobs);
    let response: SelectionResponse =
        call_json(llm, &prompt, &JOB_MARKET_RESEARCHER.system_prompt())
            .await
            .map_err(|e| AppError::Llm(format!("Job discovery failed: {e}")))?;

    let recommended_ids: Vec<String> = response
        .recommended_jobs
        .iter()
        .filter_map(recommended_id)
        .collect();
    let (jobs, used_search_order) = select_jobs(&listings, &recommended_ids, num_jobs);
    if used_search_order {
        warn!(
            recommended = recommended_ids.len(),
            "Too few usable recommendations; keeping search order"
        );
    }

    info!(found = listings.len(), selected = jobs.len(), "Job discovery complete");
    Ok(Discovery {
        jobs,
        total_found: listings.len(),
        search_summary: response
            .search_summary
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("Found {} postings for '{}'", listings.len(), query.query)),
        used_search_order,
    })
}
