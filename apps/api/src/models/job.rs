use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::candidate::ExperienceLevel;

/// A job opportunity, normalized from a job-search listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: String,
    pub required_skills: Vec<String>,
    pub preferred_skills: Vec<String>,
    pub experience_level: ExperienceLevel,
    pub salary_range: Option<String>,
    pub remote_policy: Option<String>,
    pub employment_type: Option<String>,
    pub posted_date: Option<DateTime<Utc>>,
    pub url: Option<String>,
    /// Which job source produced this listing, e.g. "jsearch".
    pub source: String,
}

/// Title keywords that signal seniority, checked in order.
const TITLE_LEVEL_HINTS: &[(&str, ExperienceLevel)] = &[
    ("principal", ExperienceLevel::Principal),
    ("staff", ExperienceLevel::Principal),
    ("lead", ExperienceLevel::Lead),
    ("head of", ExperienceLevel::Lead),
    ("senior", ExperienceLevel::Senior),
    ("sr.", ExperienceLevel::Senior),
    ("sr ", ExperienceLevel::Senior),
    ("junior", ExperienceLevel::Junior),
    ("jr.", ExperienceLevel::Junior),
    ("jr ", ExperienceLevel::Junior),
    ("internship", ExperienceLevel::Entry),
    ("intern ", ExperienceLevel::Entry),
    ("graduate", ExperienceLevel::Entry),
    ("entry", ExperienceLevel::Entry),
];

impl JobPosting {
    /// Infers the seniority a posting asks for from its title; `Mid` when nothing matches.
    pub fn infer_level_from_title(title: &str) -> ExperienceLevel {
        let title = format!("{} ", title.to_lowercase());
        TITLE_LEVEL_HINTS
            .iter()
            .find(|(hint, _)| title.contains(hint))
            .map(|(_, level)| *level)
            .unwrap_or(ExperienceLevel::Mid)
    }
}
