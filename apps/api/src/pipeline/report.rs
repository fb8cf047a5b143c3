use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::models::{CandidateProfile, ExperienceLevel, JobMatchResult, JobRanking};

/// Number of skills listed in the candidate summary.
const TOP_SKILLS: usize = 5;

/// Timestamped, human-readable record of one pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ExecutionLog(Vec<String>);

impl ExecutionLog {
    /// Appends `[HH:MM:SS] message` and mirrors it to the tracing log.
    pub fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(target: "jobscout_api::pipeline", "{message}");
        self.0
            .push(format!("[{}] {message}", Utc::now().format("%H:%M:%S")));
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSummary {
    pub name: Option<String>,
    pub email: Option<String>,
    pub experience_level: ExperienceLevel,
    pub total_years: f64,
    pub skills_count: usize,
    pub top_skills: Vec<String>,
    pub summary: String,
}

impl From<&CandidateProfile> for CandidateSummary {
    fn from(profile: &CandidateProfile) -> Self {
        Self {
            name: profile.name.clone(),
            email: profile.email.clone(),
            experience_level: profile.experience_level,
            total_years: profile.total_years_experience,
            skills_count: profile.skills.len(),
            top_skills: profile.top_skills(TOP_SKILLS),
            summary: profile.summary.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSearchSummary {
    pub query: String,
    /// Listings the job source returned before selection.
    pub listings_found: usize,
    /// Listings carried into matching.
    pub jobs_found: usize,
    pub jobs_matched: usize,
    pub average_score: f64,
    pub search_summary: String,
}

impl JobSearchSummary {
    /// Mean overall fit score, or 0 with no results.
    pub fn average_score(results: &[JobMatchResult]) -> f64 {
        if results.is_empty() {
            return 0.0;
        }
        let total: f64 = results.iter().map(|r| r.overall_fit_score).sum();
        total / results.len() as f64
    }
}

/// Everything a pipeline run produced, ready for the results page or the JSON API.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub candidate: CandidateSummary,
    pub job_search: JobSearchSummary,
    pub ranking: JobRanking,
    pub execution_log: ExecutionLog,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::skill_matcher::fixtures::candidate;

    #[test]
    fn test_log_entries_are_timestamped() {
        let mut log = ExecutionLog::default();
        log.record("Step 1/5: Analyzing resume...");
        let entry = &log.entries()[0];
        assert!(entry.starts_with('['));
        assert_eq!(&entry[9..11], "] ");
        assert!(entry.ends_with("Analyzing resume..."));
    }

    #[test]
    fn test_log_serializes_as_plain_list() {
        let mut log = ExecutionLog::default();
        log.record("one");
        log.record("two");
        let value = serde_json::to_value(&log).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_candidate_summary_from_profile() {
        let summary = CandidateSummary::from(&*candidate());
        assert_eq!(summary.skills_count, 2);
        assert_eq!(summary.top_skills, vec!["Rust", "Docker"]);
        assert_eq!(summary.experience_level, ExperienceLevel::Mid);
    }

    #[test]
    fn test_average_score_of_nothing_is_zero() {
        assert_eq!(JobSearchSummary::average_score(&[]), 0.0);
    }
}
