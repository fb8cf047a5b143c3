use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::candidate::CandidateProfile;
use crate::models::job::JobPosting;

pub const MAX_OVERALL_SCORE: f64 = 100.0;
pub const MAX_SKILL_SCORE: f64 = 60.0;
pub const MAX_EXPERIENCE_SCORE: f64 = 30.0;

/// How one required or preferred skill of a posting lines up with the candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatch {
    pub skill_name: String,
    pub candidate_has: bool,
    pub candidate_years: Option<f64>,
    pub required_years: Option<f64>,
    /// 0.0 = no match, 1.0 = perfect match
    pub match_strength: f64,
    pub is_required: bool,
}

/// Score band used for the human-readable recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchVerdict {
    Strong,
    Good,
    Moderate,
    Weak,
}

impl MatchVerdict {
    pub fn from_score(score: f64) -> Self {
        if score >= 75.0 {
            MatchVerdict::Strong
        } else if score >= 60.0 {
            MatchVerdict::Good
        } else if score >= 50.0 {
            MatchVerdict::Moderate
        } else {
            MatchVerdict::Weak
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchVerdict::Strong => "Strong Match - Recommend Interview",
            MatchVerdict::Good => "Good Match - Consider for Interview",
            MatchVerdict::Moderate => "Moderate Match - Review Carefully",
            MatchVerdict::Weak => "Weak Match - Likely Not Suitable",
        }
    }
}

/// Complete evaluation of one candidate against one posting.
///
/// The candidate is shared across every result of a pipeline run and is not repeated
/// when results are serialized.
#[derive(Debug, Clone, Serialize)]
pub struct JobMatchResult {
    #[serde(skip_serializing)]
    pub candidate: Arc<CandidateProfile>,
    pub job: JobPosting,
    pub skill_matches: Vec<SkillMatch>,
    pub overall_fit_score: f64,
    pub skill_match_score: f64,
    pub experience_match_score: f64,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
    pub recommendation: String,
    pub explanation: String,
    pub verdict: MatchVerdict,
    pub evaluated_at: DateTime<Utc>,
}

impl JobMatchResult {
    pub fn matched_skills(&self) -> Vec<&str> {
        self.skill_matches
            .iter()
            .filter(|m| m.candidate_has)
            .map(|m| m.skill_name.as_str())
            .collect()
    }

    pub fn missing_skills(&self) -> Vec<&str> {
        self.skill_matches
            .iter()
            .filter(|m| !m.candidate_has)
            .map(|m| m.skill_name.as_str())
            .collect()
    }
}
