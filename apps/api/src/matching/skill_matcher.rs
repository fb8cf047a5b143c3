//! Skill matcher: scores one candidate against one posting with explicit rules.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::{
    call_json, lenient_f64, lenient_string, null_as_default, string_list, ChatModel, LlmError,
};
use crate::matching::prompts::{SKILL_MATCHER, SKILL_MATCH_PROMPT_TEMPLATE};
use crate::models::matching::{MAX_EXPERIENCE_SCORE, MAX_OVERALL_SCORE, MAX_SKILL_SCORE};
use crate::models::{CandidateProfile, JobMatchResult, JobPosting, MatchVerdict, SkillMatch};

#[derive(Debug, Deserialize)]
struct RawMatch {
    #[serde(default, deserialize_with = "null_as_default")]
    skill_matches: Vec<RawSkillMatch>,
    #[serde(default)]
    overall_fit_score: Option<Value>,
    #[serde(default)]
    skill_match_score: Option<Value>,
    #[serde(default)]
    experience_match_score: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    strengths: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    gaps: Vec<Value>,
    #[serde(default)]
    recommendation: Option<Value>,
    #[serde(default)]
    explanation: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawSkillMatch {
    #[serde(default)]
    skill_name: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    candidate_has: bool,
    #[serde(default)]
    candidate_years: Option<Value>,
    #[serde(default)]
    required_years: Option<Value>,
    #[serde(default)]
    match_strength: Option<Value>,
    #[serde(default = "default_true", deserialize_with = "lenient_bool_or_true")]
    is_required: bool,
}

fn default_true() -> bool {
    true
}

fn lenient_bool_or_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

/// Reads a required score and checks it lies within `0..=max`.
fn score(field: &str, value: Option<&Value>, max: f64) -> Result<f64, LlmError> {
    let score = value
        .and_then(lenient_f64)
        .ok_or_else(|| LlmError::InvalidOutput(format!("{field} is missing or not a number")))?;
    if !(0.0..=max).contains(&score) {
        return Err(LlmError::InvalidOutput(format!(
            "{field} must be between 0 and {max} (got {score})"
        )));
    }
    Ok(score)
}

impl RawSkillMatch {
    fn into_skill_match(self) -> Result<Option<SkillMatch>, LlmError> {
        let Some(skill_name) = lenient_string(self.skill_name.as_ref()) else {
            return Ok(None);
        };
        let match_strength = match self.match_strength.as_ref() {
            None | Some(Value::Null) => {
                if self.candidate_has {
                    1.0
                } else {
                    0.0
                }
            }
            Some(value) => score(&format!("match_strength for '{skill_name}'"), Some(value), 1.0)?,
        };
        Ok(Some(SkillMatch {
            skill_name,
            candidate_has: self.candidate_has,
            candidate_years: self.candidate_years.as_ref().and_then(lenient_f64),
            required_years: self.required_years.as_ref().and_then(lenient_f64),
            match_strength,
            is_required: self.is_required,
        }))
    }
}

impl RawMatch {
    fn into_result(
        self,
        candidate: Arc<CandidateProfile>,
        job: &JobPosting,
    ) -> Result<JobMatchResult, LlmError> {
        let overall_fit_score = score(
            "overall_fit_score",
            self.overall_fit_score.as_ref(),
            MAX_OVERALL_SCORE,
        )?;
        let skill_match_score = score(
            "skill_match_score",
            self.skill_match_score.as_ref(),
            MAX_SKILL_SCORE,
        )?;
        let experience_match_score = score(
            "experience_match_score",
            self.experience_match_score.as_ref(),
            MAX_EXPERIENCE_SCORE,
        )?;

        let mut skill_matches = Vec::with_capacity(self.skill_matches.len());
        for raw in self.skill_matches {
            if let Some(skill_match) = raw.into_skill_match()? {
                skill_matches.push(skill_match);
            }
        }

        let verdict = MatchVerdict::from_score(overall_fit_score);
        Ok(JobMatchResult {
            candidate,
            job: job.clone(),
            skill_matches,
            overall_fit_score,
            skill_match_score,
            experience_match_score,
            strengths: string_list(&self.strengths),
            gaps: string_list(&self.gaps),
            recommendation: lenient_string(self.recommendation.as_ref())
                .unwrap_or_else(|| verdict.label().to_string()),
            explanation: lenient_string(self.explanation.as_ref()).unwrap_or_default(),
            verdict,
            evaluated_at: Utc::now(),
        })
    }
}

fn format_candidate_skills(candidate: &CandidateProfile) -> String {
    candidate
        .skills
        .iter()
        .map(|skill| {
            format!(
                "  - {} ({}): {} years, {} proficiency",
                skill.name,
                skill.category.as_str(),
                skill
                    .years_experience
                    .map(|y| y.to_string())
                    .unwrap_or_else(|| "unspecified".to_string()),
                skill.proficiency.as_deref().unwrap_or("unspecified"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

pub fn build_match_prompt(candidate: &CandidateProfile, job: &JobPosting) -> String {
    SKILL_MATCH_PROMPT_TEMPLATE
        .replace("{candidate_name}", candidate.display_name())
        .replace("{candidate_level}", candidate.experience_level.as_str())
        .replace(
            "{candidate_years}",
            &candidate.total_years_experience.to_string(),
        )
        .replace("{candidate_skills}", &format_candidate_skills(candidate))
        .replace("{job_title}", &job.title)
        .replace("{job_company}", &job.company)
        .replace("{job_level}", job.experience_level.as_str())
        .replace("{required_skills}", &join_or(&job.required_skills, "Not listed"))
        .replace("{preferred_skills}", &join_or(&job.preferred_skills, "None"))
        .replace("{job_description}", &job.description)
}

/// Scores one candidate against one posting.
pub async fn match_candidate_to_job(
    llm: &dyn ChatModel,
    candidate: Arc<CandidateProfile>,
    job: &JobPosting,
) -> Result<JobMatchResult, AppError> {
    let prompt = build_match_prompt(&candidate, job);
    let raw: RawMatch = call_json(llm, &prompt, &SKILL_MATCHER.system_prompt())
        .await
        .map_err(|e| match_error(job, e))?;
    let result = raw
        .into_result(candidate, job)
        .map_err(|e| match_error(job, e))?;

    let gap = result.overall_fit_score
        - (result.skill_match_score + result.experience_match_score);
    if !(0.0..=10.0).contains(&gap) {
        warn!(
            job_id = %job.job_id,
            overall = result.overall_fit_score,
            skills = result.skill_match_score,
            experience = result.experience_match_score,
            "Overall score does not follow the section scores"
        );
    }
    for skill in &result.skill_matches {
        if !skill.candidate_has && result.candidate.has_skill(&skill.skill_name) {
            warn!(
                job_id = %job.job_id,
                skill = %skill.skill_name,
                "Skill listed on the resume was marked as missing"
            );
        }
    }

    info!(
        job_id = %job.job_id,
        title = %job.title,
        score = result.overall_fit_score,
        verdict = ?result.verdict,
        "Job matched"
    );
    Ok(result)
}

/// Scores every posting in order, one call at a time. The first failure aborts the run.
pub async fn match_all(
    llm: &dyn ChatModel,
    candidate: Arc<CandidateProfile>,
    jobs: &[JobPosting],
) -> Result<Vec<JobMatchResult>, AppError> {
    let mut results = Vec::with_capacity(jobs.len());
    for job in jobs {
        results.push(match_candidate_to_job(llm, Arc::clone(&candidate), job).await?);
    }
    Ok(results)
}

fn match_error(job: &JobPosting, err: LlmError) -> AppError {
    AppError::Llm(format!(
        "Skill matching failed for '{}' at {}: {err}",
        job.title, job.company
    ))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::models::{ExperienceLevel, Skill, SkillCategory};

    pub fn candidate() -> Arc<CandidateProfile> {
        Arc::new(CandidateProfile {
            name: Some("Ada Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            summary: "Backend engineer".to_string(),
            skills: vec![
                Skill {
                    name: "Rust".to_string(),
                    category: SkillCategory::ProgrammingLanguage,
                    years_experience: Some(4.0),
                    proficiency: Some("advanced".to_string()),
                },
                Skill {
                    name: "Docker".to_string(),
                    category: SkillCategory::Devops,
                    years_experience: None,
                    proficiency: None,
                },
            ],
            total_years_experience: 4.0,
            experience_level: ExperienceLevel::Mid,
            previous_roles: vec!["Backend Engineer".to_string()],
            previous_companies: vec!["Analytical Engines".to_string()],
            education: vec![],
            raw_resume_text: String::new(),
            analyzed_at: Utc::now(),
        })
    }

    pub fn match_json(overall: f64) -> String {
        serde_json::json!({
            "skill_matches": [
                {"skill_name": "Rust", "candidate_has": true, "candidate_years": 4, "required_years": 3, "match_strength": 1.0, "is_required": true},
                {"skill_name": "Kubernetes", "candidate_has": false, "match_strength": 0.0}
            ],
            "overall_fit_score": overall,
            "skill_match_score": (overall * 0.6).min(60.0),
            "experience_match_score": (overall * 0.3).min(30.0),
            "strengths": ["Deep Rust experience"],
            "gaps": ["No Kubernetes"],
            "recommendation": "",
            "explanation": "Solid technical fit."
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{candidate, match_json};
    use super::*;
    use crate::jobs::client::testing::posting;
    use crate::llm_client::testing::ScriptedModel;

    #[tokio::test]
    async fn test_match_result_built_from_model_output() {
        let llm = ScriptedModel::new([match_json(80.0)]);
        let job = posting("job-1", "Rust Engineer", "Ferrous Systems", &["Rust", "Kubernetes"]);

        let result = match_candidate_to_job(&llm, candidate(), &job).await.unwrap();

        assert_eq!(result.overall_fit_score, 80.0);
        assert_eq!(result.matched_skills(), vec!["Rust"]);
        assert_eq!(result.missing_skills(), vec!["Kubernetes"]);
        assert!(result.skill_matches[1].is_required);
        assert_eq!(result.verdict, MatchVerdict::Strong);
        assert_eq!(result.recommendation, "Strong Match - Recommend Interview");
        assert_eq!(result.job.job_id, "job-1");
    }

    #[tokio::test]
    async fn test_prompt_contains_candidate_and_job_details() {
        let llm = ScriptedModel::new([match_json(60.0)]);
        let job = posting("job-1", "Rust Engineer", "Ferrous Systems", &["Rust", "Kubernetes"]);
        match_candidate_to_job(&llm, candidate(), &job).await.unwrap();

        let prompt = llm.last_prompt();
        assert!(prompt.contains("Rust (programming_language): 4 years, advanced proficiency"));
        assert!(prompt.contains("Docker (devops): unspecified years"));
        assert!(prompt.contains("Required Skills: Rust, Kubernetes"));
        assert!(prompt.contains("Preferred Skills: None"));
        assert!(!prompt.contains("{job_title}"));
        assert!(!prompt.contains("{candidate_skills}"));
    }

    #[tokio::test]
    async fn test_out_of_range_overall_score_rejected() {
        let llm = ScriptedModel::new([r#"{"overall_fit_score": 140, "skill_match_score": 60, "experience_match_score": 30}"#]);
        let job = posting("job-1", "Rust Engineer", "Ferrous", &["Rust"]);
        let err = match_candidate_to_job(&llm, candidate(), &job).await.unwrap_err();
        assert!(matches!(err, AppError::Llm(ref m) if m.contains("overall_fit_score")));
    }

    #[tokio::test]
    async fn test_out_of_range_section_score_rejected() {
        let llm = ScriptedModel::new([r#"{"overall_fit_score": 90, "skill_match_score": 75, "experience_match_score": 10}"#]);
        let job = posting("job-1", "Rust Engineer", "Ferrous", &["Rust"]);
        assert!(match_candidate_to_job(&llm, candidate(), &job).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_score_rejected() {
        let llm = ScriptedModel::new([r#"{"skill_match_score": 40, "experience_match_score": 20}"#]);
        let job = posting("job-1", "Rust Engineer", "Ferrous", &["Rust"]);
        assert!(match_candidate_to_job(&llm, candidate(), &job).await.is_err());
    }

    #[tokio::test]
    async fn test_string_scores_and_bad_match_strength() {
        let llm = ScriptedModel::new([r#"{
            "skill_matches": [{"skill_name": "Rust", "candidate_has": true, "match_strength": 1.7}],
            "overall_fit_score": "70", "skill_match_score": "40", "experience_match_score": "20"
        }"#]);
        let job = posting("job-1", "Rust Engineer", "Ferrous", &["Rust"]);
        let err = match_candidate_to_job(&llm, candidate(), &job).await.unwrap_err();
        assert!(matches!(err, AppError::Llm(ref m) if m.contains("match_strength")));
    }

    #[tokio::test]
    async fn test_match_all_keeps_order_and_shares_candidate() {
        let llm = ScriptedModel::new([match_json(55.0), match_json(90.0)]);
        let jobs = vec![
            posting("a", "Rust Engineer", "First", &["Rust"]),
            posting("b", "Platform Engineer", "Second", &["Docker"]),
        ];
        let candidate = candidate();
        let results = match_all(&llm, Arc::clone(&candidate), &jobs).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].job.job_id, "a");
        assert_eq!(results[1].overall_fit_score, 90.0);
        assert!(Arc::ptr_eq(&results[0].candidate, &candidate));
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_match_all_stops_at_first_failure() {
        let llm = ScriptedModel::new([match_json(55.0), "not json at all".to_string()]);
        let jobs = vec![
            posting("a", "Rust Engineer", "First", &["Rust"]),
            posting("b", "Platform Engineer", "Second", &["Docker"]),
            posting("c", "SRE", "Third", &["Docker"]),
        ];
        let err = match_all(&llm, candidate(), &jobs).await.unwrap_err();
        assert!(matches!(err, AppError::Llm(ref m) if m.contains("Platform Engineer")));
        assert_eq!(llm.call_count(), 2);
    }
}
