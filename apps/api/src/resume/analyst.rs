//! Resume analyst: turns raw resume text into a validated `CandidateProfile`.

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::llm_client::prompts::NO_INVENTION_INSTRUCTION;
use crate::llm_client::{
    call_json, lenient_f64, lenient_string, null_as_default, string_list, ChatModel, LlmError,
};
use crate::models::{CandidateProfile, ExperienceLevel, Skill, SkillCategory};
use crate::resume::prompts::{RESUME_ANALYSIS_PROMPT_TEMPLATE, RESUME_ANALYST};

/// Profile as the model writes it. Every field is optional or defaulted so that one
/// sloppy field does not sink the whole analysis; `into_profile` enforces the rules.
#[derive(Debug, Default, Deserialize)]
struct RawProfile {
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    email: Option<Value>,
    #[serde(default)]
    summary: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    skills: Vec<Value>,
    #[serde(default)]
    total_years_experience: Option<Value>,
    #[serde(default)]
    experience_level: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    previous_roles: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    previous_companies: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    education: Vec<Value>,
}

impl RawProfile {
    fn into_profile(self, resume_text: &str) -> Result<CandidateProfile, LlmError> {
        let skills: Vec<Skill> = self.skills.iter().filter_map(skill_from_value).collect();
        if skills.is_empty() {
            return Err(LlmError::InvalidOutput(
                "candidate profile must list at least one skill".to_string(),
            ));
        }

        let total_years_experience = match self.total_years_experience.as_ref() {
            None | Some(Value::Null) => 0.0,
            Some(value) => lenient_f64(value).ok_or_else(|| {
                LlmError::InvalidOutput(format!("total_years_experience is not a number: {value}"))
            })?,
        };
        if total_years_experience < 0.0 {
            return Err(LlmError::InvalidOutput(format!(
                "total_years_experience cannot be negative (got {total_years_experience})"
            )));
        }

        let experience_level = lenient_string(self.experience_level.as_ref())
            .and_then(|raw| ExperienceLevel::parse_lenient(&raw))
            .unwrap_or_else(|| ExperienceLevel::from_years(total_years_experience));

        Ok(CandidateProfile {
            name: lenient_string(self.name.as_ref()),
            email: lenient_string(self.email.as_ref()),
            summary: lenient_string(self.summary.as_ref()).unwrap_or_default(),
            skills,
            total_years_experience,
            experience_level,
            previous_roles: string_list(&self.previous_roles),
            previous_companies: string_list(&self.previous_companies),
            education: string_list(&self.education),
            raw_resume_text: resume_text.to_string(),
            analyzed_at: Utc::now(),
        })
    }
}

/// Accepts either a bare skill name or a `{name, category, years_experience, proficiency}`
/// object. Nameless entries are dropped.
fn skill_from_value(value: &Value) -> Option<Skill> {
    match value {
        Value::Object(map) => {
            let name = lenient_string(map.get("name"))?;
            let category = lenient_string(map.get("category"))
                .map(|c| SkillCategory::normalize(&c))
                .unwrap_or(SkillCategory::Other);
            let years_experience = map
                .get("years_experience")
                .and_then(lenient_f64)
                .filter(|years| *years >= 0.0);
            Some(Skill {
                name,
                category,
                years_experience,
                proficiency: lenient_string(map.get("proficiency"))
                    .map(|p| p.to_lowercase()),
            })
        }
        other => lenient_string(Some(other)).map(|name| Skill {
            name,
            category: SkillCategory::Other,
            years_experience: None,
            proficiency: None,
        }),
    }
}

pub fn build_analysis_prompt(resume_text: &str) -> String {
    RESUME_ANALYSIS_PROMPT_TEMPLATE
        .replace("{resume_text}", resume_text)
        .replace("{no_invention}", NO_INVENTION_INSTRUCTION)
}

/// Sends resume text to the analyst and validates the structured profile it returns.
pub async fn analyze_resume(
    llm: &dyn ChatModel,
    resume_text: &str,
) -> Result<CandidateProfile, AppError> {
    let resume_text = resume_text.trim();
    if resume_text.is_empty() {
        return Err(AppError::Validation("Resume text is empty".to_string()));
    }

    let prompt = build_analysis_prompt(resume_text);
    let raw: RawProfile = call_json(llm, &prompt, &RESUME_ANALYST.system_prompt())
        .await
        .map_err(|e| AppError::Llm(format!("Resume analysis failed: {e}")))?;
    let profile = raw
        .into_profile(resume_text)
        .map_err(|e| AppError::Llm(format!("Resume analysis failed: {e}")))?;

    debug!(skills = ?profile.top_skills(5), "Extracted skills");
    info!(
        candidate = profile.display_name(),
        skills = profile.skills.len(),
        years = profile.total_years_experience,
        level = %profile.experience_level,
        "Resume analyzed"
    );
    Ok(profile)
}
