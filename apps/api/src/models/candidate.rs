use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Seniority levels, ordered from least to most senior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Entry,
    Junior,
    Mid,
    Senior,
    Lead,
    Principal,
}

impl ExperienceLevel {
    pub const ALL: [ExperienceLevel; 6] = [
        ExperienceLevel::Entry,
        ExperienceLevel::Junior,
        ExperienceLevel::Mid,
        ExperienceLevel::Senior,
        ExperienceLevel::Lead,
        ExperienceLevel::Principal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "entry",
            ExperienceLevel::Junior => "junior",
            ExperienceLevel::Mid => "mid",
            ExperienceLevel::Senior => "senior",
            ExperienceLevel::Lead => "lead",
            ExperienceLevel::Principal => "principal",
        }
    }

    /// Case- and whitespace-insensitive lookup. Returns `None` for unknown labels.
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_lowercase();
        Self::ALL.into_iter().find(|level| level.as_str() == raw)
    }

    /// Infers a level from total years of professional experience.
    pub fn from_years(years: f64) -> Self {
        if years < 1.0 {
            ExperienceLevel::Entry
        } else if years < 2.0 {
            ExperienceLevel::Junior
        } else if years < 5.0 {
            ExperienceLevel::Mid
        } else if years < 10.0 {
            ExperienceLevel::Senior
        } else {
            ExperienceLevel::Lead
        }
    }

    /// Signed number of levels `self` sits above `other`.
    pub fn steps_above(&self, other: ExperienceLevel) -> i32 {
        *self as i32 - other as i32
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    ProgrammingLanguage,
    Framework,
    Library,
    Tool,
    Platform,
    SoftSkill,
    DomainKnowledge,
    Database,
    Cloud,
    Devops,
    Methodology,
    Other,
}

/// Synonyms the analyst model tends to produce, mapped to a canonical category.
const CATEGORY_SYNONYMS: &[(&str, SkillCategory)] = &[
    ("ai_machine_learning", SkillCategory::DomainKnowledge),
    ("machine_learning", SkillCategory::DomainKnowledge),
    ("artificial_intelligence", SkillCategory::DomainKnowledge),
    ("ai", SkillCategory::DomainKnowledge),
    ("ml", SkillCategory::DomainKnowledge),
    ("data_science", SkillCategory::DomainKnowledge),
    ("data_analytics", SkillCategory::DomainKnowledge),
    ("nlp", SkillCategory::DomainKnowledge),
    ("computer_vision", SkillCategory::DomainKnowledge),
    ("framework_library", SkillCategory::Library),
    ("frameworks_libraries", SkillCategory::Library),
    ("web_development", SkillCategory::Framework),
    ("frontend", SkillCategory::Framework),
    ("backend", SkillCategory::Framework),
    ("web_framework", SkillCategory::Framework),
    ("tool_platform", SkillCategory::Tool),
    ("tools_platforms", SkillCategory::Tool),
    ("language", SkillCategory::ProgrammingLanguage),
    ("programming", SkillCategory::ProgrammingLanguage),
    ("api", SkillCategory::Tool),
    ("testing", SkillCategory::Methodology),
    ("agile", SkillCategory::Methodology),
    ("scrum", SkillCategory::Methodology),
    ("version_control", SkillCategory::Tool),
    ("containerization", SkillCategory::Devops),
    ("orchestration", SkillCategory::Devops),
    ("ci_cd", SkillCategory::Devops),
    ("infrastructure", SkillCategory::Cloud),
];

impl SkillCategory {
    pub const ALL: [SkillCategory; 12] = [
        SkillCategory::ProgrammingLanguage,
        SkillCategory::Framework,
        SkillCategory::Library,
        SkillCategory::Tool,
        SkillCategory::Platform,
        SkillCategory::SoftSkill,
        SkillCategory::DomainKnowledge,
        SkillCategory::Database,
        SkillCategory::Cloud,
        SkillCategory::Devops,
        SkillCategory::Methodology,
        SkillCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillCategory::ProgrammingLanguage => "programming_language",
            SkillCategory::Framework => "framework",
            SkillCategory::Library => "library",
            SkillCategory::Tool => "tool",
            SkillCategory::Platform => "platform",
            SkillCategory::SoftSkill => "soft_skill",
            SkillCategory::DomainKnowledge => "domain_knowledge",
            SkillCategory::Database => "database",
            SkillCategory::Cloud => "cloud",
            SkillCategory::Devops => "devops",
            SkillCategory::Methodology => "methodology",
            SkillCategory::Other => "other",
        }
    }

    /// Maps any free-form category label onto a known category. Never fails.
    pub fn normalize(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase().replace(['/', '-', ' '], "_");
        if let Some(category) = Self::ALL.into_iter().find(|c| c.as_str() == normalized) {
            return category;
        }
        CATEGORY_SYNONYMS
            .iter()
            .find(|(synonym, _)| *synonym == normalized)
            .map(|(_, category)| *category)
            .unwrap_or(SkillCategory::Other)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub category: SkillCategory,
    pub years_experience: Option<f64>,
    pub proficiency: Option<String>,
}

/// Structured representation of a candidate's resume, produced by the resume analyst.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub summary: String,
    pub skills: Vec<Skill>,
    pub total_years_experience: f64,
    pub experience_level: ExperienceLevel,
    pub previous_roles: Vec<String>,
    pub previous_companies: Vec<String>,
    pub education: Vec<String>,
    #[serde(skip_serializing)]
    #[serde(default)]
    pub raw_resume_text: String,
    pub analyzed_at: DateTime<Utc>,
}

impl CandidateProfile {
    /// Distinct skill names, lowercased.
    pub fn skill_names(&self) -> BTreeSet<String> {
        self.skills
            .iter()
            .map(|s| s.name.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn has_skill(&self, name: &str) -> bool {
        self.skill_names().contains(&name.trim().to_lowercase())
    }

    pub fn top_skills(&self, n: usize) -> Vec<String> {
        self.skills.iter().take(n).map(|s| s.name.clone()).collect()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown candidate")
    }
}
