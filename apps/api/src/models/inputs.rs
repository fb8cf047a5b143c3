use serde::{Deserialize, Serialize};

use crate::models::candidate::ExperienceLevel;

/// Experience band the candidate picks on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfReportedLevel {
    RecentGraduate,
    EntryLevel,
    MidLevel,
    Senior,
    LeadPrincipal,
}

impl SelfReportedLevel {
    pub const ALL: [SelfReportedLevel; 5] = [
        SelfReportedLevel::RecentGraduate,
        SelfReportedLevel::EntryLevel,
        SelfReportedLevel::MidLevel,
        SelfReportedLevel::Senior,
        SelfReportedLevel::LeadPrincipal,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SelfReportedLevel::RecentGraduate => "Recent Graduate (0-1 years)",
            SelfReportedLevel::EntryLevel => "Entry Level (1-2 years)",
            SelfReportedLevel::MidLevel => "Mid Level (2-5 years)",
            SelfReportedLevel::Senior => "Senior (5-10 years)",
            SelfReportedLevel::LeadPrincipal => "Lead/Principal (10+ years)",
        }
    }

    pub fn value(&self) -> &'static str {
        match self {
            SelfReportedLevel::RecentGraduate => "recent_graduate",
            SelfReportedLevel::EntryLevel => "entry_level",
            SelfReportedLevel::MidLevel => "mid_level",
            SelfReportedLevel::Senior => "senior",
            SelfReportedLevel::LeadPrincipal => "lead_principal",
        }
    }

    /// Parses the form value produced by `value`.
    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.value() == value.trim())
    }

    pub fn as_experience_level(&self) -> ExperienceLevel {
        match self {
            SelfReportedLevel::RecentGraduate => ExperienceLevel::Entry,
            SelfReportedLevel::EntryLevel => ExperienceLevel::Junior,
            SelfReportedLevel::MidLevel => ExperienceLevel::Mid,
            SelfReportedLevel::Senior => ExperienceLevel::Senior,
            SelfReportedLevel::LeadPrincipal => ExperienceLevel::Lead,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkPreference {
    Remote,
    Hybrid,
    OnSite,
}

impl WorkPreference {
    pub const ALL: [WorkPreference; 3] = [
        WorkPreference::Remote,
        WorkPreference::Hybrid,
        WorkPreference::OnSite,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            WorkPreference::Remote => "Remote",
            WorkPreference::Hybrid => "Hybrid",
            WorkPreference::OnSite => "On-Site",
        }
    }

    pub fn value(&self) -> &'static str {
        match self {
            WorkPreference::Remote => "remote",
            WorkPreference::Hybrid => "hybrid",
            WorkPreference::OnSite => "on_site",
        }
    }

    /// Parses the form value produced by `value`.
    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.value() == value.trim())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationPreference {
    OnlyMyCountry,
    OpenToRelocation,
}

impl LocationPreference {
    pub const ALL: [LocationPreference; 2] = [
        LocationPreference::OnlyMyCountry,
        LocationPreference::OpenToRelocation,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LocationPreference::OnlyMyCountry => "Only my country",
            LocationPreference::OpenToRelocation => "Open to relocation",
        }
    }

    pub fn value(&self) -> &'static str {
        match self {
            LocationPreference::OnlyMyCountry => "only_my_country",
            LocationPreference::OpenToRelocation => "open_to_relocation",
        }
    }

    /// Parses the form value produced by `value`.
    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.value() == value.trim())
    }
}

/// The validated form inputs that drive one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateInputs {
    pub full_name: String,
    pub experience_level: SelfReportedLevel,
    pub work_preference: WorkPreference,
    /// Only set for on-site searches.
    pub location_preference: Option<LocationPreference>,
    /// Only set for on-site searches.
    pub country: Option<String>,
    pub target_role: String,
}

/// A form input failed validation. The message is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct InputError(pub String);

impl CandidateInputs {
    /// Trims free-text fields and enforces the required-field rules.
    pub fn validated(mut self) -> Result<Self, InputError> {
        self.full_name = self.full_name.trim().to_string();
        self.target_role = self.target_role.trim().to_string();
        self.country = self
            .country
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        if self.full_name.is_empty() {
            return Err(InputError("Please enter your full name".to_string()));
        }
        if self.target_role.is_empty() {
            return Err(InputError("Please enter your target job role".to_string()));
        }
        if self.work_preference == WorkPreference::OnSite {
            if self.country.is_none() {
                return Err(InputError("Please enter your country".to_string()));
            }
            self.location_preference
                .get_or_insert(LocationPreference::OnlyMyCountry);
        } else {
            self.location_preference = None;
            self.country = None;
        }
        Ok(self)
    }
}
