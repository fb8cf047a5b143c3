//! In-memory state for the multi-step form.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{CandidateInputs, LocationPreference, SelfReportedLevel, WorkPreference};
use crate::pipeline::PipelineReport;

pub const FIRST_STEP: u8 = 1;
pub const RESUME_STEP: u8 = 5;

/// Sessions untouched for longer than this are dropped when a new one starts.
const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{message}")]
    Invalid { step: u8, message: String },

    #[error("Step {0} is not complete")]
    Incomplete(u8),
}

impl FormError {
    pub fn step(&self) -> u8 {
        match self {
            FormError::Invalid { step, .. } => *step,
            FormError::Incomplete(step) => *step,
        }
    }
}

/// Answers collected so far. Fields are only set once their step validated.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    pub full_name: Option<String>,
    pub experience_level: Option<SelfReportedLevel>,
    pub work_preference: Option<WorkPreference>,
    pub location_preference: Option<LocationPreference>,
    pub country: Option<String>,
    pub target_role: Option<String>,
    pub report: Option<PipelineReport>,
}

fn invalid(step: u8, message: &str) -> FormError {
    FormError::Invalid {
        step,
        message: message.to_string(),
    }
}

fn non_blank(fields: &HashMap<String, String>, name: &str) -> Option<String> {
    fields
        .get(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl FormData {
    /// Validates the fields posted for `step` and stores them.
    /// Step 5 is the upload and is handled by the submit endpoint.
    pub fn apply(&mut self, step: u8, fields: &HashMap<String, String>) -> Result<(), FormError> {
        let value = |name: &str| fields.get(name).map(String::as_str).unwrap_or("");
        match step {
            1 => {
                let name = non_blank(fields, "full_name")
                    .ok_or_else(|| invalid(1, "Please enter your full name"))?;
                self.full_name = Some(name);
            }
            2 => {
                let level = SelfReportedLevel::from_value(value("experience_level"))
                    .ok_or_else(|| invalid(2, "Please select your experience level"))?;
                self.experience_level = Some(level);
            }
            3 => {
                let preference = WorkPreference::from_value(value("work_preference"))
                    .ok_or_else(|| invalid(3, "Please select a work preference"))?;
                if preference == WorkPreference::OnSite {
                    let country = non_blank(fields, "country")
                        .ok_or_else(|| invalid(3, "Please enter your country"))?;
                    self.location_preference = Some(
                        LocationPreference::from_value(value("location_preference"))
                            .unwrap_or(LocationPreference::OnlyMyCountry),
                    );
                    self.country = Some(country);
                } else {
                    self.location_preference = None;
                    self.country = None;
                }
                self.work_preference = Some(preference);
            }
            4 => {
                let role = non_blank(fields, "target_role")
                    .ok_or_else(|| invalid(4, "Please enter your target job role"))?;
                self.target_role = Some(role);
            }
            _ => return Err(FormError::Incomplete(step)),
        }
        Ok(())
    }

    /// The lowest step whose answer is still missing, or the upload step.
    pub fn first_incomplete_step(&self) -> u8 {
        if self.full_name.is_none() {
            1
        } else if self.experience_level.is_none() {
            2
        } else if self.work_preference.is_none() {
            3
        } else if self.target_role.is_none() {
            4
        } else {
            RESUME_STEP
        }
    }

    /// The answers as pipeline inputs, once steps 1 to 4 are done.
    pub fn complete(&self) -> Result<CandidateInputs, FormError> {
        let missing = || FormError::Incomplete(self.first_incomplete_step());
        let inputs = CandidateInputs {
            full_name: self.full_name.clone().ok_or_else(missing)?,
            experience_level: self.experience_level.ok_or_else(missing)?,
            work_preference: self.work_preference.ok_or_else(missing)?,
            location_preference: self.location_preference,
            country: self.country.clone(),
            target_role: self.target_role.clone().ok_or_else(missing)?,
        };
        inputs.validated().map_err(|e| FormError::Invalid {
            step: RESUME_STEP,
            message: e.0,
        })
    }
}

#[derive(Debug)]
struct Session {
    data: FormData,
    touched_at: DateTime<Utc>,
}

/// Form sessions keyed by id, shared across handlers.
#[derive(Clone, Default)]
pub struct FormSessions {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl FormSessions {
    /// Starts an empty session and drops expired ones.
    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let cutoff = now - Duration::hours(SESSION_TTL_HOURS);

        let mut sessions = self.inner.write().await;
        sessions.retain(|_, s| s.touched_at > cutoff);
        sessions.insert(
            id,
            Session {
                data: FormData::default(),
                touched_at: now,
            },
        );
        id
    }

    pub async fn get(&self, id: Uuid) -> Option<FormData> {
        self.inner.read().await.get(&id).map(|s| s.data.clone())
    }

    /// Runs `f` on the session's data. Returns `None` when the session is unknown.
    pub async fn update<R>(&self, id: Uuid, f: impl FnOnce(&mut FormData) -> R) -> Option<R> {
        let mut sessions = self.inner.write().await;
        let session = sessions.get_mut(&id)?;
        session.touched_at = Utc::now();
        Some(f(&mut session.data))
    }

    pub async fn remove(&self, id: Uuid) {
        self.inner.write().await.remove(&id);
    }
}
