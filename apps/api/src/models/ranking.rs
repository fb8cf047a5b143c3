use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::matching::JobMatchResult;

/// Priority tier assigned by the ranking stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    TopPriority,
    StrongContender,
    WorthConsidering,
    Backup,
}

impl Tier {
    pub fn from_score(score: f64) -> Self {
        if score >= 75.0 {
            Tier::TopPriority
        } else if score >= 60.0 {
            Tier::StrongContender
        } else if score >= 50.0 {
            Tier::WorthConsidering
        } else {
            Tier::Backup
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            Tier::TopPriority => 1,
            Tier::StrongContender => 2,
            Tier::WorthConsidering => 3,
            Tier::Backup => 4,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Tier::TopPriority),
            2 => Some(Tier::StrongContender),
            3 => Some(Tier::WorthConsidering),
            4 => Some(Tier::Backup),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Tier::TopPriority => "Top Priority",
            Tier::StrongContender => "Strong Contender",
            Tier::WorthConsidering => "Worth Considering",
            Tier::Backup => "Backup Option",
        }
    }

    pub fn default_action(&self) -> &'static str {
        match self {
            Tier::TopPriority => "Apply immediately",
            Tier::StrongContender => "Apply this week",
            Tier::WorthConsidering => "Consider applying",
            Tier::Backup => "Keep as backup",
        }
    }

    /// Accepts "TIER 1", "tier2", "Tier 3 - Worth Considering", "4", or a tier title.
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        let lower = raw.trim().to_lowercase();
        if let Some(digit) = lower
            .strip_prefix("tier")
            .unwrap_or(&lower)
            .trim_start()
            .chars()
            .next()
            .and_then(|c| c.to_digit(10))
        {
            return Tier::from_number(digit as u8);
        }
        [
            Tier::TopPriority,
            Tier::StrongContender,
            Tier::WorthConsidering,
            Tier::Backup,
        ]
        .into_iter()
        .find(|t| lower.contains(&t.title().to_lowercase()))
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TIER {}", self.number())
    }
}

impl Serialize for Tier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Tier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Tier::parse_lenient(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown tier '{raw}'")))
    }
}

/// One ranked opportunity.
#[derive(Debug, Clone, Serialize)]
pub struct RankedJob {
    pub rank: u32,
    pub tier: Tier,
    pub final_score: f64,
    pub ranking_rationale: String,
    pub action_recommendation: String,
    pub result: JobMatchResult,
}

/// Ordered recommendations produced by the ranking stage.
#[derive(Debug, Clone, Serialize)]
pub struct JobRanking {
    pub ranked_jobs: Vec<RankedJob>,
    pub overall_strategy: String,
    pub top_recommendation: String,
}

impl JobRanking {
    pub fn empty() -> Self {
        Self {
            ranked_jobs: vec![],
            overall_strategy: "No jobs to rank".to_string(),
            top_recommendation: "Search for more opportunities".to_string(),
        }
    }
}
