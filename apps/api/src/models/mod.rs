pub mod candidate;
pub mod inputs;
pub mod job;
pub mod matching;
pub mod ranking;

pub use candidate::{CandidateProfile, ExperienceLevel, Skill, SkillCategory};
pub use inputs::{CandidateInputs, LocationPreference, SelfReportedLevel, WorkPreference};
pub use job::JobPosting;
pub use matching::{JobMatchResult, MatchVerdict, SkillMatch};
pub use ranking::{JobRanking, RankedJob, Tier};
