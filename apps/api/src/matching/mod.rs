pub mod prompts;
pub mod ranking;
pub mod skill_matcher;

pub use ranking::rank_job_matches;
pub use skill_matcher::match_all;
