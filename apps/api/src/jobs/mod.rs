pub mod client;
pub mod discovery;
pub mod prompts;
pub mod skills;

pub use client::{JSearchClient, JobSearchError, JobSource};
pub use discovery::{discover_jobs, Discovery};
