pub mod analyst;
pub mod file_parser;
pub mod prompts;

pub use analyst::analyze_resume;
pub use file_parser::{extract_resume_text, ResumeParseError};
