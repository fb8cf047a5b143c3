pub mod handlers;
pub mod orchestrator;
pub mod report;

pub use orchestrator::JobSearchPipeline;
pub use report::PipelineReport;
