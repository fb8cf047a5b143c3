//! Runs the four stages in a fixed order: analyze, discover, match, rank.

use std::sync::Arc;

use chrono::Utc;
use tracing::error;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::discovery::build_job_query;
use crate::jobs::{discover_jobs, Discovery, JobSource};
use crate::llm_client::ChatModel;
use crate::matching::{match_all, rank_job_matches};
use crate::models::{CandidateInputs, CandidateProfile, JobMatchResult, JobRanking};
use crate::pipeline::report::{CandidateSummary, ExecutionLog, JobSearchSummary, PipelineReport};
use crate::resume::analyze_resume;

/// The job-search pipeline. Holds no per-run state and is shared across requests.
pub struct JobSearchPipeline {
    llm: Arc<dyn ChatModel>,
    jobs: Arc<dyn JobSource>,
    num_jobs: usize,
    date_posted: String,
}

impl JobSearchPipeline {
    pub fn new(
        llm: Arc<dyn ChatModel>,
        jobs: Arc<dyn JobSource>,
        num_jobs: usize,
        date_posted: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            jobs,
            num_jobs: num_jobs.max(1),
            date_posted: date_posted.into(),
        }
    }

    pub fn llm(&self) -> &dyn ChatModel {
        self.llm.as_ref()
    }

    pub fn job_source(&self) -> &dyn JobSource {
        self.jobs.as_ref()
    }

    pub fn date_posted(&self) -> &str {
        &self.date_posted
    }

    /// Step 1: resume text to candidate profile.
    pub async fn analyze(
        &self,
        resume_text: &str,
        log: &mut ExecutionLog,
    ) -> Result<CandidateProfile, AppError> {
        log.record("Step 1/5: Analyzing resume...");
        let profile = analyze_resume(self.llm(), resume_text).await?;
        log.record(format!("Resume analyzed: {}", profile.display_name()));
        log.record(format!("   Skills: {}", profile.skills.len()));
        log.record(format!("   Experience: {}", profile.experience_level));
        Ok(profile)
    }

    /// Step 2: search and select postings for the target role.
    pub async fn find(
        &self,
        candidate: &CandidateProfile,
        inputs: &CandidateInputs,
        log: &mut ExecutionLog,
    ) -> Result<Discovery, AppError> {
        log.record(format!(
            "Step 2/5: Searching for '{}' jobs...",
            inputs.target_role
        ));
        let discovery = discover_jobs(
            self.llm(),
            self.job_source(),
            candidate,
            inputs,
            &self.date_posted,
            self.num_jobs,
        )
        .await?;
        log.record(format!(
            "Found {} job opportunities ({} listings searched)",
            discovery.jobs.len(),
            discovery.total_found
        ));
        Ok(discovery)
    }

    /// Step 3: score the candidate against every selected posting.
    pub async fn match_jobs(
        &self,
        candidate: Arc<CandidateProfile>,
        discovery: &Discovery,
        log: &mut ExecutionLog,
    ) -> Result<Vec<JobMatchResult>, AppError> {
        log.record(format!(
            "Step 3/5: Matching candidate to {} jobs...",
            discovery.jobs.len()
        ));
        let results = match_all(self.llm(), candidate, &discovery.jobs).await?;
        for (i, result) in results.iter().enumerate() {
            log.record(format!(
                "   Job {}/{}: {} scored {}/100",
                i + 1,
                results.len(),
                result.job.title,
                result.overall_fit_score
            ));
        }
        log.record(format!("Completed {} job matches", results.len()));
        Ok(results)
    }

    /// Step 4: order the results into tiers.
    pub async fn rank(
        &self,
        results: Vec<JobMatchResult>,
        log: &mut ExecutionLog,
    ) -> Result<JobRanking, AppError> {
        log.record(format!(
            "Step 4/5: Ranking {} opportunities...",
            results.len()
        ));
        let ranking = rank_job_matches(self.llm(), results).await?;
        log.record("Jobs ranked and prioritized");
        Ok(ranking)
    }

    /// Runs every step and assembles the report. The first failing step ends the run.
    pub async fn run(
        &self,
        inputs: &CandidateInputs,
        resume_text: &str,
    ) -> Result<PipelineReport, AppError> {
        let mut log = ExecutionLog::default();
        let run_id = Uuid::new_v4();
        log.record(format!(
            "Starting job search pipeline (run {run_id}, model {})",
            self.llm.model_name()
        ));

        match self.run_steps(inputs, resume_text, run_id, &mut log).await {
            Ok(report) => Ok(report),
            Err(err) => {
                error!(%run_id, "Pipeline failed: {err}");
                Err(err)
            }
        }
    }

    async fn run_steps(
        &self,
        inputs: &CandidateInputs,
        resume_text: &str,
        run_id: Uuid,
        log: &mut ExecutionLog,
    ) -> Result<PipelineReport, AppError> {
        let candidate = Arc::new(self.analyze(resume_text, log).await?);
        let level_gap = candidate
            .experience_level
            .steps_above(inputs.experience_level.as_experience_level());
        if level_gap != 0 {
            log.record(format!(
                "   Resume suggests {} level; self-reported {}",
                candidate.experience_level,
                inputs.experience_level.label()
            ));
        }
        let discovery = self.find(&candidate, inputs, log).await?;
        let results = self
            .match_jobs(Arc::clone(&candidate), &discovery, log)
            .await?;

        let job_search = JobSearchSummary {
            query: build_job_query(inputs, &self.date_posted).query,
            listings_found: discovery.total_found,
            jobs_found: discovery.jobs.len(),
            jobs_matched: results.len(),
            average_score: JobSearchSummary::average_score(&results),
            search_summary: discovery.search_summary.clone(),
        };
        let ranking = self.rank(results, log).await?;

        log.record("Step 5/5: Generating final report...");
        let mut candidate_summary = CandidateSummary::from(candidate.as_ref());
        if candidate_summary.name.is_none() {
            candidate_summary.name = Some(inputs.full_name.clone());
        }
        log.record("Pipeline completed successfully");

        Ok(PipelineReport {
            run_id,
            candidate: candidate_summary,
            job_search,
            ranking,
            execution_log: std::mem::take(log),
            generated_at: Utc::now(),
        })
    }
}
