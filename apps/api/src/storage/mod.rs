//! Append-only CSV storage for candidates and their ranked results.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{CandidateInputs, JobRanking};
use crate::pipeline::report::CandidateSummary;

const CANDIDATES_FILE: &str = "candidates.csv";
const RESULTS_FILE: &str = "results.csv";

const CANDIDATE_HEADERS: [&str; 9] = [
    "timestamp",
    "full_name",
    "experience_level",
    "work_preference",
    "location",
    "country",
    "target_role",
    "skills_count",
    "total_experience_years",
];

const RESULT_HEADERS: [&str; 9] = [
    "timestamp",
    "candidate_name",
    "job_rank",
    "company",
    "job_title",
    "tier",
    "score",
    "action",
    "rationale",
];

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// One row of `candidates.csv`. Field order matches the header row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRow {
    pub timestamp: String,
    pub full_name: String,
    pub experience_level: String,
    pub work_preference: String,
    pub location: String,
    pub country: String,
    pub target_role: String,
    pub skills_count: usize,
    pub total_experience_years: f64,
}

/// One row of `results.csv`. Field order matches the header row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub timestamp: String,
    pub candidate_name: String,
    pub job_rank: u32,
    pub company: String,
    pub job_title: String,
    pub tier: String,
    pub score: f64,
    pub action: String,
    pub rationale: String,
}

pub struct CsvStorage {
    candidates_path: PathBuf,
    results_path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvStorage {
    /// Creates `data_dir` and both files (header row only) when they are missing.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)?;

        let storage = Self {
            candidates_path: data_dir.join(CANDIDATES_FILE),
            results_path: data_dir.join(RESULTS_FILE),
            write_lock: Mutex::new(()),
        };
        init_file(&storage.candidates_path, &CANDIDATE_HEADERS)?;
        init_file(&storage.results_path, &RESULT_HEADERS)?;

        info!(dir = %data_dir.display(), "CSV storage ready");
        Ok(storage)
    }

    pub fn save_candidate(
        &self,
        inputs: &CandidateInputs,
        candidate: &CandidateSummary,
    ) -> Result<CandidateRow, StorageError> {
        let row = CandidateRow {
            timestamp: timestamp(),
            full_name: inputs.full_name.clone(),
            experience_level: inputs.experience_level.label().to_string(),
            work_preference: inputs.work_preference.label().to_string(),
            location: inputs
                .location_preference
                .map(|l| l.label().to_string())
                .unwrap_or_default(),
            country: inputs.country.clone().unwrap_or_default(),
            target_role: inputs.target_role.clone(),
            skills_count: candidate.skills_count,
            total_experience_years: candidate.total_years,
        };
        self.append(&self.candidates_path, std::slice::from_ref(&row))?;
        debug!(candidate = %row.full_name, "Candidate saved");
        Ok(row)
    }

    /// Appends one row per ranked job. Returns the number of rows written.
    pub fn save_job_results(
        &self,
        candidate_name: &str,
        ranking: &JobRanking,
    ) -> Result<usize, StorageError> {
        let timestamp = timestamp();
        let rows: Vec<ResultRow> = ranking
            .ranked_jobs
            .iter()
            .map(|ranked| ResultRow {
                timestamp: timestamp.clone(),
                candidate_name: candidate_name.to_string(),
                job_rank: ranked.rank,
                company: ranked.result.job.company.clone(),
                job_title: ranked.result.job.title.clone(),
                tier: ranked.tier.to_string(),
                score: ranked.final_score,
                action: ranked.action_recommendation.clone(),
                rationale: ranked.ranking_rationale.clone(),
            })
            .collect();
        self.append(&self.results_path, &rows)?;
        debug!(candidate = candidate_name, rows = rows.len(), "Job results saved");
        Ok(rows.len())
    }

    pub fn read_candidates(&self) -> Result<Vec<CandidateRow>, StorageError> {
        read_rows(&self.candidates_path)
    }

    pub fn read_results(&self) -> Result<Vec<ResultRow>, StorageError> {
        read_rows(&self.results_path)
    }

    fn append<T: Serialize>(&self, path: &Path, rows: &[T]) -> Result<(), StorageError> {
        if rows.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let file = OpenOptions::new().append(true).open(path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn init_file(path: &Path, headers: &[&str]) -> Result<(), StorageError> {
    if path.exists() {
        return Ok(());
    }
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(headers)?;
    writer.flush()?;
    Ok(())
}

fn read_rows<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, StorageError> {
    let mut reader = ReaderBuilder::new().from_reader(File::open(path)?);
    reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .map_err(StorageError::from)
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::jobs::client::testing::posting;
    use crate::matching::ranking::rank_by_score;
    use crate::matching::skill_matcher::fixtures::candidate;
    use crate::models::{
        JobMatchResult, LocationPreference, MatchVerdict, SelfReportedLevel, WorkPreference,
    };

    fn inputs() -> CandidateInputs {
        CandidateInputs {
            full_name: "Ada Lovelace".to_string(),
            experience_level: SelfReportedLevel::MidLevel,
            work_preference: WorkPreference::OnSite,
            location_preference: Some(LocationPreference::OnlyMyCountry),
            country: Some("United Kingdom".to_string()),
            target_role: "Rust Engineer".to_string(),
        }
    }

    fn summary() -> CandidateSummary {
        CandidateSummary::from(&*candidate())
    }

    fn ranking() -> JobRanking {
        let candidate = candidate();
        let result = |id: &str, score: f64| JobMatchResult {
            candidate: Arc::clone(&candidate),
            job: posting(id, "Rust Engineer", &format!("Company, {id}"), &["Rust"]),
            skill_matches: vec![],
            overall_fit_score: score,
            skill_match_score: 40.0,
            experience_match_score: 20.0,
            strengths: vec![],
            gaps: vec![],
            recommendation: String::new(),
            explanation: String::new(),
            verdict: MatchVerdict::from_score(score),
            evaluated_at: Utc::now(),
        };
        rank_by_score(vec![result("a", 65.0), result("b", 81.0)])
    }

    #[test]
    fn test_open_creates_files_with_headers() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("nested").join("data");
        CsvStorage::open(&data_dir).unwrap();

        let candidates = fs::read_to_string(data_dir.join(CANDIDATES_FILE)).unwrap();
        assert_eq!(candidates.trim_end(), CANDIDATE_HEADERS.join(","));
        let results = fs::read_to_string(data_dir.join(RESULTS_FILE)).unwrap();
        assert_eq!(results.trim_end(), RESULT_HEADERS.join(","));
    }

    #[test]
    fn test_reopen_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CsvStorage::open(dir.path()).unwrap();
        storage.save_candidate(&inputs(), &summary()).unwrap();
        drop(storage);

        let storage = CsvStorage::open(dir.path()).unwrap();
        assert_eq!(storage.read_candidates().unwrap().len(), 1);
    }

    #[test]
    fn test_save_candidate_row() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CsvStorage::open(dir.path()).unwrap();
        let saved = storage.save_candidate(&inputs(), &summary()).unwrap();

        let rows = storage.read_candidates().unwrap();
        assert_eq!(rows, vec![saved]);
        assert_eq!(rows[0].experience_level, "Mid Level (2-5 years)");
        assert_eq!(rows[0].work_preference, "On-Site");
        assert_eq!(rows[0].location, "Only my country");
        assert_eq!(rows[0].country, "United Kingdom");
        assert_eq!(rows[0].skills_count, 2);
        assert_eq!(rows[0].total_experience_years, 4.0);
    }

    #[test]
    fn test_save_job_results_one_row_per_ranked_job() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CsvStorage::open(dir.path()).unwrap();
        let written = storage.save_job_results("Ada Lovelace", &ranking()).unwrap();
        assert_eq!(written, 2);

        let rows = storage.read_results().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].job_rank, 1);
        assert_eq!(rows[0].company, "Company, b");
        assert_eq!(rows[0].tier, "TIER 1");
        assert_eq!(rows[0].action, "Apply immediately");
        assert_eq!(rows[1].score, 65.0);
        assert_eq!(rows[0].timestamp, rows[1].timestamp);
    }

    #[test]
    fn test_appends_accumulate() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CsvStorage::open(dir.path()).unwrap();
        storage.save_job_results("Ada", &ranking()).unwrap();
        storage.save_job_results("Grace", &ranking()).unwrap();
        storage
            .save_job_results("Nobody", &JobRanking::empty())
            .unwrap();

        let rows = storage.read_results().unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[2].candidate_name, "Grace");
    }
}
