//! Ranking: orders match results into tiers with an action for each.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::llm_client::{call_json, lenient_f64, lenient_string, null_as_default, ChatModel};
use crate::matching::prompts::{CAREER_ADVISOR, RANKING_PROMPT_TEMPLATE};
use crate::models::matching::MAX_OVERALL_SCORE;
use crate::models::{JobMatchResult, JobRanking, RankedJob, Tier};

/// A lone match at or above this score is ranked TIER 1.
const SINGLE_JOB_TOP_TIER_SCORE: f64 = 70.0;

#[derive(Debug, Default, Deserialize)]
struct RawRanking {
    #[serde(default, deserialize_with = "null_as_default")]
    ranked_jobs: Vec<Value>,
    #[serde(default)]
    overall_strategy: Option<Value>,
    #[serde(default)]
    top_recommendation: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawRankedJob {
    #[serde(default)]
    job_number: Option<Value>,
    #[serde(default)]
    tier: Option<Value>,
    #[serde(default)]
    final_score: Option<Value>,
    #[serde(default)]
    ranking_rationale: Option<Value>,
    #[serde(default)]
    action_recommendation: Option<Value>,
}

impl RawRanking {
    /// Entries that are not objects are dropped here; bad fields inside an object are
    /// handled field by field during normalization.
    fn entries(&self) -> Vec<RawRankedJob> {
        self.ranked_jobs
            .iter()
            .filter_map(|entry| match serde_json::from_value(entry.clone()) {
                Ok(job) => Some(job),
                Err(e) => {
                    debug!("Ignoring malformed ranked job {entry}: {e}");
                    None
                }
            })
            .collect()
    }
}

fn parse_tier(value: Option<&Value>) -> Option<Tier> {
    match value? {
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u8::try_from(n).ok())
            .and_then(Tier::from_number),
        Value::String(s) => Tier::parse_lenient(s),
        _ => None,
    }
}

fn score_ranked(result: JobMatchResult, rationale: String) -> RankedJob {
    let score = result.overall_fit_score;
    let tier = Tier::from_score(score);
    RankedJob {
        rank: 0,
        tier,
        final_score: score,
        ranking_rationale: rationale,
        action_recommendation: tier.default_action().to_string(),
        result,
    }
}

/// Reconciles the advisor's ranking with the actual results. Unknown or repeated job
/// numbers are dropped, results the advisor left out are appended by score, ranks are
/// renumbered from 1 and scores are clamped to 0-100.
fn normalize_ranking(raw: RawRanking, results: Vec<JobMatchResult>) -> JobRanking {
    let mut slots: Vec<Option<JobMatchResult>> = results.into_iter().map(Some).collect();
    let mut ranked_jobs: Vec<RankedJob> = Vec::with_capacity(slots.len());

    for entry in raw.entries() {
        let Some(number) = entry.job_number.as_ref().and_then(lenient_f64) else {
            continue;
        };
        if number < 1.0 || number.fract() != 0.0 {
            continue;
        }
        let index = number as usize - 1;
        let Some(result) = slots.get_mut(index).and_then(Option::take) else {
            debug!(job_number = number, "Ignoring unknown or repeated job number");
            continue;
        };

        let final_score = entry
            .final_score
            .as_ref()
            .and_then(lenient_f64)
            .unwrap_or(result.overall_fit_score)
            .clamp(0.0, MAX_OVERALL_SCORE);
        let tier = parse_tier(entry.tier.as_ref()).unwrap_or_else(|| Tier::from_score(final_score));
        ranked_jobs.push(RankedJob {
            rank: 0,
            tier,
            final_score,
            ranking_rationale: lenient_string(entry.ranking_rationale.as_ref())
                .unwrap_or_else(|| format!("Match score {}/100", result.overall_fit_score)),
            action_recommendation: lenient_string(entry.action_recommendation.as_ref())
                .unwrap_or_else(|| tier.default_action().to_string()),
            result,
        });
    }

    let mut omitted: Vec<JobMatchResult> = slots.into_iter().flatten().collect();
    omitted.sort_by(|a, b| b.overall_fit_score.total_cmp(&a.overall_fit_score));
    ranked_jobs.extend(omitted.into_iter().map(|result| {
        let rationale = format!("Ranked by match score ({}/100)", result.overall_fit_score);
        score_ranked(result, rationale)
    }));

    for (i, job) in ranked_jobs.iter_mut().enumerate() {
        job.rank = i as u32 + 1;
    }

    let top_recommendation = lenient_string(raw.top_recommendation.as_ref()).unwrap_or_else(|| {
        ranked_jobs
            .first()
            .map(|top| format!("Start with {} at {}", top.result.job.title, top.result.job.company))
            .unwrap_or_else(|| JobRanking::empty().top_recommendation)
    });

    JobRanking {
        ranked_jobs,
        overall_strategy: lenient_string(raw.overall_strategy.as_ref()).unwrap_or_else(|| {
            "Jobs ranked by match score. Focus on highest scoring opportunities first.".to_string()
        }),
        top_recommendation,
    }
}

/// Deterministic ranking by overall fit score with score-derived tiers.
pub fn rank_by_score(results: Vec<JobMatchResult>) -> JobRanking {
    if results.is_empty() {
        return JobRanking::empty();
    }
    normalize_ranking(RawRanking::default(), results)
}

fn single_job_ranking(result: JobMatchResult) -> JobRanking {
    let score = result.overall_fit_score;
    let tier = if score >= SINGLE_JOB_TOP_TIER_SCORE {
        Tier::TopPriority
    } else {
        Tier::StrongContender
    };
    let top_recommendation = format!("Apply to {} at {}", result.job.title, result.job.company);
    JobRanking {
        ranked_jobs: vec![RankedJob {
            rank: 1,
            tier,
            final_score: score,
            ranking_rationale: format!("Only opportunity available. Score: {score}/100"),
            action_recommendation: Tier::TopPriority.default_action().to_string(),
            result,
        }],
        overall_strategy: "This is your primary opportunity - focus on a strong application"
            .to_string(),
        top_recommendation,
    }
}

fn format_results(results: &[JobMatchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let strengths = m.strengths.iter().take(3).cloned().collect::<Vec<_>>();
            let gaps = m.gaps.iter().take(2).cloned().collect::<Vec<_>>();
            format!(
                "Job {n}:\n  Title: {title}\n  Company: {company}\n  Location: {location}\n  \
                 Overall Score: {overall}/100\n  Skill Match: {skills}/60\n  \
                 Experience Match: {experience}/30\n  Strengths: {strengths}\n  Gaps: {gaps}\n  \
                 Recommendation: {recommendation}\n  Remote Policy: {remote}\n  Salary: {salary}",
                n = i + 1,
                title = m.job.title,
                company = m.job.company,
                location = m.job.location.as_deref().unwrap_or("Not specified"),
                overall = m.overall_fit_score,
                skills = m.skill_match_score,
                experience = m.experience_match_score,
                strengths = if strengths.is_empty() { "None".to_string() } else { strengths.join(", ") },
                gaps = if gaps.is_empty() { "None".to_string() } else { gaps.join(", ") },
                recommendation = m.recommendation,
                remote = m.job.remote_policy.as_deref().unwrap_or("Unknown"),
                salary = m.job.salary_range.as_deref().unwrap_or("Not disclosed"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_ranking_prompt(results: &[JobMatchResult]) -> String {
    RANKING_PROMPT_TEMPLATE
        .replace("{job_count}", &results.len().to_string())
        .replace("{jobs}", &format_results(results))
}

/// Ranks match results. Zero or one result is ranked without consulting the model.
pub async fn rank_job_matches(
    llm: &dyn ChatModel,
    results: Vec<JobMatchResult>,
) -> Result<JobRanking, AppError> {
    let ranking = match results.len() {
        0 => JobRanking::empty(),
        1 => results
            .into_iter()
            .next()
            .map(single_job_ranking)
            .unwrap_or_else(JobRanking::empty),
        _ => {
            let prompt = build_ranking_prompt(&results);
            let raw: RawRanking = call_json(llm, &prompt, &CAREER_ADVISOR.system_prompt())
                .await
                .map_err(|e| AppError::Llm(format!("Job ranking failed: {e}")))?;
            if raw.entries().is_empty() {
                warn!("Advisor returned no ranked jobs; ranking by match score");
                rank_by_score(results)
            } else {
                normalize_ranking(raw, results)
            }
        }
    };

    info!(
        ranked = ranking.ranked_jobs.len(),
        top = ranking
            .ranked_jobs
            .first()
            .map(|j| j.result.job.title.as_str())
            .unwrap_or("none"),
        "Jobs ranked"
    );
    Ok(ranking)
}
