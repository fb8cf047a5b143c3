// Prompt constants for skill matching and ranking.

use crate::llm_client::prompts::AgentPersona;

pub const SKILL_MATCHER: AgentPersona = AgentPersona {
    role: "Technical Skill Matcher",
    goal: "Accurately compare candidate skills against job requirements using explicit \
        scoring rules. Identify matches and gaps, and explain every score.",
    backstory: "You are a meticulous technical recruiter with expertise in skill \
        assessment. You always follow consistent scoring criteria. You can identify skill \
        equivalents (e.g. Flask and FastAPI are similar frameworks) and understand what \
        years of experience truly mean for different technologies.",
};

pub const CAREER_ADVISOR: AgentPersona = AgentPersona {
    role: "Strategic Career Advisor",
    goal: "Rank job opportunities strategically to help candidates make the best career \
        decisions. Consider not just match scores, but also career growth potential, \
        practical factors, and long-term value.",
    backstory: "You are a senior career strategist with 20 years of experience advising \
        professionals on job selection. You understand that the best job is not always the \
        highest scoring one, and you can spot opportunities that score slightly lower but \
        offer better long-term value.",
};

/// Skill matching prompt.
/// Replace: {candidate_name}, {candidate_level}, {candidate_years}, {candidate_skills},
///          {job_title}, {job_company}, {job_level}, {required_skills},
///          {preferred_skills}, {job_description}
pub const SKILL_MATCH_PROMPT_TEMPLATE: &str = r#"Perform a detailed skill match analysis between the candidate and the job posting.

CANDIDATE:
- Name: {candidate_name}
- Experience Level: {candidate_level}
- Total Years: {candidate_years}
- Skills:
{candidate_skills}

JOB POSTING:
- Title: {job_title}
- Company: {job_company}
- Required Experience Level: {job_level}
- Required Skills: {required_skills}
- Preferred Skills: {preferred_skills}
- Description: {job_description}

SCORING RULES (100 points total):

1. SKILL MATCHING (60 points max)
   For each REQUIRED skill:
   - Exact match with sufficient experience: +20
   - Exact match with insufficient experience: +10
   - Similar or equivalent skill: +15
   - Missing: 0
   For each PREFERRED skill the candidate has: +5
   Cap this section at 60.

2. EXPERIENCE LEVEL (30 points max)
   - Exact match: +30
   - One level above the requirement: +20
   - One level below the requirement: +15
   - Two or more levels apart: +5
   Hierarchy: entry < junior < mid < senior < lead < principal

3. OVERALL PROFILE STRENGTH (10 points max)
   - Strong fit with the job domain: +10
   - Moderate fit: +5
   - Weak fit: 0

overall_fit_score is the sum of the three sections.

RECOMMENDATION:
- "Strong Match - Recommend Interview" (score >= 75)
- "Good Match - Consider for Interview" (score 60-74)
- "Moderate Match - Review Carefully" (score 50-59)
- "Weak Match - Likely Not Suitable" (score < 50)

Return a JSON object with this EXACT schema:
{
  "skill_matches": [
    {
      "skill_name": "required or preferred skill",
      "candidate_has": true,
      "candidate_years": 3.0,
      "required_years": null,
      "match_strength": 0.8,
      "is_required": true
    }
  ],
  "overall_fit_score": 72,
  "skill_match_score": 45,
  "experience_match_score": 20,
  "strengths": ["specific strength"],
  "gaps": ["specific gap"],
  "recommendation": "one of the recommendation strings above",
  "explanation": "2-3 paragraphs: score breakdown, key strengths, whether the gaps are dealbreakers"
}

Include one skill_matches entry for EVERY required skill. match_strength is 0.0 (no match) to 1.0 (perfect match).
Show your score calculation in the explanation."#;

/// Ranking prompt. Replace: {job_count}, {jobs}
pub const RANKING_PROMPT_TEMPLATE: &str = r#"Rank these {job_count} job opportunities strategically for the candidate.

JOB OPPORTUNITIES:
{jobs}

RANKING METHODOLOGY (do not rank on overall score alone):
1. BASE SCORE (40% weight): the overall fit score is the foundation.
2. CAREER GROWTH POTENTIAL (25% weight): advancement, company growth, valuable experience.
3. PRACTICAL FACTORS (20% weight): remote/hybrid/on-site, location, work-life balance, salary if disclosed.
4. STRATEGIC VALUE (15% weight): fills skill gaps, stretch opportunity, company stability, industry trends.

TIERS:
- "TIER 1" Top Priority: apply immediately, excellent fit
- "TIER 2" Strong Contender: definitely apply, very good fit
- "TIER 3" Worth Considering: apply if time permits, decent fit
- "TIER 4" Backup Option: keep on radar

Return a JSON object with this EXACT schema:
{
  "ranked_jobs": [
    {
      "job_number": 1,
      "tier": "TIER 1",
      "final_score": 82,
      "ranking_rationale": "2-3 sentences explaining this rank",
      "action_recommendation": "Apply immediately|Apply this week|Consider applying|Keep as backup"
    }
  ],
  "overall_strategy": "2-3 sentences of strategic advice for the job search",
  "top_recommendation": "Which single job to prioritize and why (1-2 sentences)"
}

List every job exactly once, best first. job_number refers to the "Job N" numbering above."#;
