// Prompt constants for job discovery.

use crate::llm_client::prompts::AgentPersona;

pub const JOB_MARKET_RESEARCHER: AgentPersona = AgentPersona {
    role: "Job Market Researcher",
    goal: "Find the most relevant job opportunities for candidates by filtering real job \
        postings on skills, experience level, and career trajectory. Ensure recommended \
        jobs are realistic matches.",
    backstory: "You are a seasoned career advisor and recruiter with deep knowledge of the \
        job market. You know which job titles are equivalent (e.g. 'Software Engineer' vs \
        'Developer'), which skills are transferable, and what experience levels companies \
        typically require.",
};

/// Job selection prompt.
/// Replace: {num_jobs}, {target_role}, {self_reported_level}, {work_preference},
///          {experience}, {skills}, {previous_roles}, {listings}, {no_invention}
pub const JOB_SELECTION_PROMPT_TEMPLATE: &str = r#"Select the {num_jobs} most relevant job opportunities for this candidate from the search results below.

CANDIDATE PROFILE:
- Target Role: {target_role}
- Self-reported Experience: {self_reported_level}
- Work Preference: {work_preference}
- Experience Level (from resume): {experience}
- Key Skills: {skills}
- Previous Roles: {previous_roles}

SEARCH RESULTS:
{listings}

INSTRUCTIONS:
1. For each job, assess:
   - Does it match the candidate's experience level?
   - Do the required skills overlap with the candidate's skills?
   - Is the job title appropriate for their background?
2. Remove jobs that are too senior or too junior, or that need completely different skills.
3. Prioritize jobs where the candidate has 60%+ skill overlap.
4. Sort by relevance (best match first) and prefer variety across companies.

Return a JSON object with this EXACT schema:
{
  "recommended_jobs": [
    {"job_id": "job_id copied exactly from the search results", "reason": "1-2 sentences"}
  ],
  "search_summary": "Brief summary of the search results and your selection"
}

Only use job_id values that appear in the search results.
{no_invention}"#;
