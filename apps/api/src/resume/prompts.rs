// Prompt constants for the resume analyst.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::AgentPersona;

pub const RESUME_ANALYST: AgentPersona = AgentPersona {
    role: "Senior Resume Analyst",
    goal: "Extract structured, accurate information from resumes including skills, \
        experience level, years of experience, previous roles, and education. \
        Ensure all extracted data is precise and complete.",
    backstory: "You are an expert recruiter with 15 years of experience analyzing resumes \
        across various industries. You have a keen eye for detail and can identify both \
        explicit and implicit skills. You understand how to map job titles to experience \
        levels and can accurately estimate years of experience from work history.",
};

/// Resume analysis prompt. Replace `{resume_text}` and `{no_invention}` before sending.
pub const RESUME_ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the following resume and extract structured information.

RESUME TEXT:
{resume_text}

EXTRACTION REQUIREMENTS:

1. SKILLS:
   - Identify all technical skills (programming languages, frameworks, tools, databases, cloud)
   - Identify soft skills (leadership, communication, etc.)
   - Categorize each skill
   - Estimate years of experience for each skill if mentioned

2. EXPERIENCE LEVEL:
   - Calculate total years of professional experience
   - Determine the level:
     * 0-2 years: entry or junior
     * 2-5 years: mid
     * 5-10 years: senior
     * 10+ years: lead or principal

3. WORK HISTORY: every previous job title and every company name.

4. EDUCATION: all degrees, certifications and qualifications.

5. SUMMARY: a concise professional summary (2-3 sentences) capturing core expertise.

Return a JSON object with this EXACT schema:
{
  "name": "string or null",
  "email": "string or null",
  "summary": "professional summary",
  "skills": [
    {
      "name": "skill name",
      "category": "programming_language|framework|library|tool|platform|soft_skill|domain_knowledge|database|cloud|devops|methodology|other",
      "years_experience": 2.5,
      "proficiency": "beginner|intermediate|advanced|expert or null"
    }
  ],
  "total_years_experience": 4.0,
  "experience_level": "entry|junior|mid|senior|lead|principal",
  "previous_roles": ["role"],
  "previous_companies": ["company"],
  "education": ["degree"]
}

Every skill needs at least a name and a category.
{no_invention}"#;
