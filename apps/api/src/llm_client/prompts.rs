// Shared prompt constants and the agent persona type.
// Each agent defines its own prompts.rs alongside it; this file holds cross-cutting fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Common instruction appended to prompts that work from supplied data.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    Use ONLY the information provided above. Do NOT invent employers, skills, \
    dates or job postings. If information is missing, use null or an empty array.";

/// A named agent role. Rendered into the system prompt of every call the agent makes.
#[derive(Debug, Clone, Copy)]
pub struct AgentPersona {
    pub role: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
}

impl AgentPersona {
    pub fn system_prompt(&self) -> String {
        format!(
            "You are a {role}. {backstory}\n\nYour goal: {goal}\n\n{JSON_ONLY_SYSTEM}",
            role = self.role,
            backstory = self.backstory,
            goal = self.goal,
        )
    }
}
