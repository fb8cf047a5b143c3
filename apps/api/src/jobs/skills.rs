/// Technology keywords looked for in job descriptions, in reporting order.
const SKILL_KEYWORDS: &[&str] = &[
    "python",
    "java",
    "javascript",
    "typescript",
    "react",
    "angular",
    "vue",
    "node.js",
    "django",
    "flask",
    "fastapi",
    "spring",
    "kubernetes",
    "docker",
    "aws",
    "azure",
    "gcp",
    "sql",
    "postgresql",
    "mongodb",
    "redis",
    "machine learning",
    "deep learning",
    "tensorflow",
    "pytorch",
    "git",
    "ci/cd",
    "agile",
    "scrum",
    "rest api",
    "graphql",
];

pub const MAX_EXTRACTED_SKILLS: usize = 10;

/// Finds known technology keywords in a description. Matches are whole words, so
/// "java" is not found inside "javascript" and "git" not inside "digital".
pub fn extract_skills(description: &str) -> Vec<String> {
    let haystack = description.to_lowercase();
    SKILL_KEYWORDS
        .iter()
        .filter(|keyword| contains_word(&haystack, keyword))
        .take(MAX_EXTRACTED_SKILLS)
        .map(|keyword| title_case(keyword))
        .collect()
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Capitalizes the first letter of every alphabetic run: "node.js" becomes "Node.Js".
fn title_case(keyword: &str) -> String {
    let mut out = String::with_capacity(keyword.len());
    let mut at_word_start = true;
    for c in keyword.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.push(c);
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}
