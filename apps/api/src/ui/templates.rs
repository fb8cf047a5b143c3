//! HTML rendering for the form and results pages.

use std::fmt::Write;

use axum::response::Html;
use uuid::Uuid;

use crate::models::{LocationPreference, SelfReportedLevel, WorkPreference};
use crate::pipeline::PipelineReport;
use crate::ui::session::{FormData, RESUME_STEP};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 760px; margin: 2rem auto; padding: 0 1rem; color: #1f2933; }
h1 { color: #1f77b4; margin-bottom: 0; }
.sub { color: #616e7c; margin-top: .25rem; }
.progress { background: #e4e7eb; border-radius: 4px; height: 8px; margin: 1rem 0 2rem; }
.progress > div { background: #1f77b4; height: 8px; border-radius: 4px; }
.error { background: #fde8e8; border-left: 4px solid #e02424; padding: .75rem 1rem; margin: 1rem 0; }
.tip { background: #e1effe; border-left: 4px solid #1c64f2; padding: .75rem 1rem; margin: 1rem 0; }
.metrics { display: flex; gap: 1rem; flex-wrap: wrap; }
.metric { flex: 1; min-width: 140px; background: #f5f7fa; padding: .75rem; border-radius: 6px; }
.metric .value { font-size: 1.4rem; font-weight: 600; }
.card { border-left: 5px solid #9aa5b1; background: #f5f7fa; padding: 1rem; margin: 1rem 0; border-radius: 6px; }
.tier-1 { border-color: #0e9f6e; } .tier-2 { border-color: #1c64f2; }
.tier-3 { border-color: #ff8a4c; } .tier-4 { border-color: #9aa5b1; }
.actions { display: flex; justify-content: space-between; margin-top: 1.5rem; }
label.option { display: block; margin: .4rem 0; }
input[type=text] { width: 100%; padding: .5rem; font-size: 1rem; }
"#;

/// Escapes text for use in HTML content and attribute values.
/// Links only to http(s) URLs. Anything else from the job API is dropped.
fn posting_link(url: Option<&str>) -> String {
    match url.map(str::trim) {
        Some(url)
            if url.get(..7).is_some_and(|s| s.eq_ignore_ascii_case("http://"))
                || url.get(..8).is_some_and(|s| s.eq_ignore_ascii_case("https://")) =>
        {
            format!(
                r#" <a href="{}" target="_blank" rel="noopener">View posting</a>"#,
                escape(url)
            )
        }
        _ => String::new(),
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | JobScout</title>
<style>{STYLE}</style>
</head>
<body>
<h1>JobScout</h1>
<p class="sub">Find your best job matches with AI-powered analysis</p>
{body}
</body>
</html>"#,
        title = escape(title),
    ))
}

fn radio_group<T: Copy + PartialEq>(
    name: &str,
    options: &[T],
    selected: Option<T>,
    value: impl Fn(&T) -> &'static str,
    label: impl Fn(&T) -> &'static str,
) -> String {
    let mut html = String::new();
    for option in options {
        let checked = if selected == Some(*option) { " checked" } else { "" };
        let _ = write!(
            html,
            r#"<label class="option"><input type="radio" name="{name}" value="{}"{checked}> {}</label>"#,
            value(option),
            escape(label(option)),
        );
    }
    html
}

fn text_input(name: &str, value: Option<&str>, placeholder: &str) -> String {
    format!(
        r#"<input type="text" name="{name}" value="{}" placeholder="{}">"#,
        escape(value.unwrap_or("")),
        escape(placeholder),
    )
}

fn step_title(step: u8) -> &'static str {
    match step {
        1 => "Personal Information",
        2 => "Experience Level",
        3 => "Work Preferences",
        4 => "Target Job Role",
        _ => "Upload Your Resume",
    }
}

fn step_fields(step: u8, data: &FormData) -> String {
    match step {
        1 => format!(
            "<p>What is your full name?</p>{}",
            text_input("full_name", data.full_name.as_deref(), "e.g., John Doe")
        ),
        2 => format!(
            "<p>What is your experience level?</p>{}",
            radio_group(
                "experience_level",
                &SelfReportedLevel::ALL,
                data.experience_level,
                SelfReportedLevel::value,
                SelfReportedLevel::label,
            )
        ),
        3 => format!(
            "<p>What type of work arrangement do you prefer?</p>{}\
             <hr><p>For on-site roles: where would you like to work?</p>{}\
             <p>Your country</p>{}",
            radio_group(
                "work_preference",
                &WorkPreference::ALL,
                data.work_preference,
                WorkPreference::value,
                WorkPreference::label,
            ),
            radio_group(
                "location_preference",
                &LocationPreference::ALL,
                data.location_preference,
                LocationPreference::value,
                LocationPreference::label,
            ),
            text_input("country", data.country.as_deref(), "e.g., India, United States"),
        ),
        _ => format!(
            "<p>What job role are you looking for?</p>{}\
             <div class=\"tip\">Be specific: instead of 'Developer', try 'Senior Python Developer'.</div>",
            text_input(
                "target_role",
                data.target_role.as_deref(),
                "e.g., Senior Rust Developer"
            ),
        ),
    }
}

fn progress(step: u8) -> String {
    let percent = u32::from(step.saturating_sub(1)) * 100 / u32::from(RESUME_STEP);
    format!(
        r#"<p><strong>Step {step} of {RESUME_STEP}</strong></p><div class="progress"><div style="width: {percent}%"></div></div>"#
    )
}

fn error_block(error: Option<&str>) -> String {
    error
        .map(|message| format!(r#"<div class="error">{}</div>"#, escape(message)))
        .unwrap_or_default()
}

/// One of steps 1 to 4, with Back/Next buttons and an optional inline error.
pub fn step_page(id: Uuid, step: u8, data: &FormData, error: Option<&str>) -> Html<String> {
    if step >= RESUME_STEP {
        return upload_page(id, error);
    }
    let back = if step > 1 {
        r#"<button type="submit" name="action" value="back" formnovalidate>&larr; Back</button>"#
    } else {
        "<span></span>"
    };
    let body = format!(
        r#"{progress}<h2>{title}</h2>
<form method="post" action="/wizard/{id}/step/{step}">
{fields}
{error}
<div class="actions">{back}<button type="submit" name="action" value="next">Next &rarr;</button></div>
</form>"#,
        progress = progress(step),
        title = step_title(step),
        fields = step_fields(step, data),
        error = error_block(error),
    );
    page(step_title(step), &body)
}

/// Step 5. An error means the last submission failed; the form stays usable for a retry.
pub fn upload_page(id: Uuid, error: Option<&str>) -> Html<String> {
    let error = error
        .map(|message| {
            format!(
                r#"<div class="error">{}<br><a href="/wizard/{id}/step/{RESUME_STEP}">Try again</a></div>"#,
                escape(message)
            )
        })
        .unwrap_or_default();
    let body = format!(
        r#"{progress}<h2>{title}</h2>
<form method="post" action="/wizard/{id}/submit" enctype="multipart/form-data">
<p>Upload your resume (PDF or DOCX)</p>
<input type="file" name="resume" accept=".pdf,.docx,.doc" required>
{error}
<div class="actions">
<button type="submit" formaction="/wizard/{id}/step/{RESUME_STEP}" formenctype="application/x-www-form-urlencoded" formnovalidate name="action" value="back">&larr; Back</button>
<button type="submit">Analyze &amp; Find Jobs</button>
</div>
</form>
<p>Analysis usually takes a few minutes.</p>"#,
        progress = progress(RESUME_STEP),
        title = step_title(RESUME_STEP),
    );
    page(step_title(RESUME_STEP), &body)
}

fn join_or_none(items: &[&str]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

fn metric(label: &str, value: &str) -> String {
    format!(
        r#"<div class="metric"><div>{}</div><div class="value">{}</div></div>"#,
        escape(label),
        escape(value)
    )
}

pub fn results_page(id: Uuid, report: &PipelineReport) -> Html<String> {
    let candidate = &report.candidate;
    let search = &report.job_search;
    let ranking = &report.ranking;

    let mut body = String::from("<h2>Your Personalized Job Recommendations</h2>");

    body.push_str("<h3>Your Profile</h3><div class=\"metrics\">");
    body.push_str(&metric("Name", candidate.name.as_deref().unwrap_or("Unknown")));
    body.push_str(&metric("Experience", &candidate.experience_level.to_string()));
    body.push_str(&metric(
        "Total Years",
        &format!("{} years", candidate.total_years),
    ));
    body.push_str(&metric("Skills", &candidate.skills_count.to_string()));
    let _ = write!(
        body,
        "</div><p><strong>Top Skills:</strong> {}</p>",
        escape(&candidate.top_skills.join(", "))
    );

    body.push_str("<h3>Search Summary</h3><div class=\"metrics\">");
    body.push_str(&metric("Jobs Found", &search.jobs_found.to_string()));
    body.push_str(&metric("Jobs Analyzed", &search.jobs_matched.to_string()));
    body.push_str(&metric(
        "Avg Match Score",
        &format!("{:.1}/100", search.average_score),
    ));
    let _ = write!(body, "</div><p>{}</p>", escape(&search.search_summary));

    let _ = write!(
        body,
        r#"<h3>Top Recommendation</h3><div class="tip"><strong>{}</strong></div><p><strong>Strategy:</strong> {}</p>"#,
        escape(&ranking.top_recommendation),
        escape(&ranking.overall_strategy),
    );

    body.push_str("<h3>Ranked Job Opportunities</h3>");
    if ranking.ranked_jobs.is_empty() {
        body.push_str("<p>No jobs could be ranked for this search.</p>");
    }
    for ranked in &ranking.ranked_jobs {
        let job = &ranked.result.job;
        let link = posting_link(job.url.as_deref());
        let _ = write!(
            body,
            r#"<div class="card tier-{tier_number}">
<h4>#{rank} - {title}</h4>
<p><strong>Company:</strong> {company}{location}{link}</p>
<p><strong>{tier}</strong> ({tier_title}) | Score: <strong>{score:.0}/100</strong></p>
<p><strong>Matched skills:</strong> {matched} | <strong>Missing:</strong> {missing}</p>
<p><strong>Action:</strong> {action}</p>
<p><strong>Why this rank:</strong> {rationale}</p>
</div>"#,
            tier_number = ranked.tier.number(),
            rank = ranked.rank,
            title = escape(&job.title),
            company = escape(&job.company),
            location = job
                .location
                .as_deref()
                .map(|l| format!(" ({})", escape(l)))
                .unwrap_or_default(),
            tier = ranked.tier,
            tier_title = ranked.tier.title(),
            score = ranked.final_score,
            matched = escape(&join_or_none(&ranked.result.matched_skills())),
            missing = escape(&join_or_none(&ranked.result.missing_skills())),
            action = escape(&ranked.action_recommendation),
            rationale = escape(&ranked.ranking_rationale),
        );
    }

    let _ = write!(
        body,
        r#"<form method="post" action="/wizard/{id}/reset"><button type="submit">Start New Search</button></form>"#
    );
    page("Results", &body)
}
