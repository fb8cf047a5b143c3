/// LLM client. The single point of entry for all Ollama calls in JobScout.
///
/// ARCHITECTURAL RULE: No other module may call the Ollama API directly.
/// Agents depend on the `ChatModel` trait; `LlmClient` is the production backend.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::OllamaConfig;

pub mod prompts;

const CHAT_PATH: &str = "/api/chat";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM output did not contain a JSON object")]
    NoJson,

    #[error("LLM output failed validation: {0}")]
    InvalidOutput(String),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// A chat-completion backend. One system prompt, one user prompt, raw text back.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError>;

    /// Model identifier, for logs and reports.
    fn model_name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    format: &'a str,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub message: ResponseMessage,
    #[serde(default)]
    pub prompt_eval_count: Option<u32>,
    #[serde(default)]
    pub eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[allow(dead_code)]
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

/// Ollama chat client. Requests JSON-mode output (`format: "json"`) with streaming off.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    max_attempts: u32,
}

impl LlmClient {
    pub fn new(config: &OllamaConfig) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()?,
            endpoint: format!("{}{CHAT_PATH}", config.base_url),
            model: config.model.clone(),
            temperature: config.temperature,
            max_attempts: config.max_attempts.max(1),
        })
    }

    /// Makes a raw call to the chat endpoint, returning the full response object.
    /// With `max_attempts > 1`, transport errors and 5xx responses are retried with
    /// exponential backoff.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<ChatResponse, LlmError> {
        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            stream: false,
            format: "json",
            options: ChatOptions {
                temperature: self.temperature,
            },
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1).min(5)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self
                .client
                .post(&self.endpoint)
                .json(&request_body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Ollama returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: error_message(body),
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: error_message(body),
                });
            }

            let chat_response: ChatResponse = response.json().await?;

            debug!(
                model = %self.model,
                prompt_tokens = ?chat_response.prompt_eval_count,
                completion_tokens = ?chat_response.eval_count,
                "LLM call succeeded"
            );

            return Ok(chat_response);
        }

        Err(last_error.unwrap_or(LlmError::EmptyContent))
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let response = self.call(prompt, system).await?;
        if response.message.content.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(response.message.content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn error_message(body: String) -> String {
    serde_json::from_str::<OllamaError>(&body)
        .map(|e| e.error)
        .unwrap_or(body)
}

/// Calls the model and deserializes its text response as JSON.
/// The prompt must instruct the model to return a JSON object.
pub async fn call_json<T: DeserializeOwned>(
    llm: &dyn ChatModel,
    prompt: &str,
    system: &str,
) -> Result<T, LlmError> {
    let text = llm.complete(prompt, system).await?;
    parse_json_output(&text)
}

/// Parses model output that should be JSON but may carry fences, prose around the
/// object, or trailing commas.
pub fn parse_json_output<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let text = strip_json_fences(text);
    if text.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }

    let object = extract_json_object(text).ok_or(LlmError::NoJson)?;
    let cleaned = remove_trailing_commas(object);
    serde_json::from_str(&cleaned).map_err(LlmError::Parse)
}

// ────────────────────────────────────────────────────────────────────────────
// Lenient field readers for model output
// ────────────────────────────────────────────────────────────────────────────

/// serde helper: a missing or `null` field deserializes as the type's default.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads a number the model may have written as a JSON number or as text such as
/// `"4.5"`, `"5+ years"` or `"85%"`.
pub fn lenient_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            let (sign, digits) = match s.strip_prefix('-') {
                Some(rest) => ("-", rest),
                None => ("", s),
            };
            let numeric: String = digits
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            format!("{sign}{numeric}").parse().ok()
        }
        _ => None,
    }
}

/// Reads an optional non-blank string; the literal text "null" counts as absent.
pub fn lenient_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty() && !s.eq_ignore_ascii_case("null")).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Flattens a JSON list into trimmed strings. Objects contribute their `name` or
/// `title` field; anything else is skipped.
pub fn string_list(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(|v| match v {
            Value::Object(map) => lenient_string(map.get("name").or_else(|| map.get("title"))),
            other => lenient_string(Some(other)),
        })
        .collect()
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Returns the first balanced `{ ... }` span, ignoring braces inside string literals.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Drops commas that directly precede `}` or `]` outside string literals.
fn remove_trailing_commas(json: &str) -> String {
    let chars: Vec<char> = json.chars().collect();
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &ch) in chars.iter().enumerate() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        if ch == '"' {
            in_string = true;
        } else if ch == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(ch);
    }
    out
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_extract_object_surrounded_by_prose() {
        let input = "Here is the analysis:\n{\"a\": {\"b\": 1}} Hope this helps!";
        assert_eq!(extract_json_object(input), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn test_extract_object_ignores_braces_in_strings() {
        let input = r#"{"text": "use } and { freely", "n": 2}"#;
        assert_eq!(extract_json_object(input), Some(input));
    }

    #[test]
    fn test_extract_object_unbalanced_returns_none() {
        assert_eq!(extract_json_object("{\"a\": 1"), None);
        assert_eq!(extract_json_object("no json here"), None);
    }

    #[test]
    fn test_trailing_commas_removed_outside_strings() {
        let input = r#"{"items": [1, 2, ], "note": "a, }", }"#;
        let cleaned = remove_trailing_commas(input);
        let value: Value = serde_json::from_str(&cleaned).unwrap();
        assert_eq!(value["items"].as_array().unwrap().len(), 2);
        assert_eq!(value["note"], "a, }");
    }

    #[test]
    fn test_parse_json_output_handles_noisy_output() {
        let input = "Sure!\n```json\n{\"score\": 80,}\n```";
        let value: Value = parse_json_output(input).unwrap();
        assert_eq!(value["score"], 80);
    }

    #[test]
    fn test_parse_json_output_without_object_fails() {
        let result: Result<Value, _> = parse_json_output("I cannot help with that.");
        assert!(matches!(result, Err(LlmError::NoJson)));
    }

    #[test]
    fn test_chat_response_deserializes_ollama_payload() {
        let body = r#"{
            "model": "llama3:latest",
            "created_at": "2024-05-01T10:00:00Z",
            "message": {"role": "assistant", "content": "{\"ok\": true}"},
            "done": true,
            "prompt_eval_count": 120,
            "eval_count": 42
        }"#;
        let response: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.message.content, "{\"ok\": true}");
        assert_eq!(response.eval_count, Some(42));
    }

    #[test]
    fn test_error_message_prefers_ollama_error_field() {
        assert_eq!(
            error_message(r#"{"error": "model 'x' not found"}"#.to_string()),
            "model 'x' not found"
        );
        assert_eq!(error_message("plain failure".to_string()), "plain failure");
    }

    #[test]
    fn test_request_serializes_json_mode_without_streaming() {
        let request = ChatRequest {
            model: "llama3",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            stream: false,
            format: "json",
            options: ChatOptions { temperature: 0.3 },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["stream"], false);
        assert_eq!(value["format"], "json");
        assert!((value["options"]["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_lenient_f64_accepts_numbers_and_text() {
        assert_eq!(lenient_f64(&serde_json::json!(4.5)), Some(4.5));
        assert_eq!(lenient_f64(&serde_json::json!("5+ years")), Some(5.0));
        assert_eq!(lenient_f64(&serde_json::json!("85%")), Some(85.0));
        assert_eq!(lenient_f64(&serde_json::json!("5-10")), Some(5.0));
        assert_eq!(lenient_f64(&serde_json::json!("unknown")), None);
        assert_eq!(lenient_f64(&Value::Null), None);
    }

    #[test]
    fn test_string_list_flattens_mixed_entries() {
        let values = vec![
            serde_json::json!(" Rust "),
            serde_json::json!({"name": "Docker", "category": "tool"}),
            serde_json::json!(null),
            serde_json::json!(""),
            serde_json::json!("null"),
        ];
        assert_eq!(string_list(&values), vec!["Rust", "Docker"]);
    }

    #[test]
    fn test_null_as_default_on_null_field() {
        #[derive(Deserialize)]
        struct Payload {
            #[serde(default, deserialize_with = "null_as_default")]
            items: Vec<String>,
        }
        let payload: Payload = serde_json::from_str(r#"{"items": null}"#).unwrap();
        assert!(payload.items.is_empty());
        let payload: Payload = serde_json::from_str("{}").unwrap();
        assert!(payload.items.is_empty());
    }
}
