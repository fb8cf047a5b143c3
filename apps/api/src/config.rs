use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Deployment environment. Controls CORS strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            other => bail!("APP_ENV must be development, production or test (got '{other}')"),
        }
    }
}

/// Ollama connection settings.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// Attempts per LLM call. 1 disables retries.
    pub max_attempts: u32,
}

/// JSearch (RapidAPI) settings.
#[derive(Debug, Clone)]
pub struct JobSearchConfig {
    pub api_key: String,
    pub host: String,
    pub date_posted: String,
    pub num_jobs: usize,
    pub timeout_secs: u64,
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub ollama: OllamaConfig,
    pub job_search: JobSearchConfig,
    pub data_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

const DATE_POSTED_VALUES: &[&str] = &["all", "today", "3days", "week", "month"];

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let temperature: f32 = parse_env_or("OLLAMA_TEMPERATURE", 0.3)?;
        if !(0.0..=2.0).contains(&temperature) {
            bail!("OLLAMA_TEMPERATURE must be between 0.0 and 2.0 (got {temperature})");
        }

        let date_posted = env_or("JOB_SEARCH_DATE_POSTED", "all").to_lowercase();
        if !DATE_POSTED_VALUES.contains(&date_posted.as_str()) {
            bail!(
                "JOB_SEARCH_DATE_POSTED must be one of {} (got '{date_posted}')",
                DATE_POSTED_VALUES.join(", ")
            );
        }

        let max_attempts: u32 = parse_env_or("LLM_MAX_ATTEMPTS", 1)?;

        Ok(Config {
            environment: parse_env_or("APP_ENV", Environment::Development)?,
            ollama: OllamaConfig {
                base_url: env_or("OLLAMA_BASE_URL", "http://localhost:11434")
                    .trim_end_matches('/')
                    .to_string(),
                model: normalize_model_name(&env_or("OLLAMA_MODEL", "llama3:latest")),
                temperature,
                timeout_secs: parse_env_or("OLLAMA_TIMEOUT_SECS", 120)?,
                max_attempts: max_attempts.max(1),
            },
            job_search: JobSearchConfig {
                api_key: require_env("RAPIDAPI_KEY")?,
                host: env_or("RAPIDAPI_HOST", "jsearch.p.rapidapi.com"),
                date_posted,
                num_jobs: parse_env_or("JOB_SEARCH_NUM_JOBS", 5)?,
                timeout_secs: parse_env_or("JOB_SEARCH_TIMEOUT_SECS", 10)?,
            },
            data_dir: PathBuf::from(env_or("DATA_DIR", "data")),
            port: parse_env_or("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

/// Ollama's native API takes the bare model tag; LiteLLM-style `ollama/` prefixes are dropped.
pub fn normalize_model_name(model: &str) -> String {
    let model = model.trim();
    model.strip_prefix("ollama/").unwrap_or(model).to_string()
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("{key} has an invalid value '{raw}': {e}"))
}

#[cfg(test)]
impl Config {
    /// Defaults with no environment lookups.
    pub fn for_tests(data_dir: PathBuf) -> Self {
        Config {
            environment: Environment::Test,
            ollama: OllamaConfig {
                base_url: "http://localhost:11434".to_string(),
                model: "llama3:latest".to_string(),
                temperature: 0.3,
                timeout_secs: 5,
                max_attempts: 1,
            },
            job_search: JobSearchConfig {
                api_key: "test-key".to_string(),
                host: "jsearch.p.rapidapi.com".to_string(),
                date_posted: "all".to_string(),
                num_jobs: 5,
                timeout_secs: 5,
            },
            data_dir,
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_name_prefix_is_stripped() {
        assert_eq!(normalize_model_name("ollama/llama3:latest"), "llama3:latest");
        assert_eq!(normalize_model_name(" mistral "), "mistral");
    }

    #[test]
    fn test_environment_parses_aliases() {
        assert_eq!(
            "prod".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert_eq!(
            "Development".parse::<Environment>().unwrap(),
            Environment::Development
        );
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_parse_value_reports_key_on_failure() {
        let err = parse_value::<u16>("PORT", "eighty").unwrap_err();
        assert!(err.to_string().contains("PORT"));
        assert_eq!(parse_value::<u16>("PORT", " 9000 ").unwrap(), 9000);
    }
}
