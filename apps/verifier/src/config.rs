use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub cors_allowed_origin: String,
    pub github_api_url: String,
    pub github_token: Option<String>,
    pub linkedin_api_url: String,
    pub http_timeout_secs: u64,
    pub ner_model_dir: PathBuf,
    pub question_bank_path: PathBuf,
    pub skills_path: Option<PathBuf>,
    pub max_upload_bytes: usize,
    pub quiz_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            cors_allowed_origin: "http://localhost:5173".to_string(),
            github_api_url: "https://api.github.com".to_string(),
            github_token: None,
            linkedin_api_url: "https://api.linkedin.com/v2".to_string(),
            http_timeout_secs: 10,
            ner_model_dir: PathBuf::from("./skill_ner_model"),
            question_bank_path: PathBuf::from("data/question_bank.csv"),
            skills_path: None,
            max_upload_bytes: 10 * 1024 * 1024,
            quiz_seed: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();

        Ok(Config {
            port: parse_env("PORT")?.unwrap_or(defaults.port),
            rust_log: optional_env("RUST_LOG").unwrap_or(defaults.rust_log),
            cors_allowed_origin: optional_env("CORS_ALLOWED_ORIGIN")
                .unwrap_or(defaults.cors_allowed_origin),
            github_api_url: optional_env("GITHUB_API_URL").unwrap_or(defaults.github_api_url),
            github_token: optional_env("GITHUB_TOKEN"),
            linkedin_api_url: optional_env("LINKEDIN_API_URL")
                .unwrap_or(defaults.linkedin_api_url),
            http_timeout_secs: parse_env("HTTP_TIMEOUT_SECS")?
                .unwrap_or(defaults.http_timeout_secs),
            ner_model_dir: optional_env("NER_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.ner_model_dir),
            question_bank_path: optional_env("QUESTION_BANK_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.question_bank_path),
            skills_path: optional_env("SKILLS_PATH").map(PathBuf::from),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES")?.unwrap_or(defaults.max_upload_bytes),
            quiz_seed: parse_env("QUIZ_SEED")?,
        })
    }
}

/// Returns the variable's value, treating unset and blank as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    optional_env(key)
        .map(|raw| {
            raw.parse::<T>()
                .with_context(|| format!("Environment variable '{key}' has an invalid value: '{raw}'"))
        })
        .transpose()
}
