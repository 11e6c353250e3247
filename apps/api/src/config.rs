use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// OpenAI-compatible chat-completions backends with known defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Ollama,
    Gemini,
}

impl LlmProvider {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            "gemini" => Ok(Self::Gemini),
            other => bail!("LLM_PROVIDER must be one of openai, ollama, gemini (got '{other}')"),
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Ollama => "http://localhost:11434/v1",
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Ollama => "llama3.2",
            Self::Gemini => "gemini-1.5-flash",
        }
    }

    /// Local Ollama servers accept unauthenticated requests.
    pub fn requires_api_key(self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm_provider: LlmProvider,
    pub llm_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub classifier_timeout: Duration,
    pub rating_concurrency: usize,
    pub rubric_path: Option<PathBuf>,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let llm_provider = match get("LLM_PROVIDER") {
            Some(raw) => LlmProvider::parse(&raw)?,
            None => LlmProvider::OpenAi,
        };
        let llm_api_key = get("LLM_API_KEY");
        if llm_provider.requires_api_key() && llm_api_key.is_none() {
            bail!("Required environment variable 'LLM_API_KEY' is not set");
        }

        Ok(Config {
            llm_provider,
            llm_api_key,
            llm_base_url: get("LLM_BASE_URL")
                .unwrap_or_else(|| llm_provider.default_base_url().to_string()),
            llm_model: get("LLM_MODEL").unwrap_or_else(|| llm_provider.default_model().to_string()),
            classifier_timeout: Duration::from_secs(
                get("CLASSIFIER_TIMEOUT_SECS")
                    .unwrap_or_else(|| "30".to_string())
                    .parse::<u64>()
                    .context("CLASSIFIER_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            rating_concurrency: parse_rating_concurrency(get("RATING_CONCURRENCY"))?,
            rubric_path: get("RUBRIC_PATH").map(PathBuf::from),
            max_upload_bytes: get("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|| (10 * 1024 * 1024).to_string())
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            port: get("PORT")
                .unwrap_or_else(|| "5000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_rating_concurrency(raw: Option<String>) -> Result<usize> {
    let value = raw
        .unwrap_or_else(|| "4".to_string())
        .parse::<usize>()
        .context("RATING_CONCURRENCY must be a whole number")?;
    if value == 0 {
        bail!("RATING_CONCURRENCY must be at least 1");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_openai_key() {
        let config = load(&[("LLM_API_KEY", "sk-test")]).unwrap();
        assert_eq!(config.llm_provider, LlmProvider::OpenAi);
        assert_eq!(config.llm_base_url, "https://api.openai.com/v1");
        assert_eq!(config.classifier_timeout, Duration::from_secs(30));
        assert_eq!(config.rating_concurrency, 4);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.port, 5000);
        assert!(config.rubric_path.is_none());
    }

    #[test]
    fn test_missing_key_rejected_unless_ollama() {
        assert!(load(&[]).is_err());
        let config = load(&[("LLM_PROVIDER", "Ollama")]).unwrap();
        assert_eq!(config.llm_api_key, None);
        assert_eq!(config.llm_model, "llama3.2");
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let config = load(&[
            ("LLM_PROVIDER", "gemini"),
            ("LLM_API_KEY", "g"),
            ("LLM_MODEL", "gemini-2.0-flash"),
            ("CLASSIFIER_TIMEOUT_SECS", "5"),
            ("RUBRIC_PATH", "rubrics/2026.json"),
        ])
        .unwrap();
        assert_eq!(config.llm_model, "gemini-2.0-flash");
        assert_eq!(config.classifier_timeout, Duration::from_secs(5));
        assert_eq!(config.rubric_path, Some(PathBuf::from("rubrics/2026.json")));

        assert!(load(&[("LLM_API_KEY", "k"), ("PORT", "http")]).is_err());
        assert!(load(&[("LLM_API_KEY", "k"), ("RATING_CONCURRENCY", "0")]).is_err());
        assert_eq!(
            load(&[("LLM_API_KEY", "k"), ("RATING_CONCURRENCY", "8")]).unwrap().rating_concurrency,
            8
        );
        assert!(load(&[("LLM_PROVIDER", "anthropic"), ("LLM_API_KEY", "k")]).is_err());
    }
}
