use super::{non_empty_env, upstream_timeout};
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_url: String,
    /// Chat is disabled when unset.
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl OpenAiConfig {
    pub fn from_env() -> Self {
        let api_url = non_empty_env("OPENAI_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            api_url,
            api_key: non_empty_env("OPENAI_API_KEY"),
            model: non_empty_env("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: upstream_timeout(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
