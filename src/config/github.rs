use super::{non_empty_env, upstream_timeout};
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub api_url: String,
    /// Used for listing submissions only; identity checks use the caller's token.
    pub token: Option<String>,
    pub owner: String,
    pub repo: String,
    pub submission_label: String,
    pub timeout: Duration,
}

impl GitHubConfig {
    pub fn from_env() -> Self {
        let api_url = non_empty_env("GITHUB_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            api_url,
            token: non_empty_env("GITHUB_TOKEN"),
            owner: non_empty_env("GITHUB_OWNER").unwrap_or_else(|| "uniswap".to_string()),
            repo: non_empty_env("GITHUB_REPO").unwrap_or_else(|| "uniswap-ai".to_string()),
            submission_label: non_empty_env("GITHUB_SUBMISSION_LABEL")
                .unwrap_or_else(|| "hackathon-submission".to_string()),
            timeout: upstream_timeout(),
        }
    }

    /// `owner/repo`, used in not-found errors and logs.
    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}
