use crate::config::github::GitHubConfig;
use crate::services::submission::RawIssue;
use chrono::{DateTime, Duration, Utc};
use reqwest::header::{HeaderMap, ACCEPT};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

const PER_PAGE: usize = 100;
const MAX_PAGES: usize = 20;
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

const SSO_MESSAGE: &str =
    "The GitHub token needs to be authorized for SSO access to the organization.";
const PERMISSION_MESSAGE: &str =
    "Access denied. The GitHub token may lack the required permissions.";

/// Classified failure of a call to the issue tracker.
///
/// `Clone` because one failed fetch is handed to every caller that was
/// coalesced onto it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GitHubError {
    #[error("GitHub API rate limit exceeded. Resets at {}.", .reset_at.format("%H:%M:%S UTC"))]
    RateLimited { reset_at: DateTime<Utc> },

    #[error("GitHub resource not found: {resource}")]
    NotFound { resource: String },

    /// Permission and SSO failures of the server's own token.
    #[error("{message}")]
    Auth { message: String },

    /// The caller's bearer token was rejected by the identity endpoint.
    #[error("Invalid GitHub token")]
    InvalidToken,

    #[error("GitHub API error ({status})")]
    Api { status: u16 },

    #[error("GitHub request failed: {0}")]
    Transport(String),

    #[error("Unexpected GitHub response: {0}")]
    Decode(String),

    #[error("GitHub request timed out")]
    Timeout,
}

impl GitHubError {
    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GitHubError::Timeout
        } else {
            GitHubError::Transport(err.to_string())
        }
    }
}

/// The external identity behind a bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct GitHubIdentity {
    pub id: String,
    pub login: String,
    pub avatar_url: String,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: u64,
    login: String,
    #[serde(default)]
    avatar_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct GitHubErrorBody {
    message: Option<String>,
    documentation_url: Option<String>,
}

#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    config: Arc<GitHubConfig>,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("hackathon-api/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    /// All open issues carrying the submission label, newest first.
    pub async fn list_submissions(&self) -> Result<Vec<RawIssue>, GitHubError> {
        let url = format!(
            "{}/repos/{}/{}/issues",
            self.config.api_url, self.config.owner, self.config.repo
        );
        let per_page = PER_PAGE.to_string();
        let mut issues = Vec::new();

        for page in 1..=MAX_PAGES {
            let page_param = page.to_string();
            let mut request = self
                .http
                .get(&url)
                .header(ACCEPT, GITHUB_ACCEPT)
                .query(&[
                    ("labels", self.config.submission_label.as_str()),
                    ("state", "open"),
                    ("sort", "created"),
                    ("direction", "desc"),
                    ("per_page", per_page.as_str()),
                    ("page", page_param.as_str()),
                ]);
            if let Some(token) = &self.config.token {
                request = request.bearer_auth(token);
            }

            let response = request.send().await.map_err(GitHubError::from_transport)?;
            let status = response.status();
            if !status.is_success() {
                let headers = response.headers().clone();
                let body = response.text().await.unwrap_or_default();
                return Err(classify_error(
                    status.as_u16(),
                    &headers,
                    &body,
                    &self.config.repository(),
                ));
            }

            let batch: Vec<RawIssue> = response
                .json()
                .await
                .map_err(|e| GitHubError::Decode(e.to_string()))?;
            let fetched = batch.len();
            // The issues endpoint also returns pull requests.
            issues.extend(batch.into_iter().filter(|i| i.pull_request.is_none()));

            if fetched < PER_PAGE {
                break;
            }
        }

        tracing::debug!(count = issues.len(), "fetched submission issues");
        Ok(issues)
    }

    /// Resolve a bearer token to its GitHub account.
    pub async fn fetch_user(&self, token: &str) -> Result<GitHubIdentity, GitHubError> {
        let response = self
            .http
            .get(format!("{}/user", self.config.api_url))
            .header(ACCEPT, GITHUB_ACCEPT)
            .bearer_auth(token)
            .send()
            .await
            .map_err(GitHubError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            return Err(
                match classify_error(status.as_u16(), &headers, &body, "user") {
                    err @ GitHubError::RateLimited { .. } => err,
                    _ => GitHubError::InvalidToken,
                },
            );
        }

        let user: GitHubUser = response
            .json()
            .await
            .map_err(|e| GitHubError::Decode(e.to_string()))?;

        Ok(GitHubIdentity {
            id: user.id.to_string(),
            login: user.login,
            avatar_url: user.avatar_url,
        })
    }
}

/// Map a non-success tracker response to a [`GitHubError`].
pub fn classify_error(status: u16, headers: &HeaderMap, body: &str, resource: &str) -> GitHubError {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    match status {
        403 | 429 => {
            if status == 429 || header("x-ratelimit-remaining") == Some("0") {
                let reset_at = header("x-ratelimit-reset")
                    .and_then(|v| v.trim().parse::<i64>().ok())
                    .and_then(|secs| DateTime::from_timestamp(secs, 0))
                    .unwrap_or_else(|| Utc::now() + Duration::hours(1));
                return GitHubError::RateLimited { reset_at };
            }

            let data: GitHubErrorBody = serde_json::from_str(body).unwrap_or_default();
            let is_sso = data
                .documentation_url
                .as_deref()
                .is_some_and(|url| url.contains("saml-single-sign-on"));
            if is_sso {
                return GitHubError::Auth {
                    message: SSO_MESSAGE.to_string(),
                };
            }

            GitHubError::Auth {
                message: data
                    .message
                    .unwrap_or_else(|| PERMISSION_MESSAGE.to_string()),
            }
        }
        404 => GitHubError::NotFound {
            resource: resource.to_string(),
        },
        _ => GitHubError::Api { status },
    }
}
