use crate::services::github::GitHubError;
use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Authentication required")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Present for upstream failures: rate_limited, not_found, upstream_auth, upstream, timeout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// RFC 3339 reset time, rate limits only
    #[serde(rename = "resetAt", skip_serializing_if = "Option::is_none")]
    pub reset_at: Option<String>,
}

impl utoipa::ToSchema for AppError {
    fn name() -> std::borrow::Cow<'static, str> {
        "ErrorResponse".into()
    }
}

impl utoipa::PartialSchema for AppError {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        ErrorResponse::schema()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
            ),
            AppError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::GitHub(err) => return github_error_response(err),
        };

        let body = json!({
            "error": error_message,
        });

        (status, Json(body)).into_response()
    }
}

fn github_error_response(err: GitHubError) -> Response {
    let message = err.to_string();
    let (status, kind) = match &err {
        GitHubError::RateLimited { .. } => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
        GitHubError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
        GitHubError::Auth { .. } => (StatusCode::BAD_GATEWAY, "upstream_auth"),
        GitHubError::InvalidToken => (StatusCode::UNAUTHORIZED, "unauthorized"),
        GitHubError::Api { .. } | GitHubError::Transport(_) | GitHubError::Decode(_) => {
            (StatusCode::BAD_GATEWAY, "upstream")
        }
        GitHubError::Timeout => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
    };

    if status.is_server_error() {
        tracing::warn!(kind, "GitHub upstream failure: {}", message);
    }

    let reset_at = match &err {
        GitHubError::RateLimited { reset_at } => Some(*reset_at),
        _ => None,
    };

    let body = ErrorResponse {
        error: message,
        kind: Some(kind.to_string()),
        reset_at: reset_at.map(|t| t.to_rfc3339()),
    };

    let mut response = (status, Json(body)).into_response();
    if let Some(reset_at) = reset_at {
        let wait = (reset_at - chrono::Utc::now()).num_seconds().max(0);
        if let Ok(value) = HeaderValue::from_str(&wait.to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
    }
    response
}

pub type AppResult<T> = Result<T, AppError>;
