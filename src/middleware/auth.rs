use crate::{
    error::AppError,
    services::{
        github::{GitHubClient, GitHubError},
        profile::ProfileService,
    },
};
use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
    Extension,
};
use sea_orm::DatabaseConnection;
use std::convert::Infallible;

/// The signed-in forum profile behind a bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub profile_id: String,
    pub name: String,
    pub avatar_url: String,
}

/// The caller on routes that work with or without a token.
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<AuthUser>);

impl Viewer {
    pub fn id(&self) -> Option<&str> {
        self.0.as_ref().map(|u| u.profile_id.as_str())
    }
}

/// Bearer authentication.
///
/// Resolves the token against GitHub, upserts the matching profile and puts
/// an [`AuthUser`] into request extensions.
pub async fn auth_middleware(
    Extension(db): Extension<DatabaseConnection>,
    Extension(github): Extension<GitHubClient>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&headers).ok_or(AppError::Unauthorized)?;
    let user = authenticate(&db, &github, &token).await?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Same check as [`auth_middleware`], but a missing or rejected token only
/// means "no viewer".
pub async fn optional_auth_middleware(
    Extension(db): Extension<DatabaseConnection>,
    Extension(github): Extension<GitHubClient>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_bearer_token(&headers) {
        match authenticate(&db, &github, &token).await {
            Ok(user) => {
                request.extensions_mut().insert(user);
            }
            Err(e) => tracing::debug!("ignoring viewer token: {}", e),
        }
    }
    next.run(request).await
}

async fn authenticate(
    db: &DatabaseConnection,
    github: &GitHubClient,
    token: &str,
) -> Result<AuthUser, AppError> {
    let identity = github.fetch_user(token).await.map_err(|e| match e {
        GitHubError::InvalidToken => AppError::Unauthorized,
        other => AppError::GitHub(other),
    })?;

    let profile = ProfileService::new(db.clone()).upsert(&identity).await?;

    Ok(AuthUser {
        profile_id: profile.id,
        name: profile.name,
        avatar_url: profile.avatar_url,
    })
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Viewer(parts.extensions.get::<AuthUser>().cloned()))
    }
}
