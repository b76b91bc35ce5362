use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, Viewer};
use crate::services::project::ProjectService;
use crate::services::project_cache::ProjectCache;
use crate::services::submission::{ProjectSort, SubmissionWithVotes};
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize)]
pub struct ProjectListQuery {
    pub sort: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectListResponse {
    pub projects: Vec<SubmissionWithVotes>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectEnvelope {
    pub project: SubmissionWithVotes,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectVoteResponse {
    pub voted: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub refreshed: bool,
}

/// Unknown values fall back to the default order.
fn parse_sort(raw: Option<&str>) -> ProjectSort {
    match raw.map(str::trim) {
        Some("newest") => ProjectSort::Newest,
        Some("oldest") => ProjectSort::Oldest,
        _ => ProjectSort::Votes,
    }
}

fn parse_issue_number(raw: &str) -> AppResult<u64> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or(AppError::NotFound("Project"))
}

#[utoipa::path(
    get,
    path = "/api/projects",
    params(("sort" = Option<String>, Query, description = "votes (default), newest or oldest")),
    responses(
        (status = 200, description = "Submitted projects", body = ProjectListResponse),
        (status = 429, description = "Tracker rate limit reached", body = AppError),
        (status = 502, description = "Tracker unavailable", body = AppError),
        (status = 504, description = "Tracker timed out", body = AppError),
    ),
    tag = "projects"
)]
pub async fn list_projects(
    Extension(db): Extension<DatabaseConnection>,
    Extension(cache): Extension<ProjectCache>,
    viewer: Viewer,
    Query(query): Query<ProjectListQuery>,
) -> AppResult<impl IntoResponse> {
    let projects = ProjectService::new(db, cache)
        .list(viewer.id(), parse_sort(query.sort.as_deref()))
        .await?;

    Ok(Json(ProjectListResponse { projects }))
}

#[utoipa::path(
    get,
    path = "/api/projects/{issueNumber}",
    params(("issueNumber" = u64, Path, description = "Submission issue number")),
    responses(
        (status = 200, description = "Project", body = ProjectEnvelope),
        (status = 404, description = "Project not found", body = AppError),
    ),
    tag = "projects"
)]
pub async fn get_project(
    Extension(db): Extension<DatabaseConnection>,
    Extension(cache): Extension<ProjectCache>,
    viewer: Viewer,
    Path(issue_number): Path<String>,
) -> AppResult<impl IntoResponse> {
    let issue_number = parse_issue_number(&issue_number)?;
    let project = ProjectService::new(db, cache)
        .get(issue_number, viewer.id())
        .await?;

    Ok(Json(ProjectEnvelope { project }))
}

#[utoipa::path(
    post,
    path = "/api/projects/{issueNumber}/vote",
    security(("bearer_token" = [])),
    params(("issueNumber" = u64, Path, description = "Submission issue number")),
    responses(
        (status = 200, description = "Vote toggled", body = ProjectVoteResponse),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 404, description = "Project not found", body = AppError),
    ),
    tag = "projects"
)]
pub async fn vote_project(
    Extension(db): Extension<DatabaseConnection>,
    Extension(cache): Extension<ProjectCache>,
    auth_user: AuthUser,
    Path(issue_number): Path<String>,
) -> AppResult<impl IntoResponse> {
    let issue_number = parse_issue_number(&issue_number)?;
    let voted = ProjectService::new(db, cache)
        .toggle_vote(&auth_user.profile_id, issue_number)
        .await?;

    Ok(Json(ProjectVoteResponse { voted }))
}

#[utoipa::path(
    post,
    path = "/api/projects/refresh",
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "Cache cleared", body = RefreshResponse),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "projects"
)]
pub async fn refresh_projects(
    Extension(db): Extension<DatabaseConnection>,
    Extension(cache): Extension<ProjectCache>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    ProjectService::new(db, cache).refresh().await;
    tracing::info!(profile_id = %auth_user.profile_id, "project cache refreshed");

    Ok(Json(RefreshResponse { refreshed: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_falls_back_to_votes() {
        assert_eq!(parse_sort(None), ProjectSort::Votes);
        assert_eq!(parse_sort(Some("newest")), ProjectSort::Newest);
        assert_eq!(parse_sort(Some("oldest")), ProjectSort::Oldest);
        assert_eq!(parse_sort(Some("random")), ProjectSort::Votes);
    }

    #[test]
    fn issue_numbers_must_be_positive() {
        assert_eq!(parse_issue_number("17").unwrap(), 17);
        assert!(parse_issue_number("0").is_err());
        assert!(parse_issue_number("abc").is_err());
        assert!(parse_issue_number("-3").is_err());
    }
}
