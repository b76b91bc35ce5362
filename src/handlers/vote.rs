use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::services::vote::VoteService;
use crate::services::vote_hydrator::VoteTarget;
use axum::{extract::rejection::JsonRejection, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    /// post or comment
    #[serde(default)]
    pub target_type: String,
    #[serde(default)]
    pub target_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VoteResponse {
    /// Whether the caller has a vote on the target after the toggle
    pub voted: bool,
}

#[utoipa::path(
    post,
    path = "/api/forum/vote",
    security(("bearer_token" = [])),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Vote toggled", body = VoteResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 404, description = "Target not found", body = AppError),
    ),
    tag = "forum"
)]
pub async fn toggle_vote(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload?;

    let target = match payload.target_type.as_str() {
        "post" => VoteTarget::Post,
        "comment" => VoteTarget::Comment,
        _ => {
            return Err(AppError::Validation(
                "targetType must be \"post\" or \"comment\"".to_string(),
            ))
        }
    };
    if payload.target_id.trim().is_empty() {
        return Err(AppError::Validation("targetId is required".to_string()));
    }

    let voted = VoteService::new(db)
        .toggle(&auth_user.profile_id, target, &payload.target_id)
        .await?;

    Ok(Json(VoteResponse { voted }))
}
