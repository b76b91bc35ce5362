use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use axum::{response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub name: String,
    pub avatar_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileEnvelope {
    pub profile: ProfileResponse,
}

/// Exchange a GitHub token for the caller's forum profile. The auth layer
/// has already created or refreshed it.
#[utoipa::path(
    post,
    path = "/api/forum/auth",
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "Profile for the token", body = ProfileEnvelope),
        (status = 401, description = "Missing or invalid token", body = crate::error::AppError),
    ),
    tag = "forum"
)]
pub async fn sign_in(auth_user: AuthUser) -> AppResult<impl IntoResponse> {
    tracing::info!(profile_id = %auth_user.profile_id, "profile signed in");
    Ok(Json(ProfileEnvelope {
        profile: ProfileResponse {
            id: auth_user.profile_id,
            name: auth_user.name,
            avatar_url: auth_user.avatar_url,
        },
    }))
}
