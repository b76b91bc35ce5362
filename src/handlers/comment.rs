use crate::error::{AppError, AppResult};
use crate::handlers::post::validation_error;
use crate::middleware::auth::{AuthUser, Viewer};
use crate::services::comment::{CommentService, CommentWithAuthor};
use crate::services::comment_tree::{build_tree, CommentNode};
use crate::services::profile::AuthorSummary;
use crate::services::vote_hydrator::{VoteHydrator, VoteTarget};
use crate::utils::render_markdown;
use axum::{
    extract::{rejection::JsonRejection, Query},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub post_id: String,
    pub parent_id: Option<String>,
    /// Markdown content (1-5000 characters)
    #[serde(default)]
    #[validate(length(min = 1, max = 5000, message = "Content is required and must be 1-5000 characters"))]
    pub content: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CommentListQuery {
    pub post_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentListResponse {
    pub comments: Vec<CommentNode>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentEnvelope {
    pub comment: CommentNode,
}

fn to_node((comment, author): CommentWithAuthor, has_upvoted: bool) -> CommentNode {
    let author = match author {
        Some(profile) => AuthorSummary::from(profile),
        None => AuthorSummary::unknown(comment.author_id.clone()),
    };
    CommentNode {
        id: comment.id,
        post_id: comment.post_id,
        parent_id: comment.parent_id,
        author,
        content_html: render_markdown(&comment.content),
        content: comment.content,
        upvote_count: comment.upvote_count.max(0) as u64,
        has_upvoted,
        created_at: comment.created_at.and_utc(),
        replies: Vec::new(),
    }
}

fn parse_id(raw: &str, field: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::Validation(format!("{field} must be a valid id")))
}

#[utoipa::path(
    get,
    path = "/api/forum/comments",
    params(CommentListQuery),
    responses(
        (status = 200, description = "Comment tree, oldest first", body = CommentListResponse),
        (status = 400, description = "Missing postId", body = AppError),
    ),
    tag = "forum"
)]
pub async fn list_comments(
    Extension(db): Extension<DatabaseConnection>,
    viewer: Viewer,
    Query(query): Query<CommentListQuery>,
) -> AppResult<impl IntoResponse> {
    let post_id = match query.post_id.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => parse_id(raw, "postId")?,
        _ => {
            return Err(AppError::Validation(
                "postId query parameter is required".to_string(),
            ))
        }
    };

    let rows = CommentService::new(db.clone()).list_by_post(post_id).await?;

    let ids: Vec<String> = rows.iter().map(|(c, _)| c.id.to_string()).collect();
    let voted = VoteHydrator::new(db)
        .viewer_votes_or_default(VoteTarget::Comment, &ids, viewer.id())
        .await;

    let nodes = rows
        .into_iter()
        .map(|row| {
            let has_upvoted = voted.contains(&row.0.id.to_string());
            to_node(row, has_upvoted)
        })
        .collect();

    Ok(Json(CommentListResponse {
        comments: build_tree(nodes),
    }))
}

#[utoipa::path(
    post,
    path = "/api/forum/comments",
    security(("bearer_token" = [])),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentEnvelope),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "forum"
)]
pub async fn create_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload?;

    if payload.post_id.trim().is_empty() {
        return Err(AppError::Validation("postId is required".to_string()));
    }
    payload.validate().map_err(validation_error)?;

    let post_id = parse_id(&payload.post_id, "postId")?;
    let parent_id = match payload.parent_id.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(parse_id(raw, "parentId")?),
        _ => None,
    };

    let row = CommentService::new(db)
        .create(post_id, &auth_user.profile_id, parent_id, &payload.content)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CommentEnvelope {
            comment: to_node(row, false),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_is_capped_at_5000() {
        let ok = CreateCommentRequest {
            post_id: Uuid::new_v4().to_string(),
            parent_id: None,
            content: "x".repeat(5000),
        };
        assert!(ok.validate().is_ok());

        let too_long = CreateCommentRequest {
            content: "x".repeat(5001),
            ..ok
        };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn ids_must_parse() {
        assert!(parse_id("nope", "postId").is_err());
        assert!(parse_id(&Uuid::nil().to_string(), "postId").is_ok());
    }
}
