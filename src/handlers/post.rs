use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, Viewer};
use crate::services::forum::{ForumCategory, PostView};
use crate::services::post::PostService;
use crate::services::ranking::PostSort;
use crate::services::vote_hydrator::{VoteHydrator, VoteTarget};
use axum::{
    extract::{rejection::JsonRejection, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePostRequest {
    /// Post title (1-200 characters)
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Title is required and must be 1-200 characters"))]
    pub title: String,
    /// Markdown content (1-10000 characters)
    #[serde(default)]
    #[validate(length(min = 1, max = 10000, message = "Content is required and must be 1-10000 characters"))]
    pub content: String,
    /// One of the ten forum categories
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PostListQuery {
    /// hot (default), new or top
    pub sort: Option<String>,
    /// Exact category name
    pub category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostListResponse {
    pub posts: Vec<PostView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostEnvelope {
    pub post: PostView,
}

pub(crate) fn validation_error(e: validator::ValidationErrors) -> AppError {
    // Prefer the field's own message over validator's verbose rendering.
    let message = e
        .field_errors()
        .values()
        .flat_map(|errors| errors.iter())
        .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| e.to_string());
    AppError::Validation(message)
}

#[utoipa::path(
    get,
    path = "/api/forum/posts",
    params(
        ("sort" = Option<String>, Query, description = "hot, new or top"),
        ("category" = Option<String>, Query, description = "Filter by category"),
    ),
    responses(
        (status = 200, description = "Posts", body = PostListResponse),
        (status = 400, description = "Unknown category", body = AppError),
    ),
    tag = "forum"
)]
pub async fn list_posts(
    Extension(db): Extension<DatabaseConnection>,
    viewer: Viewer,
    Query(query): Query<PostListQuery>,
) -> AppResult<impl IntoResponse> {
    let sort = PostSort::from_query(query.sort.as_deref());
    let category = match query.category.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(name) => Some(
            ForumCategory::parse(name)
                .ok_or_else(|| AppError::Validation(ForumCategory::invalid_message()))?,
        ),
    };

    let posts = PostService::new(db.clone()).list(sort, category).await?;

    let ids: Vec<String> = posts.iter().map(|(p, _)| p.id.to_string()).collect();
    let voted = VoteHydrator::new(db)
        .viewer_votes_or_default(VoteTarget::Post, &ids, viewer.id())
        .await;

    let posts = posts
        .into_iter()
        .map(|row| {
            let has_upvoted = voted.contains(&row.0.id.to_string());
            PostView::new(row, has_upvoted)
        })
        .collect();

    Ok(Json(PostListResponse { posts }))
}

#[utoipa::path(
    get,
    path = "/api/forum/posts/{id}",
    params(("id" = String, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post", body = PostEnvelope),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "forum"
)]
pub async fn get_post(
    Extension(db): Extension<DatabaseConnection>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = Uuid::parse_str(&id).map_err(|_| AppError::NotFound("Post"))?;
    let row = PostService::new(db.clone()).get(id).await?;

    let voted = VoteHydrator::new(db)
        .viewer_votes_or_default(VoteTarget::Post, &[id.to_string()], viewer.id())
        .await;

    Ok(Json(PostEnvelope {
        post: PostView::new(row, !voted.is_empty()),
    }))
}

#[utoipa::path(
    post,
    path = "/api/forum/posts",
    security(("bearer_token" = [])),
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostEnvelope),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "forum"
)]
pub async fn create_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload?;
    payload.validate().map_err(validation_error)?;

    let category = ForumCategory::parse(&payload.category)
        .ok_or_else(|| AppError::Validation(ForumCategory::invalid_message()))?;

    let row = PostService::new(db)
        .create(&auth_user.profile_id, &payload.title, &payload.content, category)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PostEnvelope {
            post: PostView::new(row, false),
        }),
    ))
}
