use crate::error::AppResult;
use crate::services::chat::{prepare_messages, ChatMessage, ChatRelay};
use axum::{
    body::Body,
    extract::rejection::JsonRejection,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    /// Conversation so far; only user and assistant roles are accepted
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,
}

#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Answer streamed as plain text", content_type = "text/plain"),
        (status = 400, description = "Invalid conversation", body = crate::error::AppError),
        (status = 502, description = "Model provider failed", body = crate::error::AppError),
        (status = 503, description = "Assistant not configured", body = crate::error::AppError),
    ),
    tag = "chat"
)]
pub async fn chat(
    Extension(relay): Extension<ChatRelay>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(payload) = payload?;
    let messages = prepare_messages(payload.messages)?;

    tracing::debug!(messages = messages.len(), "relaying chat");
    let deltas = relay.stream(messages).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(deltas),
    )
        .into_response())
}
