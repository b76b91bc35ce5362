mod config;
mod error;
mod handlers;
mod middleware;
mod migration;
mod models;
mod routes;
mod services;
mod utils;

use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};
use config::{cache::ProjectCacheConfig, github::GitHubConfig, openai::OpenAiConfig};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use services::{
    chat::ChatRelay,
    github::GitHubClient,
    project::project_loader,
    project_cache::{ProjectCache, SystemClock},
    vote_hydrator::VoteHydrator,
};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Forum
        crate::handlers::auth::sign_in,
        crate::handlers::post::list_posts,
        crate::handlers::post::get_post,
        crate::handlers::post::create_post,
        crate::handlers::comment::list_comments,
        crate::handlers::comment::create_comment,
        crate::handlers::vote::toggle_vote,
        // Projects
        crate::handlers::project::list_projects,
        crate::handlers::project::get_project,
        crate::handlers::project::vote_project,
        crate::handlers::project::refresh_projects,
        // Chat
        crate::handlers::chat::chat,
    ),
    components(
        schemas(
            crate::error::AppError,
            // Forum
            crate::handlers::auth::ProfileEnvelope,
            crate::handlers::auth::ProfileResponse,
            crate::handlers::post::CreatePostRequest,
            crate::handlers::post::PostListResponse,
            crate::handlers::post::PostEnvelope,
            crate::handlers::comment::CreateCommentRequest,
            crate::handlers::comment::CommentListResponse,
            crate::handlers::comment::CommentEnvelope,
            crate::handlers::vote::VoteRequest,
            crate::handlers::vote::VoteResponse,
            crate::services::forum::PostView,
            crate::services::forum::ForumCategory,
            crate::services::comment_tree::CommentNode,
            crate::services::profile::AuthorSummary,
            // Projects
            crate::handlers::project::ProjectListResponse,
            crate::handlers::project::ProjectEnvelope,
            crate::handlers::project::ProjectVoteResponse,
            crate::handlers::project::RefreshResponse,
            crate::services::submission::Submission,
            crate::services::submission::SubmissionWithVotes,
            crate::services::submission::ProjectSort,
            // Chat
            crate::handlers::chat::ChatRequest,
            crate::services::chat::ChatMessage,
        )
    ),
    modifiers(&BearerToken),
    tags(
        (name = "forum", description = "Posts, comments, votes and profiles"),
        (name = "projects", description = "Hackathon submissions read from the issue tracker"),
        (name = "chat", description = "Streaming assistant"),
    )
)]
struct ApiDoc;

/// GitHub access token sent as `Authorization: Bearer <token>`.
struct BearerToken;

impl Modify for BearerToken {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_token",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    init_tracing();

    // Validate configuration before doing anything else
    validate_config()?;

    tracing::info!("Starting Hackathon API v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let github_config = GitHubConfig::from_env();
    tracing::info!(repository = %github_config.repository(), "Reading submissions");

    let chat_relay = ChatRelay::new(OpenAiConfig::from_env(), &github_config)?;
    if chat_relay.is_configured() {
        tracing::info!("Chat assistant configured");
    } else {
        tracing::warn!("OPENAI_API_KEY not set, /api/chat will answer 503");
    }

    let github = GitHubClient::new(github_config)?;

    let cache_config = ProjectCacheConfig::from_env();
    let project_cache = ProjectCache::new(
        project_loader(github.clone(), VoteHydrator::new(db.clone())),
        Arc::new(SystemClock),
        cache_config.ttl,
        cache_config.fetch_timeout,
    );

    let app = create_app()
        .layer(Extension(db))
        .layer(Extension(github))
        .layer(Extension(project_cache))
        .layer(Extension(chat_relay));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "hackathon_api=debug,tower_http=debug,axum=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match env::var("LOG_FORMAT").as_deref() {
        Ok("json") => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init(),
        _ => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Validate required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<()> {
    // DATABASE_URL: checked here for early error; actual connection happens later
    if config::non_empty_env("DATABASE_URL").is_none() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    if let Ok(port) = env::var("PORT") {
        port.parse::<u16>()
            .map_err(|e| anyhow::anyhow!("Invalid PORT '{}': {}", port, e))?;
    }

    Ok(())
}

fn create_app() -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(middleware::cors_middleware))
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
async fn health_check(Extension(db): Extension<DatabaseConnection>) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "Hackathon API",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
