use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::{auth_middleware, optional_auth_middleware};
use axum::{middleware, routing, routing::MethodRouter, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new().nest("/api", api_routes())
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let auth = auth_routes(&rate_limit_config);
    let public_read = public_read_routes(&rate_limit_config);
    let protected = protected_routes(&rate_limit_config);
    let chat = chat_routes(&rate_limit_config);

    auth.merge(public_read).merge(protected).merge(chat)
}

/// Token exchange for the forum profile.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new().route(
        "/forum/auth",
        authenticated(routing::post(handlers::auth::sign_in)),
    );

    with_optional_rate_limit(router, config.enabled, config.auth)
}

/// Public reads. A valid token only adds `hasUpvoted` flags.
fn public_read_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Forum
        .route(
            "/forum/posts",
            with_viewer(routing::get(handlers::post::list_posts)),
        )
        .route(
            "/forum/posts/{id}",
            with_viewer(routing::get(handlers::post::get_post)),
        )
        .route(
            "/forum/comments",
            with_viewer(routing::get(handlers::comment::list_comments)),
        )
        // Projects
        .route(
            "/projects",
            with_viewer(routing::get(handlers::project::list_projects)),
        )
        .route(
            "/projects/{issue_number}",
            with_viewer(routing::get(handlers::project::get_project)),
        );

    with_optional_rate_limit(router, config.enabled, config.public_read)
}

/// Authenticated writes.
fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Forum
        .route(
            "/forum/posts",
            authenticated(routing::post(handlers::post::create_post)),
        )
        .route(
            "/forum/comments",
            authenticated(routing::post(handlers::comment::create_comment)),
        )
        .route(
            "/forum/vote",
            authenticated(routing::post(handlers::vote::toggle_vote)),
        )
        // Projects
        .route(
            "/projects/refresh",
            authenticated(routing::post(handlers::project::refresh_projects)),
        )
        .route(
            "/projects/{issue_number}/vote",
            authenticated(routing::post(handlers::project::vote_project)),
        );

    with_optional_rate_limit(router, config.enabled, config.protected)
}

fn chat_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new().route("/chat", routing::post(handlers::chat::chat));

    with_optional_rate_limit(router, config.enabled, config.chat)
}

/// Layered on the method router so unmatched methods still get 405, not 401.
fn authenticated(route: MethodRouter) -> MethodRouter {
    route.route_layer(middleware::from_fn(auth_middleware))
}

fn with_viewer(route: MethodRouter) -> MethodRouter {
    route.route_layer(middleware::from_fn(optional_auth_middleware))
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let Some(governor_conf) = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
    else {
        tracing::error!(?rule, "invalid rate limit rule, serving without a limit");
        return router;
    };

    router.layer(GovernorLayer::new(governor_conf))
}
