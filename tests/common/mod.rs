#![allow(dead_code)]

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing, Json, Router,
};
use hackathon_api::{
    config::{github::GitHubConfig, openai::OpenAiConfig},
    services::{
        chat::ChatRelay,
        github::GitHubClient,
        project::project_loader,
        project_cache::{ProjectCache, SystemClock},
        vote_hydrator::VoteHydrator,
    },
};
use reqwest::Client;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    Arc, Once,
};
use std::time::Duration;
use tokio::sync::OnceCell;

static INIT: Once = Once::new();
static MIGRATED: OnceCell<()> = OnceCell::const_new();
static USER_COUNTER: AtomicU64 = AtomicU64::new(1);
static ISSUE_BASE: AtomicU64 = AtomicU64::new(1);

pub const OWNER: &str = "test-org";
pub const REPO: &str = "test-hackathon";
/// Seconds until the mock tracker's rate limit resets.
pub const RATE_LIMIT_RESET_SECS: i64 = 600;

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
    });
}

/// State of the fake issue tracker behind one test app.
#[derive(Clone, Default)]
pub struct MockGitHub {
    pub issues: Arc<std::sync::Mutex<Vec<Value>>>,
    pub issue_calls: Arc<AtomicUsize>,
    pub fail_issues: Arc<AtomicBool>,
    /// Answer the issue listing with an exhausted rate limit.
    pub rate_limit_issues: Arc<AtomicBool>,
}

impl MockGitHub {
    pub fn calls(&self) -> usize {
        self.issue_calls.load(Ordering::SeqCst)
    }
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
    pub github: MockGitHub,
    /// Issue numbers served by the mock tracker, in creation order.
    pub issue_numbers: Vec<u64>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.addr, path)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TestOptions {
    pub chat_enabled: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self { chat_enabled: true }
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(TestOptions::default()).await
}

pub async fn spawn_app_with(options: TestOptions) -> TestApp {
    init_env();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    // Migrate and clean once per test binary; tests then only touch rows they create.
    MIGRATED
        .get_or_init(|| async {
            hackathon_api::migration::Migrator::up(&db, None)
                .await
                .expect("Failed to run migrations");
            cleanup_tables(&db).await;
        })
        .await;

    let base = ISSUE_BASE.fetch_add(10, Ordering::SeqCst) * 100;
    let issue_numbers = vec![base + 1, base + 2, base + 3];
    let github = MockGitHub::default();
    *github.issues.lock().unwrap() = vec![
        sample_issue(
            issue_numbers[0],
            "[SUBMISSION] Swap Pilot",
            "### Project Name\nSwap Pilot\n\n### Description\nRoutes swaps.\n\n### Category\nDeFi Automation\n\n### Team Members\nalice, bob\n\n### GitHub Repository\nhttps://github.com/alice/swap-pilot\n\n### Demo URL\n_No response_\n\n### Technical Stack\nRust, Uniswap SDK",
            "2026-02-10T12:00:00Z",
        ),
        sample_issue(
            issue_numbers[1],
            "[SUBMISSION] Liquidity Lens",
            "### Category\nAnalytics",
            "2026-02-11T12:00:00Z",
        ),
        sample_issue(
            issue_numbers[2],
            "Plain idea",
            "no headings here",
            "2026-02-09T12:00:00Z",
        ),
    ];

    let mock_github_addr = serve(mock_github_router(github.clone())).await;
    let mock_openai_addr = serve(mock_openai_router()).await;

    let github_config = GitHubConfig {
        api_url: format!("http://{}", mock_github_addr),
        token: None,
        owner: OWNER.to_string(),
        repo: REPO.to_string(),
        submission_label: "hackathon-submission".to_string(),
        timeout: Duration::from_secs(5),
    };
    let openai_config = OpenAiConfig {
        api_url: format!("http://{}", mock_openai_addr),
        api_key: options.chat_enabled.then(|| "test-key".to_string()),
        model: "test-model".to_string(),
        timeout: Duration::from_secs(5),
    };

    let chat_relay =
        ChatRelay::new(openai_config, &github_config).expect("Failed to build chat relay");
    let github_client = GitHubClient::new(github_config).expect("Failed to build GitHub client");
    let project_cache = ProjectCache::new(
        project_loader(github_client.clone(), VoteHydrator::new(db.clone())),
        Arc::new(SystemClock),
        Duration::from_secs(60),
        Duration::from_secs(5),
    );

    let app = Router::new()
        .route("/", routing::get(|| async { "ok" }))
        .merge(hackathon_api::routes::create_routes())
        .layer(axum::middleware::from_fn(
            hackathon_api::middleware::cors_middleware,
        ))
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(github_client))
        .layer(axum::extract::Extension(project_cache))
        .layer(axum::extract::Extension(chat_relay));

    let addr = serve(app).await;

    TestApp {
        addr: format!("http://{}", addr),
        db,
        client: Client::new(),
        github,
        issue_numbers,
    }
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    addr
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let tables = ["votes", "forum_comments", "forum_posts", "profiles"];

    for table in tables {
        let sql = format!("TRUNCATE TABLE {} CASCADE", table);
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql,
            ))
            .await;
    }
}

fn sample_issue(number: u64, title: &str, body: &str, created_at: &str) -> Value {
    json!({
        "id": number * 10,
        "number": number,
        "title": title,
        "body": body,
        "created_at": created_at,
        "updated_at": created_at,
        "html_url": format!("https://github.com/{OWNER}/{REPO}/issues/{number}"),
        "user": { "login": "alice", "avatar_url": "https://avatars.example/alice" },
        "labels": [{ "name": "hackathon-submission" }],
    })
}

/// Tokens of the form `valid-<id>` resolve to user `<id>`; anything else is rejected.
fn mock_github_router(state: MockGitHub) -> Router {
    async fn user(headers: HeaderMap) -> impl IntoResponse {
        let id = headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer valid-"))
            .and_then(|id| id.parse::<u64>().ok());

        match id {
            Some(id) => (
                StatusCode::OK,
                Json(json!({
                    "id": id,
                    "login": format!("hacker{id}"),
                    "avatar_url": format!("https://avatars.example/{id}"),
                })),
            ),
            None => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Bad credentials" })),
            ),
        }
    }

    async fn issues(
        State(state): State<MockGitHub>,
        Query(params): Query<HashMap<String, String>>,
    ) -> axum::response::Response {
        state.issue_calls.fetch_add(1, Ordering::SeqCst);
        if state.fail_issues.load(Ordering::SeqCst) {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "message": "unavailable" })),
            )
                .into_response();
        }
        if state.rate_limit_issues.load(Ordering::SeqCst) {
            let reset = (chrono::Utc::now().timestamp() + RATE_LIMIT_RESET_SECS).to_string();
            return (
                StatusCode::FORBIDDEN,
                [
                    ("x-ratelimit-remaining", "0".to_string()),
                    ("x-ratelimit-reset", reset),
                ],
                Json(json!({ "message": "API rate limit exceeded" })),
            )
                .into_response();
        }

        let page = params.get("page").map(String::as_str).unwrap_or("1");
        let body = if page == "1" {
            Value::Array(state.issues.lock().unwrap().clone())
        } else {
            json!([])
        };
        (StatusCode::OK, Json(body)).into_response()
    }

    Router::new()
        .route("/user", routing::get(user))
        .route("/repos/{owner}/{repo}/issues", routing::get(issues))
        .with_state(state)
}

/// Streams "Hello" + " world". A last message of "fail" gets a 500.
fn mock_openai_router() -> Router {
    async fn completions(Json(body): Json<Value>) -> axum::response::Response {
        let last = body["messages"]
            .as_array()
            .and_then(|m| m.last())
            .and_then(|m| m["content"].as_str())
            .unwrap_or_default()
            .to_string();

        if last == "fail" {
            return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
        }

        let events = [
            r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#,
            r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#,
            r#"data: {"choices":[{"delta":{"content":" world"}}]}"#,
            "data: [DONE]",
        ];
        let sse: String = events.iter().map(|e| format!("{e}\n\n")).collect();

        (
            [(axum::http::header::CONTENT_TYPE, "text/event-stream")],
            sse,
        )
            .into_response()
    }

    Router::new().route("/chat/completions", routing::post(completions))
}

/// A fresh identity; returns the bearer token and profile id.
pub fn new_user() -> (String, String) {
    let id = 900_000 + USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    (format!("valid-{id}"), id.to_string())
}

pub async fn create_post(app: &TestApp, token: &str, title: &str, category: &str) -> Value {
    let resp = app
        .client
        .post(app.url("/forum/posts"))
        .bearer_auth(token)
        .json(&json!({
            "title": title,
            "content": format!("Body of **{title}**"),
            "category": category,
        }))
        .send()
        .await
        .expect("Failed to create post");

    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse post response");
    assert_eq!(status, 201, "create post failed: {body}");
    body["post"].clone()
}

pub async fn create_comment(
    app: &TestApp,
    token: &str,
    post_id: &str,
    parent_id: Option<&str>,
    content: &str,
) -> Value {
    let resp = app
        .client
        .post(app.url("/forum/comments"))
        .bearer_auth(token)
        .json(&json!({
            "postId": post_id,
            "parentId": parent_id,
            "content": content,
        }))
        .send()
        .await
        .expect("Failed to create comment");

    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse comment response");
    assert_eq!(status, 201, "create comment failed: {body}");
    body["comment"].clone()
}
