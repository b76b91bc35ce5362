use super::non_empty_env;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::env;
use std::time::Duration;

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Connect the Postgres pool described by `DATABASE_URL` and
/// `DB_MAX_CONNECTIONS` / `DB_MIN_CONNECTIONS`.
pub async fn get_database() -> Result<DatabaseConnection, DbErr> {
    let database_url = non_empty_env("DATABASE_URL")
        .ok_or_else(|| DbErr::Custom("DATABASE_URL must be set".to_string()))?;

    let max_connections = env_u32("DB_MAX_CONNECTIONS", 10);
    let min_connections = env_u32("DB_MIN_CONNECTIONS", 2).min(max_connections);
    tracing::debug!(max_connections, min_connections, "connecting to database");

    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(max_connections)
        .min_connections(min_connections)
        .connect_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(false);

    Database::connect(opt).await
}
