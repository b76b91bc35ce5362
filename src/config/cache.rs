use super::upstream_timeout;
use std::env;
use std::time::Duration;

const DEFAULT_PROJECT_CACHE_TTL_SECS: u64 = 60;

#[derive(Debug, Clone, Copy)]
pub struct ProjectCacheConfig {
    pub ttl: Duration,
    pub fetch_timeout: Duration,
}

impl ProjectCacheConfig {
    pub fn from_env() -> Self {
        let ttl_secs = env::var("PROJECT_CACHE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PROJECT_CACHE_TTL_SECS);

        Self {
            ttl: Duration::from_secs(ttl_secs),
            fetch_timeout: upstream_timeout(),
        }
    }
}
