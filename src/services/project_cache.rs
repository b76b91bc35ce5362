use crate::services::github::GitHubError;
use crate::services::submission::SubmissionWithVotes;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

pub type Projects = Arc<Vec<SubmissionWithVotes>>;
pub type ProjectsResult = Result<Projects, GitHubError>;

/// Produces one upstream fetch of the full project list.
pub type ProjectLoader =
    Arc<dyn Fn() -> BoxFuture<'static, Result<Vec<SubmissionWithVotes>, GitHubError>> + Send + Sync>;

type PendingFetch = Shared<BoxFuture<'static, ProjectsResult>>;

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: StdMutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: StdMutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.origin + offset
    }
}

#[derive(Default)]
struct CacheState {
    data: Option<Projects>,
    expires_at: Option<Instant>,
    pending: Option<PendingFetch>,
    /// Bumped by `invalidate`; a fetch only writes back if it still matches.
    generation: u64,
}

/// Process-wide cache of the submission list.
///
/// Concurrent misses share one upstream fetch. Failures are handed to every
/// waiting caller and never cached.
#[derive(Clone)]
pub struct ProjectCache {
    state: Arc<Mutex<CacheState>>,
    loader: ProjectLoader,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    fetch_timeout: Duration,
}

impl ProjectCache {
    pub fn new(
        loader: ProjectLoader,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            loader,
            clock,
            ttl,
            fetch_timeout,
        }
    }

    pub async fn get(&self) -> ProjectsResult {
        let fetch = {
            let mut state = self.state.lock().await;

            if let (Some(data), Some(expires_at)) = (&state.data, state.expires_at) {
                if self.clock.now() < expires_at {
                    return Ok(Arc::clone(data));
                }
            }

            match &state.pending {
                Some(pending) => pending.clone(),
                None => {
                    let fetch = self.start_fetch(state.generation);
                    state.pending = Some(fetch.clone());
                    fetch
                }
            }
        };

        fetch.await
    }

    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        state.data = None;
        state.expires_at = None;
        state.pending = None;
        state.generation = state.generation.wrapping_add(1);
        tracing::debug!(generation = state.generation, "project cache invalidated");
    }

    fn start_fetch(&self, generation: u64) -> PendingFetch {
        let loader = Arc::clone(&self.loader);
        let state = Arc::clone(&self.state);
        let clock = Arc::clone(&self.clock);
        let ttl = self.ttl;
        let fetch_timeout = self.fetch_timeout;

        async move {
            let result = match tokio::time::timeout(fetch_timeout, loader()).await {
                Ok(Ok(projects)) => Ok(Arc::new(projects)),
                Ok(Err(err)) => Err(err),
                Err(_) => Err(GitHubError::Timeout),
            };

            let mut guard = state.lock().await;
            if guard.generation == generation {
                guard.pending = None;
                match &result {
                    Ok(data) => {
                        guard.data = Some(Arc::clone(data));
                        guard.expires_at = Some(clock.now() + ttl);
                    }
                    Err(err) => tracing::warn!("project fetch failed: {}", err),
                }
            }

            result
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::submission::{normalize, IssueUser, RawIssue};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn project(number: u64) -> SubmissionWithVotes {
        let issue = RawIssue {
            id: number,
            number,
            title: format!("Project {number}"),
            body: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            html_url: String::new(),
            user: Some(IssueUser {
                login: "dev".to_string(),
                avatar_url: String::new(),
            }),
            labels: vec![],
            pull_request: None,
        };
        SubmissionWithVotes {
            submission: normalize(&issue),
            upvote_count: 0,
            has_upvoted: false,
        }
    }

    /// Loader that counts calls and returns one project numbered by the call.
    fn counting_loader(calls: Arc<AtomicUsize>, delay: Duration) -> ProjectLoader {
        Arc::new(move || {
            let calls = Arc::clone(&calls);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) as u64 + 1;
                tokio::time::sleep(delay).await;
                Ok(vec![project(n)])
            }
            .boxed()
        })
    }

    fn cache_with(loader: ProjectLoader, clock: Arc<ManualClock>) -> ProjectCache {
        ProjectCache::new(loader, clock, Duration::from_secs(60), Duration::from_secs(15))
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = cache_with(
            counting_loader(Arc::clone(&calls), Duration::from_millis(20)),
            Arc::new(ManualClock::new()),
        );

        let (a, b, c) = tokio::join!(cache.get(), cache.get(), cache.get());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
        assert!(Arc::ptr_eq(&a, &b) && Arc::ptr_eq(&b, &c));
    }

    #[tokio::test]
    async fn fresh_data_is_served_until_ttl_elapses() {
        let calls = Arc::new(AtomicUsize::new(0));
        let clock = Arc::new(ManualClock::new());
        let cache = cache_with(
            counting_loader(Arc::clone(&calls), Duration::ZERO),
            Arc::clone(&clock),
        );

        cache.get().await.unwrap();
        clock.advance(Duration::from_secs(59));
        let cached = cache.get().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cached[0].submission.issue_number, 1);

        clock.advance(Duration::from_secs(1));
        let refreshed = cache.get().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(refreshed[0].submission.issue_number, 2);
    }

    #[tokio::test]
    async fn failure_is_shared_and_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader_calls = Arc::clone(&calls);
        let loader: ProjectLoader = Arc::new(move || {
            let calls = Arc::clone(&loader_calls);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                if n == 0 {
                    Err(GitHubError::Api { status: 500 })
                } else {
                    Ok(vec![project(7)])
                }
            }
            .boxed()
        });
        let cache = cache_with(loader, Arc::new(ManualClock::new()));

        let (a, b) = tokio::join!(cache.get(), cache.get());
        assert_eq!(a.unwrap_err(), GitHubError::Api { status: 500 });
        assert_eq!(b.unwrap_err(), GitHubError::Api { status: 500 });
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let retried = cache.get().await.unwrap();
        assert_eq!(retried[0].submission.issue_number, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_times_out() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = ProjectCache::new(
            counting_loader(Arc::clone(&calls), Duration::from_secs(30)),
            Arc::new(SystemClock),
            Duration::from_secs(60),
            Duration::from_secs(15),
        );

        assert_eq!(cache.get().await.unwrap_err(), GitHubError::Timeout);
        // The slot was released, so the next call starts a new fetch.
        assert_eq!(cache.get().await.unwrap_err(), GitHubError::Timeout);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = cache_with(
            counting_loader(Arc::clone(&calls), Duration::ZERO),
            Arc::new(ManualClock::new()),
        );

        cache.get().await.unwrap();
        cache.invalidate().await;
        let fresh = cache.get().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(fresh[0].submission.issue_number, 2);
    }

    #[tokio::test]
    async fn fetch_started_before_invalidate_does_not_repopulate() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = cache_with(
            counting_loader(Arc::clone(&calls), Duration::from_millis(30)),
            Arc::new(ManualClock::new()),
        );

        let stale = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get().await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.invalidate().await;

        let stale = stale.await.unwrap().unwrap();
        assert_eq!(stale[0].submission.issue_number, 1);

        let next = cache.get().await.unwrap();
        assert_eq!(next[0].submission.issue_number, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
