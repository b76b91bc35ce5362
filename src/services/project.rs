use crate::{
    error::{AppError, AppResult},
    services::{
        github::{GitHubClient, GitHubError},
        project_cache::{ProjectCache, ProjectLoader},
        submission::{normalize, sort_projects, ProjectSort, Submission, SubmissionWithVotes},
        vote::VoteService,
        vote_hydrator::{VoteHydrator, VoteTarget},
    },
};
use futures_util::FutureExt;
use sea_orm::DatabaseConnection;
use std::collections::HashMap;
use std::sync::Arc;

/// Loader for [`ProjectCache`]: fetch submission issues, normalize them and
/// attach vote counts. Counts are best-effort; viewer flags are left unset
/// because the cached list is shared.
pub fn project_loader(github: GitHubClient, hydrator: VoteHydrator) -> ProjectLoader {
    Arc::new(move || {
        let github = github.clone();
        let hydrator = hydrator.clone();
        async move { load_projects(&github, &hydrator).await }.boxed()
    })
}

async fn load_projects(
    github: &GitHubClient,
    hydrator: &VoteHydrator,
) -> Result<Vec<SubmissionWithVotes>, GitHubError> {
    let issues = github.list_submissions().await?;
    let submissions: Vec<Submission> = issues.iter().map(normalize).collect();
    warn_duplicate_slugs(&submissions);

    let ids = issue_ids(submissions.iter());
    let tally = hydrator
        .hydrate_or_default(VoteTarget::Project, &ids, None)
        .await;

    Ok(submissions
        .into_iter()
        .map(|submission| {
            let upvote_count = tally.count(&submission.issue_number.to_string());
            SubmissionWithVotes {
                submission,
                upvote_count,
                has_upvoted: false,
            }
        })
        .collect())
}

fn issue_ids<'a>(submissions: impl Iterator<Item = &'a Submission>) -> Vec<String> {
    submissions.map(|s| s.issue_number.to_string()).collect()
}

fn warn_duplicate_slugs(submissions: &[Submission]) {
    let mut seen: HashMap<&str, u64> = HashMap::new();
    for s in submissions {
        if let Some(previous) = seen.insert(s.slug.as_str(), s.issue_number) {
            tracing::warn!(
                slug = %s.slug,
                issue = s.issue_number,
                previous_issue = previous,
                "duplicate project slug"
            );
        }
    }
}

pub struct ProjectService {
    db: DatabaseConnection,
    cache: ProjectCache,
}

impl ProjectService {
    pub fn new(db: DatabaseConnection, cache: ProjectCache) -> Self {
        Self { db, cache }
    }

    /// Cached list with `hasUpvoted` filled in for `viewer`.
    pub async fn list(
        &self,
        viewer: Option<&str>,
        sort: ProjectSort,
    ) -> AppResult<Vec<SubmissionWithVotes>> {
        let cached = self.cache.get().await?;
        let mut projects: Vec<SubmissionWithVotes> = cached.as_ref().clone();
        self.mark_viewer_votes(&mut projects, viewer).await;
        sort_projects(&mut projects, sort);
        Ok(projects)
    }

    pub async fn get(&self, issue_number: u64, viewer: Option<&str>) -> AppResult<SubmissionWithVotes> {
        let cached = self.cache.get().await?;
        let project = cached
            .iter()
            .find(|p| p.submission.issue_number == issue_number)
            .cloned()
            .ok_or(AppError::NotFound("Project"))?;

        let mut one = [project];
        self.mark_viewer_votes(&mut one, viewer).await;
        let [project] = one;
        Ok(project)
    }

    pub async fn toggle_vote(&self, user_id: &str, issue_number: u64) -> AppResult<bool> {
        let cached = self.cache.get().await?;
        if !cached
            .iter()
            .any(|p| p.submission.issue_number == issue_number)
        {
            return Err(AppError::NotFound("Project"));
        }

        let voted = VoteService::new(self.db.clone())
            .toggle(user_id, VoteTarget::Project, &issue_number.to_string())
            .await?;
        self.cache.invalidate().await;
        Ok(voted)
    }

    pub async fn refresh(&self) {
        self.cache.invalidate().await;
    }

    async fn mark_viewer_votes(&self, projects: &mut [SubmissionWithVotes], viewer: Option<&str>) {
        if viewer.is_none() || projects.is_empty() {
            return;
        }

        let ids = issue_ids(projects.iter().map(|p| &p.submission));
        let voted = VoteHydrator::new(self.db.clone())
            .viewer_votes_or_default(VoteTarget::Project, &ids, viewer)
            .await;

        for project in projects.iter_mut() {
            project.has_upvoted = voted.contains(&project.submission.issue_number.to_string());
        }
    }
}
