use crate::models::{vote, Vote};
use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult,
    QueryFilter, QuerySelect,
};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VoteTarget {
    Post,
    Comment,
    Project,
}

impl VoteTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            VoteTarget::Post => "post",
            VoteTarget::Comment => "comment",
            VoteTarget::Project => "project",
        }
    }
}

impl fmt::Display for VoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vote counts and the viewer's own votes for a batch of targets.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VoteTally {
    pub counts: HashMap<String, u64>,
    pub voted: HashSet<String>,
}

impl VoteTally {
    pub fn count(&self, id: &str) -> u64 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    pub fn has_voted(&self, id: &str) -> bool {
        self.voted.contains(id)
    }
}

#[derive(Debug, FromQueryResult)]
struct TargetCount {
    target_id: String,
    count: i64,
}

#[derive(Clone)]
pub struct VoteHydrator {
    db: DatabaseConnection,
}

impl VoteHydrator {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn counts(
        &self,
        target: VoteTarget,
        ids: &[String],
    ) -> Result<HashMap<String, u64>, DbErr> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = Vote::find()
            .select_only()
            .column(vote::Column::TargetId)
            .column_as(Expr::col(vote::Column::Id).count(), "count")
            .filter(vote::Column::TargetType.eq(target.as_str()))
            .filter(vote::Column::TargetId.is_in(ids.iter().cloned()))
            .group_by(vote::Column::TargetId)
            .into_model::<TargetCount>()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.target_id, row.count.max(0) as u64))
            .collect())
    }

    /// Targets among `ids` the viewer has voted for. Empty without a viewer.
    pub async fn viewer_votes(
        &self,
        target: VoteTarget,
        ids: &[String],
        viewer: Option<&str>,
    ) -> Result<HashSet<String>, DbErr> {
        let Some(viewer) = viewer else {
            return Ok(HashSet::new());
        };
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let voted: Vec<String> = Vote::find()
            .select_only()
            .column(vote::Column::TargetId)
            .filter(vote::Column::UserId.eq(viewer))
            .filter(vote::Column::TargetType.eq(target.as_str()))
            .filter(vote::Column::TargetId.is_in(ids.iter().cloned()))
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(voted.into_iter().collect())
    }

    /// [`viewer_votes`](Self::viewer_votes) with store failures logged and
    /// treated as "no votes".
    pub async fn viewer_votes_or_default(
        &self,
        target: VoteTarget,
        ids: &[String],
        viewer: Option<&str>,
    ) -> HashSet<String> {
        self.viewer_votes(target, ids, viewer)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(target_type = %target, "viewer vote lookup failed: {}", e);
                HashSet::new()
            })
    }

    pub async fn hydrate(
        &self,
        target: VoteTarget,
        ids: &[String],
        viewer: Option<&str>,
    ) -> Result<VoteTally, DbErr> {
        let counts = self.counts(target, ids).await?;
        let voted = self.viewer_votes(target, ids, viewer).await?;
        Ok(VoteTally { counts, voted })
    }

    /// Like [`hydrate`](Self::hydrate), but a store failure yields an empty
    /// tally instead of an error.
    pub async fn hydrate_or_default(
        &self,
        target: VoteTarget,
        ids: &[String],
        viewer: Option<&str>,
    ) -> VoteTally {
        match self.hydrate(target, ids, viewer).await {
            Ok(tally) => tally,
            Err(e) => {
                tracing::warn!(target_type = %target, "vote hydration failed: {}", e);
                VoteTally::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn offline() -> VoteHydrator {
        VoteHydrator::new(DatabaseConnection::Disconnected)
    }

    /// A store whose next `failures` queries all fail.
    fn failing(failures: usize) -> VoteHydrator {
        let errors = (0..failures).map(|_| DbErr::Custom("connection reset".to_string()));
        VoteHydrator::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors(errors)
                .into_connection(),
        )
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn empty_ids_issue_no_query() {
        let tally = offline()
            .hydrate(VoteTarget::Post, &[], Some("42"))
            .await
            .expect("no query should run");
        assert_eq!(tally, VoteTally::default());
    }

    #[tokio::test]
    async fn anonymous_viewer_has_no_votes() {
        let voted = offline()
            .viewer_votes(VoteTarget::Project, &ids(&["1", "2"]), None)
            .await
            .expect("no query should run");
        assert!(voted.is_empty());
    }

    #[tokio::test]
    async fn store_failure_degrades_to_zero() {
        let hydrator = failing(3);
        let targets = ids(&["1", "2"]);
        assert!(hydrator
            .hydrate(VoteTarget::Comment, &targets, Some("42"))
            .await
            .is_err());

        let tally = hydrator
            .hydrate_or_default(VoteTarget::Comment, &targets, Some("42"))
            .await;
        assert_eq!(tally.count("1"), 0);
        assert!(!tally.has_voted("2"));

        let voted = hydrator
            .viewer_votes_or_default(VoteTarget::Post, &targets, Some("42"))
            .await;
        assert!(voted.is_empty());
    }

    #[test]
    fn target_names() {
        assert_eq!(VoteTarget::Post.as_str(), "post");
        assert_eq!(VoteTarget::Comment.to_string(), "comment");
        let parsed: VoteTarget = serde_json::from_str("\"project\"").unwrap();
        assert_eq!(parsed, VoteTarget::Project);
    }
}
