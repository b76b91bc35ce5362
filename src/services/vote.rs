use crate::{
    error::{AppError, AppResult},
    models::{vote, ForumComment, ForumPost, Vote},
    services::vote_hydrator::VoteTarget,
};
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, Set, Statement, TransactionTrait,
};
use uuid::Uuid;

pub struct VoteService {
    db: DatabaseConnection,
}

impl VoteService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Flip the user's vote on a target. Returns whether the user now has a vote.
    ///
    /// Forum targets must exist and their `upvote_count` follows the change.
    /// Project targets are issue numbers; their existence is checked upstream.
    pub async fn toggle(&self, user_id: &str, target: VoteTarget, target_id: &str) -> AppResult<bool> {
        let forum_id = match target {
            VoteTarget::Post | VoteTarget::Comment => Some(parse_forum_id(target_id)?),
            VoteTarget::Project => None,
        };

        let target_id = match forum_id {
            Some(id) => id.to_string(),
            None => target_id.trim().to_string(),
        };

        let txn = self.db.begin().await?;

        if let Some(id) = forum_id {
            ensure_target_exists(&txn, target, id).await?;
        }

        let existing = Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::TargetType.eq(target.as_str()))
            .filter(vote::Column::TargetId.eq(target_id.as_str()))
            .one(&txn)
            .await?;

        let (voted, delta) = match existing {
            Some(row) => {
                let deleted = Vote::delete_by_id(row.id).exec(&txn).await?;
                // A concurrent request already removed the same vote.
                (false, if deleted.rows_affected == 0 { 0 } else { -1 })
            }
            None => {
                let inserted = Vote::insert(vote::ActiveModel {
                    user_id: Set(user_id.to_string()),
                    target_type: Set(target.as_str().to_string()),
                    target_id: Set(target_id.clone()),
                    created_at: Set(chrono::Utc::now().naive_utc()),
                    ..Default::default()
                })
                .on_conflict(
                    OnConflict::columns([
                        vote::Column::UserId,
                        vote::Column::TargetType,
                        vote::Column::TargetId,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
                // A concurrent request already inserted the same vote.
                (true, if inserted == 0 { 0 } else { 1 })
            }
        };

        if let Some(id) = forum_id {
            apply_counter_delta(&txn, target, id, delta).await?;
        }
        txn.commit().await?;

        tracing::debug!(user_id, target_type = %target, target_id = %target_id, voted, "vote toggled");
        Ok(voted)
    }
}

fn parse_forum_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::Validation("Invalid targetId".to_string()))
}

async fn ensure_target_exists(txn: &DatabaseTransaction, target: VoteTarget, id: Uuid) -> AppResult<()> {
    let found = match target {
        VoteTarget::Post => ForumPost::find_by_id(id).one(txn).await?.is_some(),
        VoteTarget::Comment => ForumComment::find_by_id(id).one(txn).await?.is_some(),
        VoteTarget::Project => true,
    };
    if found {
        Ok(())
    } else {
        Err(AppError::NotFound(match target {
            VoteTarget::Comment => "Comment",
            _ => "Post",
        }))
    }
}

async fn apply_counter_delta<C: ConnectionTrait>(
    conn: &C,
    target: VoteTarget,
    id: Uuid,
    delta: i32,
) -> AppResult<()> {
    let table = match target {
        VoteTarget::Post => "forum_posts",
        VoteTarget::Comment => "forum_comments",
        VoteTarget::Project => return Ok(()),
    };
    if delta == 0 {
        return Ok(());
    }

    let sql = format!(
        "UPDATE {table} SET upvote_count = GREATEST(upvote_count + $1, 0) WHERE id = $2"
    );
    conn.execute(Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Postgres,
        &sql,
        vec![delta.into(), id.into()],
    ))
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forum_ids_must_be_uuids() {
        assert!(parse_forum_id("not-a-uuid").is_err());
        let id = Uuid::new_v4();
        assert_eq!(parse_forum_id(&format!(" {id} ")).unwrap(), id);
    }

    #[tokio::test]
    async fn invalid_id_is_rejected_before_touching_the_store() {
        let service = VoteService::new(DatabaseConnection::Disconnected);
        let err = service
            .toggle("1", VoteTarget::Comment, "42")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
