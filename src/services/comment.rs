use crate::{
    error::{AppError, AppResult},
    models::{forum_comment, forum_post, ForumComment, ForumCommentModel, ForumPost, Profile, ProfileModel},
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

pub type CommentWithAuthor = (ForumCommentModel, Option<ProfileModel>);

pub struct CommentService {
    db: DatabaseConnection,
}

impl CommentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Oldest first, so replies come after their parents.
    pub async fn list_by_post(&self, post_id: Uuid) -> AppResult<Vec<CommentWithAuthor>> {
        let comments = ForumComment::find()
            .find_also_related(Profile)
            .filter(forum_comment::Column::PostId.eq(post_id))
            .order_by_asc(forum_comment::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(comments)
    }

    pub async fn create(
        &self,
        post_id: Uuid,
        author_id: &str,
        parent_id: Option<Uuid>,
        content: &str,
    ) -> AppResult<CommentWithAuthor> {
        let txn = self.db.begin().await?;

        ForumPost::find_by_id(post_id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound("Post"))?;

        if let Some(pid) = parent_id {
            let parent = ForumComment::find_by_id(pid)
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::Validation("Parent comment not found".to_string()))?;

            if parent.post_id != post_id {
                return Err(AppError::Validation(
                    "Parent comment belongs to a different post".to_string(),
                ));
            }
        }

        let now = chrono::Utc::now().naive_utc();
        let new_comment = forum_comment::ActiveModel {
            id: Set(Uuid::new_v4()),
            post_id: Set(post_id),
            parent_id: Set(parent_id),
            author_id: Set(author_id.to_string()),
            content: Set(content.to_string()),
            upvote_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let comment = new_comment.insert(&txn).await?;

        ForumPost::update_many()
            .col_expr(
                forum_post::Column::CommentCount,
                Expr::col(forum_post::Column::CommentCount).add(1),
            )
            .filter(forum_post::Column::Id.eq(post_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        tracing::info!(comment_id = %comment.id, post_id = %post_id, "forum comment created");

        let author = Profile::find_by_id(author_id.to_string())
            .one(&self.db)
            .await?;
        Ok((comment, author))
    }
}
