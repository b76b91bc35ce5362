use crate::{
    error::{AppError, AppResult},
    models::{forum_post, ForumPost, Profile},
    services::{
        forum::{ForumCategory, PostWithAuthor},
        ranking::{sort_by_hot, PostSort},
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

pub struct PostService {
    db: DatabaseConnection,
}

impl PostService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        sort: PostSort,
        category: Option<ForumCategory>,
    ) -> AppResult<Vec<PostWithAuthor>> {
        let mut query = ForumPost::find().find_also_related(Profile);

        if let Some(category) = category {
            query = query.filter(forum_post::Column::Category.eq(category.as_str()));
        }

        query = match sort {
            PostSort::Top => query
                .order_by_desc(forum_post::Column::UpvoteCount)
                .order_by_desc(forum_post::Column::CreatedAt),
            PostSort::New | PostSort::Hot => query.order_by_desc(forum_post::Column::CreatedAt),
        };

        let mut posts = query.all(&self.db).await?;

        if sort == PostSort::Hot {
            sort_by_hot(&mut posts, chrono::Utc::now());
        }

        Ok(posts)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<PostWithAuthor> {
        ForumPost::find_by_id(id)
            .find_also_related(Profile)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound("Post"))
    }

    pub async fn create(
        &self,
        author_id: &str,
        title: &str,
        content: &str,
        category: ForumCategory,
    ) -> AppResult<PostWithAuthor> {
        let now = chrono::Utc::now().naive_utc();

        let new_post = forum_post::ActiveModel {
            id: Set(Uuid::new_v4()),
            author_id: Set(author_id.to_string()),
            title: Set(title.to_string()),
            content: Set(content.to_string()),
            category: Set(category.as_str().to_string()),
            upvote_count: Set(0),
            comment_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let post = new_post.insert(&self.db).await?;
        tracing::info!(post_id = %post.id, author_id, category = %category, "forum post created");

        self.get(post.id).await
    }
}
