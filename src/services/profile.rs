use crate::{
    error::AppResult,
    models::{profile, Profile, ProfileModel},
    services::github::GitHubIdentity,
};
use chrono::Utc;
use sea_orm::{sea_query::OnConflict, DatabaseConnection, EntityTrait, Set};
use serde::Serialize;
use utoipa::ToSchema;

/// Public author fields embedded in posts and comments.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: String,
    pub name: String,
    pub avatar_url: String,
}

impl From<ProfileModel> for AuthorSummary {
    fn from(p: ProfileModel) -> Self {
        Self {
            id: p.id,
            name: p.name,
            avatar_url: p.avatar_url,
        }
    }
}

impl AuthorSummary {
    /// Stand-in for an author row that no longer resolves.
    pub fn unknown(id: String) -> Self {
        Self {
            id,
            name: "unknown".to_string(),
            avatar_url: String::new(),
        }
    }
}

pub struct ProfileService {
    db: DatabaseConnection,
}

impl ProfileService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create the profile on first sign-in, refresh name and avatar after.
    pub async fn upsert(&self, identity: &GitHubIdentity) -> AppResult<ProfileModel> {
        let now = Utc::now().naive_utc();
        let model = profile::ActiveModel {
            id: Set(identity.id.clone()),
            name: Set(identity.login.clone()),
            avatar_url: Set(identity.avatar_url.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Profile::insert(model)
            .on_conflict(
                OnConflict::column(profile::Column::Id)
                    .update_columns([
                        profile::Column::Name,
                        profile::Column::AvatarUrl,
                        profile::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Profile::find_by_id(identity.id.clone())
            .one(&self.db)
            .await?
            .ok_or(crate::error::AppError::NotFound("Profile"))
    }
}
