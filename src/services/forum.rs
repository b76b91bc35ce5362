use crate::{
    models::{ForumPostModel, ProfileModel},
    services::{profile::AuthorSummary, ranking::HotRanked},
    utils::render_markdown,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ForumCategory {
    General,
    #[serde(rename = "Team Formation")]
    TeamFormation,
    Ideation,
    #[serde(rename = "Progress Update")]
    ProgressUpdate,
    #[serde(rename = "Product Feedback")]
    ProductFeedback,
    #[serde(rename = "Trading Agents")]
    TradingAgents,
    #[serde(rename = "DeFi Automation")]
    DefiAutomation,
    #[serde(rename = "Analytics & Monitoring")]
    AnalyticsMonitoring,
    #[serde(rename = "Developer Tooling")]
    DeveloperTooling,
    Infrastructure,
}

impl ForumCategory {
    pub const ALL: [ForumCategory; 10] = [
        ForumCategory::General,
        ForumCategory::TeamFormation,
        ForumCategory::Ideation,
        ForumCategory::ProgressUpdate,
        ForumCategory::ProductFeedback,
        ForumCategory::TradingAgents,
        ForumCategory::DefiAutomation,
        ForumCategory::AnalyticsMonitoring,
        ForumCategory::DeveloperTooling,
        ForumCategory::Infrastructure,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ForumCategory::General => "General",
            ForumCategory::TeamFormation => "Team Formation",
            ForumCategory::Ideation => "Ideation",
            ForumCategory::ProgressUpdate => "Progress Update",
            ForumCategory::ProductFeedback => "Product Feedback",
            ForumCategory::TradingAgents => "Trading Agents",
            ForumCategory::DefiAutomation => "DeFi Automation",
            ForumCategory::AnalyticsMonitoring => "Analytics & Monitoring",
            ForumCategory::DeveloperTooling => "Developer Tooling",
            ForumCategory::Infrastructure => "Infrastructure",
        }
    }

    /// Exact, case-sensitive match on the display name.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }

    pub fn invalid_message() -> String {
        let names: Vec<&str> = Self::ALL.iter().map(|c| c.as_str()).collect();
        format!("Invalid category. Must be one of: {}", names.join(", "))
    }
}

impl fmt::Display for ForumCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A post row joined with its author.
pub type PostWithAuthor = (ForumPostModel, Option<ProfileModel>);

impl HotRanked for PostWithAuthor {
    fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at.and_utc()
    }

    fn upvotes(&self) -> i64 {
        i64::from(self.0.upvote_count)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub content_html: String,
    pub category: String,
    pub author: AuthorSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub upvote_count: u64,
    pub comment_count: u64,
    pub has_upvoted: bool,
}

impl PostView {
    pub fn new((post, author): PostWithAuthor, has_upvoted: bool) -> Self {
        let author = match author {
            Some(profile) => AuthorSummary::from(profile),
            None => AuthorSummary::unknown(post.author_id.clone()),
        };
        Self {
            id: post.id,
            content_html: render_markdown(&post.content),
            title: post.title,
            content: post.content,
            category: post.category,
            author,
            created_at: post.created_at.and_utc(),
            updated_at: post.updated_at.and_utc(),
            upvote_count: post.upvote_count.max(0) as u64,
            comment_count: post.comment_count.max(0) as u64,
            has_upvoted,
        }
    }
}
