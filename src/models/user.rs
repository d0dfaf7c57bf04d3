use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct UserRow {
    pub user_id: String,
    pub display_name: String,
    #[serde(skip)]
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: String,
    pub created_at: DateTime<Utc>,
}

// Follower/following/post counters for the profile header.
#[derive(Debug, Clone, Default, sqlx::FromRow, Serialize)]
pub struct UserStatsRow {
    pub followers_count: i64,
    pub following_count: i64,
    pub posts_count: i64,
}
