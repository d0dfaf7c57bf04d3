use chrono::{DateTime, Utc};
use serde::Serialize;

// Pending request joined with the display data of the other party.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct FollowRequestRow {
    pub request_id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub other_display_name: Option<String>,
    pub other_avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
