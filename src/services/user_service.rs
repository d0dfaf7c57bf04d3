use serde::{Deserialize, Serialize};

use crate::database::DataStore;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{UserRow, UserStatsRow};
use crate::services::follow_service::{self, Relationship};

const SEARCH_LIMIT: i64 = 20;

#[derive(Debug, Serialize)]
pub struct UserCardView {
    pub user_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub relationship: Relationship,
}

#[derive(Debug, Serialize)]
pub struct UserProfileView {
    #[serde(flatten)]
    pub user: UserRow,
    #[serde(flatten)]
    pub stats: UserStatsRow,
    pub relationship: Relationship,
}

#[derive(Debug, Deserialize)]
pub struct SettingsInput {
    pub display_name: String,
    #[serde(default)]
    pub bio: String,
    pub avatar_url: Option<String>,
}

pub async fn search_users(
    store: &dyn DataStore,
    viewer_id: &str,
    term: &str,
) -> ServiceResult<Vec<UserCardView>> {
    let term = term.trim();
    if term.is_empty() {
        return Ok(Vec::new());
    }

    let rows = store.search_users(term, viewer_id, SEARCH_LIMIT).await?;
    let mut cards = Vec::with_capacity(rows.len());
    for row in rows {
        let relationship = follow_service::relationship(store, viewer_id, &row.user_id).await?;
        cards.push(UserCardView {
            user_id: row.user_id,
            display_name: row.display_name,
            avatar_url: row.avatar_url,
            relationship,
        });
    }
    Ok(cards)
}

pub async fn load_user_profile_view(
    store: &dyn DataStore,
    viewer_id: &str,
    user_id: &str,
) -> ServiceResult<Option<UserProfileView>> {
    let Some(user) = store.load_user(user_id).await? else {
        return Ok(None);
    };
    let stats = store.load_user_stats(user_id).await?;
    let relationship = follow_service::relationship(store, viewer_id, user_id).await?;
    Ok(Some(UserProfileView {
        user,
        stats,
        relationship,
    }))
}

pub async fn update_settings(
    store: &dyn DataStore,
    viewer_id: &str,
    input: &SettingsInput,
) -> ServiceResult<UserRow> {
    let display_name = input.display_name.trim();
    if display_name.is_empty() {
        return Err(ServiceError::invalid("Display name cannot be empty"));
    }
    let avatar_url = input
        .avatar_url
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    if !store
        .update_user_settings(viewer_id, display_name, input.bio.trim(), avatar_url)
        .await?
    {
        return Err(ServiceError::NotFound);
    }

    store
        .load_user(viewer_id)
        .await?
        .ok_or(ServiceError::NotFound)
}
