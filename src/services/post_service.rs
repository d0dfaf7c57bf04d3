use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::database::{DataStore, NewPost};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Category, Coordinate, Post, Reaction};
use crate::services::post_feed_service::PostFeed;

#[derive(Debug, Deserialize, Default)]
pub struct CreatePostInput {
    pub caption: String,
    pub category: Option<String>,
    pub rating: Option<f64>,
    #[serde(default)]
    pub photos: Vec<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_public: Option<bool>,
}

/// A post as one viewer sees it.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub category_label: Option<&'static str>,
    pub agree_count: usize,
    pub disagree_count: usize,
    pub viewer_reaction: Reaction,
    pub time_ago: String,
    pub is_own: bool,
}

impl PostView {
    pub fn new(post: Post, viewer_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            category_label: post.category.map(Category::label),
            agree_count: post.agree_count(),
            disagree_count: post.disagree_count(),
            viewer_reaction: post.reaction_of(viewer_id),
            time_ago: format_time_ago(post.created_at, now),
            is_own: post.author_id == viewer_id,
            post,
        }
    }
}

pub fn format_time_ago(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - created_at).num_minutes();
    if minutes < 1 {
        "now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / 1440)
    }
}

pub async fn create_post(
    store: &dyn DataStore,
    feed: &PostFeed,
    author_id: &str,
    input: CreatePostInput,
) -> ServiceResult<Post> {
    let photos: Vec<String> = input
        .photos
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| p.to_string())
        .collect();
    if photos.is_empty() {
        return Err(ServiceError::invalid("Please select an image"));
    }

    let caption = input.caption.trim();
    if caption.is_empty() {
        return Err(ServiceError::invalid("Please enter a caption"));
    }

    let category: Category = input
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ServiceError::invalid("Please select a category"))?
        .parse()?;

    let rating = input.rating.unwrap_or(5.0);
    if !(1.0..=10.0).contains(&rating) {
        return Err(ServiceError::invalid("Rating must be between 1 and 10"));
    }

    let coordinates = match (input.latitude, input.longitude) {
        (None, None) => None,
        (lat, lon) => Some(
            Coordinate::from_parts(lat, lon)
                .ok_or_else(|| ServiceError::invalid("Both latitude and longitude are required"))?,
        ),
    };

    let Some(author) = store.load_user(author_id).await? else {
        return Err(ServiceError::Forbidden);
    };

    let post_id = Uuid::new_v4().to_string();
    let photos_json = serde_json::to_string(&photos)
        .map_err(|e| ServiceError::invalid(format!("invalid photos: {}", e)))?;
    let location = input.location.as_deref().map(str::trim).unwrap_or("");
    let is_public = input.is_public.unwrap_or(true);
    let author_name = if author.display_name.trim().is_empty() {
        "User"
    } else {
        author.display_name.as_str()
    };

    store
        .insert_post(&NewPost {
            post_id: &post_id,
            user_id: author_id,
            username: author_name,
            user_avatar: author.avatar_url.as_deref(),
            caption,
            location,
            latitude: coordinates.map(|c| c.latitude),
            longitude: coordinates.map(|c| c.longitude),
            rating,
            category: category.as_str(),
            photos_json: &photos_json,
            is_public,
            created_at: Utc::now(),
        })
        .await?;

    info!(post_id = %post_id, author = %author_id, public = is_public, "📝 post created");

    if is_public {
        feed.refresh_logged(store).await;
    }

    store
        .load_post(&post_id)
        .await?
        .ok_or(ServiceError::NotFound)
}

/// Private posts are only visible to their author and the author's followers.
pub async fn can_view(store: &dyn DataStore, viewer_id: &str, post: &Post) -> ServiceResult<bool> {
    if post.is_public || post.author_id == viewer_id {
        return Ok(true);
    }
    Ok(store.is_following(viewer_id, &post.author_id).await?)
}

pub async fn load_post_for_viewer(
    store: &dyn DataStore,
    viewer_id: &str,
    post_id: &str,
) -> ServiceResult<Post> {
    let post = store
        .load_post(post_id)
        .await?
        .ok_or(ServiceError::NotFound)?;
    if !can_view(store, viewer_id, &post).await? {
        // Hidden posts look missing rather than forbidden.
        return Err(ServiceError::NotFound);
    }
    Ok(post)
}

pub async fn delete_post(
    store: &dyn DataStore,
    feed: &PostFeed,
    viewer_id: &str,
    post_id: &str,
) -> ServiceResult<()> {
    let post = load_post_for_viewer(store, viewer_id, post_id).await?;
    if post.author_id != viewer_id {
        return Err(ServiceError::Forbidden);
    }
    if !store.delete_post(post_id, viewer_id).await? {
        return Err(ServiceError::NotFound);
    }
    info!(post_id = %post_id, "🗑️ post deleted");
    if post.is_public {
        feed.refresh_logged(store).await;
    }
    Ok(())
}

pub async fn list_user_posts_for_viewer(
    store: &dyn DataStore,
    viewer_id: &str,
    user_id: &str,
) -> ServiceResult<Vec<PostView>> {
    let sees_private = viewer_id == user_id || store.is_following(viewer_id, user_id).await?;
    let now = Utc::now();
    Ok(store
        .list_user_posts(user_id)
        .await?
        .into_iter()
        .filter(|p| p.is_public || sees_private)
        .map(|p| PostView::new(p, viewer_id, now))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn time_ago_buckets() {
        let now = Utc::now();
        assert_eq!(format_time_ago(now, now), "now");
        assert_eq!(format_time_ago(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(format_time_ago(now - Duration::minutes(125), now), "2h ago");
        assert_eq!(format_time_ago(now - Duration::days(3), now), "3d ago");
    }
}
