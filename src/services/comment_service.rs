use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::database::{DataStore, NewComment};
use crate::error::{ServiceError, ServiceResult};
use crate::models::CommentRow;
use crate::services::post_feed_service::PostFeed;
use crate::services::post_service;

const MAX_COMMENT_CHARS: usize = 2000;

pub async fn list_comments(
    store: &dyn DataStore,
    viewer_id: &str,
    post_id: &str,
) -> ServiceResult<Vec<CommentRow>> {
    post_service::load_post_for_viewer(store, viewer_id, post_id).await?;
    Ok(store.list_comments(post_id).await?)
}

pub async fn add_comment(
    store: &dyn DataStore,
    feed: &PostFeed,
    viewer_id: &str,
    post_id: &str,
    text: &str,
) -> ServiceResult<CommentRow> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ServiceError::invalid("Comment cannot be empty"));
    }
    if text.chars().count() > MAX_COMMENT_CHARS {
        return Err(ServiceError::invalid("Comment is too long"));
    }

    let post = post_service::load_post_for_viewer(store, viewer_id, post_id).await?;
    let Some(author) = store.load_user(viewer_id).await? else {
        return Err(ServiceError::Forbidden);
    };

    let comment_id = Uuid::new_v4().to_string();
    let username = if author.display_name.trim().is_empty() {
        "User"
    } else {
        author.display_name.as_str()
    };
    let created_at = Utc::now();

    store
        .insert_comment(&NewComment {
            comment_id: &comment_id,
            post_id,
            user_id: viewer_id,
            username,
            user_avatar: author.avatar_url.as_deref(),
            text,
            created_at,
        })
        .await?;

    info!(post_id = %post_id, comment_id = %comment_id, "💬 comment added");

    if post.is_public {
        feed.refresh_logged(store).await;
    }

    Ok(CommentRow {
        comment_id,
        post_id: post_id.to_string(),
        user_id: viewer_id.to_string(),
        username: username.to_string(),
        user_avatar: author.avatar_url.clone(),
        text: text.to_string(),
        created_at,
    })
}
