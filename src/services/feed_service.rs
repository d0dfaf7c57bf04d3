use chrono::Utc;
use serde::Deserialize;

use crate::database::DataStore;
use crate::error::ServiceResult;
use crate::models::CategoryFilter;
use crate::services::post_service::PostView;

const HOME_FEED_LIMIT: i64 = 200;

#[derive(Debug, Deserialize, Default)]
pub struct FeedQuery {
    pub category: Option<String>,
}

/// Home feed: the viewer's own posts and posts by everyone they follow,
/// newest first.
pub async fn build_home_feed(
    store: &dyn DataStore,
    viewer_id: &str,
    query: &FeedQuery,
) -> ServiceResult<Vec<PostView>> {
    let category: CategoryFilter = query.category.as_deref().unwrap_or("all").parse()?;

    let only = match category {
        CategoryFilter::All => None,
        CategoryFilter::Only(c) => Some(c),
    };

    let now = Utc::now();
    Ok(store
        .list_feed_posts(viewer_id, only, HOME_FEED_LIMIT)
        .await?
        .into_iter()
        .map(|p| PostView::new(p, viewer_id, now))
        .collect())
}
