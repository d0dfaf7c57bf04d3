use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::str::FromStr;

use super::{
    comments_repo, current_user_repo, follows_repo, posts_repo, reactions_repo, users_repo,
    DataStore, NewComment, NewPost,
};
use crate::models::{
    Category, CommentRow, FollowRequestRow, Post, PostRow, Reaction, UserRow, UserStatsRow,
};

/// Opens the pool and applies the embedded migrations.
pub async fn connect(database_url: &str) -> sqlx::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    // Every connection to `:memory:` is its own database, so keep exactly one alive.
    let pool = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?
    };

    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn with_reactions(&self, rows: Vec<PostRow>) -> sqlx::Result<Vec<Post>> {
        let ids: Vec<&str> = rows.iter().map(|r| r.post_id.as_str()).collect();
        let reaction_rows = reactions_repo::list_reactions_for_posts(&self.pool, &ids).await?;

        let mut by_post: HashMap<String, Vec<(String, Reaction)>> = HashMap::new();
        for r in reaction_rows {
            by_post
                .entry(r.post_id)
                .or_default()
                .push((r.user_id, Reaction::from_db_str(&r.reaction)));
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let reactions = by_post.remove(&row.post_id).unwrap_or_default();
                row.into_post(reactions)
            })
            .collect())
    }
}

#[async_trait]
impl DataStore for SqliteStore {
    async fn list_public_posts(&self) -> sqlx::Result<Vec<Post>> {
        let rows = posts_repo::list_public_posts(&self.pool).await?;
        self.with_reactions(rows).await
    }

    async fn list_feed_posts(
        &self,
        viewer_id: &str,
        category: Option<Category>,
        limit: i64,
    ) -> sqlx::Result<Vec<Post>> {
        let category = category.map(Category::as_str);
        let rows = posts_repo::list_feed_posts(&self.pool, viewer_id, category, limit).await?;
        self.with_reactions(rows).await
    }

    async fn list_user_posts(&self, user_id: &str) -> sqlx::Result<Vec<Post>> {
        let rows = posts_repo::list_user_posts(&self.pool, user_id).await?;
        self.with_reactions(rows).await
    }

    async fn load_post(&self, post_id: &str) -> sqlx::Result<Option<Post>> {
        let Some(row) = posts_repo::load_post(&self.pool, post_id).await? else {
            return Ok(None);
        };
        Ok(self.with_reactions(vec![row]).await?.pop())
    }

    async fn insert_post(&self, post: &NewPost<'_>) -> sqlx::Result<()> {
        posts_repo::insert_post(&self.pool, post).await
    }

    async fn delete_post(&self, post_id: &str, author_id: &str) -> sqlx::Result<bool> {
        posts_repo::delete_post(&self.pool, post_id, author_id).await
    }

    async fn set_reaction(
        &self,
        post_id: &str,
        user_id: &str,
        reaction: Reaction,
    ) -> sqlx::Result<()> {
        match reaction.as_db_str() {
            Some(value) => reactions_repo::upsert_reaction(&self.pool, post_id, user_id, value).await,
            None => reactions_repo::delete_reaction(&self.pool, post_id, user_id)
                .await
                .map(|_| ()),
        }
    }

    async fn list_comments(&self, post_id: &str) -> sqlx::Result<Vec<CommentRow>> {
        comments_repo::list_comments(&self.pool, post_id).await
    }

    async fn insert_comment(&self, comment: &NewComment<'_>) -> sqlx::Result<()> {
        comments_repo::insert_comment(&self.pool, comment).await
    }

    async fn load_user(&self, user_id: &str) -> sqlx::Result<Option<UserRow>> {
        users_repo::load_user(&self.pool, user_id).await
    }

    async fn search_users(
        &self,
        prefix: &str,
        exclude_user_id: &str,
        limit: i64,
    ) -> sqlx::Result<Vec<UserRow>> {
        users_repo::search_users(&self.pool, prefix, exclude_user_id, limit).await
    }

    async fn load_user_stats(&self, user_id: &str) -> sqlx::Result<UserStatsRow> {
        users_repo::load_user_stats(&self.pool, user_id).await
    }

    async fn update_user_settings(
        &self,
        user_id: &str,
        display_name: &str,
        bio: &str,
        avatar_url: Option<&str>,
    ) -> sqlx::Result<bool> {
        let updated =
            users_repo::update_user_settings(&self.pool, user_id, display_name, bio, avatar_url)
                .await?;
        Ok(updated > 0)
    }

    async fn local_viewer_id(&self) -> sqlx::Result<Option<String>> {
        current_user_repo::load_local_viewer_id(&self.pool).await
    }

    async fn is_following(&self, follower_id: &str, followee_id: &str) -> sqlx::Result<bool> {
        follows_repo::is_following(&self.pool, follower_id, followee_id).await
    }

    async fn delete_follow(&self, follower_id: &str, followee_id: &str) -> sqlx::Result<bool> {
        let removed = follows_repo::delete_follow(&self.pool, follower_id, followee_id).await?;
        Ok(removed > 0)
    }

    async fn find_follow_request(
        &self,
        from_user_id: &str,
        to_user_id: &str,
    ) -> sqlx::Result<Option<String>> {
        follows_repo::find_request_id(&self.pool, from_user_id, to_user_id).await
    }

    async fn insert_follow_request(
        &self,
        request_id: &str,
        from_user_id: &str,
        to_user_id: &str,
    ) -> sqlx::Result<()> {
        follows_repo::insert_request(
            &self.pool,
            follows_repo::NewFollowRequest {
                request_id,
                from_user_id,
                to_user_id,
            },
        )
        .await
    }

    async fn delete_follow_requests(
        &self,
        from_user_id: &str,
        to_user_id: &str,
    ) -> sqlx::Result<u64> {
        follows_repo::delete_requests(&self.pool, from_user_id, to_user_id).await
    }

    async fn accept_follow_request(
        &self,
        from_user_id: &str,
        to_user_id: &str,
    ) -> sqlx::Result<bool> {
        follows_repo::accept_request(&self.pool, from_user_id, to_user_id).await
    }

    async fn list_incoming_requests(&self, user_id: &str) -> sqlx::Result<Vec<FollowRequestRow>> {
        follows_repo::list_incoming(&self.pool, user_id).await
    }

    async fn list_outgoing_requests(&self, user_id: &str) -> sqlx::Result<Vec<FollowRequestRow>> {
        follows_repo::list_outgoing(&self.pool, user_id).await
    }
}
