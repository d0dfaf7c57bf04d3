pub mod comments_repo;
pub mod current_user_repo;
pub mod follows_repo;
pub mod posts_repo;
pub mod reactions_repo;
pub mod sqlite_store;
pub mod users_repo;

use async_trait::async_trait;

use crate::models::{
    Category, CommentRow, FollowRequestRow, Post, Reaction, UserRow, UserStatsRow,
};

pub use comments_repo::NewComment;
pub use posts_repo::NewPost;
pub use sqlite_store::{connect, SqliteStore};

/// Everything the services need from the backing store. One adapter exists
/// (`SqliteStore`); services only ever see this trait.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn list_public_posts(&self) -> sqlx::Result<Vec<Post>>;
    /// Viewer's own and followees' posts, newest first; `category` narrows
    /// the query before `limit` applies.
    async fn list_feed_posts(
        &self,
        viewer_id: &str,
        category: Option<Category>,
        limit: i64,
    ) -> sqlx::Result<Vec<Post>>;
    async fn list_user_posts(&self, user_id: &str) -> sqlx::Result<Vec<Post>>;
    async fn load_post(&self, post_id: &str) -> sqlx::Result<Option<Post>>;
    async fn insert_post(&self, post: &NewPost<'_>) -> sqlx::Result<()>;
    async fn delete_post(&self, post_id: &str, author_id: &str) -> sqlx::Result<bool>;

    /// Stores `reaction` as the viewer's only reaction on the post; `None` clears it.
    async fn set_reaction(&self, post_id: &str, user_id: &str, reaction: Reaction)
        -> sqlx::Result<()>;

    async fn list_comments(&self, post_id: &str) -> sqlx::Result<Vec<CommentRow>>;
    async fn insert_comment(&self, comment: &NewComment<'_>) -> sqlx::Result<()>;

    async fn load_user(&self, user_id: &str) -> sqlx::Result<Option<UserRow>>;
    async fn search_users(
        &self,
        prefix: &str,
        exclude_user_id: &str,
        limit: i64,
    ) -> sqlx::Result<Vec<UserRow>>;
    async fn load_user_stats(&self, user_id: &str) -> sqlx::Result<UserStatsRow>;
    async fn update_user_settings(
        &self,
        user_id: &str,
        display_name: &str,
        bio: &str,
        avatar_url: Option<&str>,
    ) -> sqlx::Result<bool>;
    async fn local_viewer_id(&self) -> sqlx::Result<Option<String>>;

    async fn is_following(&self, follower_id: &str, followee_id: &str) -> sqlx::Result<bool>;
    async fn delete_follow(&self, follower_id: &str, followee_id: &str) -> sqlx::Result<bool>;
    async fn find_follow_request(&self, from_user_id: &str, to_user_id: &str)
        -> sqlx::Result<Option<String>>;
    async fn insert_follow_request(
        &self,
        request_id: &str,
        from_user_id: &str,
        to_user_id: &str,
    ) -> sqlx::Result<()>;
    async fn delete_follow_requests(&self, from_user_id: &str, to_user_id: &str)
        -> sqlx::Result<u64>;
    async fn accept_follow_request(&self, from_user_id: &str, to_user_id: &str)
        -> sqlx::Result<bool>;
    async fn list_incoming_requests(&self, user_id: &str) -> sqlx::Result<Vec<FollowRequestRow>>;
    async fn list_outgoing_requests(&self, user_id: &str) -> sqlx::Result<Vec<FollowRequestRow>>;
}
