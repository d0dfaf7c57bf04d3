use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::PostRow;

pub struct NewPost<'a> {
    pub post_id: &'a str,
    pub user_id: &'a str,
    pub username: &'a str,
    pub user_avatar: Option<&'a str>,
    pub caption: &'a str,
    pub location: &'a str,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub rating: f64,
    pub category: &'a str,
    pub photos_json: &'a str,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

const SQL_LIST_PUBLIC_POSTS: &str = r#"
SELECT
  post_id, user_id, username, user_avatar, caption, location,
  latitude, longitude, rating, category, photos, is_public,
  comments_count, created_at
FROM posts
WHERE is_public = 1
ORDER BY created_at DESC
"#;

pub async fn list_public_posts(pool: &SqlitePool) -> sqlx::Result<Vec<PostRow>> {
    sqlx::query_as::<_, PostRow>(SQL_LIST_PUBLIC_POSTS)
        .fetch_all(pool)
        .await
}

// Own posts plus posts of everyone the viewer follows (private ones included).
// A NULL category means no filter; it is applied before the LIMIT.
const SQL_LIST_FEED_POSTS: &str = r#"
SELECT
  p.post_id, p.user_id, p.username, p.user_avatar, p.caption, p.location,
  p.latitude, p.longitude, p.rating, p.category, p.photos, p.is_public,
  p.comments_count, p.created_at
FROM posts p
WHERE (p.user_id = ?1
   OR p.user_id IN (SELECT followee_id FROM follows WHERE follower_id = ?1))
  AND (?2 IS NULL OR LOWER(TRIM(p.category)) = ?2)
ORDER BY p.created_at DESC
LIMIT ?3
"#;

pub async fn list_feed_posts(
    pool: &SqlitePool,
    viewer_id: &str,
    category: Option<&str>,
    limit: i64,
) -> sqlx::Result<Vec<PostRow>> {
    sqlx::query_as::<_, PostRow>(SQL_LIST_FEED_POSTS)
        .bind(viewer_id)
        .bind(category)
        .bind(limit)
        .fetch_all(pool)
        .await
}

const SQL_LIST_USER_POSTS: &str = r#"
SELECT
  post_id, user_id, username, user_avatar, caption, location,
  latitude, longitude, rating, category, photos, is_public,
  comments_count, created_at
FROM posts
WHERE user_id = ?1
ORDER BY created_at DESC
"#;

pub async fn list_user_posts(pool: &SqlitePool, user_id: &str) -> sqlx::Result<Vec<PostRow>> {
    sqlx::query_as::<_, PostRow>(SQL_LIST_USER_POSTS)
        .bind(user_id)
        .fetch_all(pool)
        .await
}

const SQL_LOAD_POST: &str = r#"
SELECT
  post_id, user_id, username, user_avatar, caption, location,
  latitude, longitude, rating, category, photos, is_public,
  comments_count, created_at
FROM posts
WHERE post_id = ?1
LIMIT 1
"#;

pub async fn load_post(pool: &SqlitePool, post_id: &str) -> sqlx::Result<Option<PostRow>> {
    sqlx::query_as::<_, PostRow>(SQL_LOAD_POST)
        .bind(post_id)
        .fetch_optional(pool)
        .await
}

const SQL_INSERT_POST: &str = r#"
INSERT INTO posts (
  post_id, user_id, username, user_avatar, caption, location,
  latitude, longitude, rating, category, photos, is_public,
  comments_count, created_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 0, ?13)
"#;

pub async fn insert_post(pool: &SqlitePool, post: &NewPost<'_>) -> sqlx::Result<()> {
    sqlx::query(SQL_INSERT_POST)
        .bind(post.post_id)
        .bind(post.user_id)
        .bind(post.username)
        .bind(post.user_avatar)
        .bind(post.caption)
        .bind(post.location)
        .bind(post.latitude)
        .bind(post.longitude)
        .bind(post.rating)
        .bind(post.category)
        .bind(post.photos_json)
        .bind(if post.is_public { 1_i64 } else { 0_i64 })
        .bind(post.created_at)
        .execute(pool)
        .await?;
    Ok(())
}

/// Deletes the post together with its reactions and comments. Only matches
/// when `user_id` is the author; returns whether a post was removed.
pub async fn delete_post(pool: &SqlitePool, post_id: &str, user_id: &str) -> sqlx::Result<bool> {
    let mut tx = pool.begin().await?;

    let res = sqlx::query("DELETE FROM posts WHERE post_id = ?1 AND user_id = ?2")
        .bind(post_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    if res.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query("DELETE FROM post_reactions WHERE post_id = ?1")
        .bind(post_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM comments WHERE post_id = ?1")
        .bind(post_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}

#[derive(Debug, sqlx::FromRow)]
pub struct PostGeoCandidateRow {
    pub post_id: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

const SQL_LIST_POSTS_MISSING_COORDINATES: &str = r#"
SELECT
  post_id,
  location,
  latitude,
  longitude
FROM posts
WHERE (latitude IS NULL OR longitude IS NULL)
  AND location IS NOT NULL
  AND TRIM(location) != ''
ORDER BY created_at DESC
LIMIT ?
"#;

pub async fn list_posts_missing_coordinates(
    pool: &SqlitePool,
    limit: i64,
) -> sqlx::Result<Vec<PostGeoCandidateRow>> {
    sqlx::query_as::<_, PostGeoCandidateRow>(SQL_LIST_POSTS_MISSING_COORDINATES)
        .bind(limit)
        .fetch_all(pool)
        .await
}

const SQL_UPDATE_POST_COORDINATES: &str = r#"
UPDATE posts
SET latitude = ?, longitude = ?
WHERE post_id = ?
"#;

pub async fn update_post_coordinates(
    pool: &SqlitePool,
    post_id: &str,
    latitude: f64,
    longitude: f64,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_POST_COORDINATES)
        .bind(latitude)
        .bind(longitude)
        .bind(post_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
