use sqlx::SqlitePool;

use crate::models::{UserRow, UserStatsRow};

pub const SQL_LOAD_USER: &str = r#"
SELECT
    user_id,
    display_name,
    email,
    avatar_url,
    bio,
    created_at
FROM users
WHERE user_id = ?1
  AND (is_deleted = 0 OR is_deleted IS NULL)
LIMIT 1
"#;

pub async fn load_user(pool: &SqlitePool, user_id: &str) -> sqlx::Result<Option<UserRow>> {
    sqlx::query_as::<_, UserRow>(SQL_LOAD_USER)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

// LIKE is case-insensitive for ASCII in SQLite; wildcards in the input are escaped.
pub const SQL_SEARCH_USERS: &str = r#"
SELECT
    user_id,
    display_name,
    email,
    avatar_url,
    bio,
    created_at
FROM users
WHERE display_name LIKE ?1 || '%' ESCAPE '\'
  AND user_id != ?2
  AND (is_deleted = 0 OR is_deleted IS NULL)
ORDER BY display_name ASC
LIMIT ?3
"#;

pub async fn search_users(
    pool: &SqlitePool,
    prefix: &str,
    exclude_user_id: &str,
    limit: i64,
) -> sqlx::Result<Vec<UserRow>> {
    let escaped = prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    sqlx::query_as::<_, UserRow>(SQL_SEARCH_USERS)
        .bind(escaped)
        .bind(exclude_user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
}

pub const SQL_LOAD_USER_STATS: &str = r#"
SELECT
    (SELECT COUNT(*) FROM follows WHERE followee_id = ?1) AS followers_count,
    (SELECT COUNT(*) FROM follows WHERE follower_id = ?1) AS following_count,
    (SELECT COUNT(*) FROM posts WHERE user_id = ?1) AS posts_count
"#;

pub async fn load_user_stats(pool: &SqlitePool, user_id: &str) -> sqlx::Result<UserStatsRow> {
    sqlx::query_as::<_, UserStatsRow>(SQL_LOAD_USER_STATS)
        .bind(user_id)
        .fetch_one(pool)
        .await
}

const SQL_UPDATE_USER_SETTINGS: &str = r#"
UPDATE users
SET display_name = ?2, bio = ?3, avatar_url = ?4
WHERE user_id = ?1
  AND (is_deleted = 0 OR is_deleted IS NULL)
"#;

pub async fn update_user_settings(
    pool: &SqlitePool,
    user_id: &str,
    display_name: &str,
    bio: &str,
    avatar_url: Option<&str>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_USER_SETTINGS)
        .bind(user_id)
        .bind(display_name)
        .bind(bio)
        .bind(avatar_url)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
