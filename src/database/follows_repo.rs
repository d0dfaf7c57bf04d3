use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::FollowRequestRow;

pub async fn is_following(
    pool: &SqlitePool,
    follower_id: &str,
    followee_id: &str,
) -> sqlx::Result<bool> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM follows WHERE follower_id = ?1 AND followee_id = ?2")
            .bind(follower_id)
            .bind(followee_id)
            .fetch_optional(pool)
            .await?;
    Ok(found.is_some())
}

pub async fn delete_follow(
    pool: &SqlitePool,
    follower_id: &str,
    followee_id: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM follows WHERE follower_id = ?1 AND followee_id = ?2")
        .bind(follower_id)
        .bind(followee_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn find_request_id(
    pool: &SqlitePool,
    from_user_id: &str,
    to_user_id: &str,
) -> sqlx::Result<Option<String>> {
    sqlx::query_scalar(
        "SELECT request_id FROM follow_requests WHERE from_user_id = ?1 AND to_user_id = ?2",
    )
    .bind(from_user_id)
    .bind(to_user_id)
    .fetch_optional(pool)
    .await
}

pub struct NewFollowRequest<'a> {
    pub request_id: &'a str,
    pub from_user_id: &'a str,
    pub to_user_id: &'a str,
}

const SQL_INSERT_FOLLOW_REQUEST: &str = r#"
INSERT INTO follow_requests (
  request_id,
  from_user_id,
  to_user_id,
  created_at
) VALUES (?1, ?2, ?3, ?4)
ON CONFLICT (from_user_id, to_user_id) DO NOTHING
"#;

pub async fn insert_request(pool: &SqlitePool, req: NewFollowRequest<'_>) -> sqlx::Result<()> {
    sqlx::query(SQL_INSERT_FOLLOW_REQUEST)
        .bind(req.request_id)
        .bind(req.from_user_id)
        .bind(req.to_user_id)
        .bind(Utc::now())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_requests(
    pool: &SqlitePool,
    from_user_id: &str,
    to_user_id: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM follow_requests WHERE from_user_id = ?1 AND to_user_id = ?2")
        .bind(from_user_id)
        .bind(to_user_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

/// Turns a pending request into a follow edge (requester follows target).
/// Returns false when no such request exists.
pub async fn accept_request(
    pool: &SqlitePool,
    from_user_id: &str,
    to_user_id: &str,
) -> sqlx::Result<bool> {
    let mut tx = pool.begin().await?;

    let removed =
        sqlx::query("DELETE FROM follow_requests WHERE from_user_id = ?1 AND to_user_id = ?2")
            .bind(from_user_id)
            .bind(to_user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

    if removed == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query(
        r#"
INSERT INTO follows (follower_id, followee_id, created_at)
VALUES (?1, ?2, ?3)
ON CONFLICT (follower_id, followee_id) DO NOTHING
        "#,
    )
    .bind(from_user_id)
    .bind(to_user_id)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(true)
}

const SQL_LIST_INCOMING: &str = r#"
SELECT
  r.request_id,
  r.from_user_id,
  r.to_user_id,
  u.display_name AS other_display_name,
  u.avatar_url AS other_avatar_url,
  r.created_at
FROM follow_requests r
LEFT JOIN users u ON u.user_id = r.from_user_id
WHERE r.to_user_id = ?1
ORDER BY r.created_at DESC
"#;

pub async fn list_incoming(pool: &SqlitePool, user_id: &str) -> sqlx::Result<Vec<FollowRequestRow>> {
    sqlx::query_as::<_, FollowRequestRow>(SQL_LIST_INCOMING)
        .bind(user_id)
        .fetch_all(pool)
        .await
}

const SQL_LIST_OUTGOING: &str = r#"
SELECT
  r.request_id,
  r.from_user_id,
  r.to_user_id,
  u.display_name AS other_display_name,
  u.avatar_url AS other_avatar_url,
  r.created_at
FROM follow_requests r
LEFT JOIN users u ON u.user_id = r.to_user_id
WHERE r.from_user_id = ?1
ORDER BY r.created_at DESC
"#;

pub async fn list_outgoing(pool: &SqlitePool, user_id: &str) -> sqlx::Result<Vec<FollowRequestRow>> {
    sqlx::query_as::<_, FollowRequestRow>(SQL_LIST_OUTGOING)
        .bind(user_id)
        .fetch_all(pool)
        .await
}
