use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::CommentRow;

pub struct NewComment<'a> {
    pub comment_id: &'a str,
    pub post_id: &'a str,
    pub user_id: &'a str,
    pub username: &'a str,
    pub user_avatar: Option<&'a str>,
    pub text: &'a str,
    pub created_at: DateTime<Utc>,
}

const SQL_LIST_COMMENTS: &str = r#"
SELECT
  comment_id,
  post_id,
  user_id,
  username,
  user_avatar,
  text,
  created_at
FROM comments
WHERE post_id = ?1
ORDER BY created_at ASC
"#;

pub async fn list_comments(pool: &SqlitePool, post_id: &str) -> sqlx::Result<Vec<CommentRow>> {
    sqlx::query_as::<_, CommentRow>(SQL_LIST_COMMENTS)
        .bind(post_id)
        .fetch_all(pool)
        .await
}

const SQL_INSERT_COMMENT: &str = r#"
INSERT INTO comments (
  comment_id,
  post_id,
  user_id,
  username,
  user_avatar,
  text,
  created_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#;

/// Inserts the comment and bumps the post's denormalized counter in one transaction.
pub async fn insert_comment(pool: &SqlitePool, comment: &NewComment<'_>) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(SQL_INSERT_COMMENT)
        .bind(comment.comment_id)
        .bind(comment.post_id)
        .bind(comment.user_id)
        .bind(comment.username)
        .bind(comment.user_avatar)
        .bind(comment.text)
        .bind(comment.created_at)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE posts SET comments_count = comments_count + 1 WHERE post_id = ?1")
        .bind(comment.post_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}
