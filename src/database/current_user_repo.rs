use sqlx::SqlitePool;

use crate::models::CurrentUserRow;

// Single-row table used when running locally without an auth cookie.
pub const SQL_LOAD_LOCAL_VIEWER: &str = r#"
SELECT c.user_id
FROM current_user c
JOIN users u ON u.user_id = c.user_id
WHERE (u.is_deleted = 0 OR u.is_deleted IS NULL)
LIMIT 1
"#;

pub async fn load_local_viewer_id(pool: &SqlitePool) -> sqlx::Result<Option<String>> {
    let row = sqlx::query_as::<_, CurrentUserRow>(SQL_LOAD_LOCAL_VIEWER)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.user_id))
}
