use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::models::PostReactionRow;

pub async fn list_reactions_for_posts(
    pool: &SqlitePool,
    post_ids: &[&str],
) -> sqlx::Result<Vec<PostReactionRow>> {
    if post_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT post_id, user_id, reaction FROM post_reactions WHERE post_id IN (");
    let mut ids = qb.separated(", ");
    for id in post_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(") ORDER BY created_at ASC");

    qb.build_query_as::<PostReactionRow>()
        .fetch_all(pool)
        .await
}

const SQL_UPSERT_REACTION: &str = r#"
INSERT INTO post_reactions (post_id, user_id, reaction, created_at)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT (post_id, user_id) DO UPDATE SET
  reaction = excluded.reaction,
  created_at = excluded.created_at
"#;

pub async fn upsert_reaction(
    pool: &SqlitePool,
    post_id: &str,
    user_id: &str,
    reaction: &str, // agree|disagree
) -> sqlx::Result<()> {
    sqlx::query(SQL_UPSERT_REACTION)
        .bind(post_id)
        .bind(user_id)
        .bind(reaction)
        .bind(Utc::now())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_reaction(pool: &SqlitePool, post_id: &str, user_id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM post_reactions WHERE post_id = ?1 AND user_id = ?2")
        .bind(post_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
