use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{Hook, NewHook},
};

pub async fn insert_hook(hook: NewHook, conn: &mut SqliteConnection) -> Result<i64, SqliteDatabaseError> {
    let payload = hook.payload.to_string();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO hooks (event_type, url, user_id, payload) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(&hook.event_type)
    .bind(&hook.url)
    .bind(&hook.user_id)
    .bind(payload)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ '{}' webhook #{id} queued for {}", hook.event_type, hook.url);
    Ok(id)
}

pub async fn fetch_hooks(event_type: Option<&str>, conn: &mut SqliteConnection) -> Result<Vec<Hook>, SqliteDatabaseError> {
    let hooks = sqlx::query_as::<_, Hook>(
        r#"
            SELECT id, event_type, url, user_id, payload, created_at FROM hooks
            WHERE $1 IS NULL OR event_type = $1
            ORDER BY id ASC
        "#,
    )
    .bind(event_type)
    .fetch_all(conn)
    .await?;
    Ok(hooks)
}
