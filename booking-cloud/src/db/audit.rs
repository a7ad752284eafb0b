//! Audit log operations

use sqlx::PgConnection;

/// Write an audit log entry (`actor_id` is `None` for background jobs)
pub async fn log(
    conn: &mut PgConnection,
    actor_id: Option<i64>,
    action: &str,
    detail: Option<&serde_json::Value>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO audit_logs (actor_id, action, detail, created_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(actor_id)
    .bind(action)
    .bind(detail)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}
