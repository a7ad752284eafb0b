//! Outbound notifications
//!
//! Delivery (email/SMS) is handled by another system reading this table.

use sqlx::PgConnection;

pub const TFC_REMINDER: &str = "tfc_payment_reminder";
pub const TFC_AUTO_CANCELLED: &str = "tfc_booking_auto_cancelled";
pub const BOOKING_CANCELLED: &str = "booking_cancelled";
pub const CREDIT_EXPIRED: &str = "wallet_credit_expired";
pub const CREDIT_RECEIVED: &str = "wallet_credit_received";

pub async fn enqueue(
    conn: &mut PgConnection,
    recipient_id: i64,
    kind: &str,
    payload: &serde_json::Value,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO notifications (id, recipient_id, kind, payload, created_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(shared::util::snowflake_id())
    .bind(recipient_id)
    .bind(kind)
    .bind(payload)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}
