//! Refund records (one per cancelled booking)

use rust_decimal::Decimal;
use shared::models::CancellationKind;
use shared::settlement::refund::RefundOutcome;
use sqlx::PgConnection;

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct RefundRow {
    pub id: i64,
    pub booking_id: i64,
    pub kind: String,
    pub tier: String,
    pub cash_refund: Decimal,
    pub credit_amount: Decimal,
    pub admin_fee: Decimal,
    /// None when a background job closed the booking
    pub created_by: Option<i64>,
    pub created_at: i64,
}

pub async fn insert(
    conn: &mut PgConnection,
    booking_id: i64,
    kind: CancellationKind,
    outcome: &RefundOutcome,
    created_by: Option<i64>,
    now: i64,
) -> Result<RefundRow, sqlx::Error> {
    sqlx::query_as::<_, RefundRow>(
        "INSERT INTO refunds
            (id, booking_id, kind, tier, cash_refund, credit_amount, admin_fee, created_by, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING id, booking_id, kind, tier, cash_refund, credit_amount, admin_fee, created_by, created_at",
    )
    .bind(shared::util::snowflake_id())
    .bind(booking_id)
    .bind(kind.as_db())
    .bind(outcome.tier.as_db())
    .bind(outcome.cash_refund)
    .bind(outcome.credit_amount)
    .bind(outcome.admin_fee)
    .bind(created_by)
    .bind(now)
    .fetch_one(conn)
    .await
}
