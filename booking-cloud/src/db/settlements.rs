//! Venue period settlements

use rust_decimal::Decimal;
use shared::settlement::franchise::PeriodSettlement;
use sqlx::{PgConnection, PgPool};

/// Per-booking money movement inside a settlement period
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SettlementSourceRow {
    pub booking_id: i64,
    /// Sum of all payment parts actually received
    pub paid: Decimal,
    pub refunded: Decimal,
    pub admin_fee: Decimal,
}

/// Paid bookings created in `[start, end)` at a venue, with their refunds
pub async fn load_period_bookings(
    pool: &PgPool,
    venue_id: i64,
    period_start: i64,
    period_end: i64,
) -> Result<Vec<SettlementSourceRow>, sqlx::Error> {
    sqlx::query_as::<_, SettlementSourceRow>(
        "SELECT b.id AS booking_id,
                b.paid_card + b.paid_tfc + b.paid_voucher + b.paid_wallet AS paid,
                COALESCE(r.cash_refund + r.credit_amount, 0) AS refunded,
                COALESCE(r.admin_fee, 0) AS admin_fee
         FROM bookings b
         LEFT JOIN refunds r ON r.booking_id = b.id
         WHERE b.venue_id = $1
           AND b.created_at >= $2 AND b.created_at < $3
           AND b.status <> 'pending_payment'
         ORDER BY b.created_at",
    )
    .bind(venue_id)
    .bind(period_start)
    .bind(period_end)
    .fetch_all(pool)
    .await
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct VenueSettlementRow {
    pub id: i64,
    pub venue_id: i64,
    pub period_start: i64,
    pub period_end: i64,
    pub booking_count: i32,
    pub gross_takings: Decimal,
    pub refunded: Decimal,
    pub fee_net: Decimal,
    pub vat: Decimal,
    pub fee_gross: Decimal,
    pub admin_fee: Decimal,
    pub net_to_venue: Decimal,
    pub created_at: i64,
}

/// Insert or recompute the settlement for a venue/period
pub async fn upsert(
    conn: &mut PgConnection,
    venue_id: i64,
    settlement: &PeriodSettlement,
    now: i64,
) -> Result<VenueSettlementRow, sqlx::Error> {
    let fee = &settlement.fee;
    sqlx::query_as::<_, VenueSettlementRow>(
        "INSERT INTO venue_settlements
            (id, venue_id, period_start, period_end, booking_count, gross_takings, refunded,
             fee_net, vat, fee_gross, admin_fee, net_to_venue, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
         ON CONFLICT (venue_id, period_start, period_end) DO UPDATE SET
            booking_count = EXCLUDED.booking_count,
            gross_takings = EXCLUDED.gross_takings,
            refunded = EXCLUDED.refunded,
            fee_net = EXCLUDED.fee_net,
            vat = EXCLUDED.vat,
            fee_gross = EXCLUDED.fee_gross,
            admin_fee = EXCLUDED.admin_fee,
            net_to_venue = EXCLUDED.net_to_venue,
            created_at = EXCLUDED.created_at
         RETURNING id, venue_id, period_start, period_end, booking_count, gross_takings, refunded,
                   fee_net, vat, fee_gross, admin_fee, net_to_venue, created_at",
    )
    .bind(shared::util::snowflake_id())
    .bind(venue_id)
    .bind(settlement.period_start)
    .bind(settlement.period_end)
    .bind(settlement.booking_count as i32)
    .bind(settlement.gross_takings)
    .bind(settlement.refunded)
    .bind(fee.fee_net)
    .bind(fee.vat)
    .bind(fee.fee_gross)
    .bind(fee.admin_fee)
    .bind(fee.net_to_venue)
    .bind(now)
    .fetch_one(conn)
    .await
}
