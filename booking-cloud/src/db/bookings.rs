//! Bookings and their sessions

use rust_decimal::Decimal;
use shared::models::{BookingStatus, PaymentBreakdown};
use sqlx::{PgConnection, PgPool};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingRow {
    pub id: i64,
    pub parent_id: i64,
    pub venue_id: i64,
    pub status: String,
    pub amount: Decimal,
    pub paid_card: Decimal,
    pub paid_tfc: Decimal,
    pub paid_voucher: Decimal,
    pub paid_wallet: Decimal,
    pub cancelled_at: Option<i64>,
    pub cancel_reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl BookingRow {
    pub fn status(&self) -> Option<BookingStatus> {
        BookingStatus::from_db(&self.status)
    }

    pub fn payment(&self) -> PaymentBreakdown {
        PaymentBreakdown {
            card: self.paid_card,
            tfc: self.paid_tfc,
            voucher: self.paid_voucher,
            wallet_credit: self.paid_wallet,
        }
    }
}

const BOOKING_COLUMNS: &str = "id, parent_id, venue_id, status, amount, paid_card, paid_tfc, \
     paid_voucher, paid_wallet, cancelled_at, cancel_reason, created_at, updated_at";

pub async fn find_by_id(pool: &PgPool, booking_id: i64) -> Result<Option<BookingRow>, sqlx::Error> {
    sqlx::query_as::<_, BookingRow>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
    ))
    .bind(booking_id)
    .fetch_optional(pool)
    .await
}

/// Load a booking and hold a row lock until the transaction ends
pub async fn lock_by_id(
    conn: &mut PgConnection,
    booking_id: i64,
) -> Result<Option<BookingRow>, sqlx::Error> {
    sqlx::query_as::<_, BookingRow>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
    ))
    .bind(booking_id)
    .fetch_optional(conn)
    .await
}

/// Session start times, earliest first
pub async fn session_starts(
    conn: &mut PgConnection,
    booking_id: i64,
) -> Result<Vec<i64>, sqlx::Error> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        "SELECT starts_at FROM booking_sessions WHERE booking_id = $1 ORDER BY starts_at",
    )
    .bind(booking_id)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(|r| r.0).collect())
}

/// Move a booking out of `from` into `to`; returns false if it was not in `from`
pub async fn transition_status(
    conn: &mut PgConnection,
    booking_id: i64,
    from: &[BookingStatus],
    to: BookingStatus,
    reason: Option<&str>,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let from: Vec<&str> = from.iter().map(|s| s.as_db()).collect();
    let cancelled_at = (to == BookingStatus::Cancelled).then_some(now);
    let result = sqlx::query(
        "UPDATE bookings
         SET status = $1,
             cancel_reason = COALESCE($2, cancel_reason),
             cancelled_at = COALESCE($3, cancelled_at),
             updated_at = $4
         WHERE id = $5 AND status = ANY($6)",
    )
    .bind(to.as_db())
    .bind(reason)
    .bind(cancelled_at)
    .bind(now)
    .bind(booking_id)
    .bind(&from)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Record a TFC transfer against the booking and confirm it
///
/// The recorded amount is capped at what the booking still owes.
pub async fn confirm_tfc_payment(
    conn: &mut PgConnection,
    booking_id: i64,
    amount: Decimal,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE bookings
         SET paid_tfc = paid_tfc + LEAST(
                 $1,
                 GREATEST(amount - (paid_card + paid_tfc + paid_voucher + paid_wallet), 0)
             ),
             status = 'confirmed',
             updated_at = $2
         WHERE id = $3 AND status = 'pending_payment'",
    )
    .bind(amount)
    .bind(now)
    .bind(booking_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Record wallet credit applied to the booking
pub async fn add_wallet_payment(
    conn: &mut PgConnection,
    booking_id: i64,
    amount: Decimal,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE bookings SET paid_wallet = paid_wallet + $1, updated_at = $2 WHERE id = $3",
    )
    .bind(amount)
    .bind(now)
    .bind(booking_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Mark a booking confirmed once its payments cover the amount
pub async fn confirm_if_fully_paid(
    conn: &mut PgConnection,
    booking_id: i64,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE bookings SET status = 'confirmed', updated_at = $1
         WHERE id = $2 AND status = 'pending_payment'
           AND paid_card + paid_tfc + paid_voucher + paid_wallet >= amount",
    )
    .bind(now)
    .bind(booking_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
