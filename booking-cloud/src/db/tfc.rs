//! TFC payment references

use rust_decimal::Decimal;
use shared::models::{TfcCancelReason, TfcPayment, TfcStatus};
use sqlx::{PgConnection, PgPool};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TfcPaymentRow {
    pub id: i64,
    pub booking_id: i64,
    pub parent_id: i64,
    pub reference: String,
    pub amount: Decimal,
    pub status: String,
    pub deadline_at: i64,
    pub reminder_at: i64,
    pub reminder_sent_at: Option<i64>,
    pub received_amount: Option<Decimal>,
    pub paid_at: Option<i64>,
    pub cancelled_at: Option<i64>,
    pub cancel_reason: Option<String>,
    pub created_at: i64,
}

impl TfcPaymentRow {
    pub fn status(&self) -> Option<TfcStatus> {
        TfcStatus::from_db(&self.status)
    }

    /// Convert to the API model; rows with an unknown status are skipped
    pub fn into_model(self) -> Option<TfcPayment> {
        Some(TfcPayment {
            status: TfcStatus::from_db(&self.status)?,
            cancel_reason: self
                .cancel_reason
                .as_deref()
                .and_then(TfcCancelReason::from_db),
            id: self.id,
            booking_id: self.booking_id,
            parent_id: self.parent_id,
            reference: self.reference,
            amount: self.amount,
            deadline_at: self.deadline_at,
            reminder_at: self.reminder_at,
            reminder_sent_at: self.reminder_sent_at,
            received_amount: self.received_amount,
            paid_at: self.paid_at,
            cancelled_at: self.cancelled_at,
            created_at: self.created_at,
        })
    }
}

const TFC_COLUMNS: &str = "id, booking_id, parent_id, reference, amount, status, deadline_at, \
     reminder_at, reminder_sent_at, received_amount, paid_at, cancelled_at, cancel_reason, created_at";

pub struct CreateTfcPayment<'a> {
    pub id: i64,
    pub booking_id: i64,
    pub parent_id: i64,
    pub reference: &'a str,
    pub amount: Decimal,
    pub deadline_at: i64,
    pub reminder_at: i64,
    pub now: i64,
}

/// Insert a pending reference; returns false on a reference collision
pub async fn create(
    conn: &mut PgConnection,
    payment: &CreateTfcPayment<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO tfc_payments
            (id, booking_id, parent_id, reference, amount, status, deadline_at, reminder_at, created_at)
         VALUES ($1, $2, $3, $4, $5, 'pending_payment', $6, $7, $8)
         ON CONFLICT (reference) DO NOTHING",
    )
    .bind(payment.id)
    .bind(payment.booking_id)
    .bind(payment.parent_id)
    .bind(payment.reference)
    .bind(payment.amount)
    .bind(payment.deadline_at)
    .bind(payment.reminder_at)
    .bind(payment.now)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn find_by_reference(
    pool: &PgPool,
    reference: &str,
) -> Result<Option<TfcPaymentRow>, sqlx::Error> {
    sqlx::query_as::<_, TfcPaymentRow>(&format!(
        "SELECT {TFC_COLUMNS} FROM tfc_payments WHERE reference = $1"
    ))
    .bind(reference)
    .fetch_optional(pool)
    .await
}

pub async fn lock_by_reference(
    conn: &mut PgConnection,
    reference: &str,
) -> Result<Option<TfcPaymentRow>, sqlx::Error> {
    sqlx::query_as::<_, TfcPaymentRow>(&format!(
        "SELECT {TFC_COLUMNS} FROM tfc_payments WHERE reference = $1 FOR UPDATE"
    ))
    .bind(reference)
    .fetch_optional(conn)
    .await
}

/// The booking's pending reference, if any
pub async fn find_pending_for_booking(
    conn: &mut PgConnection,
    booking_id: i64,
) -> Result<Option<TfcPaymentRow>, sqlx::Error> {
    sqlx::query_as::<_, TfcPaymentRow>(&format!(
        "SELECT {TFC_COLUMNS} FROM tfc_payments
         WHERE booking_id = $1 AND status = 'pending_payment'"
    ))
    .bind(booking_id)
    .fetch_optional(conn)
    .await
}

/// `pending_payment → paid`; false if the row already left pending
pub async fn mark_paid(
    conn: &mut PgConnection,
    payment_id: i64,
    received_amount: Decimal,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE tfc_payments
         SET status = 'paid', received_amount = $1, paid_at = $2
         WHERE id = $3 AND status = 'pending_payment'",
    )
    .bind(received_amount)
    .bind(now)
    .bind(payment_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// `pending_payment → cancelled`; false if the row already left pending
pub async fn mark_cancelled(
    conn: &mut PgConnection,
    payment_id: i64,
    reason: TfcCancelReason,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE tfc_payments
         SET status = 'cancelled', cancel_reason = $1, cancelled_at = $2
         WHERE id = $3 AND status = 'pending_payment'",
    )
    .bind(reason.as_db())
    .bind(now)
    .bind(payment_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Pending rows strictly past their deadline
pub async fn find_overdue(
    pool: &PgPool,
    now: i64,
    limit: i64,
) -> Result<Vec<TfcPaymentRow>, sqlx::Error> {
    sqlx::query_as::<_, TfcPaymentRow>(&format!(
        "SELECT {TFC_COLUMNS} FROM tfc_payments
         WHERE status = 'pending_payment' AND deadline_at < $1
         ORDER BY deadline_at
         LIMIT $2"
    ))
    .bind(now)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Pending rows whose reminder window is open and no reminder went out
pub async fn find_reminders_due(
    pool: &PgPool,
    now: i64,
    limit: i64,
) -> Result<Vec<TfcPaymentRow>, sqlx::Error> {
    sqlx::query_as::<_, TfcPaymentRow>(&format!(
        "SELECT {TFC_COLUMNS} FROM tfc_payments
         WHERE status = 'pending_payment'
           AND reminder_sent_at IS NULL
           AND reminder_at <= $1
           AND deadline_at >= $1
         ORDER BY reminder_at
         LIMIT $2"
    ))
    .bind(now)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Claim the reminder for a row; false if another sweep got there first
pub async fn mark_reminder_sent(
    conn: &mut PgConnection,
    payment_id: i64,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE tfc_payments SET reminder_sent_at = $1
         WHERE id = $2 AND status = 'pending_payment' AND reminder_sent_at IS NULL",
    )
    .bind(now)
    .bind(payment_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
