//! Tax-Free Childcare payment references

use rust_decimal::Decimal;
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    BookingStatus, CancellationKind, Role, TfcCancelReason, TfcPayment, TfcStatus,
};
use shared::settlement::tfc::{self as rules, TfcReference};
use sqlx::PgConnection;

use crate::auth::Identity;
use crate::db;
use crate::db::refunds::RefundRow;
use crate::db::tfc::{CreateTfcPayment, TfcPaymentRow};
use crate::error::ServiceResult;
use crate::services::cancellation::{self, Release, refund_payload};
use crate::state::AppState;

/// Attempts before giving up on reference collisions
const MAX_REFERENCE_ATTEMPTS: usize = 5;

fn to_model(row: TfcPaymentRow) -> ServiceResult<TfcPayment> {
    let id = row.id;
    row.into_model().ok_or_else(|| {
        AppError::internal(format!("TFC payment {id} has unknown status")).into()
    })
}

fn row_status(row: &TfcPaymentRow) -> Result<TfcStatus, AppError> {
    row.status()
        .ok_or_else(|| AppError::internal(format!("TFC payment {} has unknown status", row.id)))
}

fn parse(reference: &str) -> Result<TfcReference, AppError> {
    rules::parse_reference(reference).map_err(AppError::from)
}

/// Create a pending reference for a booking awaiting a TFC transfer
pub async fn create_for_booking(
    state: &AppState,
    identity: &Identity,
    booking_id: i64,
    now: i64,
) -> ServiceResult<TfcPayment> {
    identity.require(&[Role::Parent, Role::Admin])?;

    let mut tx = state.pool.begin().await?;

    let booking = db::bookings::lock_by_id(&mut tx, booking_id)
        .await?
        .ok_or_else(|| AppError::booking_not_found(booking_id))?;
    identity.ensure_parent_owns(booking.parent_id)?;
    if booking.status() != Some(BookingStatus::PendingPayment) {
        return Err(AppError::new(ErrorCode::BookingNotPending)
            .with_detail("status", booking.status.clone())
            .into());
    }
    if let Some(existing) = db::tfc::find_pending_for_booking(&mut tx, booking_id).await? {
        return Err(AppError::new(ErrorCode::TfcReferenceExists)
            .with_detail("reference", existing.reference)
            .into());
    }

    let amount = booking.amount - booking.payment().total();
    if amount <= Decimal::ZERO {
        return Err(AppError::with_message(
            ErrorCode::InvalidAmount,
            "Booking has nothing left to pay",
        )
        .into());
    }

    let starts = db::bookings::session_starts(&mut tx, booking_id).await?;
    let schedule = rules::schedule(now, state.tfc_hold_period_days, starts.first().copied())?;
    let created_at = shared::util::millis_to_datetime(now);

    let mut inserted = None;
    for _ in 0..MAX_REFERENCE_ATTEMPTS {
        let reference = rules::generate_reference(created_at, &mut rand::thread_rng());
        let payment = CreateTfcPayment {
            id: shared::util::snowflake_id(),
            booking_id,
            parent_id: booking.parent_id,
            reference: &reference,
            amount,
            deadline_at: schedule.deadline_at,
            reminder_at: schedule.reminder_at,
            now,
        };
        if db::tfc::create(&mut tx, &payment).await? {
            inserted = Some(reference);
            break;
        }
        tracing::warn!(%reference, "TFC reference collision, retrying");
    }
    let reference = inserted
        .ok_or_else(|| AppError::internal("Could not allocate a unique TFC reference"))?;

    let detail = serde_json::json!({
        "booking_id": booking_id,
        "reference": reference,
        "amount": amount.to_string(),
        "deadline_at": schedule.deadline_at,
    });
    db::audit::log(&mut tx, Some(identity.user_id), "tfc_reference_created", Some(&detail), now)
        .await?;

    let row = db::tfc::lock_by_reference(&mut tx, &reference)
        .await?
        .ok_or_else(|| AppError::internal("TFC reference vanished after insert"))?;

    tx.commit().await?;

    tracing::info!(booking_id, %reference, deadline_at = schedule.deadline_at, "TFC reference created");
    to_model(row)
}

/// Look up a reference
pub async fn get(state: &AppState, identity: &Identity, reference: &str) -> ServiceResult<TfcPayment> {
    identity.require(&[Role::Parent, Role::Admin])?;
    let parsed = parse(reference)?;

    let row = db::tfc::find_by_reference(&state.pool, &parsed.reference)
        .await?
        .ok_or_else(|| AppError::tfc_not_found(&parsed.reference))?;
    identity.ensure_parent_owns(row.parent_id)?;
    to_model(row)
}

#[derive(Debug, Serialize)]
pub struct ConfirmOutcome {
    pub payment: TfcPayment,
    /// Confirmation arrived after the deadline but before the sweep
    pub late: bool,
}

/// Admin confirms the TFC transfer arrived
pub async fn confirm(
    state: &AppState,
    identity: &Identity,
    reference: &str,
    received_amount: Decimal,
    now: i64,
) -> ServiceResult<ConfirmOutcome> {
    identity.require_admin()?;
    let parsed = parse(reference)?;

    let mut tx = state.pool.begin().await?;

    let row = db::tfc::lock_by_reference(&mut tx, &parsed.reference)
        .await?
        .ok_or_else(|| AppError::tfc_not_found(&parsed.reference))?;
    rules::transition(row_status(&row)?, TfcStatus::Paid)?;
    let received = rules::verify_received(row.amount, received_amount)?;

    if !db::tfc::mark_paid(&mut tx, row.id, received, now).await? {
        return Err(AppError::new(ErrorCode::TfcInvalidTransition)
            .with_detail("reference", parsed.reference)
            .into());
    }
    if !db::bookings::confirm_tfc_payment(&mut tx, row.booking_id, row.amount, now).await? {
        return Err(AppError::new(ErrorCode::BookingNotPending)
            .with_detail("booking_id", row.booking_id)
            .into());
    }

    let late = rules::is_overdue(TfcStatus::PendingPayment, row.deadline_at, now);
    let detail = serde_json::json!({
        "reference": parsed.reference,
        "booking_id": row.booking_id,
        "received_amount": received.to_string(),
        "late": late,
    });
    db::audit::log(&mut tx, Some(identity.user_id), "tfc_payment_confirmed", Some(&detail), now)
        .await?;

    let updated = db::tfc::lock_by_reference(&mut tx, &parsed.reference)
        .await?
        .ok_or_else(|| AppError::tfc_not_found(&parsed.reference))?;

    tx.commit().await?;

    tracing::info!(reference = %parsed.reference, booking_id = row.booking_id, late, "TFC payment confirmed");
    Ok(ConfirmOutcome {
        payment: to_model(updated)?,
        late,
    })
}

#[derive(Debug, Serialize)]
pub struct TfcCancelOutcome {
    pub payment: TfcPayment,
    /// Refund for whatever was already paid towards the released booking
    pub refund: Option<RefundRow>,
    pub credit_id: Option<i64>,
}

/// Manually cancel a pending reference; the held booking is released
pub async fn cancel(
    state: &AppState,
    identity: &Identity,
    reference: &str,
    now: i64,
) -> ServiceResult<TfcCancelOutcome> {
    identity.require(&[Role::Parent, Role::Admin])?;
    let parsed = parse(reference)?;

    let mut tx = state.pool.begin().await?;

    let row = db::tfc::lock_by_reference(&mut tx, &parsed.reference)
        .await?
        .ok_or_else(|| AppError::tfc_not_found(&parsed.reference))?;
    identity.ensure_parent_owns(row.parent_id)?;
    rules::transition(row_status(&row)?, TfcStatus::Cancelled)?;

    let released = cancel_pending(
        state,
        &mut tx,
        &row,
        TfcCancelReason::Manual,
        Some(identity.user_id),
        now,
    )
    .await?;

    let mut detail = serde_json::json!({
        "reference": parsed.reference,
        "booking_id": row.booking_id,
    });
    if let Some(released) = &released {
        let refund = refund_payload(row.booking_id, released.kind, &released.outcome);
        db::notifications::enqueue(
            &mut tx,
            row.parent_id,
            db::notifications::BOOKING_CANCELLED,
            &refund,
            now,
        )
        .await?;
        detail["refund"] = refund;
    }
    db::audit::log(&mut tx, Some(identity.user_id), "tfc_payment_cancelled", Some(&detail), now)
        .await?;

    let updated = db::tfc::lock_by_reference(&mut tx, &parsed.reference)
        .await?
        .ok_or_else(|| AppError::tfc_not_found(&parsed.reference))?;

    tx.commit().await?;

    tracing::info!(reference = %parsed.reference, booking_id = row.booking_id, "TFC payment cancelled");
    let (refund, credit_id) = match released {
        Some(released) => (Some(released.refund), released.credit_id),
        None => (None, None),
    };
    Ok(TfcCancelOutcome {
        payment: to_model(updated)?,
        refund,
        credit_id,
    })
}

/// Cancel a locked pending reference and release its booking
///
/// An expired hold returns everything paid so far with no fee; a manual
/// cancel follows the parent cancellation rules. Returns the refund when a
/// booking was released.
async fn cancel_pending(
    state: &AppState,
    conn: &mut PgConnection,
    row: &TfcPaymentRow,
    reason: TfcCancelReason,
    actor: Option<i64>,
    now: i64,
) -> ServiceResult<Option<Release>> {
    if !db::tfc::mark_cancelled(conn, row.id, reason, now).await? {
        return Err(AppError::new(ErrorCode::TfcInvalidTransition)
            .with_detail("reference", row.reference.clone())
            .into());
    }

    let Some(booking) = db::bookings::lock_by_id(conn, row.booking_id).await? else {
        tracing::warn!(booking_id = row.booking_id, "TFC payment points at a missing booking");
        return Ok(None);
    };
    if booking.status() != Some(BookingStatus::PendingPayment) {
        return Ok(None);
    }

    let (kind, booking_reason) = match reason {
        TfcCancelReason::Expired => (CancellationKind::Provider, "tfc_unpaid"),
        _ => (CancellationKind::Parent, "tfc_cancelled"),
    };
    cancellation::release(
        state,
        conn,
        &booking,
        BookingStatus::PendingPayment,
        kind,
        actor,
        booking_reason,
        now,
    )
    .await
}

/// Cancel every pending reference past its deadline; returns how many were cancelled
///
/// A row that fails is logged and left for the next run.
pub async fn auto_cancel_overdue(state: &AppState, now: i64, batch: i64) -> ServiceResult<usize> {
    let overdue = db::tfc::find_overdue(&state.pool, now, batch).await?;

    let mut cancelled = 0;
    for candidate in overdue {
        match auto_cancel_one(state, &candidate.reference, now).await {
            Ok(true) => cancelled += 1,
            Ok(false) => {}
            Err(e) => {
                let err: AppError = e.into();
                tracing::error!(
                    reference = %candidate.reference,
                    code = %err.code,
                    "TFC auto-cancel failed: {}",
                    err.message
                );
            }
        }
    }

    Ok(cancelled)
}

async fn auto_cancel_one(state: &AppState, reference: &str, now: i64) -> ServiceResult<bool> {
    let mut tx = state.pool.begin().await?;

    // Re-read under lock: a confirmation may have landed since the scan
    let Some(row) = db::tfc::lock_by_reference(&mut tx, reference).await? else {
        return Ok(false);
    };
    let Some(status) = row.status() else {
        tracing::warn!(payment_id = row.id, status = %row.status, "Skipping TFC payment with unknown status");
        return Ok(false);
    };
    if !rules::is_overdue(status, row.deadline_at, now) {
        return Ok(false);
    }
    let released =
        cancel_pending(state, &mut tx, &row, TfcCancelReason::Expired, None, now).await?;

    let mut payload = serde_json::json!({
        "booking_id": row.booking_id,
        "reference": row.reference,
        "amount": row.amount.to_string(),
        "deadline_at": row.deadline_at,
    });
    if let Some(released) = &released {
        payload["refund"] = refund_payload(row.booking_id, released.kind, &released.outcome);
    }
    db::notifications::enqueue(
        &mut tx,
        row.parent_id,
        db::notifications::TFC_AUTO_CANCELLED,
        &payload,
        now,
    )
    .await?;
    db::audit::log(&mut tx, None, "tfc_auto_cancelled", Some(&payload), now).await?;

    tx.commit().await?;
    tracing::info!(reference = %row.reference, booking_id = row.booking_id, "TFC booking auto-cancelled");
    Ok(true)
}

/// Queue reminders for pending references inside their reminder window
pub async fn send_reminders(state: &AppState, now: i64, batch: i64) -> ServiceResult<usize> {
    let due = db::tfc::find_reminders_due(&state.pool, now, batch).await?;

    let mut sent = 0;
    for row in due {
        let Some(status) = row.status() else {
            continue;
        };
        if !rules::reminder_due(status, row.reminder_at, row.reminder_sent_at, row.deadline_at, now) {
            continue;
        }

        let mut tx = state.pool.begin().await?;
        if !db::tfc::mark_reminder_sent(&mut tx, row.id, now).await? {
            continue;
        }
        let payload = serde_json::json!({
            "booking_id": row.booking_id,
            "reference": row.reference,
            "amount": row.amount.to_string(),
            "deadline_at": row.deadline_at,
        });
        db::notifications::enqueue(&mut tx, row.parent_id, db::notifications::TFC_REMINDER, &payload, now)
            .await?;
        tx.commit().await?;
        sent += 1;
    }

    Ok(sent)
}
