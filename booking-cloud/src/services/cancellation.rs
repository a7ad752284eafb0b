//! Booking cancellation, no-show and refund quotes

use rust_decimal::Decimal;
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{BookingStatus, CancellationKind, CreditSource, Role, TfcCancelReason};
use shared::settlement::refund::{RefundInput, RefundOutcome, SessionCoverage, calculate_refund};
use shared::settlement::wallet::expiry_for;
use sqlx::PgConnection;

use crate::auth::Identity;
use crate::db;
use crate::db::bookings::BookingRow;
use crate::db::refunds::RefundRow;
use crate::error::ServiceResult;
use crate::services::wallet::issue_credit;
use crate::state::AppState;

/// Session coverage at `now` plus the start of the next session
///
/// Once every session has started, the last start is reported.
pub fn session_window(starts: &[i64], now: i64) -> (SessionCoverage, i64) {
    let remaining = starts.iter().filter(|&&s| s > now).count() as u32;
    let next_start = starts
        .iter()
        .copied()
        .filter(|&s| s > now)
        .min()
        .or_else(|| starts.iter().copied().max())
        .unwrap_or(now);
    (
        SessionCoverage {
            total: starts.len() as u32,
            remaining,
        },
        next_start,
    )
}

/// Work out which cancellation rules apply to the caller
pub fn resolve_kind(
    identity: &Identity,
    requested: Option<CancellationKind>,
) -> Result<CancellationKind, AppError> {
    if requested == Some(CancellationKind::NoShow) {
        return Err(AppError::validation("Use the no-show endpoint to record a no-show")
            .with_detail("field", "kind"));
    }
    match (identity.role, requested) {
        (Role::Admin, Some(kind)) => Ok(kind),
        (Role::Admin, None) | (Role::Parent, None | Some(CancellationKind::Parent)) => {
            Ok(CancellationKind::Parent)
        }
        (Role::Provider, None | Some(CancellationKind::Provider)) => Ok(CancellationKind::Provider),
        _ => Err(AppError::permission_denied(
            "Cancellation kind not allowed for this role",
        )),
    }
}

fn ensure_cancellable(booking: &BookingRow) -> Result<BookingStatus, AppError> {
    let status = booking.status().ok_or_else(|| {
        AppError::internal(format!("Booking {} has unknown status", booking.id))
    })?;
    match status {
        BookingStatus::Cancelled => Err(AppError::new(ErrorCode::BookingAlreadyCancelled)
            .with_detail("booking_id", booking.id)),
        BookingStatus::NoShow => {
            Err(AppError::new(ErrorCode::BookingAlreadyNoShow).with_detail("booking_id", booking.id))
        }
        BookingStatus::Completed => {
            Err(AppError::new(ErrorCode::BookingCompleted).with_detail("booking_id", booking.id))
        }
        BookingStatus::PendingPayment | BookingStatus::Confirmed => Ok(status),
    }
}

/// Refund rules input for a booking
///
/// A booking still awaiting payment is refunded on what was actually paid.
pub fn refund_input(
    booking: &BookingRow,
    status: BookingStatus,
    starts: &[i64],
    kind: CancellationKind,
    now: i64,
) -> RefundInput {
    let payment = booking.payment();
    let amount = match status {
        BookingStatus::PendingPayment => payment.total(),
        _ => booking.amount,
    };
    let (sessions, next_session_start) = session_window(starts, now);
    RefundInput {
        amount,
        payment,
        kind,
        cancelled_at: now,
        next_session_start,
        sessions,
    }
}

#[derive(Debug, Serialize)]
pub struct RefundQuote {
    pub booking_id: i64,
    pub kind: CancellationKind,
    pub refund: RefundOutcome,
}

/// Preview the refund a cancellation would produce right now
pub async fn quote(
    state: &AppState,
    identity: &Identity,
    booking_id: i64,
    requested: Option<CancellationKind>,
    now: i64,
) -> ServiceResult<RefundQuote> {
    identity.require(&[Role::Parent, Role::Admin])?;
    let kind = resolve_kind(identity, requested)?;

    let booking = db::bookings::find_by_id(&state.pool, booking_id)
        .await?
        .ok_or_else(|| AppError::booking_not_found(booking_id))?;
    identity.ensure_parent_owns(booking.parent_id)?;
    let status = ensure_cancellable(&booking)?;

    let mut conn = state.pool.acquire().await?;
    let starts = db::bookings::session_starts(&mut conn, booking_id).await?;
    let refund = calculate_refund(
        &refund_input(&booking, status, &starts, kind, now),
        &state.refund_policy(),
    )?;

    Ok(RefundQuote {
        booking_id,
        kind,
        refund,
    })
}

#[derive(Debug, Serialize)]
pub struct CancellationOutcome {
    pub booking_id: i64,
    pub status: BookingStatus,
    pub refund: RefundRow,
    /// Wallet credit issued for the non-cash part, if any
    pub credit_id: Option<i64>,
}

/// Cancel a booking and issue its refund / credit
pub async fn cancel(
    state: &AppState,
    identity: &Identity,
    booking_id: i64,
    requested: Option<CancellationKind>,
    reason: Option<&str>,
    now: i64,
) -> ServiceResult<CancellationOutcome> {
    identity.require(&[Role::Parent, Role::Provider, Role::Admin])?;
    let kind = resolve_kind(identity, requested)?;
    settle(state, identity, booking_id, kind, reason, now).await
}

/// Record a no-show: booking closed, nothing returned
pub async fn mark_no_show(
    state: &AppState,
    identity: &Identity,
    booking_id: i64,
    now: i64,
) -> ServiceResult<CancellationOutcome> {
    identity.require(&[Role::Provider, Role::Admin])?;
    settle(state, identity, booking_id, CancellationKind::NoShow, None, now).await
}

/// What closing a booking produced
#[derive(Debug)]
pub(crate) struct Release {
    pub kind: CancellationKind,
    pub status: BookingStatus,
    pub outcome: RefundOutcome,
    pub refund: RefundRow,
    pub credit_id: Option<i64>,
}

/// Close a locked booking under `kind`'s refund rules inside the caller's transaction
///
/// Writes the refund row and issues wallet credit for the non-cash part.
/// Returns `None` if the booking already left `status`.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn release(
    state: &AppState,
    conn: &mut PgConnection,
    booking: &BookingRow,
    status: BookingStatus,
    kind: CancellationKind,
    created_by: Option<i64>,
    reason: &str,
    now: i64,
) -> ServiceResult<Option<Release>> {
    let starts = db::bookings::session_starts(conn, booking.id).await?;
    let outcome = calculate_refund(
        &refund_input(booking, status, &starts, kind, now),
        &state.refund_policy(),
    )?;

    let new_status = match kind {
        CancellationKind::NoShow => BookingStatus::NoShow,
        _ => BookingStatus::Cancelled,
    };
    let moved =
        db::bookings::transition_status(conn, booking.id, &[status], new_status, Some(reason), now)
            .await?;
    if !moved {
        return Ok(None);
    }

    let refund = db::refunds::insert(conn, booking.id, kind, &outcome, created_by, now).await?;

    let credit_id = if outcome.credit_amount > Decimal::ZERO {
        Some(
            issue_credit(
                conn,
                booking.parent_id,
                outcome.credit_amount,
                expiry_for(now, state.credit_validity_days),
                CreditSource::Refund,
                Some(booking.id),
                now,
            )
            .await?,
        )
    } else {
        None
    };

    Ok(Some(Release {
        kind,
        status: new_status,
        outcome,
        refund,
        credit_id,
    }))
}

/// Notification / audit payload describing a refund
pub(crate) fn refund_payload(
    booking_id: i64,
    kind: CancellationKind,
    outcome: &RefundOutcome,
) -> serde_json::Value {
    serde_json::json!({
        "booking_id": booking_id,
        "kind": kind.as_db(),
        "tier": outcome.tier.as_db(),
        "cash_refund": outcome.cash_refund.to_string(),
        "credit_amount": outcome.credit_amount.to_string(),
        "admin_fee": outcome.admin_fee.to_string(),
    })
}

async fn settle(
    state: &AppState,
    identity: &Identity,
    booking_id: i64,
    kind: CancellationKind,
    reason: Option<&str>,
    now: i64,
) -> ServiceResult<CancellationOutcome> {
    let mut tx = state.pool.begin().await?;

    let booking = db::bookings::lock_by_id(&mut tx, booking_id)
        .await?
        .ok_or_else(|| AppError::booking_not_found(booking_id))?;
    identity.ensure_parent_owns(booking.parent_id)?;
    let status = ensure_cancellable(&booking)?;
    if kind == CancellationKind::NoShow && status != BookingStatus::Confirmed {
        return Err(AppError::with_message(
            ErrorCode::InvalidRequest,
            "Only confirmed bookings can be marked as no-show",
        )
        .into());
    }

    let stored_reason = match kind {
        CancellationKind::NoShow => kind.as_db(),
        _ => reason.unwrap_or(kind.as_db()),
    };
    let Some(released) = release(
        state,
        &mut tx,
        &booking,
        status,
        kind,
        Some(identity.user_id),
        stored_reason,
        now,
    )
    .await?
    else {
        return Err(AppError::new(ErrorCode::BookingAlreadyCancelled)
            .with_detail("booking_id", booking_id)
            .into());
    };

    if let Some(tfc) = db::tfc::find_pending_for_booking(&mut tx, booking_id).await? {
        db::tfc::mark_cancelled(&mut tx, tfc.id, TfcCancelReason::BookingCancelled, now).await?;
    }

    let payload = refund_payload(booking_id, kind, &released.outcome);
    db::notifications::enqueue(
        &mut tx,
        booking.parent_id,
        db::notifications::BOOKING_CANCELLED,
        &payload,
        now,
    )
    .await?;
    db::audit::log(&mut tx, Some(identity.user_id), "booking_cancelled", Some(&payload), now).await?;

    tx.commit().await?;

    let outcome = &released.outcome;
    tracing::info!(
        booking_id,
        kind = kind.as_db(),
        tier = outcome.tier.as_db(),
        cash_refund = %outcome.cash_refund,
        credit_amount = %outcome.credit_amount,
        admin_fee = %outcome.admin_fee,
        "Booking cancelled"
    );

    Ok(CancellationOutcome {
        booking_id,
        status: released.status,
        refund: released.refund,
        credit_id: released.credit_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::PaymentBreakdown;
    use shared::settlement::refund::{RefundPolicy, RefundTier};
    use std::str::FromStr;

    const HOUR: i64 = 3_600_000;
    const NOW: i64 = 1_773_446_400_000;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn booking(status: BookingStatus, amount: &str, payment: PaymentBreakdown) -> BookingRow {
        BookingRow {
            id: 10,
            parent_id: 1,
            venue_id: 3,
            status: status.as_db().to_string(),
            amount: dec(amount),
            paid_card: payment.card,
            paid_tfc: payment.tfc,
            paid_voucher: payment.voucher,
            paid_wallet: payment.wallet_credit,
            cancelled_at: None,
            cancel_reason: None,
            created_at: NOW - 100 * HOUR,
            updated_at: NOW - 100 * HOUR,
        }
    }

    fn identity(role: Role) -> Identity {
        Identity { user_id: 1, role }
    }

    #[test]
    fn test_session_window_counts_future_sessions() {
        let starts = [NOW - HOUR, NOW + 30 * HOUR, NOW + 200 * HOUR];
        let (coverage, next) = session_window(&starts, NOW);
        assert_eq!(coverage.total, 3);
        assert_eq!(coverage.remaining, 2);
        assert_eq!(next, NOW + 30 * HOUR);
    }

    #[test]
    fn test_session_window_all_started() {
        let starts = [NOW - 5 * HOUR, NOW - HOUR];
        let (coverage, next) = session_window(&starts, NOW);
        assert_eq!(coverage.remaining, 0);
        assert_eq!(next, NOW - HOUR);

        let (coverage, next) = session_window(&[], NOW);
        assert_eq!(coverage.total, 0);
        assert_eq!(next, NOW);
    }

    #[test]
    fn test_resolve_kind_by_role() {
        assert_eq!(
            resolve_kind(&identity(Role::Parent), None).unwrap(),
            CancellationKind::Parent
        );
        assert_eq!(
            resolve_kind(&identity(Role::Provider), None).unwrap(),
            CancellationKind::Provider
        );
        assert_eq!(
            resolve_kind(&identity(Role::Admin), Some(CancellationKind::Provider)).unwrap(),
            CancellationKind::Provider
        );

        let err = resolve_kind(&identity(Role::Parent), Some(CancellationKind::Provider)).unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
        let err = resolve_kind(&identity(Role::Admin), Some(CancellationKind::NoShow)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_ensure_cancellable() {
        let payment = PaymentBreakdown::card(dec("20.00"));
        assert!(ensure_cancellable(&booking(BookingStatus::Confirmed, "20.00", payment)).is_ok());
        assert_eq!(
            ensure_cancellable(&booking(BookingStatus::Cancelled, "20.00", payment))
                .unwrap_err()
                .code,
            ErrorCode::BookingAlreadyCancelled
        );
        assert_eq!(
            ensure_cancellable(&booking(BookingStatus::Completed, "20.00", payment))
                .unwrap_err()
                .code,
            ErrorCode::BookingCompleted
        );
    }

    #[test]
    fn test_confirmed_booking_refund_input() {
        let b = booking(
            BookingStatus::Confirmed,
            "30.00",
            PaymentBreakdown::card(dec("30.00")),
        );
        let input = refund_input(
            &b,
            BookingStatus::Confirmed,
            &[NOW + 48 * HOUR],
            CancellationKind::Parent,
            NOW,
        );
        let outcome = calculate_refund(&input, &RefundPolicy::default()).unwrap();
        assert_eq!(outcome.tier, RefundTier::FullNotice);
        assert_eq!(outcome.cash_refund, dec("28.00"));
        assert_eq!(outcome.admin_fee, dec("2.00"));
    }

    #[test]
    fn test_pending_booking_refunds_only_what_was_paid() {
        let payment = PaymentBreakdown {
            wallet_credit: dec("10.00"),
            ..PaymentBreakdown::default()
        };
        let b = booking(BookingStatus::PendingPayment, "40.00", payment);
        let input = refund_input(
            &b,
            BookingStatus::PendingPayment,
            &[NOW + 72 * HOUR],
            CancellationKind::Provider,
            NOW,
        );
        assert_eq!(input.amount, dec("10.00"));
        let outcome = calculate_refund(&input, &RefundPolicy::default()).unwrap();
        assert_eq!(outcome.credit_amount, dec("10.00"));
        assert_eq!(outcome.cash_refund, Decimal::ZERO);
    }
}
