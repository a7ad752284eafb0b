//! Wallet credit operations

use rust_decimal::Decimal;
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{BookingStatus, CreditSource, WalletCredit, WalletTransactionKind};
use shared::settlement::SettlementError;
use shared::settlement::money::validate_amount;
use shared::settlement::wallet::{self as rules, AllocationPlan};
use sqlx::PgConnection;

use crate::auth::Identity;
use crate::db;
use crate::db::wallet::{IssueCredit, LedgerEntry, WalletTransactionRow};
use crate::error::ServiceResult;
use crate::state::AppState;

const RECENT_TRANSACTIONS: i64 = 20;

/// Issue a credit and its ledger row inside the caller's transaction
pub async fn issue_credit(
    conn: &mut PgConnection,
    parent_id: i64,
    amount: Decimal,
    expires_at: i64,
    source: CreditSource,
    source_booking_id: Option<i64>,
    now: i64,
) -> ServiceResult<i64> {
    let credit = IssueCredit {
        id: shared::util::snowflake_id(),
        parent_id,
        amount,
        expires_at,
        source,
        source_booking_id,
        now,
    };
    db::wallet::insert_credit(conn, &credit).await?;
    db::wallet::record_transaction(
        conn,
        &LedgerEntry {
            parent_id,
            credit_id: credit.id,
            kind: WalletTransactionKind::Issue,
            amount,
            booking_id: source_booking_id,
            related_parent_id: None,
            now,
        },
    )
    .await?;
    Ok(credit.id)
}

/// Apply an allocation plan to locked credits, writing one ledger row per credit
async fn consume(
    conn: &mut PgConnection,
    parent_id: i64,
    plan: &AllocationPlan,
    kind: WalletTransactionKind,
    booking_id: Option<i64>,
    related_parent_id: Option<i64>,
    now: i64,
) -> ServiceResult<()> {
    for allocation in &plan.allocations {
        if !db::wallet::add_usage(conn, allocation.credit_id, allocation.amount).await? {
            return Err(AppError::with_message(
                ErrorCode::WalletInsufficientBalance,
                "Wallet credit changed during allocation",
            )
            .with_detail("credit_id", allocation.credit_id)
            .into());
        }
        db::wallet::record_transaction(
            conn,
            &LedgerEntry {
                parent_id,
                credit_id: allocation.credit_id,
                kind,
                amount: allocation.amount,
                booking_id,
                related_parent_id,
                now,
            },
        )
        .await?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct WalletSummary {
    pub parent_id: i64,
    pub balance: Decimal,
    pub credits: Vec<WalletCredit>,
    pub recent_transactions: Vec<WalletTransactionRow>,
}

/// Balance, usable credits (soonest expiry first) and recent ledger entries
pub async fn summary(state: &AppState, parent_id: i64, now: i64) -> ServiceResult<WalletSummary> {
    let rows = db::wallet::list_active(&state.pool, parent_id).await?;
    let credits: Vec<WalletCredit> = db::wallet::into_models(rows)
        .into_iter()
        .filter(|c| rules::is_usable(c, now))
        .collect();
    let recent_transactions =
        db::wallet::list_transactions(&state.pool, parent_id, RECENT_TRANSACTIONS).await?;

    Ok(WalletSummary {
        parent_id,
        balance: rules::balance(&credits, now),
        credits,
        recent_transactions,
    })
}

#[derive(Debug, Serialize)]
pub struct SpendOutcome {
    pub booking_id: i64,
    pub plan: AllocationPlan,
    pub booking_confirmed: bool,
    pub balance: Decimal,
}

/// Apply wallet credit to a booking awaiting payment
///
/// With `allow_partial` the available balance is used even if it does not
/// cover `amount`; otherwise a shortfall fails the whole spend.
pub async fn spend(
    state: &AppState,
    identity: &Identity,
    booking_id: i64,
    amount: Decimal,
    allow_partial: bool,
    now: i64,
) -> ServiceResult<SpendOutcome> {
    let amount = validate_amount(amount, "amount")?;
    if amount.is_zero() {
        return Err(AppError::with_message(ErrorCode::InvalidAmount, "Amount must be positive").into());
    }

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

    if let Some(pending) = db::tfc::find_pending_for_booking(&mut tx, booking_id).await? {
        return Err(AppError::with_message(
            ErrorCode::TfcReferenceExists,
            "Booking is awaiting a TFC transfer; cancel the reference before paying with credit",
        )
        .with_detail("reference", pending.reference)
        .into());
    }

    let outstanding = (booking.amount - booking.payment().total()).max(Decimal::ZERO);
    if amount > outstanding {
        return Err(AppError::with_message(
            ErrorCode::RefundExceedsAmount,
            "Amount exceeds the outstanding balance of the booking",
        )
        .with_detail("outstanding", outstanding.to_string())
        .into());
    }

    let credits = db::wallet::into_models(db::wallet::lock_active(&mut tx, booking.parent_id).await?);
    let plan = if allow_partial {
        rules::allocate(&credits, amount, now)?
    } else {
        rules::allocate_exact(&credits, amount, now)?
    };

    if !plan.applied.is_zero() {
        consume(
            &mut tx,
            booking.parent_id,
            &plan,
            WalletTransactionKind::Spend,
            Some(booking_id),
            None,
            now,
        )
        .await?;
        db::bookings::add_wallet_payment(&mut tx, booking_id, plan.applied, now).await?;
    }
    let booking_confirmed = db::bookings::confirm_if_fully_paid(&mut tx, booking_id, now).await?;

    tx.commit().await?;

    tracing::info!(
        booking_id,
        parent_id = booking.parent_id,
        applied = %plan.applied,
        shortfall = %plan.shortfall,
        booking_confirmed,
        "Wallet credit applied to booking"
    );

    let balance = rules::balance(&credits, now) - plan.applied;
    Ok(SpendOutcome {
        booking_id,
        plan,
        booking_confirmed,
        balance,
    })
}

#[derive(Debug, Serialize)]
pub struct TransferOutcome {
    pub from_parent_id: i64,
    pub to_parent_id: i64,
    pub amount: Decimal,
    pub issued_credit_ids: Vec<i64>,
}

/// Move credit between parents, keeping each source credit's expiry
pub async fn transfer(
    state: &AppState,
    actor: &Identity,
    from_parent_id: i64,
    to_parent_id: i64,
    amount: Decimal,
    now: i64,
) -> ServiceResult<TransferOutcome> {
    if from_parent_id == to_parent_id {
        return Err(SettlementError::SameParentTransfer.into());
    }

    let mut tx = state.pool.begin().await?;

    let credits = db::wallet::into_models(db::wallet::lock_active(&mut tx, from_parent_id).await?);
    let plan = rules::plan_transfer(from_parent_id, to_parent_id, &credits, amount, now)?;

    consume(
        &mut tx,
        from_parent_id,
        &plan.debit,
        WalletTransactionKind::TransferOut,
        None,
        Some(to_parent_id),
        now,
    )
    .await?;

    let mut issued_credit_ids = Vec::with_capacity(plan.credits.len());
    for credit in &plan.credits {
        let credit_id = shared::util::snowflake_id();
        db::wallet::insert_credit(
            &mut tx,
            &IssueCredit {
                id: credit_id,
                parent_id: to_parent_id,
                amount: credit.amount,
                expires_at: credit.expires_at,
                source: CreditSource::Transfer,
                source_booking_id: None,
                now,
            },
        )
        .await?;
        db::wallet::record_transaction(
            &mut tx,
            &LedgerEntry {
                parent_id: to_parent_id,
                credit_id,
                kind: WalletTransactionKind::TransferIn,
                amount: credit.amount,
                booking_id: None,
                related_parent_id: Some(from_parent_id),
                now,
            },
        )
        .await?;
        issued_credit_ids.push(credit_id);
    }

    let payload = serde_json::json!({
        "from_parent_id": from_parent_id,
        "amount": plan.debit.applied.to_string(),
    });
    db::notifications::enqueue(
        &mut tx,
        to_parent_id,
        db::notifications::CREDIT_RECEIVED,
        &payload,
        now,
    )
    .await?;
    let detail = serde_json::json!({
        "from_parent_id": from_parent_id,
        "to_parent_id": to_parent_id,
        "amount": plan.debit.applied.to_string(),
        "credits": issued_credit_ids,
    });
    db::audit::log(&mut tx, Some(actor.user_id), "wallet_transfer", Some(&detail), now).await?;

    tx.commit().await?;

    tracing::info!(
        from_parent_id,
        to_parent_id,
        amount = %plan.debit.applied,
        credits = issued_credit_ids.len(),
        "Wallet credit transferred"
    );

    Ok(TransferOutcome {
        from_parent_id,
        to_parent_id,
        amount: plan.debit.applied,
        issued_credit_ids,
    })
}

#[derive(Debug, Serialize)]
pub struct GrantOutcome {
    pub credit_id: i64,
    pub parent_id: i64,
    pub amount: Decimal,
    pub expires_at: i64,
}

/// Admin-issued credit (goodwill or manual adjustment)
#[allow(clippy::too_many_arguments)]
pub async fn grant(
    state: &AppState,
    actor: &Identity,
    parent_id: i64,
    amount: Decimal,
    source: CreditSource,
    validity_days: Option<i64>,
    note: Option<&str>,
    now: i64,
) -> ServiceResult<GrantOutcome> {
    let amount = validate_amount(amount, "amount")?;
    if amount.is_zero() {
        return Err(AppError::with_message(ErrorCode::InvalidAmount, "Amount must be positive").into());
    }
    if !matches!(source, CreditSource::Goodwill | CreditSource::Adjustment) {
        return Err(AppError::validation("source must be goodwill or adjustment")
            .with_detail("field", "source")
            .into());
    }
    let validity_days = validity_days.unwrap_or(state.credit_validity_days);
    if validity_days < 1 {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "validity_days must be at least 1",
        )
        .into());
    }
    let expires_at = rules::expiry_for(now, validity_days);

    let mut tx = state.pool.begin().await?;
    let credit_id = issue_credit(&mut tx, parent_id, amount, expires_at, source, None, now).await?;
    let detail = serde_json::json!({
        "parent_id": parent_id,
        "credit_id": credit_id,
        "amount": amount.to_string(),
        "source": source.as_db(),
        "note": note,
    });
    db::audit::log(&mut tx, Some(actor.user_id), "wallet_credit_granted", Some(&detail), now).await?;
    tx.commit().await?;

    tracing::info!(parent_id, credit_id, amount = %amount, source = source.as_db(), "Wallet credit granted");

    Ok(GrantOutcome {
        credit_id,
        parent_id,
        amount,
        expires_at,
    })
}

/// Expire active credits past their expiry; returns how many were flipped
pub async fn expire_credits(state: &AppState, now: i64, batch: i64) -> ServiceResult<usize> {
    let due = db::wallet::into_models(db::wallet::find_expired(&state.pool, now, batch).await?);
    let ids: Vec<i64> = rules::expired_credit_ids(&due, now);

    let mut expired = 0;
    for credit in due.iter().filter(|c| ids.contains(&c.id)) {
        let mut tx = state.pool.begin().await?;
        if !db::wallet::mark_expired(&mut tx, credit.id, now).await? {
            // Already handled by a concurrent sweep
            continue;
        }
        let remaining = credit.remaining();
        if remaining > Decimal::ZERO {
            db::wallet::record_transaction(
                &mut tx,
                &LedgerEntry {
                    parent_id: credit.parent_id,
                    credit_id: credit.id,
                    kind: WalletTransactionKind::Expire,
                    amount: remaining,
                    booking_id: None,
                    related_parent_id: None,
                    now,
                },
            )
            .await?;
            let payload = serde_json::json!({
                "credit_id": credit.id,
                "amount": remaining.to_string(),
                "expired_at": credit.expires_at,
            });
            db::notifications::enqueue(
                &mut tx,
                credit.parent_id,
                db::notifications::CREDIT_EXPIRED,
                &payload,
                now,
            )
            .await?;
        }
        tx.commit().await?;
        expired += 1;
    }

    Ok(expired)
}
