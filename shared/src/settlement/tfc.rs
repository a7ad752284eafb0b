//! Tax-Free Childcare payment reference lifecycle
//!
//! ```text
//! pending_payment ──confirm──▶ paid
//!        │
//!        └──cancel / deadline passed──▶ cancelled
//! ```
//!
//! A reference looks like `TFC-20260314-K7QX2M`: the UTC creation date and
//! six characters from an alphabet without `0 O 1 I`.

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::{money_eq, validate_amount};
use super::{SettlementError, SettlementResult};
use crate::models::TfcStatus;

pub const REFERENCE_PREFIX: &str = "TFC";
pub const REFERENCE_CODE_LEN: usize = 6;
const REFERENCE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Days a booking is held while the parent arranges the TFC transfer
pub const DEFAULT_HOLD_PERIOD_DAYS: i64 = 5;

/// Reminder goes out this long before the deadline
pub const REMINDER_LEAD_HOURS: i64 = 48;

const MILLIS_PER_HOUR: i64 = 3_600_000;
const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// Generate a fresh payment reference for `created_at`
pub fn generate_reference<R: Rng + ?Sized>(created_at: DateTime<Utc>, rng: &mut R) -> String {
    let code: String = (0..REFERENCE_CODE_LEN)
        .map(|_| REFERENCE_ALPHABET[rng.gen_range(0..REFERENCE_ALPHABET.len())] as char)
        .collect();
    format!(
        "{REFERENCE_PREFIX}-{}-{code}",
        created_at.date_naive().format("%Y%m%d")
    )
}

/// Parsed payment reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TfcReference {
    /// Normalized (upper-case, trimmed) reference string
    pub reference: String,
    pub issued_on: NaiveDate,
    pub code: String,
}

/// Validate and normalize a reference typed in by a parent or admin
pub fn parse_reference(input: &str) -> SettlementResult<TfcReference> {
    let normalized = input.trim().to_ascii_uppercase();
    let invalid = || SettlementError::InvalidReference(input.to_string());

    let mut parts = normalized.split('-');
    let (Some(prefix), Some(date), Some(code), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };

    if prefix != REFERENCE_PREFIX || date.len() != 8 || code.len() != REFERENCE_CODE_LEN {
        return Err(invalid());
    }
    if !date.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if !code.bytes().all(|b| REFERENCE_ALPHABET.contains(&b)) {
        return Err(invalid());
    }
    let issued_on = NaiveDate::parse_from_str(date, "%Y%m%d").map_err(|_| invalid())?;

    Ok(TfcReference {
        code: code.to_string(),
        issued_on,
        reference: normalized,
    })
}

/// Deadline and reminder instants (Unix millis)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TfcSchedule {
    pub deadline_at: i64,
    pub reminder_at: i64,
}

/// `deadline = created + hold period`, pulled forward to the first session
/// if that comes sooner; reminder 48h before, never before creation.
pub fn schedule(
    created_at: i64,
    hold_period_days: i64,
    first_session_start: Option<i64>,
) -> SettlementResult<TfcSchedule> {
    if hold_period_days < 1 {
        return Err(SettlementError::InvalidHoldPeriod(hold_period_days));
    }

    let mut deadline_at = created_at + hold_period_days * MILLIS_PER_DAY;
    if let Some(start) = first_session_start {
        deadline_at = deadline_at.min(start.max(created_at));
    }
    let reminder_at = (deadline_at - REMINDER_LEAD_HOURS * MILLIS_PER_HOUR).max(created_at);

    Ok(TfcSchedule {
        deadline_at,
        reminder_at,
    })
}

/// Check a status change against the state machine
pub fn transition(from: TfcStatus, to: TfcStatus) -> SettlementResult<()> {
    match (from, to) {
        (TfcStatus::PendingPayment, TfcStatus::Paid)
        | (TfcStatus::PendingPayment, TfcStatus::Cancelled) => Ok(()),
        _ => Err(SettlementError::InvalidTransition { from, to }),
    }
}

/// Accept a received transfer if it covers the expected amount (±1p)
pub fn verify_received(expected: Decimal, received: Decimal) -> SettlementResult<Decimal> {
    let received = validate_amount(received, "received_amount")?;
    if received < expected && !money_eq(received, expected) {
        return Err(SettlementError::AmountShort { expected, received });
    }
    Ok(received)
}

/// Pending and strictly past its deadline
pub fn is_overdue(status: TfcStatus, deadline_at: i64, now: i64) -> bool {
    status == TfcStatus::PendingPayment && now > deadline_at
}

/// Pending, reminder window open, reminder not yet sent
pub fn reminder_due(
    status: TfcStatus,
    reminder_at: i64,
    reminder_sent_at: Option<i64>,
    deadline_at: i64,
    now: i64,
) -> bool {
    status == TfcStatus::PendingPayment
        && reminder_sent_at.is_none()
        && now >= reminder_at
        && now <= deadline_at
}
