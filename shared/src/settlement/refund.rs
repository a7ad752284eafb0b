//! Cancellation refund calculation
//!
//! Splits what a cancelled booking gives back into a cash refund (card
//! portion only), wallet credit (everything else) and the admin fee the
//! platform retains.
//!
//! | who / when                         | result                               |
//! |------------------------------------|--------------------------------------|
//! | provider                           | full refund + credit, no fee         |
//! | parent, notice >= 24h              | refund + credit, minus fee           |
//! | parent, 0 < notice < 24h           | pro-rata credit only, minus fee      |
//! | parent, session already started    | nothing                              |
//! | no-show                            | nothing                              |
//!
//! Multi-session bookings are first scaled to the sessions not yet started.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::{money_eq, round_money, validate_amount};
use super::{SettlementError, SettlementResult};
use crate::models::{CancellationKind, PaymentBreakdown};

/// Minimum notice for a cash refund
pub const FULL_REFUND_NOTICE_HOURS: i64 = 24;

/// Admin fee retained on parent cancellations (£2.00)
pub const DEFAULT_ADMIN_FEE: Decimal = Decimal::from_parts(200, 0, 0, false, 2);

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Configurable part of the refund rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundPolicy {
    pub admin_fee: Decimal,
    pub full_notice_hours: i64,
}

impl Default for RefundPolicy {
    fn default() -> Self {
        Self {
            admin_fee: DEFAULT_ADMIN_FEE,
            full_notice_hours: FULL_REFUND_NOTICE_HOURS,
        }
    }
}

/// How many of the booked sessions are still ahead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCoverage {
    pub total: u32,
    pub remaining: u32,
}

impl SessionCoverage {
    pub fn single() -> Self {
        Self {
            total: 1,
            remaining: 1,
        }
    }
}

/// Everything the refund rules look at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundInput {
    pub amount: Decimal,
    pub payment: PaymentBreakdown,
    pub kind: CancellationKind,
    /// Unix millis
    pub cancelled_at: i64,
    /// Start of the earliest session that has not started yet (Unix millis)
    pub next_session_start: i64,
    pub sessions: SessionCoverage,
}

/// Which rule produced the outcome (kept for audit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundTier {
    Provider,
    FullNotice,
    LateNotice,
    NoShow,
    NotEligible,
}

impl RefundTier {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Provider => "provider",
            Self::FullNotice => "full_notice",
            Self::LateNotice => "late_notice",
            Self::NoShow => "no_show",
            Self::NotEligible => "not_eligible",
        }
    }
}

/// Result of a refund calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundOutcome {
    /// Back to the card
    pub cash_refund: Decimal,
    /// Issued as wallet credit
    pub credit_amount: Decimal,
    /// Retained by the platform
    pub admin_fee: Decimal,
    pub tier: RefundTier,
}

impl RefundOutcome {
    fn nothing(tier: RefundTier) -> Self {
        Self {
            cash_refund: Decimal::ZERO,
            credit_amount: Decimal::ZERO,
            admin_fee: Decimal::ZERO,
            tier,
        }
    }

    /// Value returned to the parent in any form
    pub fn total_returned(&self) -> Decimal {
        self.cash_refund + self.credit_amount
    }
}

/// Compute the refund for a cancellation
pub fn calculate_refund(
    input: &RefundInput,
    policy: &RefundPolicy,
) -> SettlementResult<RefundOutcome> {
    let amount = validate_amount(input.amount, "amount")?;
    let card = validate_amount(input.payment.card, "payment.card")?;
    let paid = card
        + validate_amount(input.payment.tfc, "payment.tfc")?
        + validate_amount(input.payment.voucher, "payment.voucher")?
        + validate_amount(input.payment.wallet_credit, "payment.wallet_credit")?;
    if !money_eq(paid, amount) {
        return Err(SettlementError::BreakdownMismatch { amount, paid });
    }

    let SessionCoverage { total, remaining } = input.sessions;
    if total == 0 {
        return Err(SettlementError::NoSessions);
    }
    if remaining > total {
        return Err(SettlementError::InvalidSessionCount { remaining, total });
    }
    let ratio = Decimal::from(remaining) / Decimal::from(total);
    // Derived from `amount` so cash + credit never drifts from the booking total
    let non_card = amount - card;

    match input.kind {
        CancellationKind::NoShow => Ok(RefundOutcome::nothing(RefundTier::NoShow)),
        CancellationKind::Provider => Ok(RefundOutcome {
            cash_refund: round_money(card * ratio),
            credit_amount: round_money(non_card * ratio),
            admin_fee: Decimal::ZERO,
            tier: RefundTier::Provider,
        }),
        CancellationKind::Parent => {
            let notice_ms = input.next_session_start - input.cancelled_at;
            if remaining == 0 || notice_ms <= 0 {
                return Ok(RefundOutcome::nothing(RefundTier::NotEligible));
            }

            let window_ms = policy.full_notice_hours.max(0) * MILLIS_PER_HOUR;
            let (cash, credit, tier) = if notice_ms >= window_ms {
                (
                    round_money(card * ratio),
                    round_money(non_card * ratio),
                    RefundTier::FullNotice,
                )
            } else {
                let share = Decimal::from(notice_ms) / Decimal::from(window_ms);
                (
                    Decimal::ZERO,
                    round_money(amount * ratio * share),
                    RefundTier::LateNotice,
                )
            };
            Ok(deduct_admin_fee(cash, credit, policy.admin_fee, tier))
        }
    }
}

/// Take the fee from cash first, then credit; never below zero
fn deduct_admin_fee(
    cash: Decimal,
    credit: Decimal,
    admin_fee: Decimal,
    tier: RefundTier,
) -> RefundOutcome {
    let fee = admin_fee.max(Decimal::ZERO).min(cash + credit);
    let from_cash = fee.min(cash);
    let from_credit = fee - from_cash;
    RefundOutcome {
        cash_refund: cash - from_cash,
        credit_amount: credit - from_credit,
        admin_fee: fee,
        tier,
    }
}
