//! Wallet credit rules
//!
//! Credits are consumed oldest-expiry first. Ties break on creation time,
//! then id, so the same wallet always allocates the same way.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::validate_amount;
use super::{SettlementError, SettlementResult};
use crate::models::{CreditStatus, WalletCredit};

/// Default lifetime of an issued credit
pub const DEFAULT_CREDIT_VALIDITY_DAYS: i64 = 180;

const MILLIS_PER_DAY: i64 = 86_400_000;

pub fn expiry_for(issued_at: i64, validity_days: i64) -> i64 {
    issued_at + validity_days.max(0) * MILLIS_PER_DAY
}

/// Active, not yet expired, something left
pub fn is_usable(credit: &WalletCredit, now: i64) -> bool {
    credit.status == CreditStatus::Active
        && credit.expires_at > now
        && credit.remaining() > Decimal::ZERO
}

/// Spendable balance at `now`
pub fn balance(credits: &[WalletCredit], now: i64) -> Decimal {
    credits
        .iter()
        .filter(|c| is_usable(c, now))
        .map(WalletCredit::remaining)
        .sum()
}

/// Amount drawn from one credit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditAllocation {
    pub credit_id: i64,
    pub amount: Decimal,
    pub expires_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub requested: Decimal,
    pub allocations: Vec<CreditAllocation>,
    pub applied: Decimal,
    pub shortfall: Decimal,
}

impl AllocationPlan {
    pub fn is_complete(&self) -> bool {
        self.shortfall.is_zero()
    }
}

/// Draw up to `requested` from usable credits, oldest expiry first
pub fn allocate(
    credits: &[WalletCredit],
    requested: Decimal,
    now: i64,
) -> SettlementResult<AllocationPlan> {
    let requested = validate_amount(requested, "amount")?;

    let mut usable: Vec<&WalletCredit> = credits.iter().filter(|c| is_usable(c, now)).collect();
    usable.sort_by(|a, b| {
        a.expires_at
            .cmp(&b.expires_at)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });

    let mut outstanding = requested;
    let mut allocations = Vec::new();
    for credit in usable {
        if outstanding.is_zero() {
            break;
        }
        let take = credit.remaining().min(outstanding);
        allocations.push(CreditAllocation {
            credit_id: credit.id,
            amount: take,
            expires_at: credit.expires_at,
        });
        outstanding -= take;
    }

    Ok(AllocationPlan {
        requested,
        allocations,
        applied: requested - outstanding,
        shortfall: outstanding,
    })
}

/// Like [`allocate`] but fails unless the full amount is covered
pub fn allocate_exact(
    credits: &[WalletCredit],
    requested: Decimal,
    now: i64,
) -> SettlementResult<AllocationPlan> {
    let plan = allocate(credits, requested, now)?;
    if !plan.is_complete() {
        return Err(SettlementError::InsufficientCredit {
            requested: plan.requested,
            available: plan.applied,
        });
    }
    Ok(plan)
}

/// Record usage on a single credit, keeping `used_amount <= amount`
pub fn apply_usage(credit: &mut WalletCredit, amount: Decimal) -> SettlementResult<()> {
    let amount = validate_amount(amount, "amount")?;
    if amount > credit.remaining() {
        return Err(SettlementError::InsufficientCredit {
            requested: amount,
            available: credit.remaining(),
        });
    }
    credit.used_amount += amount;
    Ok(())
}

/// Credits the expiry sweep should flip to `expired`
pub fn expired_credit_ids(credits: &[WalletCredit], now: i64) -> Vec<i64> {
    credits
        .iter()
        .filter(|c| c.status == CreditStatus::Active && c.expires_at <= now)
        .map(|c| c.id)
        .collect()
}

/// Credit to create in the receiving wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferredCredit {
    pub amount: Decimal,
    /// Inherited from the source credit
    pub expires_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPlan {
    pub from_parent_id: i64,
    pub to_parent_id: i64,
    pub debit: AllocationPlan,
    pub credits: Vec<TransferredCredit>,
}

/// Move `amount` from one parent's wallet to another's
///
/// Only credits owned by `from_parent_id` are considered.
pub fn plan_transfer(
    from_parent_id: i64,
    to_parent_id: i64,
    credits: &[WalletCredit],
    amount: Decimal,
    now: i64,
) -> SettlementResult<TransferPlan> {
    if from_parent_id == to_parent_id {
        return Err(SettlementError::SameParentTransfer);
    }

    let owned: Vec<WalletCredit> = credits
        .iter()
        .filter(|c| c.parent_id == from_parent_id)
        .cloned()
        .collect();
    let debit = allocate_exact(&owned, amount, now)?;
    let credits = debit
        .allocations
        .iter()
        .map(|a| TransferredCredit {
            amount: a.amount,
            expires_at: a.expires_at,
        })
        .collect();

    Ok(TransferPlan {
        from_parent_id,
        to_parent_id,
        debit,
        credits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreditSource;
    use std::str::FromStr;

    const NOW: i64 = 1_767_225_600_000; // 2026-01-01 00:00 UTC
    const DAY: i64 = MILLIS_PER_DAY;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn credit(id: i64, amount: &str, used: &str, expires_in_days: i64) -> WalletCredit {
        WalletCredit {
            id,
            parent_id: 1,
            amount: dec(amount),
            used_amount: dec(used),
            expires_at: NOW + expires_in_days * DAY,
            status: CreditStatus::Active,
            source: CreditSource::Refund,
            source_booking_id: None,
            created_at: NOW - 10 * DAY + id,
        }
    }

    #[test]
    fn test_expiry_for() {
        assert_eq!(expiry_for(NOW, 180), NOW + 180 * DAY);
        assert_eq!(expiry_for(NOW, -3), NOW);
    }

    #[test]
    fn test_allocate_oldest_expiry_first() {
        let credits = vec![
            credit(1, "10.00", "0", 90),
            credit(2, "5.00", "0", 10),
            credit(3, "8.00", "3.00", 30),
        ];
        let plan = allocate(&credits, dec("12.00"), NOW).unwrap();

        let order: Vec<(i64, Decimal)> = plan
            .allocations
            .iter()
            .map(|a| (a.credit_id, a.amount))
            .collect();
        assert_eq!(
            order,
            vec![(2, dec("5.00")), (3, dec("5.00")), (1, dec("2.00"))]
        );
        assert!(plan.is_complete());
        assert_eq!(plan.applied, dec("12.00"));
    }

    #[test]
    fn test_allocate_ties_break_on_creation() {
        let credits = vec![credit(9, "4.00", "0", 10), credit(4, "4.00", "0", 10)];
        let plan = allocate(&credits, dec("5.00"), NOW).unwrap();
        assert_eq!(plan.allocations[0].credit_id, 4);
        assert_eq!(plan.allocations[1].amount, dec("1.00"));
    }

    #[test]
    fn test_allocate_skips_expired_and_used_up() {
        let mut expired_status = credit(1, "10.00", "0", 30);
        expired_status.status = CreditStatus::Expired;
        let credits = vec![
            expired_status,
            credit(2, "10.00", "0", -1),
            credit(3, "10.00", "10.00", 30),
            credit(4, "6.00", "0", 30),
        ];
        let plan = allocate(&credits, dec("20.00"), NOW).unwrap();
        assert_eq!(plan.allocations.len(), 1);
        assert_eq!(plan.allocations[0].credit_id, 4);
        assert_eq!(plan.applied, dec("6.00"));
        assert_eq!(plan.shortfall, dec("14.00"));
        assert_eq!(balance(&credits, NOW), dec("6.00"));
    }

    #[test]
    fn test_credit_expiring_exactly_now_is_not_usable() {
        let credits = vec![credit(1, "10.00", "0", 0)];
        assert_eq!(balance(&credits, NOW), Decimal::ZERO);
        assert_eq!(expired_credit_ids(&credits, NOW), vec![1]);
    }

    #[test]
    fn test_allocate_exact_reports_shortfall() {
        let credits = vec![credit(1, "10.00", "2.50", 30)];
        let err = allocate_exact(&credits, dec("10.00"), NOW).unwrap_err();
        assert_eq!(
            err,
            SettlementError::InsufficientCredit {
                requested: dec("10.00"),
                available: dec("7.50"),
            }
        );
    }

    #[test]
    fn test_allocate_zero_is_empty() {
        let credits = vec![credit(1, "10.00", "0", 30)];
        let plan = allocate(&credits, Decimal::ZERO, NOW).unwrap();
        assert!(plan.allocations.is_empty());
        assert!(plan.is_complete());
    }

    #[test]
    fn test_apply_usage_keeps_invariant() {
        let mut c = credit(1, "10.00", "4.00", 30);
        apply_usage(&mut c, dec("6.00")).unwrap();
        assert_eq!(c.used_amount, dec("10.00"));
        assert_eq!(c.remaining(), Decimal::ZERO);
        assert!(apply_usage(&mut c, dec("0.01")).is_err());
    }

    #[test]
    fn test_expiry_sweep_ids() {
        let mut already = credit(3, "1.00", "0", -5);
        already.status = CreditStatus::Expired;
        let credits = vec![credit(1, "1.00", "0", -1), credit(2, "1.00", "0", 1), already];
        assert_eq!(expired_credit_ids(&credits, NOW), vec![1]);
    }

    #[test]
    fn test_transfer_keeps_source_expiry() {
        let mut other = credit(7, "50.00", "0", 1);
        other.parent_id = 2;
        let credits = vec![credit(1, "10.00", "0", 60), credit(2, "10.00", "0", 20), other];

        let plan = plan_transfer(1, 2, &credits, dec("15.00"), NOW).unwrap();
        assert_eq!(plan.debit.allocations.len(), 2);
        assert_eq!(plan.debit.allocations[0].credit_id, 2);
        assert_eq!(
            plan.credits,
            vec![
                TransferredCredit {
                    amount: dec("10.00"),
                    expires_at: NOW + 20 * DAY,
                },
                TransferredCredit {
                    amount: dec("5.00"),
                    expires_at: NOW + 60 * DAY,
                },
            ]
        );
    }

    #[test]
    fn test_transfer_rejections() {
        let credits = vec![credit(1, "10.00", "0", 60)];
        assert_eq!(
            plan_transfer(1, 1, &credits, dec("5.00"), NOW),
            Err(SettlementError::SameParentTransfer)
        );
        assert!(matches!(
            plan_transfer(1, 2, &credits, dec("10.01"), NOW),
            Err(SettlementError::InsufficientCredit { .. })
        ));
    }
}
