//! Franchise fee and venue settlement
//!
//! `net_to_venue = gross - fee_gross - admin_fee`, where `fee_gross` is the
//! franchise fee including 20% VAT. With [`VatMode::Inclusive`] the
//! configured fee already contains the VAT and it is extracted; with
//! [`VatMode::Exclusive`] VAT is added on top.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::{percent_of, round_money, validate_amount};
use super::{SettlementError, SettlementResult};
use crate::models::{FeeType, FranchiseFeeConfig, VatMode};

/// UK standard VAT rate
pub const VAT_RATE_PERCENT: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// Franchise fee breakdown for one amount of takings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FranchiseFee {
    pub gross: Decimal,
    /// Fee excluding VAT
    pub fee_net: Decimal,
    pub vat: Decimal,
    /// Fee including VAT (what the venue pays)
    pub fee_gross: Decimal,
    pub admin_fee: Decimal,
    pub net_to_venue: Decimal,
}

impl FranchiseFee {
    /// Fee and admin fee exceed takings
    pub fn venue_owes(&self) -> bool {
        self.net_to_venue < Decimal::ZERO
    }
}

pub fn validate_fee_config(config: &FranchiseFeeConfig) -> SettlementResult<()> {
    match config.fee_type {
        FeeType::Percent if config.value < Decimal::ZERO || config.value > Decimal::ONE_HUNDRED => {
            Err(SettlementError::InvalidFranchiseFee(format!(
                "percent must be between 0 and 100, got {}",
                config.value
            )))
        }
        FeeType::Fixed if config.value < Decimal::ZERO => Err(
            SettlementError::InvalidFranchiseFee(format!(
                "fixed fee must be non-negative, got {}",
                config.value
            )),
        ),
        _ => Ok(()),
    }
}

/// Compute the franchise fee on `gross` takings
pub fn calculate_franchise_fee(
    gross: Decimal,
    config: &FranchiseFeeConfig,
    admin_fee: Decimal,
) -> SettlementResult<FranchiseFee> {
    validate_fee_config(config)?;
    let gross = validate_amount(gross, "gross")?;
    let admin_fee = validate_amount(admin_fee, "admin_fee")?;

    let fee = match config.fee_type {
        FeeType::Percent => percent_of(gross, config.value),
        FeeType::Fixed => round_money(config.value),
    };

    let (fee_net, vat, fee_gross) = match config.vat_mode {
        VatMode::Inclusive => {
            let vat = round_money(fee * VAT_RATE_PERCENT / (Decimal::ONE_HUNDRED + VAT_RATE_PERCENT));
            (fee - vat, vat, fee)
        }
        VatMode::Exclusive => {
            let vat = percent_of(fee, VAT_RATE_PERCENT);
            (fee, vat, fee + vat)
        }
    };

    Ok(FranchiseFee {
        gross,
        fee_net,
        vat,
        fee_gross,
        admin_fee,
        net_to_venue: gross - fee_gross - admin_fee,
    })
}

/// One booking's contribution to a venue settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementEntry {
    pub gross: Decimal,
    /// Cash + credit returned on cancellation
    pub refunded: Decimal,
    /// Admin fee retained by the platform
    pub admin_fee: Decimal,
}

/// Venue settlement over `[period_start, period_end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSettlement {
    pub period_start: i64,
    pub period_end: i64,
    pub booking_count: u32,
    pub gross_takings: Decimal,
    pub refunded: Decimal,
    pub fee: FranchiseFee,
}

/// Aggregate bookings and apply the franchise fee once on net takings
pub fn settle_period(
    period_start: i64,
    period_end: i64,
    entries: &[SettlementEntry],
    config: &FranchiseFeeConfig,
) -> SettlementResult<PeriodSettlement> {
    if period_end <= period_start {
        return Err(SettlementError::InvalidPeriod {
            start: period_start,
            end: period_end,
        });
    }

    let mut gross_takings = Decimal::ZERO;
    let mut refunded = Decimal::ZERO;
    let mut admin_fees = Decimal::ZERO;
    for entry in entries {
        gross_takings += validate_amount(entry.gross, "gross")?;
        refunded += validate_amount(entry.refunded, "refunded")?;
        admin_fees += validate_amount(entry.admin_fee, "admin_fee")?;
    }

    let taxable = (gross_takings - refunded).max(Decimal::ZERO);
    let fee = calculate_franchise_fee(taxable, config, admin_fees)?;

    Ok(PeriodSettlement {
        period_start,
        period_end,
        booking_count: entries.len() as u32,
        gross_takings,
        refunded,
        fee,
    })
}
