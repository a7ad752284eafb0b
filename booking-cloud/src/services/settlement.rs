//! Franchise fee quotes and venue period settlements

use rust_decimal::Decimal;
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::FranchiseFeeConfig;
use shared::settlement::SettlementError;
use shared::settlement::franchise::{
    FranchiseFee, PeriodSettlement, SettlementEntry, calculate_franchise_fee, settle_period,
};

use crate::auth::Identity;
use crate::db;
use crate::db::settlements::{SettlementSourceRow, VenueSettlementRow};
use crate::error::ServiceResult;
use crate::state::AppState;

/// Fee preview for an arbitrary amount
pub fn quote(
    identity: &Identity,
    gross: Decimal,
    config: &FranchiseFeeConfig,
    admin_fee: Decimal,
) -> ServiceResult<FranchiseFee> {
    identity.require_admin()?;
    Ok(calculate_franchise_fee(gross, config, admin_fee)?)
}

pub fn to_entries(rows: &[SettlementSourceRow]) -> Vec<SettlementEntry> {
    rows.iter()
        .map(|row| SettlementEntry {
            gross: row.paid,
            refunded: row.refunded,
            admin_fee: row.admin_fee,
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct VenueSettlement {
    pub venue_id: i64,
    pub settlement: PeriodSettlement,
    pub venue_owes: bool,
    pub record: VenueSettlementRow,
}

/// Compute and store the settlement for a venue over `[period_start, period_end)`
///
/// Re-running the same period replaces the stored figures.
pub async fn settle_venue(
    state: &AppState,
    identity: &Identity,
    venue_id: i64,
    period_start: i64,
    period_end: i64,
    now: i64,
) -> ServiceResult<VenueSettlement> {
    identity.require_admin()?;
    if period_end <= period_start {
        return Err(SettlementError::InvalidPeriod {
            start: period_start,
            end: period_end,
        }
        .into());
    }

    let venue = db::venues::find_by_id(&state.pool, venue_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::VenueNotFound).with_detail("venue_id", venue_id))?;
    let config = venue.fee_config().ok_or_else(|| {
        AppError::new(ErrorCode::FranchiseFeeInvalid).with_detail("venue_id", venue_id)
    })?;

    let rows =
        db::settlements::load_period_bookings(&state.pool, venue_id, period_start, period_end)
            .await?;
    let settlement = settle_period(period_start, period_end, &to_entries(&rows), &config)?;

    let mut tx = state.pool.begin().await?;
    let record = db::settlements::upsert(&mut tx, venue_id, &settlement, now).await?;
    let detail = serde_json::json!({
        "venue_id": venue_id,
        "period_start": period_start,
        "period_end": period_end,
        "booking_count": settlement.booking_count,
        "net_to_venue": settlement.fee.net_to_venue.to_string(),
    });
    db::audit::log(&mut tx, Some(identity.user_id), "venue_settled", Some(&detail), now).await?;
    tx.commit().await?;

    tracing::info!(
        venue_id,
        period_start,
        period_end,
        bookings = settlement.booking_count,
        gross = %settlement.gross_takings,
        fee_gross = %settlement.fee.fee_gross,
        net_to_venue = %settlement.fee.net_to_venue,
        "Venue settlement recorded"
    );
    if settlement.fee.venue_owes() {
        tracing::warn!(venue_id, net_to_venue = %settlement.fee.net_to_venue, "Venue owes the platform for this period");
    }

    Ok(VenueSettlement {
        venue_id,
        venue_owes: settlement.fee.venue_owes(),
        settlement,
        record,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{FeeType, Role, VatMode};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_quote_requires_admin() {
        let config = FranchiseFeeConfig {
            fee_type: FeeType::Percent,
            value: dec("10"),
            vat_mode: VatMode::Exclusive,
        };
        let parent = Identity {
            user_id: 1,
            role: Role::Parent,
        };
        assert!(quote(&parent, dec("100"), &config, Decimal::ZERO).is_err());

        let admin = Identity {
            user_id: 2,
            role: Role::Admin,
        };
        let fee = quote(&admin, dec("100"), &config, dec("2.00")).unwrap();
        assert_eq!(fee.fee_gross, dec("12.00"));
        assert_eq!(fee.net_to_venue, dec("86.00"));
    }

    #[test]
    fn test_to_entries_maps_paid_amounts() {
        let rows = vec![SettlementSourceRow {
            booking_id: 5,
            paid: dec("45.00"),
            refunded: dec("43.00"),
            admin_fee: dec("2.00"),
        }];
        let entries = to_entries(&rows);
        assert_eq!(entries[0].gross, dec("45.00"));
        assert_eq!(entries[0].refunded, dec("43.00"));
        assert_eq!(entries[0].admin_fee, dec("2.00"));
    }
}
