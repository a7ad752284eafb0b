//! Venues and their franchise fee terms

use rust_decimal::Decimal;
use shared::models::{FeeType, FranchiseFeeConfig, VatMode};
use sqlx::PgPool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VenueRow {
    pub id: i64,
    pub name: String,
    pub fee_type: String,
    pub fee_value: Decimal,
    pub vat_mode: String,
    pub created_at: i64,
}

impl VenueRow {
    /// Fee terms; `None` if the row holds an unknown fee type or VAT mode
    pub fn fee_config(&self) -> Option<FranchiseFeeConfig> {
        Some(FranchiseFeeConfig {
            fee_type: FeeType::from_db(&self.fee_type)?,
            value: self.fee_value,
            vat_mode: VatMode::from_db(&self.vat_mode)?,
        })
    }
}

pub async fn find_by_id(pool: &PgPool, venue_id: i64) -> Result<Option<VenueRow>, sqlx::Error> {
    sqlx::query_as::<_, VenueRow>(
        "SELECT id, name, fee_type, fee_value, vat_mode, created_at FROM venues WHERE id = $1",
    )
    .bind(venue_id)
    .fetch_optional(pool)
    .await
}
