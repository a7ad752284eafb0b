//! Franchise fee quotes and venue settlements

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::models::FranchiseFeeConfig;
use shared::settlement::franchise::FranchiseFee;

use crate::auth::Identity;
use crate::services::settlement::{self, VenueSettlement};
use crate::state::AppState;

use super::ApiResult;

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub gross: Decimal,
    pub fee: FranchiseFeeConfig,
    /// Defaults to zero
    #[serde(default)]
    pub admin_fee: Decimal,
}

/// POST /api/franchise/quote
pub async fn quote(
    Extension(identity): Extension<Identity>,
    Json(req): Json<QuoteRequest>,
) -> ApiResult<FranchiseFee> {
    let fee = settlement::quote(&identity, req.gross, &req.fee, req.admin_fee)?;
    Ok(Json(fee))
}

#[derive(Debug, Deserialize)]
pub struct SettleRequest {
    pub period_start: i64,
    pub period_end: i64,
}

/// POST /api/venues/{id}/settlements
pub async fn settle_venue(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(venue_id): Path<i64>,
    Json(req): Json<SettleRequest>,
) -> ApiResult<VenueSettlement> {
    let now = shared::util::now_millis();
    let result = settlement::settle_venue(
        &state,
        &identity,
        venue_id,
        req.period_start,
        req.period_end,
        now,
    )
    .await?;
    Ok(Json(result))
}
