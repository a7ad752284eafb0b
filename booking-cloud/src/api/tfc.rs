//! Tax-Free Childcare reference endpoints

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::models::TfcPayment;

use crate::auth::Identity;
use crate::services::tfc::{self, ConfirmOutcome, TfcCancelOutcome};
use crate::state::AppState;

use super::ApiResult;

/// POST /api/bookings/{id}/tfc
pub async fn create_reference(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(booking_id): Path<i64>,
) -> ApiResult<TfcPayment> {
    let now = shared::util::now_millis();
    let payment = tfc::create_for_booking(&state, &identity, booking_id, now).await?;
    Ok(Json(payment))
}

/// GET /api/tfc/{reference}
pub async fn get_reference(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(reference): Path<String>,
) -> ApiResult<TfcPayment> {
    let payment = tfc::get(&state, &identity, &reference).await?;
    Ok(Json(payment))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub received_amount: Decimal,
}

/// POST /api/tfc/{reference}/confirm
pub async fn confirm(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(reference): Path<String>,
    Json(req): Json<ConfirmRequest>,
) -> ApiResult<ConfirmOutcome> {
    let now = shared::util::now_millis();
    let outcome = tfc::confirm(&state, &identity, &reference, req.received_amount, now).await?;
    Ok(Json(outcome))
}

/// POST /api/tfc/{reference}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(reference): Path<String>,
) -> ApiResult<TfcCancelOutcome> {
    let now = shared::util::now_millis();
    let outcome = tfc::cancel(&state, &identity, &reference, now).await?;
    Ok(Json(outcome))
}
