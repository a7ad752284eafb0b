//! Booking cancellation endpoints

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::models::CancellationKind;

use crate::auth::Identity;
use crate::services::cancellation::{self, CancellationOutcome, RefundQuote};
use crate::state::AppState;

use super::ApiResult;

/// Optional body; an empty POST uses the defaults
#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    /// Defaults from the caller's role
    #[serde(default)]
    pub kind: Option<CancellationKind>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// POST /api/bookings/{id}/refund-quote
pub async fn refund_quote(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(booking_id): Path<i64>,
    body: Option<Json<CancelRequest>>,
) -> ApiResult<RefundQuote> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let now = shared::util::now_millis();
    let quote = cancellation::quote(&state, &identity, booking_id, req.kind, now).await?;
    Ok(Json(quote))
}

/// POST /api/bookings/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(booking_id): Path<i64>,
    body: Option<Json<CancelRequest>>,
) -> ApiResult<CancellationOutcome> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let now = shared::util::now_millis();
    let outcome = cancellation::cancel(
        &state,
        &identity,
        booking_id,
        req.kind,
        req.reason.as_deref(),
        now,
    )
    .await?;
    Ok(Json(outcome))
}

/// POST /api/bookings/{id}/no-show
pub async fn no_show(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(booking_id): Path<i64>,
) -> ApiResult<CancellationOutcome> {
    let now = shared::util::now_millis();
    let outcome = cancellation::mark_no_show(&state, &identity, booking_id, now).await?;
    Ok(Json(outcome))
}
