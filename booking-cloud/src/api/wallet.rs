//! Wallet endpoints

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::error::AppError;
use shared::models::{CreditSource, Role};

use crate::auth::Identity;
use crate::services::wallet::{self, GrantOutcome, SpendOutcome, TransferOutcome, WalletSummary};
use crate::state::AppState;

use super::ApiResult;

#[derive(Debug, Default, Deserialize)]
pub struct WalletQuery {
    /// Admins may look at any parent's wallet
    pub parent_id: Option<i64>,
}

/// GET /api/wallet
pub async fn get_wallet(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<WalletQuery>,
) -> ApiResult<WalletSummary> {
    identity.require(&[Role::Parent, Role::Admin])?;
    let parent_id = match query.parent_id {
        Some(id) => {
            identity.ensure_parent_owns(id)?;
            id
        }
        None if identity.role == Role::Parent => identity.user_id,
        None => {
            return Err(AppError::validation("parent_id is required").with_detail("field", "parent_id"));
        }
    };
    let now = shared::util::now_millis();
    let summary = wallet::summary(&state, parent_id, now).await?;
    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct SpendRequest {
    pub booking_id: i64,
    pub amount: Decimal,
    #[serde(default)]
    pub allow_partial: bool,
}

/// POST /api/wallet/spend
pub async fn spend(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<SpendRequest>,
) -> ApiResult<SpendOutcome> {
    identity.require(&[Role::Parent])?;
    let now = shared::util::now_millis();
    let outcome = wallet::spend(
        &state,
        &identity,
        req.booking_id,
        req.amount,
        req.allow_partial,
        now,
    )
    .await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub from_parent_id: i64,
    pub to_parent_id: i64,
    pub amount: Decimal,
}

/// POST /api/wallet/transfer
pub async fn transfer(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<TransferRequest>,
) -> ApiResult<TransferOutcome> {
    identity.require_admin()?;
    let now = shared::util::now_millis();
    let outcome = wallet::transfer(
        &state,
        &identity,
        req.from_parent_id,
        req.to_parent_id,
        req.amount,
        now,
    )
    .await?;
    Ok(Json(outcome))
}

fn default_source() -> CreditSource {
    CreditSource::Goodwill
}

#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    pub parent_id: i64,
    pub amount: Decimal,
    #[serde(default = "default_source")]
    pub source: CreditSource,
    pub validity_days: Option<i64>,
    pub note: Option<String>,
}

/// POST /api/admin/wallet/credits
pub async fn grant_credit(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<GrantRequest>,
) -> ApiResult<GrantOutcome> {
    identity.require_admin()?;
    let now = shared::util::now_millis();
    let outcome = wallet::grant(
        &state,
        &identity,
        req.parent_id,
        req.amount,
        req.source,
        req.validity_days,
        req.note.as_deref(),
        now,
    )
    .await?;
    Ok(Json(outcome))
}
