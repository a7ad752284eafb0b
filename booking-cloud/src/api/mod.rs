//! API routes for booking-cloud

pub mod bookings;
pub mod franchise;
pub mod health;
pub mod tfc;
pub mod wallet;

use axum::routing::{get, post};
use axum::{Router, middleware};
use shared::error::AppError;
use tower_http::trace::TraceLayer;

use crate::auth::auth_middleware;
use crate::state::AppState;

pub type ApiResult<T> = Result<axum::Json<T>, AppError>;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Bearer-authenticated API
    let api = Router::new()
        .route("/api/bookings/{id}/refund-quote", post(bookings::refund_quote))
        .route("/api/bookings/{id}/cancel", post(bookings::cancel))
        .route("/api/bookings/{id}/no-show", post(bookings::no_show))
        .route("/api/bookings/{id}/tfc", post(tfc::create_reference))
        .route("/api/tfc/{reference}", get(tfc::get_reference))
        .route("/api/tfc/{reference}/confirm", post(tfc::confirm))
        .route("/api/tfc/{reference}/cancel", post(tfc::cancel))
        .route("/api/wallet", get(wallet::get_wallet))
        .route("/api/wallet/spend", post(wallet::spend))
        .route("/api/wallet/transfer", post(wallet::transfer))
        .route("/api/admin/wallet/credits", post(wallet::grant_credit))
        .route("/api/franchise/quote", post(franchise::quote))
        .route("/api/venues/{id}/settlements", post(franchise::settle_venue))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
