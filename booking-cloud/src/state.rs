//! Application state for booking-cloud

use rust_decimal::Decimal;
use shared::settlement::refund::{FULL_REFUND_NOTICE_HOURS, RefundPolicy};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::Config;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// JWT secret for bearer authentication
    pub jwt_secret: String,
    /// Fixed fee retained on parent cancellations
    pub admin_fee: Decimal,
    /// Days a booking is held awaiting a TFC transfer
    pub tfc_hold_period_days: i64,
    /// Lifetime of newly issued wallet credits
    pub credit_validity_days: i64,
}

impl AppState {
    /// Connect, run migrations and build the state
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        Ok(Self::with_pool(pool, config))
    }

    /// Build the state around an existing pool (no migrations)
    pub fn with_pool(pool: PgPool, config: &Config) -> Self {
        Self {
            pool,
            jwt_secret: config.jwt_secret.clone(),
            admin_fee: config.admin_fee,
            tfc_hold_period_days: config.tfc_hold_period_days,
            credit_validity_days: config.credit_validity_days,
        }
    }

    pub fn refund_policy(&self) -> RefundPolicy {
        RefundPolicy {
            admin_fee: self.admin_fee,
            full_notice_hours: FULL_REFUND_NOTICE_HOURS,
        }
    }
}
