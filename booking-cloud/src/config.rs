//! Booking service configuration

use rust_decimal::Decimal;
use shared::settlement::refund::DEFAULT_ADMIN_FEE;
use shared::settlement::tfc::DEFAULT_HOLD_PERIOD_DAYS;
use shared::settlement::wallet::DEFAULT_CREDIT_VALIDITY_DAYS;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Booking service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// JWT secret for bearer authentication
    pub jwt_secret: String,
    /// Fixed fee retained on parent cancellations (env: ADMIN_FEE)
    pub admin_fee: Decimal,
    /// Days a booking is held awaiting a TFC transfer
    pub tfc_hold_period_days: i64,
    /// Lifetime of newly issued wallet credits
    pub credit_validity_days: i64,
    /// TFC auto-cancel / reminder sweep interval
    pub tfc_sweep_interval_secs: u64,
    /// Wallet credit expiry sweep interval
    pub credit_sweep_interval_secs: u64,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Parse an optional env var, falling back to `default` when unset
    fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, BoxError> {
        match std::env::var(name) {
            Ok(v) if !v.trim().is_empty() => v
                .trim()
                .parse()
                .map_err(|_| format!("{name} has an invalid value: {v}").into()),
            _ => Ok(default),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: Self::parse_or("HTTP_PORT", 8080)?,
            environment: environment.clone(),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            admin_fee: Self::parse_or("ADMIN_FEE", DEFAULT_ADMIN_FEE)?,
            tfc_hold_period_days: Self::parse_or("TFC_HOLD_PERIOD_DAYS", DEFAULT_HOLD_PERIOD_DAYS)?,
            credit_validity_days: Self::parse_or(
                "CREDIT_VALIDITY_DAYS",
                DEFAULT_CREDIT_VALIDITY_DAYS,
            )?,
            tfc_sweep_interval_secs: Self::parse_or("TFC_SWEEP_INTERVAL_SECS", 300)?,
            credit_sweep_interval_secs: Self::parse_or("CREDIT_SWEEP_INTERVAL_SECS", 3600)?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), BoxError> {
        if self.admin_fee < Decimal::ZERO {
            return Err("ADMIN_FEE must not be negative".into());
        }
        if self.tfc_hold_period_days < 1 {
            return Err("TFC_HOLD_PERIOD_DAYS must be at least 1".into());
        }
        if self.credit_validity_days < 1 {
            return Err("CREDIT_VALIDITY_DAYS must be at least 1".into());
        }
        if self.tfc_sweep_interval_secs == 0 || self.credit_sweep_interval_secs == 0 {
            return Err("sweep intervals must be greater than zero".into());
        }
        Ok(())
    }

    /// Defaults for local runs and tests
    pub fn development(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            http_port: 8080,
            environment: "development".into(),
            jwt_secret: "dev-JWT_SECRET-not-for-production".into(),
            admin_fee: DEFAULT_ADMIN_FEE,
            tfc_hold_period_days: DEFAULT_HOLD_PERIOD_DAYS,
            credit_validity_days: DEFAULT_CREDIT_VALIDITY_DAYS,
            tfc_sweep_interval_secs: 300,
            credit_sweep_interval_secs: 3600,
        }
    }
}
