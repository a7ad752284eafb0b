//! Shared types for the booking platform
//!
//! Domain models, the error/response envelope used by HTTP services, and
//! the pure settlement rules (refunds, franchise fees, TFC, wallet credits).

pub mod error;
pub mod models;
pub mod settlement;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use settlement::{SettlementError, SettlementResult};
