//! Settlement rules
//!
//! Pure, deterministic business rules for money leaving or moving inside
//! the platform. Nothing here touches the database or the clock; callers
//! pass `now` explicitly.
//!
//! - [`refund`]: cancellation refund / credit / admin fee split
//! - [`franchise`]: franchise fee, VAT and net-to-venue
//! - [`tfc`]: Tax-Free Childcare reference lifecycle
//! - [`wallet`]: credit allocation, expiry and transfer

pub mod franchise;
pub mod money;
pub mod refund;
pub mod tfc;
pub mod wallet;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::error::{AppError, ErrorCode};
use crate::models::TfcStatus;

/// Rule violations raised by the settlement functions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    #[error("{field} must be between 0 and {max}, got {value}")]
    InvalidAmount {
        field: &'static str,
        value: Decimal,
        max: Decimal,
    },

    #[error("payment breakdown totals {paid} but booking amount is {amount}")]
    BreakdownMismatch { amount: Decimal, paid: Decimal },

    #[error("booking has no sessions")]
    NoSessions,

    #[error("remaining sessions ({remaining}) exceed total sessions ({total})")]
    InvalidSessionCount { remaining: u32, total: u32 },

    #[error("invalid franchise fee: {0}")]
    InvalidFranchiseFee(String),

    #[error("settlement period end ({end}) must be after start ({start})")]
    InvalidPeriod { start: i64, end: i64 },

    #[error("hold period must be at least 1 day, got {0}")]
    InvalidHoldPeriod(i64),

    #[error("invalid TFC reference: {0}")]
    InvalidReference(String),

    #[error("TFC payment cannot move from {from} to {to}")]
    InvalidTransition { from: TfcStatus, to: TfcStatus },

    #[error("received {received} is less than expected {expected}")]
    AmountShort { expected: Decimal, received: Decimal },

    #[error("insufficient credit: requested {requested}, available {available}")]
    InsufficientCredit {
        requested: Decimal,
        available: Decimal,
    },

    #[error("cannot transfer credit to the same parent")]
    SameParentTransfer,
}

impl From<SettlementError> for AppError {
    fn from(err: SettlementError) -> Self {
        let message = err.to_string();
        match err {
            SettlementError::InvalidAmount { field, .. } => {
                AppError::with_message(ErrorCode::InvalidAmount, message).with_detail("field", field)
            }
            SettlementError::BreakdownMismatch { amount, paid } => {
                AppError::with_message(ErrorCode::PaymentBreakdownMismatch, message)
                    .with_detail("amount", amount.to_string())
                    .with_detail("paid", paid.to_string())
            }
            SettlementError::NoSessions | SettlementError::InvalidSessionCount { .. } => {
                AppError::with_message(ErrorCode::BookingHasNoSessions, message)
            }
            SettlementError::InvalidFranchiseFee(_) => {
                AppError::with_message(ErrorCode::FranchiseFeeInvalid, message)
            }
            SettlementError::InvalidPeriod { .. } => {
                AppError::with_message(ErrorCode::SettlementPeriodInvalid, message)
            }
            SettlementError::InvalidHoldPeriod(_) => {
                AppError::with_message(ErrorCode::ValueOutOfRange, message)
            }
            SettlementError::InvalidReference(_) => {
                AppError::with_message(ErrorCode::TfcReferenceInvalid, message)
            }
            SettlementError::InvalidTransition { from, .. } => {
                AppError::with_message(ErrorCode::TfcInvalidTransition, message)
                    .with_detail("status", from.as_db())
            }
            SettlementError::AmountShort { expected, received } => {
                AppError::with_message(ErrorCode::TfcAmountMismatch, message)
                    .with_detail("expected", expected.to_string())
                    .with_detail("received", received.to_string())
            }
            SettlementError::InsufficientCredit {
                requested,
                available,
            } => AppError::with_message(ErrorCode::WalletInsufficientBalance, message)
                .with_detail("requested", requested.to_string())
                .with_detail("available", available.to_string()),
            SettlementError::SameParentTransfer => {
                AppError::with_message(ErrorCode::WalletTransferSameParent, message)
            }
        }
    }
}

pub type SettlementResult<T> = Result<T, SettlementError>;
