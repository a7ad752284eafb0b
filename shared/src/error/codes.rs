//! Unified error codes for the booking platform
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Booking errors
//! - 4xxx: Payment / refund errors
//! - 5xxx: Tax-Free Childcare errors
//! - 6xxx: Wallet errors
//! - 7xxx: Venue / franchise errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,
    /// Admin role required
    AdminRequired = 2003,

    // ==================== 3xxx: Booking ====================
    /// Booking not found
    BookingNotFound = 3001,
    /// Booking has already been cancelled
    BookingAlreadyCancelled = 3002,
    /// Booking is not awaiting payment
    BookingNotPending = 3003,
    /// Booking has no sessions
    BookingHasNoSessions = 3004,
    /// Booking has already been marked as no-show
    BookingAlreadyNoShow = 3005,
    /// Booking has already been completed
    BookingCompleted = 3006,

    // ==================== 4xxx: Payment ====================
    /// Payment breakdown does not add up to the booking amount
    PaymentBreakdownMismatch = 4001,
    /// Invalid monetary amount
    InvalidAmount = 4002,
    /// Refund amount exceeds original payment
    RefundExceedsAmount = 4004,

    // ==================== 5xxx: Tax-Free Childcare ====================
    /// TFC payment reference not found
    TfcReferenceNotFound = 5001,
    /// TFC reference has an invalid format
    TfcReferenceInvalid = 5002,
    /// TFC state transition not allowed
    TfcInvalidTransition = 5003,
    /// Received TFC amount is less than expected
    TfcAmountMismatch = 5004,
    /// Booking already has an open TFC reference
    TfcReferenceExists = 5005,

    // ==================== 6xxx: Wallet ====================
    /// Not enough wallet credit
    WalletInsufficientBalance = 6001,
    /// Wallet transfer to the same parent
    WalletTransferSameParent = 6003,

    // ==================== 7xxx: Venue / Franchise ====================
    /// Venue not found
    VenueNotFound = 7001,
    /// Franchise fee configuration is invalid
    FranchiseFeeInvalid = 7002,
    /// Settlement period is invalid
    SettlementPeriodInvalid = 7003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role is required",
            ErrorCode::AdminRequired => "Administrator role is required",

            // Booking
            ErrorCode::BookingNotFound => "Booking not found",
            ErrorCode::BookingAlreadyCancelled => "Booking has already been cancelled",
            ErrorCode::BookingNotPending => "Booking is not awaiting payment",
            ErrorCode::BookingHasNoSessions => "Booking has no sessions",
            ErrorCode::BookingAlreadyNoShow => "Booking has already been marked as no-show",
            ErrorCode::BookingCompleted => "Booking has already been completed",

            // Payment
            ErrorCode::PaymentBreakdownMismatch => {
                "Payment breakdown does not match booking amount"
            }
            ErrorCode::InvalidAmount => "Invalid amount",
            ErrorCode::RefundExceedsAmount => "Refund amount exceeds original payment",

            // TFC
            ErrorCode::TfcReferenceNotFound => "TFC payment reference not found",
            ErrorCode::TfcReferenceInvalid => "TFC payment reference is invalid",
            ErrorCode::TfcInvalidTransition => "TFC payment state transition not allowed",
            ErrorCode::TfcAmountMismatch => "Received TFC amount is less than expected",
            ErrorCode::TfcReferenceExists => "Booking already has an open TFC reference",

            // Wallet
            ErrorCode::WalletInsufficientBalance => "Insufficient wallet credit",
            ErrorCode::WalletTransferSameParent => "Cannot transfer credit to the same parent",

            // Venue
            ErrorCode::VenueNotFound => "Venue not found",
            ErrorCode::FranchiseFeeInvalid => "Franchise fee configuration is invalid",
            ErrorCode::SettlementPeriodInvalid => "Settlement period is invalid",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            5 => Ok(ErrorCode::InvalidRequest),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),
            2003 => Ok(ErrorCode::AdminRequired),

            // Booking
            3001 => Ok(ErrorCode::BookingNotFound),
            3002 => Ok(ErrorCode::BookingAlreadyCancelled),
            3003 => Ok(ErrorCode::BookingNotPending),
            3004 => Ok(ErrorCode::BookingHasNoSessions),
            3005 => Ok(ErrorCode::BookingAlreadyNoShow),
            3006 => Ok(ErrorCode::BookingCompleted),

            // Payment
            4001 => Ok(ErrorCode::PaymentBreakdownMismatch),
            4002 => Ok(ErrorCode::InvalidAmount),
            4004 => Ok(ErrorCode::RefundExceedsAmount),

            // TFC
            5001 => Ok(ErrorCode::TfcReferenceNotFound),
            5002 => Ok(ErrorCode::TfcReferenceInvalid),
            5003 => Ok(ErrorCode::TfcInvalidTransition),
            5004 => Ok(ErrorCode::TfcAmountMismatch),
            5005 => Ok(ErrorCode::TfcReferenceExists),

            // Wallet
            6001 => Ok(ErrorCode::WalletInsufficientBalance),
            6003 => Ok(ErrorCode::WalletTransferSameParent),

            // Venue
            7001 => Ok(ErrorCode::VenueNotFound),
            7002 => Ok(ErrorCode::FranchiseFeeInvalid),
            7003 => Ok(ErrorCode::SettlementPeriodInvalid),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::PermissionDenied.code(), 2001);
        assert_eq!(ErrorCode::BookingNotFound.code(), 3001);
        assert_eq!(ErrorCode::PaymentBreakdownMismatch.code(), 4001);
        assert_eq!(ErrorCode::TfcReferenceNotFound.code(), 5001);
        assert_eq!(ErrorCode::WalletInsufficientBalance.code(), 6001);
        assert_eq!(ErrorCode::VenueNotFound.code(), 7001);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_try_from_covers_every_variant() {
        let codes = [
            ErrorCode::Success,
            ErrorCode::ValidationFailed,
            ErrorCode::NotFound,
            ErrorCode::InvalidRequest,
            ErrorCode::ValueOutOfRange,
            ErrorCode::NotAuthenticated,
            ErrorCode::TokenExpired,
            ErrorCode::TokenInvalid,
            ErrorCode::PermissionDenied,
            ErrorCode::RoleRequired,
            ErrorCode::AdminRequired,
            ErrorCode::BookingNotFound,
            ErrorCode::BookingAlreadyCancelled,
            ErrorCode::BookingNotPending,
            ErrorCode::BookingHasNoSessions,
            ErrorCode::BookingAlreadyNoShow,
            ErrorCode::BookingCompleted,
            ErrorCode::PaymentBreakdownMismatch,
            ErrorCode::InvalidAmount,
            ErrorCode::RefundExceedsAmount,
            ErrorCode::TfcReferenceNotFound,
            ErrorCode::TfcReferenceInvalid,
            ErrorCode::TfcInvalidTransition,
            ErrorCode::TfcAmountMismatch,
            ErrorCode::TfcReferenceExists,
            ErrorCode::WalletInsufficientBalance,
            ErrorCode::WalletTransferSameParent,
            ErrorCode::VenueNotFound,
            ErrorCode::FranchiseFeeInvalid,
            ErrorCode::SettlementPeriodInvalid,
            ErrorCode::InternalError,
            ErrorCode::DatabaseError,
        ];

        for code in codes {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(10000), Err(InvalidErrorCode(10000)));
        assert_eq!(ErrorCode::try_from(3999), Err(InvalidErrorCode(3999)));
    }

    #[test]
    fn test_retired_codes_do_not_decode() {
        for value in [1, 4, 6, 7, 4003, 6002, 9005] {
            assert_eq!(ErrorCode::try_from(value), Err(InvalidErrorCode(value)));
        }
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::TfcInvalidTransition).unwrap();
        assert_eq!(json, "5003");

        let code: ErrorCode = serde_json::from_str("6001").unwrap();
        assert_eq!(code, ErrorCode::WalletInsufficientBalance);

        let result: Result<ErrorCode, _> = serde_json::from_str("999");
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ErrorCode::Success), "0");
        assert_eq!(format!("{}", ErrorCode::BookingNotFound), "3001");
    }

    #[test]
    fn test_message() {
        assert_eq!(ErrorCode::NotFound.message(), "Resource not found");
        assert_eq!(ErrorCode::BookingNotFound.message(), "Booking not found");
        assert_eq!(
            ErrorCode::WalletInsufficientBalance.message(),
            "Insufficient wallet credit"
        );
    }

    #[test]
    fn test_invalid_error_code_display() {
        let err = InvalidErrorCode(999);
        assert_eq!(format!("{}", err), "invalid error code: 999");
    }
}
