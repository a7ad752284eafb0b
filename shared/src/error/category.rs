//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Authentication errors
/// - 2xxx: Permission errors
/// - 3xxx: Booking errors
/// - 4xxx: Payment errors
/// - 5xxx: Tax-Free Childcare errors
/// - 6xxx: Wallet errors
/// - 7xxx: Venue errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Permission errors (2xxx)
    Permission,
    /// Booking errors (3xxx)
    Booking,
    /// Payment errors (4xxx)
    Payment,
    /// Tax-Free Childcare errors (5xxx)
    Tfc,
    /// Wallet errors (6xxx)
    Wallet,
    /// Venue errors (7xxx)
    Venue,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Auth,
            2000..3000 => Self::Permission,
            3000..4000 => Self::Booking,
            4000..5000 => Self::Payment,
            5000..6000 => Self::Tfc,
            6000..7000 => Self::Wallet,
            7000..8000 => Self::Venue,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Booking => "booking",
            Self::Payment => "payment",
            Self::Tfc => "tfc",
            Self::Wallet => "wallet",
            Self::Venue => "venue",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(1001), ErrorCategory::Auth);
        assert_eq!(ErrorCategory::from_code(2001), ErrorCategory::Permission);
        assert_eq!(ErrorCategory::from_code(3001), ErrorCategory::Booking);
        assert_eq!(ErrorCategory::from_code(4001), ErrorCategory::Payment);
        assert_eq!(ErrorCategory::from_code(5001), ErrorCategory::Tfc);
        assert_eq!(ErrorCategory::from_code(6001), ErrorCategory::Wallet);
        assert_eq!(ErrorCategory::from_code(7001), ErrorCategory::Venue);
        assert_eq!(ErrorCategory::from_code(8001), ErrorCategory::System);
        assert_eq!(ErrorCategory::from_code(9001), ErrorCategory::System);
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(
            ErrorCode::BookingAlreadyCancelled.category(),
            ErrorCategory::Booking
        );
        assert_eq!(ErrorCode::TfcAmountMismatch.category(), ErrorCategory::Tfc);
        assert_eq!(
            ErrorCode::WalletTransferSameParent.category(),
            ErrorCategory::Wallet
        );
        assert_eq!(ErrorCode::DatabaseError.category(), ErrorCategory::System);
    }

    #[test]
    fn test_category_serde() {
        let json = serde_json::to_string(&ErrorCategory::Tfc).unwrap();
        assert_eq!(json, "\"tfc\"");

        let category: ErrorCategory = serde_json::from_str("\"wallet\"").unwrap();
        assert_eq!(category, ErrorCategory::Wallet);
    }
}
