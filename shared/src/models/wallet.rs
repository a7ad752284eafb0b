//! Wallet credit Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Credit status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditStatus {
    Active,
    Expired,
}

impl CreditStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
        }
    }
}

/// Where a credit came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditSource {
    /// Issued by a cancellation refund
    Refund,
    /// Received from another parent's wallet
    Transfer,
    /// Granted by an admin
    Goodwill,
    /// Manual correction
    Adjustment,
}

impl CreditSource {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "refund" => Some(Self::Refund),
            "transfer" => Some(Self::Transfer),
            "goodwill" => Some(Self::Goodwill),
            "adjustment" => Some(Self::Adjustment),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Refund => "refund",
            Self::Transfer => "transfer",
            Self::Goodwill => "goodwill",
            Self::Adjustment => "adjustment",
        }
    }
}

/// A single credit grant in a parent's wallet
///
/// Invariant: `0 <= used_amount <= amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletCredit {
    pub id: i64,
    pub parent_id: i64,
    pub amount: Decimal,
    pub used_amount: Decimal,
    pub expires_at: i64,
    pub status: CreditStatus,
    pub source: CreditSource,
    /// Booking that produced this credit (refunds only)
    pub source_booking_id: Option<i64>,
    pub created_at: i64,
}

impl WalletCredit {
    pub fn remaining(&self) -> Decimal {
        self.amount - self.used_amount
    }
}

/// Ledger entry kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletTransactionKind {
    Issue,
    Spend,
    Expire,
    TransferOut,
    TransferIn,
}

impl WalletTransactionKind {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Spend => "spend",
            Self::Expire => "expire",
            Self::TransferOut => "transfer_out",
            Self::TransferIn => "transfer_in",
        }
    }
}
