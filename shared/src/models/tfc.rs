//! Tax-Free Childcare payment Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// TFC payment status
///
/// `PendingPayment` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TfcStatus {
    PendingPayment,
    Paid,
    Cancelled,
}

impl TfcStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending_payment" => Some(Self::PendingPayment),
            "paid" => Some(Self::Paid),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::PendingPayment => "pending_payment",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::PendingPayment)
    }
}

impl fmt::Display for TfcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db())
    }
}

/// Why a TFC payment was cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TfcCancelReason {
    /// Deadline passed without payment
    Expired,
    /// Parent or admin cancelled
    Manual,
    /// Booking itself was cancelled
    BookingCancelled,
}

impl TfcCancelReason {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "expired" => Some(Self::Expired),
            "manual" => Some(Self::Manual),
            "booking_cancelled" => Some(Self::BookingCancelled),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::Manual => "manual",
            Self::BookingCancelled => "booking_cancelled",
        }
    }
}

/// TFC payment record (one per booking awaiting a TFC transfer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfcPayment {
    pub id: i64,
    pub booking_id: i64,
    pub parent_id: i64,
    /// `TFC-YYYYMMDD-XXXXXX`
    pub reference: String,
    pub amount: Decimal,
    pub status: TfcStatus,
    pub deadline_at: i64,
    pub reminder_at: i64,
    pub reminder_sent_at: Option<i64>,
    pub received_amount: Option<Decimal>,
    pub paid_at: Option<i64>,
    pub cancelled_at: Option<i64>,
    pub cancel_reason: Option<TfcCancelReason>,
    pub created_at: i64,
}
