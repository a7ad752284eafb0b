//! Booking Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Waiting for a TFC (or other deferred) payment
    PendingPayment,
    /// Paid and booked
    Confirmed,
    Cancelled,
    /// Child did not attend
    NoShow,
    /// All sessions delivered
    Completed,
}

impl BookingStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending_payment" => Some(Self::PendingPayment),
            "confirmed" => Some(Self::Confirmed),
            "cancelled" => Some(Self::Cancelled),
            "no_show" => Some(Self::NoShow),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::PendingPayment => "pending_payment",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no_show",
            Self::Completed => "completed",
        }
    }

    /// Can a cancellation still be applied?
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::PendingPayment | Self::Confirmed)
    }
}

/// How the booking amount was paid
///
/// Parts are independent; a booking paid partly by card and partly from
/// the wallet has both `card` and `wallet_credit` set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaymentBreakdown {
    #[serde(default)]
    pub card: Decimal,
    #[serde(default)]
    pub tfc: Decimal,
    #[serde(default)]
    pub voucher: Decimal,
    #[serde(default)]
    pub wallet_credit: Decimal,
}

impl PaymentBreakdown {
    pub fn card(amount: Decimal) -> Self {
        Self {
            card: amount,
            ..Self::default()
        }
    }

    pub fn tfc(amount: Decimal) -> Self {
        Self {
            tfc: amount,
            ..Self::default()
        }
    }

    pub fn voucher(amount: Decimal) -> Self {
        Self {
            voucher: amount,
            ..Self::default()
        }
    }

    pub fn total(&self) -> Decimal {
        self.card + self.tfc + self.voucher + self.wallet_credit
    }

    /// Everything that cannot go back to a card
    pub fn non_card(&self) -> Decimal {
        self.tfc + self.voucher + self.wallet_credit
    }

    pub fn method(&self) -> PaymentMethod {
        let parts = [
            (self.card, PaymentMethod::Card),
            (self.tfc, PaymentMethod::Tfc),
            (self.voucher, PaymentMethod::Voucher),
            (self.wallet_credit, PaymentMethod::Credit),
        ];
        let mut used = parts.iter().filter(|(amount, _)| !amount.is_zero());
        match (used.next(), used.next()) {
            (Some((_, method)), None) => *method,
            (None, _) => PaymentMethod::Card,
            _ => PaymentMethod::Mixed,
        }
    }
}

/// Payment method summary derived from a [`PaymentBreakdown`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Tfc,
    Voucher,
    /// Paid entirely from wallet credit
    Credit,
    Mixed,
}

impl PaymentMethod {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Tfc => "tfc",
            Self::Voucher => "voucher",
            Self::Credit => "credit",
            Self::Mixed => "mixed",
        }
    }
}

/// Who triggered a cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationKind {
    /// Provider (or platform) cancelled the session
    Provider,
    /// Parent cancelled
    Parent,
    /// Child did not attend
    NoShow,
}

impl CancellationKind {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Provider => "provider",
            Self::Parent => "parent",
            Self::NoShow => "no_show",
        }
    }
}
