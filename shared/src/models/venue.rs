//! Venue franchise fee configuration

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How the franchise fee is derived from gross takings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeType {
    /// `value` is a percentage of gross (0..=100)
    Percent,
    /// `value` is a fixed amount per settlement
    Fixed,
}

impl FeeType {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "percent" => Some(Self::Percent),
            "fixed" => Some(Self::Fixed),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Percent => "percent",
            Self::Fixed => "fixed",
        }
    }
}

/// Whether the configured fee already contains VAT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VatMode {
    Inclusive,
    Exclusive,
}

impl VatMode {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "inclusive" => Some(Self::Inclusive),
            "exclusive" => Some(Self::Exclusive),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Inclusive => "inclusive",
            Self::Exclusive => "exclusive",
        }
    }
}

/// Per-venue franchise fee settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FranchiseFeeConfig {
    pub fee_type: FeeType,
    pub value: Decimal,
    pub vat_mode: VatMode,
}
