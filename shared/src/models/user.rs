//! Platform roles

use serde::{Deserialize, Serialize};

/// Role carried in the access token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform staff
    Admin,
    /// Parent / guardian who books and pays
    Parent,
    /// Activity provider running sessions at a venue
    Provider,
}

impl Role {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "parent" => Some(Self::Parent),
            "provider" => Some(Self::Provider),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Parent => "parent",
            Self::Provider => "provider",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}
