//! Status enums for various entities.
//!
//! Values mirror the backend's choice fields and serialize in `snake_case`.

use serde::{Deserialize, Serialize};

/// Lifecycle of a fundraising cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CauseStatus {
    #[default]
    UnderReview,
    Approved,
    Rejected,
    Ongoing,
    Completed,
    Cancelled,
}

impl CauseStatus {
    /// Whether the cause currently accepts donations.
    #[must_use]
    pub const fn accepts_donations(&self) -> bool {
        matches!(self, Self::Approved | Self::Ongoing)
    }
}

/// Cart lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    #[default]
    Active,
    Completed,
    Abandoned,
}

/// Payment or donation settlement status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl std::fmt::Display for CauseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::UnderReview => "under review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

impl std::fmt::Display for CartStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cause_status_wire_format() {
        let status: CauseStatus = serde_json::from_str("\"under_review\"").unwrap();
        assert_eq!(status, CauseStatus::UnderReview);
        assert_eq!(status.to_string(), "under review");
        assert!(!status.accepts_donations());
        assert!(CauseStatus::Ongoing.accepts_donations());
    }

    #[test]
    fn test_payment_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Completed).unwrap(),
            "\"completed\""
        );
    }

    #[test]
    fn test_cart_status_wire_format() {
        let status: CartStatus = serde_json::from_str("\"abandoned\"").unwrap();
        assert_eq!(status, CartStatus::Abandoned);
        assert_eq!(status.to_string(), "abandoned");
        assert_eq!(CartStatus::default(), CartStatus::Active);
    }
}
