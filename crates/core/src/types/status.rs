//! Status enums for orders and users.

use serde::{Deserialize, Serialize};

/// Order status as reported by the fabrication backend.
///
/// The backend owns the order lifecycle entirely; the storefront only ever
/// displays a cached snapshot. Wire values are the backend's Spanish status
/// strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Submitted, waiting for a quote.
    #[default]
    #[serde(rename = "pendiente")]
    Pending,
    /// Quoted with an estimated price.
    #[serde(rename = "cotizado")]
    Quoted,
    /// Customer accepted the final price.
    #[serde(rename = "confirmado")]
    Confirmed,
    /// Work in progress.
    #[serde(rename = "en_proceso")]
    InProgress,
    /// Fabrication finished.
    #[serde(rename = "completado")]
    Completed,
    /// Canceled by either side.
    #[serde(rename = "cancelado")]
    Canceled,
}

impl OrderStatus {
    /// Human-readable label for templates.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending quote",
            Self::Quoted => "Quoted",
            Self::Confirmed => "Confirmed",
            Self::InProgress => "In progress",
            Self::Completed => "Completed",
            Self::Canceled => "Canceled",
        }
    }

    /// Whether the order is still open (not completed or canceled).
    #[must_use]
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Completed | Self::Canceled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Role attached to a storefront user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular customer account.
    #[default]
    Customer,
    /// Shop staff (sees admin links in the nav, nothing more client-side).
    Staff,
    /// Full administrator.
    Admin,
}

impl UserRole {
    /// Whether the role grants access to staff-only UI.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Staff | Self::Admin)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_wire_values() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Pending).unwrap(),
            "\"pendiente\""
        );
        assert_eq!(
            serde_json::to_string(&OrderStatus::InProgress).unwrap(),
            "\"en_proceso\""
        );

        let status: OrderStatus = serde_json::from_str("\"cotizado\"").unwrap();
        assert_eq!(status, OrderStatus::Quoted);
    }

    #[test]
    fn test_order_status_is_open() {
        assert!(OrderStatus::Pending.is_open());
        assert!(OrderStatus::InProgress.is_open());
        assert!(!OrderStatus::Completed.is_open());
        assert!(!OrderStatus::Canceled.is_open());
    }

    #[test]
    fn test_user_role_staff() {
        assert!(UserRole::Admin.is_staff());
        assert!(UserRole::Staff.is_staff());
        assert!(!UserRole::Customer.is_staff());
    }
}
