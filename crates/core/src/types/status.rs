//! Status enums for remote-owned entities.

use serde::{Deserialize, Serialize};

/// Order lifecycle status as reported by the backend.
///
/// Orders are read-only on the client; the status only ever changes via a
/// fresh fetch of the order history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Failed,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Processing => write!(f, "Processing"),
            Self::Shipped => write!(f, "Shipped"),
            Self::Delivered => write!(f, "Delivered"),
            Self::Cancelled => write!(f, "Cancelled"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    /// Parse the backend's status label, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" | "complete" => Ok(Self::Delivered),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_parse_case_insensitive() {
        assert_eq!(OrderStatus::from_str("pending").unwrap(), OrderStatus::Pending);
        assert_eq!(OrderStatus::from_str("Shipped").unwrap(), OrderStatus::Shipped);
        assert_eq!(OrderStatus::from_str(" Delivered ").unwrap(), OrderStatus::Delivered);
    }

    #[test]
    fn test_status_parse_spelling_variants() {
        assert_eq!(OrderStatus::from_str("canceled").unwrap(), OrderStatus::Cancelled);
        assert_eq!(OrderStatus::from_str("complete").unwrap(), OrderStatus::Delivered);
    }

    #[test]
    fn test_status_parse_unknown() {
        assert!(OrderStatus::from_str("on-hold").is_err());
    }

    #[test]
    fn test_status_display_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
            OrderStatus::Failed,
        ] {
            assert_eq!(OrderStatus::from_str(&status.to_string()).unwrap(), status);
        }
    }
}
