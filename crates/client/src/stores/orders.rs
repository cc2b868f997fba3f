//! Order history store.
//!
//! Strictly read-only: orders are created by checkout and mutated by nobody
//! on the client. The only command is a fetch of the history list.

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{instrument, warn};

use dukkan_core::{OrderId, OrderStatus};

use crate::error::ClientError;
use crate::gateway::envelope::lenient_u32;
use crate::gateway::{CallOptions, Transport, routes};
use crate::storage::{Storage, keys};
use crate::stores::auth::AuthWatch;
use crate::stores::{load_slice, persist_slice};

/// One historical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "order_id")]
    pub id: OrderId,
    #[serde(deserialize_with = "lenient_status")]
    pub status: OrderStatus,
    /// Currency-formatted order total.
    pub total: String,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub date_added: Option<NaiveDateTime>,
    /// Number of lines in the order.
    #[serde(default, rename = "products", deserialize_with = "lenient_u32")]
    pub product_count: u32,
}

/// Parse the backend's status label, falling back to `Pending` with a
/// warning for labels outside the known set.
fn lenient_status<'de, D>(deserializer: D) -> Result<OrderStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let label = String::deserialize(deserializer)?;
    label.parse().map_or_else(
        |err| {
            warn!(%label, %err, "unknown order status label; treating as pending");
            Ok(OrderStatus::Pending)
        },
        Ok,
    )
}

/// Parse `YYYY-MM-DD HH:MM:SS` timestamps, tolerating absent or junk values.
fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").ok()))
}

#[derive(Debug, Deserialize)]
struct OrderListData {
    #[serde(default)]
    orders: Vec<Order>,
}

/// Client-side order history.
pub struct OrdersStore {
    gateway: Arc<dyn Transport>,
    storage: Arc<dyn Storage>,
    auth: AuthWatch,
    orders: Vec<Order>,
    is_loading: bool,
    error: Option<String>,
}

impl OrdersStore {
    /// Create an orders store, restoring the persisted slice if present.
    #[must_use]
    pub fn new(gateway: Arc<dyn Transport>, storage: Arc<dyn Storage>, auth: AuthWatch) -> Self {
        let orders = load_slice(storage.as_ref(), keys::ORDERS).unwrap_or_default();
        Self {
            gateway,
            storage,
            auth,
            orders,
            is_loading: false,
            error: None,
        }
    }

    /// The fetched history, newest first as the server sends it.
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Whether a fetch is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Last recorded user-facing error message.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Fetch the order history.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Unauthenticated`] for guests (order history is
    /// account-scoped), otherwise the gateway error.
    #[instrument(skip(self))]
    pub async fn fetch_orders(&mut self) -> Result<(), ClientError> {
        if !self.auth.is_authenticated() {
            return Err(ClientError::Unauthenticated);
        }

        self.is_loading = true;
        self.error = None;

        let result = self
            .gateway
            .call(routes::ORDER_HISTORY, CallOptions::get())
            .await;
        self.is_loading = false;

        match result {
            Ok(data) => {
                let list: OrderListData = serde_json::from_value(data)?;
                self.orders = list.orders;
                persist_slice(self.storage.as_ref(), keys::ORDERS, &self.orders);
                Ok(())
            }
            Err(err) => {
                let err = ClientError::from(err);
                self.error = Some(err.user_message());
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_order_decodes_wire_shape() {
        let order: Order = serde_json::from_value(json!({
            "order_id": "1007",
            "status": "Processing",
            "total": "12.500 KD",
            "date_added": "2026-03-14 09:30:00",
            "products": "3"
        }))
        .unwrap();

        assert_eq!(order.id, OrderId::new("1007"));
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.product_count, 3);
        assert!(order.date_added.is_some());
    }

    #[test]
    fn test_unknown_status_degrades_to_pending() {
        let order: Order = serde_json::from_value(json!({
            "order_id": "1",
            "status": "Awaiting Pigeon",
            "total": "1 KD",
        }))
        .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_junk_date_is_none() {
        let order: Order = serde_json::from_value(json!({
            "order_id": "1",
            "status": "Delivered",
            "total": "1 KD",
            "date_added": "yesterday"
        }))
        .unwrap();

        assert_eq!(order.date_added, None);
    }
}
