//! Order history flows.

use std::sync::Arc;

use dukkan_client::gateway::routes;
use dukkan_client::{ClientError, GatewayError, Storage, Storefront, Transport};
use dukkan_core::{OrderId, OrderStatus};
use dukkan_integration_tests::{FakeTransport, Harness};
use serde_json::json;

#[tokio::test]
async fn guest_fetch_is_an_error_not_a_no_op() {
    let mut h = Harness::new();

    let err = h.store.orders.fetch_orders().await.unwrap_err();

    assert!(matches!(err, ClientError::Unauthenticated));
    assert!(h.transport.calls().is_empty());
}

#[tokio::test]
async fn fetch_decodes_history_newest_first() {
    let mut h = Harness::new();
    h.sign_in().await;
    h.transport.respond(
        routes::ORDER_HISTORY,
        json!({"orders": [
            {"order_id": "1008", "status": "Processing", "total": "12.500 KD",
             "date_added": "2026-03-14 09:30:00", "products": "3"},
            {"order_id": "1007", "status": "Delivered", "total": "4.250 KD",
             "date_added": "2026-02-01 18:05:00", "products": 1}
        ]}),
    );

    h.store.orders.fetch_orders().await.unwrap();

    let orders = h.store.orders.orders();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].id, OrderId::new("1008"));
    assert_eq!(orders[0].status, OrderStatus::Processing);
    assert_eq!(orders[0].product_count, 3);
    assert_eq!(orders[1].status, OrderStatus::Delivered);
}

#[tokio::test]
async fn failed_fetch_keeps_prior_history() {
    let mut h = Harness::new();
    h.sign_in().await;
    h.transport.respond(
        routes::ORDER_HISTORY,
        json!({"orders": [
            {"order_id": "1007", "status": "Delivered", "total": "4.250 KD"}
        ]}),
    );
    h.store.orders.fetch_orders().await.unwrap();

    h.transport
        .fail(routes::ORDER_HISTORY, GatewayError::ServerFault);
    let err = h.store.orders.fetch_orders().await.unwrap_err();

    assert_eq!(
        err.user_message(),
        "Something went wrong. Please try again later."
    );
    assert_eq!(h.store.orders.orders().len(), 1);
    assert_eq!(h.store.orders.error(), Some(err.user_message().as_str()));
}

#[tokio::test]
async fn fetched_history_survives_a_restart() {
    let mut h = Harness::new();
    h.sign_in().await;
    h.transport.respond(
        routes::ORDER_HISTORY,
        json!({"orders": [
            {"order_id": "1007", "status": "Delivered", "total": "4.250 KD"}
        ]}),
    );
    h.store.orders.fetch_orders().await.unwrap();

    // A fresh store graph over the same storage restores the slice.
    let restarted = Storefront::with_parts(
        FakeTransport::new() as Arc<dyn Transport>,
        Arc::clone(&h.storage) as Arc<dyn Storage>,
        Arc::clone(&h.session),
    );

    assert_eq!(restarted.orders.orders().len(), 1);
    assert_eq!(restarted.orders.orders()[0].id, OrderId::new("1007"));
}

#[tokio::test]
async fn empty_history_decodes_to_no_orders() {
    let mut h = Harness::new();
    h.sign_in().await;
    h.transport.respond(routes::ORDER_HISTORY, json!({"orders": []}));

    h.store.orders.fetch_orders().await.unwrap();

    assert!(h.store.orders.orders().is_empty());
}
