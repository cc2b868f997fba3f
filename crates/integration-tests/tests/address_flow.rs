//! Address book flows, including the guest no-op and selection precedence.

use dukkan_client::gateway::routes;
use dukkan_client::stores::address::AddressForm;
use dukkan_client::{ClientError, GatewayError, ValidationError};
use dukkan_core::AddressId;
use dukkan_integration_tests::Harness;
use serde_json::{Value, json};

fn wire_address(id: &str, default: bool) -> Value {
    json!({
        "address_id": id,
        "firstname": "Nora",
        "lastname": "Hasan",
        "telephone": "+96550000000",
        "country_id": "114",
        "zone_id": "1804",
        "city": "Kuwait City",
        "area": "Salmiya",
        "custom_field": {"30": "4", "31": "Salem Al Mubarak", "32": "12", "33": "3"},
        "default": if default { "1" } else { "0" }
    })
}

fn form() -> AddressForm {
    AddressForm {
        full_name: "Nora Hasan".to_owned(),
        telephone: "+96550000000".to_owned(),
        country_id: "114".to_owned(),
        zone_id: "1804".to_owned(),
        city: "Kuwait City".to_owned(),
        area: "Salmiya".to_owned(),
        block: "4".to_owned(),
        street: "Salem Al Mubarak".to_owned(),
        building: "12".to_owned(),
        apartment: "3".to_owned(),
        avenue: String::new(),
        is_default: false,
    }
}

#[tokio::test]
async fn guest_fetch_is_a_silent_no_op() {
    let mut h = Harness::new();

    h.store.addresses.fetch_addresses().await.unwrap();

    assert!(h.transport.calls().is_empty());
    assert!(h.store.addresses.addresses().is_empty());
    assert_eq!(h.store.addresses.error(), None);
}

#[tokio::test]
async fn fetch_selects_the_server_flagged_default() {
    let mut h = Harness::new();
    h.sign_in().await;
    h.transport.respond(
        routes::ADDRESSES,
        json!({"addresses": [wire_address("1", false), wire_address("2", true)]}),
    );

    h.store.addresses.fetch_addresses().await.unwrap();

    assert_eq!(h.store.addresses.addresses().len(), 2);
    assert_eq!(
        h.store.addresses.selected().unwrap().id,
        AddressId::new("2")
    );
}

#[tokio::test]
async fn fetch_falls_back_to_the_first_address() {
    let mut h = Harness::new();
    h.sign_in().await;
    h.transport.respond(
        routes::ADDRESSES,
        json!({"addresses": [wire_address("1", false), wire_address("2", false)]}),
    );

    h.store.addresses.fetch_addresses().await.unwrap();

    assert_eq!(
        h.store.addresses.selected().unwrap().id,
        AddressId::new("1")
    );
}

#[tokio::test]
async fn empty_book_selects_nothing() {
    let mut h = Harness::new();
    h.sign_in().await;
    h.transport.respond(routes::ADDRESSES, json!({"addresses": []}));

    h.store.addresses.fetch_addresses().await.unwrap();

    assert!(h.store.addresses.selected().is_none());
}

#[tokio::test]
async fn add_address_posts_custom_fields_and_refetches() {
    let mut h = Harness::new();
    h.sign_in().await;
    h.transport.respond(routes::ADD_ADDRESS, Value::Null);
    h.transport.respond(
        routes::ADDRESSES,
        json!({"addresses": [wire_address("9", true)]}),
    );

    h.store.addresses.add_address(&form()).await.unwrap();

    let payload = h.transport.last_payload(routes::ADD_ADDRESS).unwrap();
    assert_eq!(payload.get("firstname").unwrap(), "Nora");
    assert_eq!(payload.get("lastname").unwrap(), "Hasan");
    assert_eq!(payload.get("custom_field").unwrap().get("30").unwrap(), "4");
    assert_eq!(payload.get("default").unwrap(), "0");

    // The re-fetch lands the new address; there is no optimistic insert.
    assert_eq!(h.store.addresses.addresses().len(), 1);
    assert_eq!(
        h.store.addresses.selected().unwrap().id,
        AddressId::new("9")
    );
}

#[tokio::test]
async fn update_address_includes_the_address_id() {
    let mut h = Harness::new();
    h.sign_in().await;
    h.transport.respond(routes::EDIT_ADDRESS, Value::Null);
    h.transport.respond(
        routes::ADDRESSES,
        json!({"addresses": [wire_address("9", true)]}),
    );

    h.store
        .addresses
        .update_address(&AddressId::new("9"), &form())
        .await
        .unwrap();

    let payload = h.transport.last_payload(routes::EDIT_ADDRESS).unwrap();
    assert_eq!(payload.get("address_id").unwrap(), "9");
}

#[tokio::test]
async fn invalid_form_blocks_the_network_call() {
    let mut h = Harness::new();
    h.sign_in().await;

    let mut bad = form();
    bad.full_name = "Nora".to_owned();
    let err = h.store.addresses.add_address(&bad).await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::Validation(ValidationError::FullName)
    ));
    // Inline form feedback, not a store-level error banner.
    assert_eq!(h.store.addresses.error(), None);
    assert_eq!(h.transport.count(routes::ADD_ADDRESS), 0);
}

#[tokio::test]
async fn guest_add_is_rejected() {
    let mut h = Harness::new();

    let err = h.store.addresses.add_address(&form()).await.unwrap_err();

    assert!(matches!(err, ClientError::Unauthenticated));
    assert!(h.transport.calls().is_empty());
}

#[tokio::test]
async fn deleting_the_selected_address_reassigns_selection() {
    let mut h = Harness::new();
    h.sign_in().await;
    h.transport.respond(
        routes::ADDRESSES,
        json!({"addresses": [wire_address("1", true), wire_address("2", false)]}),
    );
    h.store.addresses.fetch_addresses().await.unwrap();
    assert_eq!(
        h.store.addresses.selected().unwrap().id,
        AddressId::new("1")
    );

    h.transport.respond(routes::DELETE_ADDRESS, Value::Null);
    h.transport.respond(
        routes::ADDRESSES,
        json!({"addresses": [wire_address("2", false)]}),
    );

    h.store
        .addresses
        .delete_address(&AddressId::new("1"))
        .await
        .unwrap();

    assert_eq!(
        h.store.addresses.selected().unwrap().id,
        AddressId::new("2")
    );
}

#[tokio::test]
async fn deleting_the_last_address_clears_selection() {
    let mut h = Harness::new();
    h.sign_in().await;
    h.transport.respond(
        routes::ADDRESSES,
        json!({"addresses": [wire_address("1", true)]}),
    );
    h.store.addresses.fetch_addresses().await.unwrap();

    h.transport.respond(routes::DELETE_ADDRESS, Value::Null);
    h.transport.respond(routes::ADDRESSES, json!({"addresses": []}));

    h.store
        .addresses
        .delete_address(&AddressId::new("1"))
        .await
        .unwrap();

    assert!(h.store.addresses.selected().is_none());
    assert!(h.store.addresses.addresses().is_empty());
}

#[tokio::test]
async fn failed_fetch_keeps_prior_addresses() {
    let mut h = Harness::new();
    h.sign_in().await;
    h.transport.respond(
        routes::ADDRESSES,
        json!({"addresses": [wire_address("1", true)]}),
    );
    h.store.addresses.fetch_addresses().await.unwrap();

    h.transport.fail(routes::ADDRESSES, GatewayError::Offline);
    let err = h.store.addresses.fetch_addresses().await.unwrap_err();

    assert_eq!(
        err.user_message(),
        "No internet connection. Check your network and try again."
    );
    assert_eq!(h.store.addresses.addresses().len(), 1);
    assert_eq!(h.store.addresses.error(), Some(err.user_message().as_str()));
}

#[tokio::test]
async fn selecting_an_unknown_id_is_ignored() {
    let mut h = Harness::new();
    h.sign_in().await;
    h.transport.respond(
        routes::ADDRESSES,
        json!({"addresses": [wire_address("1", true)]}),
    );
    h.store.addresses.fetch_addresses().await.unwrap();

    h.store.addresses.select(AddressId::new("404"));

    assert_eq!(
        h.store.addresses.selected().unwrap().id,
        AddressId::new("1")
    );
}
