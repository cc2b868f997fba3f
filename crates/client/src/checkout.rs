//! Checkout sequencing.
//!
//! Order placement is a fixed sequence of dependent server calls, each
//! awaited before the next begins: billing address → shipping address →
//! shipping method → payment method → confirm. A failure at any step aborts
//! the sequence with that step's error; no later call is issued. Whatever
//! partial server-side state the aborted steps left behind is the server's
//! to reconcile - the client never tracks a half-submitted order.

use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use dukkan_core::{AddressId, OrderId};

use crate::error::ClientError;
use crate::gateway::{CallOptions, Transport, routes};
use crate::stores::cart::CartStore;

/// Everything checkout needs, gathered by the UI beforehand.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub billing_address: AddressId,
    /// Distinct shipping address; billing is reused when `None`.
    pub shipping_address: Option<AddressId>,
    /// Server-defined shipping method code (e.g. `flat.flat`).
    pub shipping_method: String,
    /// Server-defined payment method code (e.g. `cod`).
    pub payment_method: String,
    pub comment: Option<String>,
}

/// Confirmation payload for a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
}

/// Place an order through the five-step sequence.
///
/// On confirmation success the local cart is cleared unconditionally - the
/// server cart is already consumed - even if the confirmation payload then
/// fails to decode.
///
/// # Errors
///
/// Returns the first failing step's error; later steps are never issued.
#[instrument(skip(gateway, cart, request))]
pub async fn place_order(
    gateway: &dyn Transport,
    cart: &mut CartStore,
    request: &CheckoutRequest,
) -> Result<OrderConfirmation, ClientError> {
    let billing = json!({ "address_id": request.billing_address.as_str() });
    gateway
        .call(routes::CHECKOUT_BILLING_ADDRESS, CallOptions::post(billing))
        .await?;

    let shipping_id = request
        .shipping_address
        .as_ref()
        .unwrap_or(&request.billing_address);
    let shipping = json!({ "address_id": shipping_id.as_str() });
    gateway
        .call(routes::CHECKOUT_SHIPPING_ADDRESS, CallOptions::post(shipping))
        .await?;

    let shipping_method = json!({
        "shipping_method": request.shipping_method,
        "comment": request.comment.as_deref().unwrap_or(""),
    });
    gateway
        .call(
            routes::CHECKOUT_SHIPPING_METHOD,
            CallOptions::post(shipping_method),
        )
        .await?;

    let payment_method = json!({ "payment_method": request.payment_method });
    gateway
        .call(
            routes::CHECKOUT_PAYMENT_METHOD,
            CallOptions::post(payment_method),
        )
        .await?;

    let data = gateway
        .call(routes::CHECKOUT_CONFIRM, CallOptions::post(json!({})))
        .await?;

    cart.clear_local();

    Ok(serde_json::from_value(data)?)
}
