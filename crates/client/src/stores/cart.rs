//! Cart store.
//!
//! The server owns the cart. Every mutating command posts the change and then
//! re-fetches the full cart snapshot instead of trusting item-level response
//! data, with one deliberate exception: removing the only remaining line sets
//! the empty state directly, skipping the redundant fetch. That shortcut is
//! preserved from the shipped client and pinned by tests; do not extend the
//! pattern to other commands.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{instrument, warn};

use dukkan_core::{CartLineKey, Price, ProductId};

use crate::error::{ClientError, ValidationError};
use crate::gateway::envelope::{lenient_bool, lenient_opt_u32, lenient_u32};
use crate::gateway::{CallOptions, Transport, routes};
use crate::storage::{Storage, keys};
use crate::stores::{load_slice, persist_slice};

/// Cart state machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CartPhase {
    #[default]
    Empty,
    Loading,
    Populated,
    Error,
}

/// One remote-sourced cart line.
///
/// `price` stays a currency-formatted display string ("0.500 KD"); the
/// server owns authoritative totals and [`CartStore::total`] only derives a
/// display sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Cart-scoped line key; the unit of mutation.
    pub key: CartLineKey,
    pub product_id: ProductId,
    pub name: String,
    /// Currency-formatted unit price string.
    pub price: String,
    #[serde(deserialize_with = "lenient_u32")]
    pub quantity: u32,
    /// Whether the line is currently in stock.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub stock: bool,
    #[serde(default, deserialize_with = "lenient_opt_u32")]
    pub minimum: Option<u32>,
    #[serde(default, deserialize_with = "lenient_opt_u32")]
    pub maximum: Option<u32>,
}

/// The cart payload decoded at the gateway boundary.
///
/// The backend is not uniform: the same route answers with `null` (nothing in
/// the cart), an object carrying only a line count, or an object with the
/// full product list. Decoding collapses the three shapes into one tagged
/// union and never fails - unknown shapes degrade to `Empty`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartSnapshot {
    Empty,
    CountOnly { count: u32 },
    Full { items: Vec<CartItem> },
}

impl CartSnapshot {
    /// Decode any of the three server cart shapes.
    #[must_use]
    pub fn decode(data: &Value) -> Self {
        let Some(object) = data.as_object() else {
            return Self::Empty;
        };

        if let Some(products) = object.get("products").and_then(Value::as_array) {
            let mut items = Vec::with_capacity(products.len());
            for product in products {
                match serde_json::from_value::<CartItem>(product.clone()) {
                    Ok(item) => items.push(item),
                    Err(err) => {
                        warn!(error = %err, "skipping malformed cart line");
                    }
                }
            }
            if items.is_empty() {
                return Self::Empty;
            }
            return Self::Full { items };
        }

        let count = object
            .get("total_product_count")
            .or_else(|| object.get("count"))
            .and_then(Value::as_u64);
        count.map_or(Self::Empty, |count| Self::CountOnly {
            count: u32::try_from(count).unwrap_or(u32::MAX),
        })
    }
}

/// The persisted cart slice.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedCart {
    phase: CartPhase,
    items: Vec<CartItem>,
    item_count: u32,
}

/// Client-side cart state, reconciled against server snapshots.
pub struct CartStore {
    gateway: Arc<dyn Transport>,
    storage: Arc<dyn Storage>,
    phase: CartPhase,
    items: Vec<CartItem>,
    item_count: u32,
    error: Option<String>,
}

impl CartStore {
    /// Create a cart store, restoring the persisted slice if present.
    #[must_use]
    pub fn new(gateway: Arc<dyn Transport>, storage: Arc<dyn Storage>) -> Self {
        let persisted: PersistedCart = load_slice(storage.as_ref(), keys::CART).unwrap_or_default();
        Self {
            gateway,
            storage,
            phase: persisted.phase,
            items: persisted.items,
            item_count: persisted.item_count,
            error: None,
        }
    }

    /// Current phase of the cart state machine.
    #[must_use]
    pub const fn phase(&self) -> CartPhase {
        self.phase
    }

    /// Current cart lines.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Badge count: total quantity across lines, or the server's count when
    /// only a count was sent.
    #[must_use]
    pub const fn item_count(&self) -> u32 {
        self.item_count
    }

    /// Last recorded user-facing error message.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Derived display total: Σ `parse(price) × quantity`.
    ///
    /// Advisory only; price parsing tolerates currency suffixes and the
    /// server remains the authority on what is actually charged.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .map(|item| Price::parse(&item.price).times(item.quantity))
            .sum()
    }

    /// Fetch the authoritative cart snapshot.
    ///
    /// # Errors
    ///
    /// Records and returns the gateway error; prior items stay untouched.
    #[instrument(skip(self))]
    pub async fn get_cart(&mut self) -> Result<(), ClientError> {
        self.phase = CartPhase::Loading;
        self.error = None;

        match self.gateway.call(routes::CART, CallOptions::get()).await {
            Ok(data) => {
                self.apply_snapshot(CartSnapshot::decode(&data));
                self.persist();
                Ok(())
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Add a product, then re-fetch the authoritative snapshot.
    ///
    /// # Errors
    ///
    /// Records and returns the first failing call's error.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_cart(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), ClientError> {
        let payload = json!({
            "product_id": product_id.as_str(),
            "quantity": quantity,
        });
        self.mutate_then_refetch(routes::CART_ADD, payload).await
    }

    /// Set a line's quantity, then re-fetch the authoritative snapshot.
    ///
    /// # Errors
    ///
    /// Records and returns the first failing call's error.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn update_quantity(
        &mut self,
        key: &CartLineKey,
        quantity: u32,
    ) -> Result<(), ClientError> {
        let payload = json!({
            "key": key.as_str(),
            "quantity": quantity,
        });
        self.mutate_then_refetch(routes::CART_EDIT, payload).await
    }

    /// Remove a line.
    ///
    /// Removing the last remaining line sets the empty state directly with no
    /// follow-up fetch; every other removal re-fetches the snapshot.
    ///
    /// # Errors
    ///
    /// Records and returns the first failing call's error.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn remove_item(&mut self, key: &CartLineKey) -> Result<(), ClientError> {
        let removing_last =
            self.items.len() == 1 && self.items.first().is_some_and(|item| &item.key == key);

        self.error = None;
        let payload = json!({ "key": key.as_str() });

        match self
            .gateway
            .call(routes::CART_REMOVE, CallOptions::post(payload))
            .await
        {
            Ok(_) if removing_last => {
                // The result is fully known; skip the redundant round-trip.
                self.apply_snapshot(CartSnapshot::Empty);
                self.persist();
                Ok(())
            }
            Ok(_) => self.get_cart().await,
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Empty the cart on the server, then re-fetch.
    ///
    /// # Errors
    ///
    /// Records and returns the first failing call's error.
    #[instrument(skip(self))]
    pub async fn clear_cart(&mut self) -> Result<(), ClientError> {
        self.mutate_then_refetch(routes::CART_CLEAR, json!({})).await
    }

    /// Increase a line's quantity by one.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownCartLine`] if the line is not in
    /// local state, otherwise whatever [`update_quantity`](Self::update_quantity)
    /// returns.
    pub async fn increment_quantity(&mut self, key: &CartLineKey) -> Result<(), ClientError> {
        let quantity = self
            .quantity_of(key)
            .ok_or(ValidationError::UnknownCartLine)?;
        self.update_quantity(key, quantity + 1).await
    }

    /// Decrease a line's quantity by one, clamped at a minimum of 1.
    ///
    /// # Errors
    ///
    /// Going below 1 is rejected locally - no network call is issued and
    /// store error state is untouched (remove the line instead).
    pub async fn decrement_quantity(&mut self, key: &CartLineKey) -> Result<(), ClientError> {
        let quantity = self
            .quantity_of(key)
            .ok_or(ValidationError::UnknownCartLine)?;
        if quantity <= 1 {
            return Err(ValidationError::QuantityFloor.into());
        }
        self.update_quantity(key, quantity - 1).await
    }

    /// Reset local cart state without any server call.
    ///
    /// Checkout confirmation owns the one legitimate use: after a confirmed
    /// order the server cart is already gone.
    pub fn clear_local(&mut self) {
        self.apply_snapshot(CartSnapshot::Empty);
        self.error = None;
        self.persist();
    }

    fn quantity_of(&self, key: &CartLineKey) -> Option<u32> {
        self.items
            .iter()
            .find(|item| &item.key == key)
            .map(|item| item.quantity)
    }

    async fn mutate_then_refetch(
        &mut self,
        route: &str,
        payload: Value,
    ) -> Result<(), ClientError> {
        self.error = None;

        match self.gateway.call(route, CallOptions::post(payload)).await {
            // Item-level response data is deliberately ignored; the follow-up
            // fetch is the only source of truth.
            Ok(_) => self.get_cart().await,
            Err(err) => Err(self.fail(err.into())),
        }
    }

    fn apply_snapshot(&mut self, snapshot: CartSnapshot) {
        match snapshot {
            CartSnapshot::Empty => {
                self.items.clear();
                self.item_count = 0;
                self.phase = CartPhase::Empty;
            }
            CartSnapshot::CountOnly { count } => {
                // Count-only responses carry no line data; the badge updates
                // and existing lines stand until a full snapshot arrives.
                self.item_count = count;
                if count == 0 {
                    self.items.clear();
                    self.phase = CartPhase::Empty;
                } else {
                    self.phase = CartPhase::Populated;
                }
            }
            CartSnapshot::Full { items } => {
                self.item_count = items.iter().map(|item| item.quantity).sum();
                self.items = items;
                self.phase = CartPhase::Populated;
            }
        }
    }

    /// Record a failure: error message set, phase flipped, prior items kept.
    fn fail(&mut self, err: ClientError) -> ClientError {
        self.phase = CartPhase::Error;
        self.error = Some(err.user_message());
        err
    }

    fn persist(&self) {
        let slice = PersistedCart {
            phase: self.phase,
            items: self.items.clone(),
            item_count: self.item_count,
        };
        persist_slice(self.storage.as_ref(), keys::CART, &slice);
    }
}
