//! Address store.
//!
//! Owns the signed-in user's address book. The backend has no named columns
//! for the structured parts of a Kuwaiti address; block, street, building,
//! apartment, and avenue travel as generic custom fields keyed by position
//! (30/31/32/33/35). That encoding quirk is isolated in the
//! [`custom_fields`] codec; the rest of the crate only sees named fields.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::instrument;

use dukkan_core::{AddressId, CountryId, ZoneId};

use crate::error::{ClientError, ValidationError};
use crate::gateway::envelope::lenient_bool;
use crate::gateway::{CallOptions, Transport, routes};
use crate::storage::{Storage, keys};
use crate::stores::auth::AuthWatch;
use crate::stores::{load_slice, persist_slice};

/// A postal address with the backend's custom fields decoded into names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub first_name: String,
    pub last_name: String,
    pub telephone: String,
    pub country_id: CountryId,
    /// Governorate.
    pub zone_id: ZoneId,
    pub city: String,
    pub area: String,
    pub block: String,
    pub street: String,
    pub building: String,
    pub apartment: String,
    pub avenue: String,
    /// Server-flagged default address. At most one per address book.
    pub is_default: bool,
}

/// Input for adding or editing an address.
#[derive(Debug, Clone, Default)]
pub struct AddressForm {
    /// Free-text name; must split into at least first + last.
    pub full_name: String,
    pub telephone: String,
    pub country_id: String,
    pub zone_id: String,
    pub city: String,
    pub area: String,
    pub block: String,
    pub street: String,
    pub building: String,
    pub apartment: String,
    pub avenue: String,
    pub is_default: bool,
}

impl AddressForm {
    /// Pre-submit validation. Advisory UI gating only; the server remains
    /// the authority.
    ///
    /// # Errors
    ///
    /// Returns the first failing field check; nothing reaches the network.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut names = self.full_name.split_whitespace();
        if names.next().is_none() || names.next().is_none() {
            return Err(ValidationError::FullName);
        }

        for (value, field) in [
            (&self.telephone, "phone"),
            (&self.country_id, "country"),
            (&self.city, "city"),
            (&self.area, "area"),
            (&self.block, "block"),
            (&self.street, "street"),
            (&self.building, "building"),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::Required(field));
            }
        }

        Ok(())
    }

    /// Split the free-text name into the backend's first/last fields.
    fn split_name(&self) -> (String, String) {
        let mut names = self.full_name.split_whitespace();
        let first = names.next().unwrap_or_default().to_owned();
        let last = names.collect::<Vec<_>>().join(" ");
        (first, last)
    }

    fn to_payload(&self) -> Value {
        let (first_name, last_name) = self.split_name();
        json!({
            "firstname": first_name,
            "lastname": last_name,
            "telephone": self.telephone,
            "country_id": self.country_id,
            "zone_id": self.zone_id,
            "city": self.city,
            "area": self.area,
            "custom_field": custom_fields::encode(
                &self.block,
                &self.street,
                &self.building,
                &self.apartment,
                &self.avenue,
            ),
            "default": if self.is_default { "1" } else { "0" },
        })
    }
}

/// The one place that knows the backend's positional custom-field keys.
pub mod custom_fields {
    use serde_json::{Map, Value};

    pub const BLOCK: &str = "30";
    pub const STREET: &str = "31";
    pub const BUILDING: &str = "32";
    pub const APARTMENT: &str = "33";
    pub const AVENUE: &str = "35";

    /// Encode named parts into the backend's `custom_field` object.
    #[must_use]
    pub fn encode(
        block: &str,
        street: &str,
        building: &str,
        apartment: &str,
        avenue: &str,
    ) -> Value {
        let mut map = Map::new();
        for (key, value) in [
            (BLOCK, block),
            (STREET, street),
            (BUILDING, building),
            (APARTMENT, apartment),
            (AVENUE, avenue),
        ] {
            map.insert(key.to_owned(), Value::String(value.to_owned()));
        }
        Value::Object(map)
    }

    /// Read one custom field, tolerating numeric values.
    #[must_use]
    pub fn read(map: &Map<String, Value>, key: &str) -> String {
        match map.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }
}

/// Wire shape of one address in the list response.
#[derive(Debug, Deserialize)]
struct WireAddress {
    address_id: String,
    #[serde(rename = "firstname")]
    first_name: String,
    #[serde(rename = "lastname")]
    last_name: String,
    #[serde(default)]
    telephone: String,
    country_id: String,
    #[serde(default)]
    zone_id: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    area: String,
    #[serde(default)]
    custom_field: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient_bool")]
    default: bool,
}

impl From<WireAddress> for Address {
    fn from(wire: WireAddress) -> Self {
        Self {
            id: AddressId::new(wire.address_id),
            first_name: wire.first_name,
            last_name: wire.last_name,
            telephone: wire.telephone,
            country_id: CountryId::new(wire.country_id),
            zone_id: ZoneId::new(wire.zone_id),
            city: wire.city,
            area: wire.area,
            block: custom_fields::read(&wire.custom_field, custom_fields::BLOCK),
            street: custom_fields::read(&wire.custom_field, custom_fields::STREET),
            building: custom_fields::read(&wire.custom_field, custom_fields::BUILDING),
            apartment: custom_fields::read(&wire.custom_field, custom_fields::APARTMENT),
            avenue: custom_fields::read(&wire.custom_field, custom_fields::AVENUE),
            is_default: wire.default,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AddressListData {
    #[serde(default)]
    addresses: Vec<WireAddress>,
}

/// The persisted address slice.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedAddresses {
    addresses: Vec<Address>,
    selected: Option<AddressId>,
}

/// Client-side address book state.
pub struct AddressStore {
    gateway: Arc<dyn Transport>,
    storage: Arc<dyn Storage>,
    auth: AuthWatch,
    addresses: Vec<Address>,
    selected: Option<AddressId>,
    is_loading: bool,
    error: Option<String>,
}

impl AddressStore {
    /// Create an address store, restoring the persisted slice if present.
    #[must_use]
    pub fn new(gateway: Arc<dyn Transport>, storage: Arc<dyn Storage>, auth: AuthWatch) -> Self {
        let persisted: PersistedAddresses =
            load_slice(storage.as_ref(), keys::ADDRESSES).unwrap_or_default();
        Self {
            gateway,
            storage,
            auth,
            addresses: persisted.addresses,
            selected: persisted.selected,
            is_loading: false,
            error: None,
        }
    }

    /// All known addresses.
    #[must_use]
    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// The currently selected address.
    #[must_use]
    pub fn selected(&self) -> Option<&Address> {
        let id = self.selected.as_ref()?;
        self.addresses.iter().find(|address| &address.id == id)
    }

    /// Whether a command is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Last recorded user-facing error message.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Choose an address for checkout.
    pub fn select(&mut self, id: AddressId) {
        if self.addresses.iter().any(|address| address.id == id) {
            self.selected = Some(id);
            self.persist();
        }
    }

    /// Fetch the address book.
    ///
    /// A silent no-op for guests: there is nothing to fetch and it is not an
    /// error. Selection follows the fixed precedence server-flagged default →
    /// first address → none.
    ///
    /// # Errors
    ///
    /// Records and returns the gateway error; prior addresses stay untouched.
    #[instrument(skip(self))]
    pub async fn fetch_addresses(&mut self) -> Result<(), ClientError> {
        if !self.auth.is_authenticated() {
            return Ok(());
        }

        self.is_loading = true;
        self.error = None;

        let result = self
            .gateway
            .call(routes::ADDRESSES, CallOptions::get())
            .await;
        self.is_loading = false;

        match result {
            Ok(data) => {
                let list: AddressListData = serde_json::from_value(data)?;
                self.addresses = list.addresses.into_iter().map(Address::from).collect();
                self.reselect();
                self.persist();
                Ok(())
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Add an address, then re-fetch the book.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any network traffic, or
    /// [`ClientError::Unauthenticated`] for guests, or the first failing
    /// call's error.
    #[instrument(skip(self, form))]
    pub async fn add_address(&mut self, form: &AddressForm) -> Result<(), ClientError> {
        self.mutate(routes::ADD_ADDRESS, form, None).await
    }

    /// Edit an existing address, then re-fetch the book.
    ///
    /// # Errors
    ///
    /// Same contract as [`add_address`](Self::add_address).
    #[instrument(skip(self, form), fields(address_id = %id))]
    pub async fn update_address(
        &mut self,
        id: &AddressId,
        form: &AddressForm,
    ) -> Result<(), ClientError> {
        self.mutate(routes::EDIT_ADDRESS, form, Some(id)).await
    }

    /// Delete an address, then re-fetch the book.
    ///
    /// Deleting the selected address reassigns selection through the same
    /// precedence as the initial fetch (default → first → none), which falls
    /// out of the re-fetch.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Unauthenticated`] for guests, or the first
    /// failing call's error.
    #[instrument(skip(self), fields(address_id = %id))]
    pub async fn delete_address(&mut self, id: &AddressId) -> Result<(), ClientError> {
        if !self.auth.is_authenticated() {
            return Err(self.fail(ClientError::Unauthenticated));
        }

        self.error = None;
        let payload = json!({ "address_id": id.as_str() });

        match self
            .gateway
            .call(routes::DELETE_ADDRESS, CallOptions::post(payload))
            .await
        {
            Ok(_) => self.fetch_addresses().await,
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Reset local address state. Called by the app shell on sign-out.
    pub fn clear(&mut self) {
        self.addresses.clear();
        self.selected = None;
        self.error = None;
        self.storage.remove(keys::ADDRESSES);
    }

    async fn mutate(
        &mut self,
        route: &str,
        form: &AddressForm,
        id: Option<&AddressId>,
    ) -> Result<(), ClientError> {
        if !self.auth.is_authenticated() {
            return Err(self.fail(ClientError::Unauthenticated));
        }

        // Validation failures block the call entirely and are not store
        // errors - the form surfaces them inline.
        form.validate()?;

        self.error = None;
        let mut payload = form.to_payload();
        if let (Some(id), Some(object)) = (id, payload.as_object_mut()) {
            object.insert("address_id".to_owned(), Value::String(id.as_str().to_owned()));
        }

        match self.gateway.call(route, CallOptions::post(payload)).await {
            // No durable optimistic insert/update: the re-fetch is what lands
            // the change locally.
            Ok(_) => self.fetch_addresses().await,
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Selection precedence: server-flagged default → first address → none.
    fn reselect(&mut self) {
        self.selected = self
            .addresses
            .iter()
            .find(|address| address.is_default)
            .or_else(|| self.addresses.first())
            .map(|address| address.id.clone());
    }

    fn fail(&mut self, err: ClientError) -> ClientError {
        self.error = Some(err.user_message());
        err
    }

    fn persist(&self) {
        let slice = PersistedAddresses {
            addresses: self.addresses.clone(),
            selected: self.selected.clone(),
        };
        persist_slice(self.storage.as_ref(), keys::ADDRESSES, &slice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> AddressForm {
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

    #[test]
    fn test_validate_accepts_complete_form() {
        assert!(valid_form().validate().is_ok());
    }

    #[test]
    fn test_validate_requires_first_and_last_name() {
        let mut form = valid_form();
        form.full_name = "Nora".to_owned();
        assert_eq!(form.validate(), Err(ValidationError::FullName));
    }

    #[test]
    fn test_validate_requires_mandatory_fields() {
        let mut form = valid_form();
        form.block = "  ".to_owned();
        assert_eq!(form.validate(), Err(ValidationError::Required("block")));
    }

    #[test]
    fn test_apartment_and_avenue_are_optional() {
        let mut form = valid_form();
        form.apartment = String::new();
        form.avenue = String::new();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_payload_encodes_positional_custom_fields() {
        let payload = valid_form().to_payload();
        let fields = payload.get("custom_field").unwrap();

        assert_eq!(fields.get("30").unwrap(), "4");
        assert_eq!(fields.get("31").unwrap(), "Salem Al Mubarak");
        assert_eq!(fields.get("32").unwrap(), "12");
        assert_eq!(fields.get("33").unwrap(), "3");
        assert_eq!(payload.get("firstname").unwrap(), "Nora");
        assert_eq!(payload.get("lastname").unwrap(), "Hasan");
    }

    #[test]
    fn test_wire_address_decodes_custom_fields() {
        let wire: WireAddress = serde_json::from_value(json!({
            "address_id": "88",
            "firstname": "Nora",
            "lastname": "Hasan",
            "telephone": "+96550000000",
            "country_id": "114",
            "zone_id": "1804",
            "city": "Kuwait City",
            "area": "Salmiya",
            "custom_field": {"30": "4", "31": "Salem Al Mubarak", "32": 12, "33": "3"},
            "default": "1"
        }))
        .unwrap();

        let address = Address::from(wire);
        assert_eq!(address.block, "4");
        assert_eq!(address.building, "12");
        assert_eq!(address.avenue, "");
        assert!(address.is_default);
    }
}
