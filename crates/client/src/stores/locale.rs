//! Locale store.
//!
//! Language and currency selection plus the geographic lookups that feed the
//! address form. Language is a purely local preference (callers attach it as
//! a query param); currency changes go through the server so prices come
//! back re-formatted.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use dukkan_core::{AreaId, CountryId, ZoneId};

use crate::error::ClientError;
use crate::gateway::{CallOptions, Transport, routes};
use crate::storage::{Storage, keys};
use crate::stores::{load_slice, persist_slice};

/// Default language for a fresh install.
const DEFAULT_LANGUAGE: &str = "en";

/// One server-known currency.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Currency {
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub symbol_left: String,
    #[serde(default)]
    pub symbol_right: String,
}

/// A country, for the address form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Country {
    pub country_id: CountryId,
    pub name: String,
}

/// A governorate within a country.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Zone {
    pub zone_id: ZoneId,
    pub name: String,
}

/// An area within a governorate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Area {
    pub area_id: AreaId,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct CurrencyListData {
    #[serde(default)]
    currencies: Vec<Currency>,
}

#[derive(Debug, Deserialize)]
struct CountryListData {
    #[serde(default)]
    countries: Vec<Country>,
}

#[derive(Debug, Deserialize)]
struct ZoneListData {
    #[serde(default)]
    zones: Vec<Zone>,
}

#[derive(Debug, Deserialize)]
struct AreaListData {
    #[serde(default)]
    areas: Vec<Area>,
}

/// The persisted locale slice.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedLocale {
    language: String,
    currency: Option<String>,
}

impl Default for PersistedLocale {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_owned(),
            currency: None,
        }
    }
}

/// Client-side localization state.
pub struct LocaleStore {
    gateway: Arc<dyn Transport>,
    storage: Arc<dyn Storage>,
    language: String,
    currency: Option<String>,
    currencies: Vec<Currency>,
    error: Option<String>,
}

impl LocaleStore {
    /// Create a locale store, restoring the persisted slice if present.
    #[must_use]
    pub fn new(gateway: Arc<dyn Transport>, storage: Arc<dyn Storage>) -> Self {
        let persisted: PersistedLocale =
            load_slice(storage.as_ref(), keys::LOCALE).unwrap_or_default();
        Self {
            gateway,
            storage,
            language: persisted.language,
            currency: persisted.currency,
            currencies: Vec::new(),
            error: None,
        }
    }

    /// The selected language code.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// The selected currency code, when the user has picked one.
    #[must_use]
    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    /// The last fetched currency list.
    #[must_use]
    pub fn currencies(&self) -> &[Currency] {
        &self.currencies
    }

    /// Last recorded user-facing error message.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Select a language. Local-only: callers attach it as a query param.
    pub fn set_language(&mut self, code: impl Into<String>) {
        self.language = code.into();
        self.persist();
    }

    /// Fetch the server's currency list.
    ///
    /// # Errors
    ///
    /// Records and returns the gateway error.
    #[instrument(skip(self))]
    pub async fn fetch_currencies(&mut self) -> Result<(), ClientError> {
        self.error = None;

        match self.gateway.call(routes::CURRENCIES, CallOptions::get()).await {
            Ok(data) => {
                let list: CurrencyListData = serde_json::from_value(data)?;
                self.currencies = list.currencies;
                Ok(())
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Switch the session currency on the server, then remember it locally.
    ///
    /// # Errors
    ///
    /// Records and returns the gateway error; the local selection only
    /// changes after server confirmation.
    #[instrument(skip(self), fields(code = %code))]
    pub async fn set_currency(&mut self, code: &str) -> Result<(), ClientError> {
        self.error = None;

        let payload = json!({ "code": code });
        match self
            .gateway
            .call(routes::CHANGE_CURRENCY, CallOptions::post(payload))
            .await
        {
            Ok(_) => {
                self.currency = Some(code.to_owned());
                self.persist();
                Ok(())
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Fetch the country list for the address form.
    ///
    /// # Errors
    ///
    /// Records and returns the gateway or decode error.
    #[instrument(skip(self))]
    pub async fn fetch_countries(&mut self) -> Result<Vec<Country>, ClientError> {
        self.error = None;

        match self.gateway.call(routes::COUNTRIES, CallOptions::get()).await {
            Ok(data) => {
                let list: CountryListData = serde_json::from_value(data)?;
                Ok(list.countries)
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Fetch the governorates of a country.
    ///
    /// # Errors
    ///
    /// Records and returns the gateway or decode error.
    #[instrument(skip(self), fields(country_id = %country_id))]
    pub async fn fetch_zones(&mut self, country_id: &CountryId) -> Result<Vec<Zone>, ClientError> {
        self.error = None;

        let opts = CallOptions::get().with_param("country_id", country_id.as_str());
        match self.gateway.call(routes::ZONES, opts).await {
            Ok(data) => {
                let list: ZoneListData = serde_json::from_value(data)?;
                Ok(list.zones)
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Fetch the areas of a governorate.
    ///
    /// # Errors
    ///
    /// Records and returns the gateway or decode error.
    #[instrument(skip(self), fields(zone_id = %zone_id))]
    pub async fn fetch_areas(&mut self, zone_id: &ZoneId) -> Result<Vec<Area>, ClientError> {
        self.error = None;

        let opts = CallOptions::get().with_param("zone_id", zone_id.as_str());
        match self.gateway.call(routes::AREAS, opts).await {
            Ok(data) => {
                let list: AreaListData = serde_json::from_value(data)?;
                Ok(list.areas)
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    fn fail(&mut self, err: ClientError) -> ClientError {
        self.error = Some(err.user_message());
        err
    }

    fn persist(&self) {
        let slice = PersistedLocale {
            language: self.language.clone(),
            currency: self.currency.clone(),
        };
        persist_slice(self.storage.as_ref(), keys::LOCALE, &slice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_currency_decodes() {
        let currency: Currency = serde_json::from_value(json!({
            "code": "KWD",
            "title": "Kuwaiti Dinar",
            "symbol_right": " KD"
        }))
        .unwrap();

        assert_eq!(currency.code, "KWD");
        assert_eq!(currency.symbol_left, "");
        assert_eq!(currency.symbol_right, " KD");
    }

    #[test]
    fn test_default_locale() {
        let persisted = PersistedLocale::default();
        assert_eq!(persisted.language, "en");
        assert_eq!(persisted.currency, None);
    }
}
