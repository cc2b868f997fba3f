//! Catalog store.
//!
//! Read-side browsing: product listings, product detail, and the menu/content
//! blocks that drive the home screen. Nothing here is persisted - catalog
//! data is cheap to re-fetch and goes stale quickly.

use std::sync::Arc;

use serde::Deserialize;
use tracing::instrument;

use dukkan_core::{CategoryId, ProductId};

use crate::error::ClientError;
use crate::gateway::envelope::{lenient_bool, lenient_opt_u32};
use crate::gateway::{CallOptions, Transport, routes};

/// One product in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductSummary {
    pub product_id: ProductId,
    pub name: String,
    /// Currency-formatted price string.
    pub price: String,
    /// Currency-formatted sale price, when on offer.
    #[serde(default)]
    pub special: Option<String>,
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub in_stock: bool,
}

/// Full product detail.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductDetail {
    pub product_id: ProductId,
    pub name: String,
    /// Currency-formatted price string.
    pub price: String,
    #[serde(default)]
    pub special: Option<String>,
    /// Raw HTML description; rendering is the view layer's problem.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub in_stock: bool,
    #[serde(default, deserialize_with = "lenient_opt_u32")]
    pub minimum: Option<u32>,
    #[serde(default, deserialize_with = "lenient_opt_u32")]
    pub maximum: Option<u32>,
}

/// One menu/content block entry, possibly nested.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MenuEntry {
    pub category_id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub children: Vec<MenuEntry>,
}

/// Listing query parameters.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub category: Option<CategoryId>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Server-defined sort key (e.g. `p.price`, `p.date_added`).
    pub sort: Option<String>,
}

impl ProductQuery {
    fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(category) = &self.category {
            params.push(("category".to_owned(), category.as_str().to_owned()));
        }
        if let Some(search) = &self.search {
            params.push(("search".to_owned(), search.clone()));
        }
        if let Some(page) = self.page {
            params.push(("page".to_owned(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_owned(), limit.to_string()));
        }
        if let Some(sort) = &self.sort {
            params.push(("sort".to_owned(), sort.clone()));
        }
        params
    }
}

#[derive(Debug, Deserialize)]
struct ProductListData {
    #[serde(default)]
    products: Vec<ProductSummary>,
}

#[derive(Debug, Deserialize)]
struct MenuData {
    #[serde(default)]
    categories: Vec<MenuEntry>,
}

/// Client-side catalog browsing state.
pub struct CatalogStore {
    gateway: Arc<dyn Transport>,
    products: Vec<ProductSummary>,
    menu: Vec<MenuEntry>,
    is_loading: bool,
    error: Option<String>,
}

impl CatalogStore {
    /// Create a catalog store.
    #[must_use]
    pub fn new(gateway: Arc<dyn Transport>) -> Self {
        Self {
            gateway,
            products: Vec::new(),
            menu: Vec::new(),
            is_loading: false,
            error: None,
        }
    }

    /// The last fetched listing.
    #[must_use]
    pub fn products(&self) -> &[ProductSummary] {
        &self.products
    }

    /// The last fetched menu.
    #[must_use]
    pub fn menu(&self) -> &[MenuEntry] {
        &self.menu
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

    /// Fetch a product listing.
    ///
    /// # Errors
    ///
    /// Records and returns the gateway error; the previous listing stays.
    #[instrument(skip(self, query))]
    pub async fn fetch_products(&mut self, query: &ProductQuery) -> Result<(), ClientError> {
        self.is_loading = true;
        self.error = None;

        let mut opts = CallOptions::get();
        opts.params = query.params();
        let result = self.gateway.call(routes::PRODUCTS, opts).await;
        self.is_loading = false;

        match result {
            Ok(data) => {
                let list: ProductListData = serde_json::from_value(data)?;
                self.products = list.products;
                Ok(())
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Fetch one product's detail.
    ///
    /// # Errors
    ///
    /// Records and returns the gateway or decode error.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn fetch_product(&mut self, id: &ProductId) -> Result<ProductDetail, ClientError> {
        self.error = None;

        let opts = CallOptions::get().with_param("product_id", id.as_str());
        match self.gateway.call(routes::PRODUCT_DETAIL, opts).await {
            Ok(data) => Ok(serde_json::from_value(data)?),
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Fetch the menu/content blocks.
    ///
    /// # Errors
    ///
    /// Records and returns the gateway error; the previous menu stays.
    #[instrument(skip(self))]
    pub async fn fetch_menu(&mut self) -> Result<(), ClientError> {
        self.error = None;

        match self.gateway.call(routes::MENU, CallOptions::get()).await {
            Ok(data) => {
                let menu: MenuData = serde_json::from_value(data)?;
                self.menu = menu.categories;
                Ok(())
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    fn fail(&mut self, err: ClientError) -> ClientError {
        self.error = Some(err.user_message());
        err
    }
}
