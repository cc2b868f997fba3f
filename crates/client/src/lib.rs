//! Dukkan storefront client library.
//!
//! The state synchronization layer for the Dukkan mobile storefront. Screens
//! and navigation live elsewhere; this crate owns everything between the UI
//! and the remote commerce backend:
//!
//! - [`session`] - per-device session identity (the cookie credential)
//! - [`gateway`] - request dispatch, envelope normalization, fault taxonomy
//! - [`stores`] - persisted domain stores (auth, cart, addresses, orders,
//!   catalog, locale) that reconcile local state with server snapshots
//! - [`checkout`] - the fixed five-step order placement sequence
//!
//! The backend is the source of truth for everything it owns: after any
//! mutating call the affected store re-fetches the authoritative snapshot
//! rather than trusting item-level response data.
//!
//! # Example
//!
//! ```rust,ignore
//! use dukkan_client::{ClientConfig, Storefront};
//!
//! let config = ClientConfig::from_env()?;
//! let mut store = Storefront::new(&config)?;
//!
//! store.cart.get_cart().await?;
//! store.cart.add_to_cart(&"42".into(), 2).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod config;
pub mod error;
pub mod gateway;
pub mod session;
pub mod storage;
pub mod stores;

pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, ValidationError};
pub use gateway::{CallOptions, GatewayError, HttpGateway, Method, Transport};
pub use session::SessionProvider;
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};

use std::sync::Arc;

use stores::address::AddressStore;
use stores::auth::AuthStore;
use stores::cart::CartStore;
use stores::catalog::CatalogStore;
use stores::locale::LocaleStore;
use stores::orders::OrdersStore;

/// Fully wired client: one store per remote-mirrored state slice, all sharing
/// a single gateway and session identity.
pub struct Storefront {
    pub auth: AuthStore,
    pub cart: CartStore,
    pub addresses: AddressStore,
    pub orders: OrdersStore,
    pub catalog: CatalogStore,
    pub locale: LocaleStore,
}

impl Storefront {
    /// Wire up the full store graph against the real HTTP gateway and
    /// file-backed persistence.
    ///
    /// # Errors
    ///
    /// Returns an error if no data directory can be resolved or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let storage: Arc<dyn Storage> = match &config.data_dir {
            Some(dir) => Arc::new(FileStorage::new(dir.clone())),
            None => Arc::new(FileStorage::at_default_dir()?),
        };
        let session = Arc::new(SessionProvider::new(Arc::clone(&storage)));
        let gateway: Arc<dyn Transport> =
            Arc::new(HttpGateway::new(config, Arc::clone(&session))?);

        let fresh_install = storage.get(storage::keys::LOCALE).is_none();
        let mut storefront = Self::with_parts(gateway, storage, session);
        if fresh_install {
            storefront.locale.set_language(config.language.clone());
        }
        Ok(storefront)
    }

    /// Wire up the store graph against explicit collaborators.
    ///
    /// Tests substitute a scripted transport and in-memory storage here.
    #[must_use]
    pub fn with_parts(
        gateway: Arc<dyn Transport>,
        storage: Arc<dyn Storage>,
        session: Arc<SessionProvider>,
    ) -> Self {
        let auth = AuthStore::new(Arc::clone(&gateway), Arc::clone(&storage), session);
        let watch = auth.watch();

        Self {
            cart: CartStore::new(Arc::clone(&gateway), Arc::clone(&storage)),
            addresses: AddressStore::new(Arc::clone(&gateway), Arc::clone(&storage), watch.clone()),
            orders: OrdersStore::new(Arc::clone(&gateway), Arc::clone(&storage), watch),
            catalog: CatalogStore::new(Arc::clone(&gateway)),
            locale: LocaleStore::new(gateway, storage),
            auth,
        }
    }
}
