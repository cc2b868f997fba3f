//! Test harness for store flow tests.
//!
//! Stores depend on `Arc<dyn Transport>` and `Arc<dyn Storage>`, so flows are
//! exercised against a scripted [`FakeTransport`] and in-memory storage - no
//! network, no filesystem. The fake replays queued per-route responses in
//! order and records every call it receives, which is what the checkout and
//! cart properties assert against.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use dukkan_client::{
    CallOptions, GatewayError, MemoryStorage, SessionProvider, Storage, Storefront, Transport,
};

/// One call the fake transport received.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub route: String,
    pub data: Option<Value>,
}

/// Scripted transport double.
///
/// Responses are queued per route and consumed in FIFO order; a call to a
/// route with no queued response panics, which turns an unexpected network
/// call into a test failure.
#[derive(Default)]
pub struct FakeTransport {
    scripts: Mutex<HashMap<String, VecDeque<Result<Value, GatewayError>>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeTransport {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a successful response (the envelope's `data` payload).
    pub fn respond(&self, route: &str, data: Value) {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(route.to_owned())
            .or_default()
            .push_back(Ok(data));
    }

    /// Queue a gateway failure.
    pub fn fail(&self, route: &str, err: GatewayError) {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(route.to_owned())
            .or_default()
            .push_back(Err(err));
    }

    /// Every routed call so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Routes called so far, in order.
    #[must_use]
    pub fn routes(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.route).collect()
    }

    /// How many calls hit a route.
    #[must_use]
    pub fn count(&self, route: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.route == route)
            .count()
    }

    /// The JSON body of the most recent call to a route.
    #[must_use]
    pub fn last_payload(&self, route: &str) -> Option<Value> {
        self.calls()
            .into_iter()
            .rev()
            .find(|call| call.route == route)
            .and_then(|call| call.data)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn call(&self, route: &str, opts: CallOptions) -> Result<Value, GatewayError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                route: route.to_owned(),
                data: opts.data,
            });

        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(route)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| panic!("unscripted call to route {route}"))
    }
}

/// A fully wired storefront over fake collaborators.
pub struct Harness {
    pub transport: Arc<FakeTransport>,
    pub storage: Arc<MemoryStorage>,
    pub session: Arc<SessionProvider>,
    pub store: Storefront,
}

impl Harness {
    #[must_use]
    pub fn new() -> Self {
        let transport = FakeTransport::new();
        let storage = Arc::new(MemoryStorage::new());
        let session = Arc::new(SessionProvider::new(
            Arc::clone(&storage) as Arc<dyn Storage>
        ));
        let store = Storefront::with_parts(
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&storage) as Arc<dyn Storage>,
            Arc::clone(&session),
        );

        Self {
            transport,
            storage,
            session,
            store,
        }
    }

    /// Script and perform a successful login for `nora@example.com`.
    pub async fn sign_in(&mut self) {
        self.transport.respond(
            dukkan_client::gateway::routes::LOGIN,
            serde_json::json!({
                "customer_id": "7",
                "firstname": "Nora",
                "lastname": "Hasan",
                "email": "nora@example.com",
                "telephone": "+96550000000"
            }),
        );
        self.store
            .auth
            .login("nora@example.com", "correct horse")
            .await
            .expect("scripted login should succeed");
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
