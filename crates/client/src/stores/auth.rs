//! Auth store.
//!
//! Owns the signed-in user record and the authentication flag. The session
//! token is device identity, not user identity: login changes what the server
//! associates with the session, and logout clears local state without
//! revoking the token.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use dukkan_core::{CustomerId, Email};

use crate::error::ClientError;
use crate::gateway::{CallOptions, Transport, routes};
use crate::session::SessionProvider;
use crate::storage::{Storage, keys};
use crate::stores::{load_slice, persist_slice};

/// The signed-in user record.
///
/// Created from login/signup responses, replaced on confirmed profile
/// updates, cleared on logout. A failed server round-trip never leaves a
/// local-only mutation behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "customer_id")]
    pub id: CustomerId,
    #[serde(rename = "firstname")]
    pub first_name: String,
    #[serde(rename = "lastname")]
    pub last_name: String,
    pub email: String,
    pub telephone: String,
}

/// Partial profile update; `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
}

/// Registration form.
#[derive(Debug, Clone, Serialize)]
pub struct SignupForm {
    #[serde(rename = "firstname")]
    pub first_name: String,
    #[serde(rename = "lastname")]
    pub last_name: String,
    pub email: String,
    pub telephone: String,
    pub password: String,
}

/// Read-only view of the authentication flag for sibling stores.
///
/// The auth store is the sole writer; address and order stores only read.
#[derive(Clone, Default)]
pub struct AuthWatch(Arc<AtomicBool>);

impl AuthWatch {
    /// Whether a user is currently signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn set(&self, authenticated: bool) {
        self.0.store(authenticated, Ordering::Relaxed);
    }
}

/// Client-side authentication state.
pub struct AuthStore {
    gateway: Arc<dyn Transport>,
    storage: Arc<dyn Storage>,
    session: Arc<SessionProvider>,
    watch: AuthWatch,
    user: Option<User>,
    is_loading: bool,
    error: Option<String>,
}

impl AuthStore {
    /// Create an auth store, restoring the persisted user if present.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn Transport>,
        storage: Arc<dyn Storage>,
        session: Arc<SessionProvider>,
    ) -> Self {
        let user: Option<User> = load_slice(storage.as_ref(), keys::USER);
        let watch = AuthWatch::default();
        watch.set(user.is_some());

        Self {
            gateway,
            storage,
            session,
            watch,
            user,
            is_loading: false,
            error: None,
        }
    }

    /// A read-only handle to the authentication flag.
    #[must_use]
    pub fn watch(&self) -> AuthWatch {
        self.watch.clone()
    }

    /// The signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Whether a user is currently signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
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

    /// Sign in with email and password.
    ///
    /// The persisted session token is discarded up front: logging in with a
    /// stale token makes the backend reject the call with an invalid-session
    /// error, so a fresh identity is minted for the attempt.
    ///
    /// # Errors
    ///
    /// On failure, partial user state is cleared, the error is recorded, and
    /// the call returns it.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), ClientError> {
        Email::parse(email)?;

        self.is_loading = true;
        self.error = None;
        self.session.clear();

        let payload = json!({ "email": email, "password": password });
        let result = self
            .gateway
            .call(routes::LOGIN, CallOptions::post(payload))
            .await;
        self.is_loading = false;

        match result {
            Ok(data) => match serde_json::from_value::<User>(data) {
                Ok(user) => {
                    self.user = Some(user);
                    self.watch.set(true);
                    self.persist();
                    Ok(())
                }
                Err(err) => Err(self.fail_login(err.into())),
            },
            Err(err) => Err(self.fail_login(err.into())),
        }
    }

    /// Register a new account, then sign in with the same credentials.
    ///
    /// Signup success is determined solely by the registration call: a
    /// failing auto-login neither fails the signup nor leaves error state
    /// set (the user simply lands on the login screen).
    ///
    /// # Errors
    ///
    /// Returns the registration call's error only.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn signup(&mut self, form: &SignupForm) -> Result<(), ClientError> {
        Email::parse(&form.email)?;

        self.is_loading = true;
        self.error = None;

        let payload = serde_json::to_value(form)?;
        let result = self
            .gateway
            .call(routes::REGISTER, CallOptions::post(payload))
            .await;
        self.is_loading = false;

        match result {
            Ok(_) => {
                if self.login(&form.email, &form.password).await.is_err() {
                    self.error = None;
                }
                Ok(())
            }
            Err(err) => {
                let err = ClientError::from(err);
                self.error = Some(err.user_message());
                Err(err)
            }
        }
    }

    /// Update the profile.
    ///
    /// The backend requires the full payload even for partial updates, so the
    /// partial is merged over the current record before sending; on success
    /// the local user becomes the merge result with no re-fetch.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Unauthenticated`] when signed out, otherwise
    /// the gateway error. The local record is untouched on failure.
    #[instrument(skip(self, update))]
    pub async fn update_user(&mut self, update: UserUpdate) -> Result<(), ClientError> {
        let Some(current) = self.user.clone() else {
            return Err(ClientError::Unauthenticated);
        };

        let merged = User {
            id: current.id,
            first_name: update.first_name.unwrap_or(current.first_name),
            last_name: update.last_name.unwrap_or(current.last_name),
            email: update.email.unwrap_or(current.email),
            telephone: update.telephone.unwrap_or(current.telephone),
        };

        Email::parse(&merged.email)?;

        self.is_loading = true;
        self.error = None;

        let payload = json!({
            "firstname": merged.first_name,
            "lastname": merged.last_name,
            "email": merged.email,
            "telephone": merged.telephone,
        });
        let result = self
            .gateway
            .call(routes::EDIT_ACCOUNT, CallOptions::post(payload))
            .await;
        self.is_loading = false;

        match result {
            Ok(_) => {
                self.user = Some(merged);
                self.persist();
                Ok(())
            }
            Err(err) => {
                let err = ClientError::from(err);
                self.error = Some(err.user_message());
                Err(err)
            }
        }
    }

    /// Sign out locally.
    ///
    /// Resets the user, the auth flag, and the persisted user and address
    /// slices. The session token is deliberately NOT revoked - the device
    /// keeps its identity for guest browsing.
    pub fn logout(&mut self) {
        self.user = None;
        self.error = None;
        self.watch.set(false);
        self.storage.remove(keys::USER);
        self.storage.remove(keys::ADDRESSES);
    }

    fn fail_login(&mut self, err: ClientError) -> ClientError {
        self.user = None;
        self.watch.set(false);
        self.storage.remove(keys::USER);
        self.error = Some(err.user_message());
        err
    }

    fn persist(&self) {
        if let Some(user) = &self.user {
            persist_slice(self.storage.as_ref(), keys::USER, user);
        }
    }
}
