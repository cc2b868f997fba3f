//! Unified client error handling.
//!
//! Every store operation returns `Result<T, ClientError>`. The taxonomy
//! mirrors what the UI needs to distinguish: transport faults are retryable
//! by hand, server faults get a generic try-again message, business errors
//! surface verbatim, and validation errors never reach the network at all.

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::storage::StorageError;

/// Application-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Gateway call failed (transport, server, or business fault).
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Local pre-submit validation rejected the input.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Invalid email address.
    #[error("invalid email: {0}")]
    Email(#[from] dukkan_core::EmailError),

    /// Operation requires a signed-in user.
    #[error("not signed in")]
    Unauthenticated,

    /// A success payload did not decode into the expected shape.
    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    /// Local persistence failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ClientError {
    /// The message shown to the user for this failure.
    ///
    /// Business errors pass through verbatim; everything unexpected collapses
    /// into a generic retry-later message so internals never leak into the UI.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Gateway(GatewayError::Offline) => {
                "No internet connection. Check your network and try again.".to_owned()
            }
            Self::Gateway(GatewayError::Timeout) => {
                "The request timed out. Please try again.".to_owned()
            }
            Self::Gateway(GatewayError::ServerFault | GatewayError::Transport(_))
            | Self::Decode(_) => "Something went wrong. Please try again later.".to_owned(),
            Self::Gateway(GatewayError::Business(message)) => message.clone(),
            Self::Unauthenticated => "Please sign in to continue.".to_owned(),
            Self::Validation(err) => err.to_string(),
            Self::Email(err) => err.to_string(),
            Self::Storage(_) => "Could not save data on this device.".to_owned(),
        }
    }
}

/// Pre-submit field validation failures.
///
/// Advisory UI gating only - the server remains the authority - but a
/// validation failure blocks the network call entirely.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A mandatory field is empty.
    #[error("{0} is required")]
    Required(&'static str),

    /// Full name must split into at least a first and last name.
    #[error("please enter your first and last name")]
    FullName,

    /// Cart quantities never go below one; remove the line instead.
    #[error("quantity cannot go below 1")]
    QuantityFloor,

    /// Referenced cart line does not exist locally.
    #[error("item is no longer in the cart")]
    UnknownCartLine,
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;
