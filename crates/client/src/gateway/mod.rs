//! API gateway client.
//!
//! The backend is a REST-like JSON API addressed by query-string route
//! pseudo-paths (`?route=extension/mstore/cart|add`) and authenticated by a
//! per-device session cookie. Every response rides in the same envelope:
//!
//! ```json
//! { "success": 1, "error": [], "data": { ... } }
//! ```
//!
//! The gateway normalizes that surface: it attaches the session credential,
//! classifies transport failures (no-connectivity vs. timeout), treats
//! non-JSON payloads (HTML error pages) as server faults, and turns
//! `success: 0` into a business error carrying the first server message.
//! It never retries and never caches; stores own reconciliation.

pub mod envelope;
pub mod routes;

pub use envelope::{Envelope, ErrorMessage};

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use crate::config::ClientConfig;
use crate::session::SessionProvider;

/// Name of the session cookie the backend authenticates by.
const SESSION_COOKIE: &str = "OCSESSID";

/// Errors produced by the gateway, one variant per fault class.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No connectivity: the request never reached the server.
    #[error("no internet connection")]
    Offline,

    /// The request timed out. Retry is manual, never automatic.
    #[error("request timed out")]
    Timeout,

    /// Other transport-level failure.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The server answered with something that is not the JSON envelope
    /// (typically an HTML error page). Never parsed further.
    #[error("server returned an unexpected non-JSON response")]
    ServerFault,

    /// Business-logic failure (`success: 0`) with the server's first message.
    #[error("{0}")]
    Business(String),
}

/// HTTP method for a gateway call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
}

/// Options for a single gateway call.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// HTTP method.
    pub method: Method,
    /// JSON body for POST calls.
    pub data: Option<Value>,
    /// Extra query parameters appended after the route.
    pub params: Vec<(String, String)>,
}

impl CallOptions {
    /// A plain GET call.
    #[must_use]
    pub fn get() -> Self {
        Self::default()
    }

    /// A POST call with a JSON body.
    #[must_use]
    pub fn post(data: Value) -> Self {
        Self {
            method: Method::Post,
            data: Some(data),
            params: Vec::new(),
        }
    }

    /// Append a query parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }
}

/// Request dispatch seam between stores and the network.
///
/// Stores depend on `Arc<dyn Transport>` so tests can substitute a scripted
/// fake; [`HttpGateway`] is the production implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one call and return the envelope's `data` payload
    /// (`Value::Null` when the backend sends none).
    ///
    /// # Errors
    ///
    /// All fault classes are returned as [`GatewayError`]; nothing is
    /// swallowed at this layer.
    async fn call(&self, route: &str, opts: CallOptions) -> Result<Value, GatewayError>;
}

/// Production gateway over `reqwest`.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    session: Arc<SessionProvider>,
}

impl HttpGateway {
    /// Build a gateway from the client configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(
        config: &ClientConfig,
        session: Arc<SessionProvider>,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(GatewayError::Transport)?;

        Ok(Self {
            client,
            base_url: config.base_url.to_string(),
            session,
        })
    }
}

#[async_trait]
impl Transport for HttpGateway {
    #[instrument(skip(self, opts), fields(route = %route))]
    async fn call(&self, route: &str, opts: CallOptions) -> Result<Value, GatewayError> {
        let token = self.session.get_or_create_token();

        let mut request = match opts.method {
            Method::Get => self.client.get(&self.base_url),
            Method::Post => self.client.post(&self.base_url),
        };

        request = request
            .query(&[("route", route)])
            .query(&opts.params)
            .header(header::COOKIE, format!("{SESSION_COOKIE}={token}"));

        if let Some(data) = &opts.data {
            request = request.json(data);
        }

        let response = request.send().await.map_err(classify_transport)?;
        let body = response.text().await.map_err(classify_transport)?;

        decode_envelope(route, &body)
    }
}

/// Classify a transport failure into the gateway taxonomy.
fn classify_transport(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else if err.is_connect() {
        GatewayError::Offline
    } else {
        GatewayError::Transport(err)
    }
}

/// Decode a response body into the envelope's data payload.
///
/// An HTML error page (or any other non-JSON payload) fails envelope decoding
/// and is classified as a server fault, distinct from a `success: 0` business
/// error.
fn decode_envelope(route: &str, body: &str) -> Result<Value, GatewayError> {
    let envelope: Envelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(err) => {
            let excerpt: String = body.chars().take(200).collect();
            tracing::error!(
                route = %route,
                error = %err,
                body = %excerpt,
                "backend returned a non-JSON payload"
            );
            return Err(GatewayError::ServerFault);
        }
    };

    if envelope.success() {
        Ok(envelope.data.unwrap_or(Value::Null))
    } else {
        Err(GatewayError::Business(
            envelope
                .first_error()
                .unwrap_or_else(|| "Request failed".to_owned()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_success_with_data() {
        let data = decode_envelope("t", r#"{"success":1,"error":[],"data":{"n":7}}"#).unwrap();
        assert_eq!(data, serde_json::json!({"n": 7}));
    }

    #[test]
    fn test_decode_success_without_data_is_null() {
        let data = decode_envelope("t", r#"{"success":1}"#).unwrap();
        assert_eq!(data, Value::Null);
    }

    #[test]
    fn test_decode_business_error_takes_first_of_list() {
        let err = decode_envelope(
            "t",
            r#"{"success":0,"error":["Warning: no stock","second"]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, GatewayError::Business(msg) if msg == "Warning: no stock"));
    }

    #[test]
    fn test_decode_business_error_single_string() {
        let err = decode_envelope("t", r#"{"success":0,"error":"Invalid token"}"#).unwrap_err();
        assert!(matches!(err, GatewayError::Business(msg) if msg == "Invalid token"));
    }

    #[test]
    fn test_decode_markup_is_server_fault() {
        let err = decode_envelope("t", "<html><body>500 Internal Server Error</body></html>")
            .unwrap_err();
        assert!(matches!(err, GatewayError::ServerFault));
    }

    #[test]
    fn test_decode_business_error_without_message() {
        let err = decode_envelope("t", r#"{"success":0,"error":[]}"#).unwrap_err();
        assert!(matches!(err, GatewayError::Business(msg) if msg == "Request failed"));
    }
}
