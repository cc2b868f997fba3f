//! Response envelope and lenient wire decoders.
//!
//! The backend wraps every response in `{ success, error?, data? }` but is
//! sloppy about scalar types: `success` arrives as `1`, `"1"`, or `true`;
//! `error` as a single string or a list; numbers inside payloads as either
//! bare or string-wrapped. All of that tolerance lives here so the rest of
//! the crate only sees clean types.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// The backend's response envelope: `{ success: 0|1, error?, data? }`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    /// Business success flag.
    #[serde(default)]
    pub success: Flag,
    /// Error message or list of messages.
    #[serde(default)]
    pub error: Option<ErrorMessage>,
    /// Operation payload; shape varies per route.
    #[serde(default)]
    pub data: Option<Value>,
}

impl Envelope {
    /// Whether the backend reported business success.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.success.0
    }

    /// The first error message, when one was sent.
    ///
    /// When the backend sends a list, callers always surface the first
    /// element; empty strings and empty lists count as no message.
    #[must_use]
    pub fn first_error(&self) -> Option<String> {
        self.error
            .as_ref()
            .and_then(ErrorMessage::first)
            .map(str::to_owned)
    }
}

/// A boolean flag that may arrive as a bool, an integer, or a numeric string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flag(pub bool);

impl<'de> Deserialize<'de> for Flag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Int(i64),
            Str(String),
        }

        let raw = Raw::deserialize(deserializer)?;
        Ok(Self(match raw {
            Raw::Bool(b) => b,
            Raw::Int(n) => n != 0,
            Raw::Str(s) => s.trim() == "1" || s.eq_ignore_ascii_case("true"),
        }))
    }
}

/// Error payload: a single message or a list of messages.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

impl ErrorMessage {
    /// The first non-empty message, if any.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::One(message) => (!message.is_empty()).then_some(message.as_str()),
            Self::Many(messages) => messages
                .iter()
                .map(String::as_str)
                .find(|message| !message.is_empty()),
        }
    }
}

/// Deserialize a quantity that may be a number or a string-wrapped number.
///
/// Use with `#[serde(deserialize_with = "lenient_u32")]`.
pub fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u32),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Deserialize an optional quantity that may be absent, a number, or a
/// string-wrapped number. Unparseable strings decode as `None`.
pub fn lenient_opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u32),
        Str(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Num(n)) => Some(n),
        Some(Raw::Str(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// Deserialize a flag field into a plain bool.
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Flag::deserialize(deserializer).map(|flag| flag.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_accepts_int_string_and_bool() {
        for body in [
            r#"{"success":1}"#,
            r#"{"success":"1"}"#,
            r#"{"success":true}"#,
        ] {
            let envelope: Envelope = serde_json::from_str(body).unwrap();
            assert!(envelope.success(), "{body}");
        }

        for body in [
            r#"{"success":0}"#,
            r#"{"success":"0"}"#,
            r#"{"success":false}"#,
            r"{}",
        ] {
            let envelope: Envelope = serde_json::from_str(body).unwrap();
            assert!(!envelope.success(), "{body}");
        }
    }

    #[test]
    fn test_error_single_string() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"success":0,"error":"Invalid password"}"#).unwrap();
        assert_eq!(envelope.first_error().as_deref(), Some("Invalid password"));
    }

    #[test]
    fn test_error_list_surfaces_first() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"success":0,"error":["first","second"]}"#).unwrap();
        assert_eq!(envelope.first_error().as_deref(), Some("first"));
    }

    #[test]
    fn test_error_skips_empty_strings() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"success":0,"error":["","real"]}"#).unwrap();
        assert_eq!(envelope.first_error().as_deref(), Some("real"));
    }

    #[test]
    fn test_lenient_u32() {
        #[derive(Deserialize)]
        struct Line {
            #[serde(deserialize_with = "lenient_u32")]
            quantity: u32,
        }

        let bare: Line = serde_json::from_str(r#"{"quantity":2}"#).unwrap();
        let wrapped: Line = serde_json::from_str(r#"{"quantity":"2"}"#).unwrap();
        assert_eq!(bare.quantity, 2);
        assert_eq!(wrapped.quantity, 2);
    }

    #[test]
    fn test_lenient_opt_u32_unparseable_is_none() {
        #[derive(Deserialize)]
        struct Line {
            #[serde(default, deserialize_with = "lenient_opt_u32")]
            maximum: Option<u32>,
        }

        let junk: Line = serde_json::from_str(r#"{"maximum":"n/a"}"#).unwrap();
        assert_eq!(junk.maximum, None);

        let missing: Line = serde_json::from_str(r"{}").unwrap();
        assert_eq!(missing.maximum, None);
    }
}
