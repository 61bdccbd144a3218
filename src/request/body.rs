//! Request body representation and encoding.
//!
//! Encoding follows content negotiation rules: JSON values serialize with
//! `serde_json` and claim `application/json` unless the caller already set
//! a content type; text bodies destined for JSON are sent as-is when they
//! already parse as JSON and are wrapped into a JSON string otherwise;
//! form and byte payloads pass through unchanged.

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

use crate::ClientError;

/// A request body.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    /// A JSON value, serialized with `serde_json` at send time.
    Json(Value),
    /// A text payload. Subject to the pre-serialized-JSON check when the
    /// effective content type is JSON (or unset).
    Text(String),
    /// URL-encoded form fields.
    Form(Vec<(String, String)>),
    /// Raw bytes, passed through unchanged.
    Bytes(Bytes),
}

impl Body {
    /// Serialize any `Serialize` value into a JSON body.
    pub fn json<T: Serialize>(value: &T) -> Result<Body, ClientError> {
        serde_json::to_value(value)
            .map(Body::Json)
            .map_err(|e| ClientError::Encode(format!("JSON encoding failed: {e}")))
    }

    /// Build a form body from key/value pairs.
    pub fn form<K, V, I>(fields: I) -> Body
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Body::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Encode the body into wire bytes.
    ///
    /// `content_type` is the caller-provided `content-type` header, if any.
    /// Returns the encoded bytes plus the default content type to set when
    /// the caller did not set one (`None` means leave the header absent).
    pub(crate) fn encode(
        &self,
        content_type: Option<&str>,
    ) -> Result<(Bytes, Option<&'static str>), ClientError> {
        match self {
            Body::Json(value) => {
                let bytes = serde_json::to_vec(value)
                    .map_err(|e| ClientError::Encode(format!("JSON encoding failed: {e}")))?;
                Ok((Bytes::from(bytes), Some("application/json")))
            }
            Body::Text(text) => {
                let json_destined = match content_type {
                    Some(ct) => {
                        crate::response::is_json_media_type(&essence(ct))
                    }
                    None => true,
                };
                if !json_destined {
                    return Ok((Bytes::from(text.clone()), None));
                }
                // Pre-serialized JSON goes out untouched; anything else is
                // wrapped into a JSON string so the wire body always parses.
                if serde_json::from_str::<serde::de::IgnoredAny>(text).is_ok() {
                    Ok((Bytes::from(text.clone()), Some("application/json")))
                } else {
                    let bytes = serde_json::to_vec(text)
                        .map_err(|e| ClientError::Encode(format!("JSON encoding failed: {e}")))?;
                    Ok((Bytes::from(bytes), Some("application/json")))
                }
            }
            Body::Form(fields) => {
                let mut serializer = form_urlencoded::Serializer::new(String::new());
                for (key, value) in fields {
                    serializer.append_pair(key, value);
                }
                Ok((
                    Bytes::from(serializer.finish()),
                    Some("application/x-www-form-urlencoded"),
                ))
            }
            Body::Bytes(bytes) => Ok((bytes.clone(), None)),
        }
    }
}

fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(Bytes::from(bytes))
    }
}
