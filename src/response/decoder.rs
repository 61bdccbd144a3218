//! Response body decoding.
//!
//! Decoding is driven by the response `content-type`: JSON media types
//! decode to [`Payload::Json`], `text/*` to [`Payload::Text`], and anything
//! else is kept as an opaque [`Payload::Binary`]. Setting `parse_json: false`
//! on the request configuration skips JSON parsing and yields text instead.

use bytes::Bytes;
use serde_json::Value;

use crate::ClientError;

/// A decoded response body.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// Body decoded from a JSON media type. An empty JSON body decodes to
    /// `Value::Null` rather than an error.
    Json(Value),
    /// Body decoded from a `text/*` media type.
    Text(String),
    /// Opaque body bytes for any other media type.
    Binary(Bytes),
}

impl Payload {
    /// Decode body bytes according to the response content type.
    ///
    /// `parse_json: false` downgrades JSON media types to text decoding.
    /// A missing content type is treated as opaque binary.
    pub fn decode(
        content_type: Option<&str>,
        parse_json: bool,
        bytes: Bytes,
    ) -> Result<Payload, ClientError> {
        let essence = content_type.map(media_essence);

        match essence.as_deref() {
            Some(ct) if is_json_media_type(ct) => {
                if parse_json {
                    if bytes.is_empty() {
                        return Ok(Payload::Json(Value::Null));
                    }
                    serde_json::from_slice(&bytes)
                        .map(Payload::Json)
                        .map_err(|e| ClientError::Decode(format!("malformed JSON body: {e}")))
                } else {
                    decode_text(bytes)
                }
            }
            Some(ct) if ct.starts_with("text/") => decode_text(bytes),
            _ => Ok(Payload::Binary(bytes)),
        }
    }

    /// The payload as a JSON value, if it was decoded as JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }

    /// The payload as text, if it was decoded as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The payload as raw bytes, if it was kept opaque.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Payload::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Convert into a JSON value for validation or typed decoding.
    ///
    /// Text becomes a JSON string; binary payloads have no JSON
    /// representation and return `None`.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Payload::Json(value) => Some(value.clone()),
            Payload::Text(text) => Some(Value::String(text.clone())),
            Payload::Binary(_) => None,
        }
    }
}

fn decode_text(bytes: Bytes) -> Result<Payload, ClientError> {
    String::from_utf8(bytes.to_vec())
        .map(Payload::Text)
        .map_err(|e| ClientError::Decode(format!("invalid UTF-8 in text body: {e}")))
}

/// Strip media-type parameters (`; charset=...`) and lowercase.
fn media_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// `application/json` and structured-syntax suffixes like
/// `application/problem+json`.
pub(crate) fn is_json_media_type(essence: &str) -> bool {
    essence == "application/json" || essence.ends_with("+json")
}
