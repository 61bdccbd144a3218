//! Error types for fetch client operations.
//!
//! This module provides [`ClientError`], the error type for every failure a
//! request can produce. The public call surface never panics: all failure
//! paths are captured as a `ClientError` and returned through the `Result`
//! arm of the call envelope.

use std::time::Duration;

use http::{HeaderMap, StatusCode};
use serde_json::Value;

use crate::response::Payload;
use crate::schema::SchemaIssue;

/// Client-side request error variants.
///
/// Callers branch on the `Result` returned by the client; inspecting the
/// variant tells them which stage of the pipeline failed. `Validation`
/// preserves the raw (unvalidated) payload for debugging schema mismatches.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error (connection refused, DNS failure, reset, etc.).
    #[error("transport error: {0}")]
    Transport(String),

    /// The configured timeout elapsed before the response arrived.
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The server answered with a non-success HTTP status.
    ///
    /// Carries the decoded response body so callers can inspect error
    /// payloads without a second request.
    #[error("HTTP status {status}")]
    Status {
        status: StatusCode,
        headers: HeaderMap,
        body: Payload,
    },

    /// Request body serialization error.
    #[error("encode error: {0}")]
    Encode(String),

    /// Response body parsing error (malformed JSON, invalid text encoding).
    #[error("decode error: {0}")]
    Decode(String),

    /// The decoded response did not satisfy the declared schema.
    #[error("Validation failed")]
    Validation {
        status: StatusCode,
        issues: Vec<SchemaIssue>,
        raw: Value,
    },

    /// Invalid request construction (bad URL, bad header value).
    #[error("build error: {0}")]
    Build(String),
}

impl ClientError {
    /// The HTTP status associated with this error, if one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } | ClientError::Validation { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Structured validation issues (empty for non-validation errors).
    pub fn issues(&self) -> &[SchemaIssue] {
        match self {
            ClientError::Validation { issues, .. } => issues,
            _ => &[],
        }
    }

    /// The raw payload preserved by a validation failure.
    pub fn raw_payload(&self) -> Option<&Value> {
        match self {
            ClientError::Validation { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// The decoded response body carried by a status failure.
    pub fn status_body(&self) -> Option<&Payload> {
        match self {
            ClientError::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Whether this error represents a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Timeout(_))
    }

    /// Returns whether this error indicates a transient condition that may
    /// be resolved by retrying.
    ///
    /// Transport failures and timeouts are retryable, as are the throttling
    /// and gateway statuses 429, 502, 503, and 504. Encode/decode/validation
    /// failures are deterministic and never retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(_) | ClientError::Timeout(_) => true,
            ClientError::Status { status, .. } => matches!(
                status.as_u16(),
                429 | 502 | 503 | 504
            ),
            _ => false,
        }
    }
}
