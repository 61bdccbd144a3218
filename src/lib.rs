//! Typed HTTP fetch client for Rust.
//!
//! This crate provides a small, composable HTTP client built around four
//! ideas:
//!
//! - **Merged configuration**: client-wide defaults (base URL, headers,
//!   query parameters, timeout, retry policy) merged field-by-field under
//!   per-call overrides, without mutating either side.
//! - **Interceptor chains**: per-client registries of async transforms for
//!   the outgoing request configuration, the decoded response payload, and
//!   the error a failing call returns. Handlers run strictly in
//!   registration order and can be ejected by id.
//! - **Schema-validated responses**: decoded payloads can be checked
//!   against a pluggable [`Schema`] (a compiled JSON Schema via the
//!   `json-schema` feature, or any closure); validation failures carry
//!   structured issues and the raw payload.
//! - **Typed decoding**: responses deserialize into any
//!   `serde::de::DeserializeOwned` type; use [`Payload`] directly for
//!   binary or unknown shapes.
//!
//! ## Example
//!
//! ```ignore
//! use typefetch::FetchClient;
//! use serde::Deserialize;
//! use std::time::Duration;
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u32,
//!     name: String,
//! }
//!
//! let client = FetchClient::builder("https://api.example.com")
//!     .header("authorization", "Bearer token123")
//!     .timeout(Duration::from_secs(30))
//!     .build()?;
//!
//! // GET with typed decoding
//! let user = client.get::<User>("/users/1").await?;
//! println!("{} ({})", user.name, user.status());
//!
//! // POST a JSON body
//! let created = client
//!     .post::<User, _>("/users", serde_json::json!({"name": "New User"}))
//!     .await?;
//! assert_eq!(created.status(), 201);
//! ```
//!
//! ## Interceptors
//!
//! ```ignore
//! let client = FetchClient::builder("https://api.example.com").build()?;
//!
//! // Attach a header to every request
//! let id = client.interceptors().request.add_sync(|mut config| {
//!     config.headers.insert("x-trace-id", "abc123".parse().unwrap());
//!     Ok(config)
//! });
//!
//! // Remove it later
//! client.interceptors().request.eject(id);
//! ```
//!
//! ## Schema validation
//!
//! ```ignore
//! use typefetch::{ClientConfig, JsonSchema};
//! use serde_json::{Value, json};
//!
//! let schema = JsonSchema::compile(&json!({
//!     "type": "object",
//!     "required": ["id", "name"],
//! }))?;
//!
//! let result = client
//!     .get_with_options::<Value>("/users/1", ClientConfig::new().schema(schema))
//!     .await;
//!
//! if let Err(e) = result {
//!     // e.to_string() == "Validation failed"
//!     for issue in e.issues() {
//!         eprintln!("{issue}");
//!     }
//!     eprintln!("raw payload: {:?}", e.raw_payload());
//! }
//! ```
//!
//! ## Errors
//!
//! Every failure — connection errors, timeouts, non-2xx statuses, decode
//! failures, schema mismatches — is returned as a [`ClientError`] variant;
//! the call surface never panics. Timeouts are raced against the combined
//! send-and-read of each call, and dropping the losing branch aborts the
//! in-flight request.
//!
//! ## Retries
//!
//! Retries are opt-in: configure a [`RetryPolicy`] on the client or a call
//! and transient failures (transport errors, timeouts, 429/502/503/504)
//! are retried with exponential backoff and jitter. Without a policy no
//! request is ever retransmitted.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `tls` | yes | rustls with native root certificates |
//! | `json-schema` | yes | [`JsonSchema`] adapter over the `jsonschema` crate |
//! | `tracing` | no | span per request, retry debug events |

mod builder;
mod client;
pub mod config;
mod error;
pub mod request;
pub mod response;
pub mod schema;
pub mod transport;

pub use builder::{ClientBuildError, ClientBuilder};
pub use client::FetchClient;
pub use error::ClientError;

// Re-export from config module
pub use config::interceptor::{InterceptorChain, InterceptorId, Interceptors};
pub use config::retry::{ExponentialBackoff, RetryPolicy, retry, retry_with_policy};
pub use config::{ClientConfig, QueryParams, RequestConfig};

// Re-export from request module
pub use request::Body;

// Re-export from response module
pub use response::{FetchResponse, Payload};

// Re-export from schema module
#[cfg(feature = "json-schema")]
pub use schema::JsonSchema;
pub use schema::{Schema, SchemaFn, SchemaIssue};

// Re-export transport types at the top level for convenience
pub use transport::{HttpTransport, HttpTransportBuilder};

// Re-export types that users need at call sites
pub use bytes::Bytes;
pub use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
