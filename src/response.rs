//! Response types for the fetch client.
//!
//! This module provides the [`FetchResponse`] envelope which wraps the
//! decoded response value together with the HTTP status and response
//! headers, and the [`Payload`] body model.

use http::{HeaderMap, StatusCode};
use std::ops::Deref;

mod decoder;

pub use decoder::Payload;
pub(crate) use decoder::is_json_media_type;

/// Success envelope for fetch client calls.
///
/// Contains the response value along with the HTTP status and headers of
/// the response that produced it.
///
/// # Example
///
/// ```ignore
/// let response = client.get::<User>("/users/1").await?;
///
/// // Access the value directly via Deref
/// println!("Name: {}", response.name);
///
/// // Or take it apart
/// let (user, status, headers) = response.into_parts();
/// ```
#[derive(Debug, Clone)]
pub struct FetchResponse<T> {
    /// The decoded (and, when a schema is configured, validated) value.
    data: T,
    /// HTTP status of the response.
    status: StatusCode,
    /// Response headers.
    headers: HeaderMap,
}

impl<T> FetchResponse<T> {
    /// Create a new response envelope.
    pub fn new(data: T, status: StatusCode, headers: HeaderMap) -> Self {
        Self {
            data,
            status,
            headers,
        }
    }

    /// Extract the inner value, discarding status and headers.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Get a reference to the inner value.
    pub fn get_ref(&self) -> &T {
        &self.data
    }

    /// The HTTP status of the response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Decompose into value, status, and headers.
    pub fn into_parts(self) -> (T, StatusCode, HeaderMap) {
        (self.data, self.status, self.headers)
    }

    /// Transform the inner value, preserving status and headers.
    pub fn map<U, F>(self, f: F) -> FetchResponse<U>
    where
        F: FnOnce(T) -> U,
    {
        FetchResponse {
            data: f(self.data),
            status: self.status,
            headers: self.headers,
        }
    }
}

impl<T> Deref for FetchResponse<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<T> AsRef<T> for FetchResponse<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}
