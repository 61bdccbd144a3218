//! Client builder for the fetch client.
//!
//! Provides a fluent API for configuring and building a [`FetchClient`].

use std::time::Duration;

use crate::client::FetchClient;
use crate::config::ClientConfig;
use crate::config::retry::RetryPolicy;
use crate::schema::Schema;
use crate::transport::HttpTransport;
use http::{HeaderName, HeaderValue};

/// Builder for creating a [`FetchClient`].
///
/// # Example
///
/// ```ignore
/// use typefetch::FetchClient;
/// use std::time::Duration;
///
/// let client = FetchClient::builder("https://api.example.com")
///     .header("authorization", "Bearer token123")
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
pub struct ClientBuilder {
    /// Client-wide defaults.
    defaults: ClientConfig,
    /// Optional pre-configured transport.
    transport: Option<HttpTransport>,
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("defaults", &self.defaults)
            .field("transport", &self.transport.is_some())
            .finish()
    }
}

impl ClientBuilder {
    /// Create a new ClientBuilder with the given base URL.
    ///
    /// The base URL should include the scheme and host, e.g.,
    /// "https://api.example.com".
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            defaults: ClientConfig::new().base_url(base_url),
            transport: None,
        }
    }

    /// Create a builder without a base URL (per-call configurations must
    /// provide absolute URLs).
    pub fn from_config(defaults: ClientConfig) -> Self {
        Self {
            defaults,
            transport: None,
        }
    }

    /// Use a pre-configured transport.
    ///
    /// This allows configuring TLS, connection pooling, etc. on the
    /// underlying HTTP engine.
    pub fn transport(mut self, transport: HttpTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Add a default header applied to every request.
    ///
    /// # Panics
    ///
    /// Panics if the header name or value is invalid.
    pub fn header<K, V>(mut self, name: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        K::Error: std::fmt::Debug,
        V: TryInto<HeaderValue>,
        V::Error: std::fmt::Debug,
    {
        self.defaults = self.defaults.header(name, value);
        self
    }

    /// Add a default query parameter applied to every request.
    pub fn param<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.defaults = self.defaults.param(key, value);
        self
    }

    /// Set the default timeout for calls.
    ///
    /// The timeout covers sending the request and reading the response
    /// body. Individual calls can override it.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.defaults = self.defaults.timeout(timeout);
        self
    }

    /// Enable retries for transient failures with the given policy.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.defaults = self.defaults.retry(policy);
        self
    }

    /// Control whether JSON content types are parsed (default: yes).
    pub fn parse_json(mut self, parse: bool) -> Self {
        self.defaults = self.defaults.parse_json(parse);
        self
    }

    /// Set a default response schema applied to every request.
    pub fn schema<S: Schema + 'static>(mut self, schema: S) -> Self {
        self.defaults = self.defaults.schema(schema);
        self
    }

    /// Build the FetchClient.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP transport cannot be created.
    pub fn build(self) -> Result<FetchClient, ClientBuildError> {
        let transport = match self.transport {
            Some(t) => t,
            None => HttpTransport::new()
                .map_err(|e| ClientBuildError::Transport(e.to_string()))?,
        };
        Ok(FetchClient::new(transport, self.defaults))
    }
}

/// Error type for client building failures.
#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    /// Failed to create the HTTP transport.
    #[error("failed to create HTTP transport: {0}")]
    Transport(String),
}
