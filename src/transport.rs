//! HTTP transport layer.
//!
//! This module provides [`HttpTransport`], the connection layer under the
//! fetch client, built on hyper_util's legacy client. It supports:
//!
//! - HTTP/1.1 and HTTP/2 with automatic protocol negotiation via ALPN
//! - TLS with rustls and native root certificates (default `tls` feature)
//! - Connection pooling
//!
//! # Example
//!
//! ```ignore
//! use typefetch::transport::HttpTransport;
//! use std::time::Duration;
//!
//! let transport = HttpTransport::builder()
//!     .pool_idle_timeout(Duration::from_secs(60))
//!     .build()?;
//!
//! let client = FetchClient::builder("https://api.example.com")
//!     .transport(transport)
//!     .build()?;
//! ```

use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::{TokioExecutor, TokioTimer};

use crate::ClientError;

#[cfg(feature = "tls")]
type Connector = hyper_rustls::HttpsConnector<HttpConnector>;
#[cfg(not(feature = "tls"))]
type Connector = HttpConnector;

type PooledClient = Client<Connector, Full<Bytes>>;

/// Pooled HTTP transport.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HttpTransport {
    client: PooledClient,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Create a new transport builder.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::new()
    }

    /// Create a transport with default settings.
    pub fn new() -> Result<Self, ClientError> {
        Self::builder().build()
    }

    /// Send an HTTP request and receive the response head and body stream.
    pub async fn request(
        &self,
        request: http::Request<Full<Bytes>>,
    ) -> Result<http::Response<Incoming>, ClientError> {
        self.client
            .request(request)
            .await
            .map_err(|e| ClientError::Transport(format!("request failed: {e}")))
    }
}

/// Builder for [`HttpTransport`].
pub struct HttpTransportBuilder {
    /// Connection pool idle timeout.
    pool_idle_timeout: Option<Duration>,
    /// Maximum idle connections per host.
    pool_max_idle_per_host: usize,
    /// Custom TLS configuration.
    #[cfg(feature = "tls")]
    tls_config: Option<rustls::ClientConfig>,
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransportBuilder {
    /// Create a new transport builder with default settings.
    pub fn new() -> Self {
        Self {
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
            #[cfg(feature = "tls")]
            tls_config: None,
        }
    }

    /// Set the connection pool idle timeout.
    ///
    /// Connections idle for longer than this are closed and removed from
    /// the pool. Default: 90 seconds.
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Disable the connection pool idle timeout.
    pub fn pool_idle_timeout_none(mut self) -> Self {
        self.pool_idle_timeout = None;
        self
    }

    /// Set the maximum number of idle connections per host.
    ///
    /// Default: 32.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Set a custom TLS configuration.
    ///
    /// Use this for custom root certificates or client certificates for
    /// mTLS. When unset, the platform's native roots are loaded.
    #[cfg(feature = "tls")]
    pub fn tls_config(mut self, config: rustls::ClientConfig) -> Self {
        self.tls_config = Some(config);
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<HttpTransport, ClientError> {
        let connector = self.build_connector()?;

        let mut builder = Client::builder(TokioExecutor::new());
        // Pool timer is required for pool_idle_timeout to take effect.
        builder.pool_timer(TokioTimer::new());
        if let Some(timeout) = self.pool_idle_timeout {
            builder.pool_idle_timeout(timeout);
        }
        builder.pool_max_idle_per_host(self.pool_max_idle_per_host);

        Ok(HttpTransport {
            client: builder.build(connector),
        })
    }

    #[cfg(feature = "tls")]
    fn build_connector(&self) -> Result<Connector, ClientError> {
        let builder = hyper_rustls::HttpsConnectorBuilder::new();
        let builder = match &self.tls_config {
            Some(config) => builder.with_tls_config(config.clone()),
            None => builder
                .with_native_roots()
                .map_err(|e| ClientError::Build(format!("failed to load native TLS roots: {e}")))?,
        };
        Ok(builder.https_or_http().enable_all_versions().build())
    }

    #[cfg(not(feature = "tls"))]
    fn build_connector(&self) -> Result<Connector, ClientError> {
        Ok(HttpConnector::new())
    }
}

impl std::fmt::Debug for HttpTransportBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("HttpTransportBuilder");
        s.field("pool_idle_timeout", &self.pool_idle_timeout)
            .field("pool_max_idle_per_host", &self.pool_max_idle_per_host);
        #[cfg(feature = "tls")]
        s.field("tls_config", &self.tls_config.is_some());
        s.finish()
    }
}
