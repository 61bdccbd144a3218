//! Fetch client implementation.
//!
//! This module provides the main [`FetchClient`] type. A call flows through
//! the pipeline: merge configuration, run the request interceptor chain,
//! compose the URL, encode the body, send over the pooled transport (raced
//! against the configured timeout), decode the body by content type, run
//! the response interceptor chain, validate against the schema when one is
//! configured, and deserialize into the caller's type. Every failure along
//! the way is routed through the error interceptor chain and returned as a
//! [`ClientError`]; the public surface never panics.

use bytes::Bytes;
use http::{Method, header};
use http_body_util::{BodyExt, Full};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::builder::ClientBuilder;
use crate::config::interceptor::Interceptors;
use crate::config::{ClientConfig, RequestConfig};
use crate::error::ClientError;
use crate::request::{append_query, join_url};
use crate::response::{FetchResponse, Payload};
use crate::transport::HttpTransport;

/// Typed HTTP fetch client.
///
/// Cheap to clone; clones share the transport pool, the immutable
/// defaults, and the interceptor registries.
///
/// # Example
///
/// ```ignore
/// use typefetch::FetchClient;
/// use serde_json::Value;
///
/// let client = FetchClient::builder("https://api.example.com").build()?;
///
/// let user = client.get::<Value>("/users/1").await?;
/// println!("status={} body={}", user.status(), user.get_ref());
/// ```
#[derive(Clone, Debug)]
pub struct FetchClient {
    /// HTTP transport.
    transport: HttpTransport,
    /// Client-wide defaults, merged under every call's overrides.
    defaults: ClientConfig,
    /// Request/response/error interceptor chains.
    interceptors: Arc<Interceptors>,
}

impl FetchClient {
    /// Create a new ClientBuilder with the given base URL.
    ///
    /// Convenience for `ClientBuilder::new(base_url)`.
    pub fn builder<S: Into<String>>(base_url: S) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    /// Create a new FetchClient.
    ///
    /// Called by [`ClientBuilder::build`]. Prefer the builder API.
    pub(crate) fn new(transport: HttpTransport, defaults: ClientConfig) -> Self {
        Self {
            transport,
            defaults,
            interceptors: Arc::new(Interceptors::new()),
        }
    }

    /// The client-wide default configuration.
    pub fn defaults(&self) -> &ClientConfig {
        &self.defaults
    }

    /// The interceptor chains of this client instance.
    pub fn interceptors(&self) -> &Interceptors {
        &self.interceptors
    }

    /// Perform a GET request.
    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<FetchResponse<T>, ClientError> {
        self.get_with_options(url, ClientConfig::new()).await
    }

    /// Perform a GET request with per-call configuration overrides.
    pub async fn get_with_options<T: DeserializeOwned>(
        &self,
        url: &str,
        options: ClientConfig,
    ) -> Result<FetchResponse<T>, ClientError> {
        self.request(RequestConfig::merged(
            &self.defaults,
            &options,
            Method::GET,
            url,
            None,
        ))
        .await
    }

    /// Perform a DELETE request.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<FetchResponse<T>, ClientError> {
        self.delete_with_options(url, ClientConfig::new()).await
    }

    /// Perform a DELETE request with per-call configuration overrides.
    pub async fn delete_with_options<T: DeserializeOwned>(
        &self,
        url: &str,
        options: ClientConfig,
    ) -> Result<FetchResponse<T>, ClientError> {
        self.request(RequestConfig::merged(
            &self.defaults,
            &options,
            Method::DELETE,
            url,
            None,
        ))
        .await
    }

    /// Perform a POST request with a body.
    pub async fn post<T: DeserializeOwned, B: Into<crate::Body>>(
        &self,
        url: &str,
        body: B,
    ) -> Result<FetchResponse<T>, ClientError> {
        self.post_with_options(url, body, ClientConfig::new()).await
    }

    /// Perform a POST request with a body and per-call overrides.
    pub async fn post_with_options<T: DeserializeOwned, B: Into<crate::Body>>(
        &self,
        url: &str,
        body: B,
        options: ClientConfig,
    ) -> Result<FetchResponse<T>, ClientError> {
        self.request(RequestConfig::merged(
            &self.defaults,
            &options,
            Method::POST,
            url,
            Some(body.into()),
        ))
        .await
    }

    /// Perform a PUT request with a body.
    pub async fn put<T: DeserializeOwned, B: Into<crate::Body>>(
        &self,
        url: &str,
        body: B,
    ) -> Result<FetchResponse<T>, ClientError> {
        self.put_with_options(url, body, ClientConfig::new()).await
    }

    /// Perform a PUT request with a body and per-call overrides.
    pub async fn put_with_options<T: DeserializeOwned, B: Into<crate::Body>>(
        &self,
        url: &str,
        body: B,
        options: ClientConfig,
    ) -> Result<FetchResponse<T>, ClientError> {
        self.request(RequestConfig::merged(
            &self.defaults,
            &options,
            Method::PUT,
            url,
            Some(body.into()),
        ))
        .await
    }

    /// Perform a PATCH request with a body.
    pub async fn patch<T: DeserializeOwned, B: Into<crate::Body>>(
        &self,
        url: &str,
        body: B,
    ) -> Result<FetchResponse<T>, ClientError> {
        self.patch_with_options(url, body, ClientConfig::new())
            .await
    }

    /// Perform a PATCH request with a body and per-call overrides.
    pub async fn patch_with_options<T: DeserializeOwned, B: Into<crate::Body>>(
        &self,
        url: &str,
        body: B,
        options: ClientConfig,
    ) -> Result<FetchResponse<T>, ClientError> {
        self.request(RequestConfig::merged(
            &self.defaults,
            &options,
            Method::PATCH,
            url,
            Some(body.into()),
        ))
        .await
    }

    /// Execute a fully assembled request configuration and deserialize the
    /// result.
    ///
    /// The configuration is used as given; client defaults are merged by
    /// the method helpers, not here.
    pub async fn request<T: DeserializeOwned>(
        &self,
        config: RequestConfig,
    ) -> Result<FetchResponse<T>, ClientError> {
        let response = self.request_raw(config).await?;
        let (payload, status, headers) = response.into_parts();
        match decode_typed(payload) {
            Ok(data) => Ok(FetchResponse::new(data, status, headers)),
            Err(e) => Err(self.interceptors.run_error(e).await),
        }
    }

    /// Execute a request and return the decoded payload without typed
    /// deserialization.
    ///
    /// Use this for binary responses or when the payload shape is not
    /// known up front.
    pub async fn request_raw(
        &self,
        config: RequestConfig,
    ) -> Result<FetchResponse<Payload>, ClientError> {
        let result = match config.retry.clone() {
            None => self.perform(config).await,
            Some(policy) => {
                if let Err(msg) = policy.validate() {
                    Err(ClientError::Build(format!("invalid retry policy: {msg}")))
                } else {
                    let mut backoff = policy.backoff();
                    loop {
                        match self.perform(config.clone()).await {
                            Ok(response) => break Ok(response),
                            Err(e) if e.is_retryable() && backoff.can_retry() => {
                                let delay = backoff.next_delay();
                                #[cfg(feature = "tracing")]
                                tracing::debug!(
                                    error = %e,
                                    attempt = backoff.attempts(),
                                    delay_ms = delay.as_millis(),
                                    "retrying after transient error"
                                );
                                tokio::time::sleep(delay).await;
                            }
                            Err(e) => break Err(e),
                        }
                    }
                }
            }
        };

        match result {
            Ok(response) => Ok(response),
            Err(e) => Err(self.interceptors.run_error(e).await),
        }
    }

    /// One attempt of the request pipeline.
    async fn perform(
        &self,
        mut config: RequestConfig,
    ) -> Result<FetchResponse<Payload>, ClientError> {
        // Schema is validation metadata, not a transport parameter; take
        // it out before interceptors see the configuration.
        let schema = config.schema.take();

        let config = self.interceptors.request.run(config).await?;

        let url = append_query(
            &join_url(config.base_url.as_deref().unwrap_or(""), &config.url),
            &config.params,
        );

        let mut headers = config.headers.clone();
        let body_bytes = match &config.body {
            Some(body) => {
                let content_type = headers
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned);
                let (bytes, default_type) = body.encode(content_type.as_deref())?;
                if let Some(default_type) = default_type {
                    if !headers.contains_key(header::CONTENT_TYPE) {
                        headers.insert(
                            header::CONTENT_TYPE,
                            header::HeaderValue::from_static(default_type),
                        );
                    }
                }
                bytes
            }
            None => Bytes::new(),
        };

        let uri: http::Uri = url
            .parse()
            .map_err(|e| ClientError::Build(format!("invalid request URL {url:?}: {e}")))?;
        if uri.scheme().is_none() {
            return Err(ClientError::Build(format!(
                "request URL is not absolute: {url:?}"
            )));
        }

        let mut builder = http::Request::builder().method(config.method.clone()).uri(uri);
        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }
        let request = builder
            .body(Full::new(body_bytes))
            .map_err(|e| ClientError::Build(format!("failed to build request: {e}")))?;

        // Send and read the body under one timeout; the expiring race
        // drops the in-flight call, which aborts it.
        let exchange = async {
            let response = self.transport.request(request).await?;
            let status = response.status();
            let headers = response.headers().clone();
            let bytes = response
                .into_body()
                .collect()
                .await
                .map_err(|e| ClientError::Transport(format!("failed to read response body: {e}")))?
                .to_bytes();
            Ok::<_, ClientError>((status, headers, bytes))
        };

        #[cfg(feature = "tracing")]
        let exchange = {
            use tracing::Instrument;
            exchange.instrument(tracing::info_span!(
                "http.request",
                http.method = %config.method,
                http.url = %url,
                otel.kind = "client",
            ))
        };

        let (status, response_headers, body_bytes) =
            match config.timeout.filter(|t| !t.is_zero()) {
                Some(t) => tokio::time::timeout(t, exchange)
                    .await
                    .map_err(|_| ClientError::Timeout(t))??,
                None => exchange.await?,
            };

        let content_type = response_headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());
        let parse_json = config.parse_json.unwrap_or(true);

        let payload = match Payload::decode(content_type, parse_json, body_bytes.clone()) {
            Ok(payload) => payload,
            // A status failure wins over a malformed error body; keep the
            // raw bytes for inspection.
            Err(_) if !status.is_success() => Payload::Binary(body_bytes),
            Err(e) => return Err(e),
        };

        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                headers: response_headers,
                body: payload,
            });
        }

        let payload = self.interceptors.response.run(payload).await?;

        let payload = match schema {
            Some(schema) => {
                let value = payload.to_value().ok_or_else(|| {
                    ClientError::Decode(
                        "binary payload cannot be validated against a schema".into(),
                    )
                })?;
                match schema.parse(&value) {
                    Ok(valid) => Payload::Json(valid),
                    Err(issues) => {
                        return Err(ClientError::Validation {
                            status,
                            issues,
                            raw: value,
                        });
                    }
                }
            }
            None => payload,
        };

        Ok(FetchResponse::new(payload, status, response_headers))
    }
}

/// Deserialize a decoded payload into the caller's type.
fn decode_typed<T: DeserializeOwned>(payload: Payload) -> Result<T, ClientError> {
    let value = payload.to_value().ok_or_else(|| {
        ClientError::Decode("binary payload cannot be decoded into a typed value".into())
    })?;
    serde_json::from_value(value)
        .map_err(|e| ClientError::Decode(format!("response did not match the expected type: {e}")))
}
