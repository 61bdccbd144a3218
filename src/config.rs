//! Client and request configuration.
//!
//! [`ClientConfig`] holds the client-wide defaults and doubles as the
//! per-call override set; [`RequestConfig`] is the effective per-call
//! configuration produced by [`ClientConfig::merge`] plus the call's URL,
//! method, and body. Merging is field-by-field and never mutates either
//! input: scalars from the override win when present, header and query
//! maps merge key-wise with override keys winning.

pub mod interceptor;
pub mod retry;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue, Method};

use crate::config::retry::RetryPolicy;
use crate::request::Body;
use crate::schema::Schema;

/// Query parameters for a request.
///
/// An ordered map; entries with a `None` value are omitted from the
/// composed query string (callers use them to suppress an inherited
/// default parameter).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: BTreeMap<String, Option<String>>,
}

impl QueryParams {
    /// Create an empty parameter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, stringifying the value.
    pub fn set<K: Into<String>, V: ToString>(&mut self, key: K, value: V) -> &mut Self {
        self.entries.insert(key.into(), Some(value.to_string()));
        self
    }

    /// Mark a parameter as unset: the entry overrides an inherited default
    /// but produces nothing in the query string.
    pub fn unset<K: Into<String>>(&mut self, key: K) -> &mut Self {
        self.entries.insert(key.into(), None);
        self
    }

    /// Remove an entry entirely.
    pub fn remove(&mut self, key: &str) -> Option<Option<String>> {
        self.entries.remove(key)
    }

    /// Look up a parameter value.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.entries.get(key).map(|v| v.as_deref())
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Number of entries (including unset markers).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge another map into this one, other's keys winning.
    pub fn merge(&mut self, other: &QueryParams) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (key, value) in iter {
            params.set(key, value);
        }
        params
    }
}

/// Client-wide default configuration, also used for per-call overrides.
///
/// Values left unset inherit: at merge time an unset override field falls
/// back to the client default, and an unset default falls back to the
/// crate's behavior (no base URL, no timeout, no retries, JSON parsing on).
#[derive(Clone, Default)]
pub struct ClientConfig {
    /// Base URL prepended to request paths.
    pub base_url: Option<String>,
    /// Headers applied to every request. Names are normalized to
    /// lowercase by the `http` crate; merge is override-wins per name.
    pub headers: HeaderMap,
    /// Query parameters applied to every request.
    pub params: QueryParams,
    /// Total time budget for a call (send + body read). `None` or zero
    /// means no timeout.
    pub timeout: Option<Duration>,
    /// Retry policy for transient failures. `None` means no retries.
    pub retry: Option<RetryPolicy>,
    /// Whether JSON content types are parsed (`None` means yes).
    pub parse_json: Option<bool>,
    /// Schema the decoded response is validated against.
    pub schema: Option<Arc<dyn Schema>>,
}

impl ClientConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL.
    pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Add a header.
    ///
    /// # Panics
    ///
    /// Panics if the header name or value is invalid. Use [`try_header`]
    /// for fallible insertion.
    ///
    /// [`try_header`]: Self::try_header
    pub fn header<K, V>(mut self, name: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        K::Error: std::fmt::Debug,
        V: TryInto<HeaderValue>,
        V::Error: std::fmt::Debug,
    {
        let name = name.try_into().expect("invalid header name");
        let value = value.try_into().expect("invalid header value");
        self.headers.insert(name, value);
        self
    }

    /// Try to add a header, returning `None` if the name or value is
    /// invalid.
    pub fn try_header<K, V>(mut self, name: K, value: V) -> Option<Self>
    where
        K: TryInto<HeaderName>,
        V: TryInto<HeaderValue>,
    {
        let name = name.try_into().ok()?;
        let value = value.try_into().ok()?;
        self.headers.insert(name, value);
        Some(self)
    }

    /// Add a query parameter.
    pub fn param<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.set(key, value);
        self
    }

    /// Suppress an inherited query parameter.
    pub fn unset_param<K: Into<String>>(mut self, key: K) -> Self {
        self.params.unset(key);
        self
    }

    /// Set the call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enable retries with the given policy.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Control JSON parsing of responses.
    pub fn parse_json(mut self, parse: bool) -> Self {
        self.parse_json = Some(parse);
        self
    }

    /// Set the response schema.
    pub fn schema<S: Schema + 'static>(mut self, schema: S) -> Self {
        self.schema = Some(Arc::new(schema));
        self
    }

    /// Merge a per-call override set over these defaults.
    ///
    /// Neither input is mutated. Scalar override fields win when present;
    /// header and parameter maps merge key-wise with override keys winning.
    pub fn merge(&self, overrides: &ClientConfig) -> ClientConfig {
        let mut headers = self.headers.clone();
        for (name, value) in overrides.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }
        let mut params = self.params.clone();
        params.merge(&overrides.params);

        ClientConfig {
            base_url: overrides.base_url.clone().or_else(|| self.base_url.clone()),
            headers,
            params,
            timeout: overrides.timeout.or(self.timeout),
            retry: overrides.retry.clone().or_else(|| self.retry.clone()),
            parse_json: overrides.parse_json.or(self.parse_json),
            schema: overrides.schema.clone().or_else(|| self.schema.clone()),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .field("params", &self.params)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("parse_json", &self.parse_json)
            .field("schema", &self.schema.is_some())
            .finish()
    }
}

/// Effective configuration for a single request.
///
/// Produced by merging client defaults with per-call overrides; the
/// request interceptor chain receives and may transform it. Discarded
/// when the call completes.
#[derive(Clone)]
pub struct RequestConfig {
    /// Request path, joined onto `base_url`.
    pub url: String,
    /// HTTP method.
    pub method: Method,
    /// Request body, if any.
    pub body: Option<Body>,
    pub base_url: Option<String>,
    pub headers: HeaderMap,
    pub params: QueryParams,
    pub timeout: Option<Duration>,
    pub retry: Option<RetryPolicy>,
    pub parse_json: Option<bool>,
    pub schema: Option<Arc<dyn Schema>>,
}

impl RequestConfig {
    /// Create a bare request configuration.
    pub fn new<S: Into<String>>(method: Method, url: S) -> Self {
        Self {
            url: url.into(),
            method,
            body: None,
            base_url: None,
            headers: HeaderMap::new(),
            params: QueryParams::new(),
            timeout: None,
            retry: None,
            parse_json: None,
            schema: None,
        }
    }

    /// Build the effective configuration for a call.
    pub fn merged(
        defaults: &ClientConfig,
        overrides: &ClientConfig,
        method: Method,
        url: &str,
        body: Option<Body>,
    ) -> Self {
        let merged = defaults.merge(overrides);
        Self {
            url: url.to_string(),
            method,
            body,
            base_url: merged.base_url,
            headers: merged.headers,
            params: merged.params,
            timeout: merged.timeout,
            retry: merged.retry,
            parse_json: merged.parse_json,
            schema: merged.schema,
        }
    }

    /// Set the request body.
    pub fn body<B: Into<Body>>(mut self, body: B) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Add a header.
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
        let name = name.try_into().expect("invalid header name");
        let value = value.try_into().expect("invalid header value");
        self.headers.insert(name, value);
        self
    }

    /// Add a query parameter.
    pub fn param<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.set(key, value);
        self
    }

    /// Set the base URL.
    pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the response schema.
    pub fn schema<S: Schema + 'static>(mut self, schema: S) -> Self {
        self.schema = Some(Arc::new(schema));
        self
    }

    /// Set the call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl std::fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestConfig")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("body", &self.body)
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .field("params", &self.params)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("parse_json", &self.parse_json)
            .field("schema", &self.schema.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_does_not_mutate_inputs() {
        let defaults = ClientConfig::new()
            .base_url("http://a.com")
            .header("x-default", "1")
            .param("page", 1);
        let overrides = ClientConfig::new().header("x-call", "2").param("q", "rust");

        let merged = defaults.merge(&overrides);

        // Inputs unchanged.
        assert_eq!(defaults.headers.len(), 1);
        assert_eq!(defaults.params.len(), 1);
        assert_eq!(overrides.headers.len(), 1);
        assert!(overrides.base_url.is_none());

        // Result is the union.
        assert_eq!(merged.base_url.as_deref(), Some("http://a.com"));
        assert_eq!(merged.headers.get("x-default").unwrap(), "1");
        assert_eq!(merged.headers.get("x-call").unwrap(), "2");
        assert_eq!(merged.params.get("page"), Some(Some("1")));
        assert_eq!(merged.params.get("q"), Some(Some("rust")));
    }

    #[test]
    fn test_merge_override_wins_per_key() {
        let defaults = ClientConfig::new()
            .header("authorization", "Bearer default")
            .param("limit", 10)
            .timeout(Duration::from_secs(30));
        let overrides = ClientConfig::new()
            .header("authorization", "Bearer call")
            .param("limit", 50)
            .timeout(Duration::from_secs(5));

        let merged = defaults.merge(&overrides);
        assert_eq!(merged.headers.get("authorization").unwrap(), "Bearer call");
        assert_eq!(merged.params.get("limit"), Some(Some("50")));
        assert_eq!(merged.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_merge_scalars_inherit_when_absent() {
        let defaults = ClientConfig::new()
            .base_url("http://a.com")
            .timeout(Duration::from_secs(30))
            .parse_json(false);
        let merged = defaults.merge(&ClientConfig::new());

        assert_eq!(merged.base_url.as_deref(), Some("http://a.com"));
        assert_eq!(merged.timeout, Some(Duration::from_secs(30)));
        assert_eq!(merged.parse_json, Some(false));
    }

    #[test]
    fn test_merged_request_config_carries_call_parts() {
        let defaults = ClientConfig::new().base_url("http://a.com");
        let config = RequestConfig::merged(
            &defaults,
            &ClientConfig::new(),
            Method::POST,
            "/users",
            Some(Body::from("{}")),
        );
        assert_eq!(config.method, Method::POST);
        assert_eq!(config.url, "/users");
        assert!(config.body.is_some());
        assert_eq!(config.base_url.as_deref(), Some("http://a.com"));
    }

    #[test]
    fn test_unset_param_overrides_default() {
        let defaults = ClientConfig::new().param("trace", "on");
        let overrides = ClientConfig::new().unset_param("trace");
        let merged = defaults.merge(&overrides);
        assert_eq!(merged.params.get("trace"), Some(None));
    }

    #[test]
    fn test_query_params_from_iterator() {
        let params: QueryParams = [("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(params.get("a"), Some(Some("1")));
        assert_eq!(params.get("b"), Some(Some("2")));
    }
}
