//! Pluggable response schema validation.
//!
//! The request pipeline validates decoded payloads against a [`Schema`] when
//! one is configured. The trait is the minimal capability the pipeline
//! depends on: a parse operation that either returns a validated (possibly
//! coerced) value or reports structured field-level issues. Any validator
//! that can express itself this way plugs in; two adapters ship with the
//! crate:
//!
//! - [`JsonSchema`] (feature `json-schema`, enabled by default): wraps a
//!   compiled JSON Schema from the `jsonschema` crate.
//! - [`SchemaFn`]: wraps an arbitrary closure, for hand-rolled checks or
//!   bridging other validation libraries.
//!
//! # Example
//!
//! ```ignore
//! use typefetch::{FetchClient, JsonSchema};
//! use serde_json::json;
//!
//! let user_schema = JsonSchema::compile(&json!({
//!     "type": "object",
//!     "required": ["id", "name"],
//!     "properties": {
//!         "id": {"type": "integer"},
//!         "name": {"type": "string"}
//!     }
//! }))?;
//!
//! let client = FetchClient::builder("https://api.example.com")
//!     .schema(user_schema)
//!     .build()?;
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// A single structured validation issue.
///
/// `path` is a JSON-pointer-style location within the validated value
/// (empty for issues about the root value).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SchemaIssue {
    pub path: String,
    pub message: String,
}

impl SchemaIssue {
    /// Create a new issue at the given path.
    pub fn new<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Capability contract for response validators.
///
/// `parse` either returns the validated value (adapters may coerce or
/// transform it) or the full list of issues found. The request pipeline
/// turns a non-empty issue list into a `Validation` error carrying the raw
/// payload alongside the issues.
pub trait Schema: Send + Sync {
    fn parse(&self, input: &Value) -> Result<Value, Vec<SchemaIssue>>;
}

impl<S: Schema + ?Sized> Schema for Arc<S> {
    fn parse(&self, input: &Value) -> Result<Value, Vec<SchemaIssue>> {
        (**self).parse(input)
    }
}

/// Adapter wrapping a closure as a [`Schema`].
///
/// # Example
///
/// ```ignore
/// use typefetch::{SchemaFn, SchemaIssue};
/// use serde_json::Value;
///
/// let non_empty_array = SchemaFn::new(|value: &Value| match value.as_array() {
///     Some(items) if !items.is_empty() => Ok(value.clone()),
///     _ => Err(vec![SchemaIssue::new("", "expected a non-empty array")]),
/// });
/// ```
pub struct SchemaFn<F> {
    parse: F,
}

impl<F> SchemaFn<F>
where
    F: Fn(&Value) -> Result<Value, Vec<SchemaIssue>> + Send + Sync,
{
    /// Create a new schema from a closure.
    pub fn new(parse: F) -> Self {
        Self { parse }
    }
}

impl<F> Schema for SchemaFn<F>
where
    F: Fn(&Value) -> Result<Value, Vec<SchemaIssue>> + Send + Sync,
{
    fn parse(&self, input: &Value) -> Result<Value, Vec<SchemaIssue>> {
        (self.parse)(input)
    }
}

impl<F> fmt::Debug for SchemaFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaFn").finish()
    }
}

/// A compiled JSON Schema validator.
///
/// Validation collects every violation, not just the first, so the
/// resulting issue list mirrors the full shape mismatch.
#[cfg(feature = "json-schema")]
pub struct JsonSchema {
    validator: jsonschema::Validator,
}

#[cfg(feature = "json-schema")]
impl JsonSchema {
    /// Compile a JSON Schema document.
    ///
    /// Returns a `Build` error if the document itself is not a valid schema.
    pub fn compile(schema: &Value) -> Result<Self, crate::ClientError> {
        let validator = jsonschema::validator_for(schema)
            .map_err(|e| crate::ClientError::Build(format!("invalid JSON schema: {e}")))?;
        Ok(Self { validator })
    }
}

#[cfg(feature = "json-schema")]
impl Schema for JsonSchema {
    fn parse(&self, input: &Value) -> Result<Value, Vec<SchemaIssue>> {
        let issues: Vec<SchemaIssue> = self
            .validator
            .iter_errors(input)
            .map(|e| SchemaIssue::new(e.instance_path().to_string(), e.to_string()))
            .collect();
        if issues.is_empty() {
            Ok(input.clone())
        } else {
            Err(issues)
        }
    }
}

#[cfg(feature = "json-schema")]
impl fmt::Debug for JsonSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchema").finish_non_exhaustive()
    }
}
