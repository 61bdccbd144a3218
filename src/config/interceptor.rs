//! Interceptor chains for the fetch client.
//!
//! Interceptors add cross-cutting logic to calls, such as:
//! - Adding authentication headers
//! - Logging and metrics
//! - Request/response transformation
//!
//! Each client owns three chains: the request chain transforms the
//! effective [`RequestConfig`](crate::RequestConfig) before the network
//! call, the response chain transforms the decoded
//! [`Payload`](crate::Payload), and the error chain transforms the
//! [`ClientError`](crate::ClientError) a failing call will return.
//!
//! Handlers run strictly in registration order, each receiving the output
//! of the previous. Registration returns a stable [`InterceptorId`];
//! ejecting tombstones the slot so later ids are unaffected, and ids are
//! never reused within a client's lifetime. A run snapshots the live
//! handlers at start, so ejecting a handler concurrently never affects a
//! run that has already begun.
//!
//! # Example
//!
//! ```ignore
//! let client = FetchClient::builder("http://localhost:3000").build()?;
//!
//! let id = client.interceptors().request.add_sync(|mut config| {
//!     config.headers.insert("x-trace-id", "abc123".parse().unwrap());
//!     Ok(config)
//! });
//!
//! // ... later
//! client.interceptors().request.eject(id);
//! ```

use std::future::Future;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;

use crate::ClientError;
use crate::config::RequestConfig;
use crate::response::Payload;

/// Stable handle for a registered interceptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InterceptorId(u64);

type Handler<T> = Arc<dyn Fn(T) -> BoxFuture<'static, Result<T, ClientError>> + Send + Sync>;

struct Slot<T> {
    id: u64,
    handler: Handler<T>,
}

struct Registry<T> {
    /// Tombstoned slots stay in place so ids keep their position.
    slots: Vec<Option<Slot<T>>>,
    next_id: u64,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            next_id: 0,
        }
    }
}

/// An ordered, mutable chain of transform handlers of one category.
pub struct InterceptorChain<T> {
    registry: Mutex<Registry<T>>,
}

impl<T: Send + 'static> Default for InterceptorChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> InterceptorChain<T> {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
        }
    }

    /// Register an async handler. Returns the id to [`eject`](Self::eject)
    /// it with.
    pub fn add<F, Fut>(&self, handler: F) -> InterceptorId
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        self.push(Arc::new(move |value| Box::pin(handler(value))))
    }

    /// Register a synchronous handler.
    pub fn add_sync<F>(&self, handler: F) -> InterceptorId
    where
        F: Fn(T) -> Result<T, ClientError> + Send + Sync + 'static,
    {
        self.push(Arc::new(move |value| {
            Box::pin(std::future::ready(handler(value)))
        }))
    }

    fn push(&self, handler: Handler<T>) -> InterceptorId {
        let mut registry = self.registry.lock().expect("interceptor registry poisoned");
        let id = registry.next_id;
        registry.next_id += 1;
        registry.slots.push(Some(Slot { id, handler }));
        InterceptorId(id)
    }

    /// Remove a handler. Returns whether a live handler was removed;
    /// ejecting an unknown or already-ejected id is a no-op.
    pub fn eject(&self, id: InterceptorId) -> bool {
        let mut registry = self.registry.lock().expect("interceptor registry poisoned");
        for slot in registry.slots.iter_mut() {
            if slot.as_ref().is_some_and(|s| s.id == id.0) {
                *slot = None;
                return true;
            }
        }
        false
    }

    /// Number of live handlers.
    pub fn len(&self) -> usize {
        self.registry
            .lock()
            .expect("interceptor registry poisoned")
            .slots
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot the live handlers in registration order.
    fn snapshot(&self) -> Vec<Handler<T>> {
        self.registry
            .lock()
            .expect("interceptor registry poisoned")
            .slots
            .iter()
            .filter_map(|slot| slot.as_ref().map(|s| Arc::clone(&s.handler)))
            .collect()
    }

    /// Run the chain: every live handler in registration order, each
    /// awaited before the next. A handler error aborts the chain and
    /// propagates. The handler list is snapshotted before the first
    /// handler runs.
    pub async fn run(&self, value: T) -> Result<T, ClientError> {
        let handlers = self.snapshot();
        let mut value = value;
        for handler in handlers {
            value = handler(value).await?;
        }
        Ok(value)
    }
}

impl<T> std::fmt::Debug for InterceptorChain<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.lock().expect("interceptor registry poisoned");
        let live = registry.slots.iter().filter(|slot| slot.is_some()).count();
        f.debug_struct("InterceptorChain")
            .field("live", &live)
            .field("registered", &registry.next_id)
            .finish()
    }
}

/// The three per-client interceptor chains.
#[derive(Debug, Default)]
pub struct Interceptors {
    /// Transforms the effective request configuration before the call.
    pub request: InterceptorChain<RequestConfig>,
    /// Transforms the decoded response payload (success statuses only).
    pub response: InterceptorChain<Payload>,
    /// Transforms the error a failing call will return.
    pub error: InterceptorChain<ClientError>,
}

impl Interceptors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the error chain over a failure. A handler that itself fails
    /// supplies the replacement error.
    pub(crate) async fn run_error(&self, error: ClientError) -> ClientError {
        self.error.run(error).await.unwrap_or_else(|e| e)
    }
}
