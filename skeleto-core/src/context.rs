// Execution context and the canonical handler shape

use crate::error::BoxError;
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

/// Per-invocation context handed to action handlers.
///
/// Interceptors may stash values in `data` (an open transaction, the
/// authenticated user) for the handlers they wrap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub data: Map<String, Value>,
    pub trace_id: String,
    pub date: DateTime<Utc>,
}

impl Context {
    /// Fresh context with a random trace id, stamped now.
    pub fn new() -> Self {
        Self {
            data: Map::new(),
            trace_id: Uuid::new_v4().to_string(),
            date: Utc::now(),
        }
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = trace_id.into();
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.data.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// Handler taking a context and a request payload, producing a response payload.
pub type ActionHandler =
    Arc<dyn Fn(Context, Value) -> BoxFuture<'static, Result<Value, BoxError>> + Send + Sync>;

/// Wrap an async function as an [`ActionHandler`].
///
/// ```
/// use skeleto_core::context::{action, Context};
/// use skeleto_core::error::BoxError;
/// use serde_json::json;
///
/// let hello = action(|_ctx, req| async move {
///     Ok::<_, BoxError>(json!({ "greeting": format!("hello {}", req["name"].as_str().unwrap_or("?")) }))
/// });
///
/// let res = tokio_test::block_on(hello(Context::new(), json!({ "name": "ada" }))).unwrap();
/// assert_eq!(res["greeting"], "hello ada");
/// ```
pub fn action<F, Fut>(f: F) -> ActionHandler
where
    F: Fn(Context, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, BoxError>> + Send + 'static,
{
    Arc::new(
        move |ctx: Context, req: Value| -> BoxFuture<'static, Result<Value, BoxError>> {
            Box::pin(f(ctx, req))
        },
    )
}
