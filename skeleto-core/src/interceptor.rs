// Interceptors wrapping handler instances

use crate::context::{ActionHandler, Context};
use crate::error::BoxError;
use crate::loader::Instance;
use crate::logging::{debug, trace};
use crate::ComponentDescriptor;
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;

type WrapFn = dyn Fn(Instance, &ComponentDescriptor) -> Instance + Send + Sync;

/// Runtime value of an Interceptor component.
///
/// An interceptor receives a handler instance with its descriptor and returns
/// the instance to use in its place, usually a wrapper around it. Interceptor
/// constructors return an `Interceptor` from the implementation loader.
#[derive(Clone)]
pub struct Interceptor {
    wrap: Arc<WrapFn>,
}

impl Interceptor {
    pub fn new<F>(wrap: F) -> Self
    where
        F: Fn(Instance, &ComponentDescriptor) -> Instance + Send + Sync + 'static,
    {
        Self { wrap: Arc::new(wrap) }
    }

    /// Interceptor for [`ActionHandler`]s; other instances pass through unchanged.
    ///
    /// ```
    /// use skeleto_core::context::ActionHandler;
    /// use skeleto_core::interceptor::Interceptor;
    ///
    /// // wrap only handlers carrying @Transaction
    /// let transactional = Interceptor::for_actions(|handler: ActionHandler, descriptor| {
    ///     if descriptor.has_annotation("Transaction") {
    ///         // open a transaction around `handler` here
    ///     }
    ///     handler
    /// });
    /// # let _ = transactional;
    /// ```
    pub fn for_actions<F>(wrap: F) -> Self
    where
        F: Fn(ActionHandler, &ComponentDescriptor) -> ActionHandler + Send + Sync + 'static,
    {
        Self::new(move |instance, descriptor| match instance.downcast::<ActionHandler>() {
            Ok(handler) => {
                let wrapped: Instance = Arc::new(wrap(ActionHandler::clone(&handler), descriptor));
                wrapped
            }
            Err(other) => other,
        })
    }

    /// Logs every action invocation with its trace id and outcome.
    pub fn logging() -> Self {
        Self::for_actions(|handler, descriptor| {
            let name = descriptor.name.clone();
            let logged: ActionHandler = Arc::new(move |ctx: Context, req: Value| -> BoxFuture<'static, Result<Value, BoxError>> {
                let handler = handler.clone();
                let name = name.clone();
                Box::pin(async move {
                    let start = std::time::Instant::now();
                    let trace_id = ctx.trace_id.clone();
                    debug!(handler = %name, trace_id = %trace_id, "→ invoking action");

                    let result = handler(ctx, req).await;

                    let elapsed = start.elapsed();
                    match &result {
                        Ok(_) => debug!(handler = %name, trace_id = %trace_id, elapsed = ?elapsed, "← action completed"),
                        Err(e) => debug!(handler = %name, trace_id = %trace_id, elapsed = ?elapsed, error = %e, "← action failed"),
                    }
                    result
                })
            });
            logged
        })
    }

    pub fn apply(&self, instance: Instance, descriptor: &ComponentDescriptor) -> Instance {
        (self.wrap)(instance, descriptor)
    }
}

impl std::fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Interceptor")
    }
}

struct Link {
    name: String,
    ordinal: i64,
    scan_index: usize,
    interceptor: Interceptor,
}

/// Interceptors in application order: ascending ordinal, ties by scan order.
#[derive(Default)]
pub struct InterceptorChain {
    links: Vec<Link>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, ordinal: i64, scan_index: usize, interceptor: Interceptor) {
        let name = name.into();
        trace!(interceptor = %name, ordinal, scan_index, "Adding interceptor to chain");
        self.links.push(Link {
            name,
            ordinal,
            scan_index,
            interceptor,
        });
        self.links.sort_by_key(|link| (link.ordinal, link.scan_index));
    }

    /// Interceptor names in application order.
    pub fn names(&self) -> Vec<&str> {
        self.links.iter().map(|link| link.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Run `handler` through every interceptor; each one wraps the previous result.
    pub fn apply(&self, handler: Instance, descriptor: &ComponentDescriptor) -> Instance {
        self.links.iter().fold(handler, |result, link| {
            trace!(handler = %descriptor.name, interceptor = %link.name, "Applying interceptor");
            link.interceptor.apply(result, descriptor)
        })
    }
}
