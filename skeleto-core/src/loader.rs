// Implementation loading for declarations

use crate::error::BoxError;
use crate::logging::{debug, trace};
use crate::Declaration;
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// A constructed component: a resource, an interceptor or a handler.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Resolved instances of a declaration's parameters, in declaration order.
#[derive(Clone, Default)]
pub struct Dependencies {
    names: Vec<String>,
    instances: Vec<Instance>,
}

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, identity: impl Into<String>, instance: Instance) {
        self.names.push(identity.into());
        self.instances.push(instance);
    }

    /// Raw instance at parameter position `index`.
    pub fn instance(&self, index: usize) -> Option<&Instance> {
        self.instances.get(index)
    }

    /// Instance at parameter position `index`, downcast to `T`.
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> Option<Arc<T>> {
        self.instances
            .get(index)
            .and_then(|instance| instance.clone().downcast::<T>().ok())
    }

    /// First instance registered under `identity`, downcast to `T`.
    pub fn by_name<T: Any + Send + Sync>(&self, identity: &str) -> Option<Arc<T>> {
        let index = self.names.iter().position(|n| n == identity)?;
        self.get(index)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl std::fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependencies").field("names", &self.names).finish()
    }
}

/// Obtains and invokes the constructor behind a declaration.
///
/// The loader owns every side effect of construction, such as opening a
/// connection inside a factory.
#[async_trait]
pub trait ImplementationLoader: Send + Sync {
    async fn instantiate(
        &self,
        declaration: &Declaration,
        dependencies: Dependencies,
    ) -> Result<Instance, BoxError>;
}

type Constructor = Arc<dyn Fn(Dependencies) -> BoxFuture<'static, Result<Instance, BoxError>> + Send + Sync>;

/// Loader backed by constructors registered by declaration name.
///
/// ```
/// use skeleto_core::loader::{Dependencies, ImplementationLoader, StaticLoader};
/// use skeleto_core::Declaration;
///
/// # tokio_test::block_on(async {
/// let loader = StaticLoader::new()
///     .register_value("implGreeting", || "hello".to_string());
///
/// let instance = loader
///     .instantiate(&Declaration::new("implGreeting", "Greeting"), Dependencies::new())
///     .await
///     .unwrap();
/// assert_eq!(instance.downcast_ref::<String>().map(String::as_str), Some("hello"));
/// # });
/// ```
#[derive(Clone, Default)]
pub struct StaticLoader {
    constructors: HashMap<String, Constructor>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an async constructor.
    pub fn register<F, Fut>(mut self, declaration: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(Dependencies) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Instance, BoxError>> + Send + 'static,
    {
        let declaration = declaration.into();
        trace!(declaration = %declaration, "Registering constructor");
        let boxed: Constructor = Arc::new(
            move |deps: Dependencies| -> BoxFuture<'static, Result<Instance, BoxError>> {
                Box::pin(constructor(deps))
            },
        );
        self.constructors.insert(declaration, boxed);
        self
    }

    /// Register a constructor that ignores its dependencies and cannot fail.
    pub fn register_value<T, F>(self, declaration: impl Into<String>, make: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.register(declaration, move |_| {
            let instance: Instance = Arc::new(make());
            async move { Ok::<Instance, BoxError>(instance) }
        })
    }

    pub fn contains(&self, declaration: &str) -> bool {
        self.constructors.contains_key(declaration)
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

#[async_trait]
impl ImplementationLoader for StaticLoader {
    async fn instantiate(
        &self,
        declaration: &Declaration,
        dependencies: Dependencies,
    ) -> Result<Instance, BoxError> {
        let constructor = self
            .constructors
            .get(&declaration.name)
            .cloned()
            .ok_or_else(|| format!("no constructor registered for {}", declaration.name))?;

        debug!(declaration = %declaration.name, dependencies = dependencies.len(), "Invoking constructor");
        constructor(dependencies).await
    }
}
