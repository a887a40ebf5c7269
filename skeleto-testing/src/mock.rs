// Mock implementation loader for testing

use async_trait::async_trait;
use skeleto_core::error::BoxError;
use skeleto_core::{Declaration, Dependencies, ImplementationLoader, Instance, Interceptor};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One recorded `instantiate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderCall {
    pub declaration: String,
    /// Identities of the dependency instances received, in order
    pub dependencies: Vec<String>,
}

/// Default instance produced by [`MockLoader`] for declarations without a
/// registered value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockInstance {
    pub declaration: String,
    pub dependencies: Vec<String>,
}

type Make = Arc<dyn Fn(&Dependencies) -> Instance + Send + Sync>;

/// Loader that records every call and builds placeholder instances.
///
/// Declarations with no registered value get a [`MockInstance`]; handlers
/// therefore stay plain values unless an interceptor rewrites them.
#[derive(Clone, Default)]
pub struct MockLoader {
    calls: Arc<Mutex<Vec<LoaderCall>>>,
    values: HashMap<String, Make>,
    failures: HashMap<String, String>,
}

impl MockLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `make()` for `declaration`.
    pub fn with_value<T, F>(mut self, declaration: &str, make: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.values.insert(
            declaration.to_string(),
            Arc::new(move |_: &Dependencies| -> Instance { Arc::new(make()) }),
        );
        self
    }

    /// Build the instance for `declaration` from its dependencies.
    pub fn with_factory<F>(mut self, declaration: &str, make: F) -> Self
    where
        F: Fn(&Dependencies) -> Instance + Send + Sync + 'static,
    {
        self.values.insert(declaration.to_string(), Arc::new(make));
        self
    }

    /// Return `interceptor` for `declaration`.
    pub fn with_interceptor(self, declaration: &str, interceptor: Interceptor) -> Self {
        self.with_value(declaration, move || interceptor.clone())
    }

    /// Fail every instantiation of `declaration` with `message`.
    pub fn fail_on(mut self, declaration: &str, message: &str) -> Self {
        self.failures.insert(declaration.to_string(), message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<LoaderCall> {
        self.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().len()
    }

    pub fn was_called(&self, declaration: &str) -> bool {
        self.lock().iter().any(|c| c.declaration == declaration)
    }

    /// Declarations in the order they were instantiated.
    pub fn instantiation_order(&self) -> Vec<String> {
        self.lock().iter().map(|c| c.declaration.clone()).collect()
    }

    pub fn clear_calls(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LoaderCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ImplementationLoader for MockLoader {
    async fn instantiate(
        &self,
        declaration: &Declaration,
        dependencies: Dependencies,
    ) -> Result<Instance, BoxError> {
        self.lock().push(LoaderCall {
            declaration: declaration.name.clone(),
            dependencies: dependencies.names().to_vec(),
        });

        if let Some(message) = self.failures.get(&declaration.name) {
            return Err(message.clone().into());
        }

        let instance = match self.values.get(&declaration.name) {
            Some(make) => make(&dependencies),
            None => Arc::new(MockInstance {
                declaration: declaration.name.clone(),
                dependencies: dependencies.names().to_vec(),
            }),
        };
        Ok(instance)
    }
}
