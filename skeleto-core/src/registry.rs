// Instance registry produced by a container run

use crate::loader::Instance;
use crate::logging::{debug, trace};
use crate::{ComponentDescriptor, Kind, Warning};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// One constructed component.
#[derive(Clone)]
pub struct Registered {
    pub name: String,
    pub instance: Instance,
    pub descriptor: Arc<ComponentDescriptor>,
}

impl Registered {
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.instance.clone().downcast::<T>().ok()
    }
}

impl std::fmt::Debug for Registered {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registered")
            .field("name", &self.name)
            .field("kind", &self.descriptor.kind)
            .finish()
    }
}

/// Identity -> (instance, descriptor), in instantiation order.
///
/// A registry is owned by the run that fills it. If the run fails part way,
/// the entries created before the failure stay; use [`is_complete`] rather
/// than the mere absence of an error to tell a full registry from a partial one.
///
/// [`is_complete`]: InstanceRegistry::is_complete
#[derive(Debug, Clone, Default)]
pub struct InstanceRegistry {
    entries: Vec<Registered>,
    index: HashMap<String, usize>,
    expected: usize,
    warnings: Vec<Warning>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, descriptor: ComponentDescriptor, instance: Instance) {
        let name = descriptor.name.clone();
        trace!(component = %name, kind = %descriptor.kind, "Registering instance");

        let entry = Registered {
            name: name.clone(),
            instance,
            descriptor: Arc::new(descriptor),
        };
        match self.index.get(&name) {
            Some(&i) => self.entries[i] = entry,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }

        debug!(component = %name, registered = self.entries.len(), "Instance registered");
    }

    /// Drop everything from an earlier run and expect `expected` entries.
    pub(crate) fn begin_run(&mut self, expected: usize) {
        if !self.entries.is_empty() {
            debug!(dropped = self.entries.len(), "Clearing instances of a previous run");
        }
        self.entries.clear();
        self.index.clear();
        self.warnings.clear();
        self.expected = expected;
    }

    pub(crate) fn extend_warnings(&mut self, warnings: impl IntoIterator<Item = Warning>) {
        self.warnings.extend(warnings);
    }

    pub fn entry(&self, name: &str) -> Option<&Registered> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn get(&self, name: &str) -> Option<&Instance> {
        self.entry(name).map(|e| &e.instance)
    }

    /// Instance registered under `name`, downcast to `T`.
    pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.entry(name).and_then(Registered::downcast)
    }

    pub fn descriptor(&self, name: &str) -> Option<&ComponentDescriptor> {
        self.entry(name).map(|e| e.descriptor.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Names in instantiation order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registered> {
        self.entries.iter()
    }

    /// Handler entries only, in instantiation order.
    pub fn handlers(&self) -> impl Iterator<Item = &Registered> {
        self.of_kind(Kind::Handler)
    }

    pub fn of_kind(&self, kind: Kind) -> impl Iterator<Item = &Registered> {
        self.entries.iter().filter(move |e| e.descriptor.kind == kind)
    }

    /// Entries carrying the additional annotation `tag`.
    pub fn by_annotation<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Registered> + 'a {
        self.entries.iter().filter(move |e| e.descriptor.has_annotation(tag))
    }

    /// Number of components the run set out to instantiate.
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Whether every expected component was instantiated.
    pub fn is_complete(&self) -> bool {
        self.entries.len() == self.expected
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
