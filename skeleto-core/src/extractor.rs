//! Turns scanned declarations into component descriptors.
//!
//! A declaration becomes a component when it names a result type and carries
//! one of the reserved kind tags. The first kind tag fixes the kind and is
//! removed from the annotation list; its data supplies the interceptor
//! `ordinal` and the handler `readContract` flag.

use crate::annotation::parse_blocks;
use crate::logging::{debug, trace, warn};
use crate::options::{ContainerOptions, DuplicatePolicy};
use crate::{ComponentDescriptor, Declaration, Error, Kind, Result, Warning};
use serde_json::Value;
use std::collections::HashMap;

/// A descriptor together with the declaration it came from.
#[derive(Debug, Clone)]
pub struct Component {
    pub descriptor: ComponentDescriptor,
    pub declaration: Declaration,
}

/// Extracted components, in scan order and keyed by identity.
#[derive(Debug, Clone, Default)]
pub struct ComponentSet {
    components: Vec<Component>,
    index: HashMap<String, usize>,
    warnings: Vec<Warning>,
}

impl ComponentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component unless its identity is already taken.
    ///
    /// Returns the declaration name of the existing owner on collision.
    pub fn insert(&mut self, component: Component) -> std::result::Result<(), String> {
        let name = component.descriptor.name.clone();
        if let Some(&existing) = self.index.get(&name) {
            return Err(self.components[existing].declaration.name.clone());
        }
        self.index.insert(name, self.components.len());
        self.components.push(component);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Component> {
        self.index.get(name).map(|&i| &self.components[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Component> {
        self.index.get(name).map(|&i| &mut self.components[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Position of a component in scan order.
    pub fn scan_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.components.iter()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.components.iter().map(|c| &c.descriptor)
    }

    pub fn names(&self) -> Vec<String> {
        self.descriptors().map(|d| d.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub(crate) fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }
}

impl FromIterator<Component> for ComponentSet {
    /// Collects components, silently keeping the first of any duplicates.
    fn from_iter<T: IntoIterator<Item = Component>>(iter: T) -> Self {
        let mut set = ComponentSet::new();
        for component in iter {
            let _ = set.insert(component);
        }
        set
    }
}

/// Classifies declarations and builds their descriptors.
pub struct DeclarationExtractor<'a> {
    options: &'a ContainerOptions,
}

impl<'a> DeclarationExtractor<'a> {
    pub fn new(options: &'a ContainerOptions) -> Self {
        Self { options }
    }

    pub fn extract<I>(&self, declarations: I) -> Result<ComponentSet>
    where
        I: IntoIterator<Item = Declaration>,
    {
        let mut set = ComponentSet::new();

        for declaration in declarations {
            let Some(identity) = declaration.result_identity().map(str::to_string) else {
                trace!(declaration = %declaration.name, "Skipping declaration without result type");
                continue;
            };

            let parsed = parse_blocks(&format!("function {}", declaration.name), &declaration.docs);
            let mut annotations = parsed.annotations;

            let Some(position) = annotations
                .iter()
                .position(|a| self.options.tags.kind_of(&a.name).is_some())
            else {
                trace!(declaration = %declaration.name, "Skipping non-injectable declaration");
                continue;
            };

            let main = annotations.remove(position);
            let Some(kind) = self.options.tags.kind_of(&main.name) else {
                continue;
            };

            let mut descriptor = ComponentDescriptor::new(identity.clone(), kind);
            descriptor.declaration = declaration.name.clone();
            descriptor.dependencies = declaration.parameters.clone();
            descriptor.annotations = annotations;

            match kind {
                Kind::Interceptor => {
                    descriptor.ordinal = self.ordinal(&declaration.name, main.data.as_ref());
                }
                Kind::Handler => {
                    descriptor.read_contract = main
                        .get(&self.options.keys.read_contract)
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                }
                Kind::Factory => {}
            }
            descriptor.kind_data = main.data;

            let dropped = declaration.name.clone();
            if let Err(kept) = set.insert(Component {
                descriptor,
                declaration,
            }) {
                match self.options.duplicates {
                    DuplicatePolicy::Fail => {
                        return Err(Error::DuplicateIdentity {
                            identity,
                            first: kept,
                            second: dropped,
                        });
                    }
                    DuplicatePolicy::Warn => {
                        warn!(identity = %identity, kept = %kept, dropped = %dropped, "Duplicate component identity, keeping the first");
                        set.warnings.push(Warning::DuplicateIdentity {
                            identity,
                            kept,
                            dropped,
                        });
                    }
                }
                continue;
            }

            set.warnings.extend(parsed.warnings);
            debug!(component = %identity, kind = %kind, declaration = %dropped, "Extracted component");
        }

        Ok(set)
    }

    fn ordinal(&self, declaration: &str, data: Option<&Value>) -> i64 {
        let Some(value) = data.and_then(|d| d.get(&self.options.keys.ordinal)) else {
            return 0;
        };

        value.as_i64().unwrap_or_else(|| {
            debug!(declaration, ordinal = %value, "Ordinal is not an integer, using 0");
            0
        })
    }
}
