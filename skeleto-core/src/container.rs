// Resolution and composition engine

use crate::declaration::{DeclarationModel, TypeGraph, TypeIndex};
use crate::extractor::{Component, ComponentSet, DeclarationExtractor};
use crate::interceptor::{Interceptor, InterceptorChain};
use crate::introspect::ContractIntrospector;
use crate::loader::{Dependencies, ImplementationLoader, Instance};
use crate::logging::{debug, info, trace};
use crate::options::ContainerOptions;
use crate::registry::InstanceRegistry;
use crate::resolver::DependencyResolver;
use crate::{ComponentDescriptor, Declaration, Error, Kind, Result};
use std::sync::Arc;

/// Instantiation phases, in order. A phase completes before the next starts.
pub const PHASES: [Kind; 3] = [Kind::Factory, Kind::Interceptor, Kind::Handler];

/// Drives a container run: extract, resolve, then instantiate in phases.
///
/// Each run fills its own [`InstanceRegistry`]; the container holds no
/// instances itself and may be started any number of times.
#[derive(Clone)]
pub struct Container {
    loader: Arc<dyn ImplementationLoader>,
    types: Arc<dyn TypeGraph>,
    options: ContainerOptions,
}

impl Container {
    /// Container with an empty type graph and default options.
    pub fn new(loader: Arc<dyn ImplementationLoader>) -> Self {
        debug!("Creating new container");
        Self {
            loader,
            types: Arc::new(TypeIndex::new()),
            options: ContainerOptions::default(),
        }
    }

    /// Container over a scanner manifest, returning the manifest's declarations.
    pub fn from_model(loader: Arc<dyn ImplementationLoader>, model: DeclarationModel) -> (Self, Vec<Declaration>) {
        let container = Self::new(loader).with_types(Arc::new(model.types));
        (container, model.declarations)
    }

    pub fn with_types(mut self, types: Arc<dyn TypeGraph>) -> Self {
        self.types = types;
        self
    }

    pub fn with_options(mut self, options: ContainerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    /// Run the whole pipeline into a fresh registry.
    pub async fn start(&self, declarations: Vec<Declaration>) -> Result<InstanceRegistry> {
        let mut registry = InstanceRegistry::new();
        self.start_into(declarations, &mut registry).await?;
        Ok(registry)
    }

    /// Run the whole pipeline into `registry`.
    ///
    /// Extraction and resolution failures leave the registry untouched.
    /// Otherwise the registry is cleared before instantiation starts, so
    /// instances of an earlier run never satisfy a dependency. A failure while
    /// instantiating leaves every instance this run created before it.
    pub async fn start_into(&self, declarations: Vec<Declaration>, registry: &mut InstanceRegistry) -> Result<()> {
        self.options.validate()?;

        let set = self.extract(declarations)?;
        let order = self.resolve(&set)?;
        self.compose_into(set, &order, registry).await?;

        info!(components = registry.len(), "Container started");
        Ok(())
    }

    pub fn extract(&self, declarations: Vec<Declaration>) -> Result<ComponentSet> {
        let set = DeclarationExtractor::new(&self.options).extract(declarations)?;
        debug!(components = set.len(), "Extracted components");
        Ok(set)
    }

    /// Total order over the components; dependencies come first.
    pub fn resolve(&self, set: &ComponentSet) -> Result<Vec<String>> {
        DependencyResolver::from_descriptors(set.descriptors())
            .tie_break(self.options.tie_break)
            .sort()
    }

    /// Instantiate the components of `set` phase by phase, following `order`
    /// within each phase.
    pub async fn compose_into(
        &self,
        mut set: ComponentSet,
        order: &[String],
        registry: &mut InstanceRegistry,
    ) -> Result<()> {
        registry.begin_run(set.len());
        registry.extend_warnings(set.take_warnings());

        let mut chain = InterceptorChain::new();

        for phase in PHASES {
            debug!(phase = %phase, "Starting instantiation phase");

            for name in order {
                let component = set
                    .get(name)
                    .ok_or_else(|| Error::Internal(format!("{} is ordered but was not extracted", name)))?;
                if component.descriptor.kind != phase {
                    continue;
                }

                let mut descriptor = component.descriptor.clone();
                if phase == Kind::Handler && descriptor.read_contract {
                    self.read_contract(&mut descriptor, component, registry)?;
                }

                let instance = self.instantiate(component, &descriptor, registry).await?;

                match phase {
                    Kind::Factory => registry.insert(descriptor, instance),
                    Kind::Interceptor => {
                        let interceptor = instance
                            .downcast_ref::<Interceptor>()
                            .cloned()
                            .ok_or_else(|| Error::InvalidInterceptor {
                                identity: name.clone(),
                            })?;
                        let scan_index = set.scan_index(name).unwrap_or(usize::MAX);
                        chain.push(name.clone(), descriptor.ordinal, scan_index, interceptor);
                        registry.insert(descriptor, instance);
                    }
                    Kind::Handler => {
                        let wrapped = chain.apply(instance, &descriptor);
                        registry.insert(descriptor, wrapped);
                    }
                }
            }
        }

        debug!(interceptors = ?chain.names(), "Interceptor chain applied to handlers");
        Ok(())
    }

    async fn instantiate(
        &self,
        component: &Component,
        descriptor: &ComponentDescriptor,
        registry: &InstanceRegistry,
    ) -> Result<Instance> {
        let mut dependencies = Dependencies::new();
        for dependency in &descriptor.dependencies {
            let instance = registry.get(dependency).ok_or_else(|| Error::DependencyNotReady {
                owner: descriptor.name.clone(),
                dependency: dependency.clone(),
            })?;
            dependencies.push(dependency.clone(), instance.clone());
        }

        trace!(
            component = %descriptor.name,
            kind = %descriptor.kind,
            declaration = %component.declaration.name,
            "Instantiating component"
        );

        self.loader
            .instantiate(&component.declaration, dependencies)
            .await
            .map_err(|source| Error::LoaderFailure {
                identity: descriptor.name.clone(),
                source,
            })
    }

    fn read_contract(
        &self,
        descriptor: &mut ComponentDescriptor,
        component: &Component,
        registry: &mut InstanceRegistry,
    ) -> Result<()> {
        let contract = ContractIntrospector::new(self.types.as_ref())
            .introspect(&component.declaration.scope, &descriptor.name)?;

        registry.extend_warnings(contract.warnings);
        descriptor.contract_annotations = contract.annotations;
        descriptor.request = Some(contract.request);
        descriptor.response = Some(contract.response);

        debug!(component = %descriptor.name, "Contract read");
        Ok(())
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container").field("options", &self.options).finish()
    }
}
