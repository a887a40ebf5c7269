// Core library for the Skeleto container
// This crate contains the declaration model, the dependency resolver and the composition engine

pub mod annotation;
pub mod container;
pub mod context;
pub mod declaration;
pub mod descriptor;
pub mod error;
pub mod extractor;
pub mod interceptor;
pub mod introspect;
pub mod loader;
pub mod logging;
pub mod options;
pub mod registry;
pub mod resolver;

// Re-export commonly used types
pub use annotation::{Annotation, parse_annotations, parse_blocks};
pub use container::*;
pub use context::{ActionHandler, Context, action};
pub use declaration::{Declaration, DeclarationModel, FieldDecl, TypeAlias, TypeExpr, TypeGraph, TypeIndex};
pub use descriptor::*;
pub use error::*;
pub use extractor::{Component, ComponentSet, DeclarationExtractor};
pub use interceptor::{Interceptor, InterceptorChain};
pub use introspect::{Contract, ContractIntrospector};
pub use loader::{Dependencies, ImplementationLoader, Instance, StaticLoader};
pub use options::{ContainerOptions, ContractKeys, DuplicatePolicy, KindTags, TieBreak};
pub use registry::{InstanceRegistry, Registered};
pub use resolver::{DependencyResolver, resolve_order};
