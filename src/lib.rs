// Skeleto - an annotation-driven component container for Rust
//
// Declarations carry doc-block annotations naming their kind (factory,
// interceptor or handler). The container resolves them in dependency order,
// instantiates them phase by phase and wraps every handler with the
// interceptor chain.

// Re-export core functionality
pub use skeleto_core::*;

// Re-export optional crates
#[cfg(feature = "config")]
pub use skeleto_config;

#[cfg(feature = "testing")]
pub use skeleto_testing;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        ActionHandler,
        Annotation,
        ComponentDescriptor,
        Container,
        ContainerOptions,
        Context,
        Declaration,
        DeclarationModel,
        Dependencies,
        Error,
        ImplementationLoader,
        Instance,
        InstanceRegistry,
        Interceptor,
        Kind,
        StaticLoader,
        TypeIndex,
        action,
    };

    #[cfg(feature = "config")]
    pub use skeleto_config::SkeletoConfig;

    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
}
