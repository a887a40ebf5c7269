// Error and warning types for the Skeleto container

use thiserror::Error;

/// Boxed error returned by implementation loaders and action handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Component {owner} cannot be resolved because it depends on {missing} which is not defined")]
    UnresolvedDependency { owner: String, missing: String },

    #[error("Circular dependency detected: {}", path.join(" -> "))]
    CircularDependency { path: Vec<String> },

    #[error("Type {identity} not found in scope {scope}")]
    TypeNotFound { identity: String, scope: String },

    #[error("Unsupported contract shape for {identity}: expected a named reference or an inline structure")]
    UnsupportedContractShape { identity: String },

    #[error("Failed to instantiate {identity}: {source}")]
    LoaderFailure {
        identity: String,
        #[source]
        source: BoxError,
    },

    #[error("Duplicate component identity {identity}: declared by {first} and {second}")]
    DuplicateIdentity {
        identity: String,
        first: String,
        second: String,
    },

    #[error("Dependency {dependency} of {owner} is not instantiated yet")]
    DependencyNotReady { owner: String, dependency: String },

    #[error("Instance registered for interceptor {identity} is not an Interceptor")]
    InvalidInterceptor { identity: String },

    #[error("Invalid container options: {0}")]
    InvalidOptions(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Name of the component the error is attributed to, if any.
    pub fn component(&self) -> Option<&str> {
        match self {
            Error::UnresolvedDependency { owner, .. } => Some(owner),
            Error::CircularDependency { path } => path.first().map(String::as_str),
            Error::TypeNotFound { identity, .. }
            | Error::UnsupportedContractShape { identity }
            | Error::LoaderFailure { identity, .. }
            | Error::DuplicateIdentity { identity, .. }
            | Error::InvalidInterceptor { identity } => Some(identity),
            Error::DependencyNotReady { owner, .. } => Some(owner),
            Error::InvalidOptions(_) | Error::Internal(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Non-fatal diagnostics collected while building a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// An annotation looked like JSON but did not decode; its raw text was kept.
    AnnotationDecode {
        owner: String,
        tag: String,
        reason: String,
    },

    /// A later declaration produced an identity that was already registered.
    DuplicateIdentity {
        identity: String,
        kept: String,
        dropped: String,
    },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::AnnotationDecode { owner, tag, reason } => {
                write!(f, "in {} annotation @{} has invalid JSON ({})", owner, tag, reason)
            }
            Warning::DuplicateIdentity {
                identity,
                kept,
                dropped,
            } => write!(
                f,
                "identity {} already provided by {}, skipping {}",
                identity, kept, dropped
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_full_path() {
        let err = Error::CircularDependency {
            path: vec!["A".into(), "B".into(), "C".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "Circular dependency detected: A -> B -> C -> A");
        assert_eq!(err.component(), Some("A"));
    }

    #[test]
    fn test_unresolved_message_names_both() {
        let err = Error::UnresolvedDependency {
            owner: "A".into(),
            missing: "X".into(),
        };
        assert_eq!(
            err.to_string(),
            "Component A cannot be resolved because it depends on X which is not defined"
        );
    }

    #[test]
    fn test_loader_failure_keeps_source() {
        let err = Error::LoaderFailure {
            identity: "DataSource".into(),
            source: "connection refused".into(),
        };
        assert!(err.to_string().contains("connection refused"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_warning_display() {
        let warning = Warning::DuplicateIdentity {
            identity: "X".into(),
            kept: "implX".into(),
            dropped: "implOtherX".into(),
        };
        assert_eq!(
            warning.to_string(),
            "identity X already provided by implX, skipping implOtherX"
        );
    }
}
