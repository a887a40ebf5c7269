// Component and payload descriptors

use crate::annotation::{self, Annotation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a component in the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    /// Produces a shared resource; never decorated
    Factory,
    /// Produces a function that wraps handlers
    Interceptor,
    /// Terminal unit of work
    Handler,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Factory => "Factory",
            Kind::Interceptor => "Interceptor",
            Kind::Handler => "Handler",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One member of a contract payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeField {
    pub name: String,
    /// Type identity as written by the scanner, not resolved further
    #[serde(rename = "type")]
    pub ty: String,
    pub annotations: Vec<Annotation>,
}

impl TypeField {
    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        annotation::find(&self.annotations, name)
    }
}

/// Resolved structure of one side (request or response) of a contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadDescriptor {
    /// Name of the referenced type, or `index-N` for an inline structure
    pub name: String,
    /// Scope that defines the payload type
    pub scope: String,
    pub fields: Vec<TypeField>,
    /// Annotations on the named type itself; empty for inline structures
    pub annotations: Vec<Annotation>,
}

impl PayloadDescriptor {
    pub fn field(&self, name: &str) -> Option<&TypeField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Normalized record of one injectable declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    /// Contract identity, unique in the registry
    pub name: String,
    /// Declaration that produced the descriptor
    pub declaration: String,
    /// Parameter type identities, in declaration order
    pub dependencies: Vec<String>,
    pub kind: Kind,
    /// Data of the annotation that fixed `kind`
    pub kind_data: Option<Value>,
    /// Chain placement; only meaningful for interceptors
    pub ordinal: i64,
    /// Whether the contract should be introspected; only meaningful for handlers
    pub read_contract: bool,
    /// Every annotation except the one that fixed `kind`
    pub annotations: Vec<Annotation>,
    /// Annotations on the contract type alias
    pub contract_annotations: Vec<Annotation>,
    pub request: Option<PayloadDescriptor>,
    pub response: Option<PayloadDescriptor>,
}

impl ComponentDescriptor {
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        let name = name.into();
        Self {
            declaration: name.clone(),
            name,
            dependencies: Vec::new(),
            kind,
            kind_data: None,
            ordinal: 0,
            read_contract: false,
            annotations: Vec::new(),
            contract_annotations: Vec::new(),
            request: None,
            response: None,
        }
    }

    pub fn depends_on(mut self, identity: impl Into<String>) -> Self {
        self.dependencies.push(identity.into());
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_ordinal(mut self, ordinal: i64) -> Self {
        self.ordinal = ordinal;
        self
    }

    /// First additional annotation with the given name.
    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        annotation::find(&self.annotations, name)
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotation(name).is_some()
    }

    pub fn is_handler(&self) -> bool {
        self.kind == Kind::Handler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_annotation_lookup_picks_first() {
        let descriptor = ComponentDescriptor::new("RegisterPerson", Kind::Handler)
            .with_annotation(Annotation::marker("Transaction"))
            .with_annotation(Annotation::new("Controller", Some(json!({"path": "/a"}))))
            .with_annotation(Annotation::new("Controller", Some(json!({"path": "/b"}))));

        assert!(descriptor.has_annotation("Transaction"));
        assert_eq!(
            descriptor.annotation("Controller").and_then(|a| a.get("path")),
            Some(&json!("/a"))
        );
        assert!(!descriptor.has_annotation("Logging"));
    }

    #[test]
    fn test_payload_field_lookup() {
        let payload = PayloadDescriptor {
            name: "Request".into(),
            scope: "app/types".into(),
            fields: vec![TypeField {
                name: "email".into(),
                ty: "string".into(),
                annotations: vec![Annotation::text_value("Part", "body")],
            }],
            annotations: vec![],
        };

        let field = payload.field("email").unwrap();
        assert_eq!(field.annotation("Part").and_then(|a| a.text()), Some("body"));
        assert!(payload.field("name").is_none());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(Kind::Interceptor.to_string(), "Interceptor");
    }
}
