//! Declaration model handed over by an external scanner.
//!
//! A scanner walks the application's sources and reports one [`Declaration`]
//! per exported constructor function, plus the type aliases and imports of
//! every scope (file or module) it visited. The container never reads source
//! code itself; contract introspection only queries a [`TypeGraph`].
//!
//! The whole model is serde-friendly so a scanner written in any language can
//! emit it as a JSON manifest:
//!
//! ```
//! use skeleto_core::declaration::{DeclarationModel, TypeGraph};
//!
//! let model = DeclarationModel::from_json(r#"{
//!     "declarations": [
//!         { "name": "implHello", "result": "Hello", "scope": "app/hello",
//!           "docs": ["@Handler"] }
//!     ],
//!     "scopes": {
//!         "app/hello": { "imports": { "Hello": "app/types" } },
//!         "app/types": { "aliases": [ { "name": "Hello", "body": { "other": "fn" } } ] }
//!     }
//! }"#).unwrap();
//!
//! assert_eq!(model.declarations[0].parameters.len(), 0);
//! assert_eq!(model.types.import_of("app/hello", "Hello"), Some("app/types"));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One exported constructor function found by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Function name; the implementation loader looks constructors up by it
    pub name: String,
    /// Identity of the declared result type, e.g. `RegisterPerson`
    #[serde(default)]
    pub result: Option<String>,
    /// Parameter type identities, in declaration order
    #[serde(default)]
    pub parameters: Vec<String>,
    /// Raw documentation blocks, in scan order
    #[serde(default)]
    pub docs: Vec<String>,
    /// Scope (file or module) that declares the function
    #[serde(default)]
    pub scope: String,
}

impl Declaration {
    pub fn new(name: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            result: Some(result.into()),
            parameters: Vec::new(),
            docs: Vec::new(),
            scope: String::new(),
        }
    }

    pub fn param(mut self, identity: impl Into<String>) -> Self {
        self.parameters.push(identity.into());
        self
    }

    pub fn doc(mut self, block: impl Into<String>) -> Self {
        self.docs.push(block.into());
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Result identity, if the scanner could name one.
    pub fn result_identity(&self) -> Option<&str> {
        self.result.as_deref().map(str::trim).filter(|r| !r.is_empty())
    }
}

/// A member of a structure type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    /// Type as written, e.g. `string` or `Person[]`
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub docs: Vec<String>,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            docs: Vec::new(),
        }
    }

    pub fn doc(mut self, block: impl Into<String>) -> Self {
        self.docs.push(block.into());
        self
    }
}

/// Shape of a type expression, as far as contract introspection cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeExpr {
    /// Named type, possibly generic: `Request`, `Contract<Request, Response>`
    Reference {
        name: String,
        #[serde(default)]
        arguments: Vec<TypeExpr>,
    },
    /// Inline structure: `{ name: string; age: number }`
    Struct(Vec<FieldDecl>),
    /// Anything else (primitives, unions, function types), kept as text
    Other(String),
}

impl TypeExpr {
    pub fn reference(name: impl Into<String>) -> Self {
        TypeExpr::Reference {
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, arguments: Vec<TypeExpr>) -> Self {
        TypeExpr::Reference {
            name: name.into(),
            arguments,
        }
    }
}

/// A named type alias declared in some scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeAlias {
    pub name: String,
    #[serde(default)]
    pub docs: Vec<String>,
    pub body: TypeExpr,
}

impl TypeAlias {
    pub fn new(name: impl Into<String>, body: TypeExpr) -> Self {
        Self {
            name: name.into(),
            docs: Vec::new(),
            body,
        }
    }

    pub fn doc(mut self, block: impl Into<String>) -> Self {
        self.docs.push(block.into());
        self
    }
}

/// Query surface over the scanned type declarations.
pub trait TypeGraph: Send + Sync {
    /// Alias declared directly in `scope`.
    fn alias(&self, scope: &str, name: &str) -> Option<&TypeAlias>;

    /// Scope that `scope` imports `name` from, if it imports it.
    fn import_of(&self, scope: &str, name: &str) -> Option<&str>;
}

/// Aliases and named imports of one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeEntry {
    pub aliases: Vec<TypeAlias>,
    /// Imported name -> scope it comes from
    pub imports: HashMap<String, String>,
}

/// In-memory [`TypeGraph`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeIndex {
    scopes: HashMap<String, ScopeEntry>,
}

impl TypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an alias in `scope`. A later alias with the same name shadows
    /// the earlier one.
    pub fn alias(mut self, scope: impl Into<String>, alias: TypeAlias) -> Self {
        self.insert_alias(scope, alias);
        self
    }

    /// Record that `scope` imports `name` from `from`.
    pub fn import(mut self, scope: impl Into<String>, name: impl Into<String>, from: impl Into<String>) -> Self {
        self.insert_import(scope, name, from);
        self
    }

    pub fn insert_alias(&mut self, scope: impl Into<String>, alias: TypeAlias) {
        let entry = self.scopes.entry(scope.into()).or_default();
        entry.aliases.retain(|a| a.name != alias.name);
        entry.aliases.push(alias);
    }

    pub fn insert_import(&mut self, scope: impl Into<String>, name: impl Into<String>, from: impl Into<String>) {
        self.scopes
            .entry(scope.into())
            .or_default()
            .imports
            .insert(name.into(), from.into());
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }
}

impl TypeGraph for TypeIndex {
    fn alias(&self, scope: &str, name: &str) -> Option<&TypeAlias> {
        self.scopes
            .get(scope)
            .and_then(|entry| entry.aliases.iter().find(|a| a.name == name))
    }

    fn import_of(&self, scope: &str, name: &str) -> Option<&str> {
        self.scopes
            .get(scope)
            .and_then(|entry| entry.imports.get(name))
            .map(String::as_str)
    }
}

/// Complete scanner output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationModel {
    #[serde(default)]
    pub declarations: Vec<Declaration>,
    #[serde(default, rename = "scopes")]
    pub types: TypeIndex,
}

impl DeclarationModel {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
