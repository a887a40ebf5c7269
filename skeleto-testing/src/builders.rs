// Builders for declaration fixtures

use serde_json::{Value, json};
use skeleto_core::{Declaration, TypeAlias, TypeExpr};

/// Fluent builder for a single [`Declaration`].
///
/// ```
/// use skeleto_testing::DeclarationBuilder;
///
/// let decl = DeclarationBuilder::interceptor("Audit", 2).param("Log").build();
/// assert_eq!(decl.name, "implAudit");
/// assert_eq!(decl.docs, vec!["@Interceptor {\"ordinal\":2}"]);
/// ```
#[derive(Debug, Clone)]
pub struct DeclarationBuilder {
    declaration: Declaration,
    tag: Option<(String, Option<Value>)>,
    extra: Vec<String>,
}

impl DeclarationBuilder {
    /// Declaration named `impl{identity}` producing `identity`, with no kind tag.
    pub fn new(identity: &str) -> Self {
        Self {
            declaration: Declaration::new(format!("impl{}", identity), identity),
            tag: None,
            extra: Vec::new(),
        }
    }

    pub fn factory(identity: &str) -> Self {
        Self::new(identity).tagged("Factory", None)
    }

    pub fn interceptor(identity: &str, ordinal: i64) -> Self {
        Self::new(identity).tagged("Interceptor", Some(json!({ "ordinal": ordinal })))
    }

    pub fn handler(identity: &str) -> Self {
        Self::new(identity).tagged("Handler", None)
    }

    /// Rename the declaration itself.
    pub fn named(mut self, name: &str) -> Self {
        self.declaration.name = name.to_string();
        self
    }

    /// Set the kind tag and its data.
    pub fn tagged(mut self, tag: &str, data: Option<Value>) -> Self {
        self.tag = Some((tag.to_string(), data));
        self
    }

    /// Ask the container to read the handler's contract.
    pub fn read_contract(mut self) -> Self {
        if let Some((_, data)) = self.tag.as_mut() {
            let mut object = match data.take() {
                Some(Value::Object(map)) => map,
                _ => serde_json::Map::new(),
            };
            object.insert("readContract".to_string(), Value::Bool(true));
            *data = Some(Value::Object(object));
        }
        self
    }

    /// Add a free-text annotation line, e.g. `annotate("Route", "/users")`.
    pub fn annotate(mut self, name: &str, text: &str) -> Self {
        self.extra.push(format!("@{} {}", name, text));
        self
    }

    pub fn annotate_json(mut self, name: &str, data: Value) -> Self {
        self.extra.push(format!("@{} {}", name, data));
        self
    }

    pub fn param(mut self, identity: &str) -> Self {
        self.declaration = self.declaration.param(identity);
        self
    }

    pub fn scope(mut self, scope: &str) -> Self {
        self.declaration = self.declaration.scope(scope);
        self
    }

    pub fn build(self) -> Declaration {
        let mut declaration = self.declaration;
        if let Some((tag, data)) = self.tag {
            let block = match data {
                Some(data) => format!("@{} {}", tag, data),
                None => format!("@{}", tag),
            };
            declaration = declaration.doc(block);
        }
        for line in self.extra {
            declaration = declaration.doc(line);
        }
        declaration
    }
}

/// `type {name} = Contract<{request}, {response}>` alias.
pub fn contract_alias(name: &str, request: TypeExpr, response: TypeExpr) -> TypeAlias {
    TypeAlias::new(name, TypeExpr::generic("Contract", vec![request, response]))
}
