//! Contract introspection for handlers.
//!
//! A handler's result type is expected to be an alias of a two-argument
//! contract, `Contract<Request, Response>`. Each argument is either a named
//! alias of a structure or an inline structure; its members become the
//! payload's fields, with their own annotations (used downstream for body,
//! query, path or header binding).
//!
//! Aliases are looked up in the declaring scope first, then through named
//! imports, scope by scope, until a local declaration is found.

use crate::annotation::{Annotation, parse_blocks};
use crate::declaration::{FieldDecl, TypeAlias, TypeExpr, TypeGraph};
use crate::logging::{debug, trace};
use crate::{Error, PayloadDescriptor, Result, TypeField, Warning};
use std::collections::HashSet;

/// Both sides of a handler contract.
#[derive(Debug, Clone, PartialEq)]
pub struct Contract {
    /// Annotations on the contract alias itself
    pub annotations: Vec<Annotation>,
    /// Scope that declares the contract alias
    pub scope: String,
    pub request: PayloadDescriptor,
    pub response: PayloadDescriptor,
    /// Annotation decode warnings collected on the way
    pub warnings: Vec<Warning>,
}

pub struct ContractIntrospector<'a> {
    types: &'a dyn TypeGraph,
}

impl<'a> ContractIntrospector<'a> {
    pub fn new(types: &'a dyn TypeGraph) -> Self {
        Self { types }
    }

    /// Introspect the contract named `identity`, starting the lookup in `scope`.
    pub fn introspect(&self, scope: &str, identity: &str) -> Result<Contract> {
        let (alias, alias_scope) = self.locate(scope, identity)?;
        trace!(contract = identity, scope = %alias_scope, "Located contract alias");

        let mut warnings = Vec::new();
        let parsed = parse_blocks(identity, &alias.docs);
        warnings.extend(parsed.warnings);

        let arguments = match &alias.body {
            TypeExpr::Reference { arguments, .. } if arguments.len() == 2 => arguments,
            _ => {
                return Err(Error::UnsupportedContractShape {
                    identity: identity.to_string(),
                });
            }
        };

        let request = self.payload(&arguments[0], 0, &alias_scope, identity, &mut warnings)?;
        let response = self.payload(&arguments[1], 1, &alias_scope, identity, &mut warnings)?;

        debug!(
            contract = identity,
            request = %request.name,
            response = %response.name,
            "Introspected contract"
        );

        Ok(Contract {
            annotations: parsed.annotations,
            scope: alias_scope,
            request,
            response,
            warnings,
        })
    }

    /// Find the alias declaration for `name`, following imports.
    pub fn locate(&self, scope: &str, name: &str) -> Result<(&'a TypeAlias, String)> {
        let types = self.types;
        let mut current = scope.to_string();
        let mut seen = HashSet::new();

        while seen.insert(current.clone()) {
            if let Some(alias) = types.alias(&current, name) {
                return Ok((alias, current));
            }
            match types.import_of(&current, name) {
                Some(next) => current = next.to_string(),
                None => break,
            }
        }

        Err(Error::TypeNotFound {
            identity: name.to_string(),
            scope: scope.to_string(),
        })
    }

    fn payload(
        &self,
        argument: &TypeExpr,
        index: usize,
        scope: &str,
        identity: &str,
        warnings: &mut Vec<Warning>,
    ) -> Result<PayloadDescriptor> {
        match argument {
            TypeExpr::Struct(members) => {
                let name = format!("index-{}", index);
                Ok(PayloadDescriptor {
                    fields: fields(&name, members, warnings),
                    name,
                    scope: scope.to_string(),
                    annotations: Vec::new(),
                })
            }
            TypeExpr::Reference { name, arguments } if arguments.is_empty() => {
                let (alias, defining) = self.locate(scope, name)?;
                let parsed = parse_blocks(name, &alias.docs);
                warnings.extend(parsed.warnings);

                let members = self.structure(alias, &defining)?;
                Ok(PayloadDescriptor {
                    name: name.clone(),
                    scope: defining,
                    fields: fields(name, members, warnings),
                    annotations: parsed.annotations,
                })
            }
            _ => Err(Error::UnsupportedContractShape {
                identity: identity.to_string(),
            }),
        }
    }

    /// Members of a named payload, following plain alias chains.
    fn structure(&self, alias: &'a TypeAlias, scope: &str) -> Result<&'a [FieldDecl]> {
        let mut chain = HashSet::from([alias.name.as_str()]);
        let mut body = &alias.body;
        let mut body_scope = scope.to_string();

        loop {
            match body {
                TypeExpr::Struct(members) => return Ok(members.as_slice()),
                TypeExpr::Reference { name, arguments } if arguments.is_empty() && chain.insert(name) => {
                    let (next, next_scope) = self.locate(&body_scope, name)?;
                    body = &next.body;
                    body_scope = next_scope;
                }
                _ => {
                    return Err(Error::UnsupportedContractShape {
                        identity: alias.name.clone(),
                    });
                }
            }
        }
    }
}

fn fields(owner: &str, members: &[FieldDecl], warnings: &mut Vec<Warning>) -> Vec<TypeField> {
    members
        .iter()
        .map(|member| {
            let parsed = parse_blocks(&format!("{}.{}", owner, member.name), &member.docs);
            warnings.extend(parsed.warnings);
            TypeField {
                name: member.name.clone(),
                ty: member.ty.clone(),
                annotations: parsed.annotations,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::TypeIndex;
    use serde_json::json;

    fn contract(request: TypeExpr, response: TypeExpr) -> TypeAlias {
        TypeAlias::new("Hello", TypeExpr::generic("Contract", vec![request, response]))
    }

    #[test]
    fn test_named_request_with_field_annotation() {
        let types = TypeIndex::new()
            .alias(
                "app",
                TypeAlias::new(
                    "Request",
                    TypeExpr::Struct(vec![FieldDecl::new("name", "string").doc("@Part body")]),
                ),
            )
            .alias("app", contract(TypeExpr::reference("Request"), TypeExpr::Struct(vec![])));

        let contract = ContractIntrospector::new(&types).introspect("app", "Hello").unwrap();
        assert_eq!(contract.request.name, "Request");
        assert_eq!(contract.request.fields.len(), 1);
        let field = &contract.request.fields[0];
        assert_eq!(field.name, "name");
        assert_eq!(field.ty, "string");
        assert_eq!(field.annotations, vec![Annotation::text_value("Part", "body")]);
    }

    #[test]
    fn test_inline_response_gets_positional_name() {
        let types = TypeIndex::new().alias(
            "app",
            contract(
                TypeExpr::Struct(vec![]),
                TypeExpr::Struct(vec![FieldDecl::new("id", "string")]),
            ),
        );

        let contract = ContractIntrospector::new(&types).introspect("app", "Hello").unwrap();
        assert_eq!(contract.request.name, "index-0");
        assert_eq!(contract.response.name, "index-1");
        assert_eq!(contract.response.fields[0].name, "id");
        assert!(contract.response.annotations.is_empty());
        assert_eq!(contract.response.scope, "app");
    }

    #[test]
    fn test_follows_imports_across_scopes() {
        let types = TypeIndex::new()
            .import("app/usecase", "Hello", "app/types")
            .import("app/types", "Person", "app/model")
            .alias(
                "app/model",
                TypeAlias::new("Person", TypeExpr::Struct(vec![FieldDecl::new("email", "string")]))
                    .doc("@Entity {\"table\": \"person\"}"),
            )
            .alias(
                "app/types",
                contract(TypeExpr::reference("Person"), TypeExpr::reference("Person"))
                    .doc("@Summary says hello"),
            );

        let contract = ContractIntrospector::new(&types)
            .introspect("app/usecase", "Hello")
            .unwrap();

        assert_eq!(contract.scope, "app/types");
        assert_eq!(contract.annotations, vec![Annotation::text_value("Summary", "says hello")]);
        assert_eq!(contract.request.scope, "app/model");
        assert_eq!(
            contract.request.annotations,
            vec![Annotation::new("Entity", Some(json!({"table": "person"})))]
        );
    }

    #[test]
    fn test_missing_contract_alias() {
        let types = TypeIndex::new();
        let err = ContractIntrospector::new(&types).introspect("app", "Hello").unwrap_err();
        match err {
            Error::TypeNotFound { identity, scope } => {
                assert_eq!(identity, "Hello");
                assert_eq!(scope, "app");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_import_loop_is_not_found() {
        let types = TypeIndex::new()
            .import("a", "Hello", "b")
            .import("b", "Hello", "a");
        let err = ContractIntrospector::new(&types).introspect("a", "Hello").unwrap_err();
        assert!(matches!(err, Error::TypeNotFound { .. }));
    }

    #[test]
    fn test_unsupported_argument_shape() {
        let types = TypeIndex::new().alias(
            "app",
            contract(TypeExpr::Other("string".into()), TypeExpr::Struct(vec![])),
        );
        let err = ContractIntrospector::new(&types).introspect("app", "Hello").unwrap_err();
        assert!(matches!(err, Error::UnsupportedContractShape { identity } if identity == "Hello"));
    }

    #[test]
    fn test_contract_must_have_two_arguments() {
        let types = TypeIndex::new().alias(
            "app",
            TypeAlias::new("Hello", TypeExpr::generic("Contract", vec![TypeExpr::Struct(vec![])])),
        );
        let err = ContractIntrospector::new(&types).introspect("app", "Hello").unwrap_err();
        assert!(matches!(err, Error::UnsupportedContractShape { .. }));
    }

    #[test]
    fn test_alias_chain_is_followed() {
        let types = TypeIndex::new()
            .alias("app", TypeAlias::new("Request", TypeExpr::reference("PersonInput")))
            .alias(
                "app",
                TypeAlias::new("PersonInput", TypeExpr::Struct(vec![FieldDecl::new("age", "number")])),
            )
            .alias("app", contract(TypeExpr::reference("Request"), TypeExpr::Struct(vec![])));

        let contract = ContractIntrospector::new(&types).introspect("app", "Hello").unwrap();
        assert_eq!(contract.request.name, "Request");
        assert_eq!(contract.request.fields[0].name, "age");
    }

    #[test]
    fn test_self_referencing_alias_is_unsupported() {
        let types = TypeIndex::new()
            .alias("app", TypeAlias::new("Request", TypeExpr::reference("Request")))
            .alias("app", contract(TypeExpr::reference("Request"), TypeExpr::Struct(vec![])));

        let err = ContractIntrospector::new(&types).introspect("app", "Hello").unwrap_err();
        assert!(matches!(err, Error::UnsupportedContractShape { identity } if identity == "Request"));
    }

    #[test]
    fn test_field_decode_warning_is_collected() {
        let types = TypeIndex::new().alias(
            "app",
            contract(
                TypeExpr::Struct(vec![FieldDecl::new("age", "number").doc("@Xyz {\"}")]),
                TypeExpr::Struct(vec![]),
            ),
        );

        let contract = ContractIntrospector::new(&types).introspect("app", "Hello").unwrap();
        assert_eq!(contract.warnings.len(), 1);
        assert_eq!(contract.request.fields[0].annotations[0].text(), Some("{\"}"));
    }
}
