use std::path::Path;

use apollo_compiler::ast::{Directive, DirectiveDefinition, DirectiveLocation, OperationType};
use apollo_compiler::schema::{ExtendedType, InputValueDefinition, NamedType};
use apollo_compiler::validation::Valid;
use apollo_compiler::{name, ty, Node, Schema};
use itertools::Itertools;

use crate::error::{SingleTypegenError, TypegenError};

pub(crate) const EXPORT_TYPE_DIRECTIVE: &str = "exportType";
pub(crate) const EXPORT_TYPE_NAME_ARGUMENT: &str = "name";
pub(crate) const RELAY_DIRECTIVE: &str = "relay";
pub(crate) const RELAY_PLURAL_ARGUMENT: &str = "plural";

const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TypeKind {
    #[strum(to_string = "scalar")]
    Scalar,
    #[strum(to_string = "object")]
    Object,
    #[strum(to_string = "interface")]
    Interface,
    #[strum(to_string = "union")]
    Union,
    #[strum(to_string = "enum")]
    Enum,
    #[strum(to_string = "input object")]
    InputObject,
}

impl From<&ExtendedType> for TypeKind {
    fn from(value: &ExtendedType) -> Self {
        match value {
            ExtendedType::Scalar(_) => TypeKind::Scalar,
            ExtendedType::Object(_) => TypeKind::Object,
            ExtendedType::Interface(_) => TypeKind::Interface,
            ExtendedType::Union(_) => TypeKind::Union,
            ExtendedType::Enum(_) => TypeKind::Enum,
            ExtendedType::InputObject(_) => TypeKind::InputObject,
        }
    }
}

/// Documentation attached to a field definition on a concrete or interface type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMetadata {
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
}

/// A validated schema extended with the directives fragments may use to steer generation.
///
/// Wraps an apollo-compiler schema and answers the handful of questions the mapper and the
/// normalizer ask of it: which concrete types a composite type stands for, and what
/// documentation a field carries.
#[derive(Debug, Clone)]
pub struct TypegenSchema {
    schema: Valid<Schema>,
}

impl TypegenSchema {
    pub fn parse(sdl: &str, path: impl AsRef<Path>) -> Result<Self, TypegenError> {
        let schema = Schema::parse(sdl, path)?;
        Self::new(schema)
    }

    /// Registers `@exportType` and `@relay` unless the schema already declares them, then
    /// validates the result.
    pub fn new(mut schema: Schema) -> Result<Self, TypegenError> {
        for definition in [
            export_type_directive_definition(),
            relay_directive_definition(),
        ] {
            schema
                .directive_definitions
                .entry(definition.name.clone())
                .or_insert_with(|| Node::new(definition));
        }
        Ok(Self {
            schema: schema.validate()?,
        })
    }

    pub fn schema(&self) -> &Valid<Schema> {
        &self.schema
    }

    pub fn type_kind(&self, type_name: &str) -> Result<TypeKind, TypegenError> {
        self.schema
            .types
            .get(type_name)
            .map(TypeKind::from)
            .ok_or_else(|| {
                SingleTypegenError::UnknownType {
                    name: type_name.to_owned(),
                }
                .into()
            })
    }

    /// Member names of an enum type, in declaration order.
    pub fn enum_values(&self, type_name: &str) -> Option<Vec<String>> {
        match self.schema.types.get(type_name)? {
            ExtendedType::Enum(enum_type) => Some(
                enum_type
                    .values
                    .keys()
                    .map(|value| value.to_string())
                    .collect(),
            ),
            _ => None,
        }
    }

    /// The concrete object types `type_name` may resolve to at runtime, sorted by name.
    pub fn possible_types(&self, type_name: &str) -> Result<Vec<NamedType>, TypegenError> {
        let Some((name, ty)) = self.schema.types.get_key_value(type_name) else {
            return Err(SingleTypegenError::UnknownType {
                name: type_name.to_owned(),
            }
            .into());
        };
        match ty {
            ExtendedType::Object(_) => Ok(vec![name.clone()]),
            ExtendedType::Interface(_) | ExtendedType::Union(_) => Ok(self
                .schema
                .types
                .iter()
                .filter(|(candidate, ty)| {
                    matches!(ty, ExtendedType::Object(_)) && self.schema.is_subtype(name, candidate)
                })
                .map(|(candidate, _)| candidate.clone())
                .sorted_by(|a, b| a.as_str().cmp(b.as_str()))
                .collect()),
            other => Err(SingleTypegenError::NotCompositeType {
                name: name.to_string(),
                kind: other.into(),
            }
            .into()),
        }
    }

    /// Description and deprecation of `field_name` as declared on `type_name`. Meta fields
    /// such as `__typename` have no declaration and yield `None`.
    pub fn field_metadata(&self, type_name: &str, field_name: &str) -> Option<FieldMetadata> {
        let definition = match self.schema.types.get(type_name)? {
            ExtendedType::Object(object) => object.fields.get(field_name)?,
            ExtendedType::Interface(interface) => interface.fields.get(field_name)?,
            _ => return None,
        };
        Some(FieldMetadata {
            description: definition
                .description
                .as_ref()
                .map(|description| description.to_string()),
            deprecation_reason: deprecation_reason(
                definition
                    .directives
                    .get("deprecated")
                    .map(|directive| &**directive),
            ),
        })
    }

    pub fn root_operation_type(
        &self,
        operation_type: OperationType,
    ) -> Result<NamedType, TypegenError> {
        self.schema
            .root_operation(operation_type)
            .cloned()
            .ok_or_else(|| SingleTypegenError::UndefinedRootType { operation_type }.into())
    }
}

/// The reason a `@deprecated` directive gives, defaulting to the GraphQL default reason.
pub(crate) fn deprecation_reason(deprecated: Option<&Directive>) -> Option<String> {
    let deprecated = deprecated?;
    let reason = deprecated
        .specified_argument_by_name("reason")
        .and_then(|value| value.as_str())
        .map(str::to_owned)
        .unwrap_or_else(|| DEFAULT_DEPRECATION_REASON.to_owned());
    Some(reason)
}

/// directive @exportType(name: String!) on FIELD
fn export_type_directive_definition() -> DirectiveDefinition {
    DirectiveDefinition {
        name: name!("exportType"),
        description: None,
        arguments: vec![Node::new(InputValueDefinition {
            name: name!("name"),
            description: None,
            directives: Default::default(),
            ty: ty!(String!).into(),
            default_value: None,
        })],
        locations: vec![DirectiveLocation::Field],
        repeatable: false,
    }
}

/// directive @relay(plural: Boolean) on FRAGMENT_DEFINITION
fn relay_directive_definition() -> DirectiveDefinition {
    DirectiveDefinition {
        name: name!("relay"),
        description: None,
        arguments: vec![Node::new(InputValueDefinition {
            name: name!("plural"),
            description: None,
            directives: Default::default(),
            ty: ty!(Boolean).into(),
            default_value: None,
        })],
        locations: vec![DirectiveLocation::FragmentDefinition],
        repeatable: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SDL: &str = r#"
        type Query {
          node(id: ID!): Node
          search: [SearchResult]
        }

        interface Node {
          "The id of the object."
          id: ID!
        }

        type Planet implements Node {
          "The ID of an object"
          id: ID!
          "The name of this planet."
          name: String @deprecated(reason: "Use title")
          diameter: Int @deprecated
        }

        type Person implements Node {
          id: ID!
          name: String
        }

        type Film {
          title: String
        }

        union SearchResult = Planet | Film

        enum Episode { NEWHOPE EMPIRE JEDI }
    "#;

    fn schema() -> TypegenSchema {
        TypegenSchema::parse(SDL, "schema.graphql").unwrap()
    }

    #[test]
    fn registers_typegen_directives() {
        let schema = schema();
        assert!(schema
            .schema()
            .directive_definitions
            .contains_key(EXPORT_TYPE_DIRECTIVE));
        assert!(schema
            .schema()
            .directive_definitions
            .contains_key(RELAY_DIRECTIVE));
    }

    #[test]
    fn possible_types_are_sorted() {
        let schema = schema();
        let names = |ty: &str| {
            schema
                .possible_types(ty)
                .unwrap()
                .into_iter()
                .map(|name| name.to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(names("Node"), vec!["Person", "Planet"]);
        assert_eq!(names("SearchResult"), vec!["Film", "Planet"]);
        assert_eq!(names("Planet"), vec!["Planet"]);
    }

    #[test]
    fn possible_types_rejects_leaf_types() {
        let error = schema().possible_types("Episode").unwrap_err();
        assert_eq!(
            error,
            SingleTypegenError::NotCompositeType {
                name: "Episode".to_owned(),
                kind: TypeKind::Enum,
            }
            .into()
        );
    }

    #[test]
    fn reads_field_metadata() {
        let schema = schema();
        assert_eq!(
            schema.field_metadata("Planet", "name"),
            Some(FieldMetadata {
                description: Some("The name of this planet.".to_owned()),
                deprecation_reason: Some("Use title".to_owned()),
            })
        );
        assert_eq!(
            schema.field_metadata("Planet", "diameter"),
            Some(FieldMetadata {
                description: None,
                deprecation_reason: Some("No longer supported".to_owned()),
            })
        );
        assert_eq!(
            schema
                .field_metadata("Node", "id")
                .and_then(|meta| meta.description),
            Some("The id of the object.".to_owned())
        );
        assert_eq!(schema.field_metadata("Planet", "__typename"), None);
    }

    #[test]
    fn missing_root_operation_type_is_an_error() {
        let error = schema()
            .root_operation_type(OperationType::Mutation)
            .unwrap_err();
        assert!(matches!(
            error,
            TypegenError::Single(SingleTypegenError::UndefinedRootType { .. })
        ));
    }

    #[test]
    fn reads_enum_values() {
        assert_eq!(
            schema().enum_values("Episode"),
            Some(vec![
                "NEWHOPE".to_owned(),
                "EMPIRE".to_owned(),
                "JEDI".to_owned()
            ])
        );
    }
}
