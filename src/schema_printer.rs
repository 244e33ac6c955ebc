//! Declarations derived from the schema alone: input objects, enums and type brands.

use apollo_compiler::ast::OperationType;
use apollo_compiler::ast::Type;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::schema::InputObjectType;
use itertools::Itertools;

use crate::printer::print_doc_comment;
use crate::schema::deprecation_reason;
use crate::schema::TypegenSchema;

const INDENT: &str = "  ";

fn is_introspection_type(name: &str) -> bool {
    name.starts_with("__")
}

/// Prints every input object as an interface and every enum as a string literal union.
///
/// Entries are sorted and separated by a blank line.
pub fn print_input_object_types(schema: &TypegenSchema) -> String {
    schema
        .schema()
        .types
        .iter()
        .filter(|(name, _)| !is_introspection_type(name))
        .filter_map(|(name, ty)| match ty {
            ExtendedType::InputObject(input_object) => Some(format!(
                "export interface {name} {{\n{}\n}}",
                print_input_fields(schema, input_object)
            )),
            ExtendedType::Enum(enum_type) => Some(format!(
                "export type {name} = {};",
                enum_type
                    .values
                    .keys()
                    .map(|value| serde_json::Value::from(value.as_str()).to_string())
                    .join(" | ")
            )),
            _ => None,
        })
        .sorted()
        .join("\n\n")
}

fn print_input_fields(schema: &TypegenSchema, input_object: &InputObjectType) -> String {
    input_object
        .fields
        .iter()
        .sorted_by(|(a, _), (b, _)| a.as_str().cmp(b.as_str()))
        .map(|(name, field)| {
            let optional = if field.default_value.is_some() || !field.ty.is_non_null() {
                "?"
            } else {
                ""
            };
            let doc = print_doc_comment(
                field.description.as_deref(),
                deprecation_reason(
                    field
                        .directives
                        .get("deprecated")
                        .map(|directive| &**directive),
                )
                .as_deref(),
                INDENT,
            );
            format!(
                "{doc}{INDENT}{name}{optional}: {};",
                print_input_type(schema, true, &field.ty)
            )
        })
        .join("\n")
}

fn print_input_type(schema: &TypegenSchema, nullable: bool, ty: &Type) -> String {
    let printed = match ty {
        Type::NonNullNamed(_) | Type::NonNullList(_) if nullable => {
            return print_input_type(schema, false, ty);
        }
        Type::Named(name) | Type::NonNullNamed(name) => match schema.schema().types.get(name) {
            Some(ExtendedType::Enum(_)) | Some(ExtendedType::InputObject(_)) => name.to_string(),
            _ => match name.as_str() {
                "Int" | "Float" => "number".to_owned(),
                "Boolean" => "boolean".to_owned(),
                _ => "string".to_owned(),
            },
        },
        Type::List(element) | Type::NonNullList(element) => {
            let element_text = print_input_type(schema, true, element);
            if element.is_non_null() {
                format!("{element_text}[]")
            } else {
                format!("({element_text})[]")
            }
        }
    };
    if nullable {
        format!("{printed} | null")
    } else {
        printed
    }
}

/// Prints an empty enum per object type to serve as a nominal brand.
///
/// Root operation types and introspection types are left out.
pub fn print_type_brands(schema: &TypegenSchema) -> String {
    let root_types = [
        OperationType::Query,
        OperationType::Mutation,
        OperationType::Subscription,
    ]
    .into_iter()
    .filter_map(|operation_type| schema.schema().root_operation(operation_type))
    .collect::<Vec<_>>();

    schema
        .schema()
        .types
        .iter()
        .filter(|(name, ty)| {
            ty.is_object() && !is_introspection_type(name) && !root_types.contains(name)
        })
        .map(|(name, _)| format!("export enum {name} {{}};"))
        .sorted()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    const SDL: &str = r#"
        schema {
          query: Root
          mutation: Mutation
        }

        type Root {
          planet(filter: PlanetFilter): Planet
        }

        type Mutation {
          rename(input: RenameInput!): Planet
        }

        type Planet {
          name: String
        }

        type Film {
          title: String
        }

        enum Episode { NEWHOPE EMPIRE JEDI }

        input PlanetFilter {
          "Matches planets whose name contains this text."
          nameContains: String
          episodes: [Episode!]
          limit: Int! = 10
          terrains: [String]!
          exact: Boolean @deprecated(reason: "Use nameContains")
        }

        input RenameInput {
          id: ID!
          names: [[String!]]
          filter: PlanetFilter
          weight: Float!
        }
    "#;

    fn schema() -> TypegenSchema {
        TypegenSchema::parse(SDL, "schema.graphql").unwrap()
    }

    #[test]
    fn prints_input_objects_and_enums() {
        assert_snapshot!(print_input_object_types(&schema()), @r###"
        export interface PlanetFilter {
          episodes?: Episode[] | null;
          /**
           * @deprecated Use nameContains
           */
          exact?: boolean | null;
          limit?: number;
          /**
           * Matches planets whose name contains this text.
           */
          nameContains?: string | null;
          terrains: (string | null)[];
        }

        export interface RenameInput {
          filter?: PlanetFilter | null;
          id: string;
          names?: (string[] | null)[] | null;
          weight: number;
        }

        export type Episode = "NEWHOPE" | "EMPIRE" | "JEDI";
        "###);
    }

    #[test]
    fn prints_brands_for_non_root_object_types() {
        assert_snapshot!(print_type_brands(&schema()), @r###"
        export enum Film {};
        export enum Planet {};
        "###);
    }
}
