//! Flattening of mapped selections into per-concrete-type shapes.
//!
//! For every object position the normalizer works out which concrete types the position may
//! hold, pushes the fields of every applicable fragment spread down onto those types, and
//! then merges whatever ended up identical. The result is either one shape valid for every
//! possible type, or one shape per type that needs its own plus a single shape for the rest.

use apollo_compiler::schema::NamedType;
use indexmap::IndexMap;
use itertools::Itertools;

use crate::error::TypegenError;
use crate::schema::TypegenSchema;
use crate::types::FieldInfo;
use crate::types::FlattenedField;
use crate::types::FlattenedObjectType;
use crate::types::FlattenedSpread;
use crate::types::FlattenedType;
use crate::types::FragmentType;
use crate::types::ObjectType;
use crate::types::RestObjectType;
use crate::types::SingleObjectType;
use crate::types::SpecificObjectType;
use crate::types::SpreadObjectType;

pub fn normalize_type(
    schema: &TypegenSchema,
    ty: &ObjectType,
) -> Result<FlattenedObjectType, TypegenError> {
    let possible_types = schema.possible_types(&ty.schema_type)?;
    tracing::trace!(
        schema_type = %ty.schema_type,
        possible_types = ?possible_types,
        "normalizing object"
    );
    let fields = normalize_fields(schema, &ty.fields)?;
    let mut spreads = collapse_fragment_spreads(
        &fields,
        flatten_fragment_spreads(schema, ty, &possible_types)?,
    );

    if spreads.is_empty() {
        return Ok(FlattenedObjectType::Single(SingleObjectType {
            fields: describe_fields(
                schema,
                with_typename_values(fields, &possible_types),
                &ty.schema_type,
            ),
            schema_types: possible_types,
        }));
    }

    if fields.is_empty()
        && spreads.len() == 1
        && possible_types.len() == 1
        && possible_types[0] == spreads[0].schema_type
    {
        let spread = spreads.remove(0);
        let schema_types = vec![spread.schema_type.clone()];
        return Ok(FlattenedObjectType::Single(SingleObjectType {
            fields: describe_fields(
                schema,
                with_typename_values(spread.fields, &schema_types),
                &spread.schema_type,
            ),
            schema_types,
        }));
    }

    let (covered_types, missing_types): (Vec<_>, Vec<_>) = possible_types
        .iter()
        .cloned()
        .partition(|possible| spreads.iter().any(|spread| spread.schema_type == *possible));

    // Every covered type also carries the fields selected directly on the object.
    let with_parent_fields = covered_types
        .into_iter()
        .map(|schema_type| SpecificObjectType {
            schema_type,
            fields: fields.clone(),
        });
    spreads.extend(with_parent_fields);

    let mut flattened = collapse_fragment_spreads(&[], spreads)
        .into_iter()
        .map(|spread| {
            let schema_types = std::slice::from_ref(&spread.schema_type);
            FlattenedSpread::Specific(SpecificObjectType {
                fields: describe_fields(
                    schema,
                    with_typename_values(spread.fields, schema_types),
                    &spread.schema_type,
                ),
                schema_type: spread.schema_type,
            })
        })
        .collect::<Vec<_>>();

    if !missing_types.is_empty() {
        let rest_fields = fields
            .into_iter()
            .sorted_by(|a, b| a.response_name.cmp(&b.response_name))
            .collect();
        flattened.push(FlattenedSpread::Rest(RestObjectType {
            fields: describe_fields(
                schema,
                with_typename_values(rest_fields, &missing_types),
                &ty.schema_type,
            ),
            schema_types: missing_types,
        }));
    }

    Ok(FlattenedObjectType::Spread(SpreadObjectType {
        spreads: flattened,
        schema_types: possible_types,
    }))
}

/// Normalizes any node of a mapped tree. Wrappers and scalars carry over unchanged.
pub fn normalize_wrapped_type(
    schema: &TypegenSchema,
    ty: &FragmentType,
) -> Result<FlattenedType, TypegenError> {
    Ok(match ty {
        FragmentType::Object(object) => FlattenedType::Object(normalize_type(schema, object)?),
        FragmentType::NonNull(inner) => {
            FlattenedType::NonNull(Box::new(normalize_wrapped_type(schema, inner)?))
        }
        FragmentType::List(element) => {
            FlattenedType::List(Box::new(normalize_wrapped_type(schema, element)?))
        }
        FragmentType::Scalar(scalar) => FlattenedType::Scalar(scalar.clone()),
    })
}

fn normalize_fields(
    schema: &TypegenSchema,
    fields: &[FieldInfo],
) -> Result<Vec<FlattenedField>, TypegenError> {
    fields
        .iter()
        .map(|field| {
            Ok(FlattenedField {
                field_name: field.field_name.to_string(),
                response_name: field.response_name.to_string(),
                export_name: field.export_name.clone(),
                ty: normalize_wrapped_type(schema, &field.ty)?,
                description: None,
                deprecation_reason: None,
            })
        })
        .collect()
}

/// Pushes the fields of every spread under `ty` onto each concrete type the spread applies
/// to. Spreads nested inside a spread only apply to the types of their enclosing spread, and
/// come before the enclosing spread's own fields.
fn flatten_fragment_spreads(
    schema: &TypegenSchema,
    ty: &ObjectType,
    possible_types: &[NamedType],
) -> Result<Vec<SpecificObjectType>, TypegenError> {
    let mut flattened = vec![];
    for spread in &ty.fragment_spreads {
        let spread_types = schema
            .possible_types(&spread.schema_type)?
            .into_iter()
            .filter(|spread_type| possible_types.contains(spread_type))
            .collect::<Vec<_>>();
        flattened.extend(flatten_fragment_spreads(schema, spread, &spread_types)?);

        let fields = normalize_fields(schema, &spread.fields)?;
        flattened.extend(
            spread_types
                .into_iter()
                .map(|schema_type| SpecificObjectType {
                    schema_type,
                    fields: fields.clone(),
                }),
        );
    }
    Ok(flattened)
}

/// Merges spreads of the same concrete type.
///
/// Within a type the first field with a given response name wins, and fields identical to a
/// same-named entry of `parent_fields` are dropped. Types left without fields are dropped.
/// The result is sorted by type name, and each field list by response name.
fn collapse_fragment_spreads(
    parent_fields: &[FlattenedField],
    spreads: Vec<SpecificObjectType>,
) -> Vec<SpecificObjectType> {
    let mut grouped: IndexMap<NamedType, Vec<FlattenedField>> = IndexMap::new();
    for spread in spreads {
        grouped
            .entry(spread.schema_type)
            .or_default()
            .extend(spread.fields);
    }

    grouped
        .into_iter()
        .filter_map(|(schema_type, fields)| {
            let fields = fields
                .into_iter()
                .unique_by(|field| field.response_name.clone())
                .filter(|field| {
                    !parent_fields.iter().any(|parent| {
                        parent.response_name == field.response_name
                            && is_same_type(&parent.ty, &field.ty)
                    })
                })
                .sorted_by(|a, b| a.response_name.cmp(&b.response_name))
                .collect::<Vec<_>>();
            (!fields.is_empty()).then_some(SpecificObjectType {
                schema_type,
                fields,
            })
        })
        .sorted_by(|a, b| a.schema_type.as_str().cmp(b.schema_type.as_str()))
        .collect()
}

/// Narrows every `__typename` field to the names of `schema_types`.
fn with_typename_values(
    fields: Vec<FlattenedField>,
    schema_types: &[NamedType],
) -> Vec<FlattenedField> {
    let names = schema_types
        .iter()
        .map(|schema_type| schema_type.to_string())
        .collect::<Vec<_>>();
    fields
        .into_iter()
        .map(|field| {
            if field.is_typename() {
                FlattenedField {
                    ty: with_known_values(field.ty, &names),
                    ..field
                }
            } else {
                field
            }
        })
        .collect()
}

pub(crate) fn with_known_values(ty: FlattenedType, names: &[String]) -> FlattenedType {
    match ty {
        FlattenedType::NonNull(inner) => {
            FlattenedType::NonNull(Box::new(with_known_values(*inner, names)))
        }
        FlattenedType::List(element) => {
            FlattenedType::List(Box::new(with_known_values(*element, names)))
        }
        FlattenedType::Scalar(mut scalar) => {
            scalar.known_possible_values = Some(names.to_vec());
            FlattenedType::Scalar(scalar)
        }
        other => other,
    }
}

/// Attaches the description and deprecation that `schema_type` declares for each field.
fn describe_fields(
    schema: &TypegenSchema,
    fields: Vec<FlattenedField>,
    schema_type: &NamedType,
) -> Vec<FlattenedField> {
    fields
        .into_iter()
        .map(|field| {
            let metadata = schema
                .field_metadata(schema_type, &field.field_name)
                .unwrap_or_default();
            FlattenedField {
                description: metadata.description,
                deprecation_reason: metadata.deprecation_reason,
                ..field
            }
        })
        .collect()
}

/// Structural equality as far as the generated types are concerned.
///
/// Scalars compare by schema type only, so `ID` and `String` differ even though both print the
/// same. Object fields are matched by response name and type sets compare as sets.
pub fn is_same_type(a: &FlattenedType, b: &FlattenedType) -> bool {
    match (a, b) {
        (FlattenedType::Object(a), FlattenedType::Object(b)) => is_same_object_type(a, b),
        (FlattenedType::List(a), FlattenedType::List(b)) => is_same_type(a, b),
        (FlattenedType::NonNull(a), FlattenedType::NonNull(b)) => is_same_type(a, b),
        (FlattenedType::Scalar(a), FlattenedType::Scalar(b)) => a.name == b.name,
        (FlattenedType::Reference(a), FlattenedType::Reference(b)) => {
            a.names.len() == b.names.len() && a.names.iter().all(|name| b.names.contains(name))
        }
        _ => false,
    }
}

fn is_same_object_type(a: &FlattenedObjectType, b: &FlattenedObjectType) -> bool {
    if a.schema_types().len() != b.schema_types().len() {
        return false;
    }
    let same_shape = match (a, b) {
        (FlattenedObjectType::Single(a), FlattenedObjectType::Single(b)) => {
            a.fields.len() == b.fields.len() && fields_match(&a.fields, &b.fields)
        }
        (FlattenedObjectType::Spread(a), FlattenedObjectType::Spread(b)) => {
            a.spreads.len() == b.spreads.len()
                && a.spreads.iter().all(|spread| {
                    b.spreads
                        .iter()
                        .find(|other| is_same_spread_target(spread, other))
                        .is_some_and(|other| fields_match(spread.fields(), other.fields()))
                })
        }
        _ => false,
    };
    same_shape
        && a.schema_types()
            .iter()
            .all(|schema_type| b.schema_types().contains(schema_type))
}

fn is_same_spread_target(a: &FlattenedSpread, b: &FlattenedSpread) -> bool {
    match (a, b) {
        (FlattenedSpread::Specific(a), FlattenedSpread::Specific(b)) => {
            a.schema_type == b.schema_type
        }
        (FlattenedSpread::Rest(a), FlattenedSpread::Rest(b)) => a.schema_types == b.schema_types,
        _ => false,
    }
}

/// Every field of `fields` has a same-named, same-typed counterpart in `others`.
fn fields_match(fields: &[FlattenedField], others: &[FlattenedField]) -> bool {
    fields.iter().all(|field| {
        others
            .iter()
            .find(|other| other.response_name == field.response_name)
            .is_some_and(|other| is_same_type(&field.ty, &other.ty))
    })
}

#[cfg(test)]
mod tests {
    use apollo_compiler::name;
    use apollo_compiler::Name;
    use apollo_compiler::Node;

    use super::*;
    use crate::types::ReferenceType;
    use crate::types::ScalarType;

    const SDL: &str = r#"
        type Query { node(id: ID!): Node }

        interface Node {
          "The id of the object."
          id: ID!
        }

        type Planet implements Node {
          "The ID of an object"
          id: ID!
          "The name of this planet."
          name: String
        }

        type Person implements Node {
          "The ID of an object"
          id: ID!
          name: String
          gender: String
          "The birth year of the person."
          birthYear: String @deprecated(reason: "Use age")
        }

        type Film implements Node {
          "The ID of an object"
          id: ID!
          title: String
        }
    "#;

    fn schema() -> TypegenSchema {
        TypegenSchema::parse(SDL, "schema.graphql").unwrap()
    }

    fn string() -> FragmentType {
        FragmentType::Scalar(ScalarType::new(name!("String")))
    }

    fn field(name: Name, ty: FragmentType) -> FieldInfo {
        FieldInfo {
            field_name: name.clone(),
            response_name: name,
            export_name: None,
            ty,
        }
    }

    fn id_field() -> FieldInfo {
        field(
            name!("id"),
            FragmentType::NonNull(Box::new(FragmentType::Scalar(ScalarType::new(name!("ID"))))),
        )
    }

    fn typename_field() -> FieldInfo {
        field(
            name!("__typename"),
            FragmentType::NonNull(Box::new(string())),
        )
    }

    fn object(schema_type: Name, fields: Vec<FieldInfo>, spreads: Vec<ObjectType>) -> ObjectType {
        ObjectType {
            schema_type,
            fields,
            fragment_spreads: spreads.into_iter().map(Node::new).collect(),
        }
    }

    fn response_names(fields: &[FlattenedField]) -> Vec<&str> {
        fields
            .iter()
            .map(|field| field.response_name.as_str())
            .collect()
    }

    fn typename_values(fields: &[FlattenedField]) -> Option<Vec<String>> {
        fields
            .iter()
            .find(|field| field.is_typename())
            .and_then(|field| match &field.ty {
                FlattenedType::NonNull(inner) => match inner.as_ref() {
                    FlattenedType::Scalar(scalar) => scalar.known_possible_values.clone(),
                    _ => None,
                },
                _ => None,
            })
    }

    #[test]
    fn single_type_without_spreads_stays_single() {
        let ty = object(
            name!("Planet"),
            vec![field(name!("name"), string()), id_field()],
            vec![],
        );
        let FlattenedObjectType::Single(single) = normalize_type(&schema(), &ty).unwrap() else {
            panic!("expected a single object");
        };
        assert_eq!(single.schema_types, vec![name!("Planet")]);
        assert_eq!(response_names(&single.fields), vec!["name", "id"]);
        assert_eq!(
            single.fields[0].description.as_deref(),
            Some("The name of this planet.")
        );
    }

    #[test]
    fn excluded_everything_normalizes_to_empty_single() {
        let ty = object(name!("Planet"), vec![], vec![]);
        assert_eq!(
            normalize_type(&schema(), &ty).unwrap(),
            FlattenedObjectType::Single(SingleObjectType {
                fields: vec![],
                schema_types: vec![name!("Planet")],
            })
        );
    }

    #[test]
    fn interface_without_spreads_is_single_over_all_types() {
        let ty = object(name!("Node"), vec![typename_field(), id_field()], vec![]);
        let FlattenedObjectType::Single(single) = normalize_type(&schema(), &ty).unwrap() else {
            panic!("expected a single object");
        };
        assert_eq!(
            single.schema_types,
            vec![name!("Film"), name!("Person"), name!("Planet")]
        );
        assert_eq!(
            typename_values(&single.fields),
            Some(vec![
                "Film".to_owned(),
                "Person".to_owned(),
                "Planet".to_owned()
            ])
        );
        assert_eq!(
            single.fields[1].description.as_deref(),
            Some("The id of the object.")
        );
    }

    #[test]
    fn spreads_split_per_type_with_rest() {
        let ty = object(
            name!("Node"),
            vec![id_field(), typename_field()],
            vec![
                object(
                    name!("Planet"),
                    vec![field(name!("name"), string())],
                    vec![],
                ),
                object(
                    name!("Person"),
                    vec![
                        field(name!("gender"), string()),
                        field(name!("birthYear"), string()),
                    ],
                    vec![],
                ),
            ],
        );
        let FlattenedObjectType::Spread(spread) = normalize_type(&schema(), &ty).unwrap() else {
            panic!("expected a spread object");
        };
        assert_eq!(spread.spreads.len(), 3);

        let FlattenedSpread::Specific(person) = &spread.spreads[0] else {
            panic!("expected Person first");
        };
        assert_eq!(person.schema_type, name!("Person"));
        assert_eq!(
            response_names(&person.fields),
            vec!["__typename", "birthYear", "gender", "id"]
        );
        assert_eq!(
            typename_values(&person.fields),
            Some(vec!["Person".to_owned()])
        );
        assert_eq!(
            person.fields[1].deprecation_reason.as_deref(),
            Some("Use age")
        );
        assert_eq!(
            person.fields[3].description.as_deref(),
            Some("The ID of an object")
        );

        let FlattenedSpread::Specific(planet) = &spread.spreads[1] else {
            panic!("expected Planet second");
        };
        assert_eq!(
            response_names(&planet.fields),
            vec!["__typename", "id", "name"]
        );

        let FlattenedSpread::Rest(rest) = &spread.spreads[2] else {
            panic!("expected a rest object last");
        };
        assert_eq!(rest.schema_types, vec![name!("Film")]);
        assert_eq!(response_names(&rest.fields), vec!["__typename", "id"]);
        assert_eq!(typename_values(&rest.fields), Some(vec!["Film".to_owned()]));
        assert_eq!(
            rest.fields[1].description.as_deref(),
            Some("The id of the object.")
        );
    }

    #[test]
    fn spread_types_partition_possible_types() {
        let ty = object(
            name!("Node"),
            vec![id_field()],
            vec![object(
                name!("Person"),
                vec![field(name!("name"), string())],
                vec![],
            )],
        );
        let normalized = normalize_type(&schema(), &ty).unwrap();
        let FlattenedObjectType::Spread(spread) = &normalized else {
            panic!("expected a spread object");
        };
        let covered = spread
            .spreads
            .iter()
            .flat_map(|spread| spread.schema_types().iter().cloned())
            .sorted_by(|a, b| a.as_str().cmp(b.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(covered, spread.schema_types);
    }

    #[test]
    fn spread_fields_identical_to_parent_fields_collapse() {
        let ty = object(
            name!("Planet"),
            vec![field(name!("name"), string())],
            vec![object(
                name!("Planet"),
                vec![field(name!("name"), string())],
                vec![],
            )],
        );
        let FlattenedObjectType::Single(single) = normalize_type(&schema(), &ty).unwrap() else {
            panic!("expected a single object");
        };
        assert_eq!(response_names(&single.fields), vec!["name"]);
    }

    #[test]
    fn lone_spread_on_concrete_type_becomes_single() {
        let ty = object(
            name!("Planet"),
            vec![],
            vec![object(
                name!("Node"),
                vec![id_field()],
                vec![object(
                    name!("Planet"),
                    vec![field(name!("name"), string())],
                    vec![],
                )],
            )],
        );
        let FlattenedObjectType::Single(single) = normalize_type(&schema(), &ty).unwrap() else {
            panic!("expected a single object");
        };
        assert_eq!(single.schema_types, vec![name!("Planet")]);
        assert_eq!(response_names(&single.fields), vec!["id", "name"]);
    }

    #[test]
    fn nested_spreads_only_apply_within_their_parent_spread() {
        // `... on Node { ... on Person { gender } }` inside a Planet selection can never match.
        let ty = object(
            name!("Planet"),
            vec![field(name!("name"), string())],
            vec![object(
                name!("Node"),
                vec![],
                vec![object(
                    name!("Person"),
                    vec![field(name!("gender"), string())],
                    vec![],
                )],
            )],
        );
        let FlattenedObjectType::Single(single) = normalize_type(&schema(), &ty).unwrap() else {
            panic!("expected a single object");
        };
        assert_eq!(response_names(&single.fields), vec!["name"]);
    }

    #[test]
    fn scalars_compare_by_schema_type() {
        let id = FlattenedType::Scalar(ScalarType::new(name!("ID")));
        let string = FlattenedType::Scalar(ScalarType::new(name!("String")));
        assert!(is_same_type(&id, &id.clone()));
        assert!(!is_same_type(&id, &string));
        assert!(!is_same_type(
            &FlattenedType::NonNull(Box::new(id.clone())),
            &id
        ));
    }

    #[test]
    fn references_compare_as_sets() {
        let a = FlattenedType::Reference(ReferenceType {
            names: vec!["Film".to_owned(), "Person".to_owned()],
        });
        let b = FlattenedType::Reference(ReferenceType {
            names: vec!["Person".to_owned(), "Film".to_owned()],
        });
        let c = FlattenedType::Reference(ReferenceType {
            names: vec!["Person".to_owned()],
        });
        assert!(is_same_type(&a, &b));
        assert!(!is_same_type(&a, &c));
    }

    #[test]
    fn objects_compare_schema_types_as_sets() {
        let single = |types: Vec<Name>| {
            FlattenedType::Object(FlattenedObjectType::Single(SingleObjectType {
                fields: vec![],
                schema_types: types,
            }))
        };
        assert!(is_same_type(
            &single(vec![name!("Film"), name!("Planet")]),
            &single(vec![name!("Planet"), name!("Film")])
        ));
        assert!(!is_same_type(
            &single(vec![name!("Film")]),
            &single(vec![name!("Planet")])
        ));
    }

    #[test]
    fn fully_covered_interface_has_no_rest() {
        let schema = TypegenSchema::parse(
            r#"
                type Query { node(id: ID!): Node }
                interface Node { id: ID! }
                type Planet implements Node { id: ID! name: String }
                type Person implements Node { id: ID! gender: String birthYear: String }
            "#,
            "schema.graphql",
        )
        .unwrap();
        let ty = object(
            name!("Node"),
            vec![id_field()],
            vec![
                object(
                    name!("Planet"),
                    vec![field(name!("name"), string())],
                    vec![],
                ),
                object(
                    name!("Person"),
                    vec![
                        field(name!("gender"), string()),
                        field(name!("birthYear"), string()),
                    ],
                    vec![],
                ),
            ],
        );

        let normalized = normalize_type(&schema, &ty).unwrap();
        let FlattenedObjectType::Spread(spread) = &normalized else {
            panic!("expected a spread object");
        };
        assert_eq!(spread.spreads.len(), 2);
        assert!(spread
            .spreads
            .iter()
            .all(|spread| matches!(spread, FlattenedSpread::Specific(_))));
        assert_eq!(spread.spreads[0].schema_types(), &[name!("Person")]);
        assert_eq!(
            response_names(spread.spreads[0].fields()),
            vec!["birthYear", "gender", "id"]
        );
        assert_eq!(spread.spreads[1].schema_types(), &[name!("Planet")]);
        assert_eq!(
            response_names(spread.spreads[1].fields()),
            vec!["id", "name"]
        );

        let printed =
            crate::printer::print_type(false, &FlattenedType::Object(normalized), false, 0);
        insta::assert_snapshot!(printed, @r###"
        {
          birthYear: string | null;

          gender: string | null;

          id: string;
        } | {
          id: string;

          name: string | null;
        }
        "###);
    }
}
