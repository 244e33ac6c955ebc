//! Type brands: a synthetic field on every object shape naming the concrete type(s) it
//! stands for, so the generated types can be told apart without selecting `__typename`.

use std::collections::BTreeSet;

use apollo_compiler::schema::NamedType;

use crate::normalizer::with_known_values;
use crate::types::FlattenedField;
use crate::types::FlattenedObjectType;
use crate::types::FlattenedSpread;
use crate::types::FlattenedType;
use crate::types::ReferenceType;
use crate::types::SingleObjectType;
use crate::types::SpecificObjectType;
use crate::types::SpreadObjectType;

/// Field and response name of the brand field.
pub const BRAND_FIELD: &str = "";

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct TypeBrands {
    /// Every concrete type named anywhere in the tree, sorted.
    pub all_required_names: Vec<String>,
    /// The concrete types of the root object, sorted.
    pub fragment_type_names: Vec<String>,
}

/// Returns a copy of `ty` with a brand field leading every object shape, at any depth.
pub fn decorate_with_type_brands(ty: &FlattenedType) -> FlattenedType {
    match ty {
        FlattenedType::Object(object) => FlattenedType::Object(decorate_object_type(object)),
        FlattenedType::NonNull(inner) => {
            FlattenedType::NonNull(Box::new(decorate_with_type_brands(inner)))
        }
        FlattenedType::List(element) => {
            FlattenedType::List(Box::new(decorate_with_type_brands(element)))
        }
        FlattenedType::Scalar(_) | FlattenedType::Reference(_) => ty.clone(),
    }
}

/// Decorates one object. A single shape shared by several types is split into one shape per
/// type first, since a brand names exactly the types its shape covers.
pub fn decorate_object_type(ty: &FlattenedObjectType) -> FlattenedObjectType {
    match ty {
        FlattenedObjectType::Single(single) if single.schema_types.len() > 1 => {
            FlattenedObjectType::Spread(SpreadObjectType {
                spreads: single
                    .schema_types
                    .iter()
                    .map(|schema_type| {
                        let schema_types = std::slice::from_ref(schema_type);
                        let fields = narrow_typename(&single.fields, schema_type);
                        FlattenedSpread::Specific(SpecificObjectType {
                            schema_type: schema_type.clone(),
                            fields: decorate_fields(&fields, schema_types),
                        })
                    })
                    .collect(),
                schema_types: single.schema_types.clone(),
            })
        }
        FlattenedObjectType::Single(single) => FlattenedObjectType::Single(SingleObjectType {
            fields: decorate_fields(&single.fields, &single.schema_types),
            schema_types: single.schema_types.clone(),
        }),
        FlattenedObjectType::Spread(spread) => FlattenedObjectType::Spread(SpreadObjectType {
            spreads: spread
                .spreads
                .iter()
                .map(|spread| match spread {
                    FlattenedSpread::Specific(specific) => {
                        FlattenedSpread::Specific(SpecificObjectType {
                            schema_type: specific.schema_type.clone(),
                            fields: decorate_fields(&specific.fields, spread.schema_types()),
                        })
                    }
                    FlattenedSpread::Rest(rest) => {
                        let mut rest = rest.clone();
                        rest.fields = decorate_fields(&rest.fields, spread.schema_types());
                        FlattenedSpread::Rest(rest)
                    }
                })
                .collect(),
            schema_types: spread.schema_types.clone(),
        }),
    }
}

fn narrow_typename(fields: &[FlattenedField], schema_type: &NamedType) -> Vec<FlattenedField> {
    let names = [schema_type.to_string()];
    fields
        .iter()
        .map(|field| {
            if field.is_typename() {
                FlattenedField {
                    ty: with_known_values(field.ty.clone(), &names),
                    ..field.clone()
                }
            } else {
                field.clone()
            }
        })
        .collect()
}

fn decorate_fields(fields: &[FlattenedField], schema_types: &[NamedType]) -> Vec<FlattenedField> {
    let brand = FlattenedField {
        field_name: BRAND_FIELD.to_owned(),
        response_name: BRAND_FIELD.to_owned(),
        export_name: None,
        ty: FlattenedType::NonNull(Box::new(FlattenedType::Reference(ReferenceType {
            names: schema_types.iter().map(|name| name.to_string()).collect(),
        }))),
        description: None,
        deprecation_reason: None,
    };
    std::iter::once(brand)
        .chain(fields.iter().map(|field| FlattenedField {
            ty: decorate_with_type_brands(&field.ty),
            ..field.clone()
        }))
        .collect()
}

/// Collects the concrete type names a decorated tree needs declared.
pub fn get_type_brand_names(ty: &FlattenedType) -> TypeBrands {
    let mut all_names = BTreeSet::new();
    visit_type(ty, &mut all_names);

    let mut root_names = BTreeSet::new();
    if let Some(root) = root_object(ty) {
        collect_object_names(root, &mut root_names);
    }

    TypeBrands {
        all_required_names: all_names.into_iter().collect(),
        fragment_type_names: root_names.into_iter().collect(),
    }
}

fn root_object(ty: &FlattenedType) -> Option<&FlattenedObjectType> {
    match ty {
        FlattenedType::Object(object) => Some(object),
        FlattenedType::NonNull(inner) | FlattenedType::List(inner) => root_object(inner),
        FlattenedType::Scalar(_) | FlattenedType::Reference(_) => None,
    }
}

fn collect_object_names(object: &FlattenedObjectType, names: &mut BTreeSet<String>) {
    match object {
        FlattenedObjectType::Single(single) => {
            names.extend(single.schema_types.iter().map(|name| name.to_string()))
        }
        FlattenedObjectType::Spread(spread) => names.extend(
            spread
                .spreads
                .iter()
                .flat_map(|spread| spread.schema_types())
                .map(|name| name.to_string()),
        ),
    }
}

fn visit_type(ty: &FlattenedType, names: &mut BTreeSet<String>) {
    match ty {
        FlattenedType::Object(object) => {
            collect_object_names(object, names);
            match object {
                FlattenedObjectType::Single(single) => visit_fields(&single.fields, names),
                FlattenedObjectType::Spread(spread) => {
                    for spread in &spread.spreads {
                        visit_fields(spread.fields(), names);
                    }
                }
            }
        }
        FlattenedType::NonNull(inner) | FlattenedType::List(inner) => visit_type(inner, names),
        FlattenedType::Scalar(_) | FlattenedType::Reference(_) => {}
    }
}

fn visit_fields(fields: &[FlattenedField], names: &mut BTreeSet<String>) {
    for field in fields {
        visit_type(&field.ty, names);
    }
}
