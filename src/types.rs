//! The two trees the pipeline passes around.
//!
//! [`FragmentType`] mirrors the selection set it was mapped from: fields, plus the fragment
//! spreads applied at each level, nested the same way they were written. [`FlattenedType`] is
//! what normalization turns it into: every polymorphic position is resolved to either one
//! shape valid for all of its possible types, or one shape per concrete type.

use apollo_compiler::schema::NamedType;
use apollo_compiler::Name;
use apollo_compiler::Node;

/// Name of the meta field whose value identifies the concrete type of an object.
pub const TYPENAME_FIELD: &str = "__typename";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentType {
    Object(Node<ObjectType>),
    List(Box<FragmentType>),
    NonNull(Box<FragmentType>),
    Scalar(ScalarType),
}

impl FragmentType {
    pub fn as_object(&self) -> Option<&Node<ObjectType>> {
        match self {
            FragmentType::Object(object) => Some(object),
            _ => None,
        }
    }
}

/// A leaf: a scalar, or an enum together with the names of its values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarType {
    pub name: NamedType,
    pub known_possible_values: Option<Vec<String>>,
}

impl ScalarType {
    pub fn new(name: NamedType) -> Self {
        Self {
            name,
            known_possible_values: None,
        }
    }

    pub fn with_known_possible_values(name: NamedType, values: Vec<String>) -> Self {
        Self {
            name,
            known_possible_values: Some(values),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub field_name: Name,
    /// The alias if there is one, the field name otherwise.
    pub response_name: Name,
    pub export_name: Option<String>,
    pub ty: FragmentType,
}

/// One selection level on a composite type.
///
/// `fragment_spreads` holds one entry per inline fragment or named fragment spread written at
/// this level. Named fragments referenced more than once share the same node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectType {
    pub schema_type: NamedType,
    pub fields: Vec<FieldInfo>,
    pub fragment_spreads: Vec<Node<ObjectType>>,
}

impl ObjectType {
    pub fn new(schema_type: NamedType) -> Self {
        Self {
            schema_type,
            fields: Vec::new(),
            fragment_spreads: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlattenedType {
    Object(FlattenedObjectType),
    List(Box<FlattenedType>),
    /// Never wraps another `NonNull`.
    NonNull(Box<FlattenedType>),
    Scalar(ScalarType),
    Reference(ReferenceType),
}

impl FlattenedType {
    pub fn is_nullable(&self) -> bool {
        !matches!(self, FlattenedType::NonNull(_))
    }

    /// Strips an outer `NonNull`, if any.
    pub fn into_nullable(self) -> FlattenedType {
        match self {
            FlattenedType::NonNull(inner) => *inner,
            other => other,
        }
    }
}

/// A position filled by one or more externally declared types, such as a type brand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceType {
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlattenedObjectType {
    Single(SingleObjectType),
    Spread(SpreadObjectType),
}

impl FlattenedObjectType {
    /// Every concrete type this object may be, sorted by name.
    pub fn schema_types(&self) -> &[NamedType] {
        match self {
            FlattenedObjectType::Single(single) => &single.schema_types,
            FlattenedObjectType::Spread(spread) => &spread.schema_types,
        }
    }
}

/// One shape shared by all of `schema_types`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleObjectType {
    pub fields: Vec<FlattenedField>,
    pub schema_types: Vec<NamedType>,
}

/// A union of per-type shapes. The types covered by `spreads` partition `schema_types`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadObjectType {
    pub spreads: Vec<FlattenedSpread>,
    pub schema_types: Vec<NamedType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlattenedSpread {
    Specific(SpecificObjectType),
    Rest(RestObjectType),
}

impl FlattenedSpread {
    pub fn fields(&self) -> &[FlattenedField] {
        match self {
            FlattenedSpread::Specific(specific) => &specific.fields,
            FlattenedSpread::Rest(rest) => &rest.fields,
        }
    }

    pub fn schema_types(&self) -> &[NamedType] {
        match self {
            FlattenedSpread::Specific(specific) => std::slice::from_ref(&specific.schema_type),
            FlattenedSpread::Rest(rest) => &rest.schema_types,
        }
    }
}

/// The shape of exactly one concrete type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecificObjectType {
    pub schema_type: NamedType,
    pub fields: Vec<FlattenedField>,
}

/// The shape shared by every possible type that no fragment spread applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestObjectType {
    pub schema_types: Vec<NamedType>,
    pub fields: Vec<FlattenedField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedField {
    /// Empty for the synthetic brand field.
    pub field_name: String,
    pub response_name: String,
    pub export_name: Option<String>,
    pub ty: FlattenedType,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
}

impl FlattenedField {
    pub fn is_typename(&self) -> bool {
        self.field_name == TYPENAME_FIELD
    }
}

#[cfg(test)]
mod tests {
    use apollo_compiler::name;

    use super::*;

    #[test]
    fn spread_schema_types_cover_both_kinds() {
        let specific = FlattenedSpread::Specific(SpecificObjectType {
            schema_type: name!("Planet"),
            fields: vec![],
        });
        let rest = FlattenedSpread::Rest(RestObjectType {
            schema_types: vec![name!("Film"), name!("Person")],
            fields: vec![],
        });
        assert_eq!(specific.schema_types(), &[name!("Planet")]);
        assert_eq!(rest.schema_types(), &[name!("Film"), name!("Person")]);
    }

    #[test]
    fn into_nullable_strips_one_layer() {
        let scalar = FlattenedType::Scalar(ScalarType::new(name!("String")));
        let non_null = FlattenedType::NonNull(Box::new(scalar.clone()));
        assert!(!non_null.is_nullable());
        assert_eq!(non_null.into_nullable(), scalar);
        assert_eq!(scalar.clone().into_nullable(), scalar);
    }
}
