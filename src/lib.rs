//! Derives TypeScript type declarations from GraphQL fragments and operations.
//!
//! A document is validated against a [`TypegenSchema`], its selections are mapped to a
//! [`FragmentType`](types::FragmentType) tree, normalized into per-concrete-type shapes and
//! finally printed. The functions at the crate root run the whole pipeline for each kind of
//! document and each output flavor.

use indexmap::IndexMap;
use serde::Serialize;

use crate::brands::decorate_with_type_brands;
use crate::brands::get_type_brand_names;
use crate::error::TypegenError;
use crate::mapper::map_fragment_type;
use crate::mapper::map_multi_fragment_type;
use crate::mapper::map_operation_type;
use crate::named_types::extract_named_types;
use crate::normalizer::normalize_type;
use crate::normalizer::normalize_wrapped_type;
use crate::printer::print_type;
use crate::types::FlattenedType;

pub mod brands;
pub mod error;
pub mod mapper;
pub mod named_types;
pub mod normalizer;
pub mod options;
pub mod printer;
pub mod schema;
pub mod schema_printer;
pub mod types;
pub mod validation;

pub use crate::options::TypegenOptions;
pub use crate::schema::TypegenSchema;
pub use crate::validation::UnknownFragmentPolicy;

/// A type together with the nominal brands it relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrandedTypeDefinition {
    /// The type, with a brand field leading every object shape.
    pub fragment_type_text: String,
    /// Every concrete type a brand refers to. Each needs a declaration in scope.
    pub brands_to_import: Vec<String>,
    /// An object type holding only the brand of the root shape(s).
    pub fragment_type_brand_text: String,
}

/// A type whose `@exportType` fields refer to separately printed declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedTypeDefinition {
    pub type_text: String,
    /// Export name to printed type, in the order the fields were found.
    pub named_types: IndexMap<String, String>,
}

fn normalized_fragment(
    schema: &TypegenSchema,
    source: &str,
    options: &TypegenOptions,
) -> Result<FlattenedType, TypegenError> {
    let mapped = map_fragment_type(schema, source, options)?;
    normalize_wrapped_type(schema, &mapped)
}

fn normalized_multi_fragment(
    schema: &TypegenSchema,
    source: &str,
    root_fragment: &str,
    options: &TypegenOptions,
) -> Result<FlattenedType, TypegenError> {
    let mapped = map_multi_fragment_type(schema, source, root_fragment, options)?;
    Ok(FlattenedType::Object(normalize_type(schema, &mapped)?))
}

fn normalized_operation(
    schema: &TypegenSchema,
    source: &str,
    options: &TypegenOptions,
) -> Result<FlattenedType, TypegenError> {
    let mapped = map_operation_type(schema, source, options)?;
    Ok(FlattenedType::Object(normalize_type(schema, &mapped)?))
}

fn branded_type_definition(ty: &FlattenedType, indent: usize) -> BrandedTypeDefinition {
    let branded = decorate_with_type_brands(ty);
    tracing::trace!("decorated type with brands");
    let names = get_type_brand_names(&branded);
    let fragment_type_brand_text = format!(
        "{{\n{}'': {};\n{}}}",
        " ".repeat(indent + 2),
        names.fragment_type_names.join(" | "),
        " ".repeat(indent)
    );
    BrandedTypeDefinition {
        fragment_type_text: print_type(false, &branded, false, indent),
        brands_to_import: names.all_required_names,
        fragment_type_brand_text,
    }
}

fn named_type_definition(ty: &FlattenedType, indent: usize) -> NamedTypeDefinition {
    let named_types = extract_named_types(ty)
        .into_iter()
        .map(|(name, named_type)| (name, print_type(false, &named_type, true, indent)))
        .collect();
    NamedTypeDefinition {
        type_text: print_type(false, ty, true, indent),
        named_types,
    }
}

/// Prints the type of the single fragment in `source`.
pub fn fragment_type_definition(
    schema: &TypegenSchema,
    source: &str,
    options: &TypegenOptions,
) -> Result<String, TypegenError> {
    let ty = normalized_fragment(schema, source, options)?;
    Ok(print_type(false, &ty, false, options.indent))
}

pub fn fragment_branded_type_definition(
    schema: &TypegenSchema,
    source: &str,
    options: &TypegenOptions,
) -> Result<BrandedTypeDefinition, TypegenError> {
    let ty = normalized_fragment(schema, source, options)?;
    Ok(branded_type_definition(&ty, options.indent))
}

pub fn fragment_named_type_definition(
    schema: &TypegenSchema,
    source: &str,
    options: &TypegenOptions,
) -> Result<NamedTypeDefinition, TypegenError> {
    let ty = normalized_fragment(schema, source, options)?;
    Ok(named_type_definition(&ty, options.indent))
}

/// Prints the type of `root_fragment`, resolving the other fragments of `source` it spreads.
pub fn multi_fragment_type_definition(
    schema: &TypegenSchema,
    source: &str,
    root_fragment: &str,
    options: &TypegenOptions,
) -> Result<String, TypegenError> {
    let ty = normalized_multi_fragment(schema, source, root_fragment, options)?;
    Ok(print_type(false, &ty, false, options.indent))
}

pub fn multi_fragment_branded_type_definition(
    schema: &TypegenSchema,
    source: &str,
    root_fragment: &str,
    options: &TypegenOptions,
) -> Result<BrandedTypeDefinition, TypegenError> {
    let ty = normalized_multi_fragment(schema, source, root_fragment, options)?;
    Ok(branded_type_definition(&ty, options.indent))
}

pub fn multi_fragment_named_type_definition(
    schema: &TypegenSchema,
    source: &str,
    root_fragment: &str,
    options: &TypegenOptions,
) -> Result<NamedTypeDefinition, TypegenError> {
    let ty = normalized_multi_fragment(schema, source, root_fragment, options)?;
    Ok(named_type_definition(&ty, options.indent))
}

/// Prints the response type of the first operation in `source`.
pub fn operation_type_definition(
    schema: &TypegenSchema,
    source: &str,
    options: &TypegenOptions,
) -> Result<String, TypegenError> {
    let ty = normalized_operation(schema, source, options)?;
    Ok(print_type(false, &ty, false, options.indent))
}

pub fn operation_branded_type_definition(
    schema: &TypegenSchema,
    source: &str,
    options: &TypegenOptions,
) -> Result<BrandedTypeDefinition, TypegenError> {
    let ty = normalized_operation(schema, source, options)?;
    Ok(branded_type_definition(&ty, options.indent))
}

pub fn operation_named_type_definition(
    schema: &TypegenSchema,
    source: &str,
    options: &TypegenOptions,
) -> Result<NamedTypeDefinition, TypegenError> {
    let ty = normalized_operation(schema, source, options)?;
    Ok(named_type_definition(&ty, options.indent))
}
