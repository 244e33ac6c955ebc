use indexmap::IndexMap;

use crate::types::FlattenedObjectType;
use crate::types::FlattenedType;

/// Collects every field carrying an export name, anywhere in `ty`, keyed by that name.
///
/// Values are the field types with their outer `NonNull` stripped. When two fields share an
/// export name the last one visited wins.
pub fn extract_named_types(ty: &FlattenedType) -> IndexMap<String, FlattenedType> {
    let mut named_types = IndexMap::new();
    collect(ty, &mut named_types);
    named_types
}

fn collect(ty: &FlattenedType, named_types: &mut IndexMap<String, FlattenedType>) {
    match ty {
        FlattenedType::NonNull(inner) | FlattenedType::List(inner) => collect(inner, named_types),
        FlattenedType::Object(FlattenedObjectType::Single(single)) => {
            for field in &single.fields {
                if let Some(export_name) = &field.export_name {
                    named_types.insert(export_name.clone(), field.ty.clone().into_nullable());
                }
                collect(&field.ty, named_types);
            }
        }
        FlattenedType::Object(FlattenedObjectType::Spread(spread)) => {
            for field in spread.spreads.iter().flat_map(|spread| spread.fields()) {
                if let Some(export_name) = &field.export_name {
                    named_types.insert(export_name.clone(), field.ty.clone().into_nullable());
                }
                collect(&field.ty, named_types);
            }
        }
        FlattenedType::Scalar(_) | FlattenedType::Reference(_) => {}
    }
}
