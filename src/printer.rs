//! Rendering of flattened types as TypeScript type expressions.

use itertools::Itertools;

use crate::types::FlattenedField;
use crate::types::FlattenedObjectType;
use crate::types::FlattenedType;
use crate::types::ScalarType;

/// The type every empty union prints as.
const NEVER: &str = "never";

/// Prints `ty` starting at column `indent`.
///
/// `nullable` appends `| null` unless `ty` is non-null. With `with_names`, fields carrying an
/// export name print that name instead of their inline type.
pub fn print_type(nullable: bool, ty: &FlattenedType, with_names: bool, indent: usize) -> String {
    let printed = match ty {
        FlattenedType::NonNull(inner) => return print_type(false, inner, with_names, indent),
        FlattenedType::List(element) => {
            let element_text = print_type(true, element, with_names, indent);
            if needs_parens(element) {
                format!("({element_text})[]")
            } else {
                format!("{element_text}[]")
            }
        }
        FlattenedType::Scalar(scalar) => print_scalar(scalar),
        FlattenedType::Reference(reference) => {
            if reference.names.is_empty() {
                NEVER.to_owned()
            } else {
                reference.names.join(" | ")
            }
        }
        FlattenedType::Object(object) => print_object_type(object, with_names, indent),
    };
    if nullable {
        format!("{printed} | null")
    } else {
        printed
    }
}

/// Whether a list element must be parenthesized to bind tighter than `[]`.
fn needs_parens(element: &FlattenedType) -> bool {
    let FlattenedType::NonNull(inner) = element else {
        return true;
    };
    match inner.as_ref() {
        FlattenedType::List(_) | FlattenedType::NonNull(_) => false,
        FlattenedType::Scalar(scalar) => scalar
            .known_possible_values
            .as_ref()
            .is_some_and(|values| values.len() > 1),
        FlattenedType::Object(FlattenedObjectType::Single(_)) => true,
        FlattenedType::Object(FlattenedObjectType::Spread(spread)) => spread.spreads.len() > 1,
        FlattenedType::Reference(reference) => reference.names.len() > 1,
    }
}

fn print_scalar(scalar: &ScalarType) -> String {
    match &scalar.known_possible_values {
        Some(values) if values.is_empty() => NEVER.to_owned(),
        Some(values) => values
            .iter()
            .map(|value| serde_json::Value::from(value.as_str()).to_string())
            .join(" | "),
        None => match scalar.name.as_str() {
            "Int" | "Float" => "number".to_owned(),
            "Boolean" => "boolean".to_owned(),
            _ => "string".to_owned(),
        },
    }
}

fn print_object_type(object: &FlattenedObjectType, with_names: bool, indent: usize) -> String {
    match object {
        FlattenedObjectType::Single(single) => print_fields(&single.fields, with_names, indent),
        FlattenedObjectType::Spread(spread) if spread.spreads.is_empty() => NEVER.to_owned(),
        FlattenedObjectType::Spread(spread) => spread
            .spreads
            .iter()
            .map(|spread| print_fields(spread.fields(), with_names, indent))
            .join(" | "),
    }
}

fn print_fields(fields: &[FlattenedField], with_names: bool, indent: usize) -> String {
    if fields.is_empty() {
        return "{}".to_owned();
    }
    let body = fields
        .iter()
        .map(|field| print_field(field, with_names, indent + 2))
        .join("\n\n");
    format!("{{\n{body}\n{}}}", " ".repeat(indent))
}

fn print_field(field: &FlattenedField, with_names: bool, indent: usize) -> String {
    let padding = " ".repeat(indent);
    let mut printed = print_doc_comment(
        field.description.as_deref(),
        field.deprecation_reason.as_deref(),
        &padding,
    );

    let key = if field.response_name.is_empty() {
        "''"
    } else {
        field.response_name.as_str()
    };
    let value = match &field.export_name {
        Some(export_name) if with_names => {
            if field.ty.is_nullable() {
                format!("{export_name} | null")
            } else {
                export_name.clone()
            }
        }
        _ => print_type(true, &field.ty, with_names, indent),
    };
    printed.push_str(&format!("{padding}{key}: {value};"));
    printed
}

/// A JSDoc block for the given description and deprecation, or nothing if both are absent.
pub(crate) fn print_doc_comment(
    description: Option<&str>,
    deprecation_reason: Option<&str>,
    padding: &str,
) -> String {
    if description.is_none() && deprecation_reason.is_none() {
        return String::new();
    }
    let mut lines = vec![format!("{padding}/**")];
    for line in description.into_iter().flat_map(str::lines) {
        if line.is_empty() {
            lines.push(format!("{padding} *"));
        } else {
            lines.push(format!("{padding} * {line}"));
        }
    }
    if let Some(reason) = deprecation_reason {
        lines.push(format!("{padding} * @deprecated {reason}"));
    }
    lines.push(format!("{padding} */"));
    lines.join("\n") + "\n"
}
