//! Selection mapping: from a validated document to a [`FragmentType`] tree.

use std::collections::HashMap;
use std::collections::HashSet;

use apollo_compiler::ast::Type;
use apollo_compiler::ast::Value;
use apollo_compiler::executable::Field;
use apollo_compiler::executable::Fragment;
use apollo_compiler::executable::Operation;
use apollo_compiler::executable::Selection;
use apollo_compiler::executable::SelectionSet;
use apollo_compiler::validation::Valid;
use apollo_compiler::ExecutableDocument;
use apollo_compiler::Name;
use apollo_compiler::Node;

use crate::error::SingleTypegenError;
use crate::error::TypegenError;
use crate::options::TypegenOptions;
use crate::schema::TypeKind;
use crate::schema::TypegenSchema;
use crate::schema::EXPORT_TYPE_DIRECTIVE;
use crate::schema::EXPORT_TYPE_NAME_ARGUMENT;
use crate::schema::RELAY_DIRECTIVE;
use crate::schema::RELAY_PLURAL_ARGUMENT;
use crate::types::FieldInfo;
use crate::types::FragmentType;
use crate::types::ObjectType;
use crate::types::ScalarType;
use crate::validation::parse_and_validate;
use crate::validation::DocumentShape;
use crate::validation::UnknownFragmentPolicy;

pub(crate) const DOCUMENT_PATH: &str = "document.graphql";

/// The definition a mapping starts from.
#[derive(Debug, Clone, Copy)]
pub enum RootSelection<'a> {
    Fragment(&'a Node<Fragment>),
    Operation(&'a Node<Operation>),
}

/// Maps the selections under `root` to an object tree.
///
/// `document` must already have passed validation for the mode it is used in.
pub fn map_type(
    schema: &TypegenSchema,
    document: &Valid<ExecutableDocument>,
    root: RootSelection<'_>,
    fields_to_exclude: &[String],
    unknown_fragments: UnknownFragmentPolicy,
) -> Result<ObjectType, TypegenError> {
    let mut mapper = SelectionMapper {
        schema,
        document,
        fields_to_exclude,
        unknown_fragments,
        stack: Vec::new(),
        fragments: HashMap::new(),
        fragments_in_progress: HashSet::new(),
    };
    match root {
        RootSelection::Fragment(fragment) => {
            tracing::trace!(fragment = %fragment.name, "mapping fragment root");
            mapper.fragments_in_progress.insert(fragment.name.clone());
            mapper.push_frame(fragment.type_condition().clone());
            mapper.map_selection_set(&fragment.selection_set)?;
        }
        RootSelection::Operation(operation) => {
            let root_type = schema.root_operation_type(operation.operation_type)?;
            tracing::trace!(%root_type, "mapping operation root");
            mapper.push_frame(root_type);
            mapper.map_selection_set(&operation.selection_set)?;
        }
    }
    mapper.finish()
}

/// Validates `source` as a document holding exactly one fragment and maps it.
///
/// A fragment marked `@relay(plural: true)` maps to a list of its object type.
pub fn map_fragment_type(
    schema: &TypegenSchema,
    source: &str,
    options: &TypegenOptions,
) -> Result<FragmentType, TypegenError> {
    let shape = DocumentShape::SingleFragment;
    let policy = options.unknown_fragment_policy(shape);
    let document = parse_and_validate(schema, source, DOCUMENT_PATH, shape, policy)?;
    let Some(fragment) = document.fragments.values().next() else {
        return Err(TypegenError::internal("validated document has no fragment"));
    };

    let singular = map_type(
        schema,
        &document,
        RootSelection::Fragment(fragment),
        &options.fields_to_exclude,
        policy,
    )?;
    let object = FragmentType::Object(Node::new(singular));
    if is_plural_fragment(fragment) {
        Ok(FragmentType::List(Box::new(object)))
    } else {
        Ok(object)
    }
}

/// Validates `source` as a set of fragments reachable from `root_fragment` and maps that root.
pub fn map_multi_fragment_type(
    schema: &TypegenSchema,
    source: &str,
    root_fragment: &str,
    options: &TypegenOptions,
) -> Result<ObjectType, TypegenError> {
    let shape = DocumentShape::MultiFragment {
        root: root_fragment,
    };
    let policy = options.unknown_fragment_policy(shape);
    let document = parse_and_validate(schema, source, DOCUMENT_PATH, shape, policy)?;
    let Some(fragment) = document.fragments.get(root_fragment) else {
        return Err(SingleTypegenError::MissingRootFragment {
            name: root_fragment.to_owned(),
        }
        .into());
    };
    map_type(
        schema,
        &document,
        RootSelection::Fragment(fragment),
        &options.fields_to_exclude,
        policy,
    )
}

/// Validates `source` as an executable document and maps its first operation.
pub fn map_operation_type(
    schema: &TypegenSchema,
    source: &str,
    options: &TypegenOptions,
) -> Result<ObjectType, TypegenError> {
    let shape = DocumentShape::Operation;
    let policy = options.unknown_fragment_policy(shape);
    let document = parse_and_validate(schema, source, DOCUMENT_PATH, shape, policy)?;
    let Some(operation) = document.operations.iter().next() else {
        return Err(SingleTypegenError::MissingOperation.into());
    };
    map_type(
        schema,
        &document,
        RootSelection::Operation(operation),
        &options.fields_to_exclude,
        policy,
    )
}

fn is_plural_fragment(fragment: &Fragment) -> bool {
    fragment
        .directives
        .get(RELAY_DIRECTIVE)
        .and_then(|directive| directive.specified_argument_by_name(RELAY_PLURAL_ARGUMENT))
        .is_some_and(|value| matches!(**value, Value::Boolean(true)))
}

fn export_name(field: &Field) -> Option<String> {
    field
        .directives
        .get(EXPORT_TYPE_DIRECTIVE)
        .and_then(|directive| directive.specified_argument_by_name(EXPORT_TYPE_NAME_ARGUMENT))
        .and_then(|value| value.as_str())
        .map(str::to_owned)
}

/// Wraps `leaf` in the list and non-null layers of `ty`, outermost first.
fn wrap_type(ty: &Type, leaf: FragmentType) -> FragmentType {
    match ty {
        Type::Named(_) => leaf,
        Type::NonNullNamed(_) => FragmentType::NonNull(Box::new(leaf)),
        Type::List(inner) => FragmentType::List(Box::new(wrap_type(inner, leaf))),
        Type::NonNullList(inner) => FragmentType::NonNull(Box::new(FragmentType::List(Box::new(
            wrap_type(inner, leaf),
        )))),
    }
}

struct SelectionMapper<'a> {
    schema: &'a TypegenSchema,
    document: &'a ExecutableDocument,
    fields_to_exclude: &'a [String],
    unknown_fragments: UnknownFragmentPolicy,
    /// One frame per selection set being mapped, innermost last.
    stack: Vec<ObjectType>,
    /// Named fragments mapped so far. Later spreads of the same fragment share the node.
    fragments: HashMap<Name, Node<ObjectType>>,
    fragments_in_progress: HashSet<Name>,
}

impl SelectionMapper<'_> {
    fn push_frame(&mut self, schema_type: Name) {
        self.stack.push(ObjectType::new(schema_type));
    }

    fn pop_frame(&mut self) -> Result<ObjectType, TypegenError> {
        self.stack
            .pop()
            .ok_or_else(|| TypegenError::internal("Expected a non empty stack"))
    }

    fn current_mut(&mut self) -> Result<&mut ObjectType, TypegenError> {
        self.stack
            .last_mut()
            .ok_or_else(|| TypegenError::internal("Expected a non empty stack"))
    }

    fn finish(mut self) -> Result<ObjectType, TypegenError> {
        if self.stack.len() != 1 {
            return Err(TypegenError::internal(format!(
                "Expected a single root object after mapping, found {}",
                self.stack.len()
            )));
        }
        self.pop_frame()
    }

    fn map_selection_set(&mut self, selection_set: &SelectionSet) -> Result<(), TypegenError> {
        for selection in &selection_set.selections {
            match selection {
                Selection::Field(field) => {
                    let response_name = field.response_key();
                    if self
                        .fields_to_exclude
                        .iter()
                        .any(|excluded| excluded == response_name.as_str())
                    {
                        tracing::debug!(field = %response_name, "skipping excluded field");
                        continue;
                    }
                    let ty = self.map_field_type(field)?;
                    let info = FieldInfo {
                        field_name: field.name.clone(),
                        response_name: response_name.clone(),
                        export_name: export_name(field),
                        ty,
                    };
                    self.current_mut()?.fields.push(info);
                }
                Selection::FragmentSpread(spread) => {
                    if let Some(fragment) = self.map_named_fragment(&spread.fragment_name)? {
                        self.current_mut()?.fragment_spreads.push(fragment);
                    }
                }
                Selection::InlineFragment(inline) => {
                    self.push_frame(inline.selection_set.ty.clone());
                    self.map_selection_set(&inline.selection_set)?;
                    let spread = self.pop_frame()?;
                    self.current_mut()?.fragment_spreads.push(Node::new(spread));
                }
            }
        }
        Ok(())
    }

    fn map_field_type(&mut self, field: &Field) -> Result<FragmentType, TypegenError> {
        let ty = field.ty();
        let leaf_name = ty.inner_named_type();
        let leaf = match self.schema.type_kind(leaf_name)? {
            TypeKind::Object | TypeKind::Interface | TypeKind::Union => {
                self.push_frame(leaf_name.clone());
                self.map_selection_set(&field.selection_set)?;
                FragmentType::Object(Node::new(self.pop_frame()?))
            }
            TypeKind::Enum => FragmentType::Scalar(ScalarType::with_known_possible_values(
                leaf_name.clone(),
                self.schema.enum_values(leaf_name).unwrap_or_default(),
            )),
            TypeKind::Scalar => FragmentType::Scalar(ScalarType::new(leaf_name.clone())),
            TypeKind::InputObject => {
                return Err(TypegenError::internal(format!(
                    "field `{}` has input object type `{leaf_name}`",
                    field.name
                )))
            }
        };
        Ok(wrap_type(ty, leaf))
    }

    fn map_named_fragment(
        &mut self,
        name: &Name,
    ) -> Result<Option<Node<ObjectType>>, TypegenError> {
        if let Some(mapped) = self.fragments.get(name) {
            return Ok(Some(mapped.clone()));
        }
        if self.fragments_in_progress.contains(name) {
            return Err(TypegenError::internal(format!(
                "fragment `{name}` spreads itself"
            )));
        }
        let Some(fragment) = self.document.fragments.get(name) else {
            return match self.unknown_fragments {
                UnknownFragmentPolicy::Ignore => {
                    tracing::debug!(fragment = %name, "skipping spread of unknown fragment");
                    Ok(None)
                }
                UnknownFragmentPolicy::Reject => Err(SingleTypegenError::UnknownFragment {
                    name: name.to_string(),
                }
                .into()),
            };
        };

        self.fragments_in_progress.insert(name.clone());
        self.push_frame(fragment.type_condition().clone());
        self.map_selection_set(&fragment.selection_set)?;
        let mapped = Node::new(self.pop_frame()?);
        self.fragments_in_progress.remove(name);
        self.fragments.insert(name.clone(), mapped.clone());
        Ok(Some(mapped))
    }
}
