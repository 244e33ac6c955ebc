//! Parsing and validation of selection documents.
//!
//! Every document goes through apollo-compiler's executable validation first. Fragment
//! documents have no operation to use their fragments, so unused-fragment diagnostics are
//! dropped. The document-shape rules for single and multi fragment documents run on top.

use std::path::Path;

use apollo_compiler::diagnostic::Diagnostic;
use apollo_compiler::executable::Selection;
use apollo_compiler::executable::SelectionSet;
use apollo_compiler::validation::DiagnosticData;
use apollo_compiler::validation::DiagnosticList;
use apollo_compiler::validation::Valid;
use apollo_compiler::validation::WithErrors;
use apollo_compiler::ExecutableDocument;
use apollo_compiler::Name;
use indexmap::IndexMap;
use indexmap::IndexSet;
use itertools::Itertools;

use crate::error::diagnostic_to_error;
use crate::error::MultipleTypegenErrors;
use crate::error::SingleTypegenError;
use crate::error::TypegenError;
use crate::schema::TypegenSchema;

/// What to do with a spread of a fragment the document does not define.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UnknownFragmentPolicy {
    /// Report the spread as a validation error.
    Reject,
    /// Drop the spread and map the rest of the selection.
    Ignore,
}

/// The shape a document must have for the mode it is processed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentShape<'a> {
    SingleFragment,
    MultiFragment { root: &'a str },
    Operation,
}

impl DocumentShape<'_> {
    pub fn default_unknown_fragment_policy(&self) -> UnknownFragmentPolicy {
        match self {
            DocumentShape::SingleFragment => UnknownFragmentPolicy::Ignore,
            DocumentShape::MultiFragment { .. } | DocumentShape::Operation => {
                UnknownFragmentPolicy::Reject
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FragmentDiagnostic {
    Unused,
    Undefined,
}

/// Classifies apollo-compiler's undefined-fragment and unused-fragment diagnostics.
///
/// Their `DiagnosticData` variants are private, so both the graphql-js compatible message
/// and the native message are matched. The wording is only stable within the pinned minor
/// version of apollo-compiler.
fn fragment_diagnostic(diagnostic: &Diagnostic<'_, DiagnosticData>) -> Option<FragmentDiagnostic> {
    let message = diagnostic
        .error
        .unstable_compat_message()
        .unwrap_or_else(|| diagnostic.error.to_string());
    if message.starts_with("Unknown fragment") || message.starts_with("cannot find fragment") {
        Some(FragmentDiagnostic::Undefined)
    } else if message.ends_with("is never used.")
        || message.ends_with("must be used in an operation")
    {
        Some(FragmentDiagnostic::Unused)
    } else {
        None
    }
}

/// Converts the diagnostics that still matter for `shape` under `policy`.
fn relevant_errors(
    errors: &DiagnosticList,
    shape: DocumentShape<'_>,
    policy: UnknownFragmentPolicy,
) -> Vec<SingleTypegenError> {
    errors
        .iter()
        .filter(|diagnostic| match fragment_diagnostic(diagnostic) {
            None => true,
            Some(FragmentDiagnostic::Unused) => false,
            // The multi fragment rule reports every undefined name in one error.
            Some(FragmentDiagnostic::Undefined) => {
                policy == UnknownFragmentPolicy::Reject
                    && !matches!(shape, DocumentShape::MultiFragment { .. })
            }
        })
        .map(diagnostic_to_error)
        .collect()
}

/// Parses `source` against `schema` and checks it for `shape`.
///
/// Syntax and build errors are returned on their own. Otherwise the standard validation
/// diagnostics and the document-shape errors are reported together.
pub fn parse_and_validate(
    schema: &TypegenSchema,
    source: &str,
    path: impl AsRef<Path>,
    shape: DocumentShape<'_>,
    policy: UnknownFragmentPolicy,
) -> Result<Valid<ExecutableDocument>, TypegenError> {
    let document = match ExecutableDocument::parse(schema.schema(), source, path) {
        Ok(document) => document,
        Err(WithErrors { partial, errors }) => {
            MultipleTypegenErrors::from_iter(relevant_errors(&errors, shape, policy))
                .into_result()?;
            partial
        }
    };

    let (document, mut errors) = match document.validate(schema.schema()) {
        Ok(document) => (document.into_inner(), MultipleTypegenErrors::new()),
        Err(WithErrors { partial, errors }) => (
            partial,
            MultipleTypegenErrors::from_iter(relevant_errors(&errors, shape, policy)),
        ),
    };

    let shape_errors = match shape {
        DocumentShape::SingleFragment => validate_single_fragment(&document),
        DocumentShape::MultiFragment { root } => validate_multi_fragment(&document, root, policy),
        DocumentShape::Operation => validate_operation(&document),
    };
    for error in shape_errors {
        errors.push(error);
    }
    errors.into_result()?;

    tracing::trace!(?shape, "document passed validation");
    Ok(Valid::assume_valid(document))
}

fn validate_single_fragment(document: &ExecutableDocument) -> Vec<SingleTypegenError> {
    let operation_count = document.operations.iter().count();
    if operation_count != 0 || document.fragments.len() != 1 {
        return vec![SingleTypegenError::invalid_graphql(
            "Expected the Document to contain only a single FragmentDefinition",
        )];
    }
    vec![]
}

fn validate_operation(document: &ExecutableDocument) -> Vec<SingleTypegenError> {
    if document.operations.iter().next().is_none() {
        return vec![SingleTypegenError::MissingOperation];
    }
    vec![]
}

/// Checks that the document is a set of fragments all reachable from `root`, without
/// references back to `root` or to undefined fragments.
fn validate_multi_fragment(
    document: &ExecutableDocument,
    root: &str,
    policy: UnknownFragmentPolicy,
) -> Vec<SingleTypegenError> {
    if document.operations.iter().next().is_some() {
        return vec![SingleTypegenError::invalid_graphql(
            "Expected the Document to only contain fragment definitions",
        )];
    }
    if !document.fragments.contains_key(root) {
        return vec![SingleTypegenError::invalid_graphql(format!(
            "Could not find root fragment with name: {root}"
        ))];
    }

    let references: IndexMap<&str, IndexSet<Name>> = document
        .fragments
        .iter()
        .map(|(name, fragment)| {
            let mut names = IndexSet::new();
            collect_fragment_spreads(&fragment.selection_set, &mut names);
            (name.as_str(), names)
        })
        .collect();

    let mut errors = vec![];
    let mut visited: IndexSet<&str> = IndexSet::new();
    let mut unknown: IndexSet<&str> = IndexSet::new();
    let mut to_visit: Vec<&str> = vec![root];
    while let Some(current) = to_visit.pop() {
        if !visited.insert(current) {
            continue;
        }
        let Some(referenced) = references.get(current) else {
            continue;
        };
        for name in referenced {
            if name.as_str() == root {
                errors.push(SingleTypegenError::invalid_graphql(format!(
                    "Reference to root fragment {root} is disallowed."
                )));
            }
            if !document.fragments.contains_key(name) {
                unknown.insert(name.as_str());
                continue;
            }
            if !visited.contains(name.as_str()) {
                to_visit.push(name.as_str());
            }
        }
    }

    if !unknown.is_empty() && policy == UnknownFragmentPolicy::Reject {
        errors.push(SingleTypegenError::invalid_graphql(format!(
            "The following fragments were referenced but not defined: {}",
            unknown.iter().join(", ")
        )));
    }

    let unreferenced = document
        .fragments
        .keys()
        .filter(|name| !visited.contains(name.as_str()))
        .collect::<Vec<_>>();
    if !unreferenced.is_empty() {
        errors.push(SingleTypegenError::invalid_graphql(format!(
            "The following fragment were defined but never referenced: {}",
            unreferenced.iter().join(", ")
        )));
    }

    errors
}

fn collect_fragment_spreads(selection_set: &SelectionSet, names: &mut IndexSet<Name>) {
    for selection in &selection_set.selections {
        match selection {
            Selection::Field(field) => collect_fragment_spreads(&field.selection_set, names),
            Selection::FragmentSpread(spread) => {
                names.insert(spread.fragment_name.clone());
            }
            Selection::InlineFragment(inline) => {
                collect_fragment_spreads(&inline.selection_set, names)
            }
        }
    }
}
