use std::fmt::{Display, Formatter, Write};

use apollo_compiler::diagnostic::Diagnostic;
use apollo_compiler::executable::OperationType;
use apollo_compiler::validation::{DiagnosticData, DiagnosticList, WithErrors};

use crate::schema::TypeKind;

/// A line/column pair pointing into the document that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorLocation {
    pub line: usize,
    pub column: usize,
}

impl Display for ErrorLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SingleTypegenError {
    #[error("{}{message}", location.map(|l| format!("[{l}] ")).unwrap_or_default())]
    InvalidGraphQL {
        message: String,
        location: Option<ErrorLocation>,
    },
    #[error("Unable to find fragment named: {name}")]
    UnknownFragment { name: String },
    #[error("Unable to find fragment named: {name}")]
    MissingRootFragment { name: String },
    #[error("Could not find operation node")]
    MissingOperation,
    #[error("Schema does not define a root type for {operation_type} operations")]
    UndefinedRootType { operation_type: OperationType },
    #[error("Expected `{name}` to be an object, interface or union type, found {kind}")]
    NotCompositeType { name: String, kind: TypeKind },
    #[error("Unknown type `{name}`")]
    UnknownType { name: String },
    #[error("An internal error has occurred, please report this bug: {message}")]
    Internal { message: String },
}

impl SingleTypegenError {
    pub(crate) fn invalid_graphql(message: impl Into<String>) -> Self {
        SingleTypegenError::InvalidGraphQL {
            message: message.into(),
            location: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
pub struct MultipleTypegenErrors {
    pub errors: Vec<SingleTypegenError>,
}

impl MultipleTypegenErrors {
    pub fn new() -> Self {
        Self { errors: vec![] }
    }

    pub fn push(&mut self, error: SingleTypegenError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Collapses the collection: no errors is `Ok`, a single error is returned as-is, and
    /// anything more stays aggregated.
    pub fn into_result(self) -> Result<(), TypegenError> {
        let mut errors = self.errors;
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0).into()),
            _ => Err(MultipleTypegenErrors { errors }.into()),
        }
    }
}

impl FromIterator<SingleTypegenError> for MultipleTypegenErrors {
    fn from_iter<T: IntoIterator<Item = SingleTypegenError>>(iter: T) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl Display for MultipleTypegenErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "The following errors occurred:")?;
        for error in &self.errors {
            write!(f, "\n\n  - ")?;
            for c in error.to_string().chars() {
                if c == '\n' {
                    write!(f, "\n    ")?;
                } else {
                    f.write_char(c)?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypegenError {
    #[error(transparent)]
    Single(#[from] SingleTypegenError),
    #[error(transparent)]
    Multiple(#[from] MultipleTypegenErrors),
}

impl TypegenError {
    pub fn internal(message: impl Into<String>) -> TypegenError {
        SingleTypegenError::Internal {
            message: message.into(),
        }
        .into()
    }

    /// All underlying errors, in the order they were reported.
    pub fn errors(&self) -> Vec<&SingleTypegenError> {
        match self {
            TypegenError::Single(error) => vec![error],
            TypegenError::Multiple(errors) => errors.errors.iter().collect(),
        }
    }
}

pub(crate) fn diagnostic_to_error(
    diagnostic: Diagnostic<'_, DiagnosticData>,
) -> SingleTypegenError {
    SingleTypegenError::InvalidGraphQL {
        message: diagnostic.error.to_string(),
        location: diagnostic
            .line_column_range()
            .map(|range| range.start)
            .map(|location| ErrorLocation {
                line: location.line,
                column: location.column,
            }),
    }
}

pub(crate) fn diagnostics_to_errors(errors: &DiagnosticList) -> Vec<SingleTypegenError> {
    errors.iter().map(diagnostic_to_error).collect()
}

impl<T> From<WithErrors<T>> for TypegenError {
    fn from(value: WithErrors<T>) -> Self {
        let errors = diagnostics_to_errors(&value.errors);
        match MultipleTypegenErrors::from_iter(errors).into_result() {
            Ok(()) => TypegenError::internal("diagnostic list unexpectedly empty"),
            Err(error) => error,
        }
    }
}
