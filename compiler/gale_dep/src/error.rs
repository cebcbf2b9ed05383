//! Loading and sorting errors.

use gale_ir::Span;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SortError {
    /// Initialization cycle through constants or variables.
    Cycle { names: Vec<String>, span: Span },
    /// Name declared twice in the same scope.
    Redeclared {
        name: String,
        span: Span,
        previous: Span,
    },
    /// `a, b = x` style mismatch between names and initializers.
    ValueCount {
        names: usize,
        values: usize,
        span: Span,
    },
    /// First spec of a const block without initializers.
    MissingConstValue { name: String, span: Span },
    /// Receiver type that is not `T` or `*T`.
    BadReceiver { method: String, span: Span },
}

impl SortError {
    pub fn span(&self) -> Span {
        match self {
            SortError::Cycle { span, .. }
            | SortError::Redeclared { span, .. }
            | SortError::ValueCount { span, .. }
            | SortError::MissingConstValue { span, .. }
            | SortError::BadReceiver { span, .. } => *span,
        }
    }
}

impl fmt::Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortError::Cycle { names, .. } => {
                write!(f, "initialization cycle: {}", names.join(" -> "))
            }
            SortError::Redeclared { name, .. } => write!(f, "{name} redeclared in this block"),
            SortError::ValueCount { names, values, .. } => write!(
                f,
                "assignment mismatch: {names} variable(s) but {values} value(s)"
            ),
            SortError::MissingConstValue { name, .. } => {
                write!(f, "missing init expr for const declaration {name}")
            }
            SortError::BadReceiver { method, .. } => {
                write!(f, "invalid receiver type for method {method}")
            }
        }
    }
}

impl std::error::Error for SortError {}
