//! Code buffer errors.

use std::fmt;

use crate::kind::Kind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JitError {
    /// An `Expr1`/`Expr2` reached the buffer without being lowered.
    NotLowered { expr: String },
    /// The operation is not defined for the operand kind.
    UnsupportedKind { op: &'static str, kind: Kind },
    /// The token stream does not decode into instructions.
    Malformed { at: usize },
}

impl JitError {
    #[cold]
    pub fn not_lowered(expr: impl fmt::Display) -> Self {
        JitError::NotLowered {
            expr: expr.to_string(),
        }
    }

    #[cold]
    pub fn unsupported_kind(op: &'static str, kind: Kind) -> Self {
        JitError::UnsupportedKind { op, kind }
    }
}

impl fmt::Display for JitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JitError::NotLowered { expr } => {
                write!(f, "cannot assemble {expr}: must be compiled first")
            }
            JitError::UnsupportedKind { op, kind } => {
                write!(f, "{op} is not supported on {kind}")
            }
            JitError::Malformed { at } => write!(f, "malformed code at token {at}"),
        }
    }
}

impl std::error::Error for JitError {}
