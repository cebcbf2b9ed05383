//! Type construction and accessor errors.

use std::fmt;

/// Misuse of the type bridge: wrong accessor for a type's kind or an
/// invalid construction request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeError {
    /// Function accessor called on a non-function type.
    NotFunc { op: &'static str, ty: String },
    /// Parameter or result index outside `[0, len)`.
    IndexOutOfRange {
        op: &'static str,
        index: usize,
        len: usize,
    },
    /// Map key type does not support `==`.
    NotComparable { ty: String },
    /// Variadic signature whose last parameter is not a slice.
    VariadicNotSlice { ty: String },
    /// Named-type operation on an unnamed type.
    NotNamed { ty: String },
    /// Method table entry that is not a method type.
    NotMethod { ty: String },
    /// Underlying type of a named type set twice.
    AlreadyDefined { name: String },
    /// Named type containing itself by value.
    InvalidRecursive { name: String },
    DuplicateMethod { ty: String, name: String },
    DuplicateField { name: String },
}

impl TypeError {
    pub(crate) fn not_func(op: &'static str, ty: &impl fmt::Display) -> Self {
        TypeError::NotFunc {
            op,
            ty: ty.to_string(),
        }
    }

    pub(crate) fn index_out_of_range(op: &'static str, index: usize, len: usize) -> Self {
        TypeError::IndexOutOfRange { op, index, len }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::NotFunc { op, ty } => write!(f, "{op} of non-func type {ty}"),
            TypeError::IndexOutOfRange { op, index, len } => {
                write!(f, "{op}: index {index} out of range [0, {len})")
            }
            TypeError::NotComparable { ty } => write!(f, "invalid map key type {ty}"),
            TypeError::VariadicNotSlice { ty } => {
                write!(f, "last parameter of variadic func must be a slice, found {ty}")
            }
            TypeError::NotNamed { ty } => write!(f, "{ty} is not a named type"),
            TypeError::NotMethod { ty } => write!(f, "{ty} is not a method type"),
            TypeError::AlreadyDefined { name } => {
                write!(f, "underlying type of {name} already defined")
            }
            TypeError::InvalidRecursive { name } => write!(f, "invalid recursive type {name}"),
            TypeError::DuplicateMethod { ty, name } => {
                write!(f, "method {ty}.{name} already declared")
            }
            TypeError::DuplicateField { name } => write!(f, "duplicate field {name}"),
        }
    }
}

impl std::error::Error for TypeError {}
