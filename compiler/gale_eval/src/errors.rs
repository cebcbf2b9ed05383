//! Compile-time and run-time errors.
//!
//! Both error types pair a structured kind with its rendered message.
//! Construct them through the factory functions below rather than by hand,
//! so that every message for a kind is spelled the same way.

use std::fmt;

use gale_dep::SortError;
use gale_ir::Span;
use gale_jit::JitError;
use gale_types::{Category, TypeError};

// ── Run time ────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    /// Slice index outside `[0, len)`.
    IndexOutOfRange { index: i64, len: usize },
    NilMapStore,
    DivisionByZero,
    NegativeShift,
    /// A value whose runtime kind does not fit the destination type.
    Conversion { from: String, to: String },
    UnhashableKey { ty: String },
    CallDepthExceeded { limit: usize },
    NilFuncCall,
    /// Raised by a host function.
    Host { message: String },
    Custom { message: String },
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalErrorKind::IndexOutOfRange { index, len: 0 } => {
                write!(f, "index out of range: {index}, slice is empty")
            }
            EvalErrorKind::IndexOutOfRange { index, len } => {
                write!(f, "index out of range: {index} not in 0...{}", len - 1)
            }
            EvalErrorKind::NilMapStore => f.write_str("assignment to entry in nil map"),
            EvalErrorKind::DivisionByZero => f.write_str("integer divide by zero"),
            EvalErrorKind::NegativeShift => f.write_str("negative shift amount"),
            EvalErrorKind::Conversion { from, to } => write!(f, "cannot convert {from} to {to}"),
            EvalErrorKind::UnhashableKey { ty } => write!(f, "hash of unhashable type {ty}"),
            EvalErrorKind::CallDepthExceeded { limit } => {
                write!(f, "maximum call depth of {limit} exceeded")
            }
            EvalErrorKind::NilFuncCall => f.write_str("call of nil function"),
            EvalErrorKind::Host { message } | EvalErrorKind::Custom { message } => {
                f.write_str(message)
            }
        }
    }
}

/// Error raised while executing compiled code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// `kind` rendered.
    pub message: String,
}

impl EvalError {
    /// Free-form error.
    pub fn new(message: impl Into<String>) -> Self {
        Self::from_kind(EvalErrorKind::Custom {
            message: message.into(),
        })
    }

    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        EvalError { kind, message }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EvalError {}

#[cold]
pub fn index_out_of_range(index: i64, len: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IndexOutOfRange { index, len })
}

#[cold]
pub fn nil_map_store() -> EvalError {
    EvalError::from_kind(EvalErrorKind::NilMapStore)
}

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::DivisionByZero)
}

#[cold]
pub fn negative_shift() -> EvalError {
    EvalError::from_kind(EvalErrorKind::NegativeShift)
}

#[cold]
pub fn conversion_failed(from: impl fmt::Display, to: impl fmt::Display) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Conversion {
        from: from.to_string(),
        to: to.to_string(),
    })
}

#[cold]
pub fn unhashable_key(ty: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnhashableKey { ty: ty.to_owned() })
}

#[cold]
pub fn call_depth_exceeded(limit: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::CallDepthExceeded { limit })
}

#[cold]
pub fn nil_func_call() -> EvalError {
    EvalError::from_kind(EvalErrorKind::NilFuncCall)
}

#[cold]
pub fn host_error(message: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Host {
        message: message.into(),
    })
}

// ── Compile time ────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// No assignment path exists for locations of this category.
    UnsupportedCategory {
        op: &'static str,
        category: Category,
        ty: String,
    },
    /// Construct the compiler does not handle.
    Unsupported { what: String },
    Undefined { name: String },
    NotAssignable { from: String, to: String },
    MismatchedTypes { op: String, left: String, right: String },
    InvalidOperation { op: String, ty: String },
    ConstantOverflow { value: String, ty: String },
    Truncated { value: String, ty: String },
    DivisionByZero,
    ArgCount { name: String, want: usize, have: usize },
    ValueCount { want: usize, have: usize },
    NotCallable { ty: String },
    NotAType { name: String },
    NotAnExpression { name: String },
    NotConstant { name: String },
    /// Non-bool condition in `if` or `for`.
    NonBoolCondition { ty: String },
    BranchOutsideLoop { keyword: &'static str },
    /// `nil` where no type is known to give it.
    UntypedNil,
    /// Left-hand side that is not a variable, map entry, element or field.
    CannotAssign { what: String },
    Sort(SortError),
    Type(TypeError),
    Jit(JitError),
}

impl fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileErrorKind::UnsupportedCategory { op, category, ty } => {
                write!(f, "{op}: unsupported category {category} of type {ty}")
            }
            CompileErrorKind::Unsupported { what } => write!(f, "unsupported: {what}"),
            CompileErrorKind::Undefined { name } => write!(f, "undefined: {name}"),
            CompileErrorKind::NotAssignable { from, to } => {
                write!(f, "cannot use {from} as {to} value")
            }
            CompileErrorKind::MismatchedTypes { op, left, right } => write!(
                f,
                "invalid operation: {op} (mismatched types {left} and {right})"
            ),
            CompileErrorKind::InvalidOperation { op, ty } => {
                write!(f, "invalid operation: operator {op} not defined on {ty}")
            }
            CompileErrorKind::ConstantOverflow { value, ty } => {
                write!(f, "constant {value} overflows {ty}")
            }
            CompileErrorKind::Truncated { value, ty } => {
                write!(f, "constant {value} truncated to {ty}")
            }
            CompileErrorKind::DivisionByZero => f.write_str("division by zero"),
            CompileErrorKind::ArgCount { name, want, have } => write!(
                f,
                "wrong argument count in call to {name}: have {have}, want {want}"
            ),
            CompileErrorKind::ValueCount { want, have } => {
                write!(f, "assignment mismatch: {want} variables but {have} values")
            }
            CompileErrorKind::NotCallable { ty } => {
                write!(f, "cannot call non-function (type {ty})")
            }
            CompileErrorKind::NotAType { name } => write!(f, "{name} is not a type"),
            CompileErrorKind::NotAnExpression { name } => write!(f, "{name} is not an expression"),
            CompileErrorKind::NotConstant { name } => write!(f, "{name} is not constant"),
            CompileErrorKind::NonBoolCondition { ty } => {
                write!(f, "non-boolean condition of type {ty}")
            }
            CompileErrorKind::BranchOutsideLoop { keyword } => {
                write!(f, "{keyword} is not in a loop")
            }
            CompileErrorKind::UntypedNil => f.write_str("use of untyped nil"),
            CompileErrorKind::CannotAssign { what } => write!(f, "cannot assign to {what}"),
            CompileErrorKind::Sort(err) => write!(f, "{err}"),
            CompileErrorKind::Type(err) => write!(f, "{err}"),
            CompileErrorKind::Jit(err) => write!(f, "{err}"),
        }
    }
}

/// Error that aborts compilation; no code is produced for the failing
/// declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub message: String,
    pub span: Option<Span>,
}

impl CompileError {
    fn from_kind(kind: CompileErrorKind) -> Self {
        let message = kind.to_string();
        CompileError {
            kind,
            message,
            span: None,
        }
    }

    /// Attach a span unless one is already present.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span.get_or_insert(span);
        self
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CompileError {}

impl From<SortError> for CompileError {
    fn from(err: SortError) -> Self {
        let span = err.span();
        CompileError::from_kind(CompileErrorKind::Sort(err)).with_span(span)
    }
}

impl From<TypeError> for CompileError {
    fn from(err: TypeError) -> Self {
        CompileError::from_kind(CompileErrorKind::Type(err))
    }
}

impl From<JitError> for CompileError {
    fn from(err: JitError) -> Self {
        CompileError::from_kind(CompileErrorKind::Jit(err))
    }
}

#[cold]
pub fn unsupported_category(op: &'static str, category: Category, ty: &impl fmt::Display) -> CompileError {
    CompileError::from_kind(CompileErrorKind::UnsupportedCategory {
        op,
        category,
        ty: ty.to_string(),
    })
}

#[cold]
pub fn unsupported(what: impl Into<String>) -> CompileError {
    CompileError::from_kind(CompileErrorKind::Unsupported { what: what.into() })
}

#[cold]
pub fn undefined(name: &str) -> CompileError {
    CompileError::from_kind(CompileErrorKind::Undefined {
        name: name.to_owned(),
    })
}

#[cold]
pub fn not_assignable(from: &impl fmt::Display, to: &impl fmt::Display) -> CompileError {
    CompileError::from_kind(CompileErrorKind::NotAssignable {
        from: from.to_string(),
        to: to.to_string(),
    })
}

#[cold]
pub fn mismatched_types(
    op: impl Into<String>,
    left: &impl fmt::Display,
    right: &impl fmt::Display,
) -> CompileError {
    CompileError::from_kind(CompileErrorKind::MismatchedTypes {
        op: op.into(),
        left: left.to_string(),
        right: right.to_string(),
    })
}

#[cold]
pub fn invalid_operation(op: &str, ty: &impl fmt::Display) -> CompileError {
    CompileError::from_kind(CompileErrorKind::InvalidOperation {
        op: op.to_owned(),
        ty: ty.to_string(),
    })
}

#[cold]
pub fn constant_overflow(value: &impl fmt::Display, ty: &impl fmt::Display) -> CompileError {
    CompileError::from_kind(CompileErrorKind::ConstantOverflow {
        value: value.to_string(),
        ty: ty.to_string(),
    })
}

#[cold]
pub fn constant_truncated(value: &impl fmt::Display, ty: &impl fmt::Display) -> CompileError {
    CompileError::from_kind(CompileErrorKind::Truncated {
        value: value.to_string(),
        ty: ty.to_string(),
    })
}

#[cold]
pub fn constant_division_by_zero() -> CompileError {
    CompileError::from_kind(CompileErrorKind::DivisionByZero)
}

#[cold]
pub fn arg_count(name: &str, want: usize, have: usize) -> CompileError {
    CompileError::from_kind(CompileErrorKind::ArgCount {
        name: name.to_owned(),
        want,
        have,
    })
}

#[cold]
pub fn value_count(want: usize, have: usize) -> CompileError {
    CompileError::from_kind(CompileErrorKind::ValueCount { want, have })
}

#[cold]
pub fn not_callable(ty: &impl fmt::Display) -> CompileError {
    CompileError::from_kind(CompileErrorKind::NotCallable { ty: ty.to_string() })
}

#[cold]
pub fn not_a_type(name: &str) -> CompileError {
    CompileError::from_kind(CompileErrorKind::NotAType {
        name: name.to_owned(),
    })
}

#[cold]
pub fn not_an_expression(name: &str) -> CompileError {
    CompileError::from_kind(CompileErrorKind::NotAnExpression {
        name: name.to_owned(),
    })
}

#[cold]
pub fn not_constant(name: &str) -> CompileError {
    CompileError::from_kind(CompileErrorKind::NotConstant {
        name: name.to_owned(),
    })
}

#[cold]
pub fn non_bool_condition(ty: &impl fmt::Display) -> CompileError {
    CompileError::from_kind(CompileErrorKind::NonBoolCondition { ty: ty.to_string() })
}

#[cold]
pub fn branch_outside_loop(keyword: &'static str) -> CompileError {
    CompileError::from_kind(CompileErrorKind::BranchOutsideLoop { keyword })
}

#[cold]
pub fn untyped_nil() -> CompileError {
    CompileError::from_kind(CompileErrorKind::UntypedNil)
}

#[cold]
pub fn cannot_assign(what: impl Into<String>) -> CompileError {
    CompileError::from_kind(CompileErrorKind::CannotAssign { what: what.into() })
}

#[cfg(test)]
mod tests;
