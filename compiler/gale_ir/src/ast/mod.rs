//! Syntax tree nodes.
//!
//! Nodes reference their children through arena IDs; see [`SyntaxArena`](crate::SyntaxArena).

mod items;
mod operators;
mod stmt;
mod types;

pub use items::{FuncDecl, ImportSpec, Item, TypeSpec, ValueSpec};
pub use operators::{BinaryOp, UnaryOp};
pub use stmt::{Block, Stmt, StmtKind};
pub use types::{FieldDecl, FuncSig, MethodSpec, Param, TypeExpr, TypeExprKind};

use crate::{ExprId, Name, Span, TypeExprId};

/// Expression node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

/// Expression kinds.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExprKind {
    /// Identifier reference (variable, constant, function, type or package).
    Ident(Name),
    /// The predeclared `nil`.
    Nil,
    /// `true` / `false`.
    Bool(bool),
    /// Untyped integer literal.
    Int(i128),
    /// Untyped float literal, stored as `f64::to_bits`.
    Float(u64),
    /// Imaginary literal such as `2.5i`; the imaginary part as `f64::to_bits`.
    Imag(u64),
    /// String literal (interned).
    Str(Name),
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    Call {
        func: ExprId,
        args: Box<[ExprId]>,
    },
    /// `container[key]` on maps and slices.
    Index {
        container: ExprId,
        key: ExprId,
    },
    /// `base.field`: struct field, method value or package member.
    Selector {
        base: ExprId,
        field: Name,
    },
    Paren(ExprId),
    /// `T{...}` for slices, maps and structs.
    Composite {
        ty: TypeExprId,
        elems: Box<[CompositeElem]>,
    },
    /// `func(params) results { body }`.
    FuncLit {
        sig: FuncSig,
        body: Block,
    },
    /// Type in operand position: a conversion callee or the first
    /// argument of `make`.
    Type(TypeExprId),
}

/// One element of a composite literal; `key` is the map key or struct field name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompositeElem {
    pub key: Option<ExprId>,
    pub value: ExprId,
}
