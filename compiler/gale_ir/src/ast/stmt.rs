//! Statements and blocks.

use super::{BinaryOp, ValueSpec};
use crate::{ExprId, Name, Span, StmtId};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StmtKind {
    /// Expression evaluated for its side effects.
    Expr(ExprId),
    /// `a, b = x, y` (or `a, b = f()` with a single multi-valued call).
    Assign {
        lhs: Box<[ExprId]>,
        rhs: Box<[ExprId]>,
    },
    /// `a += x` and friends.
    OpAssign {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    /// `a, b := x, y`
    Define {
        names: Box<[Name]>,
        values: Box<[ExprId]>,
    },
    /// Local `var` declaration.
    Var(ValueSpec),
    /// `x++` / `x--`
    IncDec {
        target: ExprId,
        inc: bool,
    },
    If {
        cond: ExprId,
        then: Block,
        /// Either another `If` or a `Block` statement.
        els: Option<StmtId>,
    },
    For {
        init: Option<StmtId>,
        cond: Option<ExprId>,
        post: Option<StmtId>,
        body: Block,
    },
    Break,
    Continue,
    Return(Box<[ExprId]>),
    Block(Block),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Block {
    pub stmts: Box<[StmtId]>,
    pub span: Span,
}
