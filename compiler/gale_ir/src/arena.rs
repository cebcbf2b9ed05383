//! Arena storage for the flat syntax tree.
//!
//! All expressions, statements and type expressions of one compilation unit
//! live in three contiguous vectors; children refer to them by index.

use crate::ast::{Expr, Stmt, TypeExpr};
use crate::{ExprId, StmtId, TypeExprId};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

#[derive(Clone, Default, PartialEq, Eq)]
pub struct SyntaxArena {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
    types: Vec<TypeExpr>,
}

fn next_index(len: usize) -> u32 {
    // Ids are u32; INVALID is reserved.
    u32::try_from(len)
        .ok()
        .filter(|&n| n != u32::MAX)
        .unwrap_or_else(|| panic!("syntax arena exceeded {} nodes", u32::MAX))
}

impl SyntaxArena {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(next_index(self.exprs.len()));
        self.exprs.push(expr);
        id
    }

    /// # Panics
    /// Panics if `id` does not belong to this arena.
    #[inline]
    #[track_caller]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    #[inline]
    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId::new(next_index(self.stmts.len()));
        self.stmts.push(stmt);
        id
    }

    /// # Panics
    /// Panics if `id` does not belong to this arena.
    #[inline]
    #[track_caller]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    #[inline]
    pub fn alloc_type(&mut self, ty: TypeExpr) -> TypeExprId {
        let id = TypeExprId::new(next_index(self.types.len()));
        self.types.push(ty);
        id
    }

    /// # Panics
    /// Panics if `id` does not belong to this arena.
    #[inline]
    #[track_caller]
    pub fn type_expr(&self, id: TypeExprId) -> &TypeExpr {
        &self.types[id.index()]
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    pub fn stmt_count(&self) -> usize {
        self.stmts.len()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}

impl fmt::Debug for SyntaxArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SyntaxArena {{ {} exprs, {} stmts, {} types }}",
            self.exprs.len(),
            self.stmts.len(),
            self.types.len()
        )
    }
}

/// Frozen arena shared by declarations, compiled closures and lowering.
#[derive(Clone, Default)]
pub struct SharedArena(Arc<SyntaxArena>);

impl SharedArena {
    pub fn new(arena: SyntaxArena) -> Self {
        SharedArena(Arc::new(arena))
    }

    /// True if both handles point to the same arena.
    pub fn ptr_eq(&self, other: &SharedArena) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for SharedArena {
    type Target = SyntaxArena;

    fn deref(&self) -> &SyntaxArena {
        &self.0
    }
}

impl From<SyntaxArena> for SharedArena {
    fn from(arena: SyntaxArena) -> Self {
        SharedArena::new(arena)
    }
}

impl fmt::Debug for SharedArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shared{:?}", &*self.0)
    }
}
