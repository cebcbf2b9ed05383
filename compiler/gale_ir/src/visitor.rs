//! Syntax tree visitor.
//!
//! Default `visit_*` methods call the matching `walk_*` function, which
//! recurses into children. Override a `visit_*` method to observe a node and
//! call `walk_*` from it to keep descending.
//!
//! ```text
//! struct Idents(Vec<Name>);
//!
//! impl<'ast> Visitor<'ast> for Idents {
//!     fn visit_expr(&mut self, expr: &'ast Expr, arena: &'ast SyntaxArena) {
//!         if let ExprKind::Ident(name) = expr.kind {
//!             self.0.push(name);
//!         }
//!         walk_expr(self, expr, arena);
//!     }
//! }
//! ```

use crate::ast::{
    Block, Expr, ExprKind, FuncDecl, FuncSig, Item, Stmt, StmtKind, TypeExpr, TypeExprKind,
    ValueSpec,
};
use crate::{ExprId, StmtId, SyntaxArena, TypeExprId};

pub trait Visitor<'ast> {
    fn visit_item(&mut self, item: &'ast Item, arena: &'ast SyntaxArena) {
        walk_item(self, item, arena);
    }

    fn visit_value_spec(&mut self, spec: &'ast ValueSpec, arena: &'ast SyntaxArena) {
        walk_value_spec(self, spec, arena);
    }

    fn visit_func_decl(&mut self, decl: &'ast FuncDecl, arena: &'ast SyntaxArena) {
        walk_func_decl(self, decl, arena);
    }

    fn visit_expr(&mut self, expr: &'ast Expr, arena: &'ast SyntaxArena) {
        walk_expr(self, expr, arena);
    }

    fn visit_expr_id(&mut self, id: ExprId, arena: &'ast SyntaxArena) {
        self.visit_expr(arena.expr(id), arena);
    }

    fn visit_stmt(&mut self, stmt: &'ast Stmt, arena: &'ast SyntaxArena) {
        walk_stmt(self, stmt, arena);
    }

    fn visit_stmt_id(&mut self, id: StmtId, arena: &'ast SyntaxArena) {
        self.visit_stmt(arena.stmt(id), arena);
    }

    fn visit_block(&mut self, block: &'ast Block, arena: &'ast SyntaxArena) {
        for &stmt in &block.stmts {
            self.visit_stmt_id(stmt, arena);
        }
    }

    fn visit_type(&mut self, ty: &'ast TypeExpr, arena: &'ast SyntaxArena) {
        walk_type(self, ty, arena);
    }

    fn visit_type_id(&mut self, id: TypeExprId, arena: &'ast SyntaxArena) {
        self.visit_type(arena.type_expr(id), arena);
    }

    fn visit_sig(&mut self, sig: &'ast FuncSig, arena: &'ast SyntaxArena) {
        walk_sig(self, sig, arena);
    }
}

pub fn walk_item<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    item: &'ast Item,
    arena: &'ast SyntaxArena,
) {
    match item {
        Item::Const(specs) | Item::Var(specs) => {
            for spec in specs {
                visitor.visit_value_spec(spec, arena);
            }
        }
        Item::Type(spec) => visitor.visit_type_id(spec.ty, arena),
        Item::Func(decl) | Item::Macro(decl) => visitor.visit_func_decl(decl, arena),
        Item::Import(_) => {}
    }
}

pub fn walk_value_spec<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    spec: &'ast ValueSpec,
    arena: &'ast SyntaxArena,
) {
    if let Some(ty) = spec.ty {
        visitor.visit_type_id(ty, arena);
    }
    for &value in &spec.values {
        visitor.visit_expr_id(value, arena);
    }
}

pub fn walk_func_decl<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    decl: &'ast FuncDecl,
    arena: &'ast SyntaxArena,
) {
    if let Some(recv) = &decl.recv {
        visitor.visit_type_id(recv.ty, arena);
    }
    visitor.visit_sig(&decl.sig, arena);
    if let Some(body) = &decl.body {
        visitor.visit_block(body, arena);
    }
}

pub fn walk_sig<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    sig: &'ast FuncSig,
    arena: &'ast SyntaxArena,
) {
    for param in sig.params.iter().chain(sig.results.iter()) {
        visitor.visit_type_id(param.ty, arena);
    }
}

pub fn walk_expr<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    expr: &'ast Expr,
    arena: &'ast SyntaxArena,
) {
    match &expr.kind {
        ExprKind::Ident(_)
        | ExprKind::Nil
        | ExprKind::Bool(_)
        | ExprKind::Int(_)
        | ExprKind::Float(_)
        | ExprKind::Imag(_)
        | ExprKind::Str(_) => {}
        ExprKind::Unary { operand, .. } => visitor.visit_expr_id(*operand, arena),
        ExprKind::Binary { left, right, .. } => {
            visitor.visit_expr_id(*left, arena);
            visitor.visit_expr_id(*right, arena);
        }
        ExprKind::Call { func, args } => {
            visitor.visit_expr_id(*func, arena);
            for &arg in args {
                visitor.visit_expr_id(arg, arena);
            }
        }
        ExprKind::Index { container, key } => {
            visitor.visit_expr_id(*container, arena);
            visitor.visit_expr_id(*key, arena);
        }
        ExprKind::Selector { base, .. } => visitor.visit_expr_id(*base, arena),
        ExprKind::Paren(inner) => visitor.visit_expr_id(*inner, arena),
        ExprKind::Composite { ty, elems } => {
            visitor.visit_type_id(*ty, arena);
            for elem in elems {
                if let Some(key) = elem.key {
                    visitor.visit_expr_id(key, arena);
                }
                visitor.visit_expr_id(elem.value, arena);
            }
        }
        ExprKind::FuncLit { sig, body } => {
            visitor.visit_sig(sig, arena);
            visitor.visit_block(body, arena);
        }
        ExprKind::Type(ty) => visitor.visit_type_id(*ty, arena),
    }
}

pub fn walk_stmt<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    stmt: &'ast Stmt,
    arena: &'ast SyntaxArena,
) {
    match &stmt.kind {
        StmtKind::Expr(expr) => visitor.visit_expr_id(*expr, arena),
        StmtKind::Assign { lhs, rhs } => {
            for &e in lhs.iter().chain(rhs.iter()) {
                visitor.visit_expr_id(e, arena);
            }
        }
        StmtKind::OpAssign { lhs, rhs, .. } => {
            visitor.visit_expr_id(*lhs, arena);
            visitor.visit_expr_id(*rhs, arena);
        }
        StmtKind::Define { values, .. } | StmtKind::Return(values) => {
            for &value in values {
                visitor.visit_expr_id(value, arena);
            }
        }
        StmtKind::Var(spec) => visitor.visit_value_spec(spec, arena),
        StmtKind::IncDec { target, .. } => visitor.visit_expr_id(*target, arena),
        StmtKind::If { cond, then, els } => {
            visitor.visit_expr_id(*cond, arena);
            visitor.visit_block(then, arena);
            if let Some(els) = els {
                visitor.visit_stmt_id(*els, arena);
            }
        }
        StmtKind::For {
            init,
            cond,
            post,
            body,
        } => {
            if let Some(init) = init {
                visitor.visit_stmt_id(*init, arena);
            }
            if let Some(cond) = cond {
                visitor.visit_expr_id(*cond, arena);
            }
            if let Some(post) = post {
                visitor.visit_stmt_id(*post, arena);
            }
            visitor.visit_block(body, arena);
        }
        StmtKind::Break | StmtKind::Continue => {}
        StmtKind::Block(block) => visitor.visit_block(block, arena),
    }
}

pub fn walk_type<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    ty: &'ast TypeExpr,
    arena: &'ast SyntaxArena,
) {
    match &ty.kind {
        TypeExprKind::Named(_) | TypeExprKind::Qualified { .. } => {}
        TypeExprKind::Slice(elem) | TypeExprKind::Pointer(elem) => {
            visitor.visit_type_id(*elem, arena);
        }
        TypeExprKind::Array { len, elem } => {
            visitor.visit_expr_id(*len, arena);
            visitor.visit_type_id(*elem, arena);
        }
        TypeExprKind::Map { key, value } => {
            visitor.visit_type_id(*key, arena);
            visitor.visit_type_id(*value, arena);
        }
        TypeExprKind::Func(sig) => visitor.visit_sig(sig, arena),
        TypeExprKind::Struct(fields) => {
            for field in fields {
                visitor.visit_type_id(field.ty, arena);
            }
        }
        TypeExprKind::Interface(methods) => {
            for method in methods {
                visitor.visit_sig(&method.sig, arena);
            }
        }
    }
}
