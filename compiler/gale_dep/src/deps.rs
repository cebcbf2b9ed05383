//! Dependency collection.
//!
//! Walks a declaration's syntax and records every free identifier (minus
//! names bound by parameters, `:=` and local `var`) plus every selector
//! name, which later ties callers to methods of that name.

use gale_ir::visitor::{walk_expr, walk_stmt, walk_type, Visitor};
use gale_ir::{
    Block, Expr, ExprKind, FuncDecl, FuncSig, Name, Stmt, StmtKind, SyntaxArena, TypeExpr,
    TypeExprKind, ValueSpec,
};
use rustc_hash::FxHashSet;

use crate::decl::{DeclNode, OwnedNode};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DepSet {
    pub names: Box<[Name]>,
    pub methods: Box<[Name]>,
}

pub(crate) fn collect(node: &DeclNode, arena: &SyntaxArena) -> DepSet {
    let mut collector = DepCollector::default();
    match node {
        DeclNode::Owned(OwnedNode::Import(_)) | DeclNode::Forward => {}
        DeclNode::Owned(OwnedNode::Type(spec)) => collector.visit_type_id(spec.ty, arena),
        DeclNode::Owned(OwnedNode::Func(decl)) => collector.visit_func_decl(decl, arena),
        DeclNode::Owned(OwnedNode::Value(spec)) => collector.visit_value_spec(spec, arena),
        DeclNode::Grouped(extra) => {
            // Only this name's initializer, not its siblings'.
            if let Some(ty) = extra.ty() {
                collector.visit_type_id(ty, arena);
            }
            if let Some(value) = extra.value() {
                collector.visit_expr_id(value, arena);
            }
        }
        DeclNode::Tuple(spec) => collector.visit_value_spec(spec, arena),
    }
    collector.finish()
}

#[derive(Default)]
struct DepCollector {
    locals: Vec<FxHashSet<Name>>,
    names: Vec<Name>,
    seen: FxHashSet<Name>,
    methods: Vec<Name>,
    seen_methods: FxHashSet<Name>,
}

impl DepCollector {
    fn reference(&mut self, name: Name) {
        if self.locals.iter().any(|scope| scope.contains(&name)) {
            return;
        }
        if self.seen.insert(name) {
            self.names.push(name);
        }
    }

    fn selector(&mut self, name: Name) {
        if self.seen_methods.insert(name) {
            self.methods.push(name);
        }
    }

    fn bind(&mut self, name: Name) {
        if let Some(scope) = self.locals.last_mut() {
            scope.insert(name);
        }
    }

    fn with_scope(&mut self, f: impl FnOnce(&mut Self)) {
        self.locals.push(FxHashSet::default());
        f(self);
        self.locals.pop();
    }

    fn bind_sig(&mut self, sig: &FuncSig) {
        for param in sig.params.iter().chain(sig.results.iter()) {
            if let Some(name) = param.name {
                self.bind(name);
            }
        }
    }

    fn finish(self) -> DepSet {
        DepSet {
            names: self.names.into_boxed_slice(),
            methods: self.methods.into_boxed_slice(),
        }
    }
}

impl<'ast> Visitor<'ast> for DepCollector {
    fn visit_func_decl(&mut self, decl: &'ast FuncDecl, arena: &'ast SyntaxArena) {
        if let Some(recv) = &decl.recv {
            self.visit_type_id(recv.ty, arena);
        }
        self.visit_sig(&decl.sig, arena);
        self.with_scope(|this| {
            if let Some(name) = decl.recv.as_ref().and_then(|r| r.name) {
                this.bind(name);
            }
            this.bind_sig(&decl.sig);
            if let Some(body) = &decl.body {
                this.visit_block(body, arena);
            }
        });
    }

    fn visit_block(&mut self, block: &'ast Block, arena: &'ast SyntaxArena) {
        self.with_scope(|this| {
            for &stmt in &block.stmts {
                this.visit_stmt_id(stmt, arena);
            }
        });
    }

    fn visit_expr(&mut self, expr: &'ast Expr, arena: &'ast SyntaxArena) {
        match &expr.kind {
            ExprKind::Ident(name) => self.reference(*name),
            ExprKind::Selector { base, field } => {
                self.visit_expr_id(*base, arena);
                self.selector(*field);
            }
            ExprKind::FuncLit { sig, body } => {
                self.visit_sig(sig, arena);
                self.with_scope(|this| {
                    this.bind_sig(sig);
                    this.visit_block(body, arena);
                });
            }
            ExprKind::Composite { ty, elems } => {
                self.visit_type_id(*ty, arena);
                // Bare identifier keys name struct fields unless the literal
                // type is spelled out as a map, slice or array.
                let keys_are_exprs = matches!(
                    arena.type_expr(*ty).kind,
                    TypeExprKind::Map { .. } | TypeExprKind::Slice(_) | TypeExprKind::Array { .. }
                );
                for elem in elems {
                    if let Some(key) = elem.key {
                        let is_field_name = matches!(arena.expr(key).kind, ExprKind::Ident(_));
                        if keys_are_exprs || !is_field_name {
                            self.visit_expr_id(key, arena);
                        }
                    }
                    self.visit_expr_id(elem.value, arena);
                }
            }
            _ => walk_expr(self, expr, arena),
        }
    }

    fn visit_stmt(&mut self, stmt: &'ast Stmt, arena: &'ast SyntaxArena) {
        match &stmt.kind {
            StmtKind::Define { names, values } => {
                for &value in values {
                    self.visit_expr_id(value, arena);
                }
                for &name in names {
                    self.bind(name);
                }
            }
            StmtKind::Var(spec) => {
                self.visit_value_spec(spec, arena);
                for &name in &spec.names {
                    self.bind(name);
                }
            }
            // `for` init bindings are visible in cond, post and body only.
            StmtKind::For { .. } => self.with_scope(|this| walk_stmt(this, stmt, arena)),
            _ => walk_stmt(self, stmt, arena),
        }
    }

    fn visit_type(&mut self, ty: &'ast TypeExpr, arena: &'ast SyntaxArena) {
        match &ty.kind {
            TypeExprKind::Named(name) => self.reference(*name),
            TypeExprKind::Qualified { package, .. } => self.reference(*package),
            _ => walk_type(self, ty, arena),
        }
    }

    fn visit_value_spec(&mut self, spec: &'ast ValueSpec, arena: &'ast SyntaxArena) {
        if let Some(ty) = spec.ty {
            self.visit_type_id(ty, arena);
        }
        for &value in &spec.values {
            self.visit_expr_id(value, arena);
        }
    }
}
