//! Programmatic construction of syntax trees.
//!
//! The parser is not part of this workspace; hosts embedding the core and
//! the test suites build their input through [`AstBuilder`]. Every node gets
//! a fresh one-byte span so source order stays observable in diagnostics.

use crate::ast::{
    BinaryOp, Block, CompositeElem, Expr, ExprKind, FieldDecl, FuncDecl, FuncSig, ImportSpec,
    Item, MethodSpec, Param, Stmt, StmtKind, TypeExpr, TypeExprKind, TypeSpec, UnaryOp,
    ValueSpec,
};
use crate::{ExprId, Name, SharedArena, SharedInterner, Span, StmtId, SyntaxArena, TypeExprId};

pub struct AstBuilder {
    arena: SyntaxArena,
    interner: SharedInterner,
    pos: u32,
}

impl AstBuilder {
    pub fn new(interner: SharedInterner) -> Self {
        AstBuilder {
            arena: SyntaxArena::new(),
            interner,
            pos: 0,
        }
    }

    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    pub fn arena(&self) -> &SyntaxArena {
        &self.arena
    }

    /// Freeze the arena for sharing with the loader and compiler.
    pub fn finish(self) -> SharedArena {
        SharedArena::new(self.arena)
    }

    fn next_span(&mut self) -> Span {
        let start = self.pos;
        self.pos += 1;
        Span::new(start, self.pos)
    }

    pub fn name(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    // Expressions

    pub fn expr(&mut self, kind: ExprKind) -> ExprId {
        let span = self.next_span();
        self.arena.alloc_expr(Expr::new(kind, span))
    }

    pub fn ident(&mut self, s: &str) -> ExprId {
        let name = self.name(s);
        self.expr(ExprKind::Ident(name))
    }

    pub fn nil(&mut self) -> ExprId {
        self.expr(ExprKind::Nil)
    }

    pub fn bool(&mut self, value: bool) -> ExprId {
        self.expr(ExprKind::Bool(value))
    }

    pub fn int(&mut self, value: i128) -> ExprId {
        self.expr(ExprKind::Int(value))
    }

    pub fn float(&mut self, value: f64) -> ExprId {
        self.expr(ExprKind::Float(value.to_bits()))
    }

    pub fn imag(&mut self, value: f64) -> ExprId {
        self.expr(ExprKind::Imag(value.to_bits()))
    }

    pub fn string(&mut self, value: &str) -> ExprId {
        let name = self.name(value);
        self.expr(ExprKind::Str(name))
    }

    pub fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        self.expr(ExprKind::Binary { op, left, right })
    }

    pub fn unary(&mut self, op: UnaryOp, operand: ExprId) -> ExprId {
        self.expr(ExprKind::Unary { op, operand })
    }

    pub fn call(&mut self, func: ExprId, args: impl IntoIterator<Item = ExprId>) -> ExprId {
        let args = args.into_iter().collect();
        self.expr(ExprKind::Call { func, args })
    }

    /// Call of a function referenced by name: `f(args...)`.
    pub fn call_named(&mut self, func: &str, args: impl IntoIterator<Item = ExprId>) -> ExprId {
        let func = self.ident(func);
        self.call(func, args)
    }

    pub fn index(&mut self, container: ExprId, key: ExprId) -> ExprId {
        self.expr(ExprKind::Index { container, key })
    }

    pub fn selector(&mut self, base: ExprId, field: &str) -> ExprId {
        let field = self.name(field);
        self.expr(ExprKind::Selector { base, field })
    }

    pub fn paren(&mut self, inner: ExprId) -> ExprId {
        self.expr(ExprKind::Paren(inner))
    }

    pub fn composite(
        &mut self,
        ty: TypeExprId,
        elems: impl IntoIterator<Item = (Option<ExprId>, ExprId)>,
    ) -> ExprId {
        let elems = elems
            .into_iter()
            .map(|(key, value)| CompositeElem { key, value })
            .collect();
        self.expr(ExprKind::Composite { ty, elems })
    }

    pub fn func_lit(&mut self, sig: FuncSig, body: Block) -> ExprId {
        self.expr(ExprKind::FuncLit { sig, body })
    }

    /// `ty` used as an operand, as in `make([]int, n)`.
    pub fn type_operand(&mut self, ty: TypeExprId) -> ExprId {
        self.expr(ExprKind::Type(ty))
    }

    // Type expressions

    pub fn type_expr(&mut self, kind: TypeExprKind) -> TypeExprId {
        let span = self.next_span();
        self.arena.alloc_type(TypeExpr { kind, span })
    }

    /// Named type reference such as `int` or `Point`.
    pub fn ty(&mut self, s: &str) -> TypeExprId {
        let name = self.name(s);
        self.type_expr(TypeExprKind::Named(name))
    }

    pub fn qualified(&mut self, package: &str, name: &str) -> TypeExprId {
        let package = self.name(package);
        let name = self.name(name);
        self.type_expr(TypeExprKind::Qualified { package, name })
    }

    pub fn slice_of(&mut self, elem: TypeExprId) -> TypeExprId {
        self.type_expr(TypeExprKind::Slice(elem))
    }

    pub fn array_of(&mut self, len: ExprId, elem: TypeExprId) -> TypeExprId {
        self.type_expr(TypeExprKind::Array { len, elem })
    }

    pub fn map_of(&mut self, key: TypeExprId, value: TypeExprId) -> TypeExprId {
        self.type_expr(TypeExprKind::Map { key, value })
    }

    pub fn pointer_to(&mut self, elem: TypeExprId) -> TypeExprId {
        self.type_expr(TypeExprKind::Pointer(elem))
    }

    pub fn func_type(&mut self, sig: FuncSig) -> TypeExprId {
        self.type_expr(TypeExprKind::Func(sig))
    }

    pub fn struct_type(&mut self, fields: &[(&str, TypeExprId)]) -> TypeExprId {
        let fields = fields
            .iter()
            .map(|&(name, ty)| FieldDecl {
                name: self.name(name),
                ty,
                embedded: false,
            })
            .collect();
        self.type_expr(TypeExprKind::Struct(fields))
    }

    pub fn interface_type(&mut self, methods: Vec<(&str, FuncSig)>) -> TypeExprId {
        let methods = methods
            .into_iter()
            .map(|(name, sig)| MethodSpec {
                name: self.name(name),
                sig,
            })
            .collect();
        self.type_expr(TypeExprKind::Interface(methods))
    }

    /// Signature with named parameters and unnamed results.
    pub fn sig(&self, params: &[(&str, TypeExprId)], results: &[TypeExprId]) -> FuncSig {
        FuncSig {
            params: params
                .iter()
                .map(|&(name, ty)| Param {
                    name: Some(self.name(name)),
                    ty,
                })
                .collect(),
            results: results.iter().map(|&ty| Param { name: None, ty }).collect(),
            variadic: false,
        }
    }

    // Statements

    pub fn stmt(&mut self, kind: StmtKind) -> StmtId {
        let span = self.next_span();
        self.arena.alloc_stmt(Stmt { kind, span })
    }

    pub fn block(&mut self, stmts: impl IntoIterator<Item = StmtId>) -> Block {
        let span = self.next_span();
        Block {
            stmts: stmts.into_iter().collect(),
            span,
        }
    }

    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        self.stmt(StmtKind::Expr(expr))
    }

    pub fn assign(&mut self, lhs: Vec<ExprId>, rhs: Vec<ExprId>) -> StmtId {
        self.stmt(StmtKind::Assign {
            lhs: lhs.into_boxed_slice(),
            rhs: rhs.into_boxed_slice(),
        })
    }

    /// Single assignment `lhs = rhs`.
    pub fn assign1(&mut self, lhs: ExprId, rhs: ExprId) -> StmtId {
        self.assign(vec![lhs], vec![rhs])
    }

    pub fn op_assign(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> StmtId {
        self.stmt(StmtKind::OpAssign { op, lhs, rhs })
    }

    pub fn define(&mut self, names: &[&str], values: Vec<ExprId>) -> StmtId {
        let names = names.iter().map(|n| self.name(n)).collect();
        self.stmt(StmtKind::Define {
            names,
            values: values.into_boxed_slice(),
        })
    }

    pub fn var_stmt(&mut self, spec: ValueSpec) -> StmtId {
        self.stmt(StmtKind::Var(spec))
    }

    pub fn inc(&mut self, target: ExprId) -> StmtId {
        self.stmt(StmtKind::IncDec { target, inc: true })
    }

    pub fn dec(&mut self, target: ExprId) -> StmtId {
        self.stmt(StmtKind::IncDec { target, inc: false })
    }

    pub fn if_stmt(&mut self, cond: ExprId, then: Block, els: Option<StmtId>) -> StmtId {
        self.stmt(StmtKind::If { cond, then, els })
    }

    pub fn for_stmt(
        &mut self,
        init: Option<StmtId>,
        cond: Option<ExprId>,
        post: Option<StmtId>,
        body: Block,
    ) -> StmtId {
        self.stmt(StmtKind::For {
            init,
            cond,
            post,
            body,
        })
    }

    pub fn ret(&mut self, values: Vec<ExprId>) -> StmtId {
        self.stmt(StmtKind::Return(values.into_boxed_slice()))
    }

    pub fn break_stmt(&mut self) -> StmtId {
        self.stmt(StmtKind::Break)
    }

    pub fn continue_stmt(&mut self) -> StmtId {
        self.stmt(StmtKind::Continue)
    }

    pub fn block_stmt(&mut self, block: Block) -> StmtId {
        self.stmt(StmtKind::Block(block))
    }

    // Items

    pub fn value_spec(
        &mut self,
        names: &[&str],
        ty: Option<TypeExprId>,
        values: Vec<ExprId>,
    ) -> ValueSpec {
        let span = self.next_span();
        ValueSpec {
            names: names.iter().map(|n| self.name(n)).collect(),
            ty,
            values: values.into_boxed_slice(),
            span,
        }
    }

    pub fn const_block(&self, specs: Vec<ValueSpec>) -> Item {
        Item::Const(specs.into_boxed_slice())
    }

    pub fn var_block(&self, specs: Vec<ValueSpec>) -> Item {
        Item::Var(specs.into_boxed_slice())
    }

    /// `const name = value`
    pub fn const_decl(&mut self, name: &str, value: ExprId) -> Item {
        let spec = self.value_spec(&[name], None, vec![value]);
        self.const_block(vec![spec])
    }

    /// `var name T = value`; either the type or the value may be absent.
    pub fn var_decl(&mut self, name: &str, ty: Option<TypeExprId>, value: Option<ExprId>) -> Item {
        let spec = self.value_spec(&[name], ty, value.into_iter().collect());
        self.var_block(vec![spec])
    }

    pub fn type_decl(&mut self, name: &str, ty: TypeExprId) -> Item {
        let span = self.next_span();
        Item::Type(TypeSpec {
            name: self.name(name),
            ty,
            alias: false,
            span,
        })
    }

    pub fn alias_decl(&mut self, name: &str, ty: TypeExprId) -> Item {
        let span = self.next_span();
        Item::Type(TypeSpec {
            name: self.name(name),
            ty,
            alias: true,
            span,
        })
    }

    pub fn func_decl(&mut self, name: &str, sig: FuncSig, body: Block) -> Item {
        let span = self.next_span();
        Item::Func(FuncDecl {
            name: self.name(name),
            recv: None,
            sig,
            body: Some(body),
            span,
        })
    }

    /// `func (recv RecvType) name(sig) { body }`
    pub fn method_decl(
        &mut self,
        recv: (&str, TypeExprId),
        name: &str,
        sig: FuncSig,
        body: Block,
    ) -> Item {
        let span = self.next_span();
        Item::Func(FuncDecl {
            name: self.name(name),
            recv: Some(Param {
                name: Some(self.name(recv.0)),
                ty: recv.1,
            }),
            sig,
            body: Some(body),
            span,
        })
    }

    pub fn macro_decl(&mut self, name: &str, sig: FuncSig, body: Block) -> Item {
        let span = self.next_span();
        Item::Macro(FuncDecl {
            name: self.name(name),
            recv: None,
            sig,
            body: Some(body),
            span,
        })
    }

    pub fn import(&mut self, path: &str, alias: Option<&str>) -> Item {
        let span = self.next_span();
        Item::Import(ImportSpec {
            path: self.name(path),
            alias: alias.map(|a| self.name(a)),
            span,
        })
    }
}

impl Default for AstBuilder {
    fn default() -> Self {
        Self::new(SharedInterner::new())
    }
}

#[cfg(test)]
mod tests;
