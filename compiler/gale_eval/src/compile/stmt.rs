//! Statements and assignment targets.
//!
//! Statements append to the current frame's code. Control flow compiles to
//! jumps between positions in that list: a [`Label`] is created before the
//! jump that uses it and bound once its position is known.

use std::sync::Arc;

use gale_ir::{BinaryOp, Block, ExprId, ExprKind, Name, StmtId, StmtKind, ValueSpec};
use gale_types::{Kind, Type};
use smallvec::SmallVec;

use super::expr::{load_var, struct_base};
use super::types::SigTypes;
use super::{Compiler, Loop, Operand, Resolved};
use crate::constant::Constant;
use crate::env::{stmt, Label, Step, Stmt};
use crate::errors::{
    branch_outside_loop, cannot_assign, non_bool_condition, not_assignable, undefined,
    value_count, CompileError,
};
use crate::fun::{fun, ExprFun, Fun};
use crate::place::{set_place_const, set_place_expr, set_place_op, Place};
use crate::stack::ensure_sufficient_stack;
use crate::value::{zero_value, Value};

fn jump(label: Label) -> Stmt {
    stmt(move |env| Ok(env.jump(&label)))
}

/// Statement evaluating `values` in order and returning them.
fn return_values(values: Vec<Fun<Value>>) -> Stmt {
    stmt(move |env| {
        let mut out = Vec::with_capacity(values.len());
        for v in &values {
            out.push(v(env)?);
        }
        env.set_results(out);
        Ok(Step::Stop)
    })
}

/// Statement evaluating `values` in order, then storing each into its
/// slot of the current environment. `None` discards the value.
fn store_slots(values: Vec<(Option<usize>, Fun<Value>)>) -> Stmt {
    stmt(move |env| {
        let mut out: SmallVec<[Value; 4]> = SmallVec::with_capacity(values.len());
        for (_, v) in &values {
            out.push(v(env)?);
        }
        for ((slot, _), v) in values.iter().zip(out) {
            if let Some(slot) = slot {
                env.set(*slot, v);
            }
        }
        Ok(env.advance())
    })
}

/// Statement spreading the results of `call` into `slots`.
fn spread(call: Fun<Vec<Value>>, slots: Vec<Option<usize>>) -> Stmt {
    stmt(move |env| {
        for (slot, v) in slots.iter().zip(call(env)?) {
            if let Some(slot) = slot {
                env.set(*slot, v);
            }
        }
        Ok(env.advance())
    })
}

impl Compiler<'_> {
    pub(crate) fn stmt(&mut self, id: StmtId) -> Result<(), CompileError> {
        let arena = self.arena.clone();
        let node = arena.stmt(id);
        ensure_sufficient_stack(|| self.stmt_kind(&node.kind)).map_err(|e| e.with_span(node.span))
    }

    fn stmt_kind(&mut self, kind: &StmtKind) -> Result<(), CompileError> {
        match kind {
            StmtKind::Expr(expr) => {
                let op = self.expr(*expr)?;
                self.discard(op);
                Ok(())
            }
            StmtKind::Assign { lhs, rhs } => self.assign(lhs, rhs),
            StmtKind::OpAssign { op, lhs, rhs } => self.op_assign(*op, *lhs, *rhs),
            StmtKind::Define { names, values } => self.declare_values(names, None, values, true),
            StmtKind::Var(spec) => self.var_stmt(spec),
            StmtKind::IncDec { target, inc } => self.inc_dec(*target, *inc),
            StmtKind::If { cond, then, els } => self.if_stmt(*cond, then, *els),
            StmtKind::For {
                init,
                cond,
                post,
                body,
            } => self.for_stmt(*init, *cond, *post, body),
            StmtKind::Break => self.branch("break", |l| l.brk.clone()),
            StmtKind::Continue => self.branch("continue", |l| l.cont.clone()),
            StmtKind::Return(values) => self.return_stmt(values),
            StmtKind::Block(block) => self.block(block),
        }
    }

    pub(crate) fn block(&mut self, block: &Block) -> Result<(), CompileError> {
        self.push_block();
        let result = block.stmts.iter().try_for_each(|&s| self.stmt(s));
        self.pop_block();
        result
    }

    /// Evaluate `op` for its side effects.
    fn discard(&mut self, op: Operand) {
        match op {
            Operand::Const { .. } => {}
            Operand::Value { fun, .. } => {
                let f = fun.any();
                self.emit(stmt(move |env| {
                    f(env)?;
                    Ok(env.advance())
                }));
            }
            Operand::Multi { fun, .. } => self.emit(stmt(move |env| {
                fun(env)?;
                Ok(env.advance())
            })),
        }
    }

    // ── Assignment ──────────────────────────────────────────────────

    /// Location an assignment stores into; `None` for the blank `_`.
    pub(crate) fn place(&mut self, id: ExprId) -> Result<Option<Place>, CompileError> {
        let arena = self.arena.clone();
        let node = arena.expr(id);
        self.place_kind(&node.kind).map_err(|e| e.with_span(node.span))
    }

    fn place_kind(&mut self, kind: &ExprKind) -> Result<Option<Place>, CompileError> {
        match kind {
            ExprKind::Ident(name) => {
                let text = self.name_str(*name);
                if text == "_" {
                    return Ok(None);
                }
                match self.resolve_or_err(*name)? {
                    Resolved::Var { depth, slot, ty } => Ok(Some(Place::var(depth, slot, ty))),
                    _ => Err(cannot_assign(text)),
                }
            }
            ExprKind::Paren(inner) => self.place(*inner),
            ExprKind::Index { container, key } => {
                let c = self.expr(*container)?;
                let (cf, cty) = self.value_of(c)?;
                let k = self.expr(*key)?;
                match (cty.key(), cty.elem()) {
                    (Some(key_ty), Some(elem)) => {
                        let kf = self.value_for(k, &key_ty)?.any();
                        Ok(Some(Place::map_entry(cf.any(), kf, elem)))
                    }
                    (None, Some(elem)) if cty.kind() == Kind::Slice => {
                        let index = self.index_value(k)?;
                        let key = fun(move |env| index(env).map(Value::Int));
                        Ok(Some(Place::slice_elem(cf.any(), key, elem)))
                    }
                    _ => Err(cannot_assign(format!("index of {cty}"))),
                }
            }
            ExprKind::Selector { base, field } => {
                let name = self.name_str(*field);
                let Some(base) = self.place(*base)? else {
                    return Err(cannot_assign(format!("_.{name}")));
                };
                let (index, f) = struct_base(&base.ty)
                    .field_by_name(name)
                    .ok_or_else(|| undefined(&format!("{}.{name}", base.ty)))?;
                Ok(Some(Place::field(&base, index, f.ty)))
            }
            _ => Err(cannot_assign("expression")),
        }
    }

    /// `place = op`.
    pub(crate) fn store(&self, place: &Place, op: Operand) -> Result<Stmt, CompileError> {
        match op {
            Operand::Const { value, ty } => {
                if let Some(ty) = ty {
                    if !ty.assignable_to(&place.ty) {
                        return Err(not_assignable(&ty, &place.ty));
                    }
                }
                set_place_const(place, &value)
            }
            other => {
                let f = self.value_for(other, &place.ty)?;
                set_place_expr(place, f)
            }
        }
    }

    fn assign(&mut self, lhs: &[ExprId], rhs: &[ExprId]) -> Result<(), CompileError> {
        match (lhs, rhs) {
            ([target], [value]) => {
                let place = self.place(*target)?;
                let op = self.expr(*value)?;
                match place {
                    Some(place) => {
                        let s = self.store(&place, op)?;
                        self.emit(s);
                    }
                    None => {
                        let op = self.single(op)?;
                        self.discard(op);
                    }
                }
                Ok(())
            }
            (targets, [value]) => {
                let Operand::Multi { fun: call, tys } = self.expr(*value)? else {
                    return Err(value_count(targets.len(), 1));
                };
                if tys.len() != targets.len() {
                    return Err(value_count(targets.len(), tys.len()));
                }
                let temps: Vec<usize> = tys.iter().map(|_| self.frame.alloc()).collect();
                self.emit(spread(call, temps.iter().copied().map(Some).collect()));
                for ((&target, ty), temp) in targets.iter().zip(tys).zip(temps) {
                    self.assign_temp(target, ty, temp)?;
                }
                Ok(())
            }
            (targets, values) => {
                if targets.len() != values.len() {
                    return Err(value_count(targets.len(), values.len()));
                }
                // Right-hand sides are evaluated before any store.
                let mut staged = Vec::with_capacity(values.len());
                let mut temps = Vec::with_capacity(values.len());
                for &value in values {
                    let op = self.expr(value)?;
                    let (f, ty) = self.value_of(op)?;
                    let temp = self.frame.alloc();
                    staged.push((Some(temp), f.any()));
                    temps.push((temp, ty));
                }
                self.emit(store_slots(staged));
                for (&target, (temp, ty)) in targets.iter().zip(temps) {
                    self.assign_temp(target, ty, temp)?;
                }
                Ok(())
            }
        }
    }

    /// `target = temp`, where slot `temp` holds a value of type `ty`.
    fn assign_temp(&mut self, target: ExprId, ty: Type, temp: usize) -> Result<(), CompileError> {
        let Some(place) = self.place(target)? else {
            return Ok(());
        };
        let value = Operand::Value {
            fun: ExprFun::typed(&ty, load_var(0, temp)),
            ty,
        };
        let s = self.store(&place, value)?;
        self.emit(s);
        Ok(())
    }

    /// `a, b := x, y` and `var a, b T = x, y`.
    ///
    /// Values are compiled before the names come into scope. With
    /// `redeclare`, a name already declared in the innermost block is
    /// assigned instead of declared again.
    fn declare_values(
        &mut self,
        names: &[Name],
        declared: Option<Type>,
        values: &[ExprId],
        redeclare: bool,
    ) -> Result<(), CompileError> {
        let mut ops = Vec::with_capacity(values.len());
        for &value in values {
            ops.push(self.expr(value)?);
        }

        if let [Operand::Multi { tys, .. }] = ops.as_slice() {
            if names.len() > 1 {
                if tys.len() != names.len() {
                    return Err(value_count(names.len(), tys.len()));
                }
                let tys = tys.clone();
                let Some(Operand::Multi { fun: call, .. }) = ops.pop() else {
                    return Err(value_count(names.len(), 1));
                };
                let mut slots = Vec::with_capacity(names.len());
                for (&name, ty) in names.iter().zip(tys) {
                    let want = declared.clone().unwrap_or_else(|| ty.clone());
                    if !ty.assignable_to(&want) {
                        return Err(not_assignable(&ty, &want));
                    }
                    slots.push(self.bind_name(name, want, redeclare)?);
                }
                self.emit(spread(call, slots));
                return Ok(());
            }
        }

        if ops.len() != names.len() {
            return Err(value_count(names.len(), ops.len()));
        }
        let mut staged = Vec::with_capacity(ops.len());
        let mut types = Vec::with_capacity(ops.len());
        for op in ops {
            let ty = match &declared {
                Some(ty) => ty.clone(),
                None => self.operand_type(&op)?,
            };
            let f = self.value_for(op, &ty)?;
            staged.push(f.any());
            types.push(ty);
        }
        let mut stores = Vec::with_capacity(staged.len());
        for ((&name, f), ty) in names.iter().zip(staged).zip(types) {
            stores.push((self.bind_name(name, ty, redeclare)?, f));
        }
        self.emit(store_slots(stores));
        Ok(())
    }

    /// Slot for a declared name; `None` for `_`.
    fn bind_name(&mut self, name: Name, ty: Type, redeclare: bool) -> Result<Option<usize>, CompileError> {
        if self.name_str(name) == "_" {
            return Ok(None);
        }
        if redeclare {
            if let Some(local) = self.frame.lookup_innermost(name) {
                if !ty.assignable_to(&local.ty) {
                    return Err(not_assignable(&ty, &local.ty));
                }
                return Ok(Some(local.slot));
            }
        }
        Ok(Some(self.frame.declare(name, ty)))
    }

    /// Local `var`: zero values unless initialized.
    fn var_stmt(&mut self, spec: &ValueSpec) -> Result<(), CompileError> {
        let declared = spec.ty.map(|t| self.resolve_type(t)).transpose()?;
        if !spec.values.is_empty() {
            return self.declare_values(&spec.names, declared, &spec.values, false);
        }
        let ty = declared.ok_or_else(|| value_count(spec.names.len(), 0))?;
        let zero = zero_value(&ty);
        let mut stores = Vec::with_capacity(spec.names.len());
        for &name in &spec.names {
            let z = zero.clone();
            stores.push((self.bind_name(name, ty.clone(), false)?, fun(move |_| Ok(z.clone()))));
        }
        self.emit(store_slots(stores));
        Ok(())
    }

    fn inc_dec(&mut self, target: ExprId, inc: bool) -> Result<(), CompileError> {
        let place = self.place(target)?.ok_or_else(|| cannot_assign("_"))?;
        let one = ExprFun::constant(&place.ty, Constant::Int(1).to_value(&place.ty)?);
        let op = if inc { BinaryOp::Add } else { BinaryOp::Sub };
        let s = set_place_op(&place, op, one)?;
        self.emit(s);
        Ok(())
    }

    fn op_assign(&mut self, op: BinaryOp, target: ExprId, value: ExprId) -> Result<(), CompileError> {
        let place = self.place(target)?.ok_or_else(|| cannot_assign("_"))?;
        let rhs = self.expr(value)?;
        let rhs = if op.is_shift() {
            self.value_of(rhs)?.0
        } else {
            self.value_for(rhs, &place.ty)?
        };
        let s = set_place_op(&place, op, rhs)?;
        self.emit(s);
        Ok(())
    }

    // ── Control flow ────────────────────────────────────────────────

    fn condition(&mut self, cond: ExprId) -> Result<Fun<bool>, CompileError> {
        let op = self.expr(cond)?;
        match self.value_of(op)? {
            (ExprFun::Bool(f), _) => Ok(f),
            (_, ty) => Err(non_bool_condition(&ty)),
        }
    }

    fn if_stmt(&mut self, cond: ExprId, then: &Block, els: Option<StmtId>) -> Result<(), CompileError> {
        let c = self.condition(cond)?;
        let otherwise = Label::new();
        let skip = otherwise.clone();
        self.emit(stmt(move |env| {
            Ok(if c(env)? { env.advance() } else { env.jump(&skip) })
        }));
        self.block(then)?;
        match els {
            Some(els) => {
                let end = Label::new();
                self.emit(jump(end.clone()));
                otherwise.bind(self.frame.pc());
                self.stmt(els)?;
                end.bind(self.frame.pc());
            }
            None => otherwise.bind(self.frame.pc()),
        }
        Ok(())
    }

    fn for_stmt(
        &mut self,
        init: Option<StmtId>,
        cond: Option<ExprId>,
        post: Option<StmtId>,
        body: &Block,
    ) -> Result<(), CompileError> {
        self.push_block();
        if let Some(init) = init {
            self.stmt(init)?;
        }
        let top = Label::new();
        top.bind(self.frame.pc());
        let brk = Label::new();
        let cont = Label::new();
        if let Some(cond) = cond {
            let c = self.condition(cond)?;
            let exit = brk.clone();
            self.emit(stmt(move |env| {
                Ok(if c(env)? { env.advance() } else { env.jump(&exit) })
            }));
        }
        self.frame.loops.push(Loop {
            brk: brk.clone(),
            cont: cont.clone(),
        });
        let result = self.block(body);
        self.frame.loops.pop();
        result?;
        cont.bind(self.frame.pc());
        if let Some(post) = post {
            self.stmt(post)?;
        }
        self.emit(jump(top));
        brk.bind(self.frame.pc());
        self.pop_block();
        Ok(())
    }

    fn branch(&mut self, keyword: &'static str, target: impl Fn(&Loop) -> Label) -> Result<(), CompileError> {
        let label = self
            .frame
            .loops
            .last()
            .map(target)
            .ok_or_else(|| branch_outside_loop(keyword))?;
        self.emit(jump(label));
        Ok(())
    }

    fn return_stmt(&mut self, values: &[ExprId]) -> Result<(), CompileError> {
        let results = self.frame.results.clone();
        if values.is_empty() {
            if let Some(slots) = self.frame.named_results.clone() {
                let loads = slots.into_iter().map(|s| load_var(0, s)).collect();
                self.emit(return_values(loads));
            } else if results.is_empty() {
                self.emit(stmt(|_| Ok(Step::Stop)));
            } else {
                return Err(value_count(results.len(), 0));
            }
            return Ok(());
        }

        if let [value] = values {
            if results.len() != 1 {
                let Operand::Multi { fun: call, tys } = self.expr(*value)? else {
                    return Err(value_count(results.len(), 1));
                };
                if tys.len() != results.len() {
                    return Err(value_count(results.len(), tys.len()));
                }
                for (have, want) in tys.iter().zip(&results) {
                    if !have.assignable_to(want) {
                        return Err(not_assignable(have, want));
                    }
                }
                self.emit(stmt(move |env| {
                    env.set_results(call(env)?);
                    Ok(Step::Stop)
                }));
                return Ok(());
            }
        }

        if values.len() != results.len() {
            return Err(value_count(results.len(), values.len()));
        }
        let mut funs = Vec::with_capacity(values.len());
        for (&value, ty) in values.iter().zip(&results) {
            let op = self.expr(value)?;
            funs.push(self.value_for(op, ty)?.any());
        }
        self.emit(return_values(funs));
        Ok(())
    }

    // ── Function bodies ─────────────────────────────────────────────

    /// Compile a body into the current (fresh) frame. The receiver and
    /// parameters take the first slots, in order; named results follow
    /// and start at their zero values.
    pub(crate) fn func_body(
        &mut self,
        recv: Option<(Option<Name>, Type)>,
        sig: &SigTypes,
        body: &Block,
    ) -> Result<(), CompileError> {
        self.frame.results = sig.result_types();
        for (name, ty) in recv.into_iter().chain(sig.params.iter().cloned()) {
            self.bind_slot(name, ty);
        }
        if sig.results.iter().any(|(name, _)| name.is_some()) {
            let mut slots = Vec::with_capacity(sig.results.len());
            let mut zeros = Vec::with_capacity(sig.results.len());
            for (name, ty) in &sig.results {
                let slot = self.bind_slot(*name, ty.clone());
                let zero = zero_value(ty);
                slots.push(slot);
                zeros.push((Some(slot), fun(move |_| Ok(zero.clone()))));
            }
            self.emit(store_slots(zeros));
            self.frame.named_results = Some(slots);
        }
        self.block(body)?;
        self.emit(self.implicit_return());
        Ok(())
    }

    fn bind_slot(&mut self, name: Option<Name>, ty: Type) -> usize {
        match name {
            Some(name) if self.name_str(name) != "_" => self.frame.declare(name, ty),
            _ => self.frame.alloc(),
        }
    }

    /// Falling off the end of a body returns the named results, or zero
    /// values of the result types.
    fn implicit_return(&self) -> Stmt {
        if let Some(slots) = &self.frame.named_results {
            return return_values(slots.iter().map(|&s| load_var(0, s)).collect());
        }
        let zeros: Arc<[Value]> = self.frame.results.iter().map(zero_value).collect();
        stmt(move |env| {
            env.set_results(zeros.to_vec());
            Ok(Step::Stop)
        })
    }
}
