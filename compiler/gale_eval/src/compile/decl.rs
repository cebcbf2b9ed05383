//! Top-level declarations.
//!
//! A batch is compiled in two passes. The first declares: forward types,
//! then types, then function and method signatures with their global
//! slots, and imports. The second defines: function bodies, constants and
//! variable initializers. Mutually recursive functions share a batch, so
//! every callee has a slot before any body referencing it is compiled.

use std::sync::Arc;

use gale_dep::{Decl, DeclNode, Kind};
use gale_ir::{ExprId, FuncDecl, Name};
use gale_types::Type;

use super::call::Body;
use super::expr::struct_base;
use super::{Binding, Compiler, Global, Operand};
use crate::errors::{
    invalid_operation, not_assignable, not_constant, undefined, value_count, CompileError,
    EvalError,
};
use crate::env::stmt;
use crate::lower::lower_func;
use crate::place::Place;
use crate::value::{zero_value, FuncValue, Value};

/// Order of the declaring pass.
fn declare_rank(kind: Kind) -> u8 {
    match kind {
        Kind::TypeForward => 0,
        Kind::Type => 1,
        Kind::Import => 2,
        Kind::Func | Kind::Method | Kind::Macro => 3,
        Kind::Const | Kind::Var => 4,
    }
}

impl Compiler<'_> {
    pub(crate) fn batch(&mut self, batch: &[Arc<Decl>]) -> Result<(), CompileError> {
        if let Some(first) = batch.first() {
            tracing::debug!(
                decls = batch.len(),
                first = self.name_str(first.name()),
                kind = first.kind().as_str(),
                "compiling batch"
            );
        }
        let mut ordered: Vec<&Arc<Decl>> = batch.iter().collect();
        ordered.sort_by_key(|d| declare_rank(d.kind()));
        for decl in &ordered {
            self.declare(decl).map_err(|e| e.with_span(decl.span()))?;
        }
        for decl in batch {
            self.define(decl).map_err(|e| e.with_span(decl.span()))?;
        }
        Ok(())
    }

    // ── Declaring pass ──────────────────────────────────────────────

    fn declare(&mut self, decl: &Decl) -> Result<(), CompileError> {
        let name = decl.name();
        let text = self.name_str(name);
        match decl.kind() {
            Kind::TypeForward => {
                let ty = self.universe.named_of(text, None);
                tracing::debug!(name = text, "forward declared type");
                self.names.insert(name, Global::Type(ty));
            }
            Kind::Type => {
                let spec = decl.type_spec().ok_or_else(|| undefined(text))?;
                if spec.alias {
                    let ty = self.resolve_type(spec.ty)?;
                    self.names.insert(name, Global::Type(ty));
                    return Ok(());
                }
                let named = match self.names.get(&name) {
                    Some(Global::Type(ty)) if ty.is_named() => ty.clone(),
                    _ => {
                        let ty = self.universe.named_of(text, None);
                        self.names.insert(name, Global::Type(ty.clone()));
                        ty
                    }
                };
                let underlying = self.resolve_type(spec.ty)?;
                self.universe.set_underlying(&named, &underlying)?;
            }
            Kind::Func => {
                let func = decl.func().ok_or_else(|| undefined(text))?;
                let ty = self.func_type(&func.sig)?;
                let binding = Binding {
                    slot: self.globals.push_slot(Value::Nil),
                    ty,
                };
                self.func_slots.insert(name, binding.clone());
                if self.name_str(func.name) == "init" {
                    self.init_funcs.push(binding.slot);
                } else {
                    self.funcs.insert(Arc::from(text), binding.clone());
                    self.names.insert(name, Global::Func(binding));
                }
            }
            Kind::Method => self.declare_method(decl)?,
            Kind::Import => {
                let spec = decl.import().ok_or_else(|| undefined(text))?;
                let path = self.name_str(spec.path);
                let package = self
                    .hosts
                    .package(path)
                    .ok_or_else(|| undefined(&format!("package {path}")))?;
                self.names.insert(name, Global::Package(Arc::clone(package)));
            }
            Kind::Macro => tracing::warn!(name = text, "macro declaration left unexpanded"),
            Kind::Const | Kind::Var => {}
        }
        Ok(())
    }

    /// Signature, global slot and method set entry of `T.M` or `(*T).M`.
    fn declare_method(&mut self, decl: &Decl) -> Result<(), CompileError> {
        let text = self.name_str(decl.name());
        let func = decl.func().ok_or_else(|| undefined(text))?;
        let recv = func.recv.as_ref().ok_or_else(|| undefined(text))?;
        let recv_ty = self.resolve_type(recv.ty)?;
        let base = struct_base(&recv_ty);
        let id = base
            .named()
            .map(|named| named.id())
            .ok_or_else(|| invalid_operation("method receiver", &recv_ty))?;
        let sig = self.signature(&func.sig)?;
        let ty = self.universe.method_of(
            recv_ty,
            sig.param_types(),
            sig.result_types(),
            sig.variadic,
        )?;
        self.universe
            .add_method(&base, self.name_str(func.name), ty.clone())?;
        let binding = Binding {
            slot: self.globals.push_slot(Value::Nil),
            ty,
        };
        self.methods.insert((id, func.name), binding.clone());
        self.func_slots.insert(decl.name(), binding.clone());
        self.funcs.insert(Arc::from(text), binding);
        Ok(())
    }

    // ── Defining pass ───────────────────────────────────────────────

    fn define(&mut self, decl: &Decl) -> Result<(), CompileError> {
        match decl.kind() {
            Kind::Func | Kind::Method => {
                let func = decl.func().ok_or_else(|| undefined(self.name_str(decl.name())))?;
                self.define_func(decl, func)
            }
            Kind::Const => {
                self.iota = decl.iota();
                let result = self.define_const(decl);
                self.iota = None;
                result
            }
            Kind::Var => self.define_var(decl),
            Kind::TypeForward | Kind::Type | Kind::Import | Kind::Macro => Ok(()),
        }
    }

    fn define_func(&mut self, decl: &Decl, func: &FuncDecl) -> Result<(), CompileError> {
        let name = self.name_str(decl.name());
        let binding = self
            .func_slots
            .get(&decl.name())
            .cloned()
            .ok_or_else(|| undefined(name))?;

        let Some(body) = &func.body else {
            // Declared without a body: provided by the host.
            let host = self
                .hosts
                .func(name)
                .ok_or_else(|| undefined(&format!("body of func {name}")))?;
            if !host.ty().assignable_to(&binding.ty) {
                return Err(not_assignable(host.ty(), &binding.ty));
            }
            self.globals.set(binding.slot, host.value());
            return Ok(());
        };

        let sig = self.signature(&func.sig)?;
        let recv = match &func.recv {
            Some(param) => Some((param.name, self.resolve_type(param.ty)?)),
            None => None,
        };
        let ((), frame) = self.with_frame(false, |c| c.func_body(recv, &sig, body))?;
        let body = Body::new(frame, self.options.call_depth_limit());
        tracing::debug!(name, slot = binding.slot, "compiled function");
        if self.options.traces_code() {
            tracing::trace!(name, code = ?body.code(), "function code");
        }

        let globals = Arc::downgrade(&self.globals);
        let value = FuncValue::new(name, move |args| {
            let outer = globals
                .upgrade()
                .ok_or_else(|| EvalError::new("package globals released"))?;
            body.invoke(outer, args)
        });
        self.globals.set(binding.slot, Value::Func(value));

        if self.options.lowers_native() && func.recv.is_none() {
            let params = sig.param_types();
            let results = sig.result_types();
            if let Some(code) = lower_func(&self.arena, &self.interner, func, &params, &results)? {
                tracing::debug!(name, tokens = code.len(), "lowered to soft registers");
                self.lowered.push((Arc::from(name), code));
            }
        }
        Ok(())
    }

    fn define_const(&mut self, decl: &Decl) -> Result<(), CompileError> {
        let name = self.name_str(decl.name());
        let declared = decl
            .value_type()
            .map(|t| self.resolve_type(t))
            .transpose()?;
        let expr = decl.value().ok_or_else(|| not_constant(name))?;
        let Operand::Const { value, ty } = self.expr(expr)? else {
            return Err(not_constant(name));
        };
        let (value, ty) = match declared {
            Some(declared) => {
                if let Some(ty) = &ty {
                    if !ty.assignable_to(&declared) {
                        return Err(not_assignable(ty, &declared));
                    }
                }
                (value.represent(&declared)?, Some(declared))
            }
            None => (value, ty),
        };
        tracing::trace!(name, value = %value, "constant");
        self.names.insert(decl.name(), Global::Const { value, ty });
        Ok(())
    }

    fn define_var(&mut self, decl: &Decl) -> Result<(), CompileError> {
        let declared = decl
            .value_type()
            .map(|t| self.resolve_type(t))
            .transpose()?;
        if let DeclNode::Tuple(spec) = decl.node() {
            return self.define_tuple(&spec.names, declared, &spec.values);
        }

        let name = decl.name();
        let op = decl.value().map(|v| self.expr(v)).transpose()?;
        let ty = match (declared, &op) {
            (Some(ty), _) => ty,
            (None, Some(op)) => self.operand_type(op)?,
            (None, None) => return Err(value_count(1, 0)),
        };
        let slot = self.global_var(name, ty.clone());
        if let Some(op) = op {
            let place = Place::var(self.globals_depth(), slot, ty);
            let s = self.store(&place, op)?;
            self.emit(s);
        }
        Ok(())
    }

    /// `var a, b = f()`.
    fn define_tuple(
        &mut self,
        names: &[Name],
        declared: Option<Type>,
        values: &[ExprId],
    ) -> Result<(), CompileError> {
        let [value] = values else {
            return Err(value_count(names.len(), values.len()));
        };
        let Operand::Multi { fun: call, tys } = self.expr(*value)? else {
            return Err(value_count(names.len(), 1));
        };
        if tys.len() != names.len() {
            return Err(value_count(names.len(), tys.len()));
        }
        let mut slots = Vec::with_capacity(names.len());
        for (&name, ty) in names.iter().zip(tys) {
            let want = declared.clone().unwrap_or_else(|| ty.clone());
            if !ty.assignable_to(&want) {
                return Err(not_assignable(&ty, &want));
            }
            slots.push(self.global_var(name, want));
        }
        let depth = self.globals_depth();
        self.emit(stmt(move |env| {
            let values = call(env)?;
            let globals = env.ancestor(depth)?;
            for (&slot, v) in slots.iter().zip(values) {
                globals.set(slot, v);
            }
            Ok(env.advance())
        }));
        Ok(())
    }

    /// Allocate a zeroed global slot for variable `name`.
    fn global_var(&mut self, name: Name, ty: Type) -> usize {
        let slot = self.globals.push_slot(zero_value(&ty));
        let binding = Binding { slot, ty };
        let text = self.name_str(name);
        tracing::trace!(name = text, slot, "global variable");
        self.vars.insert(Arc::from(text), binding.clone());
        self.names.insert(name, Global::Var(binding));
        slot
    }
}
