//! Expressions.
//!
//! Constant operands fold at compile time. Everything else compiles to an
//! [`ExprFun`] specialized by the operand's category, so typed arithmetic
//! runs on unboxed scalars and only interface values go through the
//! generic [`Value`] operators.

use std::sync::Arc;

use gale_ir::{BinaryOp, CompositeElem, ExprId, ExprKind, Name, TypeExprId, UnaryOp};
use gale_types::{Category, Kind, Type, TypeData};

use super::types::signature_of;
use super::{Binding, Compiler, Operand, Resolved};
use crate::constant::{int_range, Constant};
use crate::errors::{
    conversion_failed, index_out_of_range, invalid_operation, mismatched_types, negative_shift,
    not_an_expression, not_assignable, undefined, unsupported, untyped_nil, value_count,
    CompileError,
};
use crate::fun::{fun, ExprFun, Fun};
use crate::operators::{
    compare, compare_values, complex_binary, float_binary, int_binary, narrow_int, narrow_uint,
    shift_int, shift_uint, uint_binary,
};
use crate::stack::ensure_sufficient_stack;
use crate::value::{zero_value, FuncValue, MapValue, SliceValue, StructValue, Value};

/// Load of slot `slot` in the environment `depth` levels out.
pub(crate) fn load_var(depth: usize, slot: usize) -> Fun<Value> {
    if depth == 0 {
        fun(move |env| Ok(env.get(slot)))
    } else {
        fun(move |env| Ok(env.ancestor(depth)?.get(slot)))
    }
}

pub(crate) fn const_fun(value: Value) -> Fun<Value> {
    fun(move |_| Ok(value.clone()))
}

/// First result of a call; `nil` if there is none.
fn first(call: Fun<Vec<Value>>) -> Fun<Value> {
    fun(move |env| Ok(call(env)?.into_iter().next().unwrap_or(Value::Nil)))
}

/// Operand for a call returning values of types `tys`.
pub(crate) fn call_result(call: Fun<Vec<Value>>, mut tys: Vec<Type>) -> Operand {
    if tys.len() == 1 {
        if let Some(ty) = tys.pop() {
            return Operand::Value {
                fun: ExprFun::typed(&ty, first(call)),
                ty,
            };
        }
    }
    Operand::Multi { fun: call, tys }
}

fn untyped(value: Constant) -> Operand {
    Operand::Const { value, ty: None }
}

fn is_nil(op: &Operand) -> bool {
    matches!(op, Operand::Const { value: Constant::Nil, .. })
}

/// Static type of an operand; `None` for untyped constants and calls.
fn static_type(op: &Operand) -> Option<Type> {
    match op {
        Operand::Const { ty, .. } => ty.clone(),
        Operand::Value { ty, .. } => Some(ty.clone()),
        Operand::Multi { .. } => None,
    }
}

/// A typed constant is range checked against its type.
fn typed_const(value: Constant, ty: Option<Type>) -> Result<Operand, CompileError> {
    match ty {
        Some(ty) => Ok(Operand::Const {
            value: value.represent(&ty)?,
            ty: Some(ty),
        }),
        None => Ok(untyped(value)),
    }
}

const fn is_int_op(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::Add
            | BinaryOp::Sub
            | BinaryOp::Mul
            | BinaryOp::Div
            | BinaryOp::Rem
            | BinaryOp::And
            | BinaryOp::Or
            | BinaryOp::Xor
            | BinaryOp::AndNot
    )
}

const fn is_float_op(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
    )
}

/// Arithmetic on two operands converted to the same type of kind `kind`.
fn arith_fun(op: BinaryOp, kind: Kind, x: ExprFun, y: ExprFun) -> Option<ExprFun> {
    Some(match (x, y) {
        (ExprFun::Int(a), ExprFun::Int(b)) if is_int_op(op) => {
            ExprFun::Int(fun(move |env| int_binary(op, kind, a(env)?, b(env)?)))
        }
        (ExprFun::Uint(a), ExprFun::Uint(b)) if is_int_op(op) => {
            ExprFun::Uint(fun(move |env| uint_binary(op, kind, a(env)?, b(env)?)))
        }
        (ExprFun::Float(a), ExprFun::Float(b)) if is_float_op(op) => {
            ExprFun::Float(fun(move |env| float_binary(op, kind, a(env)?, b(env)?)))
        }
        (ExprFun::Complex(a), ExprFun::Complex(b)) if is_float_op(op) => {
            ExprFun::Complex(fun(move |env| complex_binary(op, kind, a(env)?, b(env)?)))
        }
        (ExprFun::Str(a), ExprFun::Str(b)) if op == BinaryOp::Add => ExprFun::Str(fun(move |env| {
            let x = a(env)?;
            let y = b(env)?;
            Ok(Arc::from(format!("{x}{y}")))
        })),
        _ => return None,
    })
}

/// Comparison of two operands converted to type `ty`.
fn compare_fun(op: BinaryOp, x: ExprFun, y: ExprFun, ty: &Type) -> Result<Fun<bool>, CompileError> {
    let ordered = !matches!(op, BinaryOp::Eq | BinaryOp::NotEq);
    Ok(match (x, y) {
        (ExprFun::Int(a), ExprFun::Int(b)) => fun(move |env| Ok(compare(op, &a(env)?, &b(env)?))),
        (ExprFun::Uint(a), ExprFun::Uint(b)) => fun(move |env| Ok(compare(op, &a(env)?, &b(env)?))),
        (ExprFun::Float(a), ExprFun::Float(b)) => {
            fun(move |env| Ok(compare(op, &a(env)?, &b(env)?)))
        }
        (ExprFun::Str(a), ExprFun::Str(b)) => fun(move |env| Ok(compare(op, &a(env)?, &b(env)?))),
        (ExprFun::Bool(a), ExprFun::Bool(b)) if !ordered => {
            fun(move |env| Ok(compare(op, &a(env)?, &b(env)?)))
        }
        (ExprFun::Complex(a), ExprFun::Complex(b)) if !ordered => {
            fun(move |env| Ok(compare(op, &a(env)?, &b(env)?)))
        }
        (a, b) if !ordered => {
            let (a, b) = (a.any(), b.any());
            fun(move |env| {
                let x = a(env)?;
                let y = b(env)?;
                compare_values(op, &x, &y)
            })
        }
        _ => return Err(invalid_operation(op.as_symbol(), ty)),
    })
}

/// Method value: `method` with `recv` bound as its first argument.
pub(crate) fn bind_receiver(name: &Arc<str>, method: Value, recv: Value) -> Value {
    match method {
        Value::Func(f) => Value::Func(FuncValue::new(name, move |args| {
            let mut full = Vec::with_capacity(args.len() + 1);
            full.push(recv.clone());
            full.extend_from_slice(args);
            f.call(&full)
        })),
        other => other,
    }
}

/// Struct type reached through at most one pointer.
pub(crate) fn struct_base(ty: &Type) -> Type {
    match ty.data() {
        TypeData::Pointer(elem) => elem.clone(),
        _ => ty.clone(),
    }
}

impl Compiler<'_> {
    pub(crate) fn expr(&mut self, id: ExprId) -> Result<Operand, CompileError> {
        let arena = self.arena.clone();
        let node = arena.expr(id);
        ensure_sufficient_stack(|| self.expr_kind(&node.kind)).map_err(|e| e.with_span(node.span))
    }

    fn expr_kind(&mut self, kind: &ExprKind) -> Result<Operand, CompileError> {
        match kind {
            ExprKind::Ident(name) => self.ident(*name),
            ExprKind::Nil => Ok(untyped(Constant::Nil)),
            ExprKind::Bool(b) => Ok(untyped(Constant::Bool(*b))),
            ExprKind::Int(i) => Ok(untyped(Constant::Int(*i))),
            ExprKind::Float(bits) => Ok(untyped(Constant::Float(f64::from_bits(*bits)))),
            ExprKind::Imag(bits) => Ok(untyped(Constant::Complex(0.0, f64::from_bits(*bits)))),
            ExprKind::Str(name) => Ok(untyped(Constant::Str(Arc::from(self.name_str(*name))))),
            ExprKind::Unary { op, operand } => {
                let x = self.expr(*operand)?;
                self.unary(*op, x)
            }
            ExprKind::Binary { op, left, right } => self.binary(*op, *left, *right),
            ExprKind::Call { func, args } => self.call(*func, args),
            ExprKind::Index { container, key } => self.index(*container, *key),
            ExprKind::Selector { base, field } => self.selector(*base, *field),
            ExprKind::Paren(inner) => self.expr(*inner),
            ExprKind::Composite { ty, elems } => self.composite(*ty, elems),
            ExprKind::FuncLit { sig, body } => self.func_lit(sig, body),
            ExprKind::Type(_) => Err(not_an_expression("type")),
        }
    }

    fn ident(&mut self, name: Name) -> Result<Operand, CompileError> {
        Ok(match self.resolve_or_err(name)? {
            Resolved::Var { depth, slot, ty } | Resolved::Func { depth, slot, ty } => {
                Operand::Value {
                    fun: ExprFun::typed(&ty, load_var(depth, slot)),
                    ty,
                }
            }
            Resolved::Const { value, ty } => Operand::Const { value, ty },
            Resolved::Host(func) => Self::host_operand(func.value(), func.ty().clone()),
            Resolved::Type(_) | Resolved::Package(_) | Resolved::Builtin(_) => {
                return Err(not_an_expression(self.name_str(name)))
            }
        })
    }

    // ── Operand conversion ──────────────────────────────────────────

    /// `op` as a value of type `target`: untyped constants are converted,
    /// typed operands must be assignable.
    pub(crate) fn value_for(&self, op: Operand, target: &Type) -> Result<ExprFun, CompileError> {
        match op {
            Operand::Const { value, ty } => {
                if let Some(ty) = &ty {
                    if !ty.assignable_to(target) {
                        return Err(not_assignable(ty, target));
                    }
                }
                Ok(ExprFun::constant(target, value.to_value(target)?))
            }
            Operand::Value { fun, ty } => {
                if !ty.assignable_to(target) {
                    return Err(not_assignable(&ty, target));
                }
                Ok(if target.is_interface() {
                    ExprFun::Any(fun.any())
                } else {
                    fun
                })
            }
            Operand::Multi { .. } => {
                let single = self.single(op)?;
                self.value_for(single, target)
            }
        }
    }

    /// `op` as a value of its own type; untyped constants take their
    /// default type.
    pub(crate) fn value_of(&self, op: Operand) -> Result<(ExprFun, Type), CompileError> {
        match op {
            Operand::Const { value, ty } => {
                let ty = match ty {
                    Some(ty) => ty,
                    None => value
                        .default_type(&self.universe)
                        .ok_or_else(untyped_nil)?,
                };
                let v = value.to_value(&ty)?;
                Ok((ExprFun::constant(&ty, v), ty))
            }
            Operand::Value { fun, ty } => Ok((fun, ty)),
            Operand::Multi { .. } => self.value_of(self.single(op)?),
        }
    }

    /// Type `op` has once used as a value.
    pub(crate) fn operand_type(&self, op: &Operand) -> Result<Type, CompileError> {
        match op {
            Operand::Const { value, ty } => match ty {
                Some(ty) => Ok(ty.clone()),
                None => value
                    .default_type(&self.universe)
                    .ok_or_else(untyped_nil),
            },
            Operand::Value { ty, .. } => Ok(ty.clone()),
            Operand::Multi { tys, .. } => match tys.as_slice() {
                [ty] => Ok(ty.clone()),
                _ => Err(value_count(1, tys.len())),
            },
        }
    }

    /// A single-valued call as a plain value.
    pub(crate) fn single(&self, op: Operand) -> Result<Operand, CompileError> {
        match op {
            Operand::Multi { fun, tys } => match <[Type; 1]>::try_from(tys) {
                Ok([ty]) => Ok(Operand::Value {
                    fun: ExprFun::typed(&ty, first(fun)),
                    ty,
                }),
                Err(tys) => Err(value_count(1, tys.len())),
            },
            other => Ok(other),
        }
    }

    // ── Operators ───────────────────────────────────────────────────

    fn unary(&self, op: UnaryOp, x: Operand) -> Result<Operand, CompileError> {
        let (f, ty) = match x {
            Operand::Const { value, ty } => {
                let folded = match (op, &value, &ty) {
                    // ^x on an unsigned constant flips the bits of its width.
                    (UnaryOp::BitNot, Constant::Int(i), Some(t)) if t.category() == Category::Uint => {
                        Constant::Int(i ^ int_range(t.kind()).1)
                    }
                    _ => Constant::unary(op, &value)?,
                };
                return typed_const(folded, ty);
            }
            other => self.value_of(other)?,
        };
        let kind = ty.kind();
        let fun = match (op, f) {
            (UnaryOp::Plus, f @ (ExprFun::Int(_) | ExprFun::Uint(_) | ExprFun::Float(_) | ExprFun::Complex(_))) => f,
            (UnaryOp::Neg, ExprFun::Int(f)) => {
                ExprFun::Int(fun(move |env| Ok(narrow_int(kind, f(env)?.wrapping_neg()))))
            }
            (UnaryOp::Neg, ExprFun::Uint(f)) => {
                ExprFun::Uint(fun(move |env| Ok(narrow_uint(kind, f(env)?.wrapping_neg()))))
            }
            (UnaryOp::Neg, ExprFun::Float(f)) => ExprFun::Float(fun(move |env| Ok(-f(env)?))),
            (UnaryOp::Neg, ExprFun::Complex(f)) => ExprFun::Complex(fun(move |env| {
                let (re, im) = f(env)?;
                Ok((-re, -im))
            })),
            (UnaryOp::Not, ExprFun::Bool(f)) => ExprFun::Bool(fun(move |env| Ok(!f(env)?))),
            (UnaryOp::BitNot, ExprFun::Int(f)) => {
                ExprFun::Int(fun(move |env| Ok(narrow_int(kind, !f(env)?))))
            }
            (UnaryOp::BitNot, ExprFun::Uint(f)) => {
                ExprFun::Uint(fun(move |env| Ok(narrow_uint(kind, !f(env)?))))
            }
            _ => return Err(invalid_operation(op.as_symbol(), &ty)),
        };
        Ok(Operand::Value { fun, ty })
    }

    fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> Result<Operand, CompileError> {
        let x = self.expr(left)?;
        let x = self.single(x)?;
        let y = self.expr(right)?;
        let y = self.single(y)?;

        if let (
            Operand::Const { value: a, ty: ta },
            Operand::Const { value: b, ty: tb },
        ) = (&x, &y)
        {
            return fold(op, a, ta, b, tb);
        }
        if op.is_shift() {
            return self.shift(op, x, y);
        }

        let ty = self.common_type(op, &x, &y)?;
        let nil_operand = is_nil(&x) || is_nil(&y);
        let fx = self.value_for(x, &ty)?;
        let fy = self.value_for(y, &ty)?;

        if op.is_comparison() {
            if !ty.is_comparable() && !nil_operand {
                return Err(invalid_operation(op.as_symbol(), &ty));
            }
            return Ok(Operand::Value {
                fun: ExprFun::Bool(compare_fun(op, fx, fy, &ty)?),
                ty: self.basic(Kind::Bool),
            });
        }
        if op.is_logical() {
            let (ExprFun::Bool(a), ExprFun::Bool(b)) = (fx, fy) else {
                return Err(invalid_operation(op.as_symbol(), &ty));
            };
            let fun = if op == BinaryOp::LogAnd {
                fun(move |env| Ok(a(env)? && b(env)?))
            } else {
                fun(move |env| Ok(a(env)? || b(env)?))
            };
            return Ok(Operand::Value {
                fun: ExprFun::Bool(fun),
                ty,
            });
        }
        let fun = arith_fun(op, ty.kind(), fx, fy)
            .ok_or_else(|| invalid_operation(op.as_symbol(), &ty))?;
        Ok(Operand::Value { fun, ty })
    }

    /// Type both operands of a binary operator convert to.
    fn common_type(&self, op: BinaryOp, x: &Operand, y: &Operand) -> Result<Type, CompileError> {
        match (static_type(x), static_type(y)) {
            (Some(a), Some(b)) => {
                if a == b {
                    Ok(a)
                } else if b.is_interface() && a.assignable_to(&b) {
                    Ok(b)
                } else if a.is_interface() && b.assignable_to(&a) {
                    Ok(a)
                } else {
                    Err(mismatched_types(op.as_symbol(), &a, &b))
                }
            }
            (Some(t), None) | (None, Some(t)) => Ok(t),
            (None, None) => Err(untyped_nil()),
        }
    }

    /// `x << y` / `x >> y`: the count is any integer, the result has the
    /// left operand's type.
    fn shift(&self, op: BinaryOp, x: Operand, y: Operand) -> Result<Operand, CompileError> {
        let count: Fun<u64> = match y {
            Operand::Const { value, .. } => {
                let n = value
                    .as_int()
                    .and_then(|n| u64::try_from(n).ok())
                    .ok_or_else(|| invalid_operation(op.as_symbol(), &format!("shift count {value}")))?;
                fun(move |_| Ok(n))
            }
            other => match self.value_of(other)? {
                (ExprFun::Int(f), _) => {
                    fun(move |env| u64::try_from(f(env)?).map_err(|_| negative_shift()))
                }
                (ExprFun::Uint(f), _) => f,
                (_, ty) => return Err(invalid_operation(op.as_symbol(), &ty)),
            },
        };
        let (fx, ty) = self.value_of(x)?;
        let kind = ty.kind();
        let fun = match fx {
            ExprFun::Int(a) => {
                ExprFun::Int(fun(move |env| Ok(shift_int(op, kind, a(env)?, count(env)?))))
            }
            ExprFun::Uint(a) => {
                ExprFun::Uint(fun(move |env| Ok(shift_uint(op, kind, a(env)?, count(env)?))))
            }
            _ => return Err(invalid_operation(op.as_symbol(), &ty)),
        };
        Ok(Operand::Value { fun, ty })
    }

    // ── Indexing and selection ──────────────────────────────────────

    /// Integer index operand; negative constants are rejected here,
    /// negative values at run time.
    pub(crate) fn index_value(&self, key: Operand) -> Result<Fun<i64>, CompileError> {
        match key {
            Operand::Const { value, .. } => {
                let i = value
                    .as_int()
                    .and_then(|i| i64::try_from(i).ok())
                    .filter(|i| *i >= 0)
                    .ok_or_else(|| invalid_operation("[]", &format!("index {value}")))?;
                Ok(fun(move |_| Ok(i)))
            }
            other => match self.value_of(other)? {
                (ExprFun::Int(f), _) => Ok(f),
                (ExprFun::Uint(f), _) => {
                    Ok(fun(move |env| Ok(i64::try_from(f(env)?).unwrap_or(i64::MAX))))
                }
                (_, ty) => Err(invalid_operation("[]", &ty)),
            },
        }
    }

    fn index(&mut self, container: ExprId, key: ExprId) -> Result<Operand, CompileError> {
        let c = self.expr(container)?;
        let (cf, cty) = self.value_of(c)?;
        let k = self.expr(key)?;
        match cty.kind() {
            Kind::Map => {
                let (Some(key_ty), Some(elem)) = (cty.key(), cty.elem()) else {
                    return Err(invalid_operation("[]", &cty));
                };
                let kf = self.value_for(k, &key_ty)?.any();
                let m = cf.any();
                let zero = zero_value(&elem);
                let get = fun(move |env| {
                    let map = m(env)?;
                    let key = kf(env)?;
                    match map {
                        Value::Map(map) => Ok(map.get(&key)?.unwrap_or_else(|| zero.clone())),
                        Value::Nil => Ok(zero.clone()),
                        other => Err(conversion_failed(other.type_name(), "map")),
                    }
                });
                Ok(Operand::Value {
                    fun: ExprFun::typed(&elem, get),
                    ty: elem,
                })
            }
            Kind::Slice => {
                let elem = cty.elem().ok_or_else(|| invalid_operation("[]", &cty))?;
                let index = self.index_value(k)?;
                let s = cf.any();
                let get = fun(move |env| {
                    let slice = s(env)?;
                    let i = index(env)?;
                    match slice {
                        Value::Slice(slice) => slice.get(i),
                        Value::Nil => Err(index_out_of_range(i, 0)),
                        other => Err(conversion_failed(other.type_name(), "slice")),
                    }
                });
                Ok(Operand::Value {
                    fun: ExprFun::typed(&elem, get),
                    ty: elem,
                })
            }
            Kind::String => {
                let ExprFun::Str(s) = cf else {
                    return Err(invalid_operation("[]", &cty));
                };
                let index = self.index_value(k)?;
                let byte = fun(move |env| {
                    let s = s(env)?;
                    let i = index(env)?;
                    usize::try_from(i)
                        .ok()
                        .and_then(|at| s.as_bytes().get(at).copied())
                        .map(u64::from)
                        .ok_or_else(|| index_out_of_range(i, s.len()))
                });
                Ok(Operand::Value {
                    fun: ExprFun::Uint(byte),
                    ty: self.basic(Kind::Uint8),
                })
            }
            _ => Err(invalid_operation("[]", &cty)),
        }
    }

    /// Method `name` declared on `ty` or on the type `ty` points to.
    pub(crate) fn method_binding(&self, ty: &Type, name: Name) -> Option<Binding> {
        let id = struct_base(ty).named()?.id();
        self.methods.get(&(id, name)).cloned()
    }

    fn selector(&mut self, base: ExprId, field: Name) -> Result<Operand, CompileError> {
        if let Some(op) = self.package_member(base, field)? {
            return Ok(op);
        }
        let b = self.expr(base)?;
        let (bf, bty) = self.value_of(b)?;
        self.select(bf, &bty, field)
    }

    /// `pkg.Member` for an imported host package.
    pub(crate) fn package_member(
        &self,
        base: ExprId,
        field: Name,
    ) -> Result<Option<Operand>, CompileError> {
        let ExprKind::Ident(name) = self.arena.expr(base).kind else {
            return Ok(None);
        };
        let Some(Resolved::Package(pkg)) = self.resolve(name) else {
            return Ok(None);
        };
        let member = self.name_str(field);
        let func = pkg
            .get(member)
            .ok_or_else(|| undefined(&format!("{}.{member}", pkg.path())))?;
        Ok(Some(Self::host_operand(func.value(), func.ty().clone())))
    }

    /// Field or method value `field` of an already compiled base.
    pub(crate) fn select(&self, base: ExprFun, ty: &Type, field: Name) -> Result<Operand, CompileError> {
        let name = self.name_str(field);
        if let Some(method) = self.method_binding(ty, field) {
            return self.method_value(base, &method, name);
        }
        if ty.is_interface() && ty.method(name).is_some() {
            return Err(unsupported(format!("method {name} of interface type {ty}")));
        }
        let Some((index, f)) = struct_base(ty).field_by_name(name) else {
            return Err(undefined(&format!("{ty}.{name}")));
        };
        let b = base.any();
        let get = fun(move |env| match b(env)? {
            Value::Struct(s) => Ok(s.field(index)),
            other => Err(conversion_failed(other.type_name(), "struct")),
        });
        Ok(Operand::Value {
            fun: ExprFun::typed(&f.ty, get),
            ty: f.ty,
        })
    }

    fn method_value(&self, recv: ExprFun, method: &Binding, name: &str) -> Result<Operand, CompileError> {
        let sig = signature_of(&method.ty).ok_or_else(|| not_an_expression(name))?;
        let ty = self
            .universe
            .func_of(sig.params.to_vec(), sig.results.to_vec(), sig.variadic)?;
        let recv = recv.any();
        let load = load_var(self.globals_depth(), method.slot);
        let name: Arc<str> = Arc::from(name);
        let bound = fun(move |env| {
            let r = recv(env)?;
            let m = load(env)?;
            Ok(bind_receiver(&name, m, r))
        });
        Ok(Operand::Value {
            fun: ExprFun::Any(bound),
            ty,
        })
    }

    // ── Composite literals ──────────────────────────────────────────

    fn composite(&mut self, ty: TypeExprId, elems: &[CompositeElem]) -> Result<Operand, CompileError> {
        let ty = self.resolve_type(ty)?;
        let build = match ty.kind() {
            Kind::Slice => self.slice_literal(&ty, elems)?,
            Kind::Map => self.map_literal(&ty, elems)?,
            Kind::Struct => self.struct_literal(&ty, elems)?,
            _ => return Err(unsupported(format!("composite literal of type {ty}"))),
        };
        Ok(Operand::Value {
            fun: ExprFun::Any(build),
            ty,
        })
    }

    fn slice_literal(&mut self, ty: &Type, elems: &[CompositeElem]) -> Result<Fun<Value>, CompileError> {
        let elem = ty.elem().ok_or_else(|| unsupported(format!("slice literal of {ty}")))?;
        let mut values = Vec::with_capacity(elems.len());
        for e in elems {
            if e.key.is_some() {
                return Err(unsupported("indexed slice literal"));
            }
            let v = self.expr(e.value)?;
            values.push(self.value_for(v, &elem)?.any());
        }
        Ok(fun(move |env| {
            let mut out = Vec::with_capacity(values.len());
            for v in &values {
                out.push(v(env)?);
            }
            Ok(Value::Slice(SliceValue::from_vec(out)))
        }))
    }

    fn map_literal(&mut self, ty: &Type, elems: &[CompositeElem]) -> Result<Fun<Value>, CompileError> {
        let (Some(key_ty), Some(elem)) = (ty.key(), ty.elem()) else {
            return Err(unsupported(format!("map literal of {ty}")));
        };
        let mut entries = Vec::with_capacity(elems.len());
        for e in elems {
            let Some(key) = e.key else {
                return Err(unsupported("missing key in map literal"));
            };
            let k = self.expr(key)?;
            let k = self.value_for(k, &key_ty)?.any();
            let v = self.expr(e.value)?;
            let v = self.value_for(v, &elem)?.any();
            entries.push((k, v));
        }
        Ok(fun(move |env| {
            let map = MapValue::new();
            for (k, v) in &entries {
                let key = k(env)?;
                let value = v(env)?;
                map.insert(&key, value)?;
            }
            Ok(Value::Map(map))
        }))
    }

    /// Keyed or positional struct literal; omitted fields are zero.
    fn struct_literal(&mut self, ty: &Type, elems: &[CompositeElem]) -> Result<Fun<Value>, CompileError> {
        let n = ty.num_field();
        let mut fields: Vec<Option<Fun<Value>>> = vec![None; n];
        for (pos, e) in elems.iter().enumerate() {
            let index = match e.key {
                Some(key) => {
                    let ExprKind::Ident(name) = self.arena.expr(key).kind else {
                        return Err(unsupported("struct literal key"));
                    };
                    let name = self.name_str(name);
                    ty.field_by_name(name)
                        .map(|(i, _)| i)
                        .ok_or_else(|| undefined(&format!("{ty}.{name}")))?
                }
                None => pos,
            };
            let field = ty.field(index).ok_or_else(|| value_count(n, elems.len()))?;
            let v = self.expr(e.value)?;
            let f = self.value_for(v, &field.ty)?.any();
            if let Some(slot) = fields.get_mut(index) {
                *slot = Some(f);
            }
        }
        let inits: Vec<Fun<Value>> = fields
            .into_iter()
            .enumerate()
            .map(|(i, f)| {
                f.unwrap_or_else(|| const_fun(ty.field(i).map_or(Value::Nil, |f| zero_value(&f.ty))))
            })
            .collect();
        Ok(fun(move |env| {
            let mut out = Vec::with_capacity(inits.len());
            for f in &inits {
                out.push(f(env)?);
            }
            Ok(Value::Struct(StructValue::new(out)))
        }))
    }
}

/// Fold a binary operator on two constants.
fn fold(
    op: BinaryOp,
    a: &Constant,
    ta: &Option<Type>,
    b: &Constant,
    tb: &Option<Type>,
) -> Result<Operand, CompileError> {
    if op.is_shift() {
        return typed_const(Constant::binary(op, a, b)?, ta.clone());
    }
    if let (Some(x), Some(y)) = (ta, tb) {
        if x != y {
            return Err(mismatched_types(op.as_symbol(), x, y));
        }
    }
    let value = Constant::binary(op, a, b)?;
    if op.is_comparison() {
        return Ok(untyped(value));
    }
    typed_const(value, ta.clone().or_else(|| tb.clone()))
}
