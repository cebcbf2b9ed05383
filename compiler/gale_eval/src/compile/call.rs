//! Calls, conversions, builtins and function values.

use std::sync::Arc;

use gale_ir::{Block, ExprId, ExprKind, FuncSig};
use gale_types::{Category, Kind, Signature, Type};
use smallvec::SmallVec;

use super::expr::{call_result, const_fun, load_var};
use super::types::signature_of;
use super::{Builtin, Compiler, Frame, Operand, Resolved};
use crate::constant::Constant;
use crate::env::{run, Code, Env};
use crate::errors::{
    arg_count, invalid_operation, nil_func_call, not_a_type, not_assignable, not_callable,
    CompileError, EvalError,
};
use crate::fun::{fun, ExprFun, Fun};
use crate::operators::convert_value;
use crate::stack::{ensure_sufficient_stack, CallGuard};
use crate::value::{zero_value, FuncValue, MapValue, SliceValue, Value};

/// Argument list of one call.
pub(crate) type Args = SmallVec<[Value; 4]>;

/// Compiled body of a function or closure.
#[derive(Clone)]
pub(crate) struct Body {
    code: Arc<Code>,
    nslots: usize,
    limit: Option<usize>,
}

impl Body {
    pub(crate) fn new(frame: Frame, limit: Option<usize>) -> Self {
        Body {
            code: Arc::new(Code::new(frame.code)),
            nslots: frame.nslots,
            limit,
        }
    }

    /// Run the body in a fresh environment nested in `outer`.
    pub(crate) fn invoke(&self, outer: Arc<Env>, args: &[Value]) -> Result<Vec<Value>, EvalError> {
        let _guard = CallGuard::enter(self.limit)?;
        ensure_sufficient_stack(|| {
            let env = Env::new(Arc::clone(&self.code), self.nslots, Some(outer), args);
            run(&env)?;
            Ok(env.take_results())
        })
    }

    pub(crate) fn code(&self) -> &Arc<Code> {
        &self.code
    }
}

/// Call a function value.
pub(crate) fn call_func(func: &Value, args: &[Value]) -> Result<Vec<Value>, EvalError> {
    match func {
        Value::Func(f) => f.call(args),
        _ => Err(nil_func_call()),
    }
}

fn is_scalar(category: Category) -> bool {
    !matches!(category, Category::Func | Category::Unknown)
}

fn rune_string(i: i128) -> Arc<str> {
    let c = u32::try_from(i)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER);
    Arc::from(c.to_string())
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

impl Compiler<'_> {
    pub(crate) fn call(&mut self, func: ExprId, args: &[ExprId]) -> Result<Operand, CompileError> {
        if let Some(ty) = self.type_of_expr(func)? {
            return self.conversion(ty, args);
        }
        let arena = self.arena.clone();
        match &arena.expr(func).kind {
            ExprKind::Ident(name) => match self.resolve(*name) {
                Some(Resolved::Builtin(b)) => return self.builtin(b, args),
                Some(Resolved::Func { depth, slot, ty }) => {
                    let sig = signature_of(&ty).ok_or_else(|| not_callable(&ty))?;
                    let name = self.name_str(*name);
                    return self.direct_call(name, load_var(depth, slot), &sig, None, args);
                }
                _ => {}
            },
            ExprKind::Selector { base, field } => {
                if self.package_member(*base, *field)?.is_none() {
                    let b = self.expr(*base)?;
                    let (bf, bty) = self.value_of(b)?;
                    if let Some(method) = self.method_binding(&bty, *field) {
                        let name = self.name_str(*field);
                        let sig = signature_of(&method.ty).ok_or_else(|| not_callable(&method.ty))?;
                        let load = load_var(self.globals_depth(), method.slot);
                        return self.direct_call(name, load, &sig, Some(bf.any()), args);
                    }
                    let callee = self.select(bf, &bty, *field)?;
                    return self.call_operand(callee, args);
                }
            }
            _ => {}
        }
        let callee = self.expr(func)?;
        self.call_operand(callee, args)
    }

    /// Call of an arbitrary function-typed operand.
    fn call_operand(&mut self, callee: Operand, args: &[ExprId]) -> Result<Operand, CompileError> {
        let (f, ty) = self.value_of(callee)?;
        let sig = signature_of(&ty).ok_or_else(|| not_callable(&ty))?;
        self.direct_call("function value", f.any(), &sig, None, args)
    }

    /// Call `func` with `recv` (for methods) followed by `args`.
    fn direct_call(
        &mut self,
        name: &str,
        func: Fun<Value>,
        sig: &Signature,
        recv: Option<Fun<Value>>,
        args: &[ExprId],
    ) -> Result<Operand, CompileError> {
        let args = self.args(name, sig, args)?;
        let call: Fun<Vec<Value>> = match recv {
            None => fun(move |env| {
                let f = func(env)?;
                let a = args(env)?;
                call_func(&f, &a)
            }),
            Some(recv) => fun(move |env| {
                let r = recv(env)?;
                let f = func(env)?;
                let mut a = args(env)?;
                a.insert(0, r);
                call_func(&f, &a)
            }),
        };
        Ok(call_result(call, sig.results.to_vec()))
    }

    /// Arguments converted to the parameter types. Trailing arguments of a
    /// variadic call are packed into one slice, `nil` when there are none.
    pub(crate) fn args(
        &mut self,
        name: &str,
        sig: &Signature,
        exprs: &[ExprId],
    ) -> Result<Fun<Args>, CompileError> {
        let params = &sig.params;
        let nfixed = if sig.variadic { params.len().saturating_sub(1) } else { params.len() };
        let elem = if sig.variadic {
            params.last().and_then(Type::elem)
        } else {
            None
        };
        let param_at = |i: usize| -> Option<&Type> {
            if i < nfixed {
                params.get(i)
            } else {
                elem.as_ref()
            }
        };
        let count_ok = |n: usize| if sig.variadic { n >= nfixed } else { n == nfixed };

        let mut ops = Vec::with_capacity(exprs.len());
        for &e in exprs {
            ops.push(self.expr(e)?);
        }

        // f(g()) where g returns several values.
        if let [Operand::Multi { tys, .. }] = ops.as_slice() {
            if tys.len() != 1 {
                if !count_ok(tys.len()) {
                    return Err(arg_count(name, params.len(), tys.len()));
                }
                for (i, ty) in tys.iter().enumerate() {
                    let want = param_at(i).ok_or_else(|| arg_count(name, params.len(), tys.len()))?;
                    if !ty.assignable_to(want) {
                        return Err(not_assignable(ty, want));
                    }
                }
                let Some(Operand::Multi { fun: multi, .. }) = ops.pop() else {
                    return Err(arg_count(name, params.len(), 0));
                };
                let variadic = sig.variadic;
                return Ok(fun(move |env| {
                    let mut values = multi(env)?;
                    if variadic {
                        let rest = values.split_off(nfixed);
                        values.push(pack(rest));
                    }
                    Ok(values.into_iter().collect())
                }));
            }
        }

        if !count_ok(ops.len()) {
            return Err(arg_count(name, params.len(), ops.len()));
        }
        let mut funs = Vec::with_capacity(ops.len());
        for (i, op) in ops.into_iter().enumerate() {
            let want = param_at(i).ok_or_else(|| arg_count(name, params.len(), exprs.len()))?;
            funs.push(self.value_for(op, want)?.any());
        }
        if !sig.variadic {
            return Ok(fun(move |env| {
                let mut values = Args::with_capacity(funs.len());
                for f in &funs {
                    values.push(f(env)?);
                }
                Ok(values)
            }));
        }
        Ok(fun(move |env| {
            let mut values = Args::with_capacity(nfixed + 1);
            for f in &funs[..nfixed] {
                values.push(f(env)?);
            }
            let mut rest = Vec::with_capacity(funs.len() - nfixed);
            for f in &funs[nfixed..] {
                rest.push(f(env)?);
            }
            values.push(pack(rest));
            Ok(values)
        }))
    }

    // ── Conversions ─────────────────────────────────────────────────

    /// `T(x)`. Scalar constants fold; everything else converts at run time.
    fn conversion(&mut self, ty: Type, args: &[ExprId]) -> Result<Operand, CompileError> {
        let [arg] = args else {
            return Err(arg_count(&ty.to_string(), 1, args.len()));
        };
        let op = self.expr(*arg)?;
        let op = self.single(op)?;
        match op {
            Operand::Const { value, .. } if !value.is_nil() && is_scalar(ty.category()) => {
                let folded = match (&value, ty.category()) {
                    (Constant::Int(i), Category::String) => Constant::Str(rune_string(*i)),
                    _ => value.represent(&ty)?,
                };
                Ok(Operand::Const {
                    value: folded,
                    ty: Some(ty),
                })
            }
            op @ Operand::Const { .. } => {
                let fun = self.value_for(op, &ty)?;
                Ok(Operand::Value { fun, ty })
            }
            op => {
                let (f, _) = self.value_of(op)?;
                let f = f.any();
                let to = ty.clone();
                let convert = fun(move |env| convert_value(&f(env)?, &to));
                Ok(Operand::Value {
                    fun: ExprFun::typed(&ty, convert),
                    ty,
                })
            }
        }
    }

    // ── Builtins ────────────────────────────────────────────────────

    fn builtin(&mut self, builtin: Builtin, args: &[ExprId]) -> Result<Operand, CompileError> {
        match builtin {
            Builtin::Len | Builtin::Cap => self.len_cap(builtin, args),
            Builtin::Make => self.make(args),
            Builtin::Append => self.append(args),
            Builtin::Delete => self.delete(args),
        }
    }

    fn len_cap(&mut self, builtin: Builtin, args: &[ExprId]) -> Result<Operand, CompileError> {
        let [arg] = args else {
            return Err(arg_count(builtin.name(), 1, args.len()));
        };
        let int = self.basic(Kind::Int);
        let op = self.expr(*arg)?;
        if let (Builtin::Len, Operand::Const { value: Constant::Str(s), .. }) = (builtin, &op) {
            return Ok(Operand::Const {
                value: Constant::Int(i128::from(to_i64(s.len()))),
                ty: Some(int),
            });
        }
        let (f, ty) = self.value_of(op)?;
        let f = f.any();
        let len = match (builtin, ty.kind()) {
            (Builtin::Len, Kind::String | Kind::Slice | Kind::Map) => {
                fun(move |env| Ok(f(env)?.len().map_or(0, to_i64)))
            }
            (Builtin::Cap, Kind::Slice) => fun(move |env| match f(env)? {
                Value::Slice(s) => Ok(to_i64(s.cap())),
                _ => Ok(0),
            }),
            _ => return Err(invalid_operation(builtin.name(), &ty)),
        };
        Ok(Operand::Value {
            fun: ExprFun::Int(len),
            ty: int,
        })
    }

    /// `make([]T, len[, cap])` or `make(map[K]V[, size])`.
    fn make(&mut self, args: &[ExprId]) -> Result<Operand, CompileError> {
        let Some((&first, rest)) = args.split_first() else {
            return Err(arg_count("make", 1, 0));
        };
        let ty = self.type_of_expr(first)?.ok_or_else(|| not_a_type("make argument"))?;
        let mut sizes = Vec::with_capacity(rest.len());
        for &e in rest {
            let op = self.expr(e)?;
            sizes.push(self.index_value(op)?);
        }
        let build = match ty.kind() {
            Kind::Slice => {
                let zero = ty.elem().map_or(Value::Nil, |e| zero_value(&e));
                let mut sizes = sizes.into_iter();
                let (Some(len), cap, None) = (sizes.next(), sizes.next(), sizes.next()) else {
                    return Err(arg_count("make", 2, args.len()));
                };
                fun(move |env| {
                    let n = len(env)?;
                    let c = match &cap {
                        Some(cap) => cap(env)?,
                        None => n,
                    };
                    let (Ok(n), Ok(c)) = (usize::try_from(n), usize::try_from(c)) else {
                        return Err(EvalError::new("makeslice: len out of range"));
                    };
                    if n > c {
                        return Err(EvalError::new("makeslice: cap out of range"));
                    }
                    Ok(Value::Slice(SliceValue::make(n, c, &zero)))
                })
            }
            Kind::Map => {
                if sizes.len() > 1 {
                    return Err(arg_count("make", 2, args.len()));
                }
                fun(|_| Ok(Value::Map(MapValue::new())))
            }
            _ => return Err(invalid_operation("make", &ty)),
        };
        Ok(Operand::Value {
            fun: ExprFun::Any(build),
            ty,
        })
    }

    /// `append(s, elems...)`; a `nil` slice grows from empty.
    fn append(&mut self, args: &[ExprId]) -> Result<Operand, CompileError> {
        let Some((&first, rest)) = args.split_first() else {
            return Err(arg_count("append", 1, 0));
        };
        let s = self.expr(first)?;
        let (sf, ty) = self.value_of(s)?;
        let elem = match ty.kind() {
            Kind::Slice => ty.elem().ok_or_else(|| invalid_operation("append", &ty))?,
            _ => return Err(invalid_operation("append", &ty)),
        };
        let mut elems = Vec::with_capacity(rest.len());
        for &e in rest {
            let op = self.expr(e)?;
            elems.push(self.value_for(op, &elem)?.any());
        }
        let sf = sf.any();
        let build = fun(move |env| {
            let base = sf(env)?;
            let mut values = Vec::with_capacity(elems.len());
            for e in &elems {
                values.push(e(env)?);
            }
            Ok(Value::Slice(match base {
                Value::Slice(s) => s.append(&values),
                _ => SliceValue::from_vec(values),
            }))
        });
        Ok(Operand::Value {
            fun: ExprFun::Any(build),
            ty,
        })
    }

    /// `delete(m, k)`; deleting from a `nil` map does nothing.
    fn delete(&mut self, args: &[ExprId]) -> Result<Operand, CompileError> {
        let [map, key] = args else {
            return Err(arg_count("delete", 2, args.len()));
        };
        let m = self.expr(*map)?;
        let (mf, ty) = self.value_of(m)?;
        let key_ty = match ty.kind() {
            Kind::Map => ty.key().ok_or_else(|| invalid_operation("delete", &ty))?,
            _ => return Err(invalid_operation("delete", &ty)),
        };
        let k = self.expr(*key)?;
        let kf = self.value_for(k, &key_ty)?.any();
        let mf = mf.any();
        let call = fun(move |env| {
            let m = mf(env)?;
            let k = kf(env)?;
            if let Value::Map(m) = m {
                m.remove(&k)?;
            }
            Ok(Vec::new())
        });
        Ok(Operand::Multi {
            fun: call,
            tys: Vec::new(),
        })
    }

    // ── Function literals ───────────────────────────────────────────

    /// Closure over the environment it is evaluated in.
    pub(crate) fn func_lit(&mut self, sig: &FuncSig, body: &Block) -> Result<Operand, CompileError> {
        let types = self.signature(sig)?;
        let ty = self
            .universe
            .func_of(types.param_types(), types.result_types(), types.variadic)?;
        let ((), frame) = self.with_frame(true, |c| c.func_body(None, &types, body))?;
        let body = Body::new(frame, self.options.call_depth_limit());
        if self.options.traces_code() {
            tracing::trace!(code = ?body.code(), "func literal");
        }
        let make = fun(move |env| {
            let env = Arc::clone(env);
            let body = body.clone();
            Ok(Value::Func(FuncValue::new("func literal", move |args| {
                body.invoke(Arc::clone(&env), args)
            })))
        });
        Ok(Operand::Value {
            fun: ExprFun::Any(make),
            ty,
        })
    }

    /// A host function value as an operand.
    pub(crate) fn host_operand(value: Value, ty: Type) -> Operand {
        Operand::Value {
            fun: ExprFun::Any(const_fun(value)),
            ty,
        }
    }
}

/// Trailing variadic arguments as one slice value.
fn pack(rest: Vec<Value>) -> Value {
    if rest.is_empty() {
        Value::Nil
    } else {
        Value::Slice(SliceValue::from_vec(rest))
    }
}
