//! Assignable locations and the statements that store into them.
//!
//! A [`Place`] is compiled once from the left-hand side of an assignment:
//! a closure yielding the location's container (a variable slot, a map or a
//! slice), an optional key closure for map entries and slice elements, and
//! the location's static type. Stores are specialized by the type's
//! [`Category`]: each category has its own extraction and narrowing path.
//!
//! Indexed stores evaluate the container, then the key, then the value,
//! strictly in that order, before storing. Field stores rebuild the struct
//! and store it back through the enclosing location.

use std::sync::Arc;

use gale_ir::BinaryOp;
use gale_types::{Category, Kind, Type};

use crate::constant::Constant;
use crate::env::{stmt, Env, Stmt};
use crate::errors::{
    conversion_failed, index_out_of_range, invalid_operation, nil_map_store, not_assignable,
    unsupported_category, CompileError, EvalError,
};
use crate::fun::{fun, ExprFun, Fun};
use crate::operators::{binary_values, narrow_float, narrow_int, narrow_uint};
use crate::value::{zero_value, MapValue, SliceValue, StructValue, Value};

/// Container of a location, resolved at run time.
pub enum Target {
    Slot { env: Arc<Env>, slot: usize },
    Map(MapValue),
    /// Reads give the zero value; stores fail.
    NilMap,
    Slice(SliceValue),
    /// Field `index` of the struct held at `base[key]`. Structs are values,
    /// so a store rebuilds the struct and writes it back.
    Field {
        base: Box<Target>,
        key: Option<Value>,
        index: usize,
        zero: Value,
    },
}

fn slice_index(key: Option<&Value>) -> i64 {
    match key {
        Some(Value::Int(i)) => *i,
        Some(Value::Uint(u)) => i64::try_from(*u).unwrap_or(i64::MAX),
        _ => -1,
    }
}

fn load_struct(base: &Target, key: Option<&Value>, zero: &Value) -> Result<StructValue, EvalError> {
    match base.load(key, zero)? {
        Value::Struct(s) => Ok(s),
        other => Err(conversion_failed(other.type_name(), "struct")),
    }
}

impl Target {
    /// Current value; missing map entries read as `zero`.
    pub fn load(&self, key: Option<&Value>, zero: &Value) -> Result<Value, EvalError> {
        match (self, key) {
            (Target::Slot { env, slot }, _) => Ok(env.get(*slot)),
            (Target::Map(map), Some(key)) => Ok(map.get(key)?.unwrap_or_else(|| zero.clone())),
            (Target::Map(_) | Target::NilMap, _) => Ok(zero.clone()),
            (Target::Slice(slice), key) => slice.get(slice_index(key)),
            (
                Target::Field {
                    base,
                    key: base_key,
                    index,
                    zero: base_zero,
                },
                _,
            ) => Ok(load_struct(base, base_key.as_ref(), base_zero)?.field(*index)),
        }
    }

    pub fn store(&self, key: Option<&Value>, value: Value) -> Result<(), EvalError> {
        match (self, key) {
            (Target::Slot { env, slot }, _) => {
                env.set(*slot, value);
                Ok(())
            }
            (Target::Map(map), Some(key)) => map.insert(key, value),
            (Target::Map(_), None) => Err(EvalError::new("map store without a key")),
            (Target::NilMap, _) => Err(nil_map_store()),
            (Target::Slice(slice), key) => slice.set(slice_index(key), value),
            (
                Target::Field {
                    base,
                    key: base_key,
                    index,
                    zero,
                },
                _,
            ) => {
                let mut fields = load_struct(base, base_key.as_ref(), zero)?.fields().to_vec();
                let len = fields.len();
                let field = fields.get_mut(*index).ok_or_else(|| {
                    index_out_of_range(i64::try_from(*index).unwrap_or(i64::MAX), len)
                })?;
                *field = value;
                base.store(base_key.as_ref(), Value::Struct(StructValue::new(fields)))
            }
        }
    }
}

/// Compiled assignable location.
#[derive(Clone)]
pub struct Place {
    pub fun: Fun<Target>,
    /// Map key or slice index; `None` for variables.
    pub key: Option<Fun<Value>>,
    pub ty: Type,
}

impl Place {
    /// Variable in slot `slot` of the environment `depth` levels out.
    pub fn var(depth: usize, slot: usize, ty: Type) -> Place {
        let fun = if depth == 0 {
            fun(move |env: &Arc<Env>| {
                Ok(Target::Slot {
                    env: Arc::clone(env),
                    slot,
                })
            })
        } else {
            fun(move |env: &Arc<Env>| {
                Ok(Target::Slot {
                    env: env.ancestor(depth)?,
                    slot,
                })
            })
        };
        Place { fun, key: None, ty }
    }

    /// `m[key]` where `map` evaluates to a map value (or `nil`).
    pub fn map_entry(map: Fun<Value>, key: Fun<Value>, elem: Type) -> Place {
        Place {
            fun: fun(move |env| match map(env)? {
                Value::Map(m) => Ok(Target::Map(m)),
                Value::Nil => Ok(Target::NilMap),
                other => Err(conversion_failed(other.type_name(), "map")),
            }),
            key: Some(key),
            ty: elem,
        }
    }

    /// `s[index]` where `slice` evaluates to a slice value (or `nil`).
    pub fn slice_elem(slice: Fun<Value>, index: Fun<Value>, elem: Type) -> Place {
        Place {
            fun: fun(move |env| match slice(env)? {
                Value::Slice(s) => Ok(Target::Slice(s)),
                Value::Nil => Ok(Target::Slice(SliceValue::from_vec(Vec::new()))),
                other => Err(conversion_failed(other.type_name(), "slice")),
            }),
            key: Some(index),
            ty: elem,
        }
    }

    /// Field `index` of the struct stored at `base`.
    pub fn field(base: &Place, index: usize, ty: Type) -> Place {
        let target = Arc::clone(&base.fun);
        let key = base.key.clone();
        let zero = zero_value(&base.ty);
        Place {
            fun: fun(move |env| {
                let base = target(env)?;
                let key = key.as_ref().map(|k| k(env)).transpose()?;
                Ok(Target::Field {
                    base: Box::new(base),
                    key,
                    index,
                    zero: zero.clone(),
                })
            }),
            key: None,
            ty,
        }
    }

    /// The location read as a value.
    pub fn load(&self) -> Fun<Value> {
        let target = Arc::clone(&self.fun);
        let key = self.key.clone();
        let zero = zero_value(&self.ty);
        fun(move |env| {
            let t = target(env)?;
            let k = key.as_ref().map(|k| k(env)).transpose()?;
            t.load(k.as_ref(), &zero)
        })
    }
}

/// Kinds with no runtime storage path.
fn unsupported_kind(kind: Kind) -> bool {
    matches!(kind, Kind::Invalid | Kind::Array | Kind::Pointer)
}

/// Statement evaluating container, key and value in order, then storing.
fn store(place: &Place, value: Fun<Value>) -> Stmt {
    let target = Arc::clone(&place.fun);
    match place.key.clone() {
        None => stmt(move |env| {
            let t = target(env)?;
            let v = value(env)?;
            t.store(None, v)?;
            Ok(env.advance())
        }),
        Some(key) => stmt(move |env| {
            let t = target(env)?;
            let k = key(env)?;
            let v = value(env)?;
            t.store(Some(&k), v)?;
            Ok(env.advance())
        }),
    }
}

/// `place = c` for a compile-time constant.
///
/// The constant is converted to the location's type once, here; a `nil`
/// constant stored into a composite or interface location stores the
/// type's zero value.
pub fn set_place_const(place: &Place, c: &Constant) -> Result<Stmt, CompileError> {
    let ty = &place.ty;
    let value = match ty.category() {
        Category::Bool => Value::Bool(
            c.represent(ty)?
                .as_bool()
                .ok_or_else(|| not_assignable(c, ty))?,
        ),
        Category::Int | Category::Uint | Category::Float | Category::Complex | Category::String => {
            c.to_value(ty)?
        }
        category @ (Category::Func | Category::Unknown) => {
            if unsupported_kind(ty.kind()) {
                return Err(unsupported_category("set_place_const", category, ty));
            }
            if c.is_nil() {
                zero_value(ty)
            } else {
                c.to_value(ty)?
            }
        }
    };
    tracing::trace!(ty = %ty, value = %value, "store constant");
    Ok(store(place, fun(move |_| Ok(value.clone()))))
}

/// `place = expr` for a compiled expression of a type assignable to the
/// location.
///
/// Composite, interface and function locations check the value at run time:
/// `nil` becomes the zero value and a value of the wrong kind is a
/// conversion error.
pub fn set_place_expr(place: &Place, expr: ExprFun) -> Result<Stmt, CompileError> {
    let ty = place.ty.clone();
    let kind = ty.kind();
    let value: Fun<Value> = match (ty.category(), expr) {
        (Category::Bool, ExprFun::Bool(f)) => fun(move |env| f(env).map(Value::Bool)),
        (Category::Int, ExprFun::Int(f)) => {
            fun(move |env| Ok(Value::Int(narrow_int(kind, f(env)?))))
        }
        (Category::Uint, ExprFun::Uint(f)) => {
            fun(move |env| Ok(Value::Uint(narrow_uint(kind, f(env)?))))
        }
        (Category::Float, ExprFun::Float(f)) => {
            fun(move |env| Ok(Value::Float(narrow_float(kind, f(env)?))))
        }
        (Category::Complex, ExprFun::Complex(f)) => fun(move |env| {
            let (re, im) = f(env)?;
            Ok(Value::Complex(narrow_float(kind, re), narrow_float(kind, im)))
        }),
        (Category::String, ExprFun::Str(f)) => fun(move |env| f(env).map(Value::Str)),
        (category @ (Category::Func | Category::Unknown), expr) => {
            if unsupported_kind(kind) {
                return Err(unsupported_category("set_place_expr", category, &ty));
            }
            let zero = zero_value(&ty);
            let f = expr.any();
            fun(move |env| {
                let v = f(env)?;
                if v.is_nil() {
                    Ok(zero.clone())
                } else if v.fits(&ty) {
                    Ok(v)
                } else {
                    Err(conversion_failed(v.type_name(), &ty))
                }
            })
        }
        (_, expr) => return Err(not_assignable(&expr.category(), &ty)),
    };
    Ok(store(place, value))
}

/// `place op= rhs`, also used for `++` and `--`.
///
/// The container and key are evaluated once; the right-hand side is
/// evaluated before the current value is loaded.
pub fn set_place_op(place: &Place, op: BinaryOp, rhs: ExprFun) -> Result<Stmt, CompileError> {
    let ty = place.ty.clone();
    let kind = ty.kind();
    let category = ty.category();
    let defined = match category {
        Category::Int | Category::Uint => true,
        Category::Float | Category::Complex => matches!(
            op,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
        ),
        Category::String => op == BinaryOp::Add,
        Category::Bool | Category::Func | Category::Unknown => false,
    };
    if !defined {
        return Err(invalid_operation(op.as_symbol(), &ty));
    }
    let rhs_category = rhs.category();
    if op.is_shift() {
        if !matches!(rhs_category, Category::Int | Category::Uint) {
            return Err(invalid_operation(op.as_symbol(), &rhs_category));
        }
    } else if rhs_category != category {
        return Err(not_assignable(&rhs_category, &ty));
    }

    let target = Arc::clone(&place.fun);
    let key = place.key.clone();
    let rhs = rhs.any();
    let zero = zero_value(&ty);
    Ok(stmt(move |env| {
        let t = target(env)?;
        let k = key.as_ref().map(|k| k(env)).transpose()?;
        let r = rhs(env)?;
        let current = t.load(k.as_ref(), &zero)?;
        let v = binary_values(op, kind, &current, &r)?;
        t.store(k.as_ref(), v)?;
        Ok(env.advance())
    }))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
