//! Compiled expressions.
//!
//! An expression compiles to a closure over the environment. The closure's
//! result type follows the expression's category, so arithmetic on an
//! `int` expression never boxes through [`Value`].

use std::sync::Arc;

use gale_types::{Category, Type};

use crate::env::Env;
use crate::errors::{conversion_failed, EvalError};
use crate::value::Value;

/// Closure computing a `T` in an environment.
pub type Fun<T> = Arc<dyn Fn(&Arc<Env>) -> Result<T, EvalError> + Send + Sync>;

/// Wrap a closure as a [`Fun`].
#[inline]
pub fn fun<T, F>(f: F) -> Fun<T>
where
    F: Fn(&Arc<Env>) -> Result<T, EvalError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Expression closure specialized by category.
#[derive(Clone)]
pub enum ExprFun {
    Bool(Fun<bool>),
    /// Any signed integer kind.
    Int(Fun<i64>),
    /// Any unsigned integer kind.
    Uint(Fun<u64>),
    Float(Fun<f64>),
    Complex(Fun<(f64, f64)>),
    Str(Fun<Arc<str>>),
    /// Composite, interface and function values.
    Any(Fun<Value>),
}

macro_rules! extract {
    ($f:expr, $variant:ident, $name:literal) => {{
        let f = $f;
        fun(move |env| match f(env)? {
            Value::$variant(x) => Ok(x),
            other => Err(conversion_failed(other.type_name(), $name)),
        })
    }};
}

impl ExprFun {
    /// Specialize a value closure for an expression of static type `ty`.
    pub fn typed(ty: &Type, f: Fun<Value>) -> ExprFun {
        match ty.category() {
            Category::Bool => ExprFun::Bool(extract!(f, Bool, "bool")),
            Category::Int => ExprFun::Int(extract!(f, Int, "int")),
            Category::Uint => ExprFun::Uint(extract!(f, Uint, "uint")),
            Category::Float => ExprFun::Float(extract!(f, Float, "float64")),
            Category::String => ExprFun::Str(extract!(f, Str, "string")),
            Category::Complex => ExprFun::Complex(fun(move |env| match f(env)? {
                Value::Complex(re, im) => Ok((re, im)),
                other => Err(conversion_failed(other.type_name(), "complex128")),
            })),
            Category::Func | Category::Unknown => ExprFun::Any(f),
        }
    }

    /// Closure producing a fixed value, specialized like [`typed`](Self::typed).
    pub fn constant(ty: &Type, value: Value) -> ExprFun {
        match (ty.category(), value) {
            (Category::Bool, Value::Bool(b)) => ExprFun::Bool(fun(move |_| Ok(b))),
            (Category::Int, Value::Int(i)) => ExprFun::Int(fun(move |_| Ok(i))),
            (Category::Uint, Value::Uint(u)) => ExprFun::Uint(fun(move |_| Ok(u))),
            (Category::Float, Value::Float(x)) => ExprFun::Float(fun(move |_| Ok(x))),
            (Category::Complex, Value::Complex(re, im)) => {
                ExprFun::Complex(fun(move |_| Ok((re, im))))
            }
            (Category::String, Value::Str(s)) => ExprFun::Str(fun(move |_| Ok(Arc::clone(&s)))),
            (_, value) => ExprFun::Any(fun(move |_| Ok(value.clone()))),
        }
    }

    /// The closure boxed back into a [`Value`].
    pub fn any(self) -> Fun<Value> {
        match self {
            ExprFun::Bool(f) => fun(move |env| f(env).map(Value::Bool)),
            ExprFun::Int(f) => fun(move |env| f(env).map(Value::Int)),
            ExprFun::Uint(f) => fun(move |env| f(env).map(Value::Uint)),
            ExprFun::Float(f) => fun(move |env| f(env).map(Value::Float)),
            ExprFun::Complex(f) => fun(move |env| f(env).map(|(re, im)| Value::Complex(re, im))),
            ExprFun::Str(f) => fun(move |env| f(env).map(Value::Str)),
            ExprFun::Any(f) => f,
        }
    }

    /// Category the closure was specialized for.
    pub fn category(&self) -> Category {
        match self {
            ExprFun::Bool(_) => Category::Bool,
            ExprFun::Int(_) => Category::Int,
            ExprFun::Uint(_) => Category::Uint,
            ExprFun::Float(_) => Category::Float,
            ExprFun::Complex(_) => Category::Complex,
            ExprFun::Str(_) => Category::String,
            ExprFun::Any(_) => Category::Unknown,
        }
    }
}
