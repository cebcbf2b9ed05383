//! Runtime values.
//!
//! Scalars are stored unboxed; integer values carry their full 64-bit
//! representation and are narrowed to the width of the location they are
//! stored into. Reference types (slices, maps, functions) share their
//! backing storage through `Arc`, so copying a value aliases it the way the
//! language requires. `nil` slices, maps and functions are all [`Value::Nil`].

use std::fmt;
use std::sync::Arc;

use gale_types::{Kind, Type};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::errors::{index_out_of_range, unhashable_key, EvalError};

#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    /// Signed integer of any width.
    Int(i64),
    /// Unsigned integer of any width.
    Uint(u64),
    Float(f64),
    Complex(f64, f64),
    Str(Arc<str>),
    Slice(SliceValue),
    Map(MapValue),
    Struct(StructValue),
    Func(FuncValue),
}

impl Value {
    #[inline]
    pub fn str(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Short name of the value's representation, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Float(_) => "float64",
            Value::Complex(..) => "complex128",
            Value::Str(_) => "string",
            Value::Slice(_) => "slice",
            Value::Map(_) => "map",
            Value::Struct(_) => "struct",
            Value::Func(_) => "func",
        }
    }

    /// True if the value's representation can be stored in a location of
    /// type `ty`.
    pub fn fits(&self, ty: &Type) -> bool {
        match (ty.kind(), self) {
            (Kind::Interface, _) => true,
            (Kind::Bool, Value::Bool(_))
            | (
                Kind::Int | Kind::Int8 | Kind::Int16 | Kind::Int32 | Kind::Int64,
                Value::Int(_),
            )
            | (
                Kind::Uint
                | Kind::Uint8
                | Kind::Uint16
                | Kind::Uint32
                | Kind::Uint64
                | Kind::Uintptr,
                Value::Uint(_),
            )
            | (Kind::Float32 | Kind::Float64, Value::Float(_))
            | (Kind::Complex64 | Kind::Complex128, Value::Complex(..))
            | (Kind::String, Value::Str(_))
            | (Kind::Slice, Value::Slice(_) | Value::Nil)
            | (Kind::Map, Value::Map(_) | Value::Nil)
            | (Kind::Func, Value::Func(_) | Value::Nil) => true,
            (Kind::Struct, Value::Struct(s)) => s.len() == ty.num_field(),
            _ => false,
        }
    }

    /// Length as reported by the `len` builtin.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Nil => Some(0),
            Value::Str(s) => Some(s.len()),
            Value::Slice(s) => Some(s.len()),
            Value::Map(m) => Some(m.len()),
            _ => None,
        }
    }
}

/// Zero value of a type: `false`, `0`, `""`, a struct of zeros, or `nil`.
pub fn zero_value(ty: &Type) -> Value {
    match ty.kind() {
        Kind::Bool => Value::Bool(false),
        Kind::Int | Kind::Int8 | Kind::Int16 | Kind::Int32 | Kind::Int64 => Value::Int(0),
        Kind::Uint
        | Kind::Uint8
        | Kind::Uint16
        | Kind::Uint32
        | Kind::Uint64
        | Kind::Uintptr => Value::Uint(0),
        Kind::Float32 | Kind::Float64 => Value::Float(0.0),
        Kind::Complex64 | Kind::Complex128 => Value::Complex(0.0, 0.0),
        Kind::String => Value::str(""),
        Kind::Struct => {
            let fields = (0..ty.num_field())
                .map(|i| ty.field(i).map_or(Value::Nil, |f| zero_value(&f.ty)))
                .collect();
            Value::Struct(StructValue::new(fields))
        }
        Kind::Invalid
        | Kind::Slice
        | Kind::Array
        | Kind::Map
        | Kind::Pointer
        | Kind::Interface
        | Kind::Func => Value::Nil,
    }
}

impl PartialEq for Value {
    /// Language `==`: scalars and strings by value, structs field-wise,
    /// reference types by identity.
    #[allow(clippy::float_cmp, reason = "language equality on floats is exact")]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Uint(a), Value::Uint(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Complex(ar, ai), Value::Complex(br, bi)) => ar == br && ai == bi,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => a.fields() == b.fields(),
            (Value::Slice(a), Value::Slice(b)) => a.ptr_eq(b),
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(&a.0, &b.0),
            (Value::Func(a), Value::Func(b)) => Arc::ptr_eq(&a.call, &b.call),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s:?}"),
            _ => write!(f, "{self}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("<nil>"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Uint(u) => write!(f, "{u}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Complex(re, im) => write!(f, "({re}{im:+}i)"),
            Value::Str(s) => f.write_str(s),
            Value::Slice(s) => {
                f.write_str("[")?;
                for (i, v) in s.to_vec().iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            Value::Map(m) => {
                // Keys print sorted so output is deterministic.
                let mut entries: Vec<(MapKey, Value)> = m
                    .0
                    .read()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                entries.sort_by(|a, b| a.0.cmp(&b.0));
                f.write_str("map[")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}:{v}", k.to_value())?;
                }
                f.write_str("]")
            }
            Value::Struct(s) => {
                f.write_str("{")?;
                for (i, v) in s.fields().iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("}")
            }
            Value::Func(func) => write!(f, "func {}", func.name),
        }
    }
}

// ── Slices ──────────────────────────────────────────────────────────

/// Window `[start, start + len)` onto a shared backing array of
/// `start + cap` elements.
#[derive(Clone)]
pub struct SliceValue {
    data: Arc<RwLock<Vec<Value>>>,
    start: usize,
    len: usize,
    cap: usize,
}

impl SliceValue {
    /// `make([]T, len, cap)`: `cap` slots filled with `zero`.
    pub fn make(len: usize, cap: usize, zero: &Value) -> Self {
        let cap = cap.max(len);
        SliceValue {
            data: Arc::new(RwLock::new(vec![zero.clone(); cap])),
            start: 0,
            len,
            cap,
        }
    }

    pub fn from_vec(values: Vec<Value>) -> Self {
        let len = values.len();
        SliceValue {
            data: Arc::new(RwLock::new(values)),
            start: 0,
            len,
            cap: len,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn cap(&self) -> usize {
        self.cap
    }

    fn ptr_eq(&self, other: &SliceValue) -> bool {
        Arc::ptr_eq(&self.data, &other.data) && self.start == other.start && self.len == other.len
    }

    /// Bounds-checked position in the backing array.
    fn offset(&self, index: i64) -> Result<usize, EvalError> {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < self.len)
            .map(|i| self.start + i)
            .ok_or_else(|| index_out_of_range(index, self.len))
    }

    pub fn get(&self, index: i64) -> Result<Value, EvalError> {
        let at = self.offset(index)?;
        Ok(self.data.read()[at].clone())
    }

    pub fn set(&self, index: i64, value: Value) -> Result<(), EvalError> {
        let at = self.offset(index)?;
        self.data.write()[at] = value;
        Ok(())
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.data.read()[self.start..self.start + self.len].to_vec()
    }

    /// `append(s, values...)`: writes in place while capacity allows,
    /// otherwise copies into a new backing array of at least twice the size.
    #[must_use]
    pub fn append(&self, values: &[Value]) -> SliceValue {
        let new_len = self.len + values.len();
        if new_len <= self.cap {
            let mut data = self.data.write();
            let end = self.start + self.len;
            data[end..end + values.len()].clone_from_slice(values);
            return SliceValue {
                data: Arc::clone(&self.data),
                start: self.start,
                len: new_len,
                cap: self.cap,
            };
        }
        let cap = new_len.max(self.cap * 2);
        let mut data = Vec::with_capacity(cap);
        data.extend(self.to_vec());
        data.extend_from_slice(values);
        data.resize(cap, Value::Nil);
        SliceValue {
            data: Arc::new(RwLock::new(data)),
            start: 0,
            len: new_len,
            cap,
        }
    }
}

// ── Maps ────────────────────────────────────────────────────────────

/// Hashable form of a comparable value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MapKey {
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    /// `f64::to_bits`, with `-0.0` folded into `0.0`.
    Float(u64),
    Complex(u64, u64),
    Str(Arc<str>),
    Struct(Box<[MapKey]>),
}

fn float_key(x: f64) -> u64 {
    if x == 0.0 {
        0.0f64.to_bits()
    } else {
        x.to_bits()
    }
}

impl MapKey {
    pub fn from_value(value: &Value) -> Result<MapKey, EvalError> {
        Ok(match value {
            Value::Nil => MapKey::Nil,
            Value::Bool(b) => MapKey::Bool(*b),
            Value::Int(i) => MapKey::Int(*i),
            Value::Uint(u) => MapKey::Uint(*u),
            Value::Float(x) => MapKey::Float(float_key(*x)),
            Value::Complex(re, im) => MapKey::Complex(float_key(*re), float_key(*im)),
            Value::Str(s) => MapKey::Str(Arc::clone(s)),
            Value::Struct(s) => MapKey::Struct(
                s.fields()
                    .iter()
                    .map(MapKey::from_value)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Slice(_) | Value::Map(_) | Value::Func(_) => {
                return Err(unhashable_key(value.type_name()))
            }
        })
    }

    pub fn to_value(&self) -> Value {
        match self {
            MapKey::Nil => Value::Nil,
            MapKey::Bool(b) => Value::Bool(*b),
            MapKey::Int(i) => Value::Int(*i),
            MapKey::Uint(u) => Value::Uint(*u),
            MapKey::Float(bits) => Value::Float(f64::from_bits(*bits)),
            MapKey::Complex(re, im) => Value::Complex(f64::from_bits(*re), f64::from_bits(*im)),
            MapKey::Str(s) => Value::Str(Arc::clone(s)),
            MapKey::Struct(fields) => Value::Struct(StructValue::new(
                fields.iter().map(MapKey::to_value).collect(),
            )),
        }
    }
}

/// Shared, mutable hash map.
#[derive(Clone, Default)]
pub struct MapValue(Arc<RwLock<FxHashMap<MapKey, Value>>>);

impl MapValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn get(&self, key: &Value) -> Result<Option<Value>, EvalError> {
        let key = MapKey::from_value(key)?;
        Ok(self.0.read().get(&key).cloned())
    }

    pub fn insert(&self, key: &Value, value: Value) -> Result<(), EvalError> {
        let key = MapKey::from_value(key)?;
        self.0.write().insert(key, value);
        Ok(())
    }

    pub fn remove(&self, key: &Value) -> Result<(), EvalError> {
        let key = MapKey::from_value(key)?;
        self.0.write().remove(&key);
        Ok(())
    }
}

// ── Structs and functions ───────────────────────────────────────────

/// Immutable struct value; fields in declaration order.
#[derive(Clone)]
pub struct StructValue(Arc<[Value]>);

impl StructValue {
    pub fn new(fields: Vec<Value>) -> Self {
        StructValue(fields.into())
    }

    pub fn fields(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, i: usize) -> Value {
        self.0.get(i).cloned().unwrap_or(Value::Nil)
    }
}

/// Native entry point of a callable: arguments in, results out.
pub type CallFn = Arc<dyn Fn(&[Value]) -> Result<Vec<Value>, EvalError> + Send + Sync>;

/// Callable value: compiled function, closure, method or host function.
#[derive(Clone)]
pub struct FuncValue {
    pub name: Arc<str>,
    pub call: CallFn,
}

impl FuncValue {
    pub fn new(
        name: &str,
        call: impl Fn(&[Value]) -> Result<Vec<Value>, EvalError> + Send + Sync + 'static,
    ) -> Self {
        FuncValue {
            name: Arc::from(name),
            call: Arc::new(call),
        }
    }

    #[inline]
    pub fn call(&self, args: &[Value]) -> Result<Vec<Value>, EvalError> {
        (self.call)(args)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
