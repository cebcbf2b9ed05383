//! Runtime operator implementations.
//!
//! Typed helpers (`int_binary`, `float_binary`, ...) back the
//! category-specialized closures built by the compiler; the `*_values`
//! functions are the generic fallback for interface-typed operands and
//! compound assignment. Integer arithmetic wraps and is narrowed to the
//! operand kind.

use std::cmp::Ordering;
use std::sync::Arc;

use gale_ir::{BinaryOp, UnaryOp};
use gale_types::{Category, Kind, Type};

use crate::errors::{conversion_failed, division_by_zero, negative_shift, EvalError};
use crate::value::{SliceValue, Value};

// ── Narrowing ───────────────────────────────────────────────────────

/// Truncate a signed value to the width of `kind`, sign-extending back.
#[expect(
    clippy::cast_possible_truncation,
    reason = "truncation to the location width is the point"
)]
#[inline]
pub fn narrow_int(kind: Kind, v: i64) -> i64 {
    match kind {
        Kind::Int8 => i64::from(v as i8),
        Kind::Int16 => i64::from(v as i16),
        Kind::Int32 => i64::from(v as i32),
        _ => v,
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "truncation to the location width is the point"
)]
#[inline]
pub fn narrow_uint(kind: Kind, v: u64) -> u64 {
    match kind {
        Kind::Uint8 => u64::from(v as u8),
        Kind::Uint16 => u64::from(v as u16),
        Kind::Uint32 => u64::from(v as u32),
        _ => v,
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "float32 locations round to single precision"
)]
#[inline]
pub fn narrow_float(kind: Kind, v: f64) -> f64 {
    match kind {
        Kind::Float32 | Kind::Complex64 => f64::from(v as f32),
        _ => v,
    }
}

// ── Typed arithmetic ────────────────────────────────────────────────

pub fn compare<T: PartialOrd>(op: BinaryOp, a: &T, b: &T) -> bool {
    match (op, a.partial_cmp(b)) {
        (BinaryOp::Eq, ord) => ord == Some(Ordering::Equal),
        (BinaryOp::NotEq, ord) => ord != Some(Ordering::Equal),
        (_, None) => false,
        (BinaryOp::Lt, Some(ord)) => ord == Ordering::Less,
        (BinaryOp::LtEq, Some(ord)) => ord != Ordering::Greater,
        (BinaryOp::Gt, Some(ord)) => ord == Ordering::Greater,
        (_, Some(ord)) => ord != Ordering::Less,
    }
}

fn invalid(op: BinaryOp, a: &str, b: &str) -> EvalError {
    EvalError::new(format!(
        "invalid operation: {a} {} {b}",
        op.as_symbol()
    ))
}

pub fn int_binary(op: BinaryOp, kind: Kind, a: i64, b: i64) -> Result<i64, EvalError> {
    let v = match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div | BinaryOp::Rem if b == 0 => return Err(division_by_zero()),
        BinaryOp::Div => a.wrapping_div(b),
        BinaryOp::Rem => a.wrapping_rem(b),
        BinaryOp::And => a & b,
        BinaryOp::Or => a | b,
        BinaryOp::Xor => a ^ b,
        BinaryOp::AndNot => a & !b,
        _ => return Err(invalid(op, kind.name(), kind.name())),
    };
    Ok(narrow_int(kind, v))
}

pub fn uint_binary(op: BinaryOp, kind: Kind, a: u64, b: u64) -> Result<u64, EvalError> {
    let v = match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div | BinaryOp::Rem if b == 0 => return Err(division_by_zero()),
        BinaryOp::Div => a / b,
        BinaryOp::Rem => a % b,
        BinaryOp::And => a & b,
        BinaryOp::Or => a | b,
        BinaryOp::Xor => a ^ b,
        BinaryOp::AndNot => a & !b,
        _ => return Err(invalid(op, kind.name(), kind.name())),
    };
    Ok(narrow_uint(kind, v))
}

/// Float arithmetic; division by zero yields an infinity.
pub fn float_binary(op: BinaryOp, kind: Kind, a: f64, b: f64) -> Result<f64, EvalError> {
    let v = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => return Err(invalid(op, kind.name(), kind.name())),
    };
    Ok(narrow_float(kind, v))
}

pub fn complex_binary(
    op: BinaryOp,
    kind: Kind,
    (ar, ai): (f64, f64),
    (br, bi): (f64, f64),
) -> Result<(f64, f64), EvalError> {
    let (re, im) = match op {
        BinaryOp::Add => (ar + br, ai + bi),
        BinaryOp::Sub => (ar - br, ai - bi),
        BinaryOp::Mul => (ar * br - ai * bi, ar * bi + ai * br),
        BinaryOp::Div => {
            let denom = br * br + bi * bi;
            ((ar * br + ai * bi) / denom, (ai * br - ar * bi) / denom)
        }
        _ => return Err(invalid(op, kind.name(), kind.name())),
    };
    Ok((narrow_float(kind, re), narrow_float(kind, im)))
}

/// Shift count operand; negative counts are a run-time error.
pub fn shift_count(v: &Value) -> Result<u64, EvalError> {
    match v {
        Value::Uint(n) => Ok(*n),
        Value::Int(n) => u64::try_from(*n).map_err(|_| negative_shift()),
        other => Err(conversion_failed(other.type_name(), "shift count")),
    }
}

/// `a << n` / `a >> n`; over-wide shifts give 0 (or -1 for negative `>>`).
pub fn shift_int(op: BinaryOp, kind: Kind, a: i64, n: u64) -> i64 {
    let n = u32::try_from(n).unwrap_or(u32::MAX);
    let v = if op == BinaryOp::Shl {
        a.checked_shl(n).unwrap_or(0)
    } else {
        a.checked_shr(n).unwrap_or(if a < 0 { -1 } else { 0 })
    };
    narrow_int(kind, v)
}

pub fn shift_uint(op: BinaryOp, kind: Kind, a: u64, n: u64) -> u64 {
    let n = u32::try_from(n).unwrap_or(u32::MAX);
    let v = if op == BinaryOp::Shl {
        a.checked_shl(n).unwrap_or(0)
    } else {
        a.checked_shr(n).unwrap_or(0)
    };
    narrow_uint(kind, v)
}

// ── Generic value operations ────────────────────────────────────────

/// `a op b` on values whose static kind is `kind`.
pub fn binary_values(op: BinaryOp, kind: Kind, a: &Value, b: &Value) -> Result<Value, EvalError> {
    if op.is_comparison() {
        return compare_values(op, a, b).map(Value::Bool);
    }
    if op.is_shift() {
        let n = shift_count(b)?;
        return match a {
            Value::Int(x) => Ok(Value::Int(shift_int(op, kind, *x, n))),
            Value::Uint(x) => Ok(Value::Uint(shift_uint(op, kind, *x, n))),
            _ => Err(invalid(op, a.type_name(), b.type_name())),
        };
    }
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => int_binary(op, kind, *x, *y).map(Value::Int),
        (Value::Uint(x), Value::Uint(y)) => uint_binary(op, kind, *x, *y).map(Value::Uint),
        (Value::Float(x), Value::Float(y)) => float_binary(op, kind, *x, *y).map(Value::Float),
        (Value::Complex(ar, ai), Value::Complex(br, bi)) => {
            let (re, im) = complex_binary(op, kind, (*ar, *ai), (*br, *bi))?;
            Ok(Value::Complex(re, im))
        }
        (Value::Str(x), Value::Str(y)) if op == BinaryOp::Add => {
            Ok(Value::Str(Arc::from(format!("{x}{y}"))))
        }
        (Value::Bool(x), Value::Bool(y)) if op == BinaryOp::LogAnd => Ok(Value::Bool(*x && *y)),
        (Value::Bool(x), Value::Bool(y)) if op == BinaryOp::LogOr => Ok(Value::Bool(*x || *y)),
        _ => Err(invalid(op, a.type_name(), b.type_name())),
    }
}

/// Comparison of two values of the same static type.
pub fn compare_values(op: BinaryOp, a: &Value, b: &Value) -> Result<bool, EvalError> {
    match op {
        BinaryOp::Eq => return Ok(a == b),
        BinaryOp::NotEq => return Ok(a != b),
        _ => {}
    }
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(compare(op, x, y)),
        (Value::Uint(x), Value::Uint(y)) => Ok(compare(op, x, y)),
        (Value::Float(x), Value::Float(y)) => Ok(compare(op, x, y)),
        (Value::Str(x), Value::Str(y)) => Ok(compare(op, x, y)),
        _ => Err(invalid(op, a.type_name(), b.type_name())),
    }
}

#[cfg_attr(not(test), allow(dead_code, reason = "only exercised by unit tests"))]
pub fn unary_value(op: UnaryOp, kind: Kind, v: &Value) -> Result<Value, EvalError> {
    Ok(match (op, v) {
        (UnaryOp::Plus, _) => v.clone(),
        (UnaryOp::Neg, Value::Int(x)) => Value::Int(narrow_int(kind, x.wrapping_neg())),
        (UnaryOp::Neg, Value::Uint(x)) => Value::Uint(narrow_uint(kind, x.wrapping_neg())),
        (UnaryOp::Neg, Value::Float(x)) => Value::Float(-x),
        (UnaryOp::Neg, Value::Complex(re, im)) => Value::Complex(-re, -im),
        (UnaryOp::Not, Value::Bool(b)) => Value::Bool(!b),
        (UnaryOp::BitNot, Value::Int(x)) => Value::Int(narrow_int(kind, !x)),
        (UnaryOp::BitNot, Value::Uint(x)) => Value::Uint(narrow_uint(kind, !x)),
        _ => {
            return Err(EvalError::new(format!(
                "invalid operation: {}{}",
                op.as_symbol(),
                v.type_name()
            )))
        }
    })
}

// ── Conversions ─────────────────────────────────────────────────────

/// `T(v)` at run time.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    reason = "numeric conversions follow the language's wrapping rules"
)]
pub fn convert_value(v: &Value, to: &Type) -> Result<Value, EvalError> {
    let kind = to.kind();
    let fail = || conversion_failed(v.type_name(), to);
    Ok(match (to.category(), v) {
        (Category::Int, Value::Int(x)) => Value::Int(narrow_int(kind, *x)),
        (Category::Int, Value::Uint(x)) => Value::Int(narrow_int(kind, *x as i64)),
        (Category::Int, Value::Float(x)) => Value::Int(narrow_int(kind, *x as i64)),
        (Category::Uint, Value::Int(x)) => Value::Uint(narrow_uint(kind, *x as u64)),
        (Category::Uint, Value::Uint(x)) => Value::Uint(narrow_uint(kind, *x)),
        (Category::Uint, Value::Float(x)) => Value::Uint(narrow_uint(kind, *x as u64)),
        (Category::Float, Value::Int(x)) => Value::Float(narrow_float(kind, *x as f64)),
        (Category::Float, Value::Uint(x)) => Value::Float(narrow_float(kind, *x as f64)),
        (Category::Float, Value::Float(x)) => Value::Float(narrow_float(kind, *x)),
        (Category::Complex, Value::Complex(re, im)) => {
            Value::Complex(narrow_float(kind, *re), narrow_float(kind, *im))
        }
        (Category::String, Value::Str(_)) => v.clone(),
        // string(rune)
        (Category::String, Value::Int(x)) => Value::str(
            &u32::try_from(*x)
                .ok()
                .and_then(char::from_u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER)
                .to_string(),
        ),
        // string([]byte)
        (Category::String, Value::Slice(s)) => {
            let bytes = s
                .to_vec()
                .iter()
                .map(|b| match b {
                    Value::Uint(b) => u8::try_from(*b).map_err(|_| fail()),
                    _ => Err(fail()),
                })
                .collect::<Result<Vec<u8>, _>>()?;
            Value::str(&String::from_utf8_lossy(&bytes))
        }
        // []byte(string)
        (_, Value::Str(s))
            if kind == Kind::Slice && to.elem().is_some_and(|e| e.kind() == Kind::Uint8) =>
        {
            Value::Slice(SliceValue::from_vec(
                s.bytes().map(|b| Value::Uint(b.into())).collect(),
            ))
        }
        _ if v.fits(to) => v.clone(),
        _ => return Err(fail()),
    })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
