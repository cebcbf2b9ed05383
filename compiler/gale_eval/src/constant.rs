//! Compile-time constants.
//!
//! Untyped constants are folded with arbitrary-looking precision (`i128`
//! integers, `f64` floats) and only checked against a concrete type when
//! they are converted, either explicitly or by assignment.

use std::fmt;
use std::sync::Arc;

use gale_ir::{BinaryOp, UnaryOp};
use gale_types::{Category, Kind, Type, Universe};

use crate::errors::{
    constant_division_by_zero, constant_overflow, constant_truncated, invalid_operation,
    mismatched_types, not_assignable, CompileError,
};
use crate::value::Value;

#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    Nil,
    Bool(bool),
    Int(i128),
    Float(f64),
    Complex(f64, f64),
    Str(Arc<str>),
}

impl Constant {
    pub fn is_nil(&self) -> bool {
        matches!(self, Constant::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Constant::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer value, accepting floats with no fractional part.
    pub fn as_int(&self) -> Option<i128> {
        match self {
            Constant::Int(i) => Some(*i),
            Constant::Float(x) => float_to_int(*x),
            Constant::Complex(re, im) if *im == 0.0 => float_to_int(*re),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            #[expect(
                clippy::cast_precision_loss,
                reason = "large integer constants round like float literals"
            )]
            Constant::Int(i) => Some(*i as f64),
            Constant::Float(x) => Some(*x),
            Constant::Complex(re, im) if *im == 0.0 => Some(*re),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<(f64, f64)> {
        match self {
            Constant::Complex(re, im) => Some((*re, *im)),
            _ => self.as_float().map(|re| (re, 0.0)),
        }
    }

    /// Numeric rank for operand promotion: int < float < complex.
    fn rank(&self) -> Option<u8> {
        match self {
            Constant::Int(_) => Some(0),
            Constant::Float(_) => Some(1),
            Constant::Complex(..) => Some(2),
            _ => None,
        }
    }

    /// Type of an untyped constant used where a typed value is required.
    /// `nil` has none.
    pub fn default_type(&self, universe: &Universe) -> Option<Type> {
        let kind = match self {
            Constant::Nil => return None,
            Constant::Bool(_) => Kind::Bool,
            Constant::Int(_) => Kind::Int,
            Constant::Float(_) => Kind::Float64,
            Constant::Complex(..) => Kind::Complex128,
            Constant::Str(_) => Kind::String,
        };
        Some(universe.basic(kind))
    }

    /// Fold `x op y`. Integer operands divide with truncation, like the
    /// typed integers they eventually become.
    pub fn binary(op: BinaryOp, x: &Constant, y: &Constant) -> Result<Constant, CompileError> {
        let mismatch = || mismatched_types(op.as_symbol(), &x.kind_name(), &y.kind_name());

        if op.is_shift() {
            return shift(op, x, y);
        }
        match (x, y) {
            (Constant::Bool(a), Constant::Bool(b)) => match op {
                BinaryOp::LogAnd => Ok(Constant::Bool(*a && *b)),
                BinaryOp::LogOr => Ok(Constant::Bool(*a || *b)),
                BinaryOp::Eq => Ok(Constant::Bool(a == b)),
                BinaryOp::NotEq => Ok(Constant::Bool(a != b)),
                _ => Err(invalid_operation(op.as_symbol(), &"untyped bool")),
            },
            (Constant::Str(a), Constant::Str(b)) => match op {
                BinaryOp::Add => Ok(Constant::Str(Arc::from(format!("{a}{b}")))),
                _ if op.is_comparison() => Ok(Constant::Bool(compare(op, a.cmp(b)))),
                _ => Err(invalid_operation(op.as_symbol(), &"untyped string")),
            },
            (Constant::Nil, Constant::Nil) => {
                Err(invalid_operation(op.as_symbol(), &"nil"))
            }
            _ => match x.rank().zip(y.rank()).map(|(a, b)| a.max(b)) {
                Some(0) => match (x, y) {
                    (Constant::Int(a), Constant::Int(b)) => int_binary(op, *a, *b),
                    _ => Err(mismatch()),
                },
                Some(1) => match (x.as_float(), y.as_float()) {
                    (Some(a), Some(b)) => float_binary(op, a, b),
                    _ => Err(mismatch()),
                },
                Some(_) => match (x.as_complex(), y.as_complex()) {
                    (Some(a), Some(b)) => complex_binary(op, a, b),
                    _ => Err(mismatch()),
                },
                None => Err(mismatch()),
            },
        }
    }

    pub fn unary(op: UnaryOp, x: &Constant) -> Result<Constant, CompileError> {
        match (op, x) {
            (UnaryOp::Plus, Constant::Int(_) | Constant::Float(_) | Constant::Complex(..)) => {
                Ok(x.clone())
            }
            (UnaryOp::Neg, Constant::Int(i)) => i
                .checked_neg()
                .map(Constant::Int)
                .ok_or_else(|| constant_overflow(&format!("-{i}"), &"untyped int")),
            (UnaryOp::Neg, Constant::Float(f)) => Ok(Constant::Float(-f)),
            (UnaryOp::Neg, Constant::Complex(re, im)) => Ok(Constant::Complex(-re, -im)),
            (UnaryOp::Not, Constant::Bool(b)) => Ok(Constant::Bool(!b)),
            (UnaryOp::BitNot, Constant::Int(i)) => Ok(Constant::Int(!i)),
            _ => Err(invalid_operation(op.as_symbol(), &x.kind_name())),
        }
    }

    /// The constant as a value of type `ty`: range checked, floats
    /// rounded to the type's precision, integers from integral floats.
    pub fn represent(&self, ty: &Type) -> Result<Constant, CompileError> {
        let kind = ty.kind();
        match ty.category() {
            Category::Bool => match self {
                Constant::Bool(_) => Ok(self.clone()),
                _ => Err(not_assignable(self, ty)),
            },
            Category::Int | Category::Uint => {
                let Some(i) = self.as_int() else {
                    return Err(match self.rank() {
                        Some(_) => constant_truncated(self, ty),
                        None => not_assignable(self, ty),
                    });
                };
                let (min, max) = int_range(kind);
                if i < min || i > max {
                    return Err(constant_overflow(self, ty));
                }
                Ok(Constant::Int(i))
            }
            Category::Float => {
                let x = self.as_float().ok_or_else(|| match self.rank() {
                    Some(_) => constant_truncated(self, ty),
                    None => not_assignable(self, ty),
                })?;
                let x = round_float(kind, x);
                if x.is_infinite() {
                    return Err(constant_overflow(self, ty));
                }
                Ok(Constant::Float(x))
            }
            Category::Complex => {
                let (re, im) = self.as_complex().ok_or_else(|| not_assignable(self, ty))?;
                let (re, im) = (round_float(kind, re), round_float(kind, im));
                if re.is_infinite() || im.is_infinite() {
                    return Err(constant_overflow(self, ty));
                }
                Ok(Constant::Complex(re, im))
            }
            Category::String => match self {
                Constant::Str(_) => Ok(self.clone()),
                _ => Err(not_assignable(self, ty)),
            },
            Category::Func | Category::Unknown => match self {
                Constant::Nil if ty.flags().contains(gale_types::TypeFlags::NILABLE) => {
                    Ok(Constant::Nil)
                }
                _ if ty.is_interface() && !self.is_nil() => Ok(self.clone()),
                _ => Err(not_assignable(self, ty)),
            },
        }
    }

    /// Runtime value of the constant stored as type `ty`.
    pub fn to_value(&self, ty: &Type) -> Result<Value, CompileError> {
        let constant = self.represent(ty)?;
        Ok(match (ty.category(), constant) {
            (Category::Uint, Constant::Int(i)) => Value::Uint(int_bits(i)),
            (_, constant) => constant.into_value(),
        })
    }

    /// Value in the constant's default representation.
    fn into_value(self) -> Value {
        match self {
            Constant::Nil => Value::Nil,
            Constant::Bool(b) => Value::Bool(b),
            #[expect(
                clippy::cast_possible_truncation,
                reason = "represented constants are in range for their type"
            )]
            Constant::Int(i) => Value::Int(i as i64),
            Constant::Float(x) => Value::Float(x),
            Constant::Complex(re, im) => Value::Complex(re, im),
            Constant::Str(s) => Value::Str(s),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Constant::Nil => "nil",
            Constant::Bool(_) => "untyped bool",
            Constant::Int(_) => "untyped int",
            Constant::Float(_) => "untyped float",
            Constant::Complex(..) => "untyped complex",
            Constant::Str(_) => "untyped string",
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Nil => f.write_str("nil"),
            Constant::Bool(b) => write!(f, "{b}"),
            Constant::Int(i) => write!(f, "{i}"),
            Constant::Float(x) => write!(f, "{x}"),
            Constant::Complex(re, im) => write!(f, "({re} + {im}i)"),
            Constant::Str(s) => write!(f, "{s:?}"),
        }
    }
}

// ── Folding helpers ─────────────────────────────────────────────────

fn float_to_int(x: f64) -> Option<i128> {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "only integral values inside the i128 range are converted"
    )]
    let converted = (x.fract() == 0.0 && x.abs() < 1.7e38).then(|| x as i128);
    converted
}

fn compare(op: BinaryOp, ord: std::cmp::Ordering) -> bool {
    use std::cmp::Ordering::{Equal, Greater, Less};
    match op {
        BinaryOp::Eq => ord == Equal,
        BinaryOp::NotEq => ord != Equal,
        BinaryOp::Lt => ord == Less,
        BinaryOp::LtEq => ord != Greater,
        BinaryOp::Gt => ord == Greater,
        _ => ord != Less,
    }
}

fn int_binary(op: BinaryOp, a: i128, b: i128) -> Result<Constant, CompileError> {
    let overflow = || constant_overflow(&format!("{a} {} {b}", op.as_symbol()), &"untyped int");
    let value = match op {
        BinaryOp::Add => a.checked_add(b).ok_or_else(overflow)?,
        BinaryOp::Sub => a.checked_sub(b).ok_or_else(overflow)?,
        BinaryOp::Mul => a.checked_mul(b).ok_or_else(overflow)?,
        BinaryOp::Div | BinaryOp::Rem if b == 0 => return Err(constant_division_by_zero()),
        BinaryOp::Div => a.checked_div(b).ok_or_else(overflow)?,
        BinaryOp::Rem => a.checked_rem(b).ok_or_else(overflow)?,
        BinaryOp::And => a & b,
        BinaryOp::Or => a | b,
        BinaryOp::Xor => a ^ b,
        BinaryOp::AndNot => a & !b,
        _ if op.is_comparison() => return Ok(Constant::Bool(compare(op, a.cmp(&b)))),
        _ => return Err(invalid_operation(op.as_symbol(), &"untyped int")),
    };
    Ok(Constant::Int(value))
}

#[allow(clippy::float_cmp, reason = "constant comparison is exact")]
fn float_binary(op: BinaryOp, a: f64, b: f64) -> Result<Constant, CompileError> {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div if b == 0.0 => return Err(constant_division_by_zero()),
        BinaryOp::Div => a / b,
        _ if op.is_comparison() => {
            return a
                .partial_cmp(&b)
                .map(|ord| Constant::Bool(compare(op, ord)))
                .ok_or_else(|| invalid_operation(op.as_symbol(), &"NaN"))
        }
        _ => return Err(invalid_operation(op.as_symbol(), &"untyped float")),
    };
    Ok(Constant::Float(value))
}

#[allow(clippy::float_cmp, reason = "constant comparison is exact")]
fn complex_binary(op: BinaryOp, (ar, ai): (f64, f64), (br, bi): (f64, f64)) -> Result<Constant, CompileError> {
    let (re, im) = match op {
        BinaryOp::Add => (ar + br, ai + bi),
        BinaryOp::Sub => (ar - br, ai - bi),
        BinaryOp::Mul => (ar * br - ai * bi, ar * bi + ai * br),
        BinaryOp::Div => {
            let denom = br * br + bi * bi;
            if denom == 0.0 {
                return Err(constant_division_by_zero());
            }
            ((ar * br + ai * bi) / denom, (ai * br - ar * bi) / denom)
        }
        BinaryOp::Eq => return Ok(Constant::Bool(ar == br && ai == bi)),
        BinaryOp::NotEq => return Ok(Constant::Bool(ar != br || ai != bi)),
        _ => return Err(invalid_operation(op.as_symbol(), &"untyped complex")),
    };
    Ok(Constant::Complex(re, im))
}

fn shift(op: BinaryOp, x: &Constant, y: &Constant) -> Result<Constant, CompileError> {
    let (Some(a), Some(s)) = (x.as_int(), y.as_int()) else {
        return Err(invalid_operation(op.as_symbol(), &x.kind_name()));
    };
    let Ok(s) = u32::try_from(s) else {
        return Err(invalid_operation(op.as_symbol(), &"negative shift count"));
    };
    let value = if op == BinaryOp::Shl {
        a.checked_shl(s)
            .filter(|v| s < 127 && v >> s == a)
            .ok_or_else(|| constant_overflow(&format!("{a} << {s}"), &"untyped int"))?
    } else {
        a >> s.min(127)
    };
    Ok(Constant::Int(value))
}

/// Inclusive range of an integer kind.
pub(crate) fn int_range(kind: Kind) -> (i128, i128) {
    match kind {
        Kind::Int8 => (i8::MIN.into(), i8::MAX.into()),
        Kind::Int16 => (i16::MIN.into(), i16::MAX.into()),
        Kind::Int32 => (i32::MIN.into(), i32::MAX.into()),
        Kind::Uint8 => (0, u8::MAX.into()),
        Kind::Uint16 => (0, u16::MAX.into()),
        Kind::Uint32 => (0, u32::MAX.into()),
        Kind::Uint | Kind::Uint64 | Kind::Uintptr => (0, u64::MAX.into()),
        _ => (i64::MIN.into(), i64::MAX.into()),
    }
}

fn round_float(kind: Kind, x: f64) -> f64 {
    match kind {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "float32 locations round to single precision"
        )]
        Kind::Float32 | Kind::Complex64 => f64::from(x as f32),
        _ => x,
    }
}

/// Low 64 bits of an in-range unsigned constant.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "represented unsigned constants fit in u64"
)]
fn int_bits(i: i128) -> u64 {
    i as u64
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
