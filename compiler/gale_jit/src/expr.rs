//! Expressions handed to the code buffer.
//!
//! [`Const`] and [`Expr::Reg`] are already lowered and encode directly as
//! operands. [`Expr1`]/[`Expr2`] trees must go through [`Comp`](crate::Comp)
//! first.

use std::fmt;

use crate::kind::Kind;
use crate::op::{Op1, Op2};
use crate::reg::SoftReg;

/// Immediate operand: raw bits plus kind.
///
/// Integers are stored sign- or zero-extended to 64 bits, floats as
/// their IEEE bits (`float32` widened to `f64` first).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Const {
    bits: u64,
    kind: Kind,
}

impl Const {
    #[expect(
        clippy::cast_sign_loss,
        reason = "constants keep the two's complement bit pattern"
    )]
    pub const fn int(value: i64, kind: Kind) -> Self {
        Const {
            bits: value as u64,
            kind,
        }
    }

    pub const fn uint(value: u64, kind: Kind) -> Self {
        Const { bits: value, kind }
    }

    pub fn float(value: f64, kind: Kind) -> Self {
        Const {
            bits: value.to_bits(),
            kind,
        }
    }

    pub const fn bool(value: bool) -> Self {
        Const {
            bits: value as u64,
            kind: Kind::Bool,
        }
    }

    #[inline]
    pub const fn kind(self) -> Kind {
        self.kind
    }

    #[inline]
    pub const fn bits(self) -> u64 {
        self.bits
    }

    #[expect(
        clippy::cast_possible_wrap,
        reason = "constants keep the two's complement bit pattern"
    )]
    pub const fn as_i64(self) -> i64 {
        self.bits as i64
    }

    pub fn as_f64(self) -> f64 {
        f64::from_bits(self.bits)
    }
}

impl fmt::Display for Const {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Kind::Bool => write!(f, "{}", self.bits != 0),
            k if k.is_signed() => write!(f, "{}:{k}", self.as_i64()),
            k if k.is_float() => write!(f, "{}:{k}", self.as_f64()),
            k => write!(f, "{}:{k}", self.bits),
        }
    }
}

/// Unary expression node.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr1 {
    pub op: Op1,
    pub x: Expr,
    /// Result kind.
    pub kind: Kind,
}

/// Binary expression node.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr2 {
    pub op: Op2,
    pub x: Expr,
    pub y: Expr,
    /// Result kind (`bool` for comparisons).
    pub kind: Kind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Const(Const),
    Reg(SoftReg),
    Expr1(Box<Expr1>),
    Expr2(Box<Expr2>),
}

impl Expr {
    pub fn unary(op: Op1, x: Expr) -> Self {
        let kind = x.kind();
        Expr::Expr1(Box::new(Expr1 { op, x, kind }))
    }

    /// `x op y`; comparisons yield `bool`, everything else the kind of `x`.
    pub fn binary(op: Op2, x: Expr, y: Expr) -> Self {
        let kind = if op.is_comparison() {
            Kind::Bool
        } else {
            x.kind()
        };
        Expr::Expr2(Box::new(Expr2 { op, x, y, kind }))
    }

    pub fn kind(&self) -> Kind {
        match self {
            Expr::Const(c) => c.kind(),
            Expr::Reg(r) => r.kind(),
            Expr::Expr1(e) => e.kind,
            Expr::Expr2(e) => e.kind,
        }
    }

    /// Constants and registers need no further lowering.
    pub fn is_lowered(&self) -> bool {
        matches!(self, Expr::Const(_) | Expr::Reg(_))
    }
}

impl From<Const> for Expr {
    fn from(c: Const) -> Self {
        Expr::Const(c)
    }
}

impl From<SoftReg> for Expr {
    fn from(r: SoftReg) -> Self {
        Expr::Reg(r)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(c) => write!(f, "{c}"),
            Expr::Reg(r) => write!(f, "{}", r.id()),
            Expr::Expr1(e) => write!(f, "({} {})", e.op, e.x),
            Expr::Expr2(e) => write!(f, "({} {} {})", e.op, e.x, e.y),
        }
    }
}
