//! Operation codes.
//!
//! `Op1`/`Op2` compute into a fresh destination register; `Inst1`/`Inst2`
//! update their destination in place. `RegOp` marks soft register
//! lifetimes in the stream.

use std::fmt;

use crate::kind::Kind;

// ── Three-address operations ────────────────────────────────────────

/// Unary operation `dst = op src`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Op1 {
    Neg,
    /// Logical not.
    Not,
    /// Bitwise complement.
    BitNot,
}

impl Op1 {
    pub const fn name(self) -> &'static str {
        match self {
            Op1::Neg => "neg",
            Op1::Not => "not",
            Op1::BitNot => "bitnot",
        }
    }

    /// Whether the operation is defined on operands of `kind`.
    pub const fn accepts(self, kind: Kind) -> bool {
        match self {
            Op1::Neg => kind.is_numeric(),
            Op1::Not => matches!(kind, Kind::Bool),
            Op1::BitNot => kind.is_integer(),
        }
    }
}

/// Binary operation `dst = a op b`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Op2 {
    Add,
    Sub,
    Mul,
    Quo,
    Rem,
    And,
    Or,
    Xor,
    AndNot,
    Shl,
    Shr,
    LAnd,
    LOr,
    Eql,
    Neq,
    Lss,
    Leq,
    Gtr,
    Geq,
}

impl Op2 {
    pub const fn name(self) -> &'static str {
        match self {
            Op2::Add => "add",
            Op2::Sub => "sub",
            Op2::Mul => "mul",
            Op2::Quo => "quo",
            Op2::Rem => "rem",
            Op2::And => "and",
            Op2::Or => "or",
            Op2::Xor => "xor",
            Op2::AndNot => "andnot",
            Op2::Shl => "shl",
            Op2::Shr => "shr",
            Op2::LAnd => "land",
            Op2::LOr => "lor",
            Op2::Eql => "eql",
            Op2::Neq => "neq",
            Op2::Lss => "lss",
            Op2::Leq => "leq",
            Op2::Gtr => "gtr",
            Op2::Geq => "geq",
        }
    }

    /// Comparisons produce a `bool` regardless of operand kind.
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Op2::Eql | Op2::Neq | Op2::Lss | Op2::Leq | Op2::Gtr | Op2::Geq
        )
    }

    /// Whether the operation is defined on (left) operands of `kind`.
    pub const fn accepts(self, kind: Kind) -> bool {
        match self {
            Op2::Add | Op2::Sub | Op2::Mul | Op2::Quo | Op2::Lss | Op2::Leq | Op2::Gtr | Op2::Geq => {
                kind.is_numeric()
            }
            Op2::Rem | Op2::And | Op2::Or | Op2::Xor | Op2::AndNot | Op2::Shl | Op2::Shr => {
                kind.is_integer()
            }
            Op2::LAnd | Op2::LOr => matches!(kind, Kind::Bool),
            Op2::Eql | Op2::Neq => true,
        }
    }
}

// ── In-place instructions ───────────────────────────────────────────

/// Single-operand instruction on `dst`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Inst1 {
    /// Never emitted.
    Nop,
    Zero,
    Inc,
    Dec,
}

impl Inst1 {
    pub const fn name(self) -> &'static str {
        match self {
            Inst1::Nop => "nop",
            Inst1::Zero => "zero",
            Inst1::Inc => "inc",
            Inst1::Dec => "dec",
        }
    }

    pub const fn accepts(self, kind: Kind) -> bool {
        match self {
            Inst1::Nop | Inst1::Zero => true,
            Inst1::Inc | Inst1::Dec => kind.is_numeric(),
        }
    }
}

/// Two-operand instruction `dst op= src`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Inst2 {
    /// `dst = src`; elided when both encode to the same operand.
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    QuoAssign,
    RemAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    AndNotAssign,
    ShlAssign,
    ShrAssign,
}

impl Inst2 {
    pub const fn name(self) -> &'static str {
        match self {
            Inst2::Assign => "assign",
            Inst2::AddAssign => "add_assign",
            Inst2::SubAssign => "sub_assign",
            Inst2::MulAssign => "mul_assign",
            Inst2::QuoAssign => "quo_assign",
            Inst2::RemAssign => "rem_assign",
            Inst2::AndAssign => "and_assign",
            Inst2::OrAssign => "or_assign",
            Inst2::XorAssign => "xor_assign",
            Inst2::AndNotAssign => "andnot_assign",
            Inst2::ShlAssign => "shl_assign",
            Inst2::ShrAssign => "shr_assign",
        }
    }

    /// The binary operation a compound assignment applies.
    pub const fn op(self) -> Option<Op2> {
        Some(match self {
            Inst2::Assign => return None,
            Inst2::AddAssign => Op2::Add,
            Inst2::SubAssign => Op2::Sub,
            Inst2::MulAssign => Op2::Mul,
            Inst2::QuoAssign => Op2::Quo,
            Inst2::RemAssign => Op2::Rem,
            Inst2::AndAssign => Op2::And,
            Inst2::OrAssign => Op2::Or,
            Inst2::XorAssign => Op2::Xor,
            Inst2::AndNotAssign => Op2::AndNot,
            Inst2::ShlAssign => Op2::Shl,
            Inst2::ShrAssign => Op2::Shr,
        })
    }

    /// Compound assignment form of `op`, if it has one.
    pub const fn from_op(op: Op2) -> Option<Inst2> {
        Some(match op {
            Op2::Add => Inst2::AddAssign,
            Op2::Sub => Inst2::SubAssign,
            Op2::Mul => Inst2::MulAssign,
            Op2::Quo => Inst2::QuoAssign,
            Op2::Rem => Inst2::RemAssign,
            Op2::And => Inst2::AndAssign,
            Op2::Or => Inst2::OrAssign,
            Op2::Xor => Inst2::XorAssign,
            Op2::AndNot => Inst2::AndNotAssign,
            Op2::Shl => Inst2::ShlAssign,
            Op2::Shr => Inst2::ShrAssign,
            _ => return None,
        })
    }

    pub const fn accepts(self, kind: Kind) -> bool {
        match self.op() {
            Some(op) => op.accepts(kind),
            None => true,
        }
    }
}

// ── Register lifecycle ──────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RegOp {
    Alloc,
    Free,
}

impl RegOp {
    pub const fn name(self) -> &'static str {
        match self {
            RegOp::Alloc => "alloc",
            RegOp::Free => "free",
        }
    }
}

macro_rules! display_by_name {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.name())
                }
            }
        )*
    };
}

display_by_name!(Op1, Op2, Inst1, Inst2, RegOp);
