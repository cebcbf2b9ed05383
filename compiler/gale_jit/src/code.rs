//! The append-only token buffer.

use std::fmt;

use crate::error::JitError;
use crate::expr::{Const, Expr};
use crate::kind::Kind;
use crate::op::{Inst1, Inst2, Op1, Op2, RegOp};
use crate::reg::{SoftReg, SoftRegId};

/// One token of the instruction stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AsmCode {
    Op1(Op1),
    Op2(Op2),
    Inst1(Inst1),
    Inst2(Inst2),
    RegOp(RegOp),
    Reg(SoftRegId),
    Kind(Kind),
    Const(Const),
}

/// Encode an already lowered operand.
///
/// Soft registers encode as their id, constants as themselves.
pub fn asm_arg(e: &Expr) -> Result<AsmCode, JitError> {
    match e {
        Expr::Const(c) => Ok(AsmCode::Const(*c)),
        Expr::Reg(r) => Ok(AsmCode::Reg(r.id())),
        Expr::Expr1(_) | Expr::Expr2(_) => Err(JitError::not_lowered(e)),
    }
}

/// Instruction stream for one lowered body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Code {
    tokens: Vec<AsmCode>,
}

impl Code {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tokens(&self) -> &[AsmCode] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// `dst = op src`
    pub fn op1(&mut self, op: Op1, src: &Expr, dst: SoftReg) -> Result<&mut Self, JitError> {
        let src = asm_arg(src)?;
        self.tokens
            .extend([AsmCode::Op1(op), src, AsmCode::Reg(dst.id())]);
        Ok(self)
    }

    /// `dst = a op b`
    pub fn op2(&mut self, op: Op2, a: &Expr, b: &Expr, dst: SoftReg) -> Result<&mut Self, JitError> {
        let (a, b) = (asm_arg(a)?, asm_arg(b)?);
        self.tokens
            .extend([AsmCode::Op2(op), a, b, AsmCode::Reg(dst.id())]);
        Ok(self)
    }

    /// Appends `inst dst`; `Inst1::Nop` appends nothing.
    pub fn inst1(&mut self, inst: Inst1, dst: &Expr) -> Result<&mut Self, JitError> {
        let dst = asm_arg(dst)?;
        if inst != Inst1::Nop {
            self.tokens.extend([AsmCode::Inst1(inst), dst]);
        }
        Ok(self)
    }

    /// Appends `inst src, dst`; a self-assignment appends nothing.
    pub fn inst2(&mut self, inst: Inst2, src: &Expr, dst: &Expr) -> Result<&mut Self, JitError> {
        let (src, dst) = (asm_arg(src)?, asm_arg(dst)?);
        if inst != Inst2::Assign || src != dst {
            self.tokens.extend([AsmCode::Inst2(inst), src, dst]);
        }
        Ok(self)
    }

    /// Records an allocation or release of soft register `id`.
    pub fn soft_reg(&mut self, op: RegOp, id: SoftRegId, kind: Kind) -> SoftReg {
        self.tokens
            .extend([AsmCode::RegOp(op), AsmCode::Reg(id), AsmCode::Kind(kind)]);
        SoftReg::new(id, kind)
    }

    /// Replay the stream as instructions.
    pub fn decode(&self) -> Result<Vec<Instr>, JitError> {
        let mut out = Vec::new();
        let mut at = 0;
        while let Some(&head) = self.tokens.get(at) {
            let (instr, width) = self.decode_one(at, head)?;
            out.push(instr);
            at += width;
        }
        Ok(out)
    }

    fn decode_one(&self, at: usize, head: AsmCode) -> Result<(Instr, usize), JitError> {
        let operand = |i: usize| -> Result<Operand, JitError> {
            match self.tokens.get(at + i) {
                Some(AsmCode::Reg(id)) => Ok(Operand::Reg(*id)),
                Some(AsmCode::Const(c)) => Ok(Operand::Const(*c)),
                _ => Err(JitError::Malformed { at: at + i }),
            }
        };
        let reg = |i: usize| -> Result<SoftRegId, JitError> {
            match self.tokens.get(at + i) {
                Some(AsmCode::Reg(id)) => Ok(*id),
                _ => Err(JitError::Malformed { at: at + i }),
            }
        };

        Ok(match head {
            AsmCode::Op1(op) => (
                Instr::Op1 {
                    op,
                    src: operand(1)?,
                    dst: reg(2)?,
                },
                3,
            ),
            AsmCode::Op2(op) => (
                Instr::Op2 {
                    op,
                    a: operand(1)?,
                    b: operand(2)?,
                    dst: reg(3)?,
                },
                4,
            ),
            AsmCode::Inst1(inst) => (Instr::Inst1 { inst, dst: operand(1)? }, 2),
            AsmCode::Inst2(inst) => (
                Instr::Inst2 {
                    inst,
                    src: operand(1)?,
                    dst: operand(2)?,
                },
                3,
            ),
            AsmCode::RegOp(op) => {
                let id = reg(1)?;
                let Some(AsmCode::Kind(kind)) = self.tokens.get(at + 2).copied() else {
                    return Err(JitError::Malformed { at: at + 2 });
                };
                let reg = SoftReg::new(id, kind);
                let instr = match op {
                    RegOp::Alloc => Instr::Alloc(reg),
                    RegOp::Free => Instr::Free(reg),
                };
                (instr, 3)
            }
            AsmCode::Reg(_) | AsmCode::Kind(_) | AsmCode::Const(_) => {
                return Err(JitError::Malformed { at })
            }
        })
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decode() {
            Ok(instrs) => {
                for instr in instrs {
                    writeln!(f, "{instr}")?;
                }
                Ok(())
            }
            Err(err) => write!(f, "<{err}>"),
        }
    }
}

/// Decoded operand.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    Reg(SoftRegId),
    Const(Const),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(id) => write!(f, "{id}"),
            Operand::Const(c) => write!(f, "{c}"),
        }
    }
}

/// One decoded instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Instr {
    Op1 {
        op: Op1,
        src: Operand,
        dst: SoftRegId,
    },
    Op2 {
        op: Op2,
        a: Operand,
        b: Operand,
        dst: SoftRegId,
    },
    Inst1 {
        inst: Inst1,
        dst: Operand,
    },
    Inst2 {
        inst: Inst2,
        src: Operand,
        dst: Operand,
    },
    Alloc(SoftReg),
    Free(SoftReg),
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Op1 { op, src, dst } => write!(f, "{op} {src} -> {dst}"),
            Instr::Op2 { op, a, b, dst } => write!(f, "{op} {a}, {b} -> {dst}"),
            Instr::Inst1 { inst, dst } => write!(f, "{inst} {dst}"),
            Instr::Inst2 { inst, src, dst } => write!(f, "{inst} {src} -> {dst}"),
            Instr::Alloc(reg) => write!(f, "alloc {reg}"),
            Instr::Free(reg) => write!(f, "free {reg}"),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
