//! Expression lowering onto a [`Code`] buffer.
//!
//! Each `Expr1`/`Expr2` node computes into a soft register. Temporaries are
//! allocated with the lowest free id and released as soon as their consumer
//! is emitted, so the `ALLOC`/`FREE` tokens in the stream give exact
//! lifetimes.

use crate::code::Code;
use crate::error::JitError;
use crate::expr::Expr;
use crate::kind::Kind;
use crate::op::{Inst1, Inst2, RegOp};
use crate::reg::{SoftReg, SoftRegId};

/// A lowered operand, plus the temporary holding it (if any).
///
/// The caller frees `temp` once the operand has been consumed.
#[derive(Clone, Debug, PartialEq)]
pub struct Lowered {
    pub expr: Expr,
    pub temp: Option<SoftReg>,
}

impl Lowered {
    fn direct(expr: &Expr) -> Self {
        Lowered {
            expr: expr.clone(),
            temp: None,
        }
    }
}

/// Lowering state for one body.
#[derive(Debug, Default)]
pub struct Comp {
    code: Code,
    in_use: Vec<bool>,
}

impl Comp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn code(&self) -> &Code {
        &self.code
    }

    pub fn finish(self) -> Code {
        self.code
    }

    /// Number of soft registers currently allocated.
    pub fn live(&self) -> usize {
        self.in_use.iter().filter(|&&used| used).count()
    }

    /// Allocate a register with the lowest free id.
    pub fn alloc(&mut self, kind: Kind) -> SoftReg {
        let index = match self.in_use.iter().position(|&used| !used) {
            Some(index) => index,
            None => {
                self.in_use.push(false);
                self.in_use.len() - 1
            }
        };
        self.in_use[index] = true;
        #[expect(
            clippy::cast_possible_truncation,
            reason = "live soft registers never exceed u32"
        )]
        let id = SoftRegId::new(index as u32);
        tracing::trace!(%id, %kind, "alloc soft register");
        self.code.soft_reg(RegOp::Alloc, id, kind)
    }

    /// Release `reg`. Releasing a register that is not live does nothing.
    pub fn free(&mut self, reg: SoftReg) {
        let Some(used) = self.in_use.get_mut(reg.id().index()) else {
            return;
        };
        if !*used {
            return;
        }
        *used = false;
        tracing::trace!(id = %reg.id(), "free soft register");
        self.code.soft_reg(RegOp::Free, reg.id(), reg.kind());
    }

    fn release(&mut self, lowered: &Lowered) {
        if let Some(temp) = lowered.temp {
            self.free(temp);
        }
    }

    /// Lower `e` to a constant or register, computing subexpressions into
    /// temporaries.
    pub fn lower(&mut self, e: &Expr) -> Result<Lowered, JitError> {
        match e {
            Expr::Const(_) | Expr::Reg(_) => Ok(Lowered::direct(e)),
            Expr::Expr1(node) => {
                check(node.op.accepts(node.x.kind()), node.op.name(), node.x.kind())?;
                let x = self.lower(&node.x)?;
                let dst = match x.temp {
                    Some(temp) if temp.kind() == node.kind => temp,
                    _ => self.alloc(node.kind),
                };
                self.code.op1(node.op, &x.expr, dst)?;
                if x.temp != Some(dst) {
                    self.release(&x);
                }
                Ok(Lowered {
                    expr: Expr::Reg(dst),
                    temp: Some(dst),
                })
            }
            Expr::Expr2(node) => {
                check(node.op.accepts(node.x.kind()), node.op.name(), node.x.kind())?;
                let x = self.lower(&node.x)?;
                let y = self.lower(&node.y)?;
                let reuse = [x.temp, y.temp]
                    .into_iter()
                    .flatten()
                    .find(|temp| temp.kind() == node.kind);
                let dst = match reuse {
                    Some(temp) => temp,
                    None => self.alloc(node.kind),
                };
                self.code.op2(node.op, &x.expr, &y.expr, dst)?;
                for operand in [&x, &y] {
                    if operand.temp != Some(dst) {
                        self.release(operand);
                    }
                }
                Ok(Lowered {
                    expr: Expr::Reg(dst),
                    temp: Some(dst),
                })
            }
        }
    }

    /// `dst = e`, computing the top operation straight into `dst`.
    pub fn assign(&mut self, e: &Expr, dst: SoftReg) -> Result<(), JitError> {
        match e {
            Expr::Const(_) | Expr::Reg(_) => {
                self.code.inst2(Inst2::Assign, e, &Expr::Reg(dst))?;
            }
            Expr::Expr1(node) => {
                check(node.op.accepts(node.x.kind()), node.op.name(), node.x.kind())?;
                let x = self.lower(&node.x)?;
                self.code.op1(node.op, &x.expr, dst)?;
                self.release(&x);
            }
            Expr::Expr2(node) => {
                check(node.op.accepts(node.x.kind()), node.op.name(), node.x.kind())?;
                let x = self.lower(&node.x)?;
                let y = self.lower(&node.y)?;
                self.code.op2(node.op, &x.expr, &y.expr, dst)?;
                self.release(&x);
                self.release(&y);
            }
        }
        Ok(())
    }

    /// `inst dst`
    pub fn stmt1(&mut self, inst: Inst1, dst: SoftReg) -> Result<(), JitError> {
        check(inst.accepts(dst.kind()), inst.name(), dst.kind())?;
        self.code.inst1(inst, &Expr::Reg(dst))?;
        Ok(())
    }

    /// `dst inst src`, for example `dst += src`.
    pub fn stmt2(&mut self, inst: Inst2, src: &Expr, dst: SoftReg) -> Result<(), JitError> {
        if inst == Inst2::Assign {
            return self.assign(src, dst);
        }
        check(inst.accepts(dst.kind()), inst.name(), dst.kind())?;
        let src = self.lower(src)?;
        self.code.inst2(inst, &src.expr, &Expr::Reg(dst))?;
        self.release(&src);
        Ok(())
    }
}

fn check(ok: bool, op: &'static str, kind: Kind) -> Result<(), JitError> {
    if ok {
        Ok(())
    } else {
        Err(JitError::unsupported_kind(op, kind))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
