//! Native lowering of integer-only function bodies.
//!
//! A function is eligible when every parameter, result and local is an
//! integer, and its body is a straight line of definitions, assignments,
//! compound assignments and `++`/`--`, optionally ending in `return`.
//! Parameters take the first soft registers in order, results the next
//! ones. Results start at zero unless they are unnamed and the body ends
//! in `return` with values, matching the threaded code's implicit return.
//! Every named register is released at the end of the stream.
//!
//! Anything else is left to the threaded code; lowering is an addition to
//! it, never a replacement.

use gale_ir::{
    BinaryOp, ExprId, ExprKind, FuncDecl, Name, StmtKind, StringInterner, SyntaxArena, UnaryOp,
};
use gale_jit::{Comp, Const, Expr, Inst1, Inst2, Op1, Op2, SoftReg};
use gale_types::{Kind, Type};
use rustc_hash::FxHashMap;

use crate::errors::CompileError;

/// Register kind for an integer type.
fn jit_kind(ty: &Type) -> Option<gale_jit::Kind> {
    Some(match ty.kind() {
        Kind::Int => gale_jit::Kind::Int,
        Kind::Int8 => gale_jit::Kind::Int8,
        Kind::Int16 => gale_jit::Kind::Int16,
        Kind::Int32 => gale_jit::Kind::Int32,
        Kind::Int64 => gale_jit::Kind::Int64,
        Kind::Uint => gale_jit::Kind::Uint,
        Kind::Uint8 => gale_jit::Kind::Uint8,
        Kind::Uint16 => gale_jit::Kind::Uint16,
        Kind::Uint32 => gale_jit::Kind::Uint32,
        Kind::Uint64 => gale_jit::Kind::Uint64,
        Kind::Uintptr => gale_jit::Kind::Uintptr,
        _ => return None,
    })
}

fn arith_op(op: BinaryOp) -> Option<Op2> {
    Some(match op {
        BinaryOp::Add => Op2::Add,
        BinaryOp::Sub => Op2::Sub,
        BinaryOp::Mul => Op2::Mul,
        BinaryOp::Div => Op2::Quo,
        BinaryOp::Rem => Op2::Rem,
        BinaryOp::And => Op2::And,
        BinaryOp::Or => Op2::Or,
        BinaryOp::Xor => Op2::Xor,
        BinaryOp::AndNot => Op2::AndNot,
        BinaryOp::Shl => Op2::Shl,
        BinaryOp::Shr => Op2::Shr,
        _ => return None,
    })
}

fn zero(kind: gale_jit::Kind) -> Const {
    if kind.is_signed() {
        Const::int(0, kind)
    } else {
        Const::uint(0, kind)
    }
}

/// Soft-register code for `func`, or `None` if the body is not eligible.
/// `params` and `results` are the resolved signature types.
pub fn lower_func(
    arena: &SyntaxArena,
    interner: &StringInterner,
    func: &FuncDecl,
    params: &[Type],
    results: &[Type],
) -> Result<Option<gale_jit::Code>, CompileError> {
    let Some(body) = &func.body else {
        return Ok(None);
    };
    if func.sig.variadic {
        return Ok(None);
    }
    let Some(param_kinds) = params.iter().map(jit_kind).collect::<Option<Vec<_>>>() else {
        return Ok(None);
    };
    let Some(result_kinds) = results.iter().map(jit_kind).collect::<Option<Vec<_>>>() else {
        return Ok(None);
    };

    let mut lower = Lowering {
        arena,
        interner,
        comp: Comp::new(),
        locals: FxHashMap::default(),
        named: Vec::new(),
    };
    for (param, kind) in func.sig.params.iter().zip(param_kinds) {
        lower.bind(param.name, kind);
    }
    let mut outs = Vec::with_capacity(result_kinds.len());
    for (result, kind) in func.sig.results.iter().zip(result_kinds) {
        outs.push(lower.bind(result.name, kind));
    }
    // Results read before a trailing `return v...` assigns them start at zero.
    let returns_values = body
        .stmts
        .last()
        .is_some_and(|&id| matches!(&arena.stmt(id).kind, StmtKind::Return(values) if !values.is_empty()));
    let named = func.sig.results.iter().any(|r| r.name.is_some());
    if named || !returns_values {
        for &out in &outs {
            lower.comp.assign(&Expr::Const(zero(out.kind())), out)?;
        }
    }

    let last = body.stmts.len().saturating_sub(1);
    for (i, &id) in body.stmts.iter().enumerate() {
        let done = match &arena.stmt(id).kind {
            StmtKind::Return(values) if i == last => lower.ret(values, &outs)?,
            kind => lower.stmt(kind)?,
        };
        if !done {
            tracing::trace!(
                name = interner.lookup(func.name),
                at = i,
                "function not eligible for lowering"
            );
            return Ok(None);
        }
    }
    Ok(Some(lower.finish()))
}

struct Lowering<'a> {
    arena: &'a SyntaxArena,
    interner: &'a StringInterner,
    comp: Comp,
    locals: FxHashMap<Name, SoftReg>,
    /// Every register bound to a name, in allocation order.
    named: Vec<SoftReg>,
}

impl Lowering<'_> {
    fn is_blank(&self, name: Name) -> bool {
        self.interner.lookup(name) == "_"
    }

    /// Allocate a register, binding it to `name` unless blank.
    fn bind(&mut self, name: Option<Name>, kind: gale_jit::Kind) -> SoftReg {
        let reg = self.comp.alloc(kind);
        if let Some(name) = name.filter(|&n| !self.is_blank(n)) {
            self.locals.insert(name, reg);
        }
        self.named.push(reg);
        reg
    }

    fn finish(mut self) -> gale_jit::Code {
        for reg in std::mem::take(&mut self.named) {
            self.comp.free(reg);
        }
        self.comp.finish()
    }

    fn local(&self, id: ExprId) -> Option<SoftReg> {
        match &self.arena.expr(id).kind {
            ExprKind::Ident(name) => self.locals.get(name).copied(),
            ExprKind::Paren(inner) => self.local(*inner),
            _ => None,
        }
    }

    /// Lower one statement; `false` if it is not eligible.
    fn stmt(&mut self, kind: &StmtKind) -> Result<bool, CompileError> {
        match kind {
            StmtKind::Define { names, values } => {
                let ([name], [value]) = (&names[..], &values[..]) else {
                    return Ok(false);
                };
                if self.is_blank(*name) {
                    return Ok(false);
                }
                let reg = match self.locals.get(name) {
                    Some(&reg) => reg,
                    None => {
                        let kind = self.kind_of(*value).unwrap_or(gale_jit::Kind::Int);
                        let Some(e) = self.expr(*value, kind) else {
                            return Ok(false);
                        };
                        let reg = self.bind(Some(*name), kind);
                        self.comp.assign(&e, reg)?;
                        return Ok(true);
                    }
                };
                self.assign(reg, *value)
            }
            StmtKind::Assign { lhs, rhs } => {
                let ([target], [value]) = (&lhs[..], &rhs[..]) else {
                    return Ok(false);
                };
                match self.local(*target) {
                    Some(reg) => self.assign(reg, *value),
                    None => Ok(false),
                }
            }
            StmtKind::OpAssign { op, lhs, rhs } => {
                let (Some(reg), Some(inst)) = (self.local(*lhs), arith_op(*op).and_then(Inst2::from_op))
                else {
                    return Ok(false);
                };
                let kind = if op.is_shift() {
                    self.kind_of(*rhs).unwrap_or(gale_jit::Kind::Uint)
                } else {
                    reg.kind()
                };
                let Some(e) = self.expr(*rhs, kind) else {
                    return Ok(false);
                };
                self.comp.stmt2(inst, &e, reg)?;
                Ok(true)
            }
            StmtKind::IncDec { target, inc } => {
                let Some(reg) = self.local(*target) else {
                    return Ok(false);
                };
                self.comp
                    .stmt1(if *inc { Inst1::Inc } else { Inst1::Dec }, reg)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn assign(&mut self, reg: SoftReg, value: ExprId) -> Result<bool, CompileError> {
        let Some(e) = self.expr(value, reg.kind()) else {
            return Ok(false);
        };
        self.comp.assign(&e, reg)?;
        Ok(true)
    }

    /// Trailing `return`: results are computed into their registers.
    fn ret(&mut self, values: &[ExprId], outs: &[SoftReg]) -> Result<bool, CompileError> {
        if values.is_empty() {
            return Ok(true);
        }
        if values.len() != outs.len() {
            return Ok(false);
        }
        for (&value, &out) in values.iter().zip(outs) {
            if !self.assign(out, value)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Kind an expression has on its own; `None` for untyped constants.
    fn kind_of(&self, id: ExprId) -> Option<gale_jit::Kind> {
        match &self.arena.expr(id).kind {
            ExprKind::Ident(name) => self.locals.get(name).map(|r| r.kind()),
            ExprKind::Paren(inner) | ExprKind::Unary { operand: inner, .. } => self.kind_of(*inner),
            ExprKind::Binary { op, left, right } => {
                if op.is_shift() {
                    self.kind_of(*left)
                } else {
                    self.kind_of(*left).or_else(|| self.kind_of(*right))
                }
            }
            _ => None,
        }
    }

    /// Expression tree of kind `kind`, or `None` if it is not eligible.
    fn expr(&self, id: ExprId, kind: gale_jit::Kind) -> Option<Expr> {
        match &self.arena.expr(id).kind {
            ExprKind::Ident(name) => {
                let reg = self.locals.get(name).copied()?;
                (reg.kind() == kind).then_some(Expr::Reg(reg))
            }
            ExprKind::Int(i) => {
                let c = if kind.is_signed() {
                    Const::int(i64::try_from(*i).ok()?, kind)
                } else {
                    Const::uint(u64::try_from(*i).ok()?, kind)
                };
                Some(Expr::Const(c))
            }
            ExprKind::Paren(inner) => self.expr(*inner, kind),
            ExprKind::Unary { op, operand } => {
                let x = self.expr(*operand, kind)?;
                match op {
                    UnaryOp::Plus => Some(x),
                    UnaryOp::Neg => Some(Expr::unary(Op1::Neg, x)),
                    UnaryOp::BitNot => Some(Expr::unary(Op1::BitNot, x)),
                    UnaryOp::Not => None,
                }
            }
            ExprKind::Binary { op, left, right } => {
                let op2 = arith_op(*op)?;
                let x = self.expr(*left, kind)?;
                let y = if op.is_shift() {
                    let count = self.kind_of(*right).unwrap_or(gale_jit::Kind::Uint);
                    self.expr(*right, count)?
                } else {
                    self.expr(*right, kind)?
                };
                Some(Expr::binary(op2, x, y))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
