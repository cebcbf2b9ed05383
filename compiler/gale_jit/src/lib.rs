//! Virtual-register code buffer.
//!
//! Compiled bodies selected for native lowering are re-emitted here as a
//! flat stream of [`AsmCode`] tokens over soft registers. The stream holds
//! only op codes and lowered operands; a downstream allocator replays it
//! (see [`Code::decode`]) to map soft registers onto machine registers.
//!
//! # Layers
//!
//! - [`Code`]: the append-only token buffer with peephole elision of
//!   `NOP` and self-assignment.
//! - [`Comp`]: lowers [`Expr`] trees into a [`Code`], allocating and
//!   freeing temporaries as it goes.

mod code;
mod comp;
mod error;
mod expr;
mod kind;
mod op;
mod reg;

pub use code::{asm_arg, AsmCode, Code, Instr, Operand};
pub use comp::{Comp, Lowered};
pub use error::JitError;
pub use expr::{Const, Expr, Expr1, Expr2};
pub use kind::Kind;
pub use op::{Inst1, Inst2, Op1, Op2, RegOp};
pub use reg::{SoftReg, SoftRegId};
