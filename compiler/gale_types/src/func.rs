//! Function-shaped types: signature accessors and universe selection.
//!
//! Accessors fail with [`TypeError::NotFunc`] on non-function types instead
//! of returning a meaningless default.

use crate::data::{Signature, TypeData};
use crate::error::TypeError;
use crate::universe::Universe;
use crate::Type;

impl Type {
    fn with_signature<R>(
        &self,
        op: &'static str,
        f: impl FnOnce(&Signature) -> Result<R, TypeError>,
    ) -> Result<R, TypeError> {
        match self.underlying().data() {
            TypeData::Func(sig) => f(sig),
            _ => Err(TypeError::not_func(op, self)),
        }
    }

    /// Declared parameter count; a method's receiver is not counted.
    pub fn num_in(&self) -> Result<usize, TypeError> {
        self.with_signature("NumIn", |sig| Ok(sig.params.len()))
    }

    /// Declared parameter `i`.
    ///
    /// In the runtime descriptor a method's parameters start after the
    /// receiver, so parameter `i` sits at runtime position `i + 1`.
    pub fn in_(&self, i: usize) -> Result<Type, TypeError> {
        self.with_signature("In", |sig| {
            let declared = sig
                .params
                .get(i)
                .ok_or_else(|| TypeError::index_out_of_range("In", i, sig.params.len()))?;
            let shift = usize::from(sig.recv.is_some());
            debug_assert!(self
                .rtype()
                .in_(i + shift)
                .is_some_and(|rt| rt == declared.rtype()));
            Ok(declared.clone())
        })
    }

    pub fn num_out(&self) -> Result<usize, TypeError> {
        self.with_signature("NumOut", |sig| Ok(sig.results.len()))
    }

    pub fn out(&self, i: usize) -> Result<Type, TypeError> {
        self.with_signature("Out", |sig| {
            sig.results
                .get(i)
                .cloned()
                .ok_or_else(|| TypeError::index_out_of_range("Out", i, sig.results.len()))
        })
    }

    /// Receiver of a method type; `None` for plain functions.
    pub fn recv(&self) -> Result<Option<Type>, TypeError> {
        self.with_signature("Recv", |sig| Ok(sig.recv.clone()))
    }

    pub fn is_variadic(&self) -> Result<bool, TypeError> {
        self.with_signature("IsVariadic", |sig| Ok(sig.variadic))
    }

    pub fn is_method(&self) -> Result<bool, TypeError> {
        self.with_signature("IsMethod", |sig| Ok(sig.recv.is_some()))
    }
}

/// Universe that should own a type built from these components: the
/// receiver's, else the first input's, else the first output's, else
/// `default`.
pub fn owning_universe(
    default: &Universe,
    recv: Option<&Type>,
    ins: &[Type],
    outs: &[Type],
) -> Universe {
    recv.into_iter()
        .chain(ins.first())
        .chain(outs.first())
        .find_map(Type::universe)
        .unwrap_or_else(|| default.clone())
}

/// [`Universe::func_of`] on the universe owning the parameter types.
pub fn func_of(
    default: &Universe,
    ins: Vec<Type>,
    outs: Vec<Type>,
    variadic: bool,
) -> Result<Type, TypeError> {
    owning_universe(default, None, &ins, &outs).func_of(ins, outs, variadic)
}

/// [`Universe::method_of`] on the universe owning the receiver or parameter types.
pub fn method_of(
    default: &Universe,
    recv: Type,
    ins: Vec<Type>,
    outs: Vec<Type>,
    variadic: bool,
) -> Result<Type, TypeError> {
    owning_universe(default, Some(&recv), &ins, &outs).method_of(recv, ins, outs, variadic)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
