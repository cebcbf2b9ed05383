//! Gale runtime type bridge.
//!
//! Every type the compiler touches has two faces kept in lockstep:
//! - a static [`Type`] (structural [`TypeData`]) used while compiling;
//! - a runtime [`RType`] descriptor (kind, layout, flat parameter lists)
//!   used by executing code and native lowering.
//!
//! A [`Universe`] constructs and caches both. Function and method types are
//! built with [`func_of`] / [`method_of`], which pick the owning universe
//! from the component types.

mod data;
mod error;
mod flags;
mod func;
mod kind;
mod rtype;
mod ty;
mod universe;

pub use data::{Field, Method, NamedRef, NamedType, Signature, TypeData};
pub use error::TypeError;
pub use flags::TypeFlags;
pub use func::{func_of, method_of, owning_universe};
pub use kind::{Category, Kind};
pub use rtype::{RField, RType};
pub use ty::Type;
pub use universe::Universe;
