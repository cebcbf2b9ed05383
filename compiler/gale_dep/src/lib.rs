//! Gale declaration sorter.
//!
//! Top-level declarations arrive in any order. A [`Scope`] loads them from
//! syntax items, each [`Decl`] lazily collects the names it depends on, and
//! a [`Sorter`] turns the dependency graph into emission batches:
//!
//! - acyclic declarations come out one per batch, dependencies first;
//! - mutually recursive functions, methods and types share a batch, and
//!   types in a cycle get a `TypeForward` declaration ahead of it;
//! - a cycle through a constant or variable is a [`SortError::Cycle`].

mod decl;
mod deps;
mod error;
mod graph;
mod kind;
mod scope;
mod sorter;

pub use decl::{Decl, DeclNode, Extra, OwnedNode};
pub use deps::DepSet;
pub use error::SortError;
pub use kind::Kind;
pub use scope::Scope;
pub use sorter::{Batch, Sorter};
