//! Gale threaded-closure compiler.
//!
//! Sorted declarations are compiled into trees of closures. Each statement
//! becomes a [`Stmt`] closure returning the next step; each expression
//! becomes a [`Fun`] specialized by the category of its static type, so
//! the hot path never dispatches on a type tag. A compiled body runs on an
//! [`Env`] of value slots chained to its lexically enclosing environments.
//!
//! Functions whose bodies use only integer registers can additionally be
//! lowered to soft-register code (see [`gale_jit`]); the lowered stream is
//! attached to the [`Package`] and never replaces the threaded code.
//!
//! # Entry point
//!
//! ```text
//! let scope = Scope::new(interner, arena).load(&items)?;
//! let package = compile(&scope, &universe, &hosts, &CompileOptions::default())?;
//! package.run_init()?;
//! package.call("main", &[])?;
//! ```

mod compile;
mod constant;
mod env;
mod errors;
mod fun;
mod host;
mod lower;
mod operators;
mod options;
mod place;
mod stack;
mod value;

pub use compile::{compile, Binding, Package};
pub use constant::Constant;
pub use env::{run, stmt, Code, Env, Label, Step, Stmt};
pub use errors::{CompileError, CompileErrorKind, EvalError, EvalErrorKind};
pub use fun::{fun, ExprFun, Fun};
pub use host::{fmt_package, panic_func, HostFunc, HostPackage, Hosts, PrintHandler};
pub use lower::lower_func;
pub use options::CompileOptions;
pub use place::{set_place_const, set_place_expr, set_place_op, Place, Target};
pub use value::{zero_value, CallFn, FuncValue, MapKey, MapValue, SliceValue, StructValue, Value};
