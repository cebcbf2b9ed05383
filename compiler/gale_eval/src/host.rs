//! Host functions and packages.
//!
//! Embedders expose native functionality to compiled programs by
//! registering [`HostFunc`]s, either as predeclared globals or grouped into
//! a [`HostPackage`] that an `import` resolves to by path.
//!
//! The `fmt` package is provided here; its output goes through a
//! [`PrintHandler`] so tests can capture what a program prints.

use std::sync::Arc;

use gale_types::{Type, Universe};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::errors::{host_error, CompileError, EvalError};
use crate::value::{FuncValue, Value};

/// Native function with its static type.
#[derive(Clone)]
pub struct HostFunc {
    name: Arc<str>,
    ty: Type,
    func: FuncValue,
}

impl HostFunc {
    /// `ty` must be a function type. Variadic functions receive their
    /// trailing arguments packed into one slice, like compiled functions.
    pub fn new(
        name: &str,
        ty: Type,
        call: impl Fn(&[Value]) -> Result<Vec<Value>, EvalError> + Send + Sync + 'static,
    ) -> Self {
        HostFunc {
            name: Arc::from(name),
            ty,
            func: FuncValue::new(name, call),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// The function as a first-class value.
    pub fn value(&self) -> Value {
        Value::Func(self.func.clone())
    }
}

impl std::fmt::Debug for HostFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HostFunc({}: {})", self.name, self.ty)
    }
}

/// Importable set of host functions.
#[derive(Clone, Debug)]
pub struct HostPackage {
    path: Arc<str>,
    members: FxHashMap<Arc<str>, HostFunc>,
}

impl HostPackage {
    pub fn new(path: &str) -> Self {
        HostPackage {
            path: Arc::from(path),
            members: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn with_func(mut self, func: HostFunc) -> Self {
        self.add(func);
        self
    }

    /// Add `func`, replacing a member of the same name.
    pub fn add(&mut self, func: HostFunc) {
        self.members.insert(Arc::clone(&func.name), func);
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<&HostFunc> {
        self.members.get(name)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Host registrations visible to one compilation.
#[derive(Clone, Debug, Default)]
pub struct Hosts {
    packages: FxHashMap<Arc<str>, Arc<HostPackage>>,
    globals: FxHashMap<Arc<str>, HostFunc>,
}

impl Hosts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `package` importable by its path.
    pub fn register_package(&mut self, package: HostPackage) {
        tracing::debug!(path = package.path(), members = package.len(), "registered host package");
        self.packages
            .insert(Arc::clone(&package.path), Arc::new(package));
    }

    /// Predeclare `func` in every compiled scope.
    pub fn register_func(&mut self, func: HostFunc) {
        self.globals.insert(Arc::clone(&func.name), func);
    }

    pub fn package(&self, path: &str) -> Option<&Arc<HostPackage>> {
        self.packages.get(path)
    }

    pub fn func(&self, name: &str) -> Option<&HostFunc> {
        self.globals.get(name)
    }
}

// ── Printing ────────────────────────────────────────────────────────

/// Destination of `fmt` output.
#[derive(Clone, Default)]
pub enum PrintHandler {
    /// Write to the process's stdout.
    #[default]
    Stdout,
    /// Append to a shared buffer.
    Buffer(Arc<Mutex<String>>),
}

impl PrintHandler {
    /// A handler capturing into a fresh buffer.
    pub fn buffer() -> Self {
        PrintHandler::Buffer(Arc::default())
    }

    pub fn print(&self, msg: &str) {
        match self {
            PrintHandler::Stdout => print!("{msg}"),
            PrintHandler::Buffer(buf) => buf.lock().push_str(msg),
        }
    }

    /// Everything captured so far; empty for stdout.
    pub fn output(&self) -> String {
        match self {
            PrintHandler::Stdout => String::new(),
            PrintHandler::Buffer(buf) => buf.lock().clone(),
        }
    }

    pub fn clear(&self) {
        if let PrintHandler::Buffer(buf) = self {
            buf.lock().clear();
        }
    }
}

/// Operands of a variadic call, packed by the caller.
fn variadic_args(args: &[Value]) -> Vec<Value> {
    match args.first() {
        Some(Value::Slice(s)) => s.to_vec(),
        Some(Value::Nil) | None => Vec::new(),
        Some(other) => vec![other.clone()],
    }
}

/// `Sprint` formatting: a space between operands when neither is a string.
fn sprint(values: &[Value]) -> String {
    let mut out = String::new();
    for (i, v) in values.iter().enumerate() {
        if i > 0 && !matches!(v, Value::Str(_)) && !matches!(values[i - 1], Value::Str(_)) {
            out.push(' ');
        }
        out.push_str(&v.to_string());
    }
    out
}

/// `Sprintln` formatting: operands always separated by spaces.
fn sprintln(values: &[Value]) -> String {
    let mut out = values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    out.push('\n');
    out
}

/// The `fmt` package: `Print`, `Println`, `Sprint` and `Sprintln`.
pub fn fmt_package(universe: &Universe, print: &PrintHandler) -> Result<HostPackage, CompileError> {
    let any = universe.interface_of(Vec::new())?;
    let anys = universe.slice_of(any);
    let string = universe.basic(gale_types::Kind::String);
    let printer = universe.func_of(vec![anys.clone()], Vec::new(), true)?;
    let formatter = universe.func_of(vec![anys], vec![string], true)?;

    let (p1, p2) = (print.clone(), print.clone());
    Ok(HostPackage::new("fmt")
        .with_func(HostFunc::new("Print", printer.clone(), move |args| {
            p1.print(&sprint(&variadic_args(args)));
            Ok(Vec::new())
        }))
        .with_func(HostFunc::new("Println", printer, move |args| {
            p2.print(&sprintln(&variadic_args(args)));
            Ok(Vec::new())
        }))
        .with_func(HostFunc::new("Sprint", formatter.clone(), |args| {
            Ok(vec![Value::str(&sprint(&variadic_args(args)))])
        }))
        .with_func(HostFunc::new("Sprintln", formatter, |args| {
            Ok(vec![Value::str(&sprintln(&variadic_args(args)))])
        })))
}

/// `panic(v interface{})`: aborts execution with `panic: v`.
pub fn panic_func(universe: &Universe) -> Result<HostFunc, CompileError> {
    let any = universe.interface_of(Vec::new())?;
    let ty = universe.func_of(vec![any], Vec::new(), false)?;
    Ok(HostFunc::new("panic", ty, |args| {
        let msg = args.first().map(ToString::to_string).unwrap_or_default();
        Err(host_error(format!("panic: {msg}")))
    }))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
