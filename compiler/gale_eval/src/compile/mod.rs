//! Compilation of a sorted scope into threaded code.
//!
//! The [`Sorter`] hands out declarations dependencies first. Each batch is
//! compiled in two passes: types and function signatures, then bodies and
//! initializers. Global variables and functions live in the slots of one
//! globals [`Env`]; every compiled body runs in an environment whose
//! outermost ancestor is that globals environment, so a name resolves at
//! compile time to a `(depth, slot)` pair.
//!
//! # Modules
//!
//! - `decl`: top-level declarations
//! - `types`: type expressions and signatures
//! - `expr`: expressions, specialized by category
//! - `call`: calls, builtins, conversions and function values
//! - `stmt`: statements and assignment targets

mod call;
mod decl;
mod expr;
mod stmt;
mod types;

use std::sync::Arc;

use gale_dep::{Scope, Sorter};
use gale_ir::{Name, SharedArena, SharedInterner};
use gale_types::{Kind, Type, Universe};
use rustc_hash::FxHashMap;

use crate::constant::Constant;
use crate::env::{run, Code, Env, Label, Stmt};
use crate::errors::{nil_func_call, undefined, CompileError, EvalError};
use crate::fun::{ExprFun, Fun};
use crate::host::{HostFunc, HostPackage, Hosts};
use crate::options::CompileOptions;
use crate::value::Value;

/// Compile every declaration of `scope`.
///
/// Declarations are compiled in the order the sorter emits them; the first
/// error aborts compilation.
pub fn compile(
    scope: &Scope,
    universe: &Universe,
    hosts: &Hosts,
    options: &CompileOptions,
) -> Result<Package, CompileError> {
    let mut compiler = Compiler::new(scope, universe, hosts, options);
    let mut sorter = Sorter::new(scope)?;
    while let Some(batch) = sorter.some() {
        compiler.batch(&batch)?;
    }
    Ok(compiler.finish())
}

// ── Output ──────────────────────────────────────────────────────────

/// Global slot of a named function or variable.
#[derive(Clone, Debug)]
pub struct Binding {
    pub slot: usize,
    pub ty: Type,
}

/// A compiled scope: globals, initialization code and entry points.
///
/// Methods are callable as `Type.Method` with the receiver as the first
/// argument.
pub struct Package {
    globals: Arc<Env>,
    init: Arc<Code>,
    init_slots: usize,
    init_funcs: Vec<usize>,
    funcs: FxHashMap<Arc<str>, Binding>,
    vars: FxHashMap<Arc<str>, Binding>,
    lowered: Vec<(Arc<str>, gale_jit::Code)>,
}

impl Package {
    /// Run variable initializers in dependency order, then `init` functions
    /// in declaration order.
    pub fn run_init(&self) -> Result<(), EvalError> {
        tracing::debug!(stmts = self.init.len(), funcs = self.init_funcs.len(), "running package init");
        let env = Env::new(
            Arc::clone(&self.init),
            self.init_slots,
            Some(Arc::clone(&self.globals)),
            &[],
        );
        run(&env)?;
        for &slot in &self.init_funcs {
            call_value(&self.globals.get(slot), &[])?;
        }
        Ok(())
    }

    /// Call the top-level function or method `name`.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Vec<Value>, EvalError> {
        let binding = self
            .funcs
            .get(name)
            .ok_or_else(|| EvalError::new(format!("undefined function {name}")))?;
        call_value(&self.globals.get(binding.slot), args)
    }

    /// Current value of the global variable `name`.
    pub fn var(&self, name: &str) -> Option<Value> {
        self.vars.get(name).map(|b| self.globals.get(b.slot))
    }

    pub fn func(&self, name: &str) -> Option<&Binding> {
        self.funcs.get(name)
    }

    /// Soft-register code of `name`, if it was lowered.
    pub fn lowered(&self, name: &str) -> Option<&gale_jit::Code> {
        self.lowered
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, code)| code)
    }

    /// Names of the lowered functions, in compilation order.
    pub fn lowered_names(&self) -> impl Iterator<Item = &str> {
        self.lowered.iter().map(|(n, _)| &**n)
    }

    pub fn globals(&self) -> &Arc<Env> {
        &self.globals
    }
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("globals", &self.globals.num_slots())
            .field("init", &self.init)
            .field("funcs", &self.funcs.len())
            .field("vars", &self.vars.len())
            .field("lowered", &self.lowered.len())
            .finish()
    }
}

fn call_value(value: &Value, args: &[Value]) -> Result<Vec<Value>, EvalError> {
    match value {
        Value::Func(f) => f.call(args),
        _ => Err(nil_func_call()),
    }
}

// ── Compile-time state ──────────────────────────────────────────────

/// Predeclared functions with special call rules.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Builtin {
    Len,
    Cap,
    Make,
    Append,
    Delete,
}

impl Builtin {
    fn from_name(name: &str) -> Option<Builtin> {
        Some(match name {
            "len" => Builtin::Len,
            "cap" => Builtin::Cap,
            "make" => Builtin::Make,
            "append" => Builtin::Append,
            "delete" => Builtin::Delete,
            _ => return None,
        })
    }

    fn name(self) -> &'static str {
        match self {
            Builtin::Len => "len",
            Builtin::Cap => "cap",
            Builtin::Make => "make",
            Builtin::Append => "append",
            Builtin::Delete => "delete",
        }
    }
}

/// Package-level binding of a name.
#[derive(Clone)]
pub(crate) enum Global {
    Var(Binding),
    Func(Binding),
    Const { value: Constant, ty: Option<Type> },
    Type(Type),
    Package(Arc<HostPackage>),
}

/// What an identifier denotes.
pub(crate) enum Resolved {
    /// Variable `depth` environments out.
    Var { depth: usize, slot: usize, ty: Type },
    /// Top-level function, stored in a global slot.
    Func { depth: usize, slot: usize, ty: Type },
    Const { value: Constant, ty: Option<Type> },
    Type(Type),
    Package(Arc<HostPackage>),
    Host(HostFunc),
    Builtin(Builtin),
}

/// Compiled expression.
pub(crate) enum Operand {
    /// Compile-time constant; `ty` is `None` while untyped.
    Const { value: Constant, ty: Option<Type> },
    Value { fun: ExprFun, ty: Type },
    /// Call yielding any number of results.
    Multi { fun: Fun<Vec<Value>>, tys: Vec<Type> },
}

#[derive(Clone)]
pub(crate) struct Local {
    pub slot: usize,
    pub ty: Type,
}

pub(crate) struct Loop {
    pub brk: Label,
    pub cont: Label,
}

/// Compilation state of one body: a function, closure or the package
/// initializer.
#[derive(Default)]
pub(crate) struct Frame {
    blocks: Vec<FxHashMap<Name, Local>>,
    nslots: usize,
    code: Vec<Stmt>,
    loops: Vec<Loop>,
    results: Vec<Type>,
    /// Slots of named results, returned by a bare `return`.
    named_results: Option<Vec<usize>>,
}

impl Frame {
    fn new() -> Self {
        Frame {
            blocks: vec![FxHashMap::default()],
            ..Frame::default()
        }
    }

    fn alloc(&mut self) -> usize {
        let slot = self.nslots;
        self.nslots += 1;
        slot
    }

    fn declare(&mut self, name: Name, ty: Type) -> usize {
        let slot = self.alloc();
        if let Some(block) = self.blocks.last_mut() {
            block.insert(name, Local { slot, ty });
        }
        slot
    }

    fn lookup(&self, name: Name) -> Option<&Local> {
        self.blocks.iter().rev().find_map(|b| b.get(&name))
    }

    /// Binding of `name` in the innermost block only.
    fn lookup_innermost(&self, name: Name) -> Option<&Local> {
        self.blocks.last().and_then(|b| b.get(&name))
    }

    fn pc(&self) -> usize {
        self.code.len()
    }
}

pub(crate) struct Compiler<'a> {
    universe: Universe,
    interner: SharedInterner,
    arena: SharedArena,
    hosts: &'a Hosts,
    options: CompileOptions,
    globals: Arc<Env>,
    names: FxHashMap<Name, Global>,
    /// Methods by receiver base type id and method name.
    methods: FxHashMap<(u64, Name), Binding>,
    /// Global slots of functions and methods by declaration name.
    func_slots: FxHashMap<Name, Binding>,
    /// Body being compiled; the package initializer at top level.
    frame: Frame,
    /// Lexically enclosing bodies of a function literal, innermost last.
    enclosing: Vec<Frame>,
    init_funcs: Vec<usize>,
    funcs: FxHashMap<Arc<str>, Binding>,
    vars: FxHashMap<Arc<str>, Binding>,
    lowered: Vec<(Arc<str>, gale_jit::Code)>,
    iota: Option<u32>,
}

impl<'a> Compiler<'a> {
    pub(crate) fn new(
        scope: &Scope,
        universe: &Universe,
        hosts: &'a Hosts,
        options: &CompileOptions,
    ) -> Self {
        Compiler {
            universe: universe.clone(),
            interner: scope.interner().clone(),
            arena: scope.arena().clone(),
            hosts,
            options: options.clone(),
            globals: Env::new(Arc::default(), 0, None, &[]),
            names: FxHashMap::default(),
            methods: FxHashMap::default(),
            func_slots: FxHashMap::default(),
            frame: Frame::new(),
            enclosing: Vec::new(),
            init_funcs: Vec::new(),
            funcs: FxHashMap::default(),
            vars: FxHashMap::default(),
            lowered: Vec::new(),
            iota: None,
        }
    }

    pub(crate) fn finish(self) -> Package {
        if self.options.lowers_native() && self.lowered.is_empty() && !self.funcs.is_empty() {
            tracing::warn!("native lowering requested but no function was eligible");
        }
        if self.options.traces_code() {
            tracing::trace!(
                stmts = self.frame.code.len(),
                slots = self.frame.nslots,
                "package init code"
            );
        }
        Package {
            globals: self.globals,
            init: Arc::new(Code::new(self.frame.code)),
            init_slots: self.frame.nslots,
            init_funcs: self.init_funcs,
            funcs: self.funcs,
            vars: self.vars,
            lowered: self.lowered,
        }
    }

    fn name_str(&self, name: Name) -> &'static str {
        self.interner.lookup(name)
    }

    fn basic(&self, kind: Kind) -> Type {
        self.universe.basic(kind)
    }

    // ── Frames ──────────────────────────────────────────────────────

    fn emit(&mut self, stmt: Stmt) {
        self.frame.code.push(stmt);
    }

    fn push_block(&mut self) {
        self.frame.blocks.push(FxHashMap::default());
    }

    fn pop_block(&mut self) {
        self.frame.blocks.pop();
    }

    /// Compile `f` into a fresh frame and return it.
    ///
    /// A nested frame (function literal) sees the current frames' locals;
    /// a top-level function body sees only globals.
    fn with_frame<R>(
        &mut self,
        nested: bool,
        f: impl FnOnce(&mut Self) -> Result<R, CompileError>,
    ) -> Result<(R, Frame), CompileError> {
        let outer = std::mem::replace(&mut self.frame, Frame::new());
        let saved = if nested {
            self.enclosing.push(outer);
            None
        } else {
            Some((outer, std::mem::take(&mut self.enclosing)))
        };
        let result = f(self);
        let inner = match saved {
            None => {
                let outer = self.enclosing.pop().unwrap_or_default();
                std::mem::replace(&mut self.frame, outer)
            }
            Some((outer, enclosing)) => {
                self.enclosing = enclosing;
                std::mem::replace(&mut self.frame, outer)
            }
        };
        result.map(|r| (r, inner))
    }

    /// Depth of the globals environment from the current body.
    fn globals_depth(&self) -> usize {
        self.enclosing.len() + 1
    }

    // ── Name resolution ─────────────────────────────────────────────

    pub(crate) fn resolve(&self, name: Name) -> Option<Resolved> {
        let frames = std::iter::once(&self.frame).chain(self.enclosing.iter().rev());
        for (depth, frame) in frames.enumerate() {
            if let Some(local) = frame.lookup(name) {
                return Some(Resolved::Var {
                    depth,
                    slot: local.slot,
                    ty: local.ty.clone(),
                });
            }
        }
        if let Some(global) = self.names.get(&name) {
            let depth = self.globals_depth();
            return Some(match global {
                Global::Var(b) => Resolved::Var {
                    depth,
                    slot: b.slot,
                    ty: b.ty.clone(),
                },
                Global::Func(b) => Resolved::Func {
                    depth,
                    slot: b.slot,
                    ty: b.ty.clone(),
                },
                Global::Const { value, ty } => Resolved::Const {
                    value: value.clone(),
                    ty: ty.clone(),
                },
                Global::Type(ty) => Resolved::Type(ty.clone()),
                Global::Package(pkg) => Resolved::Package(Arc::clone(pkg)),
            });
        }
        self.predeclared(self.name_str(name))
    }

    fn predeclared(&self, name: &str) -> Option<Resolved> {
        match name {
            "true" | "false" => {
                return Some(Resolved::Const {
                    value: Constant::Bool(name == "true"),
                    ty: None,
                })
            }
            "nil" => {
                return Some(Resolved::Const {
                    value: Constant::Nil,
                    ty: None,
                })
            }
            "iota" => {
                if let Some(iota) = self.iota {
                    return Some(Resolved::Const {
                        value: Constant::Int(iota.into()),
                        ty: None,
                    });
                }
            }
            "any" => return self.universe.interface_of(Vec::new()).ok().map(Resolved::Type),
            _ => {}
        }
        if let Some(func) = self.hosts.func(name) {
            return Some(Resolved::Host(func.clone()));
        }
        if let Some(builtin) = Builtin::from_name(name) {
            return Some(Resolved::Builtin(builtin));
        }
        self.universe.lookup_basic(name).map(Resolved::Type)
    }

    fn resolve_or_err(&self, name: Name) -> Result<Resolved, CompileError> {
        self.resolve(name)
            .ok_or_else(|| undefined(self.name_str(name)))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
