//! Activation records and the threaded-code trampoline.
//!
//! A compiled body is a [`Code`] buffer of [`Stmt`] closures. Executing a
//! statement returns the next step: the statement to run and the
//! environment to run it in, or [`Step::Stop`]. [`run`] loops over the
//! steps, so control flow never grows the native stack.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};

use crate::errors::EvalError;
use crate::value::Value;

/// One compiled statement.
pub type Stmt = Arc<dyn Fn(&Arc<Env>) -> Result<Step, EvalError> + Send + Sync>;

/// Wrap a closure as a [`Stmt`].
#[inline]
pub fn stmt<F>(f: F) -> Stmt
where
    F: Fn(&Arc<Env>) -> Result<Step, EvalError> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub enum Step {
    Next(Stmt, Arc<Env>),
    Stop,
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Next(_, env) => write!(f, "Next(ip = {})", env.ip()),
            Step::Stop => f.write_str("Stop"),
        }
    }
}

/// Immutable statement list of one body.
#[derive(Default)]
pub struct Code {
    stmts: Vec<Stmt>,
}

impl Code {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Code { stmts }
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    #[inline]
    fn get(&self, ip: usize) -> Option<&Stmt> {
        self.stmts.get(ip)
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Code({} stmts)", self.stmts.len())
    }
}

/// Jump target whose position is fixed after the jump is compiled.
#[derive(Clone, Default, Debug)]
pub struct Label(Arc<OnceLock<usize>>);

impl Label {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the label to `ip`. Rebinding is ignored.
    pub fn bind(&self, ip: usize) {
        // First binding wins; labels are bound once by construction.
        let _ = self.0.set(ip);
    }

    /// Bound position; an unbound label points past the end of any body.
    #[inline]
    pub fn target(&self) -> usize {
        self.0.get().copied().unwrap_or(usize::MAX)
    }
}

/// Runtime activation record.
pub struct Env {
    slots: RwLock<Vec<Value>>,
    outer: Option<Arc<Env>>,
    code: Arc<Code>,
    ip: AtomicUsize,
    results: Mutex<Vec<Value>>,
}

impl Env {
    /// Environment for a body with `nslots` slots; the first slots are
    /// initialized from `args`, the rest are `nil` until declared.
    pub fn new(code: Arc<Code>, nslots: usize, outer: Option<Arc<Env>>, args: &[Value]) -> Arc<Env> {
        let mut slots = Vec::with_capacity(nslots.max(args.len()));
        slots.extend_from_slice(args);
        slots.resize(nslots.max(args.len()), Value::Nil);
        Arc::new(Env {
            slots: RwLock::new(slots),
            outer,
            code,
            ip: AtomicUsize::new(0),
            results: Mutex::new(Vec::new()),
        })
    }

    pub fn outer(&self) -> Option<&Arc<Env>> {
        self.outer.as_ref()
    }

    pub fn ip(&self) -> usize {
        self.ip.load(Ordering::Relaxed)
    }

    /// The environment `depth` levels out (`0` is `self`).
    pub fn ancestor(self: &Arc<Self>, depth: usize) -> Result<Arc<Env>, EvalError> {
        let mut env = self;
        for _ in 0..depth {
            env = env
                .outer
                .as_ref()
                .ok_or_else(|| EvalError::new(format!("no enclosing environment at depth {depth}")))?;
        }
        Ok(Arc::clone(env))
    }

    pub fn get(&self, slot: usize) -> Value {
        self.slots.read().get(slot).cloned().unwrap_or(Value::Nil)
    }

    pub fn set(&self, slot: usize, value: Value) {
        let mut slots = self.slots.write();
        if slot >= slots.len() {
            slots.resize(slot + 1, Value::Nil);
        }
        slots[slot] = value;
    }

    /// Append a slot, returning its index.
    pub fn push_slot(&self, value: Value) -> usize {
        let mut slots = self.slots.write();
        slots.push(value);
        slots.len() - 1
    }

    pub fn num_slots(&self) -> usize {
        self.slots.read().len()
    }

    pub fn set_results(&self, values: Vec<Value>) {
        *self.results.lock() = values;
    }

    pub fn take_results(&self) -> Vec<Value> {
        std::mem::take(&mut *self.results.lock())
    }

    fn step_at(self: &Arc<Self>, ip: usize) -> Step {
        self.ip.store(ip, Ordering::Relaxed);
        match self.code.get(ip) {
            Some(stmt) => Step::Next(Arc::clone(stmt), Arc::clone(self)),
            None => Step::Stop,
        }
    }

    /// First statement of the body.
    pub fn start(self: &Arc<Self>) -> Step {
        self.step_at(0)
    }

    /// Move to the following statement.
    #[inline]
    pub fn advance(self: &Arc<Self>) -> Step {
        let ip = self.ip.load(Ordering::Relaxed).saturating_add(1);
        self.step_at(ip)
    }

    #[inline]
    pub fn jump(self: &Arc<Self>, label: &Label) -> Step {
        self.step_at(label.target())
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("slots", &self.slots.read().len())
            .field("ip", &self.ip())
            .field("code", &self.code)
            .finish_non_exhaustive()
    }
}

/// Execute `env`'s body from the start until a statement stops.
pub fn run(env: &Arc<Env>) -> Result<(), EvalError> {
    let mut step = env.start();
    while let Step::Next(stmt, env) = step {
        step = stmt(&env)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
