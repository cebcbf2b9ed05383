//! Gale core driver.
//!
//! A [`Session`] owns what outlives one compilation: the type universe, the
//! registered host functions and packages, the `fmt` output handler and the
//! compile options. [`Session::compile`] turns a loaded [`Scope`] into a
//! [`Program`], which runs package initialization and entry points.
//!
//! ```text
//! let session = Session::new()?;
//! let program = session.load(interner, arena, &items)?;
//! program.run_main()?;
//! ```

use std::sync::Once;

use gale_dep::Scope;
use gale_eval::{
    compile, fmt_package, panic_func, CompileError, CompileOptions, EvalError, HostFunc,
    HostPackage, Hosts, Package, PrintHandler, Value,
};
use gale_ir::{Item, SharedArena, SharedInterner};
use gale_types::Universe;

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once; only the first call has an effect, and only
/// when `RUST_LOG` is set. Enable with `RUST_LOG=gale_eval=debug` or
/// `RUST_LOG=gale_dep=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}

/// Compilation context shared by every program it produces.
pub struct Session {
    universe: Universe,
    hosts: Hosts,
    print: PrintHandler,
    options: CompileOptions,
}

impl Session {
    /// A session printing to stdout, with `fmt` and `panic` registered.
    pub fn new() -> Result<Self, CompileError> {
        Self::with_print(PrintHandler::Stdout)
    }

    /// A session whose `fmt` output goes to `print`.
    pub fn with_print(print: PrintHandler) -> Result<Self, CompileError> {
        let universe = Universe::new();
        let mut hosts = Hosts::new();
        hosts.register_package(fmt_package(&universe, &print)?);
        hosts.register_func(panic_func(&universe)?);
        Ok(Session {
            universe,
            hosts,
            print,
            options: CompileOptions::default(),
        })
    }

    #[must_use]
    pub fn options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// The universe host function types must be built in.
    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Provide the body of a function declared without one.
    pub fn register_func(&mut self, func: HostFunc) {
        self.hosts.register_func(func);
    }

    /// Make `package` importable by its path.
    pub fn register_package(&mut self, package: HostPackage) {
        self.hosts.register_package(package);
    }

    /// Compile every declaration of `scope`.
    pub fn compile(&self, scope: &Scope) -> Result<Program, CompileError> {
        tracing::debug!(decls = scope.len(), "compiling scope");
        let package = compile(scope, &self.universe, &self.hosts, &self.options)?;
        Ok(Program {
            package,
            print: self.print.clone(),
        })
    }

    /// Load `items` into a fresh scope and compile it.
    pub fn load(
        &self,
        interner: SharedInterner,
        arena: SharedArena,
        items: &[Item],
    ) -> Result<Program, CompileError> {
        let mut scope = Scope::new(interner, arena);
        scope.load_all(items)?;
        self.compile(&scope)
    }
}

/// A compiled package ready to run.
pub struct Program {
    package: Package,
    print: PrintHandler,
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program").finish_non_exhaustive()
    }
}

impl Program {
    /// Initialize globals in dependency order, then run the `init` functions.
    pub fn run_init(&self) -> Result<(), EvalError> {
        self.package.run_init()
    }

    /// Initialize the package and call `main`.
    pub fn run_main(&self) -> Result<Vec<Value>, EvalError> {
        self.run_init()?;
        tracing::debug!("running main");
        self.call("main", &[])
    }

    /// Call a top-level function, or a method as `Type.Method`.
    ///
    /// Does not initialize the package.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Vec<Value>, EvalError> {
        self.package.call(name, args)
    }

    pub fn var(&self, name: &str) -> Option<Value> {
        self.package.var(name)
    }

    /// Soft-register code of `name`, if it was lowered.
    pub fn lowered(&self, name: &str) -> Option<&gale_jit::Code> {
        self.package.lowered(name)
    }

    pub fn lowered_names(&self) -> impl Iterator<Item = &str> {
        self.package.lowered_names()
    }

    /// `fmt` output captured so far; empty when printing to stdout.
    pub fn output(&self) -> String {
        self.print.output()
    }

    pub fn package(&self) -> &Package {
        &self.package
    }
}
