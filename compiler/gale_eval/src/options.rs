//! Compiler configuration.

/// Options for one compilation.
///
/// Built with consuming setters:
///
/// ```
/// use gale_eval::CompileOptions;
///
/// let options = CompileOptions::default()
///     .lower_native(true)
///     .max_call_depth(Some(256));
/// assert!(options.lowers_native());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileOptions {
    lower_native: bool,
    max_call_depth: Option<usize>,
    trace_code: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            lower_native: false,
            max_call_depth: Some(10_000),
            trace_code: false,
        }
    }
}

impl CompileOptions {
    /// Re-emit eligible function bodies into soft-register code.
    #[must_use]
    pub fn lower_native(mut self, on: bool) -> Self {
        self.lower_native = on;
        self
    }

    /// Limit on nested calls at run time; `None` disables the check.
    #[must_use]
    pub fn max_call_depth(mut self, limit: Option<usize>) -> Self {
        self.max_call_depth = limit;
        self
    }

    /// Log each compiled statement list at `trace` level.
    #[must_use]
    pub fn trace_code(mut self, on: bool) -> Self {
        self.trace_code = on;
        self
    }

    pub fn lowers_native(&self) -> bool {
        self.lower_native
    }

    pub fn call_depth_limit(&self) -> Option<usize> {
        self.max_call_depth
    }

    pub fn traces_code(&self) -> bool {
        self.trace_code
    }
}
