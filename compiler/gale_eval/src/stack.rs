//! Stack safety for nested calls.
//!
//! Compiled code recurses on the native stack once per call, so deep
//! recursion in user programs both grows the stack (via `stacker`) and
//! counts against the configured call depth limit.

use std::cell::Cell;

use crate::errors::{call_depth_exceeded, EvalError};

/// Ensure sufficient stack space is available before executing `f`.
///
/// On native targets, uses `stacker` to grow the stack if needed.
/// On WASM targets, just calls the closure directly.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    /// Minimum stack space to keep available (100KB red zone).
    const RED_ZONE: usize = 100 * 1024;

    /// Stack space to allocate when growing (1MB).
    const STACK_PER_RECURSION: usize = 1024 * 1024;

    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version - just call directly (WASM has its own stack management).
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

thread_local! {
    static CALL_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// One level of call nesting on the current thread; released on drop.
#[must_use]
pub struct CallGuard(());

impl CallGuard {
    pub fn enter(limit: Option<usize>) -> Result<Self, EvalError> {
        let depth = CALL_DEPTH.with(|d| {
            let depth = d.get() + 1;
            d.set(depth);
            depth
        });
        let guard = CallGuard(());
        match limit {
            Some(limit) if depth > limit => Err(call_depth_exceeded(limit)),
            _ => Ok(guard),
        }
    }

    /// Current nesting depth on this thread.
    #[allow(dead_code, reason = "diagnostic accessor with no current caller")]
    pub fn depth() -> usize {
        CALL_DEPTH.with(Cell::get)
    }
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        CALL_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}
