//! Abort channel for unrecoverable kernel failures
//!
//! The arithmetic kernels have no partial-failure mode: every operation
//! either succeeds fully or aborts the process. The four abort kinds are
//! distinct and mutually exclusive; see [`AbortKind`]. An embedding that
//! wants to survive (for example to flush state before dying) installs a
//! hook with [`set_abort_hook`]. The hook is expected not to return; if it
//! does, the process is aborted anyway.

use std::sync::Mutex;
use thiserror::Error;

/// Classification of an unrecoverable failure
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AbortKind {
    /// An internal arithmetic invariant failed (for example a carry that was
    /// proven impossible occurred). Indicates a bug; checked in all builds.
    #[error("assertion failure")]
    AssertFailure,

    /// A caller-supplied argument violated a documented precondition.
    /// Checked only in debug builds.
    #[error("debug assertion failure")]
    DebugAssertFailure,

    /// The heap allocator failed or the scratch stack exceeded its ceiling.
    /// The message carries the requested size.
    #[error("memory allocation failure")]
    MemoryAllocFailure,

    /// An instrumented memory access went out of bounds. Slice indexing
    /// makes this unreachable from safe callers; the kind is kept so hooks
    /// written against the full vocabulary keep compiling.
    #[error("out of bounds access")]
    OutOfBounds,

    /// Reserved for failures that fit no other kind.
    #[error("unexpected error")]
    Unexpected,
}

/// Everything a hook learns about the failure
#[derive(Debug, Clone)]
pub struct AbortInfo {
    pub kind: AbortKind,
    pub message: String,
    pub file: &'static str,
    pub line: u32,
}

/// Hook invoked on abort; must not return
pub type AbortHook = fn(&AbortInfo);

static ABORT_HOOK: Mutex<Option<AbortHook>> = Mutex::new(None);

/// Install a new abort hook, returning the previous one (if any).
///
/// Replacement mid-computation is safe but pointless: the hook is read once
/// per abort. Pass `None` to restore the default (log and abort).
pub fn set_abort_hook(hook: Option<AbortHook>) -> Option<AbortHook> {
    let mut slot = ABORT_HOOK.lock().unwrap_or_else(|e| e.into_inner());
    std::mem::replace(&mut *slot, hook)
}

/// Raise an abort. Never returns.
#[cold]
pub fn raise(kind: AbortKind, message: String, file: &'static str, line: u32) -> ! {
    let info = AbortInfo {
        kind,
        message,
        file,
        line,
    };
    let hook = {
        let slot = ABORT_HOOK.lock().unwrap_or_else(|e| e.into_inner());
        *slot
    };
    if let Some(hook) = hook {
        hook(&info);
    }
    log::error!(
        "{}:{}: mpkern abort: {}: {}",
        info.file,
        info.line,
        info.kind,
        info.message
    );
    eprintln!(
        "{}:{}: mpkern abort: {}: {}",
        info.file, info.line, info.kind, info.message
    );
    std::process::abort();
}

/// Invariant check active in every build.
///
/// Use for conditions whose failure would silently corrupt a later result
/// (a carry that "cannot happen", an overshoot loop that did not converge).
macro_rules! hard_assert {
    ($cond:expr) => {
        if !$cond {
            $crate::error::raise(
                $crate::error::AbortKind::AssertFailure,
                concat!("hard_assert failed: ", stringify!($cond)).to_string(),
                file!(),
                line!(),
            );
        }
    };
}

/// Caller-precondition check, compiled out of release builds.
macro_rules! debug_require {
    ($cond:expr) => {
        #[cfg(debug_assertions)]
        if !$cond {
            $crate::error::raise(
                $crate::error::AbortKind::DebugAssertFailure,
                concat!("precondition failed: ", stringify!($cond)).to_string(),
                file!(),
                line!(),
            );
        }
    };
}

pub(crate) use debug_require;
pub(crate) use hard_assert;
