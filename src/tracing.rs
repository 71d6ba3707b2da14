//! Shim over the `tracing` crate so the rest of the codebase can call
//! `crate::tracing::trace!`/`debug!`/`warn!` unconditionally. With the
//! `tracing` feature disabled the macros compile away to nothing.

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, trace, warn};

#[cfg(not(feature = "tracing"))]
pub(crate) use noop::{debug, trace, warn};

#[cfg(not(feature = "tracing"))]
mod noop {
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }

    pub(crate) use {debug, trace, warn};
}
