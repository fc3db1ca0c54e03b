//! Optional tracing integration.
//!
//! With the `tracing-integration` feature the macros below are the real
//! `tracing` macros. Without it they expand to nothing, so logging costs
//! nothing and the `tracing` crate is not compiled in.

#[cfg(feature = "tracing-integration")]
pub use tracing::{debug, trace, warn};

// Distinct names: a bare `warn` would clash with the built-in attribute.
#[cfg(not(feature = "tracing-integration"))]
mod noop {
    macro_rules! noop_debug {
        ($($arg:tt)*) => {{}};
    }
    macro_rules! noop_trace {
        ($($arg:tt)*) => {{}};
    }
    macro_rules! noop_warn {
        ($($arg:tt)*) => {{}};
    }

    pub(crate) use noop_debug as debug;
    pub(crate) use noop_trace as trace;
    pub(crate) use noop_warn as warn;
}

#[cfg(not(feature = "tracing-integration"))]
pub(crate) use noop::{debug, trace, warn};
