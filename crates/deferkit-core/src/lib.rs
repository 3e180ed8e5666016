#![forbid(unsafe_code)]

//! Core: time sources, cancellation tokens, expiring values, and sequential
//! animation chains. Nothing in this crate spawns threads.

pub mod animation;
pub mod cancel;
pub mod clock;
pub mod expiring;
#[cfg(feature = "tracing")]
pub mod logging;

pub use animation::{AnimationChain, Animator, ImmediateAnimator, TickAnimator};
pub use cancel::{CancelHandle, CancelToken, Cancelled};
pub use clock::{Clock, ManualClock};
pub use expiring::ExpiringValue;

// No-op stand-ins for the tracing macros when the `tracing` feature is off.

#[cfg(not(feature = "tracing"))]
#[doc(hidden)]
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(feature = "tracing"))]
#[doc(hidden)]
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {{}};
}
