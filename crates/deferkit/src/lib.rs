#![forbid(unsafe_code)]

//! deferkit public facade crate.
//!
//! Re-exports the deferred-execution toolkit: time sources, cancellation,
//! expiring values and animation chains from `deferkit-core`, plus the
//! thread-backed primitives from `deferkit-runtime` behind the default
//! `runtime` feature.

pub use deferkit_core::{
    AnimationChain, Animator, CancelHandle, CancelToken, Cancelled, Clock, ExpiringValue,
    ImmediateAnimator, ManualClock, TickAnimator,
};

#[cfg(feature = "runtime")]
pub use deferkit_runtime::{
    Completion, DebounceConfig, Debouncer, DeferError, MainQueue, Memoizer, ParallelConfig,
    QueueHandle, SyncBridge, make_synchronous, measure, memoize, parallel, parallel_map,
    parallel_map_with, run_in_background,
};

pub mod prelude {
    pub use deferkit_core as core;
    #[cfg(feature = "runtime")]
    pub use deferkit_runtime as runtime;
}
