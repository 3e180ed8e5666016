#![forbid(unsafe_code)]

//! Thread-backed deferred execution.
//!
//! - [`parallel`] / [`parallel_map`]: fork/join on scoped threads.
//! - [`Debouncer`]: coalesce bursts of triggers into one delayed run.
//! - [`SyncBridge`] / [`make_synchronous`]: block on callback-style APIs.
//! - [`Memoizer`] / [`memoize`]: cache a pure function's results.
//! - [`run_in_background`]: compute off-thread, complete on a [`MainQueue`].
//! - [`measure`]: mean wall time of a closure.
//!
//! Time, cancellation, expiring values and animation chains live in
//! [`deferkit_core`] and are re-exported here.

pub mod background;
pub mod bridge;
pub mod debounce;
pub mod error;
pub mod memo;
pub mod parallel;
pub mod timing;

pub use background::{MainQueue, QueueHandle, run_in_background};
pub use bridge::{Completion, SyncBridge, make_synchronous};
pub use debounce::{DebounceConfig, Debouncer};
pub use error::{DeferError, Result};
pub use memo::{Memoizer, memoize};
pub use parallel::{ParallelConfig, parallel, parallel_map, parallel_map_with};
pub use timing::measure;

pub use deferkit_core::{
    AnimationChain, Animator, CancelHandle, CancelToken, Cancelled, Clock, ExpiringValue,
    ImmediateAnimator, ManualClock, TickAnimator,
};
