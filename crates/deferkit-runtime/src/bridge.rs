#![forbid(unsafe_code)]

//! Blocking bridge over callback-style asynchronous functions.
//!
//! Wraps a function of shape `f(input, completion)` into one that takes
//! `input` and returns the delivered result, parking the calling thread until
//! the completion fires. The completion may fire synchronously inside `f` or
//! later from any other thread.
//!
//! # Contract
//!
//! - [`Completion::complete`] consumes the handle, so a result is delivered
//!   at most once by construction.
//! - If the handle is dropped without completing, the call returns
//!   [`DeferError::CompletionDropped`]. If it is leaked or parked forever,
//!   [`SyncBridge::call`] never returns; use [`SyncBridge::call_timeout`]
//!   when that is possible.
//! - Never call the bridge from the context that is supposed to deliver the
//!   completion (for example a single-threaded event loop thread): it will
//!   deadlock waiting on itself.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::time::Duration;

use tracing::trace;

use crate::error::{DeferError, Result};

/// One-shot handle used by the wrapped function to deliver its result.
#[derive(Debug)]
pub struct Completion<B> {
    tx: SyncSender<B>,
}

impl<B> Completion<B> {
    /// Deliver the result, waking the blocked caller.
    ///
    /// If the caller already gave up (timeout), the value is dropped.
    pub fn complete(self, value: B) {
        if self.tx.send(value).is_err() {
            trace!("completion delivered after the caller stopped waiting");
        }
    }
}

fn completion_pair<B>() -> (Completion<B>, Receiver<B>) {
    let (tx, rx) = mpsc::sync_channel(1);
    (Completion { tx }, rx)
}

/// Blocking adapter around a callback-style function.
///
/// ```
/// use deferkit_runtime::bridge::{Completion, SyncBridge};
///
/// fn greet(arg: u32, done: Completion<String>) {
///     std::thread::spawn(move || done.complete(format!("hello {arg}")));
/// }
///
/// let bridge = SyncBridge::new(greet);
/// assert_eq!(bridge.call(42).unwrap(), "hello 42");
/// ```
#[derive(Debug, Clone)]
pub struct SyncBridge<F> {
    f: F,
}

impl<F> SyncBridge<F> {
    /// Wrap a callback-style function.
    #[must_use]
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Invoke the wrapped function and block until its completion fires.
    pub fn call<A, B>(&self, input: A) -> Result<B>
    where
        F: Fn(A, Completion<B>),
    {
        let (completion, rx) = completion_pair();
        (self.f)(input, completion);
        rx.recv().map_err(|_| DeferError::CompletionDropped)
    }

    /// Like [`call`](Self::call) but gives up after `timeout`.
    pub fn call_timeout<A, B>(&self, input: A, timeout: Duration) -> Result<B>
    where
        F: Fn(A, Completion<B>),
    {
        let (completion, rx) = completion_pair();
        (self.f)(input, completion);
        rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => DeferError::TimedOut(timeout),
            RecvTimeoutError::Disconnected => DeferError::CompletionDropped,
        })
    }

    /// Unwrap the inner function.
    #[must_use]
    pub fn into_inner(self) -> F {
        self.f
    }
}

/// Turn a callback-style function into a blocking one.
///
/// ```
/// use deferkit_runtime::bridge::{Completion, make_synchronous};
///
/// let celebrate = make_synchronous(|arg: i32, done: Completion<String>| {
///     done.complete(format!("🎉 {arg}"));
/// });
/// assert_eq!(celebrate(42).unwrap(), "🎉 42");
/// ```
pub fn make_synchronous<A, B, F>(f: F) -> impl Fn(A) -> Result<B>
where
    F: Fn(A, Completion<B>),
{
    let bridge = SyncBridge::new(f);
    move |input: A| bridge.call(input)
}
