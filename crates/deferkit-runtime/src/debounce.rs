#![forbid(unsafe_code)]

//! Debounced invocation on a dedicated timer thread.
//!
//! A [`Debouncer`] coalesces a burst of [`trigger`](Debouncer::trigger) calls
//! into a single run of its action, `delay` after the last trigger.
//!
//! # State machine
//!
//! ```text
//! Idle ──trigger──▶ Scheduled(t1) ──trigger──▶ Scheduled(t2) ──delay──▶ fire ──▶ Idle
//!                        │                           │
//!                        └────────cancel─────────────┴──▶ Idle
//! ```
//!
//! Every schedule gets a fresh [`CancelToken`]; superseding or cancelling a
//! schedule cancels its token for good.
//!
//! # Invariants
//!
//! 1. At most one action is pending per debouncer. Cancel-then-reschedule
//!    happens under a single lock, so concurrent triggers cannot leave two
//!    schedules behind.
//! 2. A pending action fires no earlier than `delay` after the trigger that
//!    scheduled it.
//! 3. The action runs only on the timer thread, never concurrently with
//!    itself.
//!
//! # Failure Modes
//!
//! - **Action panics**: the panic is caught and logged at `WARN`; the timer
//!   thread keeps serving later triggers.
//! - **Drop with a pending action**: the action is discarded unless
//!   [`DebounceConfig::fire_pending_on_drop`] is set.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use deferkit_core::cancel::{CancelHandle, CancelToken};
use tracing::{debug, trace, warn};
use web_time::{Duration, Instant};

use crate::error::{Result, panic_message};

/// Configuration for a [`Debouncer`].
#[derive(Debug, Clone)]
pub struct DebounceConfig {
    /// Quiet period that must follow the last trigger. Default: 250ms.
    pub delay: Duration,
    /// Name of the timer thread. Default: `"deferkit-debounce"`.
    pub thread_name: String,
    /// Run a still-pending action when the debouncer is dropped.
    /// Default: false (the action is discarded).
    pub fire_pending_on_drop: bool,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(250),
            thread_name: String::from("deferkit-debounce"),
            fire_pending_on_drop: false,
        }
    }
}

impl DebounceConfig {
    /// Default configuration with the given delay.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Set the timer thread name.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Run a pending action on drop instead of discarding it.
    #[must_use]
    pub fn with_fire_pending_on_drop(mut self, fire: bool) -> Self {
        self.fire_pending_on_drop = fire;
        self
    }
}

#[derive(Debug)]
struct Pending {
    /// `None` when `now + delay` is not representable: due only on flush.
    deadline: Option<Instant>,
    token: CancelToken,
    handle: CancelHandle,
}

#[derive(Debug, Default)]
struct Slot {
    pending: Option<Pending>,
    flush: bool,
    shutdown: bool,
}

#[derive(Debug, Default)]
struct Shared {
    slot: Mutex<Slot>,
    wake: Condvar,
    triggers: AtomicU64,
    fired: AtomicU64,
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Coalesces bursts of triggers into one delayed action.
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::time::Duration;
/// use deferkit_runtime::debounce::Debouncer;
///
/// let hits = Arc::new(AtomicUsize::new(0));
/// let h = Arc::clone(&hits);
/// let search = Debouncer::new(Duration::from_millis(50), move || {
///     h.fetch_add(1, Ordering::SeqCst);
/// })
/// .unwrap();
///
/// search.trigger();
/// search.trigger();
/// search.trigger();
/// std::thread::sleep(Duration::from_millis(300));
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// ```
#[derive(Debug)]
pub struct Debouncer {
    shared: Arc<Shared>,
    delay: Duration,
    worker: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// Create a debouncer with the default configuration and `delay`.
    pub fn new<F>(delay: Duration, action: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        Self::with_config(DebounceConfig::new(delay), action)
    }

    /// Create a debouncer and spawn its timer thread.
    pub fn with_config<F>(config: DebounceConfig, action: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let shared = Arc::new(Shared::default());
        let worker_shared = Arc::clone(&shared);
        let fire_on_drop = config.fire_pending_on_drop;
        let worker = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || timer_loop(&worker_shared, action, fire_on_drop))?;
        debug!(
            delay_ms = config.delay.as_millis() as u64,
            thread = %config.thread_name,
            "debouncer started"
        );
        Ok(Self {
            shared,
            delay: config.delay,
            worker: Some(worker),
        })
    }

    /// Cancel any pending action and schedule a new one `delay` from now.
    pub fn trigger(&self) {
        let (token, handle) = CancelToken::new();
        let deadline = Instant::now().checked_add(self.delay);
        let token_id = token.id();
        {
            let mut slot = lock(&self.shared.slot);
            slot.flush = false;
            let superseded = slot.pending.replace(Pending {
                deadline,
                token,
                handle,
            });
            if let Some(old) = superseded {
                old.handle.cancel();
                trace!(old = old.token.id(), new = token_id, "debounce rescheduled");
            }
        }
        self.shared.triggers.fetch_add(1, Ordering::Relaxed);
        self.shared.wake.notify_one();
    }

    /// Discard the pending action. Returns `true` if one was pending.
    pub fn cancel(&self) -> bool {
        let taken = {
            let mut slot = lock(&self.shared.slot);
            slot.flush = false;
            slot.pending.take()
        };
        match taken {
            Some(pending) => {
                pending.handle.cancel();
                self.shared.wake.notify_one();
                debug!(token = pending.token.id(), "debounce cancelled");
                true
            }
            None => false,
        }
    }

    /// Run the pending action now (on the timer thread) instead of waiting
    /// out the delay. Returns `true` if one was pending.
    pub fn flush(&self) -> bool {
        let mut slot = lock(&self.shared.slot);
        if slot.pending.is_none() {
            return false;
        }
        slot.flush = true;
        drop(slot);
        self.shared.wake.notify_one();
        true
    }

    /// Whether an action is scheduled and not yet started.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        lock(&self.shared.slot).pending.is_some()
    }

    /// Number of times the action has run.
    #[must_use]
    pub fn fired_count(&self) -> u64 {
        self.shared.fired.load(Ordering::Acquire)
    }

    /// Number of `trigger()` calls so far.
    #[must_use]
    pub fn trigger_count(&self) -> u64 {
        self.shared.triggers.load(Ordering::Relaxed)
    }

    /// The configured quiet period.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        lock(&self.shared.slot).shutdown = true;
        self.shared.wake.notify_one();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Run a schedule already taken out of the slot. Once taken it can no longer
/// be superseded or cancelled, so its token is only used for log correlation.
fn run_action<F: FnMut()>(shared: &Shared, action: &mut F, pending: &Pending) {
    match panic::catch_unwind(AssertUnwindSafe(|| action())) {
        Ok(()) => {
            shared.fired.fetch_add(1, Ordering::AcqRel);
            debug!(token = pending.token.id(), "debounced action fired");
        }
        Err(payload) => {
            let message = panic_message(&*payload);
            warn!(token = pending.token.id(), %message, "debounced action panicked");
        }
    }
}

/// The timer thread's main loop.
///
/// Sleeps on the condvar until a schedule exists, then until its deadline,
/// re-evaluating on every wake since the schedule may have been replaced.
fn timer_loop<F: FnMut()>(shared: &Shared, mut action: F, fire_on_drop: bool) {
    let mut slot = lock(&shared.slot);
    loop {
        if slot.shutdown {
            let leftover = slot.pending.take();
            drop(slot);
            if let Some(pending) = leftover {
                if fire_on_drop {
                    run_action(shared, &mut action, &pending);
                } else {
                    pending.handle.cancel();
                }
            }
            return;
        }

        let now = Instant::now();
        let wait_for = match &slot.pending {
            None => None,
            Some(_) if slot.flush => Some(Duration::ZERO),
            Some(pending) => pending
                .deadline
                .map(|deadline| deadline.saturating_duration_since(now)),
        };

        match wait_for {
            Some(remaining) if remaining.is_zero() => {
                let due = slot.pending.take();
                slot.flush = false;
                drop(slot);
                if let Some(pending) = due {
                    run_action(shared, &mut action, &pending);
                }
                slot = lock(&shared.slot);
            }
            Some(remaining) => {
                slot = shared
                    .wake
                    .wait_timeout(slot, remaining)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0;
            }
            None => {
                slot = shared
                    .wake
                    .wait(slot)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }
    }
}
