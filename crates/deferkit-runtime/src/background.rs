#![forbid(unsafe_code)]

//! Background computation with completions delivered on a designated thread.
//!
//! A [`MainQueue`] is a single-threaded job queue owned by the thread that
//! must observe results (typically a UI or event-loop thread). Workers post
//! closures through a cloneable [`QueueHandle`]; the owner runs them by
//! draining the queue with [`MainQueue::run_pending`] or
//! [`MainQueue::run_until`].
//!
//! [`run_in_background`] ties the two together: compute off-thread, then
//! hand the value to a completion that runs on the queue owner's thread.
//!
//! # Failure Modes
//!
//! - **Owner gone**: posting to a queue whose [`MainQueue`] was dropped is a
//!   no-op logged at `DEBUG`; the job is discarded.
//! - **Computation panics**: the worker thread unwinds, nothing is posted, and
//!   the panic surfaces through the returned [`JoinHandle`].
//! - **Job panics** while draining propagate to the draining thread.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, trace};
use web_time::{Duration, Instant};

use crate::error::Result;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Cloneable, thread-safe sender side of a [`MainQueue`].
#[derive(Debug, Clone)]
pub struct QueueHandle {
    tx: Sender<Job>,
}

impl QueueHandle {
    /// Post a job for the owner to run.
    ///
    /// Returns false (and drops the job) if the queue no longer exists.
    pub fn post(&self, job: impl FnOnce() + Send + 'static) -> bool {
        match self.tx.send(Box::new(job)) {
            Ok(()) => true,
            Err(_) => {
                debug!("main queue is gone, dropping posted job");
                false
            }
        }
    }
}

/// Single-threaded job queue drained by its owner.
pub struct MainQueue {
    tx: Sender<Job>,
    rx: Receiver<Job>,
}

impl std::fmt::Debug for MainQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainQueue").finish_non_exhaustive()
    }
}

impl Default for MainQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MainQueue {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    /// A handle other threads use to post work here.
    #[must_use]
    pub fn handle(&self) -> QueueHandle {
        QueueHandle {
            tx: self.tx.clone(),
        }
    }

    /// Run every job already queued, without blocking. Returns the number run.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            ran += 1;
        }
        if ran > 0 {
            trace!(ran, "main queue drained");
        }
        ran
    }

    /// Block until `count` jobs have run or `timeout` elapses.
    ///
    /// Returns the number of jobs run, which is less than `count` only on
    /// timeout.
    pub fn run_until(&self, count: usize, timeout: Duration) -> usize {
        let deadline = Instant::now().checked_add(timeout);
        let mut ran = 0;
        while ran < count {
            let wait = match deadline {
                Some(at) => at.saturating_duration_since(Instant::now()),
                None => Duration::MAX,
            };
            match self.rx.recv_timeout(wait) {
                Ok(job) => {
                    job();
                    ran += 1;
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => break,
            }
        }
        ran
    }
}

/// Compute `computation` on a new thread, then run `completion` with its
/// value on the thread that drains `queue`.
///
/// ```
/// use deferkit_runtime::background::{MainQueue, run_in_background};
/// use std::time::Duration;
///
/// let queue = MainQueue::new();
/// let (tx, rx) = std::sync::mpsc::channel();
/// run_in_background(|| 2 + 2, &queue.handle(), move |sum| tx.send(sum).unwrap()).unwrap();
/// assert_eq!(queue.run_until(1, Duration::from_secs(5)), 1);
/// assert_eq!(rx.try_recv().unwrap(), 4);
/// ```
pub fn run_in_background<T, C, K>(
    computation: C,
    queue: &QueueHandle,
    completion: K,
) -> Result<JoinHandle<()>>
where
    T: Send + 'static,
    C: FnOnce() -> T + Send + 'static,
    K: FnOnce(T) + Send + 'static,
{
    let queue = queue.clone();
    let handle = thread::Builder::new()
        .name("deferkit-background".into())
        .spawn(move || {
            let value = computation();
            queue.post(move || completion(value));
        })?;
    Ok(handle)
}
