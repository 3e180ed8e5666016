#![forbid(unsafe_code)]

//! Fork/join helpers on scoped threads.
//!
//! [`parallel`] runs two computations at once and joins them into a pair;
//! [`parallel_map`] splits a slice across worker threads and reassembles the
//! results in input order.
//!
//! # Failure policy
//!
//! Wait-for-all. A panic in any computation is caught, every sibling is still
//! run to completion and joined, and only then is the failure returned. No
//! computation is abandoned mid-flight and no partial results escape.
//!
//! # Ordering
//!
//! The computations have no ordering relative to each other. Side effects of
//! one are not visible to the other unless the caller synchronizes.

use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use tracing::{debug, warn};

use crate::error::{DeferError, Result, panic_message};

/// Tuning for [`parallel_map_with`].
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Upper bound on worker threads. `None` uses the available parallelism.
    pub max_workers: Option<usize>,
    /// Name prefix for worker threads. Default: `"deferkit-map"`.
    pub thread_name: String,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            max_workers: None,
            thread_name: String::from("deferkit-map"),
        }
    }
}

impl ParallelConfig {
    /// Cap the number of worker threads (0 is treated as 1).
    #[must_use]
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = Some(workers);
        self
    }

    /// Set the worker thread name prefix.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Number of workers to use for `len` items (never more than `len`).
    #[must_use]
    pub fn workers_for(&self, len: usize) -> usize {
        let cap = self.max_workers.unwrap_or_else(|| {
            thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        });
        cap.max(1).min(len.max(1))
    }
}

/// Run `left` and `right` concurrently and return both results.
///
/// `left` runs on a scoped worker thread, `right` on the calling thread.
/// Returns only after both have finished.
///
/// ```
/// use deferkit_runtime::parallel::parallel;
///
/// let values: Vec<u64> = (1..=100_000).collect();
/// let (squares, sum) = parallel(
///     || values.iter().map(|v| v * v).sum::<u64>(),
///     || values.iter().sum::<u64>(),
/// )
/// .unwrap();
/// assert_eq!(sum, 5_000_050_000);
/// assert_eq!(squares, values.iter().map(|v| v * v).sum::<u64>());
/// ```
pub fn parallel<A, B, FA, FB>(left: FA, right: FB) -> Result<(A, B)>
where
    FA: FnOnce() -> A + Send,
    FB: FnOnce() -> B,
    A: Send,
{
    thread::scope(|scope| {
        let handle = thread::Builder::new()
            .name("deferkit-parallel".into())
            .spawn_scoped(scope, left)?;
        let right_result = panic::catch_unwind(AssertUnwindSafe(right));
        let left_result = handle.join();

        match (left_result, right_result) {
            (Ok(a), Ok(b)) => Ok((a, b)),
            (Err(payload), Ok(_)) => {
                let message = panic_message(&*payload);
                warn!(side = "left", %message, "parallel computation panicked");
                Err(DeferError::LeftPanicked { message })
            }
            (Ok(_), Err(payload)) => {
                let message = panic_message(&*payload);
                warn!(side = "right", %message, "parallel computation panicked");
                Err(DeferError::RightPanicked { message })
            }
            (Err(left), Err(right)) => {
                let left = panic_message(&*left);
                let right = panic_message(&*right);
                warn!(%left, %right, "both parallel computations panicked");
                Err(DeferError::BothPanicked { left, right })
            }
        }
    })
}

/// Map `f` over `items` on worker threads, preserving order.
///
/// Uses [`ParallelConfig::default`]. See [`parallel_map_with`].
pub fn parallel_map<T, U, F>(items: &[T], f: F) -> Result<Vec<U>>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync,
{
    parallel_map_with(&ParallelConfig::default(), items, f)
}

/// Map `f` over `items` using contiguous chunks, one per worker.
///
/// All workers are joined before returning. If any worker panicked, the
/// lowest-numbered failing worker is reported as
/// [`DeferError::WorkerPanicked`].
pub fn parallel_map_with<T, U, F>(config: &ParallelConfig, items: &[T], f: F) -> Result<Vec<U>>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let workers = config.workers_for(items.len());
    let chunk_size = items.len().div_ceil(workers);
    debug!(items = items.len(), workers, chunk_size, "parallel map");

    let f = &f;
    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        for (worker, chunk) in items.chunks(chunk_size).enumerate() {
            let handle = thread::Builder::new()
                .name(format!("{}-{worker}", config.thread_name))
                .spawn_scoped(scope, move || chunk.iter().map(f).collect::<Vec<U>>())?;
            handles.push(handle);
        }

        let mut out = Vec::with_capacity(items.len());
        let mut failure = None;
        for (worker, handle) in handles.into_iter().enumerate() {
            match handle.join() {
                Ok(part) => {
                    if failure.is_none() {
                        out.extend(part);
                    }
                }
                Err(payload) => {
                    let message = panic_message(&*payload);
                    warn!(worker, %message, "parallel map worker panicked");
                    if failure.is_none() {
                        failure = Some(DeferError::WorkerPanicked { worker, message });
                    }
                }
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(out),
        }
    })
}
