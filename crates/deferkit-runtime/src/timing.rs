#![forbid(unsafe_code)]

//! Wall-clock measurement of a closure.

use std::hint::black_box;

use tracing::debug;
use web_time::{Duration, Instant};

/// Run `f` `executions` times and return the mean wall time per run.
///
/// Zero executions is treated as one. The closure's output is passed through
/// [`black_box`] so the work is not optimized away.
///
/// ```
/// use deferkit_runtime::timing::measure;
///
/// let mean = measure(10, || (0..1_000u64).sum::<u64>());
/// assert!(mean < std::time::Duration::from_secs(1));
/// ```
pub fn measure<R>(executions: usize, mut f: impl FnMut() -> R) -> Duration {
    let runs = executions.max(1);
    let start = Instant::now();
    for _ in 0..runs {
        black_box(f());
    }
    let total = start.elapsed();
    let mean_nanos = total.as_nanos() / runs as u128;
    let mean = Duration::from_nanos(u64::try_from(mean_nanos).unwrap_or(u64::MAX));
    debug!(runs, total_us = total.as_micros() as u64, mean_ns = mean_nanos as u64, "measured");
    mean
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn runs_requested_number_of_times() {
        let calls = Cell::new(0);
        measure(7, || calls.set(calls.get() + 1));
        assert_eq!(calls.get(), 7);
    }

    #[test]
    fn zero_executions_runs_once() {
        let calls = Cell::new(0);
        measure(0, || calls.set(calls.get() + 1));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn mean_reflects_work() {
        let mean = measure(3, || std::thread::sleep(Duration::from_millis(10)));
        assert!(mean >= Duration::from_millis(10), "mean = {mean:?}");
        assert!(mean < Duration::from_secs(2), "mean = {mean:?}");
    }
}
