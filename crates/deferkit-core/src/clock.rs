//! Time sources.
//!
//! Everything in deferkit that reads "now" without sleeping goes through a
//! [`Clock`]. In production that is the system monotonic clock; in tests it is
//! a [`ManualClock`] advanced explicitly, so expiry and chain timing can be
//! checked without real delays.
//!
//! ```
//! use deferkit_core::clock::{Clock, ManualClock};
//! use web_time::Duration;
//!
//! let manual = ManualClock::new();
//! let clock = Clock::from(manual.clone());
//! let t0 = clock.now();
//! manual.advance(Duration::from_millis(250));
//! assert_eq!(clock.now().duration_since(t0), Duration::from_millis(250));
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use web_time::{Duration, Instant};

/// A clock that only moves when told to.
///
/// Clones share one reading: advancing any clone advances all of them.
/// Readings never go backwards.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    reading: Arc<Mutex<Instant>>,
}

impl ManualClock {
    /// A manual clock reading the current system instant.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// A manual clock whose first reading is `origin`.
    #[must_use]
    pub fn starting_at(origin: Instant) -> Self {
        Self {
            origin,
            reading: Arc::new(Mutex::new(origin)),
        }
    }

    fn reading(&self) -> MutexGuard<'_, Instant> {
        self.reading.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move forward by `delta` and return the new reading.
    ///
    /// A step that would overflow `Instant` leaves the reading unchanged.
    pub fn advance(&self, delta: Duration) -> Instant {
        let mut now = self.reading();
        if let Some(next) = now.checked_add(delta) {
            *now = next;
        }
        *now
    }

    /// Jump forward to `target`. Returns `false` (and does nothing) if
    /// `target` is earlier than the current reading.
    pub fn advance_to(&self, target: Instant) -> bool {
        let mut now = self.reading();
        if target < *now {
            return false;
        }
        *now = target;
        true
    }

    /// The first reading of this clock.
    #[must_use]
    pub fn origin(&self) -> Instant {
        self.origin
    }

    /// Total distance advanced since [`origin`](Self::origin).
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.reading().saturating_duration_since(self.origin)
    }

    /// Current reading.
    #[must_use]
    pub fn now(&self) -> Instant {
        *self.reading()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Source of "now".
#[derive(Debug, Clone, Default)]
pub enum Clock {
    /// The system monotonic clock.
    #[default]
    System,
    /// A clock advanced by hand.
    Manual(ManualClock),
}

impl Clock {
    /// Current time according to this source.
    #[inline]
    #[must_use]
    pub fn now(&self) -> Instant {
        match self {
            Self::System => Instant::now(),
            Self::Manual(c) => c.now(),
        }
    }

    /// Whether this is a manual clock.
    #[inline]
    #[must_use]
    pub fn is_manual(&self) -> bool {
        matches!(self, Self::Manual(_))
    }
}

impl From<ManualClock> for Clock {
    fn from(clock: ManualClock) -> Self {
        Self::Manual(clock)
    }
}
