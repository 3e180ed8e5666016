//! Values that are only valid until a fixed instant.
//!
//! # Invariants
//!
//! 1. Value and expiration instant are fixed at construction.
//! 2. [`ExpiringValue::read`] yields the value iff `now < expires_at`; the
//!    boundary instant itself already counts as expired.
//! 3. Reads have no side effects and can be repeated freely.
//!
//! # Failure Modes
//!
//! - A duration too large to add to `now` produces a value that never
//!   expires ([`ExpiringValue::expires_at`] returns `None`).

use web_time::{Duration, Instant};

use crate::clock::Clock;

/// A value paired with an expiration instant.
///
/// ```
/// use deferkit_core::clock::{Clock, ManualClock};
/// use deferkit_core::expiring::ExpiringValue;
/// use web_time::Duration;
///
/// let clock = ManualClock::new();
/// let token =
///     ExpiringValue::for_duration_with_clock(42, Duration::from_secs(2), clock.clone().into());
///
/// clock.advance(Duration::from_secs(1));
/// assert_eq!(token.read(), Some(&42));
/// clock.advance(Duration::from_millis(1500));
/// assert_eq!(token.read(), None);
/// ```
#[derive(Debug, Clone)]
pub struct ExpiringValue<T> {
    value: T,
    /// `None` when the requested lifetime overflowed `Instant`.
    expires_at: Option<Instant>,
    clock: Clock,
}

impl<T> ExpiringValue<T> {
    /// Value valid until `expires_at` on the system clock.
    #[must_use]
    pub fn new(value: T, expires_at: Instant) -> Self {
        Self::with_clock(value, expires_at, Clock::System)
    }

    /// Value valid for `duration` from now on the system clock.
    #[must_use]
    pub fn for_duration(value: T, duration: Duration) -> Self {
        Self::for_duration_with_clock(value, duration, Clock::System)
    }

    /// Value valid until `expires_at` as read from `clock`.
    #[must_use]
    pub fn with_clock(value: T, expires_at: Instant, clock: Clock) -> Self {
        Self {
            value,
            expires_at: Some(expires_at),
            clock,
        }
    }

    /// Value valid for `duration` from `clock.now()`.
    #[must_use]
    pub fn for_duration_with_clock(value: T, duration: Duration, clock: Clock) -> Self {
        let expires_at = clock.now().checked_add(duration);
        Self {
            value,
            expires_at,
            clock,
        }
    }

    /// The value, or `None` once expired.
    #[inline]
    #[must_use]
    pub fn read(&self) -> Option<&T> {
        if self.is_expired() {
            None
        } else {
            Some(&self.value)
        }
    }

    /// Alias for [`read`](Self::read).
    #[inline]
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.read()
    }

    /// Whether `now >= expires_at`.
    #[inline]
    #[must_use]
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => self.clock.now() >= at,
            None => false,
        }
    }

    /// The expiration instant (`None` if it never expires).
    #[inline]
    #[must_use]
    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    /// Time left before expiry, saturating at zero. `None` if it never
    /// expires.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|at| at.saturating_duration_since(self.clock.now()))
    }

    /// Consume the container, returning the value if still valid.
    #[must_use]
    pub fn into_inner(self) -> Option<T> {
        if self.is_expired() {
            None
        } else {
            Some(self.value)
        }
    }
}

impl<T: Clone> ExpiringValue<T> {
    /// Clone of the value, or `None` once expired.
    #[must_use]
    pub fn read_cloned(&self) -> Option<T> {
        self.read().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const SEC_1: Duration = Duration::from_secs(1);
    const SEC_2: Duration = Duration::from_secs(2);

    fn manual() -> (ManualClock, Clock) {
        let m = ManualClock::new();
        let c = Clock::from(m.clone());
        (m, c)
    }

    #[test]
    fn readable_before_expiry() {
        let (m, c) = manual();
        let v = ExpiringValue::for_duration_with_clock(42, SEC_2, c);
        m.advance(SEC_1);
        assert_eq!(v.read(), Some(&42));
        assert!(!v.is_expired());
    }

    #[test]
    fn absent_after_expiry() {
        let (m, c) = manual();
        let v = ExpiringValue::for_duration_with_clock(42, SEC_2, c);
        m.advance(Duration::from_millis(2500));
        assert_eq!(v.read(), None);
        assert_eq!(v.get(), None);
        assert!(v.is_expired());
    }

    #[test]
    fn boundary_counts_as_expired() {
        let (m, c) = manual();
        let v = ExpiringValue::for_duration_with_clock("tok", SEC_2, c);
        m.advance(SEC_2);
        assert_eq!(v.read(), None);
    }

    #[test]
    fn zero_duration_is_expired_immediately() {
        let (_m, c) = manual();
        let v = ExpiringValue::for_duration_with_clock(1, Duration::ZERO, c);
        assert!(v.is_expired());
    }

    #[test]
    fn explicit_instant_in_the_past() {
        let (m, c) = manual();
        let at = c.now();
        m.advance(SEC_1);
        let v = ExpiringValue::with_clock(7, at, c);
        assert_eq!(v.read(), None);
    }

    #[test]
    fn explicit_instant_in_the_future() {
        let (m, c) = manual();
        let at = c.now() + SEC_2;
        let v = ExpiringValue::with_clock(7, at, c);
        assert_eq!(v.expires_at(), Some(at));
        m.advance(SEC_1);
        assert_eq!(v.read(), Some(&7));
    }

    #[test]
    fn remaining_saturates() {
        let (m, c) = manual();
        let v = ExpiringValue::for_duration_with_clock((), SEC_2, c);
        assert_eq!(v.remaining(), Some(SEC_2));
        m.advance(SEC_1);
        assert_eq!(v.remaining(), Some(SEC_1));
        m.advance(Duration::from_secs(10));
        assert_eq!(v.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn reads_are_repeatable() {
        let (_m, c) = manual();
        let v = ExpiringValue::for_duration_with_clock(String::from("a"), SEC_1, c);
        for _ in 0..5 {
            assert_eq!(v.read().map(String::as_str), Some("a"));
        }
        assert_eq!(v.read_cloned(), Some(String::from("a")));
    }

    #[test]
    fn into_inner_respects_expiry() {
        let (m, c) = manual();
        let live = ExpiringValue::for_duration_with_clock(vec![1, 2], SEC_1, c.clone());
        let dead = ExpiringValue::for_duration_with_clock(vec![3], SEC_1, c);
        assert_eq!(live.into_inner(), Some(vec![1, 2]));
        m.advance(SEC_1);
        assert_eq!(dead.into_inner(), None);
    }

    #[test]
    fn overflowing_duration_never_expires() {
        let (m, c) = manual();
        let v = ExpiringValue::for_duration_with_clock(0u8, Duration::MAX, c);
        m.advance(Duration::from_secs(3600));
        assert!(v.expires_at().is_none());
        assert_eq!(v.read(), Some(&0));
        assert_eq!(v.remaining(), None);
    }

    #[test]
    fn system_clock_constructor() {
        let v = ExpiringValue::for_duration(5, Duration::from_secs(60));
        assert_eq!(v.read(), Some(&5));
        let gone = ExpiringValue::new(5, Instant::now());
        assert_eq!(gone.read(), None);
    }
}
