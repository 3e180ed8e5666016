#![forbid(unsafe_code)]

//! Timed actions and the runtimes that drive them.
//!
//! An [`Animator`] receives an action plus a duration, applies the action,
//! and later reports completion through a one-shot callback. An
//! [`AnimationChain`] uses that callback to run timed actions strictly one
//! after another.
//!
//! Two animators ship with the crate:
//!
//! - [`ImmediateAnimator`]: applies the action and completes synchronously.
//! - [`TickAnimator`]: completes an action once the accumulated `tick(dt)`
//!   time reaches its duration. Deterministic, driven by the caller's frame
//!   loop.
//!
//! Everything here is single-threaded (`Rc`/`RefCell`).

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

mod chain;

pub use chain::AnimationChain;

/// A reusable action applied at the start of a timed effect.
pub type Action = Rc<dyn Fn()>;

/// One-shot completion callback. `finished` is `false` when the effect was
/// interrupted before its duration elapsed.
pub type OnComplete = Box<dyn FnOnce(bool)>;

/// Runtime that plays timed actions and reports their completion.
pub trait Animator {
    /// Apply `action` over `duration`, then call `on_complete` exactly once.
    ///
    /// An animator that never calls `on_complete` stalls whatever waits on it.
    fn animate(&self, duration: Duration, action: Action, on_complete: OnComplete);
}

// ---------------------------------------------------------------------------
// ImmediateAnimator
// ---------------------------------------------------------------------------

/// Applies each action and reports completion before returning.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateAnimator;

impl Animator for ImmediateAnimator {
    fn animate(&self, _duration: Duration, action: Action, on_complete: OnComplete) {
        action();
        on_complete(true);
    }
}

// ---------------------------------------------------------------------------
// TickAnimator
// ---------------------------------------------------------------------------

struct Active {
    duration: Duration,
    elapsed: Duration,
    on_complete: OnComplete,
}

impl std::fmt::Debug for Active {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Active")
            .field("duration", &self.duration)
            .field("elapsed", &self.elapsed)
            .finish()
    }
}

/// Frame-driven animator.
///
/// # Invariants
///
/// 1. An effect completes on the first `tick` where its accumulated time
///    reaches its duration (a zero-length effect completes on the next tick).
/// 2. Effects started by a completion callback are not advanced by the tick
///    that fired it.
/// 3. [`cancel_all`](Self::cancel_all) completes every active effect with
///    `finished == false`.
#[derive(Debug, Default)]
pub struct TickAnimator {
    active: RefCell<Vec<Active>>,
}

impl TickAnimator {
    /// Create an idle animator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance every active effect by `dt` and fire due completions in the
    /// order the effects were started.
    pub fn tick(&self, dt: Duration) {
        let due: Vec<OnComplete> = {
            let mut active = self.active.borrow_mut();
            let mut due = Vec::new();
            let mut still_running = Vec::with_capacity(active.len());
            for mut effect in active.drain(..) {
                effect.elapsed = effect.elapsed.saturating_add(dt);
                if effect.elapsed >= effect.duration {
                    due.push(effect.on_complete);
                } else {
                    still_running.push(effect);
                }
            }
            *active = still_running;
            due
        };
        // Borrow released: callbacks may start new effects.
        for on_complete in due {
            on_complete(true);
        }
    }

    /// Interrupt every active effect.
    pub fn cancel_all(&self) {
        let interrupted: Vec<Active> = self.active.borrow_mut().drain(..).collect();
        for effect in interrupted {
            (effect.on_complete)(false);
        }
    }

    /// Number of effects currently running.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.borrow().len()
    }

    /// Whether no effect is running.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.active.borrow().is_empty()
    }

    /// Progress of the oldest running effect (0.0 to 1.0), if any.
    #[must_use]
    pub fn progress(&self) -> Option<f32> {
        self.active.borrow().first().map(|effect| {
            if effect.duration.is_zero() {
                1.0
            } else {
                (effect.elapsed.as_secs_f32() / effect.duration.as_secs_f32()).min(1.0)
            }
        })
    }
}

impl Animator for TickAnimator {
    fn animate(&self, duration: Duration, action: Action, on_complete: OnComplete) {
        action();
        self.active.borrow_mut().push(Active {
            duration,
            elapsed: Duration::ZERO,
            on_complete,
        });
    }
}

impl<A: Animator + ?Sized> Animator for Rc<A> {
    fn animate(&self, duration: Duration, action: Action, on_complete: OnComplete) {
        (**self).animate(duration, action, on_complete);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const MS_100: Duration = Duration::from_millis(100);
    const MS_200: Duration = Duration::from_millis(200);

    fn flag() -> (Rc<Cell<Option<bool>>>, OnComplete) {
        let slot = Rc::new(Cell::new(None));
        let s = Rc::clone(&slot);
        (slot, Box::new(move |finished| s.set(Some(finished))))
    }

    #[test]
    fn immediate_runs_and_completes() {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let (done, cb) = flag();
        ImmediateAnimator.animate(MS_100, Rc::new(move || h.set(h.get() + 1)), cb);
        assert_eq!(hits.get(), 1);
        assert_eq!(done.get(), Some(true));
    }

    #[test]
    fn tick_applies_action_on_start() {
        let anim = TickAnimator::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let (done, cb) = flag();
        anim.animate(MS_200, Rc::new(move || h.set(h.get() + 1)), cb);
        assert_eq!(hits.get(), 1);
        assert_eq!(done.get(), None);
        assert_eq!(anim.active_count(), 1);
    }

    #[test]
    fn tick_completes_after_duration() {
        let anim = TickAnimator::new();
        let (done, cb) = flag();
        anim.animate(MS_200, Rc::new(|| {}), cb);
        anim.tick(MS_100);
        assert_eq!(done.get(), None);
        assert!((anim.progress().unwrap() - 0.5).abs() < 0.01);
        anim.tick(MS_100);
        assert_eq!(done.get(), Some(true));
        assert!(anim.is_idle());
        assert!(anim.progress().is_none());
    }

    #[test]
    fn zero_duration_completes_on_next_tick() {
        let anim = TickAnimator::new();
        let (done, cb) = flag();
        anim.animate(Duration::ZERO, Rc::new(|| {}), cb);
        assert_eq!(done.get(), None);
        anim.tick(Duration::ZERO);
        assert_eq!(done.get(), Some(true));
    }

    #[test]
    fn cancel_all_reports_unfinished() {
        let anim = TickAnimator::new();
        let (a, cb_a) = flag();
        let (b, cb_b) = flag();
        anim.animate(MS_100, Rc::new(|| {}), cb_a);
        anim.animate(MS_200, Rc::new(|| {}), cb_b);
        anim.cancel_all();
        assert_eq!(a.get(), Some(false));
        assert_eq!(b.get(), Some(false));
        assert!(anim.is_idle());
    }

    #[test]
    fn tick_on_idle_is_noop() {
        let anim = TickAnimator::new();
        anim.tick(MS_100);
        assert!(anim.is_idle());
    }

    #[test]
    fn rc_animator_delegates() {
        let anim = Rc::new(TickAnimator::new());
        let (done, cb) = flag();
        Animator::animate(&anim, MS_100, Rc::new(|| {}), cb);
        anim.tick(MS_100);
        assert_eq!(done.get(), Some(true));
    }
}
