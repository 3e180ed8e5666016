//! Property-based invariant tests for expiring values and animation chains.
//!
//! 1. `read()` is `Some` iff elapsed < lifetime, for any lifetime and offset
//! 2. Reads never change the outcome of later reads at the same instant
//! 3. A chain of n nodes runs each node exactly once, in append order
//! 4. Node k+1 never starts before node k's duration has elapsed
//! 5. Interrupting at any point leaves a strict prefix of the chain run

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use deferkit_core::animation::{AnimationChain, TickAnimator};
use deferkit_core::clock::{Clock, ManualClock};
use deferkit_core::expiring::ExpiringValue;
use proptest::prelude::*;

// ── Helpers ──────────────────────────────────────────────────────────

fn build_chain(durations: &[u64], log: &Rc<RefCell<Vec<usize>>>) -> AnimationChain {
    let entry = |i: usize| {
        let log = Rc::clone(log);
        move || log.borrow_mut().push(i)
    };
    let mut chain = AnimationChain::new(entry(0), Duration::from_millis(durations[0]));
    for (i, &ms) in durations.iter().enumerate().skip(1) {
        chain.push(entry(i), Duration::from_millis(ms));
    }
    chain
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Expiry boundary
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn read_matches_boundary(lifetime_ms in 0u64..10_000, elapsed_ms in 0u64..20_000) {
        let manual = ManualClock::new();
        let value = ExpiringValue::for_duration_with_clock(
            elapsed_ms,
            Duration::from_millis(lifetime_ms),
            Clock::from(manual.clone()),
        );
        manual.advance(Duration::from_millis(elapsed_ms));
        let expected = elapsed_ms < lifetime_ms;
        prop_assert_eq!(value.read().is_some(), expected);
        prop_assert_eq!(value.is_expired(), !expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Reads are pure
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn reads_are_idempotent(lifetime_ms in 1u64..1_000, reads in 1usize..50) {
        let manual = ManualClock::new();
        let value = ExpiringValue::for_duration_with_clock(
            "session",
            Duration::from_millis(lifetime_ms),
            Clock::from(manual.clone()),
        );
        for _ in 0..reads {
            prop_assert_eq!(value.read(), Some(&"session"));
        }
        manual.advance(Duration::from_millis(lifetime_ms));
        for _ in 0..reads {
            prop_assert_eq!(value.read(), None);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3 & 4. Chain order and non-overlap
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn chain_runs_in_order_without_overlap(
        durations in proptest::collection::vec(0u64..500, 1..12),
    ) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let animator = Rc::new(TickAnimator::new());
        build_chain(&durations, &log).run(&animator);

        for (k, &ms) in durations.iter().enumerate() {
            // Exactly nodes 0..=k have started.
            prop_assert_eq!(log.borrow().len(), k + 1);
            prop_assert_eq!(animator.active_count(), 1);
            if ms > 0 {
                animator.tick(Duration::from_millis(ms - 1));
                prop_assert_eq!(log.borrow().len(), k + 1);
                animator.tick(Duration::from_millis(1));
            } else {
                animator.tick(Duration::ZERO);
            }
        }

        let expected: Vec<usize> = (0..durations.len()).collect();
        prop_assert_eq!(&*log.borrow(), &expected);
        prop_assert!(animator.is_idle());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Interruption leaves a prefix
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn interruption_leaves_prefix(
        durations in proptest::collection::vec(1u64..100, 1..10),
        stop_after in 0usize..10,
    ) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let animator = Rc::new(TickAnimator::new());
        build_chain(&durations, &log).run(&animator);

        for &ms in durations.iter().take(stop_after) {
            animator.tick(Duration::from_millis(ms));
        }
        animator.cancel_all();
        animator.tick(Duration::from_secs(10));

        let ran = log.borrow().clone();
        let expected_len = (stop_after + 1).min(durations.len());
        prop_assert_eq!(ran.len(), expected_len);
        prop_assert!(ran.iter().enumerate().all(|(i, &n)| i == n));
    }
}
