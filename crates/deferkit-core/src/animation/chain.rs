//! Sequential animation chain.
//!
//! An [`AnimationChain`] is a singly linked list of timed actions. Running it
//! hands the head to an [`Animator`]; each node's completion callback starts
//! the next node, so no two nodes ever overlap.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use super::{Action, Animator};

#[cfg(feature = "tracing")]
use crate::logging::trace;
#[cfg(not(feature = "tracing"))]
use crate::trace;

struct ChainNode {
    #[cfg(feature = "tracing")]
    index: usize,
    action: Action,
    duration: Duration,
    next: RefCell<Option<Rc<ChainNode>>>,
}

impl ChainNode {
    fn new(index: usize, action: Action, duration: Duration) -> Rc<Self> {
        // Position in the chain, only recorded for trace events.
        #[cfg(not(feature = "tracing"))]
        let _ = index;
        Rc::new(Self {
            #[cfg(feature = "tracing")]
            index,
            action,
            duration,
            next: RefCell::new(None),
        })
    }
}

impl Drop for ChainNode {
    // Unlink iteratively; the default drop recurses once per node.
    fn drop(&mut self) {
        let mut next = self.next.get_mut().take();
        while let Some(node) = next {
            next = match Rc::try_unwrap(node) {
                Ok(mut owned) => owned.next.get_mut().take(),
                Err(_) => None,
            };
        }
    }
}

/// Successor to start once `node` completes, if any.
fn successor(node: &ChainNode, finished: bool) -> Option<Rc<ChainNode>> {
    if !finished {
        trace!(node = node.index, "chain interrupted");
        return None;
    }
    let next = node.next.borrow().clone();
    if next.is_none() {
        trace!(node = node.index, "chain exhausted");
    }
    next
}

/// Shared between one `animate` call and the completion it was handed.
struct Handoff {
    /// True until `animate` returns.
    in_animate: Cell<bool>,
    /// Successor reported by a completion that fired inside `animate`.
    next: Cell<Option<Rc<ChainNode>>>,
}

/// Play `start` and everything after it.
///
/// Completions that fire before `animate` returns hand their successor back
/// through a [`Handoff`] and the loop advances, so synchronous animators use
/// constant stack. Deferred completions start their successor directly.
/// Completions hold the animator weakly: dropping the animator mid-run frees
/// the rest of the chain.
fn run_node<A: Animator + 'static>(start: Rc<ChainNode>, animator: &Rc<A>) {
    let mut current = Some(start);
    while let Some(node) = current.take() {
        trace!(
            node = node.index,
            duration_ms = node.duration.as_millis() as u64,
            "chain node start"
        );
        let action = Rc::clone(&node.action);
        let duration = node.duration;
        let handoff = Rc::new(Handoff {
            in_animate: Cell::new(true),
            next: Cell::new(None),
        });
        let slot = Rc::clone(&handoff);
        let driver = Rc::downgrade(animator);
        animator.animate(
            duration,
            action,
            Box::new(move |finished| {
                let Some(next) = successor(&node, finished) else {
                    return;
                };
                if slot.in_animate.get() {
                    slot.next.set(Some(next));
                } else if let Some(animator) = driver.upgrade() {
                    run_node(next, &animator);
                } else {
                    trace!(node = next.index, "chain animator dropped");
                }
            }),
        );
        handoff.in_animate.set(false);
        current = handoff.next.take();
    }
}

/// A sequence of timed actions run strictly one after another.
pub struct AnimationChain {
    head: Rc<ChainNode>,
    tail: Rc<ChainNode>,
    len: usize,
}

impl std::fmt::Debug for AnimationChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationChain")
            .field("len", &self.len)
            .field("total_duration", &self.total_duration())
            .finish()
    }
}

impl AnimationChain {
    /// Start a chain with its first action.
    #[must_use]
    pub fn new(action: impl Fn() + 'static, duration: Duration) -> Self {
        let head = ChainNode::new(0, Rc::new(action), duration);
        Self {
            tail: Rc::clone(&head),
            head,
            len: 1,
        }
    }

    /// Attach an action after the current tail (builder pattern).
    #[must_use]
    pub fn append(mut self, action: impl Fn() + 'static, duration: Duration) -> Self {
        self.push(action, duration);
        self
    }

    /// Attach an action after the current tail (mutating).
    pub fn push(&mut self, action: impl Fn() + 'static, duration: Duration) {
        let node = ChainNode::new(self.len, Rc::new(action), duration);
        *self.tail.next.borrow_mut() = Some(Rc::clone(&node));
        self.tail = node;
        self.len += 1;
    }

    /// Run the chain from its head on `animator`.
    ///
    /// Returns as soon as the head has been handed to the animator; the rest
    /// of the chain advances through completion callbacks.
    pub fn run<A: Animator + 'static>(&self, animator: &Rc<A>) {
        run_node(Rc::clone(&self.head), animator);
    }

    /// Number of nodes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`: a chain has at least its head.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Sum of all node durations.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        let mut total = Duration::ZERO;
        let mut cursor = Some(Rc::clone(&self.head));
        while let Some(node) = cursor {
            total = total.saturating_add(node.duration);
            cursor = node.next.borrow().clone();
        }
        total
    }
}
