#![forbid(unsafe_code)]

//! Cache-efficient wrappers for pure functions.
//!
//! # Design
//!
//! [`Memoizer`] owns a pure function and an input → output map behind a
//! mutex. A hit clones the stored output without calling the function. A miss
//! computes with the lock released, then inserts only if no other caller got
//! there first.
//!
//! # Invariants
//!
//! 1. For a given input, the stored output is written once and never
//!    replaced.
//! 2. Sequential calls with the same input invoke the function at most once.
//! 3. The cache only grows; nothing is evicted while the memoizer lives.
//!
//! # Failure Modes
//!
//! - **Concurrent misses** on the same input may both run the function. The
//!   first insert wins and every caller receives the stored value.
//! - **Function panics**: the panic propagates to the caller and nothing is
//!   cached for that input.
//! - **Impure or self-recursive functions** are unsupported and not detected.

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use ahash::AHashMap;
use tracing::trace;

/// A pure function paired with a cache of its results.
pub struct Memoizer<In, Out, F> {
    compute: F,
    cache: Mutex<AHashMap<In, Out>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<In, Out, F> std::fmt::Debug for Memoizer<In, Out, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memoizer")
            .field("entries", &self.lock().len())
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}

impl<In, Out, F> Memoizer<In, Out, F> {
    /// Wrap `compute` with an empty cache.
    #[must_use]
    pub fn new(compute: F) -> Self {
        Self {
            compute,
            cache: Mutex::new(AHashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AHashMap<In, Out>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of cached inputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Calls answered from the cache.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Calls that ran the function.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

impl<In, Out, F> Memoizer<In, Out, F>
where
    In: Eq + Hash + Clone,
    Out: Clone,
    F: Fn(In) -> Out,
{
    /// Return the cached output for `input`, computing it on first use.
    pub fn get(&self, input: In) -> Out {
        {
            let cache = self.lock();
            if let Some(hit) = cache.get(&input) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!("memo hit");
                return hit.clone();
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let computed = (self.compute)(input.clone());
        self.lock().entry(input).or_insert(computed).clone()
    }

    /// Whether `input` already has a cached output.
    #[must_use]
    pub fn contains(&self, input: &In) -> bool {
        self.lock().contains_key(input)
    }

    /// The cached output for `input`, without computing.
    #[must_use]
    pub fn peek(&self, input: &In) -> Option<Out> {
        self.lock().get(input).cloned()
    }
}

/// Wrap a pure function in a cache and return it as a plain closure.
///
/// ```
/// use deferkit_runtime::memo::memoize;
///
/// let cached_cos = memoize(|bits: u64| f64::from_bits(bits).cos());
/// let two_pi = (std::f64::consts::PI * 2.0).to_bits();
/// assert!((cached_cos(two_pi) - 1.0).abs() < 1e-12);
/// assert!((cached_cos(two_pi) - 1.0).abs() < 1e-12); // served from cache
/// ```
pub fn memoize<In, Out, F>(f: F) -> impl Fn(In) -> Out
where
    In: Eq + Hash + Clone,
    Out: Clone,
    F: Fn(In) -> Out,
{
    let memo = Memoizer::new(f);
    move |input: In| memo.get(input)
}
