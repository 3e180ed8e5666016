//! Cancellation tokens for deferred actions.
//!
//! A scheduled action is guarded by a [`CancelToken`]; whoever scheduled it
//! keeps the matching [`CancelHandle`]. Cancelling through the handle is
//! observed by every clone of the token. A token is bound to exactly one
//! deferred action and can never be un-cancelled, so superseding an action
//! always means minting a fresh pair.
//!
//! # Tracing
//!
//! With the `tracing` feature, the first cancellation of a token emits a
//! `DEBUG` event carrying `token_id`.
//!
//! # Example
//!
//! ```
//! use deferkit_core::cancel::CancelToken;
//!
//! let (token, handle) = CancelToken::new();
//! assert!(!token.is_cancelled());
//!
//! assert!(handle.cancel());
//! assert!(token.is_cancelled());
//! assert!(!handle.cancel()); // already cancelled
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[cfg(feature = "tracing")]
use crate::logging::debug;
#[cfg(not(feature = "tracing"))]
use crate::debug;

static NEXT_TOKEN_ID: AtomicU64 = AtomicU64::new(1);

fn next_token_id() -> u64 {
    NEXT_TOKEN_ID.fetch_add(1, Ordering::Relaxed)
}

/// Total number of token cancellations observed.
static CANCELLATIONS_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Read the process-wide cancellation count (for diagnostics).
#[must_use]
pub fn cancellations_total() -> u64 {
    CANCELLATIONS_TOTAL.load(Ordering::Relaxed)
}

#[derive(Debug)]
struct TokenState {
    id: u64,
    cancelled: AtomicBool,
}

/// Observer side of a cancellation pair. Cheaply cloneable.
#[derive(Clone, Debug)]
pub struct CancelToken {
    state: Arc<TokenState>,
}

impl CancelToken {
    /// Mint a fresh, live token and its controlling handle.
    #[must_use]
    pub fn new() -> (Self, CancelHandle) {
        let state = Arc::new(TokenState {
            id: next_token_id(),
            cancelled: AtomicBool::new(false),
        });
        let token = Self {
            state: Arc::clone(&state),
        };
        (token, CancelHandle { state })
    }

    /// Unique identifier (for logging).
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.state.id
    }

    /// Whether the owning handle has cancelled this token.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once cancelled, for use with `?` at yield points.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled { token_id: self.id() })
        } else {
            Ok(())
        }
    }
}

/// Owner side of a cancellation pair.
///
/// Not cloneable: exactly one owner decides when the action is discarded.
/// Dropping the handle does **not** cancel the token.
#[derive(Debug)]
pub struct CancelHandle {
    state: Arc<TokenState>,
}

impl CancelHandle {
    /// Cancel the token. Returns `true` if this call performed the
    /// cancellation, `false` if it was already cancelled.
    pub fn cancel(&self) -> bool {
        let was_cancelled = self.state.cancelled.swap(true, Ordering::AcqRel);
        if !was_cancelled {
            CANCELLATIONS_TOTAL.fetch_add(1, Ordering::Relaxed);
            debug!(token_id = self.state.id, "deferred action cancelled");
        }
        !was_cancelled
    }

    /// Whether the token has been cancelled.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// Another observer for the same token.
    #[must_use]
    pub fn token(&self) -> CancelToken {
        CancelToken {
            state: Arc::clone(&self.state),
        }
    }

    /// Identifier of the controlled token.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.state.id
    }
}

/// Error returned by [`CancelToken::check`] once the token is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled {
    /// Id of the cancelled token.
    pub token_id: u64,
}

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "deferred action {} was cancelled", self.token_id)
    }
}

impl std::error::Error for Cancelled {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_live() {
        let (token, handle) = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(!handle.is_cancelled());
        assert!(token.check().is_ok());
    }

    #[test]
    fn cancel_is_observed_by_all_clones() {
        let (token, handle) = CancelToken::new();
        let other = token.clone();
        let third = handle.token();
        handle.cancel();
        assert!(token.is_cancelled());
        assert!(other.is_cancelled());
        assert!(third.is_cancelled());
    }

    #[test]
    fn double_cancel_reports_once() {
        let (_token, handle) = CancelToken::new();
        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert!(handle.is_cancelled());
    }

    #[test]
    fn dropping_handle_does_not_cancel() {
        let (token, handle) = CancelToken::new();
        drop(handle);
        assert!(!token.is_cancelled());
    }

    #[test]
    fn ids_are_unique() {
        let (a, _) = CancelToken::new();
        let (b, hb) = CancelToken::new();
        assert_ne!(a.id(), b.id());
        assert_eq!(b.id(), hb.id());
    }

    #[test]
    fn check_reports_token_id() {
        let (token, handle) = CancelToken::new();
        handle.cancel();
        let err = token.check().unwrap_err();
        assert_eq!(err.token_id, token.id());
        assert!(err.to_string().contains("cancelled"));
    }

    #[test]
    fn counter_increments_once_per_token() {
        let (_t, handle) = CancelToken::new();
        let before = cancellations_total();
        handle.cancel();
        let after_first = cancellations_total();
        assert!(after_first > before);
        handle.cancel();
        // Other tests may cancel concurrently, so only check monotonicity.
        assert!(cancellations_total() >= after_first);
    }
}
