use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DeferError>;

#[derive(Debug, Error)]
pub enum DeferError {
    #[error("left computation panicked: {message}")]
    LeftPanicked { message: String },

    #[error("right computation panicked: {message}")]
    RightPanicked { message: String },

    #[error("both computations panicked (left: {left}; right: {right})")]
    BothPanicked { left: String, right: String },

    #[error("parallel worker {worker} panicked: {message}")]
    WorkerPanicked { worker: usize, message: String },

    #[error("completion handle dropped without delivering a result")]
    CompletionDropped,

    #[error("no completion delivered within {0:?}")]
    TimedOut(Duration),

    #[error("failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl DeferError {
    /// Whether the error carries a caught panic from user code.
    #[must_use]
    pub fn is_panic(&self) -> bool {
        matches!(
            self,
            Self::LeftPanicked { .. }
                | Self::RightPanicked { .. }
                | Self::BothPanicked { .. }
                | Self::WorkerPanicked { .. }
        )
    }
}

/// Render a caught panic payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("non-string panic payload")
    }
}
