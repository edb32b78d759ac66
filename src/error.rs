//! Error types used by the fetch queue and route guard.
//!
//! - [`FetchError`]: failures delivered to the `error` path of a fetch.
//!
//! Like every error in this crate it provides `as_label` / `as_message`
//! helpers for logging. Nothing here is fatal: errors are handed to
//! caller-supplied callbacks, never raised out of the coordinator.
//!
//! The module also hosts [`guarded`], which runs user callbacks with panic
//! isolation so a misbehaving observer cannot wedge an episode or a queue.

use std::panic::{AssertUnwindSafe, catch_unwind};

use thiserror::Error;

/// # Errors delivered to the error path of a fetch.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The underlying transport reported a failure.
    #[error("transport failed: {error}")]
    Transport {
        /// The underlying error message.
        error: String,
    },

    /// The in-flight request was aborted through its [`RequestHandle`](crate::RequestHandle).
    #[error("request aborted")]
    Aborted,

    /// A fetch tried to join an active queue with a different reset mode.
    ///
    /// Concurrent "set" and "reset" fetches on the same object are not allowed.
    #[error("fetch with concurrent set & reset not allowed")]
    ConflictingReset,

    /// The transport future panicked.
    #[error("transport panicked: {info}")]
    Panicked {
        /// Panic payload, if it was a string.
        info: String,
    },
}

impl FetchError {
    /// Shorthand for [`FetchError::Transport`].
    pub fn transport(error: impl Into<String>) -> Self {
        FetchError::Transport {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use loadvisor::FetchError;
    ///
    /// assert_eq!(FetchError::Aborted.as_label(), "fetch_aborted");
    /// assert_eq!(FetchError::transport("503").as_label(), "fetch_transport");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            FetchError::Transport { .. } => "fetch_transport",
            FetchError::Aborted => "fetch_aborted",
            FetchError::ConflictingReset => "fetch_conflicting_reset",
            FetchError::Panicked { .. } => "fetch_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            FetchError::Transport { error } => format!("error: {error}"),
            FetchError::Aborted => "aborted".to_string(),
            FetchError::ConflictingReset => "conflicting reset mode".to_string(),
            FetchError::Panicked { info } => format!("panic: {info}"),
        }
    }

    /// Indicates whether issuing the same fetch again may succeed.
    ///
    /// Only transport failures qualify; an abort was requested by the caller
    /// and a reset conflict will repeat for as long as the queue is active.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transport { .. })
    }
}

/// Runs a user callback, catching and logging a panic instead of unwinding
/// through the coordinator.
///
/// Returns `false` if the callback panicked.
pub(crate) fn guarded<F: FnOnce()>(what: &'static str, f: F) -> bool {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(()) => true,
        Err(panic) => {
            tracing::error!(callback = what, info = %panic_info(panic.as_ref()), "callback panicked");
            false
        }
    }
}

/// Extracts a printable message from a panic payload.
pub(crate) fn panic_info(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        assert_eq!(FetchError::ConflictingReset.as_label(), "fetch_conflicting_reset");
        assert_eq!(
            FetchError::Panicked { info: "x".into() }.as_label(),
            "fetch_panicked"
        );
    }

    #[test]
    fn only_transport_is_retryable() {
        assert!(FetchError::transport("boom").is_retryable());
        assert!(!FetchError::Aborted.is_retryable());
        assert!(!FetchError::ConflictingReset.is_retryable());
    }

    #[test]
    fn guarded_swallows_panics() {
        assert!(guarded("ok", || {}));
        assert!(!guarded("boom", || panic!("boom")));
    }

    #[test]
    fn panic_info_reads_string_payloads() {
        let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_info(owned.as_ref()), "owned");
        let other: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(panic_info(other.as_ref()), "unknown panic");
    }
}
