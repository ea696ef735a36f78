//! Transient failure classification and poll jitter
//!
//! The status poller keeps waiting through transient failures (no response,
//! 5xx, 408, 429) but stops on failures that can never succeed, such as a 404
//! for an unknown job id. [`is_retryable_status`] draws that line for HTTP
//! statuses; [`IsRetryable`] lets hosts that retry uploads or fetches
//! themselves classify any [`Error`].
//!
//! # Example
//!
//! ```
//! use docwallet::retry::{IsRetryable, is_retryable_status};
//!
//! assert!(is_retryable_status(503));
//! assert!(is_retryable_status(429));
//! assert!(!is_retryable_status(404));
//!
//! let err = docwallet::Error::Cancelled;
//! assert!(!err.is_retryable());
//! ```

use crate::error::Error;
use rand::Rng;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (network timeouts, server busy, connection reset) should return `true`.
/// Permanent failures (unknown job, bad configuration, cancelled) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Anything that failed on the wire is worth another try; only a
            // request that could not be built is permanent
            Error::Network(e) => !e.is_builder(),
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::Interrupted
            ),
            // Upload rejections are only transient when the server said so
            Error::Submission { status, .. } => status.is_some_and(is_retryable_status),
            Error::StatusRejected { status, .. } => is_retryable_status(*status),
            // A garbled body from a healthy endpoint is usually a proxy hiccup
            Error::InvalidResponse { .. } | Error::Serialization(_) => true,
            Error::Config { .. }
            | Error::Processing { .. }
            | Error::PollTimeout { .. }
            | Error::Fetch { .. }
            | Error::Cancelled => false,
        }
    }
}

/// Whether an HTTP status is worth retrying (5xx, 408 Request Timeout, 429 Too Many Requests)
pub fn is_retryable_status(status: u16) -> bool {
    status >= 500 || status == 408 || status == 429
}

/// Add random jitter to a delay to prevent thundering herd
///
/// Jitter is uniformly distributed between 0% and 100% of the delay.
/// This means the actual delay will be between `delay` and `2 * delay`.
pub(crate) fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    let jittered_secs = delay.as_secs_f64() * (1.0 + jitter_factor);
    Duration::from_secs_f64(jittered_secs)
}
