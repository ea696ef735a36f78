//! Error types for docwallet
//!
//! This module provides the error taxonomy for the extraction workflow:
//! - Component errors ([`Error`]) produced by the submitter, poller, and fetcher
//! - The unified [`WorkflowError`] returned by [`ExtractionClient::run`](crate::ExtractionClient::run)
//! - Machine-readable error codes for hosts that map failures to UI states

use crate::types::WorkflowStage;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for docwallet operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for docwallet
///
/// Each variant carries enough context (job id, HTTP status, response body)
/// to explain the failure without access to the raw transport error.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "api.base_url")
        key: Option<String>,
    },

    /// The upload was rejected or never reached the service
    #[error("upload failed{}: {body}", .status.as_ref().map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Submission {
        /// HTTP status returned by the service (None if the request never completed)
        status: Option<u16>,
        /// Response body text, or the transport error message
        body: String,
    },

    /// The service reported that the job failed
    #[error("processing failed for job {job_id} (status {status})")]
    Processing {
        /// The job that failed
        job_id: String,
        /// Raw status value reported by the service
        status: String,
    },

    /// The status endpoint answered with a non-success HTTP status
    #[error("status check for job {job_id} failed with HTTP {status}: {body}")]
    StatusRejected {
        /// The job being polled
        job_id: String,
        /// HTTP status returned by the status endpoint
        status: u16,
        /// Response body text
        body: String,
    },

    /// Polling exceeded the configured maximum wait
    #[error("job {job_id} did not finish within {waited:?}")]
    PollTimeout {
        /// The job being polled
        job_id: String,
        /// Total time spent polling
        waited: Duration,
    },

    /// Every result retrieval strategy was tried and none succeeded
    #[error("failed to fetch result for job {job_id}: {}", summarize_attempts(.attempts))]
    Fetch {
        /// The job whose result could not be fetched
        job_id: String,
        /// One entry per strategy, in cascade order
        attempts: Vec<FetchAttempt>,
    },

    /// The caller cancelled the run
    #[error("operation cancelled")]
    Cancelled,

    /// A successful response did not have the expected shape
    #[error("invalid {call} response: {message}")]
    InvalidResponse {
        /// Which call produced the response ("submit", "status", "fetch")
        call: &'static str,
        /// What was wrong with it
        message: String,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error for a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Get the machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Submission { .. } => "submission_failed",
            Error::Processing { .. } => "processing_failed",
            Error::StatusRejected { .. } => "status_rejected",
            Error::PollTimeout { .. } => "poll_timeout",
            Error::Fetch { .. } => "fetch_failed",
            Error::Cancelled => "cancelled",
            Error::InvalidResponse { .. } => "invalid_response",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::Io(_) => "io_error",
        }
    }
}

/// Outcome of a single result retrieval strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchAttempt {
    /// Rendered request path (or the raw template when it could not be rendered)
    pub path: String,
    /// Why this strategy did not produce a result
    pub outcome: FetchOutcome,
}

/// Reason a fetch strategy was passed over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Template needs a value the job does not have
    Skipped {
        /// Name of the missing placeholder
        missing: String,
    },
    /// The service answered with a non-success status
    Status(u16),
    /// The request never completed
    Transport(String),
    /// The service answered 2xx but the body was not JSON
    InvalidBody(String),
}

impl std::fmt::Display for FetchAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.outcome {
            FetchOutcome::Skipped { missing } => {
                write!(f, "{} skipped (no {})", self.path, missing)
            }
            FetchOutcome::Status(status) => write!(f, "{} -> HTTP {}", self.path, status),
            FetchOutcome::Transport(msg) => write!(f, "{} -> {}", self.path, msg),
            FetchOutcome::InvalidBody(msg) => write!(f, "{} -> invalid body: {}", self.path, msg),
        }
    }
}

fn summarize_attempts(attempts: &[FetchAttempt]) -> String {
    if attempts.is_empty() {
        return "no retrieval endpoints configured".to_string();
    }
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// The single failure type returned by a workflow run
///
/// `message` is always suitable for showing to an end user. The underlying
/// component error stays available through [`WorkflowError::kind`] and
/// [`std::error::Error::source`].
#[derive(Debug, Error)]
#[error("{message}")]
pub struct WorkflowError {
    /// Stage in which the run failed
    pub stage: WorkflowStage,
    /// Human-readable failure description
    pub message: String,
    #[source]
    source: Error,
}

impl WorkflowError {
    /// Wrap a component error raised during `stage`
    pub fn new(stage: WorkflowStage, source: Error) -> Self {
        let message = match &source {
            Error::Submission { body, .. } => format!("Upload failed: {}", body),
            Error::Processing { .. } => "Processing failed.".to_string(),
            Error::Fetch { .. } => format!("Failed to fetch wallet data ({})", source),
            Error::Cancelled => "Cancelled".to_string(),
            other => format!("{} failed: {}", stage, other),
        };
        Self {
            stage,
            message,
            source,
        }
    }

    /// The component error behind this failure
    pub fn kind(&self) -> &Error {
        &self.source
    }

    /// Consume the wrapper and return the component error
    pub fn into_inner(self) -> Error {
        self.source
    }
}
