//! Core types for docwallet

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// A server-side unit of asynchronous work
///
/// Created from the upload response and never modified afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Identifier used to query job status
    pub job_id: String,
    /// Stable identifier of the wallet the result lands in
    pub wallet_id: String,
    /// Version of the wallet produced by this job, if known at upload time
    #[serde(default)]
    pub wallet_version_id: Option<String>,
}

/// Job status as reported by the service
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobStatus {
    /// Accepted, not yet started
    Pending,
    /// Being worked on
    Processing,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
    /// Any other status string, kept verbatim
    Other(String),
}

impl JobStatus {
    /// Parse a raw status string (case-insensitive for the known values)
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" => JobStatus::Pending,
            "PROCESSING" => JobStatus::Processing,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" => JobStatus::Failed,
            _ => JobStatus::Other(raw.to_string()),
        }
    }

    /// Raw string form of this status
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Other(raw) => raw,
        }
    }

    /// Whether polling stops at this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation of a job's state, produced per poll tick
#[derive(Clone, Debug, PartialEq)]
pub struct JobStatusSnapshot {
    /// Parsed status
    pub status: JobStatus,
    /// Job identifier echoed by the service (falls back to the polled job)
    pub job_id: String,
    /// Wallet identifier (falls back to the job's)
    pub wallet_id: String,
    /// Wallet version (falls back to the job's)
    pub wallet_version_id: Option<String>,
    /// Creation timestamp as sent by the service
    pub created_at: Option<String>,
    /// Completion timestamp as sent by the service
    pub completed_at: Option<String>,
    /// Whether this wallet version is the active one
    pub is_active: Option<bool>,
    /// Source document metadata, passed through untouched
    pub source_documents: Option<serde_json::Value>,
}

impl JobStatusSnapshot {
    /// Lower-cased raw status, for progress display
    pub fn substatus(&self) -> String {
        self.status.as_str().to_lowercase()
    }

    /// Creation time, if the service sent an RFC 3339 timestamp
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.created_at.as_deref())
    }

    /// Completion time, if the service sent an RFC 3339 timestamp
    pub fn completed_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.completed_at.as_deref())
    }
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw?)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// The structured result of a job, owned by the caller
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultArtifact(pub serde_json::Value);

impl ResultArtifact {
    /// Borrow the underlying JSON value
    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }

    /// Take the underlying JSON value
    pub fn into_json(self) -> serde_json::Value {
        self.0
    }
}

/// Document bytes plus the content type they are uploaded with
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload {
    /// Raw document bytes
    pub data: Vec<u8>,
    /// MIME type sent as `Content-Type`
    pub content_type: String,
}

impl Payload {
    /// Create a payload with an explicit content type
    pub fn new(data: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    /// Create a PDF payload
    pub fn pdf(data: impl Into<Vec<u8>>) -> Self {
        Self::new(data, "application/pdf")
    }

    /// Read a file, guessing its content type from the extension
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self { data, content_type })
    }

    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Workflow stage a failure is attributed to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStage {
    /// Uploading the document
    Submit,
    /// Waiting for the job to finish
    Poll,
    /// Retrieving the result
    Fetch,
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowStage::Submit => f.write_str("upload"),
            WorkflowStage::Poll => f.write_str("status polling"),
            WorkflowStage::Fetch => f.write_str("result fetch"),
        }
    }
}

/// Phase of a workflow run
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkflowPhase {
    /// Not started
    Idle,
    /// Sending the document
    Uploading,
    /// Job accepted, waiting for completion
    Processing {
        /// Lower-cased service status from the latest tick (None before the first tick)
        substatus: Option<String>,
    },
    /// Job complete, retrieving the result
    Fetching,
    /// Result available
    Done,
    /// Run stopped with an error
    Failed {
        /// Human-readable failure description
        reason: String,
    },
}

impl WorkflowPhase {
    /// Status line suitable for showing to a user
    pub fn status_message(&self) -> String {
        match self {
            WorkflowPhase::Idle => String::new(),
            WorkflowPhase::Uploading => "Uploading...".to_string(),
            WorkflowPhase::Processing { substatus: None } => {
                "Uploaded! Processing your document".to_string()
            }
            WorkflowPhase::Processing {
                substatus: Some(sub),
            } => format!("Processing your document ({})", sub),
            WorkflowPhase::Fetching => "Done! Fetching results...".to_string(),
            WorkflowPhase::Done => "Done!".to_string(),
            WorkflowPhase::Failed { reason } => reason.clone(),
        }
    }

    /// Ordinal used to check that runs only move forward
    pub(crate) fn rank(&self) -> u8 {
        match self {
            WorkflowPhase::Idle => 0,
            WorkflowPhase::Uploading => 1,
            WorkflowPhase::Processing { .. } => 2,
            WorkflowPhase::Fetching => 3,
            WorkflowPhase::Done | WorkflowPhase::Failed { .. } => 4,
        }
    }

    /// Whether the run has stopped
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowPhase::Done | WorkflowPhase::Failed { .. })
    }
}

/// The orchestrator's view of one run, passed to progress callbacks
#[derive(Clone, Debug, PartialEq)]
pub struct WorkflowState {
    /// Current phase
    pub phase: WorkflowPhase,
    /// Submitted job (None until the upload succeeds)
    pub job: Option<Job>,
    /// Latest status snapshot
    pub snapshot: Option<JobStatusSnapshot>,
    /// Final result (only set when `phase` is `Done`)
    pub result: Option<ResultArtifact>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            phase: WorkflowPhase::Idle,
            job: None,
            snapshot: None,
            result: None,
        }
    }
}
