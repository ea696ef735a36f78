use super::test_helpers::*;
use super::*;
use crate::error::{Error, FetchOutcome};
use crate::types::{JobStatus, Payload, WorkflowPhase, WorkflowStage, WorkflowState};
use serde_json::json;
use tokio_util::sync::CancellationToken;

mod poller;

const STATUS_PATH: &str = "/status/job-1";

fn sample_pdf() -> Payload {
    Payload::pdf(b"%PDF-1.4 sample".to_vec())
}

fn job(wallet_version_id: Option<&str>) -> crate::types::Job {
    crate::types::Job {
        job_id: "job-1".to_string(),
        wallet_id: "w-1".to_string(),
        wallet_version_id: wallet_version_id.map(str::to_string),
    }
}
