//! End-to-end extraction run (upload, poll, fetch)

use crate::error::{Error, WorkflowError};
use crate::types::{
    Job, JobStatusSnapshot, Payload, ResultArtifact, WorkflowPhase, WorkflowStage, WorkflowState,
};
use tokio_util::sync::CancellationToken;

use super::ExtractionClient;

/// Tracks one run's state and reports every transition to the caller
struct Progress<F> {
    state: WorkflowState,
    on_progress: F,
}

impl<F> Progress<F>
where
    F: FnMut(&WorkflowState),
{
    fn new(on_progress: F) -> Self {
        Self {
            state: WorkflowState::default(),
            on_progress,
        }
    }

    fn enter(&mut self, phase: WorkflowPhase) {
        tracing::debug!(phase = %phase.status_message(), "workflow phase");
        self.state.phase = phase;
        (self.on_progress)(&self.state);
    }

    fn accepted(&mut self, job: &Job) {
        self.state.job = Some(job.clone());
        self.enter(WorkflowPhase::Processing { substatus: None });
    }

    fn tick(&mut self, snapshot: &JobStatusSnapshot) {
        self.state.snapshot = Some(snapshot.clone());
        self.enter(WorkflowPhase::Processing {
            substatus: Some(snapshot.substatus()),
        });
    }

    fn completed(&mut self, snapshot: &JobStatusSnapshot) {
        self.state.snapshot = Some(snapshot.clone());
        self.enter(WorkflowPhase::Fetching);
    }

    fn done(&mut self, result: &ResultArtifact) {
        self.state.result = Some(result.clone());
        self.enter(WorkflowPhase::Done);
    }

    fn fail(&mut self, stage: WorkflowStage, err: Error) -> WorkflowError {
        let err = WorkflowError::new(stage, err);
        tracing::error!(stage = %stage, error = %err.kind(), "workflow failed");
        self.enter(WorkflowPhase::Failed {
            reason: err.message.clone(),
        });
        err
    }
}

impl ExtractionClient {
    /// Upload `payload`, wait for the job to finish and return its result
    ///
    /// `on_progress` is called synchronously on every phase change and on every
    /// non-terminal status tick. Phases only move forward:
    /// `Uploading` → `Processing` → `Fetching` → `Done`, or `Failed` from any
    /// of them.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkflowError`] naming the stage that failed. The same
    /// message is delivered through the final `Failed` progress update.
    pub async fn run<F>(
        &self,
        payload: &Payload,
        on_progress: F,
    ) -> std::result::Result<ResultArtifact, WorkflowError>
    where
        F: FnMut(&WorkflowState),
    {
        self.run_with_cancel(payload, &CancellationToken::new(), on_progress)
            .await
    }

    /// Like [`run`](Self::run), but stops with [`Error::Cancelled`] once
    /// `cancel` fires
    ///
    /// The token is observed while waiting between status ticks. The upload and
    /// the result fetch are not interrupted.
    pub async fn run_with_cancel<F>(
        &self,
        payload: &Payload,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> std::result::Result<ResultArtifact, WorkflowError>
    where
        F: FnMut(&WorkflowState),
    {
        let mut progress = Progress::new(on_progress);

        progress.enter(WorkflowPhase::Uploading);
        let job = match self.submitter.submit(payload).await {
            Ok(job) => job,
            Err(e) => return Err(progress.fail(WorkflowStage::Submit, e)),
        };
        progress.accepted(&job);

        let polled = self
            .poller
            .poll_until_terminal(&job, cancel, |snapshot| progress.tick(snapshot))
            .await;
        let snapshot = match polled {
            Ok(snapshot) => snapshot,
            Err(e) => return Err(progress.fail(WorkflowStage::Poll, e)),
        };
        progress.completed(&snapshot);

        let result = match self.fetcher.fetch_result(&job, &snapshot).await {
            Ok(result) => result,
            Err(e) => return Err(progress.fail(WorkflowStage::Fetch, e)),
        };
        progress.done(&result);

        tracing::info!(job_id = %job.job_id, "extraction complete");
        Ok(result)
    }
}
