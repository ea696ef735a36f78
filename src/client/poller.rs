//! Job status polling.

use crate::config::Config;
use crate::endpoints::TemplateVars;
use crate::error::{Error, Result};
use crate::retry::{add_jitter, is_retryable_status};
use crate::transport::{HttpRequest, Transport};
use crate::types::{Job, JobStatus, JobStatusSnapshot};
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::with_credential;

/// Status response body as sent by the service
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct StatusResponse {
    #[serde(deserialize_with = "lenient_string")]
    status: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    job_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    wallet_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    wallet_version_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    created_at: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    completed_at: Option<String>,
    is_active: Option<bool>,
    source_documents: Option<serde_json::Value>,
}

/// Accept strings and numbers (some deployments send epoch timestamps), treat
/// null and empty strings as absent
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl StatusResponse {
    fn into_snapshot(self, job: &Job) -> JobStatusSnapshot {
        JobStatusSnapshot {
            status: JobStatus::parse(self.status.as_deref().unwrap_or_default()),
            job_id: self.job_id.unwrap_or_else(|| job.job_id.clone()),
            wallet_id: self.wallet_id.unwrap_or_else(|| job.wallet_id.clone()),
            wallet_version_id: self
                .wallet_version_id
                .or_else(|| job.wallet_version_id.clone()),
            created_at: self.created_at,
            completed_at: self.completed_at,
            is_active: self.is_active,
            source_documents: self.source_documents,
        }
    }
}

/// Polls a job's status at a fixed interval until it completes or fails
///
/// Transient failures (no response of any kind, 5xx, 408, 429, garbled body)
/// never end the loop; the next tick simply tries again. With the default
/// configuration there is no upper bound on how long polling continues. Set
/// [`PollConfig::max_wait`](crate::config::PollConfig::max_wait) or cancel the
/// token to stop early.
#[derive(Clone)]
pub struct StatusPoller {
    transport: Arc<dyn Transport>,
    config: Arc<Config>,
}

impl StatusPoller {
    pub(crate) fn new(transport: Arc<dyn Transport>, config: Arc<Config>) -> Self {
        Self { transport, config }
    }

    /// Query the job's status once
    ///
    /// # Errors
    ///
    /// - transport errors as returned by the [`Transport`]
    /// - [`Error::StatusRejected`] for a non-2xx response
    /// - [`Error::InvalidResponse`] for a body that is not a status object
    pub async fn status(&self, job: &Job) -> Result<JobStatusSnapshot> {
        self.check(job).await.map_err(TickError::into_inner)
    }

    /// One status request, with failures sorted into transient and fatal
    async fn check(&self, job: &Job) -> std::result::Result<JobStatusSnapshot, TickError> {
        let vars = TemplateVars {
            job_id: Some(&job.job_id),
            wallet_id: Some(&job.wallet_id),
            wallet_version_id: job.wallet_version_id.as_deref(),
        };
        let path = self.config.endpoints.status.render(&vars).map_err(|e| {
            TickError::Fatal(Error::config(
                "endpoints.status",
                format!("cannot render status endpoint: {:?}", e),
            ))
        })?;

        // No custom headers unless a credential is configured, so browsers
        // hosting this call stay preflight-free
        let request = with_credential(HttpRequest::get(path), &self.config.api);

        // Err from the transport means no response arrived, whatever the variant
        let response = self
            .transport
            .send(request)
            .await
            .map_err(TickError::Transient)?;

        if !response.is_success() {
            let fatal = self.config.polling.fail_fast_on_client_error
                && !is_retryable_status(response.status);
            let err = Error::StatusRejected {
                job_id: job.job_id.clone(),
                status: response.status,
                body: response.text(),
            };
            return Err(if fatal {
                TickError::Fatal(err)
            } else {
                TickError::Transient(err)
            });
        }

        let body: StatusResponse = response.json().map_err(|e| {
            TickError::Transient(Error::InvalidResponse {
                call: "status",
                message: e.to_string(),
            })
        })?;
        Ok(body.into_snapshot(job))
    }

    /// Poll until the job reaches `COMPLETED` or `FAILED`
    ///
    /// Waits one interval before every request. `on_tick` is called with each
    /// non-terminal snapshot. The returned snapshot's `wallet_version_id`
    /// falls back to the job's when the service omits it.
    ///
    /// Cancellation is checked only while waiting between ticks; a request
    /// already in flight runs to completion.
    ///
    /// # Errors
    ///
    /// - [`Error::Processing`] when the service reports `FAILED`
    /// - [`Error::StatusRejected`] on a permanent client error (e.g. 404), unless
    ///   `fail_fast_on_client_error` is disabled
    /// - [`Error::PollTimeout`] when `max_wait` is set and the next tick would exceed it
    /// - [`Error::Cancelled`] when `cancel` fires
    pub async fn poll_until_terminal<F>(
        &self,
        job: &Job,
        cancel: &CancellationToken,
        mut on_tick: F,
    ) -> Result<JobStatusSnapshot>
    where
        F: FnMut(&JobStatusSnapshot),
    {
        let polling = &self.config.polling;
        let started = tokio::time::Instant::now();
        let mut tick: u64 = 0;

        loop {
            let delay = if polling.jitter {
                add_jitter(polling.interval)
            } else {
                polling.interval
            };

            if let Some(max_wait) = polling.max_wait {
                let waited = started.elapsed();
                if waited + delay > max_wait {
                    tracing::warn!(
                        job_id = %job.job_id,
                        ticks = tick,
                        waited_ms = waited.as_millis() as u64,
                        "giving up on job"
                    );
                    return Err(Error::PollTimeout {
                        job_id: job.job_id.clone(),
                        waited,
                    });
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(job_id = %job.job_id, ticks = tick, "polling cancelled");
                    return Err(Error::Cancelled);
                }
                _ = tokio::time::sleep(delay) => {}
            }

            tick += 1;
            match self.check(job).await {
                Ok(snapshot) => match snapshot.status {
                    JobStatus::Completed => {
                        tracing::info!(job_id = %job.job_id, ticks = tick, "job completed");
                        return Ok(snapshot);
                    }
                    JobStatus::Failed => {
                        tracing::error!(job_id = %job.job_id, ticks = tick, "job failed");
                        return Err(Error::Processing {
                            job_id: job.job_id.clone(),
                            status: snapshot.status.to_string(),
                        });
                    }
                    _ => {
                        tracing::debug!(
                            job_id = %job.job_id,
                            tick,
                            status = %snapshot.status,
                            "job still running"
                        );
                        on_tick(&snapshot);
                    }
                },
                Err(TickError::Transient(e)) => {
                    tracing::warn!(
                        job_id = %job.job_id,
                        tick,
                        error = %e,
                        "status check failed, retrying next tick"
                    );
                }
                Err(TickError::Fatal(e)) => {
                    tracing::error!(
                        job_id = %job.job_id,
                        tick,
                        error = %e,
                        "status check failed permanently"
                    );
                    return Err(e);
                }
            }
        }
    }
}

/// A failed status check
enum TickError {
    /// Try again next tick
    Transient(Error),
    /// Stop polling
    Fatal(Error),
}

impl TickError {
    fn into_inner(self) -> Error {
        match self {
            TickError::Transient(e) | TickError::Fatal(e) => e,
        }
    }
}
