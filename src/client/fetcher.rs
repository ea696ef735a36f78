//! Result retrieval through the endpoint cascade.

use crate::config::Config;
use crate::endpoints::{RenderError, TemplateVars};
use crate::error::{Error, FetchAttempt, FetchOutcome, Result};
use crate::transport::{HttpRequest, Transport};
use crate::types::{Job, JobStatusSnapshot, ResultArtifact};
use std::sync::Arc;

use super::with_credential;

/// Field some deployments wrap the artifact in
const WRAPPER_FIELD: &str = "walletData";

/// Resolves a completed job's result
///
/// Deployments expose different lookup endpoints, so the fetcher walks the
/// configured templates in order and returns the first successful JSON body.
#[derive(Clone)]
pub struct ResultFetcher {
    transport: Arc<dyn Transport>,
    config: Arc<Config>,
}

impl ResultFetcher {
    pub(crate) fn new(transport: Arc<dyn Transport>, config: Arc<Config>) -> Self {
        Self { transport, config }
    }

    /// Fetch the artifact for a completed job
    ///
    /// `{walletId}` and `{jobId}` come from the upload response (`job`).
    /// `{walletVersionId}` comes from `snapshot`, falling back to the job's.
    /// Templates needing a value that is not available are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`] listing every attempt once the cascade is exhausted.
    pub async fn fetch_result(
        &self,
        job: &Job,
        snapshot: &JobStatusSnapshot,
    ) -> Result<ResultArtifact> {
        let wallet_version_id = snapshot
            .wallet_version_id
            .as_deref()
            .or(job.wallet_version_id.as_deref());
        let vars = TemplateVars {
            job_id: Some(&job.job_id),
            wallet_id: Some(&job.wallet_id),
            wallet_version_id,
        };

        let mut attempts = Vec::with_capacity(self.config.endpoints.fetch.len());

        for template in &self.config.endpoints.fetch {
            let path = match template.render(&vars) {
                Ok(path) => path,
                Err(RenderError::Missing(missing)) => {
                    tracing::warn!(
                        job_id = %job.job_id,
                        template = %template,
                        missing = %missing,
                        "skipping result endpoint"
                    );
                    attempts.push(FetchAttempt {
                        path: template.to_string(),
                        outcome: FetchOutcome::Skipped { missing },
                    });
                    continue;
                }
                Err(RenderError::Unterminated) => {
                    return Err(Error::config(
                        "endpoints.fetch",
                        format!("{:?} has an unterminated placeholder", template.as_str()),
                    ));
                }
            };

            let request = with_credential(HttpRequest::get(path.as_str()), &self.config.api);
            let outcome = match self.transport.send(request).await {
                Err(e) => FetchOutcome::Transport(e.to_string()),
                Ok(response) if !response.is_success() => FetchOutcome::Status(response.status),
                Ok(response) => match response.json::<serde_json::Value>() {
                    Ok(body) => {
                        tracing::info!(job_id = %job.job_id, path = %path, "fetched result");
                        return Ok(unwrap_artifact(body));
                    }
                    Err(e) => FetchOutcome::InvalidBody(e.to_string()),
                },
            };

            let attempt = FetchAttempt { path, outcome };
            tracing::warn!(job_id = %job.job_id, attempt = %attempt, "result endpoint unavailable");
            attempts.push(attempt);
        }

        tracing::error!(
            job_id = %job.job_id,
            attempts = attempts.len(),
            "no result endpoint succeeded"
        );
        Err(Error::Fetch {
            job_id: job.job_id.clone(),
            attempts,
        })
    }
}

/// Return the `walletData` field when it holds a truthy value, else the whole body
///
/// `null`, `false`, `0` and `""` count as absent.
pub(crate) fn unwrap_artifact(mut body: serde_json::Value) -> ResultArtifact {
    if let Some(inner) = body.get_mut(WRAPPER_FIELD)
        && is_truthy(inner)
    {
        return ResultArtifact(inner.take());
    }
    ResultArtifact(body)
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}
