//! Document upload.

use crate::config::Config;
use crate::endpoints::TemplateVars;
use crate::error::{Error, Result};
use crate::transport::{HttpRequest, Transport};
use crate::types::{Job, Payload};
use std::sync::Arc;

use super::with_credential;

/// Uploads a document and turns the response into a [`Job`]
///
/// The submitter never retries: a rejected upload ends the run.
#[derive(Clone)]
pub struct JobSubmitter {
    transport: Arc<dyn Transport>,
    config: Arc<Config>,
}

impl JobSubmitter {
    pub(crate) fn new(transport: Arc<dyn Transport>, config: Arc<Config>) -> Self {
        Self { transport, config }
    }

    /// Upload `payload` as a raw body and return the created job
    ///
    /// # Errors
    ///
    /// - [`Error::Submission`] if the request fails or the service answers non-2xx
    ///   (the response body is kept for diagnostics)
    /// - [`Error::InvalidResponse`] if a 2xx body lacks `jobId`/`walletId`
    pub async fn submit(&self, payload: &Payload) -> Result<Job> {
        let path = self
            .config
            .endpoints
            .submit
            .render(&TemplateVars::default())
            .map_err(|e| {
                Error::config(
                    "endpoints.submit",
                    format!("cannot render upload endpoint: {:?}", e),
                )
            })?;

        let request = with_credential(
            HttpRequest::post(path.as_str(), payload.data.clone(), &payload.content_type),
            &self.config.api,
        );

        tracing::info!(
            path = %path,
            bytes = payload.len(),
            content_type = %payload.content_type,
            "uploading document"
        );

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| Error::Submission {
                status: None,
                body: e.to_string(),
            })?;

        if !response.is_success() {
            let body = response.text();
            tracing::error!(status = response.status, body = %body, "upload rejected");
            return Err(Error::Submission {
                status: Some(response.status),
                body,
            });
        }

        let job: Job = response.json().map_err(|e| Error::InvalidResponse {
            call: "submit",
            message: e.to_string(),
        })?;

        if job.job_id.trim().is_empty() {
            return Err(Error::InvalidResponse {
                call: "submit",
                message: "empty jobId".to_string(),
            });
        }

        tracing::info!(
            job_id = %job.job_id,
            wallet_id = %job.wallet_id,
            wallet_version_id = job.wallet_version_id.as_deref().unwrap_or("-"),
            "document accepted"
        );
        Ok(job)
    }
}
