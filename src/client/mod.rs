//! Extraction workflow client split into focused submodules.
//!
//! - [`submitter`] - Document upload, produces a [`Job`](crate::types::Job)
//! - [`poller`] - Status polling until the job reaches a terminal status
//! - [`fetcher`] - Result retrieval through the endpoint cascade
//! - [`workflow`] - The end-to-end run that sequences the three

mod fetcher;
mod poller;
mod submitter;
mod workflow;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use fetcher::ResultFetcher;
pub use poller::StatusPoller;
pub use submitter::JobSubmitter;

use crate::config::{ApiConfig, Config};
use crate::error::Result;
use crate::transport::{HttpRequest, HttpTransport, Transport};
use std::sync::Arc;

/// Main client instance (cloneable - all fields are Arc-wrapped)
///
/// One client can drive any number of concurrent runs; runs share only the
/// immutable configuration and the transport.
#[derive(Clone)]
pub struct ExtractionClient {
    /// Configuration (wrapped in Arc for sharing across runs)
    pub(crate) config: Arc<Config>,
    pub(crate) submitter: JobSubmitter,
    pub(crate) poller: StatusPoller,
    pub(crate) fetcher: ResultFetcher,
}

impl ExtractionClient {
    /// Create a client that talks to the configured service over HTTP
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use docwallet::{Config, ExtractionClient, Payload};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let config = Config::new("https://api.example.com/prod").with_api_key("secret");
    ///     let client = ExtractionClient::new(config)?;
    ///
    ///     let payload = Payload::from_path("resume.pdf").await?;
    ///     let result = client
    ///         .run(&payload, |state| println!("{}", state.phase.status_message()))
    ///         .await?;
    ///
    ///     println!("{}", serde_json::to_string_pretty(result.as_json())?);
    ///     Ok(())
    /// }
    /// ```
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config.api)?;
        Ok(Self::build(config, Arc::new(transport)))
    }

    /// Create a client that sends every request through `transport`
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, transport))
    }

    fn build(config: Config, transport: Arc<dyn Transport>) -> Self {
        let config = Arc::new(config);
        Self {
            submitter: JobSubmitter::new(transport.clone(), config.clone()),
            poller: StatusPoller::new(transport.clone(), config.clone()),
            fetcher: ResultFetcher::new(transport, config.clone()),
            config,
        }
    }

    /// Get the current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The upload component
    pub fn submitter(&self) -> &JobSubmitter {
        &self.submitter
    }

    /// The status polling component
    pub fn poller(&self) -> &StatusPoller {
        &self.poller
    }

    /// The result retrieval component
    pub fn fetcher(&self) -> &ResultFetcher {
        &self.fetcher
    }
}

/// Attach the API credential header when one is configured
pub(crate) fn with_credential(request: HttpRequest, api: &ApiConfig) -> HttpRequest {
    match &api.api_key {
        Some(key) => request.header(api.api_key_header.as_str(), key.as_str()),
        None => request,
    }
}
