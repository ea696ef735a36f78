//! # docwallet
//!
//! Client library for an asynchronous document extraction service.
//!
//! A run uploads a document, polls the job until the service reports a
//! terminal status and then retrieves the structured result (the "wallet").
//!
//! ## Design Philosophy
//!
//! docwallet is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Sensible defaults** - The stock endpoints and a 3 second poll interval work out of the box
//! - **Configurable endpoints** - Every path is a template, result lookup is an ordered cascade
//! - **Transport-agnostic** - All HTTP goes through the [`Transport`] trait
//!
//! ## Quick Start
//!
//! ```no_run
//! use docwallet::{Config, ExtractionClient, Payload};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ExtractionClient::new(Config::new("https://api.example.com/prod"))?;
//!
//!     let payload = Payload::from_path("resume.pdf").await?;
//!     let wallet = client
//!         .run(&payload, |state| println!("{}", state.phase.status_message()))
//!         .await?;
//!
//!     println!("{}", wallet.as_json());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Workflow client (decomposed into focused submodules)
pub mod client;
/// Configuration types
pub mod config;
/// Endpoint path templates
pub mod endpoints;
/// Error types
pub mod error;
/// Transient failure classification
pub mod retry;
/// HTTP transport seam
pub mod transport;
/// Core types
pub mod types;

// Re-export commonly used types
pub use client::{ExtractionClient, JobSubmitter, ResultFetcher, StatusPoller};
pub use config::{ApiConfig, Config, EndpointConfig, PollConfig};
pub use endpoints::{EndpointTemplate, TemplateVars};
pub use error::{Error, FetchAttempt, FetchOutcome, Result, WorkflowError};
pub use tokio_util::sync::CancellationToken;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method, Transport};
pub use types::{
    Job, JobStatus, JobStatusSnapshot, Payload, ResultArtifact, WorkflowPhase, WorkflowStage,
    WorkflowState,
};

/// Run a workflow that is cancelled when the process receives a termination signal.
///
/// - **Unix:** listens for SIGTERM and SIGINT.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// Meant for short-lived processes such as CLIs. Once tokio registers its
/// signal handlers they stay installed for the rest of the process, so after
/// the first call SIGINT/SIGTERM no longer terminate it by default. Long-running
/// hosts should own their shutdown handling and use
/// [`ExtractionClient::run_with_cancel`] with their own token instead.
///
/// # Example
///
/// ```no_run
/// use docwallet::{Config, ExtractionClient, Payload, run_until_signal};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = ExtractionClient::new(Config::from_env()?)?;
///     let payload = Payload::from_path("resume.pdf").await?;
///
///     let wallet = run_until_signal(&client, &payload, |_| {}).await?;
///     println!("{}", wallet.as_json());
///     Ok(())
/// }
/// ```
pub async fn run_until_signal<F>(
    client: &ExtractionClient,
    payload: &Payload,
    on_progress: F,
) -> std::result::Result<ResultArtifact, WorkflowError>
where
    F: FnMut(&WorkflowState),
{
    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            wait_for_signal().await;
            cancel.cancel();
        }
    });

    let result = client.run_with_cancel(payload, &cancel, on_progress).await;
    watcher.abort();
    result
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
