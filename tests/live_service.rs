//! End-to-end tests against a real extraction service
//!
//! These tests upload a real document using settings from .env.
//! All tests are marked #[ignore] to prevent running in normal CI.
//!
//! # Running the tests
//!
//! ```bash
//! cargo test --features live-tests --test live_service -- --ignored --nocapture
//! ```
//!
//! # Required environment variables (.env file)
//!
//! - `DOCWALLET_API_URL` - Service base URL (e.g., https://api.example.com/prod)
//! - `DOCWALLET_SAMPLE_PDF` - Path to a document the service accepts
//! - `DOCWALLET_API_KEY` - API credential (optional)
//! - `DOCWALLET_MAX_WAIT_SECS` - Upper bound on polling (optional)

#![cfg(feature = "live-tests")]

use docwallet::{Config, ExtractionClient, Payload, WorkflowPhase, WorkflowStage};
use serial_test::serial;

/// Load the client configuration and sample document path, if configured
fn live_settings() -> Option<(Config, String)> {
    dotenvy::dotenv().ok();
    let sample = std::env::var("DOCWALLET_SAMPLE_PDF").ok()?;
    let config = Config::from_env().ok()?;
    Some((config, sample))
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_live_extraction() {
    let Some((config, sample)) = live_settings() else {
        eprintln!("Skipping: DOCWALLET_API_URL or DOCWALLET_SAMPLE_PDF not set");
        return;
    };

    let client = ExtractionClient::new(config).unwrap();
    let payload = Payload::from_path(&sample).await.unwrap();

    let mut phases = Vec::new();
    let wallet = client
        .run(&payload, |state| {
            println!("{}", state.phase.status_message());
            phases.push(state.phase.clone());
        })
        .await
        .unwrap();

    assert!(!wallet.as_json().is_null());
    assert_eq!(phases.last(), Some(&WorkflowPhase::Done));
    assert!(phases.contains(&WorkflowPhase::Fetching));
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_live_rejects_garbage_upload() {
    let Some((config, _)) = live_settings() else {
        eprintln!("Skipping: DOCWALLET_API_URL or DOCWALLET_SAMPLE_PDF not set");
        return;
    };

    let client = ExtractionClient::new(config).unwrap();
    let payload = Payload::pdf(b"this is not a pdf".to_vec());

    // Some deployments accept anything and fail the job later instead
    match client.run(&payload, |_| {}).await {
        Ok(_) => eprintln!("Service accepted a non-PDF body"),
        Err(err) => {
            println!("Rejected at {}: {}", err.stage, err.message);
            assert!(matches!(
                err.stage,
                WorkflowStage::Submit | WorkflowStage::Poll
            ));
        }
    }
}
