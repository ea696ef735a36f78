//! Extract a document end to end and print the resulting wallet
//!
//! ```bash
//! DOCWALLET_API_URL=https://api.example.com/prod \
//!     cargo run --example extract_document -- resume.pdf
//! ```
//!
//! Settings are read from the environment (or a .env file). Press Ctrl+C to
//! stop waiting for the job.

use docwallet::{Config, ExtractionClient, Payload, run_until_signal};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docwallet=info")),
        )
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: extract_document <file>");
        std::process::exit(2);
    };

    let client = ExtractionClient::new(Config::from_env()?)?;
    let payload = Payload::from_path(&path).await?;
    println!("Uploading {} ({} bytes, {})", path, payload.len(), payload.content_type);

    let wallet = run_until_signal(&client, &payload, |state| {
        println!("{}", state.phase.status_message());
    })
    .await?;

    println!("{}", serde_json::to_string_pretty(wallet.as_json())?);
    Ok(())
}
