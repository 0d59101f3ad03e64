//! Demo: structured logging with the `tracing` ecosystem.
//!
//! Every stage of the watch emits spans and events: connection, TLS,
//! authentication, each poll tick with its state, and the final match with
//! its provenance.
//!
//! # Usage
//!
//! ```bash
//! export OTP_WATCH_MAILBOX="your@email.com"
//! export OTP_WATCH_CREDENTIAL="your-app-password"
//! # Set log level (trace, debug, info, warn, error)
//! export RUST_LOG=otp_watch=debug
//!
//! cargo run --example with_tracing
//! ```

use otp_watch::{watcher, WatchConfig};
use std::env;
use std::time::Duration;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> otp_watch::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("otp_watch=info")),
        )
        .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
        .with_target(true)
        .init();

    let mailbox =
        env::var("OTP_WATCH_MAILBOX").expect("OTP_WATCH_MAILBOX environment variable required");
    let credential = env::var("OTP_WATCH_CREDENTIAL")
        .expect("OTP_WATCH_CREDENTIAL environment variable required");

    tracing::info!(mailbox = %mailbox, "Starting watch");

    let config = WatchConfig::builder()
        .mailbox(&mailbox)
        .credential(credential)
        .poll_interval(Duration::from_secs(5))
        .max_wait(Duration::from_secs(60))
        .build()?;

    let handle = watcher::watch(config).await?;

    match handle.wait().await {
        Ok(candidate) => {
            tracing::info!(provenance = %candidate.provenance(), "Found passcode");
            println!("\nFound passcode: {candidate}");
        }
        Err(e) => {
            tracing::warn!(error = %e, category = %e.category(), "Watch ended without a passcode");
            println!("\nNo passcode: {e}");
        }
    }

    Ok(())
}
