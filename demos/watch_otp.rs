//! Basic demo: watch a mailbox until a passcode arrives.
//!
//! # Usage
//!
//! ```bash
//! export OTP_WATCH_MAILBOX="your@email.com"
//! export OTP_WATCH_CREDENTIAL="your-app-password"
//! cargo run --example watch_otp
//! ```
//!
//! For Gmail, use an [App Password](https://support.google.com/accounts/answer/185833).

use otp_watch::{watcher, WatchConfig};
use std::env;

#[tokio::main]
async fn main() -> otp_watch::Result<()> {
    let mailbox =
        env::var("OTP_WATCH_MAILBOX").expect("OTP_WATCH_MAILBOX environment variable required");
    let credential = env::var("OTP_WATCH_CREDENTIAL")
        .expect("OTP_WATCH_CREDENTIAL environment variable required");

    println!("Connecting to IMAP server for {mailbox}...");

    // IMAP host is discovered from the mailbox domain
    let config = WatchConfig::builder()
        .mailbox(&mailbox)
        .credential(credential)
        .build()?;

    let handle = watcher::watch(config).await?;

    println!("Connected! Watching for a passcode...");
    println!("(Send yourself an email containing a code, or press Ctrl+C to cancel)");

    let candidate = handle.wait().await?;

    println!(
        "Got passcode: {} (rule: {})",
        candidate.code(),
        candidate.provenance()
    );

    Ok(())
}
