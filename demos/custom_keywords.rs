//! Demo: watch with a custom keyword priority list.
//!
//! The matcher scans keywords in order; the first keyword with a 4-8 digit
//! run within 30 characters wins. This demo also shows running the matcher
//! standalone, without any mailbox.
//!
//! # Usage
//!
//! ```bash
//! export OTP_WATCH_MAILBOX="your@email.com"
//! export OTP_WATCH_CREDENTIAL="your-app-password"
//! cargo run --example custom_keywords
//! ```

use otp_watch::matcher::OtpMatcher;
use otp_watch::{watcher, WatchConfig};
use std::env;
use std::time::Duration;

#[tokio::main]
async fn main() -> otp_watch::Result<()> {
    // The matcher is a pure function of text and keyword list; try it dry
    let matcher = OtpMatcher::new(["token", "access code", "tan"]);
    let sample = "Your access code is 48120, valid for 10 minutes.";
    match matcher.find(sample) {
        Some(found) => println!("dry run: {} via {}", found.code(), found.provenance()),
        None => println!("dry run: no match"),
    }

    let mailbox =
        env::var("OTP_WATCH_MAILBOX").expect("OTP_WATCH_MAILBOX environment variable required");
    let credential = env::var("OTP_WATCH_CREDENTIAL")
        .expect("OTP_WATCH_CREDENTIAL environment variable required");

    // The same keyword list, applied to a live watch
    let config = WatchConfig::builder()
        .mailbox(&mailbox)
        .credential(credential)
        .keywords(["token", "access code", "tan"])
        .poll_interval(Duration::from_secs(2))
        .max_wait(Duration::from_secs(300))
        .build()?;

    println!("Watching {mailbox} for token emails (5 minute deadline)...");

    let handle = watcher::watch(config).await?;
    match handle.wait().await {
        Ok(candidate) => println!("Got: {} via {}", candidate.code(), candidate.provenance()),
        Err(e) => println!("Watch ended without a passcode: {e}"),
    }

    Ok(())
}
